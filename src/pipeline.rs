//! Delivery pipeline: push to every registered device, fall back to SMS,
//! and always record the attempt in history. Nothing in here propagates
//! an error to the caller; a failed delivery is an outcome, not a fault.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::traits::{
    ContactStore, HistoryStore, PushChannel, SmsChannel, TriggerFireRecord, TriggerLogStore,
};
use crate::types::{DeliveryMethod, Priority};

pub struct DeliveryPipeline {
    store: Arc<dyn HistoryStore>,
    push: Option<Arc<dyn PushChannel>>,
    sms: Option<Arc<dyn SmsChannel>>,
    /// Notification title, the assistant's name.
    title: String,
}

impl DeliveryPipeline {
    pub fn new(
        store: Arc<dyn HistoryStore>,
        push: Option<Arc<dyn PushChannel>>,
        sms: Option<Arc<dyn SmsChannel>>,
        title: &str,
    ) -> Self {
        Self {
            store,
            push,
            sms,
            title: title.to_string(),
        }
    }

    /// Whether any delivery channel exists at all. Callers that would
    /// rather skip generation than log an undeliverable fire check this.
    pub fn is_configured(&self) -> bool {
        self.push.is_some() || self.sms.is_some()
    }

    /// Send `message` and append the fire record. Returns the method that
    /// carried the notification, `None` when every channel failed.
    pub async fn deliver(
        &self,
        trigger_id: &str,
        context: Value,
        message: &str,
        priority: Priority,
    ) -> DeliveryMethod {
        let mut method = DeliveryMethod::None;

        if self.try_push(message, priority).await {
            method = DeliveryMethod::Apns;
        } else if self.try_sms(message).await {
            method = DeliveryMethod::Sms;
        } else {
            error!(trigger_id, "all delivery methods failed");
        }

        let record = TriggerFireRecord::new(trigger_id, context, message, method);
        if let Err(err) = self.store.append_fire(&record).await {
            error!(trigger_id, error = %err, "failed to record trigger fire");
        }

        info!(trigger_id, method = method.as_str(), message, "trigger delivered");
        method
    }

    /// Push succeeds when the channel is configured, at least one device
    /// is registered, and the per-device sends were attempted. Individual
    /// device failures are logged and skipped.
    async fn try_push(&self, message: &str, priority: Priority) -> bool {
        let push = match &self.push {
            Some(push) => push,
            None => {
                info!("push not configured");
                return false;
            }
        };

        let devices = match self.store.get_device_tokens().await {
            Ok(devices) => devices,
            Err(err) => {
                warn!(error = %err, "could not load device tokens");
                return false;
            }
        };
        if devices.is_empty() {
            info!("no device tokens registered");
            return false;
        }

        for device in &devices {
            if let Err(err) = push
                .send(&device.token, &self.title, message, priority)
                .await
            {
                warn!(device_id = device.id, error = %err, "push to device failed");
            }
        }

        true
    }

    /// One retry on failure; transient SMS gateway errors are common
    /// enough that a single second attempt pays for itself.
    async fn try_sms(&self, message: &str) -> bool {
        let sms = match &self.sms {
            Some(sms) => sms,
            None => {
                info!("sms not configured");
                return false;
            }
        };

        match sms.send(message).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "sms failed, retrying once");
                tokio::time::sleep(Duration::from_millis(500)).await;
                match sms.send(message).await {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(error = %err, "sms retry failed");
                        false
                    }
                }
            }
        }
    }
}
