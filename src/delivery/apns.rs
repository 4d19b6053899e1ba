//! Apple Push Notification service channel.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::config::ApnsConfig;
use crate::traits::PushChannel;
use crate::types::Priority;

pub struct ApnsChannel {
    client: reqwest::Client,
    host: &'static str,
    provider_token: String,
    bundle_id: String,
}

impl ApnsChannel {
    pub fn new(config: &ApnsConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            host: if config.sandbox {
                "api.sandbox.push.apple.com"
            } else {
                "api.push.apple.com"
            },
            provider_token: config.provider_token.clone(),
            bundle_id: config.bundle_id.clone(),
        }
    }
}

#[async_trait]
impl PushChannel for ApnsChannel {
    async fn send(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        priority: Priority,
    ) -> anyhow::Result<()> {
        let mut aps = json!({
            "alert": { "title": title, "body": body },
            "badge": 1,
        });
        if priority == Priority::High {
            aps["sound"] = json!("default");
        }

        let url = format!("https://{}/3/device/{device_token}", self.host);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.provider_token)
            .header("apns-topic", &self.bundle_id)
            .header(
                "apns-priority",
                if priority == Priority::High { "10" } else { "5" },
            )
            .header("apns-push-type", "alert")
            .json(&json!({ "aps": aps }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("apns returned {status}: {text}");
        }

        debug!(device = &device_token[..device_token.len().min(10)], "push sent");
        Ok(())
    }
}
