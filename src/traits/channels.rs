use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::types::Priority;

/// Primary delivery channel: push notification to one device.
#[async_trait]
pub trait PushChannel: Send + Sync {
    async fn send(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        priority: Priority,
    ) -> anyhow::Result<()>;
}

/// Secondary delivery channel: SMS to the single configured recipient.
#[async_trait]
pub trait SmsChannel: Send + Sync {
    async fn send(&self, body: &str) -> anyhow::Result<()>;
}

/// An upcoming calendar event, as fed to the `meeting_upcoming` evaluator.
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    #[serde(default)]
    pub attendee_count: u32,
    pub start_time: String,
}

/// External calendar collaborator queried by the calendar sweep.
#[async_trait]
pub trait CalendarBackend: Send + Sync {
    /// Events starting within [from, to).
    async fn upcoming_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<Vec<CalendarEvent>>;
}
