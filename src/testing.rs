//! Shared test doubles for channel, backend, and calendar collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::providers::ProviderError;
use crate::state::SqliteHistoryStore;
use crate::traits::{
    CalendarBackend, CalendarEvent, CompletionBackend, ContactStore, DeviceToken, Goal,
    HealthEntry, HistoryStore, KnownLocation, MoodEntry, PushChannel, SignalStore, SmsChannel,
    TriggerFireRecord, TriggerLogStore, UserMessage, VipContact,
};
use crate::types::Priority;

/// Fresh store backed by a throwaway SQLite file. Keep the file handle
/// alive for the duration of the test.
pub async fn test_store() -> (SqliteHistoryStore, NamedTempFile) {
    let file = NamedTempFile::new().expect("temp db file");
    let store = SqliteHistoryStore::new(file.path().to_str().expect("utf8 path"))
        .await
        .expect("open store");
    (store, file)
}

/// Completion backend returning a fixed string.
pub struct StubBackend(pub String);

#[async_trait]
impl CompletionBackend for StubBackend {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, ProviderError> {
        Ok(self.0.clone())
    }
}

/// Push channel that records the device tokens it was asked to reach,
/// optionally failing for one specific token.
#[derive(Default)]
pub struct RecordingPush {
    sent: Mutex<Vec<String>>,
    fail_token: Option<String>,
}

impl RecordingPush {
    pub fn failing_for(token: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_token: Some(token.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("lock").clone()
    }
}

#[async_trait]
impl PushChannel for RecordingPush {
    async fn send(
        &self,
        device_token: &str,
        _title: &str,
        _body: &str,
        _priority: Priority,
    ) -> anyhow::Result<()> {
        if self.fail_token.as_deref() == Some(device_token) {
            anyhow::bail!("simulated device failure");
        }
        self.sent.lock().expect("lock").push(device_token.to_string());
        Ok(())
    }
}

/// SMS channel that records bodies and can fail its first N attempts.
#[derive(Default)]
pub struct RecordingSms {
    sent: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    fail_first: usize,
}

impl RecordingSms {
    pub fn failing_times(n: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            fail_first: n,
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("lock").clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SmsChannel for RecordingSms {
    async fn send(&self, body: &str) -> anyhow::Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_first {
            anyhow::bail!("simulated sms failure");
        }
        self.sent.lock().expect("lock").push(body.to_string());
        Ok(())
    }
}

/// History store that serves everything from a real SQLite store but
/// fails screen-time reads, for exercising sweep error isolation.
pub struct FaultyScreenTimeStore(pub Arc<SqliteHistoryStore>);

#[async_trait]
impl TriggerLogStore for FaultyScreenTimeStore {
    async fn get_last_fire(
        &self,
        trigger_id: &str,
    ) -> anyhow::Result<Option<TriggerFireRecord>> {
        self.0.get_last_fire(trigger_id).await
    }

    async fn append_fire(&self, record: &TriggerFireRecord) -> anyhow::Result<()> {
        self.0.append_fire(record).await
    }

    async fn mark_user_responded(&self, fire_id: &str) -> anyhow::Result<()> {
        self.0.mark_user_responded(fire_id).await
    }
}

#[async_trait]
impl SignalStore for FaultyScreenTimeStore {
    async fn get_health_since(&self, days: u32) -> anyhow::Result<Vec<HealthEntry>> {
        self.0.get_health_since(days).await
    }

    async fn save_health(&self, entry: &HealthEntry) -> anyhow::Result<()> {
        self.0.save_health(entry).await
    }

    async fn get_mood_since(&self, days: u32) -> anyhow::Result<Vec<MoodEntry>> {
        self.0.get_mood_since(days).await
    }

    async fn save_mood(&self, entry: &MoodEntry) -> anyhow::Result<()> {
        self.0.save_mood(entry).await
    }

    async fn get_stale_goals(&self, days_stale: u32) -> anyhow::Result<Vec<Goal>> {
        self.0.get_stale_goals(days_stale).await
    }

    async fn save_goal(&self, goal: &Goal) -> anyhow::Result<()> {
        self.0.save_goal(goal).await
    }

    async fn get_last_user_message(&self) -> anyhow::Result<Option<UserMessage>> {
        self.0.get_last_user_message().await
    }

    async fn save_user_message(&self, content: &str) -> anyhow::Result<()> {
        self.0.save_user_message(content).await
    }

    async fn get_screen_time_minutes(
        &self,
        _category: &str,
        _days: u32,
    ) -> anyhow::Result<i64> {
        anyhow::bail!("screen time source unavailable")
    }

    async fn save_screen_time(
        &self,
        date: &str,
        category: &str,
        minutes: i64,
        app: Option<&str>,
    ) -> anyhow::Result<()> {
        self.0.save_screen_time(date, category, minutes, app).await
    }

    async fn save_location(
        &self,
        lat: f64,
        lng: f64,
        name: Option<&str>,
    ) -> anyhow::Result<()> {
        self.0.save_location(lat, lng, name).await
    }
}

#[async_trait]
impl ContactStore for FaultyScreenTimeStore {
    async fn get_known_locations(&self) -> anyhow::Result<Vec<KnownLocation>> {
        self.0.get_known_locations().await
    }

    async fn upsert_known_location(
        &self,
        name: &str,
        lat: f64,
        lng: f64,
        radius_meters: f64,
    ) -> anyhow::Result<()> {
        self.0.upsert_known_location(name, lat, lng, radius_meters).await
    }

    async fn lookup_vip_by_email(&self, email: &str) -> anyhow::Result<Option<VipContact>> {
        self.0.lookup_vip_by_email(email).await
    }

    async fn upsert_vip(
        &self,
        name: &str,
        email: &str,
        relationship: Option<&str>,
    ) -> anyhow::Result<()> {
        self.0.upsert_vip(name, email, relationship).await
    }

    async fn get_device_tokens(&self) -> anyhow::Result<Vec<DeviceToken>> {
        self.0.get_device_tokens().await
    }

    async fn register_device(&self, token: &str, platform: &str) -> anyhow::Result<()> {
        self.0.register_device(token, platform).await
    }
}

impl HistoryStore for FaultyScreenTimeStore {}

/// Calendar backend serving a fixed event list regardless of window.
pub struct StubCalendar(pub Vec<CalendarEvent>);

#[async_trait]
impl CalendarBackend for StubCalendar {
    async fn upcoming_events(
        &self,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> anyhow::Result<Vec<CalendarEvent>> {
        Ok(self.0.clone())
    }
}
