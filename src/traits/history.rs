use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::DeliveryMethod;

/// One historical firing attempt. Created by the delivery pipeline after
/// every delivery attempt; suppressed decisions never create a record.
/// Append-only; only `user_responded` is ever updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerFireRecord {
    pub id: String,
    pub trigger_id: String,
    pub fired_at: DateTime<Utc>,
    pub context: Value,
    pub message_sent: String,
    pub delivery_method: DeliveryMethod,
    pub delivered: bool,
    pub user_responded: Option<bool>,
}

impl TriggerFireRecord {
    pub fn new(
        trigger_id: &str,
        context: Value,
        message: &str,
        method: DeliveryMethod,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            trigger_id: trigger_id.to_string(),
            fired_at: Utc::now(),
            context,
            message_sent: message.to_string(),
            delivery_method: method,
            delivered: method != DeliveryMethod::None,
            user_responded: None,
        }
    }
}

/// A single workout within a health entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    #[serde(rename = "type")]
    pub kind: String,
    pub duration_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<i64>,
}

/// Daily health sample from the phone/watch ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthEntry {
    pub id: String,
    pub sleep_hours: Option<f64>,
    pub steps: Option<i64>,
    pub active_minutes: Option<i64>,
    #[serde(default)]
    pub workouts: Vec<Workout>,
    pub created_at: DateTime<Utc>,
}

/// Mood sample on a 1–5 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: String,
    pub mood: i64,
    pub energy: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user goal; `goal_stale` watches for active goals going untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub progress: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The most recent user-authored chat message (for `gone_quiet`).
#[derive(Debug, Clone)]
pub struct UserMessage {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A registered geofence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownLocation {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub radius_meters: f64,
}

/// A contact whose emails warrant an immediate nudge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VipContact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub relationship: Option<String>,
}

/// A push-notification device registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceToken {
    pub id: i64,
    pub token: String,
    pub platform: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only trigger fire log.
#[async_trait]
pub trait TriggerLogStore: Send + Sync {
    /// Most recent fire record for a trigger id, if any.
    async fn get_last_fire(&self, trigger_id: &str) -> anyhow::Result<Option<TriggerFireRecord>>;

    async fn append_fire(&self, record: &TriggerFireRecord) -> anyhow::Result<()>;

    /// Response tracking, the only mutation the log permits.
    async fn mark_user_responded(&self, fire_id: &str) -> anyhow::Result<()>;
}

/// Recent signal data the pattern evaluators inspect, plus the ingestion
/// writes that feed it.
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Health entries from the last `days` days, most recent first.
    async fn get_health_since(&self, days: u32) -> anyhow::Result<Vec<HealthEntry>>;
    async fn save_health(&self, entry: &HealthEntry) -> anyhow::Result<()>;

    /// Mood entries from the last `days` days, most recent first.
    async fn get_mood_since(&self, days: u32) -> anyhow::Result<Vec<MoodEntry>>;
    async fn save_mood(&self, entry: &MoodEntry) -> anyhow::Result<()>;

    /// Active goals unmodified for at least `days_stale` days.
    async fn get_stale_goals(&self, days_stale: u32) -> anyhow::Result<Vec<Goal>>;
    async fn save_goal(&self, goal: &Goal) -> anyhow::Result<()>;

    async fn get_last_user_message(&self) -> anyhow::Result<Option<UserMessage>>;
    async fn save_user_message(&self, content: &str) -> anyhow::Result<()>;

    /// Total screen-time minutes for a category over the last `days` days.
    async fn get_screen_time_minutes(&self, category: &str, days: u32) -> anyhow::Result<i64>;
    async fn save_screen_time(
        &self,
        date: &str,
        category: &str,
        minutes: i64,
        app: Option<&str>,
    ) -> anyhow::Result<()>;

    /// Raw location log (ingestion trail, not geofences).
    async fn save_location(&self, lat: f64, lng: f64, name: Option<&str>) -> anyhow::Result<()>;
}

/// Registered geofences, VIP contacts, and push devices.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn get_known_locations(&self) -> anyhow::Result<Vec<KnownLocation>>;
    async fn upsert_known_location(
        &self,
        name: &str,
        lat: f64,
        lng: f64,
        radius_meters: f64,
    ) -> anyhow::Result<()>;

    /// Case-insensitive exact match on email address.
    async fn lookup_vip_by_email(&self, email: &str) -> anyhow::Result<Option<VipContact>>;
    async fn upsert_vip(
        &self,
        name: &str,
        email: &str,
        relationship: Option<&str>,
    ) -> anyhow::Result<()>;

    async fn get_device_tokens(&self) -> anyhow::Result<Vec<DeviceToken>>;
    async fn register_device(&self, token: &str, platform: &str) -> anyhow::Result<()>;
}

/// The trigger history store, the only cross-invocation shared state.
pub trait HistoryStore: TriggerLogStore + SignalStore + ContactStore {}
