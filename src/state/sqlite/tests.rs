use super::*;

use chrono::Duration;
use serde_json::json;
use tempfile::NamedTempFile;

use crate::traits::{
    ContactStore, Goal, HealthEntry, MoodEntry, SignalStore, TriggerFireRecord, TriggerLogStore,
    Workout,
};
use crate::types::DeliveryMethod;

async fn test_store() -> (SqliteHistoryStore, NamedTempFile) {
    let file = NamedTempFile::new().expect("temp db file");
    let store = SqliteHistoryStore::new(file.path().to_str().expect("utf8 path"))
        .await
        .expect("open store");
    (store, file)
}

fn health(id: &str, sleep: f64, days_ago: i64) -> HealthEntry {
    HealthEntry {
        id: id.to_string(),
        sleep_hours: Some(sleep),
        steps: Some(8000),
        active_minutes: Some(30),
        workouts: vec![],
        created_at: Utc::now() - Duration::days(days_ago),
    }
}

#[tokio::test]
async fn fire_log_round_trips_and_returns_latest() {
    let (store, _file) = test_store().await;

    let mut old = TriggerFireRecord::new(
        "vip_email",
        json!({"from": "boss@example.com", "subject": "Q3 numbers"}),
        "Your boss emailed about Q3 numbers.",
        DeliveryMethod::Apns,
    );
    old.fired_at = Utc::now() - Duration::hours(30);
    store.append_fire(&old).await.unwrap();

    let newer = TriggerFireRecord::new(
        "vip_email",
        json!({"from": "boss@example.com", "subject": "Q4 plan"}),
        "Your boss emailed about Q4 plan.",
        DeliveryMethod::Sms,
    );
    store.append_fire(&newer).await.unwrap();

    let last = store.get_last_fire("vip_email").await.unwrap().unwrap();
    assert_eq!(last.id, newer.id);
    assert_eq!(last.delivery_method, DeliveryMethod::Sms);
    assert!(last.delivered);
    assert_eq!(last.context["subject"], "Q4 plan");
    assert_eq!(last.user_responded, None);

    assert!(store.get_last_fire("doomscroll").await.unwrap().is_none());
}

#[tokio::test]
async fn undelivered_fire_is_recorded_as_not_delivered() {
    let (store, _file) = test_store().await;

    let record = TriggerFireRecord::new(
        "morning_checkin",
        json!({"type": "morning_checkin"}),
        "Morning. Anything on your mind?",
        DeliveryMethod::None,
    );
    store.append_fire(&record).await.unwrap();

    let last = store.get_last_fire("morning_checkin").await.unwrap().unwrap();
    assert!(!last.delivered);
    assert_eq!(last.delivery_method, DeliveryMethod::None);
}

#[tokio::test]
async fn mark_user_responded_updates_only_that_record() {
    let (store, _file) = test_store().await;

    let a = TriggerFireRecord::new("at_gym", json!({}), "msg", DeliveryMethod::Apns);
    let mut b = TriggerFireRecord::new("at_gym", json!({}), "msg", DeliveryMethod::Apns);
    b.fired_at = Utc::now() - Duration::hours(1);
    store.append_fire(&a).await.unwrap();
    store.append_fire(&b).await.unwrap();

    store.mark_user_responded(&a.id).await.unwrap();

    let last = store.get_last_fire("at_gym").await.unwrap().unwrap();
    assert_eq!(last.id, a.id);
    assert_eq!(last.user_responded, Some(true));
}

#[tokio::test]
async fn health_window_excludes_old_entries_and_keeps_workouts() {
    let (store, _file) = test_store().await;

    let mut recent = health("h1", 5.5, 1);
    recent.workouts = vec![Workout {
        kind: "run".to_string(),
        duration_minutes: 25,
        calories: Some(280),
    }];
    store.save_health(&recent).await.unwrap();
    store.save_health(&health("h2", 7.0, 2)).await.unwrap();
    store.save_health(&health("h3", 8.0, 10)).await.unwrap();

    let window = store.get_health_since(3).await.unwrap();
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].id, "h1");
    assert_eq!(window[0].workouts[0].kind, "run");
}

#[tokio::test]
async fn mood_window_is_most_recent_first() {
    let (store, _file) = test_store().await;

    for (id, mood, days_ago) in [("m1", 2, 0), ("m2", 3, 1), ("m3", 5, 9)] {
        store
            .save_mood(&MoodEntry {
                id: id.to_string(),
                mood,
                energy: None,
                notes: None,
                created_at: Utc::now() - Duration::days(days_ago),
            })
            .await
            .unwrap();
    }

    let window = store.get_mood_since(3).await.unwrap();
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].id, "m1");
    assert_eq!(window[1].id, "m2");
}

#[tokio::test]
async fn stale_goals_ignores_fresh_and_completed() {
    let (store, _file) = test_store().await;

    let goal = |id: &str, status: &str, updated_days_ago: i64| Goal {
        id: id.to_string(),
        title: format!("goal {id}"),
        description: None,
        status: status.to_string(),
        progress: 0,
        created_at: Utc::now() - Duration::days(30),
        updated_at: Utc::now() - Duration::days(updated_days_ago),
    };

    store.save_goal(&goal("g1", "active", 10)).await.unwrap();
    store.save_goal(&goal("g2", "active", 2)).await.unwrap();
    store.save_goal(&goal("g3", "completed", 20)).await.unwrap();

    let stale = store.get_stale_goals(7).await.unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].id, "g1");

    // Touching the goal takes it out of the stale set.
    let mut refreshed = goal("g1", "active", 0);
    refreshed.progress = 40;
    store.save_goal(&refreshed).await.unwrap();
    assert!(store.get_stale_goals(7).await.unwrap().is_empty());
}

#[tokio::test]
async fn last_user_message_tracks_latest() {
    let (store, _file) = test_store().await;
    assert!(store.get_last_user_message().await.unwrap().is_none());

    store.save_user_message("first").await.unwrap();
    store.save_user_message("second").await.unwrap();

    let last = store.get_last_user_message().await.unwrap().unwrap();
    assert_eq!(last.content, "second");
}

#[tokio::test]
async fn screen_time_sums_per_category() {
    let (store, _file) = test_store().await;

    store
        .save_screen_time("2026-08-22", "social", 90, Some("twitter"))
        .await
        .unwrap();
    store
        .save_screen_time("2026-08-22", "social", 75, Some("instagram"))
        .await
        .unwrap();
    store
        .save_screen_time("2026-08-22", "productivity", 120, None)
        .await
        .unwrap();

    assert_eq!(store.get_screen_time_minutes("social", 1).await.unwrap(), 165);
    assert_eq!(store.get_screen_time_minutes("games", 1).await.unwrap(), 0);
}

#[tokio::test]
async fn known_locations_upsert_replaces_by_name() {
    let (store, _file) = test_store().await;

    store
        .upsert_known_location("gym", 37.7749, -122.4194, 150.0)
        .await
        .unwrap();
    store
        .upsert_known_location("gym", 37.7750, -122.4195, 200.0)
        .await
        .unwrap();

    let locations = store.get_known_locations().await.unwrap();
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].radius_meters, 200.0);
}

#[tokio::test]
async fn vip_lookup_is_case_insensitive() {
    let (store, _file) = test_store().await;

    store
        .upsert_vip("Alex", "Alex@Example.com", Some("manager"))
        .await
        .unwrap();

    let hit = store
        .lookup_vip_by_email("alex@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.name, "Alex");
    assert_eq!(hit.relationship.as_deref(), Some("manager"));

    assert!(store
        .lookup_vip_by_email("nobody@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn device_registration_dedupes_tokens() {
    let (store, _file) = test_store().await;

    store.register_device("tok-1", "ios").await.unwrap();
    store.register_device("tok-1", "ios").await.unwrap();
    store.register_device("tok-2", "ios").await.unwrap();

    let tokens = store.get_device_tokens().await.unwrap();
    assert_eq!(tokens.len(), 2);
}
