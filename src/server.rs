//! HTTP surface: cron invocation routes, signal ingestion, device and
//! contact registration, and the simulation harness. An external
//! scheduler drives the /cron routes; there is no in-process timer.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::catalog::TriggerId;
use crate::evaluators;
use crate::sweep::TriggerEngine;
use crate::traits::{ContactStore, HealthEntry, MoodEntry, SignalStore, Workout};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TriggerEngine>,
    pub cron_secret: Option<String>,
    pub test_secret: Option<String>,
}

type ApiError = (StatusCode, Json<Value>);

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn internal(err: anyhow::Error) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    let cron = Router::new()
        .route("/cron/check-patterns", post(cron_check_patterns))
        .route("/cron/check-calendar", post(cron_check_calendar))
        .route("/cron/morning-checkin", post(cron_morning_checkin))
        .layer(middleware::from_fn_with_state(state.clone(), cron_auth));

    let simulate = Router::new()
        .route("/simulate", post(simulate_handler))
        .layer(middleware::from_fn_with_state(state.clone(), test_auth));

    Router::new()
        .route("/health", get(health_handler))
        .route("/ingest/location", post(ingest_location))
        .route("/ingest/email", post(ingest_email))
        .route("/ingest/health", post(ingest_health))
        .route("/ingest/mood", post(ingest_mood))
        .route("/ingest/screen-time", post(ingest_screen_time))
        .route("/ingest/message", post(ingest_message))
        .route("/device/register", post(register_device))
        .route("/contacts/vip", post(upsert_vip))
        .route("/contacts/known-location", post(upsert_known_location))
        .merge(cron)
        .merge(simulate)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Auth middleware
// ---------------------------------------------------------------------------

fn bearer(headers: &HeaderMap) -> &str {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("")
}

async fn cron_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: Next,
) -> Result<impl IntoResponse, StatusCode> {
    if let Some(secret) = &state.cron_secret {
        if bearer(&headers) != secret {
            return Err(StatusCode::UNAUTHORIZED);
        }
    }
    Ok(next.run(request).await)
}

async fn test_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: Next,
) -> Result<impl IntoResponse, StatusCode> {
    if let Some(secret) = &state.test_secret {
        if bearer(&headers) != secret {
            return Err(StatusCode::UNAUTHORIZED);
        }
    }
    Ok(next.run(request).await)
}

// ---------------------------------------------------------------------------
// Cron handlers
// ---------------------------------------------------------------------------

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn cron_check_patterns(State(state): State<AppState>) -> Json<Value> {
    if !state.engine.delivery_configured() {
        info!("no push delivery method configured");
    }
    let results = state.engine.run_pattern_sweep().await;
    Json(json!({
        "timestamp": Utc::now().to_rfc3339(),
        "results": results,
    }))
}

async fn cron_check_calendar(State(state): State<AppState>) -> Json<Value> {
    let outcome = state.engine.run_calendar_sweep().await;
    Json(serde_json::to_value(outcome).unwrap_or_else(|_| json!({ "checked": 0 })))
}

async fn cron_morning_checkin(
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state.engine.run_morning_checkin().await.map_err(internal)?;
    Ok(Json(
        serde_json::to_value(outcome).unwrap_or_else(|_| json!({ "triggered": false })),
    ))
}

// ---------------------------------------------------------------------------
// Ingestion handlers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LocationBody {
    lat: f64,
    lng: f64,
    name: Option<String>,
}

async fn ingest_location(
    State(state): State<AppState>,
    Json(body): Json<LocationBody>,
) -> Result<Json<Value>, ApiError> {
    state
        .engine
        .store()
        .save_location(body.lat, body.lng, body.name.as_deref())
        .await
        .map_err(internal)?;

    let outcome = state
        .engine
        .on_location(body.lat, body.lng, body.name.as_deref())
        .await
        .map_err(internal)?;
    Ok(Json(json!({ "saved": true, "result": outcome })))
}

#[derive(Deserialize)]
struct EmailBody {
    from: String,
    subject: String,
}

async fn ingest_email(
    State(state): State<AppState>,
    Json(body): Json<EmailBody>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state
        .engine
        .on_email(&body.from, &body.subject)
        .await
        .map_err(internal)?;
    Ok(Json(json!({ "result": outcome })))
}

#[derive(Deserialize)]
struct HealthBody {
    sleep_hours: Option<f64>,
    steps: Option<i64>,
    active_minutes: Option<i64>,
    #[serde(default)]
    workouts: Vec<Workout>,
}

async fn ingest_health(
    State(state): State<AppState>,
    Json(body): Json<HealthBody>,
) -> Result<Json<Value>, ApiError> {
    let entry = HealthEntry {
        id: uuid::Uuid::new_v4().to_string(),
        sleep_hours: body.sleep_hours,
        steps: body.steps,
        active_minutes: body.active_minutes,
        workouts: body.workouts,
        created_at: Utc::now(),
    };
    state.engine.store().save_health(&entry).await.map_err(internal)?;
    Ok(Json(json!({ "saved": true, "id": entry.id })))
}

#[derive(Deserialize)]
struct MoodBody {
    mood: i64,
    energy: Option<i64>,
    notes: Option<String>,
}

async fn ingest_mood(
    State(state): State<AppState>,
    Json(body): Json<MoodBody>,
) -> Result<Json<Value>, ApiError> {
    if !(1..=5).contains(&body.mood) {
        return Err(bad_request("mood must be between 1 and 5"));
    }
    let entry = MoodEntry {
        id: uuid::Uuid::new_v4().to_string(),
        mood: body.mood,
        energy: body.energy,
        notes: body.notes,
        created_at: Utc::now(),
    };
    state.engine.store().save_mood(&entry).await.map_err(internal)?;
    Ok(Json(json!({ "saved": true, "id": entry.id })))
}

#[derive(Deserialize)]
struct ScreenTimeBody {
    date: Option<String>,
    category: String,
    minutes: i64,
    app: Option<String>,
}

async fn ingest_screen_time(
    State(state): State<AppState>,
    Json(body): Json<ScreenTimeBody>,
) -> Result<Json<Value>, ApiError> {
    let date = body
        .date
        .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());
    state
        .engine
        .store()
        .save_screen_time(&date, &body.category, body.minutes, body.app.as_deref())
        .await
        .map_err(internal)?;
    Ok(Json(json!({ "saved": true })))
}

#[derive(Deserialize)]
struct MessageBody {
    content: String,
}

async fn ingest_message(
    State(state): State<AppState>,
    Json(body): Json<MessageBody>,
) -> Result<Json<Value>, ApiError> {
    state
        .engine
        .store()
        .save_user_message(&body.content)
        .await
        .map_err(internal)?;
    Ok(Json(json!({ "saved": true })))
}

// ---------------------------------------------------------------------------
// Registration handlers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct DeviceBody {
    token: String,
    #[serde(default = "default_platform")]
    platform: String,
}

fn default_platform() -> String {
    "ios".to_string()
}

async fn register_device(
    State(state): State<AppState>,
    Json(body): Json<DeviceBody>,
) -> Result<Json<Value>, ApiError> {
    state
        .engine
        .store()
        .register_device(&body.token, &body.platform)
        .await
        .map_err(internal)?;
    Ok(Json(json!({ "registered": true })))
}

#[derive(Deserialize)]
struct VipBody {
    name: String,
    email: String,
    relationship: Option<String>,
}

async fn upsert_vip(
    State(state): State<AppState>,
    Json(body): Json<VipBody>,
) -> Result<Json<Value>, ApiError> {
    state
        .engine
        .store()
        .upsert_vip(&body.name, &body.email, body.relationship.as_deref())
        .await
        .map_err(internal)?;
    Ok(Json(json!({ "saved": true })))
}

#[derive(Deserialize)]
struct KnownLocationBody {
    name: String,
    lat: f64,
    lng: f64,
    #[serde(default = "default_radius")]
    radius_meters: f64,
}

fn default_radius() -> f64 {
    100.0
}

async fn upsert_known_location(
    State(state): State<AppState>,
    Json(body): Json<KnownLocationBody>,
) -> Result<Json<Value>, ApiError> {
    state
        .engine
        .store()
        .upsert_known_location(&body.name, body.lat, body.lng, body.radius_meters)
        .await
        .map_err(internal)?;
    Ok(Json(json!({ "saved": true })))
}

// ---------------------------------------------------------------------------
// Simulation harness
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SimulateBody {
    action: String,
    #[serde(default)]
    data: Value,
}

async fn simulate_handler(
    State(state): State<AppState>,
    Json(body): Json<SimulateBody>,
) -> Result<Json<Value>, ApiError> {
    let store = state.engine.store();
    let data = &body.data;

    match body.action.as_str() {
        "inject_bad_sleep" => {
            let sleep = data.get("sleepHours").and_then(Value::as_f64).unwrap_or(4.0);
            for _ in 0..3 {
                let entry = HealthEntry {
                    id: uuid::Uuid::new_v4().to_string(),
                    sleep_hours: Some(sleep),
                    steps: Some(5000),
                    active_minutes: None,
                    workouts: vec![],
                    created_at: Utc::now(),
                };
                store.save_health(&entry).await.map_err(internal)?;
            }
            Ok(Json(json!({ "success": true, "injected": 3 })))
        }

        "inject_low_mood" => {
            let mood = data.get("mood").and_then(Value::as_i64).unwrap_or(2);
            for _ in 0..3 {
                let entry = MoodEntry {
                    id: uuid::Uuid::new_v4().to_string(),
                    mood,
                    energy: Some(2),
                    notes: Some("Simulated low mood".to_string()),
                    created_at: Utc::now(),
                };
                store.save_mood(&entry).await.map_err(internal)?;
            }
            Ok(Json(json!({ "success": true, "injected": 3 })))
        }

        "inject_location" => {
            let lat = data.get("lat").and_then(Value::as_f64).unwrap_or(37.7749);
            let lng = data.get("lng").and_then(Value::as_f64).unwrap_or(-122.4194);
            let name = data
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("Gym")
                .to_string();

            store
                .save_location(lat, lng, Some(&name))
                .await
                .map_err(internal)?;

            // Evaluation only; the real ingestion path goes on to the
            // decision engine and delivery.
            let result = evaluators::location_change(store.as_ref(), lat, lng, Some(&name))
                .await
                .map_err(internal)?;

            Ok(Json(json!({
                "success": true,
                "location": { "lat": lat, "lng": lng, "name": name },
                "triggerResult": {
                    "shouldFire": result.should_fire,
                    "triggerId": result.trigger_id.as_str(),
                    "context": result.context.map(|c| c.to_json()),
                },
            })))
        }

        "inject_screen_time" => {
            let date = Local::now().format("%Y-%m-%d").to_string();
            let category = data
                .get("category")
                .and_then(Value::as_str)
                .unwrap_or("social");
            let minutes = data.get("minutes").and_then(Value::as_i64).unwrap_or(200);
            let app = data.get("app").and_then(Value::as_str).unwrap_or("Instagram");

            store
                .save_screen_time(&date, category, minutes, Some(app))
                .await
                .map_err(internal)?;
            Ok(Json(json!({ "success": true })))
        }

        "force_trigger" => {
            let id = parse_trigger_id(data)?;
            let context = data.get("context").cloned().unwrap_or_else(|| json!({}));

            let (message, delivered) = state.engine.force_fire(id, context).await;
            Ok(Json(json!({
                "success": true,
                "triggerId": id.as_str(),
                "message": message,
                "delivered": delivered,
            })))
        }

        "test_message" => {
            let id = parse_trigger_id(data)?;
            let context = data.get("context").cloned().unwrap_or_else(|| json!({}));

            let message = state.engine.preview_message(id, &context).await;
            Ok(Json(json!({
                "success": true,
                "triggerId": id.as_str(),
                "message": message,
            })))
        }

        "check_all" => {
            let results = state.engine.check_all().await;
            Ok(Json(json!({ "results": results })))
        }

        _ => Err(bad_request("Unknown action")),
    }
}

fn parse_trigger_id(data: &Value) -> Result<TriggerId, ApiError> {
    let raw = data
        .get("triggerId")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request("triggerId required"))?;
    TriggerId::parse(raw).ok_or_else(|| bad_request("unknown triggerId"))
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

pub async fn serve(state: AppState, bind_addr: &str, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let ip: std::net::IpAddr = bind_addr
        .parse()
        .unwrap_or_else(|_| std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST));
    let addr = std::net::SocketAddr::new(ip, port);
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
