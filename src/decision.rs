//! Decision engine: the policy gate between "a trigger condition holds"
//! and "the user actually gets notified". Checks run in a fixed order
//! and the first failing check wins: unknown trigger, cooldown, quiet
//! hours, then per-context dedup.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, Timelike, Utc};
use serde_json::Value;
use tracing::debug;

use crate::catalog::TriggerId;
use crate::config::QuietHoursConfig;
use crate::traits::{HistoryStore, TriggerLogStore};

/// Per-context dedup looks back this many hours.
const DEDUP_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionResult {
    pub should_fire: bool,
    pub reason: Option<String>,
}

impl DecisionResult {
    fn approve() -> Self {
        Self {
            should_fire: true,
            reason: None,
        }
    }

    fn suppress(reason: impl Into<String>) -> Self {
        Self {
            should_fire: false,
            reason: Some(reason.into()),
        }
    }
}

pub struct DecisionEngine {
    store: Arc<dyn HistoryStore>,
    quiet: QuietHoursConfig,
}

impl DecisionEngine {
    pub fn new(store: Arc<dyn HistoryStore>, quiet: QuietHoursConfig) -> Self {
        Self { store, quiet }
    }

    /// Decide whether a firing may notify right now.
    pub async fn decide(
        &self,
        trigger_id: &str,
        context: Option<&Value>,
    ) -> anyhow::Result<DecisionResult> {
        self.decide_at(trigger_id, context, Local::now()).await
    }

    /// Same as [`decide`] with an explicit wall clock. Quiet hours are
    /// judged in local time; cooldown math uses the equivalent instant.
    pub async fn decide_at(
        &self,
        trigger_id: &str,
        context: Option<&Value>,
        now: DateTime<Local>,
    ) -> anyhow::Result<DecisionResult> {
        let id = match TriggerId::parse(trigger_id) {
            Some(id) => id,
            None => return Ok(DecisionResult::suppress("Unknown trigger")),
        };
        let def = id.definition();
        let now_utc = now.with_timezone(&Utc);

        let last_fire = self.store.get_last_fire(trigger_id).await?;

        if def.cooldown_hours > 0 {
            if let Some(last) = &last_fire {
                let hours_since =
                    (now_utc - last.fired_at).num_minutes() as f64 / 60.0;
                if hours_since < def.cooldown_hours as f64 {
                    let remaining = (def.cooldown_hours as f64 - hours_since).round();
                    debug!(trigger_id, remaining, "suppressed by cooldown");
                    return Ok(DecisionResult::suppress(format!(
                        "Cooldown: {remaining}h remaining"
                    )));
                }
            }
        }

        if def.priority != crate::types::Priority::High {
            let hour = now.hour();
            let is_quiet = hour >= self.quiet.start || hour < self.quiet.end;
            if is_quiet {
                debug!(trigger_id, hour, "suppressed by quiet hours");
                return Ok(DecisionResult::suppress(format!(
                    "Quiet hours ({}:00 - {}:00)",
                    self.quiet.start, self.quiet.end
                )));
            }
        }

        if let Some(key) = dedup_key(id) {
            if let (Some(candidate), Some(last)) = (context, &last_fire) {
                let within_window =
                    now_utc - last.fired_at <= Duration::hours(DEDUP_WINDOW_HOURS);
                let same_context = candidate
                    .get(key)
                    .map(|v| last.context.get(key) == Some(v))
                    .unwrap_or(false);
                if within_window && same_context {
                    let what = match id {
                        TriggerId::MeetingPrep => "meeting",
                        _ => "email",
                    };
                    return Ok(DecisionResult::suppress(format!(
                        "Already notified about this {what}"
                    )));
                }
            }
        }

        Ok(DecisionResult::approve())
    }
}

/// The context field that identifies a distinct event for triggers that
/// are deduplicated per-context instead of by cooldown.
fn dedup_key(id: TriggerId) -> Option<&'static str> {
    match id {
        TriggerId::VipEmail => Some("subject"),
        TriggerId::MeetingPrep => Some("title"),
        _ => None,
    }
}
