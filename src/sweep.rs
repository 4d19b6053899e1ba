//! The trigger engine ties evaluation, decision, generation, and
//! delivery into the sequences the scheduler and ingestion endpoints
//! invoke. One trigger's failure never blocks the rest of a sweep.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::catalog::TriggerId;
use crate::context::TriggerContext;
use crate::decision::DecisionEngine;
use crate::evaluators::{self, TriggerResult, PATTERN_TRIGGERS};
use crate::generator::{fallback_message, MessageGenerator};
use crate::pipeline::DeliveryPipeline;
use crate::traits::{CalendarBackend, HistoryStore, SignalStore};

/// What happened to one trigger during a sweep or event check.
#[derive(Debug, Clone, Serialize)]
pub struct FireOutcome {
    pub trigger_id: String,
    pub fired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FireOutcome {
    fn fired(id: TriggerId, message: String) -> Self {
        Self {
            trigger_id: id.as_str().to_string(),
            fired: true,
            reason: None,
            message: Some(message),
        }
    }

    fn suppressed(id: TriggerId, reason: impl Into<String>) -> Self {
        Self {
            trigger_id: id.as_str().to_string(),
            fired: false,
            reason: Some(reason.into()),
            message: None,
        }
    }
}

/// Result of the daily morning check-in run.
#[derive(Debug, Serialize)]
pub struct MorningOutcome {
    pub triggered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

/// Result of one calendar sweep.
#[derive(Debug, Serialize)]
pub struct CalendarOutcome {
    pub checked: usize,
    pub results: Vec<FireOutcome>,
}

pub struct TriggerEngine {
    store: Arc<dyn HistoryStore>,
    decision: DecisionEngine,
    generator: MessageGenerator,
    pipeline: DeliveryPipeline,
    calendar: Option<Arc<dyn CalendarBackend>>,
}

impl TriggerEngine {
    pub fn new(
        store: Arc<dyn HistoryStore>,
        decision: DecisionEngine,
        generator: MessageGenerator,
        pipeline: DeliveryPipeline,
        calendar: Option<Arc<dyn CalendarBackend>>,
    ) -> Self {
        Self {
            store,
            decision,
            generator,
            pipeline,
            calendar,
        }
    }

    /// Hourly sweep over every pattern trigger. Evaluator or decision
    /// errors are folded into that trigger's outcome so the remaining
    /// triggers still run.
    pub async fn run_pattern_sweep(&self) -> Vec<FireOutcome> {
        let mut outcomes = Vec::with_capacity(PATTERN_TRIGGERS.len());
        for id in PATTERN_TRIGGERS {
            let outcome = match self.check_and_fire(id).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(trigger = %id, error = %err, "trigger check failed");
                    FireOutcome::suppressed(id, format!("Error: {err}"))
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn check_and_fire(&self, id: TriggerId) -> anyhow::Result<FireOutcome> {
        let result = evaluators::evaluate_pattern(id, self.store.as_ref()).await?;
        self.decide_and_fire(result).await
    }

    /// Run an already-evaluated trigger result through decision,
    /// generation, and delivery.
    pub async fn decide_and_fire(&self, result: TriggerResult) -> anyhow::Result<FireOutcome> {
        let id = result.trigger_id;
        if !result.should_fire {
            return Ok(FireOutcome::suppressed(id, "Condition not met"));
        }

        let context = match result.context {
            Some(context) => context,
            None => anyhow::bail!("{id} fired without context"),
        };
        let context_json = context.to_json();

        let decision = self.decision.decide(id.as_str(), Some(&context_json)).await?;
        if !decision.should_fire {
            let reason = decision.reason.unwrap_or_else(|| "Suppressed".to_string());
            info!(trigger = %id, %reason, "trigger suppressed");
            return Ok(FireOutcome::suppressed(id, reason));
        }

        let message = self.generator.generate(&context).await;
        self.pipeline
            .deliver(id.as_str(), context_json, &message, id.definition().priority)
            .await;

        Ok(FireOutcome::fired(id, message))
    }

    /// 15-minute calendar sweep: events starting 60-75 minutes out are
    /// candidates for `meeting_prep`.
    pub async fn run_calendar_sweep(&self) -> CalendarOutcome {
        let calendar = match &self.calendar {
            Some(calendar) => calendar,
            None => {
                info!("calendar not configured, nothing to check");
                return CalendarOutcome {
                    checked: 0,
                    results: Vec::new(),
                };
            }
        };

        let now = Utc::now();
        let events = match calendar
            .upcoming_events(now + Duration::minutes(60), now + Duration::minutes(75))
            .await
        {
            Ok(events) => events,
            Err(err) => {
                error!(error = %err, "calendar lookup failed");
                return CalendarOutcome {
                    checked: 0,
                    results: Vec::new(),
                };
            }
        };

        let mut results = Vec::new();
        for event in &events {
            let result = evaluators::meeting_upcoming(event);
            match self.decide_and_fire(result).await {
                Ok(outcome) => results.push(outcome),
                Err(err) => {
                    error!(error = %err, title = %event.title, "meeting check failed");
                    results.push(FireOutcome::suppressed(
                        TriggerId::MeetingPrep,
                        format!("Error: {err}"),
                    ));
                }
            }
        }

        CalendarOutcome {
            checked: events.len(),
            results,
        }
    }

    /// Daily check-in. The decision gate runs first so a same-day rerun
    /// skips the context gathering entirely; delivery is skipped (but
    /// the outcome still reported) when no channel is configured.
    pub async fn run_morning_checkin(&self) -> anyhow::Result<MorningOutcome> {
        let decision = self
            .decision
            .decide(TriggerId::MorningCheckin.as_str(), None)
            .await?;
        if !decision.should_fire {
            return Ok(MorningOutcome {
                triggered: false,
                reason: decision.reason,
                message: None,
                context: None,
            });
        }

        let health = self.store.get_health_since(1).await?;
        let mood = self.store.get_mood_since(1).await?;
        let stale = self.store.get_stale_goals(7).await?;

        let context = TriggerContext::MorningCheckin {
            last_night_sleep: health.first().and_then(|h| h.sleep_hours),
            recent_mood: mood.first().map(|m| m.mood),
            pending_goals: if stale.is_empty() {
                None
            } else {
                Some(stale.len())
            },
        };
        let context_json = context.to_json();

        let message = self.generator.generate(&context).await;

        if self.pipeline.is_configured() {
            self.pipeline
                .deliver(
                    TriggerId::MorningCheckin.as_str(),
                    context_json.clone(),
                    &message,
                    TriggerId::MorningCheckin.definition().priority,
                )
                .await;
        }

        Ok(MorningOutcome {
            triggered: true,
            reason: None,
            message: Some(message),
            context: Some(context_json),
        })
    }

    /// Ingestion hook: a fresh location sample.
    pub async fn on_location(
        &self,
        lat: f64,
        lng: f64,
        name: Option<&str>,
    ) -> anyhow::Result<FireOutcome> {
        let result = evaluators::location_change(self.store.as_ref(), lat, lng, name).await?;
        self.decide_and_fire(result).await
    }

    /// Ingestion hook: an inbound email.
    pub async fn on_email(&self, from: &str, subject: &str) -> anyhow::Result<FireOutcome> {
        let result = evaluators::email_received(self.store.as_ref(), from, subject).await?;
        self.decide_and_fire(result).await
    }

    /// Simulation surface: fire a trigger unconditionally, bypassing the
    /// decision engine. Uses the fallback bank when no model backend is
    /// configured; delivers only when a channel exists.
    pub async fn force_fire(&self, id: TriggerId, context: Value) -> (String, bool) {
        let message = if self.generator.is_configured() {
            self.generator.generate_raw(id, &context).await
        } else {
            fallback_message(id)
        };

        let delivered = self.pipeline.is_configured();
        if delivered {
            self.pipeline
                .deliver(id.as_str(), context, &message, id.definition().priority)
                .await;
        }

        (message, delivered)
    }

    /// Simulation surface: dry-run every pattern trigger, reporting the
    /// evaluator verdict and what the decision engine would say, without
    /// generating or delivering anything.
    pub async fn check_all(&self) -> Vec<Value> {
        let mut results = Vec::with_capacity(PATTERN_TRIGGERS.len());
        for id in PATTERN_TRIGGERS {
            let entry = match evaluators::evaluate_pattern(id, self.store.as_ref()).await {
                Ok(result) => {
                    let context_json = result.context.as_ref().map(|c| c.to_json());
                    let decision = if result.should_fire {
                        self.decision
                            .decide(id.as_str(), context_json.as_ref())
                            .await
                            .unwrap_or_else(|err| crate::decision::DecisionResult {
                                should_fire: false,
                                reason: Some(format!("Error: {err}")),
                            })
                    } else {
                        crate::decision::DecisionResult {
                            should_fire: false,
                            reason: Some("Condition not met".to_string()),
                        }
                    };
                    serde_json::json!({
                        "triggerId": id.as_str(),
                        "conditionMet": result.should_fire,
                        "context": context_json,
                        "wouldFire": decision.should_fire,
                        "reason": decision.reason,
                    })
                }
                Err(err) => serde_json::json!({
                    "triggerId": id.as_str(),
                    "conditionMet": false,
                    "wouldFire": false,
                    "reason": format!("Error: {err}"),
                }),
            };
            results.push(entry);
        }
        results
    }

    /// Simulation surface: generation only, nothing sent or recorded.
    pub async fn preview_message(&self, id: TriggerId, context: &Value) -> String {
        self.generator.generate_raw(id, context).await
    }

    pub fn store(&self) -> &Arc<dyn HistoryStore> {
        &self.store
    }

    pub fn delivery_configured(&self) -> bool {
        self.pipeline.is_configured()
    }
}
