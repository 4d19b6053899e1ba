//! Typed trigger context: one variant per trigger id, replacing the
//! free-form key/value maps the evaluators would otherwise emit. The
//! JSON field names match what history records store, so per-context
//! dedup can read them back from persisted fires.

use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerContext {
    SleepDeprived {
        avg_sleep: f64,
        days: u32,
    },
    WorkoutStreakBroken {
        days_since_workout: u32,
    },
    LowMoodStreak {
        avg_mood: f64,
        days: u32,
    },
    GoalStale {
        stale_goals: Vec<String>,
        count: usize,
    },
    GoneQuiet {
        /// None when no user message was ever recorded ("unknown").
        hours_silent: Option<i64>,
    },
    Doomscroll {
        minutes: i64,
        hours: f64,
    },
    AtGym {
        location: String,
    },
    AtLocation {
        location: String,
        distance_meters: i64,
    },
    VipEmail {
        from: String,
        relationship: Option<String>,
        subject: String,
    },
    MeetingPrep {
        title: String,
        attendees: u32,
        start_time: String,
    },
    MorningCheckin {
        last_night_sleep: Option<f64>,
        recent_mood: Option<i64>,
        pending_goals: Option<usize>,
    },
}

impl TriggerContext {
    /// Serialize to the flat JSON shape stored in trigger fire records.
    pub fn to_json(&self) -> Value {
        match self {
            TriggerContext::SleepDeprived { avg_sleep, days } => {
                json!({ "avgSleep": avg_sleep, "days": days })
            }
            TriggerContext::WorkoutStreakBroken { days_since_workout } => {
                json!({ "daysSinceWorkout": days_since_workout })
            }
            TriggerContext::LowMoodStreak { avg_mood, days } => {
                json!({ "avgMood": avg_mood, "days": days })
            }
            TriggerContext::GoalStale { stale_goals, count } => {
                json!({ "staleGoals": stale_goals, "count": count })
            }
            TriggerContext::GoneQuiet { hours_silent } => match hours_silent {
                Some(h) => json!({ "hoursSilent": h }),
                None => json!({ "hoursSilent": "unknown" }),
            },
            TriggerContext::Doomscroll { minutes, hours } => {
                json!({ "minutes": minutes, "hours": hours })
            }
            TriggerContext::AtGym { location } => {
                json!({ "location": location, "type": "gym" })
            }
            TriggerContext::AtLocation {
                location,
                distance_meters,
            } => {
                json!({ "location": location, "distance": distance_meters })
            }
            TriggerContext::VipEmail {
                from,
                relationship,
                subject,
            } => {
                json!({ "from": from, "relationship": relationship, "subject": subject })
            }
            TriggerContext::MeetingPrep {
                title,
                attendees,
                start_time,
            } => {
                json!({ "title": title, "attendees": attendees, "startTime": start_time })
            }
            TriggerContext::MorningCheckin {
                last_night_sleep,
                recent_mood,
                pending_goals,
            } => {
                let mut obj = json!({ "type": "morning_checkin" });
                if let Some(sleep) = last_night_sleep {
                    obj["lastNightSleep"] = json!(sleep);
                }
                if let Some(mood) = recent_mood {
                    obj["recentMood"] = json!(mood);
                }
                if let Some(goals) = pending_goals {
                    obj["pendingGoals"] = json!(goals);
                }
                obj
            }
        }
    }

    /// The context field that makes a fire unique for dedup purposes,
    /// if this trigger is deduplicated per-context rather than per-id.
    pub fn dedup_field(&self) -> Option<(&'static str, &str)> {
        match self {
            TriggerContext::VipEmail { subject, .. } => Some(("subject", subject)),
            TriggerContext::MeetingPrep { title, .. } => Some(("title", title)),
            _ => None,
        }
    }
}

/// Round to one decimal place (averages reported in contexts).
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_context_uses_stored_field_names() {
        let ctx = TriggerContext::SleepDeprived {
            avg_sleep: 4.2,
            days: 3,
        };
        let v = ctx.to_json();
        assert_eq!(v["avgSleep"], 4.2);
        assert_eq!(v["days"], 3);
    }

    #[test]
    fn gone_quiet_without_history_serializes_unknown() {
        let ctx = TriggerContext::GoneQuiet { hours_silent: None };
        assert_eq!(ctx.to_json()["hoursSilent"], "unknown");
        let ctx = TriggerContext::GoneQuiet {
            hours_silent: Some(52),
        };
        assert_eq!(ctx.to_json()["hoursSilent"], 52);
    }

    #[test]
    fn dedup_fields_only_for_per_context_triggers() {
        let email = TriggerContext::VipEmail {
            from: "Ana".into(),
            relationship: Some("mentor".into()),
            subject: "Q3 review".into(),
        };
        assert_eq!(email.dedup_field(), Some(("subject", "Q3 review")));

        let meeting = TriggerContext::MeetingPrep {
            title: "Board sync".into(),
            attendees: 5,
            start_time: "2026-08-23T15:00:00Z".into(),
        };
        assert_eq!(meeting.dedup_field(), Some(("title", "Board sync")));

        let sleep = TriggerContext::SleepDeprived {
            avg_sleep: 4.0,
            days: 3,
        };
        assert_eq!(sleep.dedup_field(), None);
    }

    #[test]
    fn round1_rounds_half_up() {
        assert_eq!(round1(4.25), 4.3);
        assert_eq!(round1(4.04), 4.0);
    }
}
