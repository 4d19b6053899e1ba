//! Trigger evaluators. Pattern evaluators scan recent signal history on
//! each cron sweep; event evaluators run inline when a matching signal
//! is ingested. Evaluators only answer "does the condition hold"; the
//! decision engine decides whether a firing actually notifies.

use chrono::Utc;

use crate::catalog::TriggerId;
use crate::context::{round1, TriggerContext};
use crate::traits::{CalendarEvent, ContactStore, HistoryStore, SignalStore};

/// Outcome of evaluating one trigger condition.
#[derive(Debug, Clone)]
pub struct TriggerResult {
    pub should_fire: bool,
    pub trigger_id: TriggerId,
    pub context: Option<TriggerContext>,
}

impl TriggerResult {
    fn fire(trigger_id: TriggerId, context: TriggerContext) -> Self {
        Self {
            should_fire: true,
            trigger_id,
            context: Some(context),
        }
    }

    fn pass(trigger_id: TriggerId) -> Self {
        Self {
            should_fire: false,
            trigger_id,
            context: None,
        }
    }
}

/// The pattern triggers a cron sweep evaluates, in sweep order.
pub const PATTERN_TRIGGERS: [TriggerId; 6] = [
    TriggerId::SleepDeprived,
    TriggerId::WorkoutStreakBroken,
    TriggerId::LowMoodStreak,
    TriggerId::GoalStale,
    TriggerId::GoneQuiet,
    TriggerId::Doomscroll,
];

/// Evaluate one pattern trigger against stored signal history.
pub async fn evaluate_pattern(
    id: TriggerId,
    store: &dyn HistoryStore,
) -> anyhow::Result<TriggerResult> {
    match id {
        TriggerId::SleepDeprived => sleep_deprived(store).await,
        TriggerId::WorkoutStreakBroken => workout_streak_broken(store).await,
        TriggerId::LowMoodStreak => low_mood_streak(store).await,
        TriggerId::GoalStale => goal_stale(store).await,
        TriggerId::GoneQuiet => gone_quiet(store).await,
        TriggerId::Doomscroll => doomscroll(store).await,
        other => anyhow::bail!("{other} is not a pattern trigger"),
    }
}

/// Average sleep under 5 hours over the last 3 entries with sleep data.
/// Fewer than 3 entries (or fewer than 3 with sleep data) never fires.
async fn sleep_deprived(store: &dyn HistoryStore) -> anyhow::Result<TriggerResult> {
    let entries = store.get_health_since(3).await?;
    if entries.len() < 3 {
        return Ok(TriggerResult::pass(TriggerId::SleepDeprived));
    }

    let sleep: Vec<f64> = entries.iter().filter_map(|e| e.sleep_hours).collect();
    if sleep.len() < 3 {
        return Ok(TriggerResult::pass(TriggerId::SleepDeprived));
    }

    let avg = sleep[..3].iter().sum::<f64>() / 3.0;
    if avg < 5.0 {
        return Ok(TriggerResult::fire(
            TriggerId::SleepDeprived,
            TriggerContext::SleepDeprived {
                avg_sleep: round1(avg),
                days: 3,
            },
        ));
    }

    Ok(TriggerResult::pass(TriggerId::SleepDeprived))
}

/// No entry in the last 7 days records a workout. An empty window also
/// fires; absence of data is absence of workouts.
async fn workout_streak_broken(store: &dyn HistoryStore) -> anyhow::Result<TriggerResult> {
    let entries = store.get_health_since(7).await?;
    let has_workout = entries.iter().any(|e| !e.workouts.is_empty());

    if !has_workout {
        return Ok(TriggerResult::fire(
            TriggerId::WorkoutStreakBroken,
            TriggerContext::WorkoutStreakBroken {
                days_since_workout: 7,
            },
        ));
    }

    Ok(TriggerResult::pass(TriggerId::WorkoutStreakBroken))
}

/// Average of the 3 most recent mood entries below 2.5 on the 1-5 scale.
async fn low_mood_streak(store: &dyn HistoryStore) -> anyhow::Result<TriggerResult> {
    let entries = store.get_mood_since(3).await?;
    if entries.len() < 3 {
        return Ok(TriggerResult::pass(TriggerId::LowMoodStreak));
    }

    let avg = entries[..3].iter().map(|e| e.mood as f64).sum::<f64>() / 3.0;
    if avg < 2.5 {
        return Ok(TriggerResult::fire(
            TriggerId::LowMoodStreak,
            TriggerContext::LowMoodStreak {
                avg_mood: round1(avg),
                days: 3,
            },
        ));
    }

    Ok(TriggerResult::pass(TriggerId::LowMoodStreak))
}

/// Any active goal untouched for 14 days.
async fn goal_stale(store: &dyn HistoryStore) -> anyhow::Result<TriggerResult> {
    let stale = store.get_stale_goals(14).await?;
    if stale.is_empty() {
        return Ok(TriggerResult::pass(TriggerId::GoalStale));
    }

    let count = stale.len();
    Ok(TriggerResult::fire(
        TriggerId::GoalStale,
        TriggerContext::GoalStale {
            stale_goals: stale.into_iter().map(|g| g.title).collect(),
            count,
        },
    ))
}

/// No user-authored message in over 48 hours. Fires with an unknown
/// silence duration when no message was ever recorded.
async fn gone_quiet(store: &dyn HistoryStore) -> anyhow::Result<TriggerResult> {
    let last = match store.get_last_user_message().await? {
        Some(msg) => msg,
        None => {
            return Ok(TriggerResult::fire(
                TriggerId::GoneQuiet,
                TriggerContext::GoneQuiet { hours_silent: None },
            ));
        }
    };

    let hours_silent = (Utc::now() - last.created_at).num_minutes() as f64 / 60.0;
    if hours_silent > 48.0 {
        return Ok(TriggerResult::fire(
            TriggerId::GoneQuiet,
            TriggerContext::GoneQuiet {
                hours_silent: Some(hours_silent.round() as i64),
            },
        ));
    }

    Ok(TriggerResult::pass(TriggerId::GoneQuiet))
}

/// More than 3 hours of social-category screen time today.
async fn doomscroll(store: &dyn HistoryStore) -> anyhow::Result<TriggerResult> {
    let minutes = store.get_screen_time_minutes("social", 1).await?;
    if minutes > 180 {
        return Ok(TriggerResult::fire(
            TriggerId::Doomscroll,
            TriggerContext::Doomscroll {
                minutes,
                hours: round1(minutes as f64 / 60.0),
            },
        ));
    }

    Ok(TriggerResult::pass(TriggerId::Doomscroll))
}

/// A location sample arriving from ingestion. A venue name containing
/// "gym" or "fitness" matches `at_gym` without any geofence check;
/// otherwise the sample is tested against every registered geofence and
/// the nearest containing one wins.
pub async fn location_change(
    store: &dyn HistoryStore,
    lat: f64,
    lng: f64,
    name: Option<&str>,
) -> anyhow::Result<TriggerResult> {
    if let Some(name) = name {
        let lower = name.to_lowercase();
        if lower.contains("gym") || lower.contains("fitness") {
            return Ok(TriggerResult::fire(
                TriggerId::AtGym,
                TriggerContext::AtGym {
                    location: name.to_string(),
                },
            ));
        }
    }

    let mut best: Option<(String, f64)> = None;
    for known in store.get_known_locations().await? {
        let distance = haversine_meters(lat, lng, known.lat, known.lng);
        if distance < known.radius_meters {
            let closer = best.as_ref().map(|(_, d)| distance < *d).unwrap_or(true);
            if closer {
                best = Some((known.name, distance));
            }
        }
    }

    if let Some((location, distance)) = best {
        return Ok(TriggerResult::fire(
            TriggerId::AtLocation,
            TriggerContext::AtLocation {
                location,
                distance_meters: distance.round() as i64,
            },
        ));
    }

    Ok(TriggerResult::pass(TriggerId::AtLocation))
}

/// An inbound email. Fires only when the sender is a registered VIP;
/// the context carries the VIP's name rather than the raw address.
pub async fn email_received(
    store: &dyn HistoryStore,
    from: &str,
    subject: &str,
) -> anyhow::Result<TriggerResult> {
    if let Some(vip) = store.lookup_vip_by_email(from).await? {
        return Ok(TriggerResult::fire(
            TriggerId::VipEmail,
            TriggerContext::VipEmail {
                from: vip.name,
                relationship: vip.relationship,
                subject: subject.to_string(),
            },
        ));
    }

    Ok(TriggerResult::pass(TriggerId::VipEmail))
}

/// An upcoming calendar event. "Big" means 3+ attendees or a title
/// mentioning an interview, investor, or the word "important".
pub fn meeting_upcoming(event: &CalendarEvent) -> TriggerResult {
    let title_lower = event.title.to_lowercase();
    let big = event.attendee_count >= 3
        || title_lower.contains("interview")
        || title_lower.contains("investor")
        || title_lower.contains("important");

    if big {
        return TriggerResult::fire(
            TriggerId::MeetingPrep,
            TriggerContext::MeetingPrep {
                title: event.title.clone(),
                attendees: event.attendee_count,
                start_time: event.start_time.clone(),
            },
        );
    }

    TriggerResult::pass(TriggerId::MeetingPrep)
}

/// Great-circle distance in meters.
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}
