//! Static trigger catalog: every condition category the daemon can
//! notify about, with its cooldown and priority.

use crate::types::Priority;

/// A named condition category that can cause a proactive notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerId {
    SleepDeprived,
    WorkoutStreakBroken,
    LowMoodStreak,
    GoalStale,
    GoneQuiet,
    Doomscroll,
    AtGym,
    AtLocation,
    VipEmail,
    MeetingPrep,
    MorningCheckin,
}

impl TriggerId {
    /// Every defined trigger, in catalog order.
    pub const ALL: [TriggerId; 11] = [
        TriggerId::SleepDeprived,
        TriggerId::WorkoutStreakBroken,
        TriggerId::LowMoodStreak,
        TriggerId::GoalStale,
        TriggerId::GoneQuiet,
        TriggerId::Doomscroll,
        TriggerId::AtGym,
        TriggerId::AtLocation,
        TriggerId::VipEmail,
        TriggerId::MeetingPrep,
        TriggerId::MorningCheckin,
    ];

    /// Stable symbolic key, used as the foreign key in persistence and
    /// in HTTP payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerId::SleepDeprived => "sleep_deprived",
            TriggerId::WorkoutStreakBroken => "workout_streak_broken",
            TriggerId::LowMoodStreak => "low_mood_streak",
            TriggerId::GoalStale => "goal_stale",
            TriggerId::GoneQuiet => "gone_quiet",
            TriggerId::Doomscroll => "doomscroll",
            TriggerId::AtGym => "at_gym",
            TriggerId::AtLocation => "at_location",
            TriggerId::VipEmail => "vip_email",
            TriggerId::MeetingPrep => "meeting_prep",
            TriggerId::MorningCheckin => "morning_checkin",
        }
    }

    pub fn parse(s: &str) -> Option<TriggerId> {
        TriggerId::ALL.iter().copied().find(|id| id.as_str() == s)
    }

    pub fn definition(&self) -> &'static TriggerDef {
        &CATALOG[TriggerId::ALL.iter().position(|id| id == self).unwrap_or(0)]
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable definition of a trigger: human description, minimum time
/// between approved fires, and priority.
///
/// A cooldown of 0 means the trigger is deduplicated per-context by the
/// decision engine instead of per-id.
#[derive(Debug)]
pub struct TriggerDef {
    pub id: TriggerId,
    pub description: &'static str,
    pub cooldown_hours: i64,
    pub priority: Priority,
}

static CATALOG: [TriggerDef; 11] = [
    TriggerDef {
        id: TriggerId::SleepDeprived,
        description: "Sleep < 5 hours for 3 days",
        cooldown_hours: 24,
        priority: Priority::Medium,
    },
    TriggerDef {
        id: TriggerId::WorkoutStreakBroken,
        description: "No workout in 7 days",
        cooldown_hours: 48,
        priority: Priority::Low,
    },
    TriggerDef {
        id: TriggerId::LowMoodStreak,
        description: "Bad mood for 3 days",
        cooldown_hours: 24,
        priority: Priority::High,
    },
    TriggerDef {
        id: TriggerId::GoalStale,
        description: "Goal not updated in 14 days",
        cooldown_hours: 168,
        priority: Priority::Low,
    },
    TriggerDef {
        id: TriggerId::GoneQuiet,
        description: "Haven't talked in 2 days",
        cooldown_hours: 48,
        priority: Priority::Low,
    },
    TriggerDef {
        id: TriggerId::Doomscroll,
        description: "Screen time > 3hrs on social",
        cooldown_hours: 24,
        priority: Priority::Medium,
    },
    TriggerDef {
        id: TriggerId::AtGym,
        description: "Arrived at gym",
        cooldown_hours: 12,
        priority: Priority::Medium,
    },
    TriggerDef {
        id: TriggerId::AtLocation,
        description: "Arrived at known location",
        cooldown_hours: 12,
        priority: Priority::Medium,
    },
    TriggerDef {
        id: TriggerId::VipEmail,
        description: "Email from VIP contact",
        cooldown_hours: 0,
        priority: Priority::High,
    },
    TriggerDef {
        id: TriggerId::MeetingPrep,
        description: "Big meeting in 1 hour",
        cooldown_hours: 0,
        priority: Priority::High,
    },
    TriggerDef {
        id: TriggerId::MorningCheckin,
        description: "Daily morning check-in",
        cooldown_hours: 24,
        priority: Priority::Low,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrips_every_id() {
        for id in TriggerId::ALL {
            assert_eq!(TriggerId::parse(id.as_str()), Some(id));
        }
        assert_eq!(TriggerId::parse("not_a_trigger"), None);
    }

    #[test]
    fn definitions_match_their_ids() {
        for id in TriggerId::ALL {
            assert_eq!(id.definition().id, id);
        }
    }

    #[test]
    fn per_context_triggers_have_zero_cooldown() {
        assert_eq!(TriggerId::VipEmail.definition().cooldown_hours, 0);
        assert_eq!(TriggerId::MeetingPrep.definition().cooldown_hours, 0);
        assert_eq!(TriggerId::GoalStale.definition().cooldown_hours, 168);
    }
}
