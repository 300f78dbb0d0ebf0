//! Achievement catalog and unlock evaluation.
//!
//! Unlock rules are fixed thresholds over quantities that only grow during a
//! challenge run (completed days, streak, XP, check-ins, focus minutes), so the
//! evaluated key set never shrinks while its inputs don't decrease.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::challenge::ChallengeState;

/// Catalog entry, normally defined remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub key: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<i64>,
    pub sort: i32,
}

/// A per-actor unlock. Once recorded it is never revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unlock {
    pub key: String,
    pub unlocked_at: DateTime<Utc>,
}

/// Quantity a rule compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Metric {
    CompletedDays,
    Streak,
    Xp,
    Checkins,
    HabitMinutes,
}

struct UnlockRule {
    key: &'static str,
    title: &'static str,
    description: &'static str,
    tier: &'static str,
    metric: Metric,
    threshold: i64,
}

const RULES: &[UnlockRule] = &[
    UnlockRule {
        key: "first_day",
        title: "First Step",
        description: "Complete your first day",
        tier: "bronze",
        metric: Metric::CompletedDays,
        threshold: 1,
    },
    UnlockRule {
        key: "first_checkin",
        title: "Checked In",
        description: "Log your first mood check-in",
        tier: "bronze",
        metric: Metric::Checkins,
        threshold: 1,
    },
    UnlockRule {
        key: "streak_3",
        title: "Warming Up",
        description: "Complete 3 days in a row",
        tier: "bronze",
        metric: Metric::Streak,
        threshold: 3,
    },
    UnlockRule {
        key: "streak_7",
        title: "One Week Strong",
        description: "Complete 7 days in a row",
        tier: "silver",
        metric: Metric::Streak,
        threshold: 7,
    },
    UnlockRule {
        key: "streak_14",
        title: "Fortnight",
        description: "Complete 14 days in a row",
        tier: "gold",
        metric: Metric::Streak,
        threshold: 14,
    },
    UnlockRule {
        key: "streak_30",
        title: "Unbroken",
        description: "Complete 30 days in a row",
        tier: "platinum",
        metric: Metric::Streak,
        threshold: 30,
    },
    UnlockRule {
        key: "focus_60",
        title: "Deep Hour",
        description: "Log 60 minutes of focus sessions",
        tier: "bronze",
        metric: Metric::HabitMinutes,
        threshold: 60,
    },
    UnlockRule {
        key: "xp_500",
        title: "Rising",
        description: "Earn 500 XP",
        tier: "silver",
        metric: Metric::Xp,
        threshold: 500,
    },
    UnlockRule {
        key: "xp_1000",
        title: "Seasoned",
        description: "Earn 1000 XP",
        tier: "gold",
        metric: Metric::Xp,
        threshold: 1000,
    },
    UnlockRule {
        key: "xp_2500",
        title: "Veteran",
        description: "Earn 2500 XP",
        tier: "platinum",
        metric: Metric::Xp,
        threshold: 2500,
    },
];

fn metric_value(state: &ChallengeState, metric: Metric) -> i64 {
    match metric {
        Metric::CompletedDays => state.completed_days() as i64,
        Metric::Streak => i64::from(state.streak),
        Metric::Xp => state.xp,
        Metric::Checkins => state.checkins.len() as i64,
        Metric::HabitMinutes => i64::try_from(state.total_habit_minutes()).unwrap_or(i64::MAX),
    }
}

/// Achievement keys `state` qualifies for.
pub fn compute_unlocks_from_state(state: &ChallengeState) -> BTreeSet<String> {
    RULES
        .iter()
        .filter(|rule| metric_value(state, rule.metric) >= rule.threshold)
        .map(|rule| rule.key.to_string())
        .collect()
}

/// Built-in catalog matching the unlock rules, ordered by `sort`.
pub fn default_catalog() -> Vec<Achievement> {
    RULES
        .iter()
        .enumerate()
        .map(|(i, rule)| Achievement {
            key: rule.key.to_string(),
            title: rule.title.to_string(),
            description: Some(rule.description.to_string()),
            tier: Some(rule.tier.to_string()),
            icon: None,
            target: Some(rule.threshold),
            sort: (i as i32 + 1) * 10,
        })
        .collect()
}

/// Catalog entry paired with the actor's unlock, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Merge a catalog with unlocks, ordered by `sort` then key.
pub fn catalog_view(catalog: &[Achievement], unlocks: &[Unlock]) -> Vec<AchievementStatus> {
    let mut view: Vec<AchievementStatus> = catalog
        .iter()
        .map(|a| AchievementStatus {
            achievement: a.clone(),
            unlocked_at: unlocks
                .iter()
                .find(|u| u.key == a.key)
                .map(|u| u.unlocked_at),
        })
        .collect();
    view.sort_by(|a, b| {
        a.achievement
            .sort
            .cmp(&b.achievement.sort)
            .then_with(|| a.achievement.key.cmp(&b.achievement.key))
    });
    view
}
