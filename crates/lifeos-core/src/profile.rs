//! Gamification profile record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row per user: experience points, level, and streak bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// User identifier (supplied by the external identity provider).
    pub id: String,
    /// Experience points within the current level.
    pub xp: i64,
    /// Current level, starting at 1.
    pub level: i64,
    /// Consecutive-day streak. Part of the data model but mutated by no code
    /// path; kept as inert state until product intent is clarified.
    pub streak: i64,
    /// Last date the user was active.
    #[serde(default)]
    pub last_active_date: Option<NaiveDate>,
}

impl Profile {
    /// A fresh default profile for `user_id`, created lazily on first access.
    #[must_use]
    pub fn fresh(user_id: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            id: user_id.into(),
            xp: 0,
            level: 1,
            streak: 0,
            last_active_date: Some(today),
        }
    }
}

/// Partial profile update. Only the fields the ledger writes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    /// New XP value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp: Option<i64>,
    /// New level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    /// New last-active date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active_date: Option<NaiveDate>,
}

impl ProfilePatch {
    /// Apply the patch to an in-memory profile.
    pub fn apply(&self, profile: &mut Profile) {
        if let Some(xp) = self.xp {
            profile.xp = xp;
        }
        if let Some(level) = self.level {
            profile.level = level;
        }
        if let Some(date) = self.last_active_date {
            profile.last_active_date = Some(date);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_profile_defaults() {
        let today: NaiveDate = "2026-01-10".parse().unwrap();
        let profile = Profile::fresh("user-1", today);
        assert_eq!(profile.xp, 0);
        assert_eq!(profile.level, 1);
        assert_eq!(profile.streak, 0);
        assert_eq!(profile.last_active_date, Some(today));
    }

    #[test]
    fn patch_never_touches_streak() {
        let today: NaiveDate = "2026-01-10".parse().unwrap();
        let mut profile = Profile::fresh("user-1", today);
        profile.streak = 7;
        let patch = ProfilePatch {
            xp: Some(40),
            level: Some(2),
            last_active_date: Some(today),
        };
        patch.apply(&mut profile);
        assert_eq!(profile.streak, 7);
        assert_eq!(profile.xp, 40);
    }
}
