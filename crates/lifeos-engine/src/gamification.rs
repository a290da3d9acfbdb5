//! Gamification ledger.
//!
//! One profile row per user, created lazily on first access. XP lands
//! optimistically: local profile first, remote write second, snapshot
//! rollback on failure. The level check runs once per award — the threshold
//! for the current level is `level * XP_LEVEL_STEP`, and crossing it carries
//! the remainder over and bumps the level by exactly one.
//!
//! The `streak` column is read and stored but never changed here; no traced
//! code path of the product mutates it.

use std::sync::Arc;

use lifeos_core::{constants::XP_LEVEL_STEP, Clock, Profile, ProfilePatch};
use lifeos_store::ProfileStore;
use tracing::warn;

use crate::notify::Notifier;

/// Owner of one user's cached profile.
pub struct GamificationLedger {
    store: Arc<dyn ProfileStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    user_id: String,
    profile: Option<Profile>,
}

impl GamificationLedger {
    /// Build a ledger for `user_id` over the injected ports.
    #[must_use]
    pub fn new(
        store: Arc<dyn ProfileStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            user_id: user_id.into(),
            profile: None,
        }
    }

    /// The cached profile, if loaded.
    #[must_use]
    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Load the profile, creating a default row when none exists yet.
    pub async fn fetch_profile(&mut self) {
        match self.store.fetch(&self.user_id).await {
            Ok(Some(profile)) => self.profile = Some(profile),
            Ok(None) => {
                let fresh = Profile::fresh(&self.user_id, self.clock.today());
                match self.store.create(fresh).await {
                    Ok(created) => self.profile = Some(created),
                    Err(error) => {
                        warn!(%error, user_id = %self.user_id, "profile create failed");
                        self.notifier.error("Could not create your profile.");
                    }
                }
            }
            Err(error) => {
                warn!(%error, user_id = %self.user_id, "profile fetch failed");
            }
        }
    }

    /// Award XP, bumping the level when the threshold is crossed.
    ///
    /// Quietly does nothing when no profile can be loaded. On write failure
    /// the local profile is rolled back to its pre-award snapshot.
    pub async fn add_xp(&mut self, amount: i64) {
        if self.profile.is_none() {
            // One lazy load attempt; absence here is not worth a notice.
            match self.store.fetch(&self.user_id).await {
                Ok(Some(profile)) => self.profile = Some(profile),
                Ok(None) | Err(_) => return,
            }
        }
        let Some(snapshot) = self.profile.clone() else {
            return;
        };

        let mut new_xp = snapshot.xp + amount;
        let mut new_level = snapshot.level;
        let mut leveled_up = false;

        let threshold = new_level * XP_LEVEL_STEP;
        if new_xp >= threshold {
            new_xp -= threshold;
            new_level += 1;
            leveled_up = true;
        }

        let patch = ProfilePatch {
            xp: Some(new_xp),
            level: Some(new_level),
            last_active_date: Some(self.clock.today()),
        };
        if let Some(profile) = self.profile.as_mut() {
            patch.apply(profile);
        }

        match self.store.patch(&self.user_id, patch).await {
            Ok(_) => {
                if leveled_up {
                    self.notifier.level_up(new_level);
                }
            }
            Err(error) => {
                warn!(%error, user_id = %self.user_id, "xp update failed");
                self.profile = Some(snapshot);
                self.notifier
                    .error("Network error — your XP was rolled back.");
            }
        }
    }
}
