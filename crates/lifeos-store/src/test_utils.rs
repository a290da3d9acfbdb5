//! Failure-injecting store wrapper for exercising rollback paths.
//!
//! Wraps a [`MemoryStore`] and refuses individual operations on demand.
//! Engine tests flip a switch, fire the operation under test, and assert the
//! engine's rollback (snapshot restore or corrective re-fetch) behavior.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use lifeos_core::{Goal, GoalPatch, NewGoal, Profile, ProfilePatch};

use crate::errors::{StoreError, StoreResult};
use crate::filter::{Filter, Query};
use crate::memory::MemoryStore;
use crate::store::{GoalStore, PriorityRewrite, ProfileStore};

/// A [`MemoryStore`] with per-operation failure switches.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_selects: AtomicBool,
    fail_counts: AtomicBool,
    fail_inserts: AtomicBool,
    fail_updates: AtomicBool,
    fail_deletes: AtomicBool,
    fail_upserts: AtomicBool,
    fail_profile_fetches: AtomicBool,
    fail_profile_creates: AtomicBool,
    fail_profile_patches: AtomicBool,
}

impl FlakyStore {
    /// A store with every operation healthy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped in-memory store, for seeding and snapshots.
    #[must_use]
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Refuse (or stop refusing) goal selects.
    pub fn fail_selects(&self, fail: bool) {
        self.fail_selects.store(fail, Ordering::SeqCst);
    }

    /// Refuse (or stop refusing) goal counts.
    pub fn fail_counts(&self, fail: bool) {
        self.fail_counts.store(fail, Ordering::SeqCst);
    }

    /// Refuse (or stop refusing) goal inserts.
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Refuse (or stop refusing) goal updates.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Refuse (or stop refusing) goal deletes.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Refuse (or stop refusing) priority upserts.
    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    /// Refuse (or stop refusing) profile fetches.
    pub fn fail_profile_fetches(&self, fail: bool) {
        self.fail_profile_fetches.store(fail, Ordering::SeqCst);
    }

    /// Refuse (or stop refusing) profile creates.
    pub fn fail_profile_creates(&self, fail: bool) {
        self.fail_profile_creates.store(fail, Ordering::SeqCst);
    }

    /// Refuse (or stop refusing) profile patches.
    pub fn fail_profile_patches(&self, fail: bool) {
        self.fail_profile_patches.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, op: &str) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::unavailable(format!("injected {op} failure")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GoalStore for FlakyStore {
    async fn select(&self, query: Query) -> StoreResult<Vec<Goal>> {
        Self::check(&self.fail_selects, "select")?;
        self.inner.select(query).await
    }

    async fn count(&self, filter: Filter) -> StoreResult<u64> {
        Self::check(&self.fail_counts, "count")?;
        self.inner.count(filter).await
    }

    async fn insert(&self, rows: Vec<NewGoal>) -> StoreResult<Vec<Goal>> {
        Self::check(&self.fail_inserts, "insert")?;
        self.inner.insert(rows).await
    }

    async fn update(&self, patch: GoalPatch, filter: Filter) -> StoreResult<u64> {
        Self::check(&self.fail_updates, "update")?;
        self.inner.update(patch, filter).await
    }

    async fn delete(&self, filter: Filter) -> StoreResult<u64> {
        Self::check(&self.fail_deletes, "delete")?;
        self.inner.delete(filter).await
    }

    async fn upsert_priorities(&self, rewrites: Vec<PriorityRewrite>) -> StoreResult<()> {
        Self::check(&self.fail_upserts, "upsert")?;
        self.inner.upsert_priorities(rewrites).await
    }
}

#[async_trait]
impl ProfileStore for FlakyStore {
    async fn fetch(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        Self::check(&self.fail_profile_fetches, "profile fetch")?;
        self.inner.fetch(user_id).await
    }

    async fn create(&self, profile: Profile) -> StoreResult<Profile> {
        Self::check(&self.fail_profile_creates, "profile create")?;
        self.inner.create(profile).await
    }

    async fn patch(&self, user_id: &str, patch: ProfilePatch) -> StoreResult<u64> {
        Self::check(&self.fail_profile_patches, "profile patch")?;
        self.inner.patch(user_id, patch).await
    }
}
