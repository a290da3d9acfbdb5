//! The remote store adapter traits.
//!
//! The application's entire persistence surface is one logical goals table
//! and one profiles table, each reached through a handful of verbs composed
//! with [`Filter`](crate::Filter) predicates. Engines depend on these traits
//! only; backends are interchangeable.

use async_trait::async_trait;
use lifeos_core::{Goal, GoalId, GoalPatch, NewGoal, Profile, ProfilePatch};
use serde::{Deserialize, Serialize};

use crate::errors::StoreResult;
use crate::filter::{Filter, Query};

/// A batched priority rewrite entry, keyed by id.
///
/// Upsert exists solely for reorder flows, so the payload is typed down to
/// the two columns a reorder may touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityRewrite {
    /// Row to rewrite.
    pub id: GoalId,
    /// New priority value.
    pub priority: i32,
}

/// The goals table.
#[async_trait]
pub trait GoalStore: Send + Sync {
    /// Select rows matching a query, in the query's order.
    async fn select(&self, query: Query) -> StoreResult<Vec<Goal>>;

    /// Count rows matching a filter without fetching them.
    async fn count(&self, filter: Filter) -> StoreResult<u64>;

    /// Insert rows; returns the inserted rows with store-assigned ids.
    async fn insert(&self, rows: Vec<NewGoal>) -> StoreResult<Vec<Goal>>;

    /// Apply a partial update to all rows matching the filter; returns the
    /// affected row count. Every call site filters by id equality.
    async fn update(&self, patch: GoalPatch, filter: Filter) -> StoreResult<u64>;

    /// Delete rows matching the filter; returns the affected row count.
    async fn delete(&self, filter: Filter) -> StoreResult<u64>;

    /// Batched priority rewrite, keyed by id.
    async fn upsert_priorities(&self, rewrites: Vec<PriorityRewrite>) -> StoreResult<()>;
}

/// The per-user profiles table.
///
/// Method names are kept distinct from [`GoalStore`]'s so one backend type
/// can implement both traits without ambiguous call sites.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile by user id. Absence is `Ok(None)`, not an error.
    async fn fetch(&self, user_id: &str) -> StoreResult<Option<Profile>>;

    /// Insert a fresh profile; returns the stored row.
    async fn create(&self, profile: Profile) -> StoreResult<Profile>;

    /// Apply a partial update to the profile with the given user id;
    /// returns the affected row count.
    async fn patch(&self, user_id: &str, patch: ProfilePatch) -> StoreResult<u64>;
}
