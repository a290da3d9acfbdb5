//! In-memory store backend.
//!
//! Evaluates the same [`Filter`]/[`Query`] model the REST backend renders to
//! the wire, so engine behavior exercised against this backend carries over.
//! Ids are assigned from an atomic counter, mirroring the remote store's
//! identity column.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use lifeos_core::{Goal, GoalId, GoalPatch, NewGoal, Profile, ProfilePatch};
use parking_lot::RwLock;

use crate::errors::StoreResult;
use crate::filter::{Filter, Query};
use crate::store::{GoalStore, PriorityRewrite, ProfileStore};

/// In-memory goals + profiles backend.
#[derive(Debug)]
pub struct MemoryStore {
    goals: RwLock<Vec<Goal>>,
    profiles: RwLock<HashMap<String, Profile>>,
    next_id: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            goals: RwLock::new(Vec::new()),
            profiles: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Snapshot of every goal row, in insertion order.
    #[must_use]
    pub fn goals_snapshot(&self) -> Vec<Goal> {
        self.goals.read().clone()
    }

    /// Snapshot of a stored profile.
    #[must_use]
    pub fn profile_snapshot(&self, user_id: &str) -> Option<Profile> {
        self.profiles.read().get(user_id).cloned()
    }

    fn assign_id(&self) -> GoalId {
        GoalId::new(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn materialize(&self, row: NewGoal) -> Goal {
        Goal {
            id: self.assign_id(),
            text: row.text,
            done: row.done,
            target_date: row.target_date,
            category: row.category,
            priority: row.priority,
            estimated_minutes: None,
            focus_span: None,
            completed_sessions: None,
            mode: row.mode,
            kind: row.kind,
            parent_id: row.parent_id,
        }
    }
}

#[async_trait]
impl GoalStore for MemoryStore {
    async fn select(&self, query: Query) -> StoreResult<Vec<Goal>> {
        let goals = self.goals.read();
        let mut rows: Vec<Goal> = goals
            .iter()
            .filter(|g| query.filter.as_ref().is_none_or(|f| f.matches(g)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| query.compare(a, b));
        Ok(rows)
    }

    async fn count(&self, filter: Filter) -> StoreResult<u64> {
        let goals = self.goals.read();
        Ok(goals.iter().filter(|g| filter.matches(g)).count() as u64)
    }

    async fn insert(&self, rows: Vec<NewGoal>) -> StoreResult<Vec<Goal>> {
        let inserted: Vec<Goal> = rows.into_iter().map(|r| self.materialize(r)).collect();
        self.goals.write().extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn update(&self, patch: GoalPatch, filter: Filter) -> StoreResult<u64> {
        let mut goals = self.goals.write();
        let mut affected = 0u64;
        for goal in goals.iter_mut().filter(|g| filter.matches(g)) {
            patch.apply(goal);
            affected += 1;
        }
        Ok(affected)
    }

    async fn delete(&self, filter: Filter) -> StoreResult<u64> {
        let mut goals = self.goals.write();
        let before = goals.len();
        goals.retain(|g| !filter.matches(g));
        Ok((before - goals.len()) as u64)
    }

    async fn upsert_priorities(&self, rewrites: Vec<PriorityRewrite>) -> StoreResult<()> {
        let mut goals = self.goals.write();
        for rewrite in rewrites {
            if let Some(goal) = goals.iter_mut().find(|g| g.id == rewrite.id) {
                goal.priority = rewrite.priority;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn fetch(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        Ok(self.profiles.read().get(user_id).cloned())
    }

    async fn create(&self, profile: Profile) -> StoreResult<Profile> {
        let _ = self
            .profiles
            .write()
            .insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    async fn patch(&self, user_id: &str, patch: ProfilePatch) -> StoreResult<u64> {
        let mut profiles = self.profiles.write();
        match profiles.get_mut(user_id) {
            Some(profile) => {
                patch.apply(profile);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Field;
    use chrono::NaiveDate;
    use lifeos_core::GoalKind;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let rows = store
            .insert(vec![
                NewGoal::draft(GoalKind::Daily, date("2026-01-10")),
                NewGoal::draft(GoalKind::Daily, date("2026-01-10")),
            ])
            .await
            .unwrap();
        assert_eq!(rows[0].id, GoalId::new(1));
        assert_eq!(rows[1].id, GoalId::new(2));
    }

    #[tokio::test]
    async fn select_applies_filter_and_ordering() {
        let store = MemoryStore::new();
        let mut low = NewGoal::draft(GoalKind::Daily, date("2026-01-10"));
        low.priority = 1;
        let mut high = NewGoal::draft(GoalKind::Daily, date("2026-01-10"));
        high.priority = 3;
        let other_day = NewGoal::draft(GoalKind::Daily, date("2026-01-11"));
        let _ = store.insert(vec![low, high, other_day]).await.unwrap();

        let rows = store
            .select(Query::priority_listing(Filter::eq(
                Field::TargetDate,
                date("2026-01-10"),
            )))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].priority, 3);
        assert_eq!(rows[1].priority, 1);
    }

    #[tokio::test]
    async fn update_patches_matching_rows_only() {
        let store = MemoryStore::new();
        let rows = store
            .insert(vec![
                NewGoal::draft(GoalKind::Daily, date("2026-01-10")),
                NewGoal::draft(GoalKind::Daily, date("2026-01-10")),
            ])
            .await
            .unwrap();

        let affected = store
            .update(GoalPatch::done(true), Filter::eq(Field::Id, rows[0].id))
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let snapshot = store.goals_snapshot();
        assert!(snapshot[0].done);
        assert!(!snapshot[1].done);
    }

    #[tokio::test]
    async fn delete_returns_affected_count() {
        let store = MemoryStore::new();
        let _ = store
            .insert(vec![
                NewGoal::backlog_item(GoalId::new(99), "a"),
                NewGoal::backlog_item(GoalId::new(99), "b"),
                NewGoal::draft(GoalKind::Daily, date("2026-01-10")),
            ])
            .await
            .unwrap();

        let deleted = store
            .delete(Filter::eq(Field::ParentId, GoalId::new(99)))
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.goals_snapshot().len(), 1);
    }

    #[tokio::test]
    async fn upsert_rewrites_priorities_by_id() {
        let store = MemoryStore::new();
        let rows = store
            .insert(vec![
                NewGoal::draft(GoalKind::Daily, date("2026-01-10")),
                NewGoal::draft(GoalKind::Daily, date("2026-01-10")),
            ])
            .await
            .unwrap();

        store
            .upsert_priorities(vec![
                PriorityRewrite {
                    id: rows[0].id,
                    priority: 2,
                },
                PriorityRewrite {
                    id: rows[1].id,
                    priority: 1,
                },
            ])
            .await
            .unwrap();

        let snapshot = store.goals_snapshot();
        assert_eq!(snapshot[0].priority, 2);
        assert_eq!(snapshot[1].priority, 1);
    }

    #[tokio::test]
    async fn count_is_row_count_only() {
        let store = MemoryStore::new();
        let _ = store
            .insert(vec![
                NewGoal::draft(GoalKind::Daily, date("2026-01-10")),
                NewGoal::draft(GoalKind::Daily, date("2026-01-10")),
            ])
            .await
            .unwrap();
        let count = store
            .count(Filter::eq(Field::TargetDate, date("2026-01-10")))
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn profile_fetch_absent_is_none() {
        let store = MemoryStore::new();
        assert!(store.fetch("nobody").await.unwrap().is_none());

        let profile = Profile::fresh("user-1", date("2026-01-10"));
        let _ = store.create(profile.clone()).await.unwrap();
        assert_eq!(store.fetch("user-1").await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn profile_patch_missing_affects_zero_rows() {
        let store = MemoryStore::new();
        let affected = store
            .patch(
                "nobody",
                ProfilePatch {
                    xp: Some(10),
                    ..ProfilePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(affected, 0);
    }
}
