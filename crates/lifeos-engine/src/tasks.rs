//! Task synchronization engine.
//!
//! Owns the in-memory task collection for one date scope and reconciles it
//! with the remote store. Mutations are optimistic: local state changes
//! first, the remote write follows, and a failed write either restores the
//! pre-mutation snapshot (field edits, reorders) or re-fetches the
//! authoritative collection (deletes, completion toggles). The two recovery
//! strategies are inherited behavior and deliberately kept distinct.
//!
//! No method returns an error: failures are reported through the
//! [`Notifier`] port and the collection is left in a converged state.

use std::sync::Arc;

use chrono::NaiveDate;
use lifeos_core::{
    constants::{MAX_EMPTY_DRAFTS, XP_PER_COMPLETION},
    Clock, Goal, GoalId, GoalKind, GoalMode, GoalPatch, NewGoal,
};
use lifeos_store::{Field, Filter, GoalStore, Query};
use tracing::warn;

use crate::notify::{CompletionHook, Notifier};
use crate::ordering::priority_rewrites;

/// A single-field task edit.
///
/// The editable surface is deliberately narrow: free edits go through one
/// field at a time, and a priority edit re-sorts the collection as a side
/// effect of the setter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskField {
    /// Display label.
    Text(String),
    /// Grouping label.
    Category(String),
    /// Urgency / sort key.
    Priority(i32),
    /// Planned Pomodoro minutes.
    EstimatedMinutes(i32),
    /// Minutes per focus session.
    FocusSpan(i32),
    /// Completed focus sessions.
    CompletedSessions(i32),
}

impl TaskField {
    fn into_patch(self) -> GoalPatch {
        let mut patch = GoalPatch::default();
        match self {
            Self::Text(text) => patch.text = Some(text),
            Self::Category(category) => patch.category = Some(category),
            Self::Priority(priority) => patch.priority = Some(priority),
            Self::EstimatedMinutes(minutes) => patch.estimated_minutes = Some(minutes),
            Self::FocusSpan(span) => patch.focus_span = Some(span),
            Self::CompletedSessions(sessions) => patch.completed_sessions = Some(sessions),
        }
        patch
    }
}

/// Owner of one date-scoped task collection.
///
/// Constructed per mounted view and discarded with it; the collection has
/// exactly one logical owner.
pub struct TaskEngine {
    store: Arc<dyn GoalStore>,
    notifier: Arc<dyn Notifier>,
    completion: Arc<dyn CompletionHook>,
    clock: Arc<dyn Clock>,
    tasks: Vec<Goal>,
    loading: bool,
    scope: Option<NaiveDate>,
}

impl TaskEngine {
    /// Build an engine over the injected ports.
    #[must_use]
    pub fn new(
        store: Arc<dyn GoalStore>,
        notifier: Arc<dyn Notifier>,
        completion: Arc<dyn CompletionHook>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            completion,
            clock,
            tasks: Vec::new(),
            loading: false,
            scope: None,
        }
    }

    /// The current collection, in display order.
    #[must_use]
    pub fn tasks(&self) -> &[Goal] {
        &self.tasks
    }

    /// Whether a fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The date the collection was last fetched for.
    #[must_use]
    pub fn scope(&self) -> Option<NaiveDate> {
        self.scope
    }

    /// Date-scope predicate: the today view resurfaces unfinished overdue
    /// work; any other day is an exact match.
    fn date_scope_filter(date: NaiveDate, today: NaiveDate) -> Filter {
        if date == today {
            Filter::or(vec![
                Filter::eq(Field::TargetDate, date),
                Filter::and(vec![
                    Filter::lt(Field::TargetDate, date),
                    Filter::eq(Field::Done, false),
                ]),
            ])
        } else {
            Filter::eq(Field::TargetDate, date)
        }
    }

    /// Load the collection for `date`, ordered by priority descending then
    /// id ascending. On read failure the collection is emptied rather than
    /// left stale; `loading` is cleared on every path.
    pub async fn fetch(&mut self, date: NaiveDate) {
        self.loading = true;
        self.scope = Some(date);
        let filter = Self::date_scope_filter(date, self.clock.today());
        match self.store.select(Query::priority_listing(filter)).await {
            Ok(rows) => self.tasks = rows,
            Err(error) => {
                warn!(%error, %date, "task fetch failed");
                self.notifier.error("Could not load the task list.");
                self.tasks.clear();
            }
        }
        self.loading = false;
    }

    /// Re-read the authoritative collection after a failed write.
    async fn corrective_refetch(&mut self) {
        let date = self.scope.unwrap_or_else(|| self.clock.today());
        self.fetch(date).await;
    }

    /// Create an empty draft task of `kind` on `date`.
    ///
    /// Write-then-apply, not optimistic: the draft is appended only after
    /// the store confirms it, so a failed insert mutates nothing.
    pub async fn add(&mut self, kind: GoalKind, date: NaiveDate) {
        let empty_drafts = self
            .tasks
            .iter()
            .filter(|g| g.text.trim().is_empty())
            .count();
        if empty_drafts >= MAX_EMPTY_DRAFTS {
            self.notifier
                .error("Too many unnamed tasks. Fill those in first.");
            return;
        }
        if date < self.clock.today() {
            self.notifier.error("Cannot add tasks to a past date.");
            return;
        }

        match self.store.insert(vec![NewGoal::draft(kind, date)]).await {
            Ok(rows) => {
                self.tasks.extend(rows);
                if kind == GoalKind::Study {
                    self.notifier.info("Deep-work session created.");
                } else {
                    self.notifier.success("Task added.");
                }
            }
            Err(error) => {
                warn!(%error, "task insert failed");
                self.notifier.error("Could not add the task.");
            }
        }
    }

    /// Delete a task. Optimistic removal with an immediate success notice;
    /// a failed remote delete is corrected by re-fetching the scope (the
    /// removed row cannot be restored from a snapshot that no longer holds
    /// it in order).
    pub async fn delete(&mut self, id: GoalId) {
        self.tasks.retain(|g| g.id != id);
        self.notifier.success("Task deleted.");

        if let Err(error) = self.store.delete(Filter::eq(Field::Id, id)).await {
            warn!(%error, %id, "task delete failed");
            self.notifier.error("Could not delete the task on the server.");
            self.corrective_refetch().await;
        }
    }

    /// Flip a task's completion flag.
    ///
    /// Marking done is date-gated: overdue tasks are locked, future tasks
    /// are locked, dateless tasks and today's tasks are eligible. Un-marking
    /// is never gated. The XP side effect fires on the optimistic
    /// transition and is not revoked if the write later fails (inherited
    /// asymmetry).
    pub async fn toggle_done(&mut self, id: GoalId, current: bool) {
        if !current {
            if let Some(target) = self
                .tasks
                .iter()
                .find(|g| g.id == id)
                .and_then(|g| g.target_date)
            {
                let today = self.clock.today();
                if target < today {
                    self.notifier
                        .error("Task is overdue and can no longer be completed.");
                    return;
                }
                if target > today {
                    self.notifier.error("Not due yet. Come back on the day.");
                    return;
                }
            }
        }

        let new_status = !current;
        for goal in &mut self.tasks {
            if goal.id == id {
                goal.done = new_status;
            }
        }

        if new_status {
            self.notifier
                .success(&format!("Nice! +{XP_PER_COMPLETION} XP"));
            self.completion.completed(XP_PER_COMPLETION);
        }

        if let Err(error) = self
            .store
            .update(GoalPatch::done(new_status), Filter::eq(Field::Id, id))
            .await
        {
            warn!(%error, %id, "task status update failed");
            self.notifier.error("Could not update the task status.");
            self.corrective_refetch().await;
        }
    }

    /// Patch a single field. Optimistic; a priority patch re-sorts the
    /// collection immediately. A failed write restores the full
    /// pre-mutation snapshot, not a per-field revert.
    pub async fn update_field(&mut self, id: GoalId, field: TaskField) {
        let snapshot = self.tasks.clone();
        let resort = matches!(field, TaskField::Priority(_));
        let patch = field.into_patch();

        for goal in &mut self.tasks {
            if goal.id == id {
                patch.apply(goal);
            }
        }
        if resort {
            self.tasks.sort_by(|a, b| b.priority.cmp(&a.priority));
        }

        if let Err(error) = self.store.update(patch, Filter::eq(Field::Id, id)).await {
            warn!(%error, %id, "task field update failed");
            self.notifier.error("Could not save the change. Reverting.");
            self.tasks = snapshot;
        }
    }

    /// Flip the edit mode (intended one-directional: normal → strict).
    /// Fire-and-forget: an error notice is shown but the optimistic flip is
    /// not rolled back (inherited asymmetry).
    pub async fn update_mode(&mut self, id: GoalId, mode: GoalMode) {
        for goal in &mut self.tasks {
            if goal.id == id {
                goal.mode = mode;
            }
        }
        if let Err(error) = self
            .store
            .update(GoalPatch::mode(mode), Filter::eq(Field::Id, id))
            .await
        {
            warn!(%error, %id, "task mode update failed");
            self.notifier.error("Could not update the mode.");
        }
    }

    /// Adopt a caller-supplied ordering. Priorities are recomputed as
    /// `len - index` locally and persisted in one batched upsert; failure
    /// restores the pre-reorder snapshot.
    pub async fn reorder(&mut self, ordered: Vec<Goal>) {
        let snapshot = std::mem::replace(&mut self.tasks, ordered);
        let rewrites = priority_rewrites(&self.tasks);
        for (goal, rewrite) in self.tasks.iter_mut().zip(&rewrites) {
            goal.priority = rewrite.priority;
        }

        match self.store.upsert_priorities(rewrites).await {
            Ok(()) => self.notifier.success("Order saved."),
            Err(error) => {
                warn!(%error, "reorder upsert failed");
                self.notifier.error("Could not save the order.");
                self.tasks = snapshot;
            }
        }
    }

    /// Append already-inserted rows (routine sync instances) to the
    /// collection without another round trip.
    pub fn adopt(&mut self, rows: Vec<Goal>) {
        self.tasks.extend(rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CountingCompletionHook, RecordingNotifier};
    use lifeos_core::{FixedClock, NewGoal};
    use lifeos_store::test_utils::FlakyStore;

    const TODAY: &str = "2026-01-10";

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    struct Rig {
        store: Arc<FlakyStore>,
        notifier: Arc<RecordingNotifier>,
        hook: Arc<CountingCompletionHook>,
        engine: TaskEngine,
    }

    fn rig() -> Rig {
        let store = Arc::new(FlakyStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let hook = Arc::new(CountingCompletionHook::new());
        let engine = TaskEngine::new(
            Arc::clone(&store) as Arc<dyn GoalStore>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            Arc::clone(&hook) as Arc<dyn CompletionHook>,
            Arc::new(FixedClock(date(TODAY))),
        );
        Rig {
            store,
            notifier,
            hook,
            engine,
        }
    }

    async fn seed_task(store: &FlakyStore, text: &str, target: &str, priority: i32) -> Goal {
        let mut row = NewGoal::draft(GoalKind::Daily, date(target));
        row.text = text.to_string();
        row.priority = priority;
        store.insert(vec![row]).await.unwrap().remove(0)
    }

    // --- fetch ---

    #[tokio::test]
    async fn fetch_orders_by_priority_desc_then_id_asc() {
        let mut rig = rig();
        let low = seed_task(&rig.store, "low", TODAY, 1).await;
        let high = seed_task(&rig.store, "high", TODAY, 3).await;

        rig.engine.fetch(date(TODAY)).await;

        let ids: Vec<GoalId> = rig.engine.tasks().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![high.id, low.id]);
        assert!(!rig.engine.is_loading());
    }

    #[tokio::test]
    async fn fetch_today_resurfaces_unfinished_overdue_work() {
        let mut rig = rig();
        let _ = seed_task(&rig.store, "today", TODAY, 1).await;
        let _ = seed_task(&rig.store, "overdue", "2026-01-08", 1).await;
        let finished = seed_task(&rig.store, "finished overdue", "2026-01-08", 1).await;
        let _ = rig
            .store
            .update(GoalPatch::done(true), Filter::eq(Field::Id, finished.id))
            .await
            .unwrap();
        let _ = seed_task(&rig.store, "future", "2026-01-12", 1).await;

        rig.engine.fetch(date(TODAY)).await;

        let texts: Vec<&str> = rig.engine.tasks().iter().map(|g| g.text.as_str()).collect();
        assert!(texts.contains(&"today"));
        assert!(texts.contains(&"overdue"));
        assert!(!texts.contains(&"finished overdue"));
        assert!(!texts.contains(&"future"));
    }

    #[tokio::test]
    async fn fetch_other_dates_match_exactly() {
        let mut rig = rig();
        let _ = seed_task(&rig.store, "past undone", "2026-01-05", 1).await;
        let _ = seed_task(&rig.store, "on the day", "2026-01-12", 1).await;

        rig.engine.fetch(date("2026-01-12")).await;

        assert_eq!(rig.engine.tasks().len(), 1);
        assert_eq!(rig.engine.tasks()[0].text, "on the day");
    }

    #[tokio::test]
    async fn fetch_failure_empties_collection_and_clears_loading() {
        let mut rig = rig();
        let _ = seed_task(&rig.store, "stale", TODAY, 1).await;
        rig.engine.fetch(date(TODAY)).await;
        assert_eq!(rig.engine.tasks().len(), 1);

        rig.store.fail_selects(true);
        rig.engine.fetch(date(TODAY)).await;

        assert!(rig.engine.tasks().is_empty());
        assert!(!rig.engine.is_loading());
        assert!(rig.notifier.saw_error());
    }

    // --- add ---

    #[tokio::test]
    async fn add_appends_store_returned_draft() {
        let mut rig = rig();
        rig.engine.add(GoalKind::Daily, date(TODAY)).await;

        assert_eq!(rig.engine.tasks().len(), 1);
        assert_eq!(rig.engine.tasks()[0].category, "other");
        assert_eq!(rig.engine.tasks()[0].priority, 1);
        assert_eq!(rig.notifier.successes(), vec!["Task added.".to_string()]);
    }

    #[tokio::test]
    async fn add_study_uses_work_category_and_info_notice() {
        let mut rig = rig();
        rig.engine.add(GoalKind::Study, date(TODAY)).await;

        assert_eq!(rig.engine.tasks()[0].category, "work");
        assert_eq!(rig.notifier.infos().len(), 1);
    }

    #[tokio::test]
    async fn add_rejects_when_three_empty_drafts_exist() {
        let mut rig = rig();
        for _ in 0..3 {
            rig.engine.add(GoalKind::Daily, date(TODAY)).await;
        }
        assert_eq!(rig.engine.tasks().len(), 3);

        rig.engine.add(GoalKind::Daily, date(TODAY)).await;

        assert_eq!(rig.engine.tasks().len(), 3);
        assert!(rig.notifier.saw_error());
    }

    #[tokio::test]
    async fn add_rejects_past_dates_without_remote_call() {
        let mut rig = rig();
        rig.engine.add(GoalKind::Daily, date("2026-01-09")).await;

        assert!(rig.engine.tasks().is_empty());
        assert!(rig.store.inner().goals_snapshot().is_empty());
        assert!(rig.notifier.saw_error());
    }

    #[tokio::test]
    async fn add_insert_failure_mutates_nothing() {
        let mut rig = rig();
        rig.store.fail_inserts(true);
        rig.engine.add(GoalKind::Daily, date(TODAY)).await;

        assert!(rig.engine.tasks().is_empty());
        assert!(rig.notifier.saw_error());
    }

    // --- delete ---

    #[tokio::test]
    async fn delete_is_optimistic_and_confirms_immediately() {
        let mut rig = rig();
        let task = seed_task(&rig.store, "gone", TODAY, 1).await;
        rig.engine.fetch(date(TODAY)).await;

        rig.engine.delete(task.id).await;

        assert!(rig.engine.tasks().is_empty());
        assert!(rig.store.inner().goals_snapshot().is_empty());
        assert_eq!(rig.notifier.successes().last().unwrap(), "Task deleted.");
    }

    #[tokio::test]
    async fn delete_failure_refetches_authoritative_state() {
        let mut rig = rig();
        let task = seed_task(&rig.store, "stays", TODAY, 1).await;
        rig.engine.fetch(date(TODAY)).await;

        rig.store.fail_deletes(true);
        rig.engine.delete(task.id).await;

        // The corrective re-fetch restored the row the server still holds.
        assert_eq!(rig.engine.tasks().len(), 1);
        assert_eq!(rig.engine.tasks()[0].id, task.id);
        assert!(rig.notifier.saw_error());
    }

    // --- toggle_done ---

    #[tokio::test]
    async fn toggle_done_today_succeeds_and_awards_xp() {
        let mut rig = rig();
        let task = seed_task(&rig.store, "due today", TODAY, 1).await;
        rig.engine.fetch(date(TODAY)).await;

        rig.engine.toggle_done(task.id, false).await;

        assert!(rig.engine.tasks()[0].done);
        assert!(rig.store.inner().goals_snapshot()[0].done);
        assert_eq!(rig.hook.total(), XP_PER_COMPLETION);
    }

    #[tokio::test]
    async fn toggle_done_rejects_overdue_tasks() {
        let mut rig = rig();
        let task = seed_task(&rig.store, "overdue", "2026-01-08", 1).await;
        rig.engine.fetch(date(TODAY)).await;

        rig.engine.toggle_done(task.id, false).await;

        assert!(!rig.engine.tasks()[0].done);
        assert_eq!(rig.hook.calls(), 0);
        assert!(rig.notifier.saw_error());
    }

    #[tokio::test]
    async fn toggle_done_rejects_future_tasks() {
        let mut rig = rig();
        let task = seed_task(&rig.store, "future", "2026-01-12", 1).await;
        rig.engine.fetch(date("2026-01-12")).await;

        rig.engine.toggle_done(task.id, false).await;

        assert!(!rig.engine.tasks()[0].done);
        assert_eq!(rig.hook.calls(), 0);
    }

    #[tokio::test]
    async fn toggle_done_allows_dateless_tasks() {
        let mut rig = rig();
        let backlog = rig
            .store
            .insert(vec![NewGoal::backlog_item(GoalId::new(77), "loose")])
            .await
            .unwrap()
            .remove(0);
        rig.engine.adopt(vec![backlog.clone()]);

        rig.engine.toggle_done(backlog.id, false).await;

        assert!(rig.engine.tasks()[0].done);
        assert_eq!(rig.hook.calls(), 1);
    }

    #[tokio::test]
    async fn untoggle_is_never_date_gated_and_awards_nothing() {
        let mut rig = rig();
        let task = seed_task(&rig.store, "overdue done", "2026-01-08", 1).await;
        let _ = rig
            .store
            .update(GoalPatch::done(true), Filter::eq(Field::Id, task.id))
            .await
            .unwrap();
        rig.engine.fetch(date("2026-01-08")).await;

        rig.engine.toggle_done(task.id, true).await;

        assert!(!rig.engine.tasks()[0].done);
        assert_eq!(rig.hook.calls(), 0);
    }

    #[tokio::test]
    async fn toggle_failure_refetches_but_xp_stays_awarded() {
        let mut rig = rig();
        let task = seed_task(&rig.store, "due today", TODAY, 1).await;
        rig.engine.fetch(date(TODAY)).await;

        rig.store.fail_updates(true);
        rig.engine.toggle_done(task.id, false).await;

        // Server still holds the undone row; the re-fetch converged to it.
        assert!(!rig.engine.tasks()[0].done);
        // The completion side effect already fired and is not revoked.
        assert_eq!(rig.hook.total(), XP_PER_COMPLETION);
        assert!(rig.notifier.saw_error());
    }

    // --- update_field ---

    #[tokio::test]
    async fn update_field_patches_locally_and_remotely() {
        let mut rig = rig();
        let task = seed_task(&rig.store, "old", TODAY, 1).await;
        rig.engine.fetch(date(TODAY)).await;

        rig.engine
            .update_field(task.id, TaskField::Text("new".to_string()))
            .await;

        assert_eq!(rig.engine.tasks()[0].text, "new");
        assert_eq!(rig.store.inner().goals_snapshot()[0].text, "new");
    }

    #[tokio::test]
    async fn priority_update_resorts_immediately() {
        let mut rig = rig();
        let first = seed_task(&rig.store, "first", TODAY, 3).await;
        let second = seed_task(&rig.store, "second", TODAY, 1).await;
        rig.engine.fetch(date(TODAY)).await;
        assert_eq!(rig.engine.tasks()[0].id, first.id);

        rig.engine
            .update_field(second.id, TaskField::Priority(5))
            .await;

        assert_eq!(rig.engine.tasks()[0].id, second.id);
    }

    #[tokio::test]
    async fn update_field_failure_restores_exact_snapshot() {
        let mut rig = rig();
        let a = seed_task(&rig.store, "a", TODAY, 2).await;
        let _ = seed_task(&rig.store, "b", TODAY, 1).await;
        rig.engine.fetch(date(TODAY)).await;
        let before = rig.engine.tasks().to_vec();

        rig.store.fail_updates(true);
        rig.engine
            .update_field(a.id, TaskField::Priority(9))
            .await;

        assert_eq!(rig.engine.tasks(), before.as_slice());
        assert!(rig.notifier.saw_error());
    }

    // --- update_mode ---

    #[tokio::test]
    async fn update_mode_failure_keeps_optimistic_flip() {
        let mut rig = rig();
        let task = seed_task(&rig.store, "strict me", TODAY, 1).await;
        rig.engine.fetch(date(TODAY)).await;

        rig.store.fail_updates(true);
        rig.engine.update_mode(task.id, GoalMode::Strict).await;

        // Fire-and-forget: the local flip stays, only an error is shown.
        assert_eq!(rig.engine.tasks()[0].mode, GoalMode::Strict);
        assert!(rig.notifier.saw_error());
    }

    // --- reorder ---

    #[tokio::test]
    async fn reorder_assigns_len_minus_index_and_persists() {
        let mut rig = rig();
        let a = seed_task(&rig.store, "a", TODAY, 3).await;
        let b = seed_task(&rig.store, "b", TODAY, 2).await;
        let c = seed_task(&rig.store, "c", TODAY, 1).await;
        rig.engine.fetch(date(TODAY)).await;

        let reordered = vec![
            rig.engine.tasks()[2].clone(), // c first
            rig.engine.tasks()[0].clone(), // a
            rig.engine.tasks()[1].clone(), // b
        ];
        rig.engine.reorder(reordered).await;

        let local: Vec<(GoalId, i32)> =
            rig.engine.tasks().iter().map(|g| (g.id, g.priority)).collect();
        assert_eq!(local, vec![(c.id, 3), (a.id, 2), (b.id, 1)]);

        let stored = rig.store.inner().goals_snapshot();
        assert_eq!(stored.iter().find(|g| g.id == c.id).unwrap().priority, 3);
        assert_eq!(stored.iter().find(|g| g.id == b.id).unwrap().priority, 1);
    }

    #[tokio::test]
    async fn reorder_twice_with_same_order_is_idempotent() {
        let mut rig = rig();
        let _ = seed_task(&rig.store, "a", TODAY, 2).await;
        let _ = seed_task(&rig.store, "b", TODAY, 1).await;
        rig.engine.fetch(date(TODAY)).await;

        let order = rig.engine.tasks().to_vec();
        rig.engine.reorder(order).await;
        let after_first: Vec<i32> = rig.engine.tasks().iter().map(|g| g.priority).collect();

        let order = rig.engine.tasks().to_vec();
        rig.engine.reorder(order).await;
        let after_second: Vec<i32> = rig.engine.tasks().iter().map(|g| g.priority).collect();

        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn reorder_failure_restores_original_order() {
        let mut rig = rig();
        let _ = seed_task(&rig.store, "a", TODAY, 2).await;
        let _ = seed_task(&rig.store, "b", TODAY, 1).await;
        rig.engine.fetch(date(TODAY)).await;
        let before = rig.engine.tasks().to_vec();

        rig.store.fail_upserts(true);
        let mut flipped = before.clone();
        flipped.reverse();
        rig.engine.reorder(flipped).await;

        assert_eq!(rig.engine.tasks(), before.as_slice());
        assert!(rig.notifier.saw_error());
    }
}
