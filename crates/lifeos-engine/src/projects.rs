//! Project / backlog engine.
//!
//! Projects are goal rows with `kind = project`; their backlog lives in rows
//! linked back via `parent_id`. This engine is stateless — the caller owns
//! its project and backlog lists and applies the results it gets back.
//!
//! Promotion is the one subtle operation: a *pure* backlog item (parent set,
//! no date) is cloned onto the destination day so the backlog master stays
//! behind as a reusable checklist entry; anything already dated is moved in
//! place.

use std::sync::Arc;

use chrono::NaiveDate;
use lifeos_core::{
    constants::{BACKLOG_TEXT_MAX, DAILY_CAPACITY, PROJECT_NAME_MAX, PROJECT_NAME_MIN},
    Clock, Goal, GoalId, GoalKind, GoalPatch, NewGoal, ProjectKind,
};
use lifeos_store::{Field, Filter, GoalStore, Query};
use tracing::warn;

use crate::notify::Notifier;
use crate::ordering::priority_rewrites;

/// Stateless engine over the project partition of the goals table.
pub struct ProjectEngine {
    store: Arc<dyn GoalStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl ProjectEngine {
    /// Build an engine over the injected ports.
    #[must_use]
    pub fn new(
        store: Arc<dyn GoalStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }

    /// All project records, priority descending then id ascending.
    pub async fn fetch_projects(&self) -> Vec<Goal> {
        match self
            .store
            .select(Query::priority_listing(Filter::eq(
                Field::Kind,
                GoalKind::Project,
            )))
            .await
        {
            Ok(rows) => rows,
            Err(error) => {
                warn!(%error, "project fetch failed");
                self.notifier.error("Could not load the project list.");
                Vec::new()
            }
        }
    }

    /// Create a project.
    ///
    /// Rejects blank, too-short or too-long names, past deadlines, and —
    /// case-insensitively — duplicate names among existing projects. For
    /// exam projects `target_score` lands in the priority column (the
    /// inherited overload).
    pub async fn add_project(
        &self,
        name: &str,
        kind: ProjectKind,
        deadline: Option<NaiveDate>,
        target_score: Option<i32>,
    ) -> Option<Goal> {
        let name = name.trim();
        if name.is_empty() {
            self.notifier.error("Project name must not be empty.");
            return None;
        }
        if name.chars().count() < PROJECT_NAME_MIN {
            self.notifier
                .error("Project name is too short (minimum 3 characters).");
            return None;
        }
        if name.chars().count() > PROJECT_NAME_MAX {
            self.notifier
                .error("Project name is too long (maximum 50 characters).");
            return None;
        }
        if let Some(deadline) = deadline {
            if deadline < self.clock.today() {
                self.notifier
                    .error("Project deadline cannot be in the past.");
                return None;
            }
        }

        // Case-insensitive duplicate check. A failed read does not block
        // creation; the store's own constraints are the last line.
        let duplicate_filter = Filter::and(vec![
            Filter::eq(Field::Kind, GoalKind::Project),
            Filter::ilike(Field::Text, name),
        ]);
        match self.store.select(Query::filtered(duplicate_filter)).await {
            Ok(existing) if !existing.is_empty() => {
                self.notifier
                    .error("A project with this name already exists.");
                return None;
            }
            Ok(_) => {}
            Err(error) => warn!(%error, "duplicate-name check failed"),
        }

        let row = NewGoal::project(name, kind, deadline, target_score.unwrap_or(1));
        match self.store.insert(vec![row]).await {
            Ok(rows) => {
                self.notifier.success("Project created.");
                rows.into_iter().next()
            }
            Err(error) => {
                warn!(%error, "project insert failed");
                self.notifier.error("Could not create the project.");
                None
            }
        }
    }

    /// Patch a project record. The caller owns its list and applies the
    /// same patch locally after a `true` return.
    pub async fn update_project(&self, id: GoalId, patch: GoalPatch) -> bool {
        match self.store.update(patch, Filter::eq(Field::Id, id)).await {
            Ok(_) => {
                self.notifier.success("Project updated.");
                true
            }
            Err(error) => {
                warn!(%error, %id, "project update failed");
                self.notifier.error("Could not update the project.");
                false
            }
        }
    }

    /// Delete a project and everything it owns.
    ///
    /// Two phases, children first: the project row is only removed once its
    /// backlog is confirmed gone, so a partial failure can never strand
    /// orphaned backlog items.
    pub async fn delete_project(&self, id: GoalId) -> bool {
        if let Err(error) = self.store.delete(Filter::eq(Field::ParentId, id)).await {
            warn!(%error, %id, "backlog delete failed");
            self.notifier
                .error("Could not delete the project's tasks.");
            return false;
        }
        if let Err(error) = self.store.delete(Filter::eq(Field::Id, id)).await {
            warn!(%error, %id, "project delete failed");
            self.notifier.error("Could not delete the project.");
            return false;
        }
        self.notifier
            .success("Project and its whole backlog deleted.");
        true
    }

    /// Unscheduled backlog of a project (`target_date IS NULL`) — the list
    /// the reorder view works on.
    pub async fn backlog_items(&self, project_id: GoalId) -> Vec<Goal> {
        let filter = Filter::and(vec![
            Filter::eq(Field::ParentId, project_id),
            Filter::is_null(Field::TargetDate),
        ]);
        match self.store.select(Query::priority_listing(filter)).await {
            Ok(rows) => rows,
            Err(error) => {
                warn!(%error, %project_id, "backlog fetch failed");
                Vec::new()
            }
        }
    }

    /// Every row linked to a project, scheduled copies included — the list
    /// the status view shows.
    pub async fn linked_items(&self, project_id: GoalId) -> Vec<Goal> {
        match self
            .store
            .select(Query::priority_listing(Filter::eq(
                Field::ParentId,
                project_id,
            )))
            .await
        {
            Ok(rows) => rows,
            Err(error) => {
                warn!(%error, %project_id, "linked-item fetch failed");
                Vec::new()
            }
        }
    }

    /// Add a backlog item under a project.
    pub async fn add_backlog_item(&self, project_id: GoalId, text: &str) -> Option<Goal> {
        if text.trim().is_empty() {
            self.notifier.error("Task text must not be empty.");
            return None;
        }
        if text.chars().count() > BACKLOG_TEXT_MAX {
            self.notifier
                .error("Task text is too long (maximum 200 characters).");
            return None;
        }

        match self
            .store
            .insert(vec![NewGoal::backlog_item(project_id, text)])
            .await
        {
            Ok(rows) => rows.into_iter().next(),
            Err(error) => {
                warn!(%error, %project_id, "backlog insert failed");
                self.notifier.error("Could not add the task.");
                None
            }
        }
    }

    /// Persist a caller-supplied backlog ordering: `priority = len - index`,
    /// one batched upsert. The caller owns the list, so there is no local
    /// state to roll back — failure is an error notice.
    pub async fn reorder_backlog(&self, ordered: &[Goal]) {
        let rewrites = priority_rewrites(ordered);
        if let Err(error) = self.store.upsert_priorities(rewrites).await {
            warn!(%error, "backlog reorder failed");
            self.notifier.error("Could not save the order.");
        }
    }

    /// Schedule a task onto `date`.
    ///
    /// Pure backlog items are cloned (the master stays); dated tasks are
    /// moved. Returns `true` when the destination day changed and the
    /// caller should re-fetch it.
    pub async fn promote(&self, task_id: GoalId, date: NaiveDate) -> bool {
        if date < self.clock.today() {
            self.notifier.error("Cannot schedule into the past.");
            return false;
        }

        // Capacity guard. Fails open when the count itself fails: the guard
        // protects the user from overload, not the data from corruption.
        match self.store.count(Filter::eq(Field::TargetDate, date)).await {
            Ok(count) if count >= DAILY_CAPACITY => {
                self.notifier
                    .error("That day is already full (15 tasks). Pick another one.");
                return false;
            }
            Ok(_) => {}
            Err(error) => warn!(%error, %date, "capacity check failed"),
        }

        let task = match self
            .store
            .select(Query::filtered(Filter::eq(Field::Id, task_id)))
            .await
        {
            Ok(rows) => match rows.into_iter().next() {
                Some(task) => task,
                None => {
                    self.notifier.error("Task not found.");
                    return false;
                }
            },
            Err(error) => {
                warn!(%error, %task_id, "task lookup failed");
                self.notifier.error("Task not found.");
                return false;
            }
        };

        if task.is_unscheduled_backlog() {
            self.promote_backlog_copy(&task, date).await
        } else {
            self.move_in_place(task_id, date).await
        }
    }

    /// Clone branch: deadline and same-day duplicate checks, then insert a
    /// scheduled copy. The backlog master is never touched.
    async fn promote_backlog_copy(&self, task: &Goal, date: NaiveDate) -> bool {
        let Some(parent_id) = task.parent_id else {
            return false;
        };

        match self
            .store
            .select(Query::filtered(Filter::eq(Field::Id, parent_id)))
            .await
        {
            Ok(rows) => {
                if let Some(deadline) = rows.first().and_then(|p| p.target_date) {
                    if date > deadline {
                        self.notifier.error(&format!(
                            "Cannot schedule! Project \"{}\" ends on {deadline}.",
                            rows[0].text
                        ));
                        return false;
                    }
                }
            }
            // Best-effort read; a missing parent does not block the copy.
            Err(error) => warn!(%error, %parent_id, "parent lookup failed"),
        }

        let duplicate_filter = Filter::and(vec![
            Filter::eq(Field::ParentId, parent_id),
            Filter::eq(Field::Text, task.text.clone()),
            Filter::eq(Field::TargetDate, date),
        ]);
        match self.store.select(Query::filtered(duplicate_filter)).await {
            Ok(existing) if !existing.is_empty() => {
                self.notifier
                    .error("This task is already scheduled on that day.");
                return false;
            }
            Ok(_) => {}
            Err(error) => warn!(%error, "same-day duplicate check failed"),
        }

        match self
            .store
            .insert(vec![NewGoal::scheduled_copy(task, date)])
            .await
        {
            Ok(_) => {
                self.notifier.success("Copied onto the day.");
                true
            }
            Err(error) => {
                warn!(%error, "scheduled copy insert failed");
                self.notifier.error("Could not add it to the new day.");
                false
            }
        }
    }

    /// Move branch: in-place `target_date` update.
    async fn move_in_place(&self, task_id: GoalId, date: NaiveDate) -> bool {
        match self
            .store
            .update(GoalPatch::target_date(date), Filter::eq(Field::Id, task_id))
            .await
        {
            Ok(_) => {
                self.notifier.success("Scheduled.");
                true
            }
            Err(error) => {
                warn!(%error, %task_id, "task move failed");
                self.notifier.error("Could not move the task.");
                false
            }
        }
    }
}
