//! The polymorphic goal record.
//!
//! One row type underlies every engine: daily tasks, deep-work sessions,
//! routine templates and their materialized instances, projects, and project
//! backlog items. The [`GoalKind`] discriminator plus two nullable fields
//! (`target_date`, `parent_id`) encode which partition a record belongs to:
//!
//! - `target_date == TEMPLATE_DATE` — routine template
//! - `target_date == None` and `parent_id` set — unscheduled backlog item
//! - anything else — a date-scoped task

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Store-assigned numeric goal identifier.
///
/// A newtype so a goal id cannot be confused with a priority or a count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(i64);

impl GoalId {
    /// Wrap a raw store id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw numeric value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Record discriminator. Wire names match the stored `type` column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    /// A plain daily task.
    Daily,
    /// A deep-work (Pomodoro) session.
    Study,
    /// A recurring-task blueprint pinned to the template sentinel date.
    RoutineTemplate,
    /// A routine instance materialized onto a concrete date.
    DailyRoutine,
    /// A project record owning backlog items.
    Project,
    /// A backlog item linked to a project via `parent_id`.
    ProjectTask,
}

impl GoalKind {
    /// Default category assigned when a draft of this kind is created.
    #[must_use]
    pub const fn default_category(self) -> &'static str {
        match self {
            Self::Study => "work",
            _ => "other",
        }
    }

    /// Stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Study => "study",
            Self::RoutineTemplate => "routine_template",
            Self::DailyRoutine => "daily_routine",
            Self::Project => "project",
            Self::ProjectTask => "project_task",
        }
    }
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edit mode. Strict records are locked by the presentation layer except for
/// completion and session-count increments; the engines store the flag but do
/// not enforce it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalMode {
    /// Freely editable.
    #[default]
    Normal,
    /// Locked against edits (UI-layer contract).
    Strict,
}

/// Project flavor, stored in the project record's `category` column.
///
/// For `Exam` projects the `priority` column holds the target score instead
/// of an urgency value — an inherited overload that is preserved as-is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    /// General-purpose plan.
    #[default]
    General,
    /// Coursework with a due date.
    Assignment,
    /// Exam preparation with a target score.
    Exam,
}

impl ProjectKind {
    /// Stored string form (the `category` value of a project record).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Assignment => "assignment",
            Self::Exam => "exam",
        }
    }
}

/// A persisted goal record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// Store-assigned identity.
    pub id: GoalId,
    /// Display label. May be empty while the record is a freshly added draft.
    pub text: String,
    /// Completion flag.
    pub done: bool,
    /// Scheduled calendar date. `None` for unscheduled backlog items; the
    /// template sentinel date for routine templates.
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    /// Free-form grouping label; holds the [`ProjectKind`] string for
    /// project records.
    pub category: String,
    /// Urgency, manual sort key, and (exam projects) target score.
    pub priority: i32,
    /// Total planned Pomodoro minutes.
    #[serde(default)]
    pub estimated_minutes: Option<i32>,
    /// Minutes per focus session.
    #[serde(default)]
    pub focus_span: Option<i32>,
    /// Focus sessions completed so far.
    #[serde(default)]
    pub completed_sessions: Option<i32>,
    /// Edit mode.
    #[serde(default)]
    pub mode: GoalMode,
    /// Record discriminator.
    #[serde(rename = "type")]
    pub kind: GoalKind,
    /// Owning project, for backlog items and their scheduled copies.
    #[serde(default)]
    pub parent_id: Option<GoalId>,
}

impl Goal {
    /// Whether the record is an unscheduled backlog item (linked to a
    /// project, not yet placed on a date).
    #[must_use]
    pub fn is_unscheduled_backlog(&self) -> bool {
        self.parent_id.is_some() && self.target_date.is_none()
    }
}

/// Insert payload — everything but the store-assigned id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGoal {
    /// Display label.
    pub text: String,
    /// Completion flag (always `false` at creation).
    pub done: bool,
    /// Scheduled date, template sentinel, or `None` for backlog items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    /// Grouping label.
    pub category: String,
    /// Initial priority.
    pub priority: i32,
    /// Edit mode.
    pub mode: GoalMode,
    /// Record discriminator.
    #[serde(rename = "type")]
    pub kind: GoalKind,
    /// Owning project, when inserting backlog items or scheduled copies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<GoalId>,
}

impl NewGoal {
    /// An empty-text draft task for `date` (the add-task flow).
    #[must_use]
    pub fn draft(kind: GoalKind, date: NaiveDate) -> Self {
        Self {
            text: String::new(),
            done: false,
            target_date: Some(date),
            category: kind.default_category().to_string(),
            priority: 1,
            mode: GoalMode::Normal,
            kind,
            parent_id: None,
        }
    }

    /// A routine template pinned to the sentinel date.
    #[must_use]
    pub fn template(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
            target_date: Some(crate::constants::TEMPLATE_DATE),
            category: category.into(),
            priority: 1,
            mode: GoalMode::Normal,
            kind: GoalKind::RoutineTemplate,
            parent_id: None,
        }
    }

    /// A routine instance materialized from `template` onto `date`.
    ///
    /// Copies `category` and `priority`; the instance always starts
    /// not-done in normal mode.
    #[must_use]
    pub fn routine_instance(template: &Goal, date: NaiveDate) -> Self {
        Self {
            text: template.text.clone(),
            done: false,
            target_date: Some(date),
            category: template.category.clone(),
            priority: template.priority,
            mode: GoalMode::Normal,
            kind: GoalKind::DailyRoutine,
            parent_id: None,
        }
    }

    /// A project record. `deadline` lands in `target_date`; for exam
    /// projects `priority` carries the target score.
    #[must_use]
    pub fn project(
        name: impl Into<String>,
        kind: ProjectKind,
        deadline: Option<NaiveDate>,
        priority: i32,
    ) -> Self {
        Self {
            text: name.into(),
            done: false,
            target_date: deadline,
            category: kind.as_str().to_string(),
            priority,
            mode: GoalMode::Normal,
            kind: GoalKind::Project,
            parent_id: None,
        }
    }

    /// An unscheduled backlog item under `project_id`.
    #[must_use]
    pub fn backlog_item(project_id: GoalId, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
            target_date: None,
            category: "work".to_string(),
            priority: 1,
            mode: GoalMode::Normal,
            kind: GoalKind::ProjectTask,
            parent_id: Some(project_id),
        }
    }

    /// A scheduled copy of a backlog item placed on `date`.
    ///
    /// Preserves text, category, priority, kind and parent link; the copy
    /// starts not-done in normal mode and the source record is untouched.
    #[must_use]
    pub fn scheduled_copy(source: &Goal, date: NaiveDate) -> Self {
        Self {
            text: source.text.clone(),
            done: false,
            target_date: Some(date),
            category: source.category.clone(),
            priority: source.priority,
            mode: GoalMode::Normal,
            kind: source.kind,
            parent_id: source.parent_id,
        }
    }
}

/// Partial update payload. `None` fields are left untouched and are omitted
/// from the serialized wire form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalPatch {
    /// New display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// New completion flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    /// New scheduled date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    /// New category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// New priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    /// New planned minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<i32>,
    /// New minutes-per-session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_span: Option<i32>,
    /// New completed-session count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_sessions: Option<i32>,
    /// New edit mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<GoalMode>,
}

impl GoalPatch {
    /// A patch flipping only the completion flag.
    #[must_use]
    pub fn done(done: bool) -> Self {
        Self {
            done: Some(done),
            ..Self::default()
        }
    }

    /// A patch setting only the edit mode.
    #[must_use]
    pub fn mode(mode: GoalMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }

    /// A patch moving the record to `date`.
    #[must_use]
    pub fn target_date(date: NaiveDate) -> Self {
        Self {
            target_date: Some(date),
            ..Self::default()
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch to an in-memory record.
    pub fn apply(&self, goal: &mut Goal) {
        if let Some(ref text) = self.text {
            goal.text.clone_from(text);
        }
        if let Some(done) = self.done {
            goal.done = done;
        }
        if let Some(date) = self.target_date {
            goal.target_date = Some(date);
        }
        if let Some(ref category) = self.category {
            goal.category.clone_from(category);
        }
        if let Some(priority) = self.priority {
            goal.priority = priority;
        }
        if let Some(minutes) = self.estimated_minutes {
            goal.estimated_minutes = Some(minutes);
        }
        if let Some(span) = self.focus_span {
            goal.focus_span = Some(span);
        }
        if let Some(sessions) = self.completed_sessions {
            goal.completed_sessions = Some(sessions);
        }
        if let Some(mode) = self.mode {
            goal.mode = mode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TEMPLATE_DATE;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn kind_wire_names_match_stored_column() {
        assert_eq!(
            serde_json::to_string(&GoalKind::RoutineTemplate).unwrap(),
            "\"routine_template\""
        );
        assert_eq!(
            serde_json::to_string(&GoalKind::ProjectTask).unwrap(),
            "\"project_task\""
        );
        let parsed: GoalKind = serde_json::from_str("\"daily_routine\"").unwrap();
        assert_eq!(parsed, GoalKind::DailyRoutine);
    }

    #[test]
    fn goal_serializes_kind_under_type_key() {
        let goal = Goal {
            id: GoalId::new(7),
            text: "Read".to_string(),
            done: false,
            target_date: Some(date("2026-02-01")),
            category: "life".to_string(),
            priority: 2,
            estimated_minutes: None,
            focus_span: None,
            completed_sessions: None,
            mode: GoalMode::Normal,
            kind: GoalKind::Daily,
            parent_id: None,
        };
        let json = serde_json::to_value(&goal).unwrap();
        assert_eq!(json["type"], "daily");
        assert_eq!(json["target_date"], "2026-02-01");
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn draft_uses_kind_default_category() {
        let draft = NewGoal::draft(GoalKind::Study, date("2026-02-01"));
        assert_eq!(draft.category, "work");
        assert!(draft.text.is_empty());
        assert_eq!(draft.priority, 1);

        let chore = NewGoal::draft(GoalKind::Daily, date("2026-02-01"));
        assert_eq!(chore.category, "other");
    }

    #[test]
    fn template_pins_sentinel_date() {
        let tpl = NewGoal::template("Morning Run", "health");
        assert_eq!(tpl.target_date, Some(TEMPLATE_DATE));
        assert_eq!(tpl.kind, GoalKind::RoutineTemplate);
    }

    #[test]
    fn scheduled_copy_preserves_identity_fields_resets_state() {
        let source = Goal {
            id: GoalId::new(3),
            text: "Write chapter".to_string(),
            done: true,
            target_date: None,
            category: "work".to_string(),
            priority: 4,
            estimated_minutes: Some(50),
            focus_span: None,
            completed_sessions: Some(2),
            mode: GoalMode::Strict,
            kind: GoalKind::ProjectTask,
            parent_id: Some(GoalId::new(1)),
        };
        let copy = NewGoal::scheduled_copy(&source, date("2026-02-02"));
        assert_eq!(copy.text, source.text);
        assert_eq!(copy.parent_id, source.parent_id);
        assert_eq!(copy.priority, source.priority);
        assert_eq!(copy.kind, GoalKind::ProjectTask);
        assert!(!copy.done);
        assert_eq!(copy.mode, GoalMode::Normal);
        assert_eq!(copy.target_date, Some(date("2026-02-02")));
    }

    #[test]
    fn patch_skips_unset_fields_on_the_wire() {
        let patch = GoalPatch::done(true);
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, "{\"done\":true}");
    }

    #[test]
    fn patch_apply_only_touches_set_fields() {
        let mut goal = Goal {
            id: GoalId::new(1),
            text: "Stretch".to_string(),
            done: false,
            target_date: Some(date("2026-02-01")),
            category: "health".to_string(),
            priority: 1,
            estimated_minutes: None,
            focus_span: None,
            completed_sessions: None,
            mode: GoalMode::Normal,
            kind: GoalKind::Daily,
            parent_id: None,
        };
        let patch = GoalPatch {
            priority: Some(5),
            ..GoalPatch::default()
        };
        patch.apply(&mut goal);
        assert_eq!(goal.priority, 5);
        assert_eq!(goal.text, "Stretch");
        assert!(!goal.done);
    }

    #[test]
    fn unscheduled_backlog_detection() {
        let mut goal = Goal {
            id: GoalId::new(2),
            text: "Outline".to_string(),
            done: false,
            target_date: None,
            category: "work".to_string(),
            priority: 1,
            estimated_minutes: None,
            focus_span: None,
            completed_sessions: None,
            mode: GoalMode::Normal,
            kind: GoalKind::ProjectTask,
            parent_id: Some(GoalId::new(9)),
        };
        assert!(goal.is_unscheduled_backlog());
        goal.target_date = Some(date("2026-02-01"));
        assert!(!goal.is_unscheduled_backlog());
    }
}
