//! Routine materialization engine.
//!
//! Templates are ordinary goal rows pinned to the sentinel date; `sync`
//! instantiates the missing ones onto a concrete day. Idempotence comes from
//! the dedup key `(target_date, text)`: a template whose exact text already
//! appears on the day is considered satisfied, even if the existing row was
//! created by hand or carries a different category.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use lifeos_core::{constants::TEMPLATE_DATE, Clock, Goal, GoalId, NewGoal};
use lifeos_store::{Field, Filter, GoalStore, Query};
use tracing::warn;

use crate::notify::Notifier;

/// Manages routine templates and their daily materialization.
pub struct RoutineEngine {
    store: Arc<dyn GoalStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl RoutineEngine {
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

    /// All routine templates. Read failures yield an empty list.
    pub async fn templates(&self) -> Vec<Goal> {
        match self
            .store
            .select(Query::filtered(Filter::eq(Field::TargetDate, TEMPLATE_DATE)))
            .await
        {
            Ok(rows) => rows,
            Err(error) => {
                warn!(%error, "template fetch failed");
                Vec::new()
            }
        }
    }

    /// Add a template.
    pub async fn add_template(&self, text: &str, category: &str) {
        match self
            .store
            .insert(vec![NewGoal::template(text, category)])
            .await
        {
            Ok(_) => self.notifier.success("Added to the routine."),
            Err(error) => {
                warn!(%error, "template insert failed");
                self.notifier.error("Could not add the routine entry.");
            }
        }
    }

    /// Remove a template. Fire-and-forget: the confirmation is shown either
    /// way (inherited behavior).
    pub async fn remove_template(&self, id: GoalId) {
        if let Err(error) = self.store.delete(Filter::eq(Field::Id, id)).await {
            warn!(%error, %id, "template delete failed");
        }
        self.notifier.success("Removed from the routine.");
    }

    /// Materialize missing templates onto `date`.
    ///
    /// No-op when the date is past, when there are no templates, or when
    /// every template text already appears on the day. Returns the inserted
    /// instances so the owning view can adopt them without a re-fetch.
    pub async fn sync(&self, date: NaiveDate) -> Vec<Goal> {
        if date < self.clock.today() {
            self.notifier
                .error("Cannot sync the routine into the past.");
            return Vec::new();
        }

        let templates = match self
            .store
            .select(Query::filtered(Filter::eq(Field::TargetDate, TEMPLATE_DATE)))
            .await
        {
            Ok(rows) => rows,
            Err(error) => {
                warn!(%error, "routine sync: template fetch failed");
                return Vec::new();
            }
        };
        if templates.is_empty() {
            return Vec::new();
        }

        let scheduled = match self
            .store
            .select(Query::filtered(Filter::eq(Field::TargetDate, date)))
            .await
        {
            Ok(rows) => rows,
            Err(error) => {
                warn!(%error, %date, "routine sync: day fetch failed");
                return Vec::new();
            }
        };
        let existing: HashSet<&str> = scheduled.iter().map(|g| g.text.as_str()).collect();

        let missing: Vec<NewGoal> = templates
            .iter()
            .filter(|t| !existing.contains(t.text.as_str()))
            .map(|t| NewGoal::routine_instance(t, date))
            .collect();
        if missing.is_empty() {
            return Vec::new();
        }

        match self.store.insert(missing).await {
            Ok(rows) => {
                self.notifier
                    .success(&format!("Added {} routine tasks.", rows.len()));
                rows
            }
            Err(error) => {
                warn!(%error, %date, "routine sync: insert failed");
                Vec::new()
            }
        }
    }
}
