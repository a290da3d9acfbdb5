//! Cross-engine flows over a shared in-memory store.
//!
//! The unit tests in each engine pin down single operations; these exercise
//! the seams between engines — routine instances flowing into the task
//! list, completions feeding the ledger, project deletion clearing the
//! partition a task view would otherwise resurface.

use std::sync::Arc;

use chrono::NaiveDate;
use lifeos_core::{FixedClock, GoalKind, ProjectKind};
use lifeos_engine::test_utils::{CountingCompletionHook, RecordingNotifier};
use lifeos_engine::{
    CompletionHook, GamificationLedger, Notifier, ProjectEngine, RoutineEngine, TaskEngine,
};
use lifeos_store::test_utils::FlakyStore;
use lifeos_store::{GoalStore, ProfileStore};

const TODAY: &str = "2026-01-10";

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

struct World {
    store: Arc<FlakyStore>,
    notifier: Arc<RecordingNotifier>,
    hook: Arc<CountingCompletionHook>,
    tasks: TaskEngine,
    routine: RoutineEngine,
    projects: ProjectEngine,
    ledger: GamificationLedger,
}

fn world() -> World {
    let store = Arc::new(FlakyStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let hook = Arc::new(CountingCompletionHook::new());
    let clock = Arc::new(FixedClock(date(TODAY)));

    let tasks = TaskEngine::new(
        Arc::clone(&store) as Arc<dyn GoalStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Arc::clone(&hook) as Arc<dyn CompletionHook>,
        clock.clone(),
    );
    let routine = RoutineEngine::new(
        Arc::clone(&store) as Arc<dyn GoalStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        clock.clone(),
    );
    let projects = ProjectEngine::new(
        Arc::clone(&store) as Arc<dyn GoalStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        clock.clone(),
    );
    let ledger = GamificationLedger::new(
        Arc::clone(&store) as Arc<dyn ProfileStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        clock,
        "user-1",
    );

    World {
        store,
        notifier,
        hook,
        tasks,
        routine,
        projects,
        ledger,
    }
}

#[tokio::test]
async fn routine_sync_feeds_the_task_view() {
    let mut w = world();
    w.routine.add_template("Morning Run", "health").await;
    w.tasks.fetch(date(TODAY)).await;
    assert!(w.tasks.tasks().is_empty());

    let inserted = w.routine.sync(date(TODAY)).await;
    w.tasks.adopt(inserted);

    assert_eq!(w.tasks.tasks().len(), 1);
    assert_eq!(w.tasks.tasks()[0].text, "Morning Run");

    // A re-fetch agrees with the adopted state; templates stay invisible.
    w.tasks.fetch(date(TODAY)).await;
    assert_eq!(w.tasks.tasks().len(), 1);
    assert_eq!(w.tasks.tasks()[0].kind, GoalKind::DailyRoutine);
}

#[tokio::test]
async fn completing_a_task_awards_xp_into_the_ledger() {
    let mut w = world();
    w.ledger.fetch_profile().await;
    w.tasks.add(GoalKind::Daily, date(TODAY)).await;
    let id = w.tasks.tasks()[0].id;

    w.tasks.toggle_done(id, false).await;
    // The view layer drains the hook into the ledger.
    w.ledger.add_xp(w.hook.total()).await;

    assert_eq!(w.ledger.profile().unwrap().xp, 10);
    assert_eq!(w.store.inner().profile_snapshot("user-1").unwrap().xp, 10);
}

#[tokio::test]
async fn promoted_backlog_item_appears_in_the_day_view() {
    let mut w = world();
    let project = w
        .projects
        .add_project("Book", ProjectKind::General, Some(date("2026-02-01")), None)
        .await
        .unwrap();
    let master = w
        .projects
        .add_backlog_item(project.id, "Write intro")
        .await
        .unwrap();

    assert!(w.projects.promote(master.id, date(TODAY)).await);
    w.tasks.fetch(date(TODAY)).await;

    assert_eq!(w.tasks.tasks().len(), 1);
    assert_eq!(w.tasks.tasks()[0].text, "Write intro");
    assert_eq!(w.tasks.tasks()[0].parent_id, Some(project.id));

    // The backlog master is still there for the project view.
    let backlog = w.projects.backlog_items(project.id).await;
    assert_eq!(backlog.len(), 1);
}

#[tokio::test]
async fn deleting_a_project_clears_its_scheduled_copies_too() {
    let mut w = world();
    let project = w
        .projects
        .add_project("Teardown", ProjectKind::General, None, None)
        .await
        .unwrap();
    let a = w.projects.add_backlog_item(project.id, "a").await.unwrap();
    let _ = w.projects.add_backlog_item(project.id, "b").await.unwrap();
    assert!(w.projects.promote(a.id, date(TODAY)).await);

    assert!(w.projects.delete_project(project.id).await);

    let rows = w.store.inner().goals_snapshot();
    assert!(rows.iter().all(|g| g.parent_id != Some(project.id)));
    assert!(rows.iter().all(|g| g.id != project.id));

    w.tasks.fetch(date(TODAY)).await;
    assert!(w.tasks.tasks().is_empty());
    assert!(!w.notifier.errors().iter().any(|e| e.contains("delete")));
}

#[tokio::test]
async fn duplicate_project_name_is_rejected_across_casing() {
    let w = world();
    assert!(w
        .projects
        .add_project("Duplicate", ProjectKind::General, None, None)
        .await
        .is_some());
    assert!(w
        .projects
        .add_project("dUpLiCaTe", ProjectKind::General, None, None)
        .await
        .is_none());

    assert_eq!(w.projects.fetch_projects().await.len(), 1);
}
