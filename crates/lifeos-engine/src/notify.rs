//! Injected effect ports.
//!
//! The engines never render anything: user-visible feedback (toasts, sounds,
//! confetti) and the completion→XP wiring are capability interfaces the
//! presentation layer implements. This keeps every engine testable without a
//! UI and keeps failure reporting at the engine boundary — no engine method
//! returns an error.

use tracing::{error, info, warn};

/// User-facing notification sink.
pub trait Notifier: Send + Sync {
    /// A confirmation the user should see.
    fn success(&self, message: &str);

    /// A neutral notice.
    fn info(&self, message: &str);

    /// A failure the user should see. Engines have already handled the
    /// failure (rollback or corrective re-fetch) by the time this fires.
    fn error(&self, message: &str);

    /// The profile reached a new level.
    fn level_up(&self, level: i64);
}

/// Completion side-effect sink, mirroring the "task completed" callback that
/// wires the task engine to the gamification ledger without coupling them.
pub trait CompletionHook: Send + Sync {
    /// A task transitioned to done, worth `xp` points.
    fn completed(&self, xp: i64);
}

/// Notifier that forwards everything to `tracing`. Useful as a default when
/// no presentation layer is attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(message, "notice");
    }

    fn info(&self, message: &str) {
        info!(message, "notice");
    }

    fn error(&self, message: &str) {
        error!(message, "notice");
    }

    fn level_up(&self, level: i64) {
        info!(level, "level up");
    }
}

/// Completion hook that only logs. Used when no ledger is attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCompletionHook;

impl CompletionHook for NoopCompletionHook {
    fn completed(&self, xp: i64) {
        warn!(xp, "task completion observed with no ledger attached");
    }
}
