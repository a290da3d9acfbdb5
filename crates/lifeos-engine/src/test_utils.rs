//! Recording doubles for the effect ports.

use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::Mutex;

use crate::notify::{CompletionHook, Notifier};

/// Notifier that records every message for assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    successes: Mutex<Vec<String>>,
    infos: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
    level_ups: Mutex<Vec<i64>>,
}

impl RecordingNotifier {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded success messages.
    #[must_use]
    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().clone()
    }

    /// Recorded info messages.
    #[must_use]
    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().clone()
    }

    /// Recorded error messages.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    /// Recorded level-up levels.
    #[must_use]
    pub fn level_ups(&self) -> Vec<i64> {
        self.level_ups.lock().clone()
    }

    /// Whether any error was reported.
    #[must_use]
    pub fn saw_error(&self) -> bool {
        !self.errors.lock().is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.successes.lock().push(message.to_string());
    }

    fn info(&self, message: &str) {
        self.infos.lock().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }

    fn level_up(&self, level: i64) {
        self.level_ups.lock().push(level);
    }
}

/// Completion hook that sums awarded XP.
#[derive(Debug, Default)]
pub struct CountingCompletionHook {
    total: AtomicI64,
    calls: AtomicI64,
}

impl CountingCompletionHook {
    /// A zeroed counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total XP observed.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.total.load(Ordering::SeqCst)
    }

    /// Number of completions observed.
    #[must_use]
    pub fn calls(&self) -> i64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionHook for CountingCompletionHook {
    fn completed(&self, xp: i64) {
        let _ = self.total.fetch_add(xp, Ordering::SeqCst);
        let _ = self.calls.fetch_add(1, Ordering::SeqCst);
    }
}
