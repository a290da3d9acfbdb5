//! # lifeos-engine
//!
//! The optimistic client-side synchronization core: four engines over the
//! store adapter, each owning its slice of state and reconciling it with the
//! remote store.
//!
//! - [`TaskEngine`] — the date-scoped task collection: optimistic
//!   create/update/delete/toggle/reorder with snapshot-restore or
//!   corrective-re-fetch recovery.
//! - [`RoutineEngine`] — routine templates and their idempotent
//!   materialization onto concrete dates.
//! - [`ProjectEngine`] — projects, their backlogs, and promotion of backlog
//!   items onto the calendar.
//! - [`GamificationLedger`] — per-user XP and levels, applied as a
//!   completion side effect.
//!
//! Engines never return errors; failures surface through the [`Notifier`]
//! port after the engine has already converged its local state.

#![deny(unsafe_code)]

pub mod gamification;
pub mod notify;
mod ordering;
pub mod projects;
pub mod routine;
pub mod tasks;
pub mod test_utils;

pub use gamification::GamificationLedger;
pub use notify::{CompletionHook, NoopCompletionHook, Notifier, TracingNotifier};
pub use projects::ProjectEngine;
pub use routine::RoutineEngine;
pub use tasks::{TaskEngine, TaskField};
