//! # lifeos-store
//!
//! The remote store adapter boundary: one logical goals table and one
//! profiles table, reached through filterable select / count / insert /
//! update / delete plus a batched priority upsert.
//!
//! The [`Filter`]/[`Query`] predicate model is shared by both backends: the
//! [`rest`] backend renders it to PostgREST query parameters, the [`memory`]
//! backend evaluates it in process. [`test_utils`] adds a failure-injecting
//! wrapper for exercising engine rollback paths.

#![deny(unsafe_code)]

pub mod errors;
pub mod filter;
pub mod memory;
pub mod rest;
pub mod store;
pub mod test_utils;

pub use errors::{StoreError, StoreResult};
pub use filter::{Direction, Field, FieldValue, Filter, OrderBy, Query};
pub use memory::MemoryStore;
pub use rest::{RestConfig, RestStore};
pub use store::{GoalStore, PriorityRewrite, ProfileStore};
