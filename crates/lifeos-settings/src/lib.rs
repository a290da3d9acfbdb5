//! # lifeos-settings
//!
//! Configuration for the Life OS client: typed settings with compiled
//! defaults, deep-merged with `~/.lifeos/settings.json` when present, then
//! overridden by environment variables.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{load_settings, load_settings_from_path, settings_path};
pub use types::{LifeSettings, StoreSettings, UserSettings};
