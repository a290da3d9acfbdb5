//! Settings type definitions.
//!
//! Each type implements [`Default`] with production default values and uses
//! `#[serde(default)]` so a partial settings file is valid — missing fields
//! fall back to their defaults during deserialization.

use serde::{Deserialize, Serialize};

/// Root settings for the Life OS client.
///
/// Loaded from `~/.lifeos/settings.json` with defaults applied for missing
/// fields; environment variables override specific values.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LifeSettings {
    /// Remote store connection settings.
    pub store: StoreSettings,
    /// User identity settings.
    pub user: UserSettings,
}

/// Remote store connection settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreSettings {
    /// Base URL of the hosted store.
    pub base_url: String,
    /// API key, sent as `apikey` and bearer token.
    pub api_key: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            timeout_ms: 10_000,
        }
    }
}

/// User identity settings.
///
/// The engines need only a stable user identifier; how it is obtained and
/// renewed is the identity provider's concern.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UserSettings {
    /// Stable user identifier, once the session is known.
    pub user_id: String,
}
