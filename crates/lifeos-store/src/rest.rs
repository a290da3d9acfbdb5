//! PostgREST-style HTTP backend.
//!
//! Talks to a hosted relational store exposing the goals and profiles tables
//! under `/rest/v1/`. Filters render to query parameters, writes ask for
//! `return=representation` so affected rows can be counted from the body,
//! and the batched priority upsert uses `resolution=merge-duplicates` keyed
//! on `id`. Authentication is the usual `apikey` + bearer pair.

use std::time::Duration;

use async_trait::async_trait;
use lifeos_core::{Goal, GoalPatch, NewGoal, Profile, ProfilePatch};
use reqwest::{Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::{StoreError, StoreResult};
use crate::filter::{Filter, Query};
use crate::store::{GoalStore, PriorityRewrite, ProfileStore};

/// Default request timeout.
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Connection settings for the REST backend.
#[derive(Clone, Debug)]
pub struct RestConfig {
    /// Base URL of the hosted store (without the `/rest/v1` suffix).
    pub base_url: String,
    /// API key, sent both as `apikey` and as the bearer token.
    pub api_key: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl RestConfig {
    /// Config with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// HTTP store backend.
pub struct RestStore {
    config: RestConfig,
    client: reqwest::Client,
}

impl RestStore {
    /// Build a store with its own HTTP client.
    pub fn new(config: RestConfig) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { config, client })
    }

    /// Build a store sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(config: RestConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{table}",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    /// Query parameters for a select: projection, filter, ordering.
    fn select_pairs(query: &Query) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        if let Some(ref filter) = query.filter {
            pairs.extend(filter.to_query_pairs());
        }
        if let Some(order) = query.render_order() {
            pairs.push(("order".to_string(), order));
        }
        pairs
    }
}

/// Fail on non-success statuses, carrying the response body as context.
async fn ensure_success(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl GoalStore for RestStore {
    async fn select(&self, query: Query) -> StoreResult<Vec<Goal>> {
        let pairs = Self::select_pairs(&query);
        debug!(params = ?pairs, "select goals");
        let response = self
            .request(Method::GET, "goals")
            .query(&pairs)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn count(&self, filter: Filter) -> StoreResult<u64> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(filter.to_query_pairs());
        let response = self
            .request(Method::HEAD, "goals")
            .query(&pairs)
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| StoreError::Malformed("count reply without content-range".into()))?;
        range
            .rsplit('/')
            .next()
            .and_then(|total| total.parse().ok())
            .ok_or_else(|| StoreError::Malformed(format!("unparseable content-range `{range}`")))
    }

    async fn insert(&self, rows: Vec<NewGoal>) -> StoreResult<Vec<Goal>> {
        debug!(count = rows.len(), "insert goals");
        let response = self
            .request(Method::POST, "goals")
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn update(&self, patch: GoalPatch, filter: Filter) -> StoreResult<u64> {
        let pairs = filter.to_query_pairs();
        debug!(params = ?pairs, "update goals");
        let response = self
            .request(Method::PATCH, "goals")
            .query(&pairs)
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        let rows: Vec<Goal> = ensure_success(response).await?.json().await?;
        Ok(rows.len() as u64)
    }

    async fn delete(&self, filter: Filter) -> StoreResult<u64> {
        let pairs = filter.to_query_pairs();
        debug!(params = ?pairs, "delete goals");
        let response = self
            .request(Method::DELETE, "goals")
            .query(&pairs)
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let rows: Vec<Goal> = ensure_success(response).await?.json().await?;
        Ok(rows.len() as u64)
    }

    async fn upsert_priorities(&self, rewrites: Vec<PriorityRewrite>) -> StoreResult<()> {
        debug!(count = rewrites.len(), "upsert priorities");
        let response = self
            .request(Method::POST, "goals")
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&rewrites)
            .send()
            .await?;
        let _ = ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for RestStore {
    async fn fetch(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        let pairs = vec![
            ("select".to_string(), "*".to_string()),
            ("id".to_string(), format!("eq.{user_id}")),
        ];
        let response = self
            .request(Method::GET, "profiles")
            .query(&pairs)
            .send()
            .await?;
        let rows: Vec<Profile> = ensure_success(response).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn create(&self, profile: Profile) -> StoreResult<Profile> {
        let response = self
            .request(Method::POST, "profiles")
            .header("Prefer", "return=representation")
            .json(&[profile])
            .send()
            .await?;
        let rows: Vec<Profile> = ensure_success(response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Malformed("profile insert returned no rows".into()))
    }

    async fn patch(&self, user_id: &str, patch: ProfilePatch) -> StoreResult<u64> {
        let response = self
            .request(Method::PATCH, "profiles")
            .query(&[("id", format!("eq.{user_id}"))])
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        let rows: Vec<Profile> = ensure_success(response).await?.json().await?;
        Ok(rows.len() as u64)
    }
}
