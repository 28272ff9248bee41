//! HTTP remote store over a row-oriented REST interface
//!
//! Speaks the PostgREST-style dialect: one route per table, `column=eq.`
//! filters, partial updates via PATCH, and `Prefer: return=representation`
//! to get the canonical server row back on writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, Response};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::models::{RecordId, SyncRecord};

use super::{RemoteConfig, RemoteError, RemoteResult, RemoteStore};

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Remote store client for the hosted backend
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpRemoteStore {
    /// Build a client from a complete [`RemoteConfig`]
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| Error::InvalidInput("remote base URL is required".into()))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::InvalidInput("remote API key is required".into()))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout.unwrap_or(RemoteConfig::DEFAULT_TIMEOUT))
            .build()
            .map_err(|error| Error::InvalidInput(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn row_url(&self, table: &str, owner_id: &str, id: &RecordId) -> String {
        format!(
            "{}?id=eq.{}&owner_id=eq.{}",
            self.table_url(table),
            urlencoding::encode(id.as_str()),
            urlencoding::encode(owner_id),
        )
    }

    fn owner_url(&self, table: &str, owner_id: &str) -> String {
        format!(
            "{}?owner_id=eq.{}",
            self.table_url(table),
            urlencoding::encode(owner_id),
        )
    }

    fn request(&self, method: Method, url: String) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
    }

    /// Turn an HTTP error status into a rejection
    async fn check(response: Response) -> RemoteResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        Err(RemoteError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    fn to_body<S: serde::Serialize>(value: &S) -> RemoteResult<JsonValue> {
        serde_json::to_value(value)
            .map_err(|error| RemoteError::rejected(400, format!("unserializable payload: {error}")))
    }
}

#[async_trait]
impl<T: SyncRecord> RemoteStore<T> for HttpRemoteStore {
    async fn create(&self, owner_id: &str, record: &T) -> RemoteResult<T> {
        let mut body = Self::to_body(record)?;
        if let Some(object) = body.as_object_mut() {
            object.insert(
                "owner_id".to_string(),
                JsonValue::String(owner_id.to_string()),
            );
        }

        let response = self
            .request(Method::POST, self.table_url(T::TABLE))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let rows: Vec<T> = response.json().await?;
        rows.into_iter().next().ok_or_else(|| {
            RemoteError::rejected(404, format!("create in {} returned no row", T::TABLE))
        })
    }

    async fn update(
        &self,
        owner_id: &str,
        id: &RecordId,
        patch: &T::Patch,
        updated_at: DateTime<Utc>,
    ) -> RemoteResult<()> {
        let mut body = Self::to_body(patch)?;
        if let Some(object) = body.as_object_mut() {
            // Every remote write stamps the mutation timestamp, the
            // last-write-wins tie-breaker.
            object.insert(
                "updated_at".to_string(),
                JsonValue::String(updated_at.to_rfc3339()),
            );
        }

        let response = self
            .request(Method::PATCH, self.row_url(T::TABLE, owner_id, id))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response).await?;

        // PATCH against a filter that matches nothing succeeds with an
        // empty representation; surface that as not-found so the caller
        // can run the create-instead recovery.
        let rows: Vec<JsonValue> = response.json().await?;
        if rows.is_empty() {
            return Err(RemoteError::rejected(
                404,
                format!("no {} row matched id {id}", T::TABLE),
            ));
        }
        Ok(())
    }

    async fn delete(&self, owner_id: &str, id: &RecordId) -> RemoteResult<()> {
        let response = self
            .request(Method::DELETE, self.row_url(T::TABLE, owner_id, id))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn fetch_all(&self, owner_id: &str) -> RemoteResult<Vec<T>> {
        let url = format!(
            "{}&order=created_at.desc",
            self.owner_url(T::TABLE, owner_id)
        );
        let response = self.request(Method::GET, url).send().await?;
        let response = Self::check(response).await?;

        let rows: Vec<T> = response.json().await?;
        Ok(rows)
    }

    async fn clear(&self, owner_id: &str) -> RemoteResult<()> {
        let response = self
            .request(Method::DELETE, self.owner_url(T::TABLE, owner_id))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HttpRemoteStore {
        HttpRemoteStore::new(&RemoteConfig::new("https://api.example.com/", "key")).unwrap()
    }

    #[test]
    fn test_new_requires_full_config() {
        assert!(HttpRemoteStore::new(&RemoteConfig::default()).is_err());
        assert!(HttpRemoteStore::new(&RemoteConfig::new("https://x", "k")).is_ok());
    }

    #[test]
    fn test_urls_are_owner_scoped() {
        let store = store();
        assert_eq!(
            store.table_url("tasks"),
            "https://api.example.com/rest/v1/tasks"
        );
        assert_eq!(
            store.owner_url("tasks", "u1"),
            "https://api.example.com/rest/v1/tasks?owner_id=eq.u1"
        );
        assert_eq!(
            store.row_url("tasks", "u1", &RecordId::from("t 1")),
            "https://api.example.com/rest/v1/tasks?id=eq.t%201&owner_id=eq.u1"
        );
    }
}
