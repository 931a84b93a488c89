// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PostgREST-style HTTP implementation of [`RemoteGateway`].
//!
//! - upsert: `POST {base}/rest/v1/{table}` with `Prefer: resolution=merge-duplicates`
//! - delete: `DELETE {base}/rest/v1/{table}?id=eq.{id}`
//! - query:  `GET {base}/rest/v1/{table}?select=*`

use crate::models::Record;
use crate::services::gateway::{GatewayError, RemoteGateway};
use async_trait::async_trait;

/// HTTP client for a PostgREST-compatible backend.
#[derive(Clone)]
pub struct RestGateway {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestGateway {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, urlencoding::encode(table))
    }

    fn delete_url(&self, table: &str, id: &str) -> String {
        format!(
            "{}?id=eq.{}",
            self.table_url(table),
            urlencoding::encode(id)
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    /// Check response status and return error if not successful.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        if status == 429 {
            tracing::warn!("Remote store rate limit hit (429)");
        }

        Err(GatewayError::Status { status, body })
    }
}

#[async_trait]
impl RemoteGateway for RestGateway {
    async fn upsert(&self, table: &str, record: &Record) -> Result<(), GatewayError> {
        let request = self
            .http
            .post(self.table_url(table))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(record);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Self::check_response(response).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), GatewayError> {
        let request = self.http.delete(self.delete_url(table, id));

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Self::check_response(response).await?;
        Ok(())
    }

    async fn query(&self, table: &str) -> Result<Vec<Record>, GatewayError> {
        let request = self
            .http
            .get(self.table_url(table))
            .query(&[("select", "*")]);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Self::check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("JSON parse error: {}", e)))
    }
}
