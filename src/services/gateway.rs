// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote store surface consumed by the sync engine.

use crate::models::Record;
use async_trait::async_trait;

/// Errors reported by a remote gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Rate limits and server-side failures are worth retrying soon.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Transport(_) => true,
            GatewayError::Status { status, .. } => *status == 429 || *status >= 500,
            GatewayError::InvalidResponse(_) => false,
        }
    }
}

/// Backend upsert/delete/query API.
///
/// Upserts are keyed by the record's `id` field, so replaying the same
/// change is harmless.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    async fn upsert(&self, table: &str, record: &Record) -> Result<(), GatewayError>;

    async fn delete(&self, table: &str, id: &str) -> Result<(), GatewayError>;

    async fn query(&self, table: &str) -> Result<Vec<Record>, GatewayError>;
}
