// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use crate::services::sync::{DEFAULT_REMOTE_TIMEOUT, DEFAULT_SYNC_CONCURRENCY};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Owner of recorded journeys and entries
    pub user_id: String,
    /// Base URL of the remote store
    pub remote_url: String,
    /// API key sent with every remote call
    pub api_key: Option<String>,
    /// Directory for local storage (the offline queue)
    pub data_dir: PathBuf,
    /// Bound on each remote call
    pub remote_timeout: Duration,
    /// Queued changes replayed concurrently
    pub sync_concurrency: usize,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            user_id: "test-user".to_string(),
            remote_url: "http://localhost:54321".to_string(),
            api_key: None,
            data_dir: PathBuf::from("./data"),
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            sync_concurrency: DEFAULT_SYNC_CONCURRENCY,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            user_id: env::var("JOURNEY_USER_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("JOURNEY_USER_ID"))?,
            remote_url: env::var("SYNC_REMOTE_URL")
                .map_err(|_| ConfigError::Missing("SYNC_REMOTE_URL"))?,
            api_key: env::var("SYNC_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            data_dir: env::var("JOURNEY_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            remote_timeout: env::var("SYNC_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REMOTE_TIMEOUT),
            sync_concurrency: env::var("SYNC_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_SYNC_CONCURRENCY),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
