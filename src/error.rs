// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for the capture and sync engines.
//!
//! Capture errors are returned to the caller. Sync errors are absorbed by the
//! coordinator (the offline queue is the recovery mechanism) and only show up
//! in logs and in aggregate sync state.

use crate::db::QueueError;
use crate::models::PermissionState;
use crate::services::gateway::GatewayError;
use crate::services::session::SessionState;
use std::time::Duration;

/// Errors from the trajectory capture engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackingError {
    #[error("Location permission is {0}")]
    PermissionDenied(PermissionState),

    #[error("Not enough points to save a journey: have {have}, need {need}")]
    InsufficientPoints { have: usize, need: usize },

    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("Tracking engine has shut down")]
    EngineClosed,
}

/// Errors from the sync engine.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Remote write failed: {0}")]
    RemoteWriteFailed(#[from] GatewayError),

    #[error("Remote call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to decode queued payload: {0}")]
    DecodeFailure(String),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

impl SyncError {
    /// Whether the failed change should stay queued for another attempt.
    ///
    /// Decode failures can never succeed on replay, so they are dropped.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SyncError::DecodeFailure(_))
    }

    /// Whether the failure looks temporary (timeouts, rate limits, 5xx).
    ///
    /// Non-transient remote failures are still retried, but usually need a
    /// fix on the server side first.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::RemoteWriteFailed(e) => e.is_transient(),
            SyncError::Timeout(_) => true,
            SyncError::DecodeFailure(_) | SyncError::Queue(_) => false,
        }
    }
}

/// Errors from journey and entry operations that span both engines.
#[derive(Debug, thiserror::Error)]
pub enum JourneyError {
    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error("Failed to persist change locally: {0}")]
    Queue(#[from] QueueError),
}

/// Result type alias for capture operations.
pub type TrackingResult<T> = std::result::Result<T, TrackingError>;
