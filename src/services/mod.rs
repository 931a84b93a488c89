// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - capture and sync engines.

pub mod gateway;
pub mod journey;
pub mod network;
pub mod rest_gateway;
pub mod sampling;
pub mod session;
pub mod sync;
pub mod tracking;

pub use gateway::{GatewayError, RemoteGateway};
pub use journey::JourneyService;
pub use network::{NetworkMonitor, NetworkTransition};
pub use rest_gateway::RestGateway;
pub use sampling::{Rejection, SamplingFilter, SamplingProfile};
pub use session::{IngestOutcome, SessionSnapshot, SessionState, TrackingSession};
pub use sync::{SaveOutcome, SyncCoordinator, SyncOptions, SyncOutcome, SyncReport};
pub use tracking::{TrackingEvent, TrackingHandle, TrackingService};
