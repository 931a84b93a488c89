// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod change;
pub mod entry;
pub mod journey;
pub mod location;
pub mod record;
pub mod sync_state;
pub mod transport;

pub use change::{ChangeAction, EntityChange, EntityType, PendingChange, Syncable};
pub use entry::{EventEntry, MoodEntry};
pub use journey::Journey;
pub use location::{LocationEvent, LocationFix, PermissionState, TrackPoint};
pub use record::{Record, RecordError, RecordExt, Value};
pub use sync_state::SyncState;
pub use transport::{classify, TransportMode};
