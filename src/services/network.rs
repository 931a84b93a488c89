// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Connectivity signal.
//!
//! Platform callbacks call [`NetworkMonitor::report`] from any thread. The
//! monitor only publishes to channels; sync work happens on the trigger task.

use crate::services::sync::SyncCoordinator;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

const TRANSITION_CHANNEL_CAPACITY: usize = 16;

/// A change in connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkTransition {
    CameOnline,
    WentOffline,
}

/// Online/offline state plus a stream of transitions.
pub struct NetworkMonitor {
    online: watch::Sender<bool>,
    transitions: broadcast::Sender<NetworkTransition>,
}

impl NetworkMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (online, _) = watch::channel(initially_online);
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);
        Self {
            online,
            transitions,
        }
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    /// Record the current connectivity.
    ///
    /// Repeated reports of the same value are ignored. Returns the
    /// transition, if this report caused one.
    pub fn report(&self, online: bool) -> Option<NetworkTransition> {
        let mut transition = None;
        self.online.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            let t = if online {
                NetworkTransition::CameOnline
            } else {
                NetworkTransition::WentOffline
            };
            // Published under the watch lock so transitions keep report order
            let _ = self.transitions.send(t);
            transition = Some(t);
            true
        });

        if let Some(t) = transition {
            tracing::info!(transition = ?t, "Connectivity changed");
        }
        transition
    }

    /// Current-value receiver, for components that gate on connectivity.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.online.subscribe()
    }

    pub fn transitions(&self) -> broadcast::Receiver<NetworkTransition> {
        self.transitions.subscribe()
    }

    /// Run `sync_all` once for every offline→online transition.
    ///
    /// The task ends when the monitor is dropped.
    pub fn spawn_sync_trigger(&self, sync: Arc<SyncCoordinator>) -> JoinHandle<()> {
        let mut transitions = self.transitions();
        let online = self.subscribe();

        tokio::spawn(async move {
            loop {
                match transitions.recv().await {
                    Ok(NetworkTransition::CameOnline) => {
                        sync.refresh_state();
                        let sync = sync.clone();
                        tokio::spawn(async move {
                            sync.sync_all().await;
                        });
                    }
                    Ok(NetworkTransition::WentOffline) => sync.refresh_state(),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Missed connectivity transitions");
                        sync.refresh_state();
                        if *online.borrow() {
                            let sync = sync.clone();
                            tokio::spawn(async move {
                                sync.sync_all().await;
                            });
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("Sync trigger stopped");
        })
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_detects_transitions_only() {
        let monitor = NetworkMonitor::new(false);
        let mut rx = monitor.transitions();

        assert_eq!(monitor.report(false), None);
        assert_eq!(monitor.report(true), Some(NetworkTransition::CameOnline));
        assert_eq!(monitor.report(true), None);
        assert_eq!(monitor.report(false), Some(NetworkTransition::WentOffline));

        assert_eq!(rx.try_recv().unwrap(), NetworkTransition::CameOnline);
        assert_eq!(rx.try_recv().unwrap(), NetworkTransition::WentOffline);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_report_from_other_threads() {
        let monitor = Arc::new(NetworkMonitor::new(false));
        let watcher = monitor.subscribe();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let monitor = monitor.clone();
                std::thread::spawn(move || monitor.report(true))
            })
            .collect();
        let transitions: Vec<_> = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .collect();

        assert_eq!(transitions, vec![NetworkTransition::CameOnline]);
        assert!(*watcher.borrow());
    }
}
