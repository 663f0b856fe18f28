//! Connectivity monitor
//!
//! Single source of truth for "is the network reachable". Advisory
//! only: a positive signal does not guarantee the remote task service
//! is actually reachable, so every remote call still handles failure
//! independently.

use std::sync::Arc;

use tokio::sync::watch;

/// Tracks online/offline transitions and exposes the current state
/// plus a change subscription. Subscribers are notified exactly once
/// per genuine transition.
#[derive(Clone, Debug)]
pub struct ConnectivityMonitor {
    state: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    /// Create a monitor with an initial reachability assumption
    #[must_use]
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { state: Arc::new(tx) }
    }

    /// Current reachability state
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Record a reachability change. Only a genuine transition
    /// notifies subscribers; repeated reports of the same state are
    /// silently dropped.
    pub fn set_online(&self, online: bool) {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            tracing::debug!(online, "connectivity transition");
        }
    }

    /// Subscribe to state transitions
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
