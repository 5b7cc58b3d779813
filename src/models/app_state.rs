use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::AppConfig;

/// Application state shared between connections
pub struct AppState {
    pub config: AppConfig,
    connections: AtomicUsize,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            connections: AtomicUsize::new(0),
        }
    }

    /// Count a new connection; returns the number now open.
    pub fn connection_opened(&self) -> usize {
        self.connections.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Count a closed connection; returns the number still open.
    pub fn connection_closed(&self) -> usize {
        self.connections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
            .map_or(0, |previous| previous.saturating_sub(1))
    }

    pub fn open_connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}
