//! Session registry: running charging sessions keyed by vehicle id

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::charging::SessionHandle;

struct RunningSession {
    handle: SessionHandle,
    task: JoinHandle<()>,
}

/// Thread-safe registry of running charging sessions
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, RunningSession>,
}

/// Shared, reference-counted session registry
pub type SharedSessionRegistry = Arc<SessionRegistry>;

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in `Arc` for shared ownership
    pub fn shared() -> SharedSessionRegistry {
        Arc::new(Self::new())
    }

    /// Handle of the live session for `vehicle_id`, starting one with
    /// `spawn` when none is running
    pub fn get_or_spawn(
        &self,
        vehicle_id: &str,
        spawn: impl FnOnce() -> (SessionHandle, JoinHandle<()>),
    ) -> SessionHandle {
        match self.sessions.entry(vehicle_id.to_string()) {
            Entry::Occupied(mut entry) => {
                if !entry.get().handle.is_closed() {
                    return entry.get().handle.clone();
                }
                warn!(vehicle_id, "Replacing stopped charging session");
                let (handle, task) = spawn();
                entry.insert(RunningSession {
                    handle: handle.clone(),
                    task,
                });
                handle
            }
            Entry::Vacant(entry) => {
                info!(vehicle_id, "Registering charging session");
                let (handle, task) = spawn();
                entry.insert(RunningSession {
                    handle: handle.clone(),
                    task,
                });
                handle
            }
        }
    }

    /// Stop and forget the session for `vehicle_id`. Returns whether one existed.
    pub fn remove(&self, vehicle_id: &str) -> bool {
        match self.sessions.remove(vehicle_id) {
            Some((_, session)) => {
                session.task.abort();
                info!(vehicle_id, "Charging session closed");
                true
            }
            None => {
                warn!(vehicle_id, "Attempted to close unknown charging session");
                false
            }
        }
    }

    pub fn is_running(&self, vehicle_id: &str) -> bool {
        self.sessions
            .get(vehicle_id)
            .map_or(false, |s| !s.handle.is_closed())
    }

    /// Vehicle ids with a registered session
    pub fn vehicle_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|r| r.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
