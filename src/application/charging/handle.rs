//! Handle to a running charging session
//!
//! The orchestrator task owns the session; callers talk to it through a
//! command channel and read its latest snapshot from a watch channel.

use tokio::sync::{mpsc, oneshot, watch};
use tracing::warn;

use super::session::SessionSnapshot;
use crate::domain::{ChargingAction, DomainError, DomainResult};

/// User-facing controls of a charging session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    PlugIn,
    Unplug,
    TriggerOverride,
    /// Stop whatever charge is running
    StopCharging,
    /// Suspend scheduled charging until the next morning
    CancelScheduledCharge,
}

#[derive(Debug)]
pub(crate) enum SessionCommand {
    User {
        command: UserCommand,
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Raw action, applied as-is with no follow-up notification
    Dispatch {
        action: ChargingAction,
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

#[derive(Debug, Clone)]
pub struct SessionHandle {
    vehicle_id: String,
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub(crate) fn new(
        vehicle_id: String,
        commands: mpsc::Sender<SessionCommand>,
        snapshots: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self {
            vehicle_id,
            commands,
            snapshots,
        }
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    pub async fn plug_in(&self) -> DomainResult<SessionSnapshot> {
        self.send(UserCommand::PlugIn).await
    }

    pub async fn unplug(&self) -> DomainResult<SessionSnapshot> {
        self.send(UserCommand::Unplug).await
    }

    pub async fn trigger_override(&self) -> DomainResult<SessionSnapshot> {
        self.send(UserCommand::TriggerOverride).await
    }

    pub async fn stop_charging(&self) -> DomainResult<SessionSnapshot> {
        self.send(UserCommand::StopCharging).await
    }

    pub async fn cancel_scheduled_charge(&self) -> DomainResult<SessionSnapshot> {
        self.send(UserCommand::CancelScheduledCharge).await
    }

    /// Run a user command and wait for the resulting snapshot
    pub async fn send(&self, command: UserCommand) -> DomainResult<SessionSnapshot> {
        self.request(|reply| SessionCommand::User { command, reply })
            .await
    }

    /// Apply a raw action to the session
    pub async fn dispatch(&self, action: ChargingAction) -> DomainResult<SessionSnapshot> {
        self.request(|reply| SessionCommand::Dispatch { action, reply })
            .await
    }

    /// Apply an action given as JSON. A payload that does not parse leaves
    /// the session untouched and returns its current snapshot.
    pub async fn dispatch_json(&self, payload: &str) -> DomainResult<SessionSnapshot> {
        match ChargingAction::from_json(payload) {
            Ok(action) => self.dispatch(action).await,
            Err(e) => {
                warn!(vehicle_id = %self.vehicle_id, error = %e, "Ignoring malformed charging action");
                self.ensure_open()?;
                Ok(self.snapshot())
            }
        }
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every published snapshot
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    fn ensure_open(&self) -> DomainResult<()> {
        if self.is_closed() {
            return Err(DomainError::SessionClosed(self.vehicle_id.clone()));
        }
        Ok(())
    }

    async fn request(
        &self,
        build: impl FnOnce(oneshot::Sender<SessionSnapshot>) -> SessionCommand,
    ) -> DomainResult<SessionSnapshot> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| DomainError::SessionClosed(self.vehicle_id.clone()))?;
        response
            .await
            .map_err(|_| DomainError::SessionClosed(self.vehicle_id.clone()))
    }
}
