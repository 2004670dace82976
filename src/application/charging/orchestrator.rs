//! Charging orchestrator
//!
//! Runs one vehicle's charging session as a background task. The task owns
//! the session, applies user commands through the reducer, and drives the
//! time-based transitions: auto-scheduling an idle car, starting a scheduled
//! charge, lifting a suspension, ticking the battery while charging, and
//! completing the charge once its target is reached.
//!
//! Timers are re-armed from scratch on every charger state change and on
//! every schedule event, see [`TimerRegistry`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::handle::{SessionCommand, SessionHandle, UserCommand};
use super::session::{ChargingSession, SessionSnapshot};
use super::timers::{delay_elapsed, interval_tick, should_auto_schedule, SessionTimings, TimerRegistry};
use crate::domain::charging::MAXIMUM_CHARGE_PERCENT;
use crate::domain::{
    charging_states_reducer, ChargerState, ChargerStatus, ChargingAction, ChargingEventType,
};
use crate::notifications::events::{
    ChargeLevelChangedEvent, ChargerStatusChangedEvent, ChargingEventRecorded, Event,
    NotificationEvent, NotificationLevel,
};
use crate::notifications::SharedEventBus;
use crate::support::clock::Clock;
use crate::support::shutdown::ShutdownSignal;

/// Pending commands per session before senders wait
const COMMAND_BUFFER: usize = 32;

pub struct ChargingOrchestrator {
    session: ChargingSession,
    timings: SessionTimings,
    timers: TimerRegistry,
    clock: Arc<dyn Clock>,
    event_bus: SharedEventBus,
    shutdown: ShutdownSignal,
    commands: mpsc::Receiver<SessionCommand>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl ChargingOrchestrator {
    /// Build an orchestrator for `session` together with the handle that
    /// controls it. Nothing runs until [`spawn`](Self::spawn) or
    /// [`run`](Self::run) is called.
    pub fn new(
        session: ChargingSession,
        timings: SessionTimings,
        clock: Arc<dyn Clock>,
        event_bus: SharedEventBus,
        shutdown: ShutdownSignal,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
        let handle = SessionHandle::new(session.vehicle_id().to_string(), command_tx, snapshot_rx);

        let orchestrator = Self {
            session,
            timings,
            timers: TimerRegistry::new(),
            clock,
            event_bus,
            shutdown,
            commands: command_rx,
            snapshots: snapshot_tx,
        };
        (orchestrator, handle)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process commands and timers until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        info!(
            vehicle_id = %self.session.vehicle_id(),
            state_of_charge = self.session.state_of_charge(),
            "🔌 Charging session started"
        );
        self.rearm();

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified().wait() => {
                    info!(vehicle_id = %self.session.vehicle_id(), "🔌 Charging session shutting down");
                    break;
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!(vehicle_id = %self.session.vehicle_id(), "All session handles dropped");
                        break;
                    }
                },
                _ = delay_elapsed(&mut self.timers.auto_schedule) => self.on_auto_schedule_due(),
                _ = interval_tick(&mut self.timers.scheduled_start) => self.on_scheduled_start_poll(),
                _ = interval_tick(&mut self.timers.suspension_expiry) => self.on_suspension_poll(),
                _ = interval_tick(&mut self.timers.charge_tick) => self.on_charge_tick(),
            }
        }

        self.timers.cancel_all();
        info!(vehicle_id = %self.session.vehicle_id(), "🔌 Charging session stopped");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        let reply = match command {
            SessionCommand::User { command, reply } => {
                self.apply_user_command(command);
                reply
            }
            SessionCommand::Dispatch { action, reply } => {
                self.dispatch(action);
                reply
            }
        };
        // Entering a charging state at or above its target completes at once.
        self.evaluate_completion();

        // The caller may have given up waiting; the snapshot is still on the watch channel.
        let _ = reply.send(self.session.snapshot());
    }

    fn apply_user_command(&mut self, command: UserCommand) {
        let at = self.clock.now();
        match command {
            UserCommand::PlugIn => {
                if self.dispatch(ChargingAction::PlugInCar { at }) {
                    self.notify(NotificationLevel::Success, "Car plugged in");
                }
            }
            UserCommand::Unplug => {
                let was_charging = self.session.charger_state().is_charging();
                if self.dispatch(ChargingAction::UnplugCar { at }) && was_charging {
                    self.notify(NotificationLevel::Info, "Car unplugged - charging stopped");
                }
            }
            UserCommand::TriggerOverride => {
                let state = self.session.charger_state();
                if !state.is_plugged_in() || state.is_charging() {
                    self.ignore(command);
                    return;
                }
                if self.dispatch(ChargingAction::TriggerOverride { at }) {
                    self.notify(NotificationLevel::Success, "Override charging started");
                }
            }
            UserCommand::StopCharging => match self.session.charger_state().status() {
                // Stopping a scheduled charge suspends it, or it would be rescheduled right away.
                ChargerStatus::ChargingScheduled => self.suspend_schedule(at),
                ChargerStatus::ChargingOverride => {
                    if self.dispatch(ChargingAction::CancelOverrideCharge { at }) {
                        self.notify(NotificationLevel::Info, "Charging stopped");
                    }
                }
                _ => self.ignore(command),
            },
            UserCommand::CancelScheduledCharge => {
                if !self.session.charger_state().is_plugged_in() {
                    self.ignore(command);
                    return;
                }
                self.suspend_schedule(at);
            }
        }
    }

    fn suspend_schedule(&mut self, at: DateTime<Utc>) {
        if self.dispatch(ChargingAction::CancelScheduledCharge { at }) {
            self.notify(
                NotificationLevel::Warning,
                "Scheduled charging suspended until tomorrow 6 AM",
            );
        }
    }

    fn ignore(&self, command: UserCommand) {
        debug!(
            vehicle_id = %self.session.vehicle_id(),
            ?command,
            status = %self.session.charger_state().status(),
            "Command not available in current state"
        );
    }

    fn on_auto_schedule_due(&mut self) {
        let state_of_charge = self.session.state_of_charge();
        if !should_auto_schedule(self.session.charger_state(), state_of_charge) {
            debug!(vehicle_id = %self.session.vehicle_id(), "Auto-schedule no longer applies");
            return;
        }

        let action = ChargingAction::ScheduleCharge {
            at: self.clock.now(),
            car_state: self.session.simulator.car().clone(),
        };
        if !self.dispatch(action) {
            return;
        }
        if let ChargerState::AwaitingScheduledCharge { charge } = self.session.charger_state() {
            let message = format!("Charging scheduled for {}", charge.start_time.format("%H:%M"));
            self.notify(NotificationLevel::Info, message);
        }
    }

    fn on_scheduled_start_poll(&mut self) {
        let now = self.clock.now();
        let due = matches!(
            self.session.charger_state(),
            ChargerState::AwaitingScheduledCharge { charge } if now >= charge.start_time
        );
        if !due {
            return;
        }

        if self.dispatch(ChargingAction::StartScheduledCharge { at: now }) {
            self.notify(NotificationLevel::Success, "Scheduled charging started");
            self.evaluate_completion();
        }
    }

    fn on_suspension_poll(&mut self) {
        let now = self.clock.now();
        let expired = matches!(
            self.session.charger_state(),
            ChargerState::ScheduleSuspended { suspended_until } if now >= *suspended_until
        );
        if !expired {
            return;
        }

        if self.dispatch(ChargingAction::ResumeFromSuspension { at: now }) {
            self.notify(
                NotificationLevel::Info,
                "Schedule suspension expired - charging can be scheduled again",
            );
        }
    }

    fn on_charge_tick(&mut self) {
        if !self.session.charger_state().is_charging() {
            return;
        }

        let before = self.session.state_of_charge();
        let state_of_charge = self.session.simulator.tick();
        if state_of_charge != before {
            self.event_bus
                .publish(Event::ChargeLevelChanged(ChargeLevelChangedEvent {
                    vehicle_id: self.session.vehicle_id().to_string(),
                    state_of_charge,
                    timestamp: self.clock.now(),
                }));
            self.publish_snapshot();
        }
        self.evaluate_completion();
    }

    /// Stop charging once the battery is full or a scheduled charge hits its target
    fn evaluate_completion(&mut self) {
        let state_of_charge = self.session.state_of_charge();
        let message = match self.session.charger_state() {
            state if !state.is_charging() => return,
            _ if state_of_charge >= MAXIMUM_CHARGE_PERCENT => {
                "Charging complete - 100% charged!".to_string()
            }
            ChargerState::ChargingScheduled { charge }
                if state_of_charge >= charge.target_charge_percent =>
            {
                format!("Target charge of {}% reached!", charge.target_charge_percent)
            }
            _ => return,
        };

        let action = ChargingAction::CompleteCharge {
            at: self.clock.now(),
            state_of_charge,
        };
        if self.dispatch(action) {
            info!(
                vehicle_id = %self.session.vehicle_id(),
                state_of_charge,
                "⚡ Charging complete"
            );
            self.notify(NotificationLevel::Success, message);
        }
    }

    /// Reduce `action` into the session. Returns whether anything changed.
    fn dispatch(&mut self, action: ChargingAction) -> bool {
        let next = charging_states_reducer(&self.session.charging, &action);
        if next.recorded_events() == self.session.charging.recorded_events() {
            debug!(
                vehicle_id = %self.session.vehicle_id(),
                action = action.name(),
                status = %self.session.charger_state().status(),
                "Action does not apply in current state"
            );
            return false;
        }

        let previous = std::mem::replace(&mut self.session.charging, next);
        let vehicle_id = self.session.vehicle_id().to_string();

        // A schedule event restarts its timers even when the state is unchanged.
        let mut rearm = false;
        if let Some(event) = self.session.charging.event_history.latest() {
            rearm = event.event_type == ChargingEventType::Schedule;
            self.event_bus
                .publish(Event::ChargingEventRecorded(ChargingEventRecorded {
                    vehicle_id: vehicle_id.clone(),
                    event: event.clone(),
                }));
        }

        if previous.charger_state != self.session.charging.charger_state {
            rearm = true;
            let old_status = previous.charger_state.status();
            let new_status = self.session.charger_state().status();
            info!(
                vehicle_id = %vehicle_id,
                action = action.name(),
                from = %old_status,
                to = %new_status,
                "Charger state changed"
            );
            if old_status != new_status {
                self.event_bus
                    .publish(Event::ChargerStatusChanged(ChargerStatusChangedEvent {
                        vehicle_id,
                        old_status,
                        new_status,
                        timestamp: self.clock.now(),
                    }));
            }
        }
        if rearm {
            self.rearm();
        }

        self.publish_snapshot();
        true
    }

    fn rearm(&mut self) {
        self.timers.cancel_all();
        self.timers.arm_for(
            self.session.charger_state(),
            self.session.state_of_charge(),
            &self.timings,
        );
        debug!(
            vehicle_id = %self.session.vehicle_id(),
            armed = ?self.timers.armed(),
            "Session timers re-armed"
        );
    }

    fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.event_bus.publish(Event::Notification(NotificationEvent {
            vehicle_id: self.session.vehicle_id().to_string(),
            level,
            message: message.into(),
            timestamp: self.clock.now(),
        }));
    }

    fn publish_snapshot(&self) {
        self.snapshots.send_replace(self.session.snapshot());
    }
}

/// Spawn an orchestrator for `session` and return its handle and task
pub fn spawn_session(
    session: ChargingSession,
    timings: SessionTimings,
    clock: Arc<dyn Clock>,
    event_bus: SharedEventBus,
    shutdown: ShutdownSignal,
) -> (SessionHandle, JoinHandle<()>) {
    let (orchestrator, handle) = ChargingOrchestrator::new(session, timings, clock, event_bus, shutdown);
    (handle, orchestrator.spawn())
}
