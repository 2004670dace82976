//! Session timers
//!
//! Every timer a charging session can run lives in one [`TimerRegistry`].
//! Whenever the charger state changes the orchestrator cancels all of them
//! and arms only the ones the new state needs, so a timer armed for an
//! earlier state can never fire into a later one.

use std::pin::Pin;
use std::time::Duration;

use tokio::time::{interval_at, sleep, Instant, Interval, MissedTickBehavior, Sleep};

use crate::config::ChargingConfig;
use crate::domain::charging::OPTIMAL_CHARGE_PERCENT;
use crate::domain::ChargerState;

/// Durations driving the session timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    pub auto_schedule_delay: Duration,
    pub scheduled_start_poll: Duration,
    pub suspension_poll: Duration,
    pub tick_interval: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self::from(&ChargingConfig::default())
    }
}

impl From<&ChargingConfig> for SessionTimings {
    fn from(config: &ChargingConfig) -> Self {
        Self {
            auto_schedule_delay: config.auto_schedule_delay(),
            scheduled_start_poll: config.scheduled_start_poll(),
            suspension_poll: config.suspension_poll(),
            tick_interval: config.tick_interval(),
        }
    }
}

/// Whether a plugged-in idle car below the optimal charge should get a
/// schedule. Checked when the delay is armed and again when it fires.
pub fn should_auto_schedule(state: &ChargerState, state_of_charge: f64) -> bool {
    matches!(state, ChargerState::Idle) && state_of_charge < OPTIMAL_CHARGE_PERCENT
}

/// Which timers are currently armed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArmedTimers {
    pub auto_schedule: bool,
    pub scheduled_start: bool,
    pub suspension_expiry: bool,
    pub charge_tick: bool,
}

#[derive(Debug, Default)]
pub struct TimerRegistry {
    pub(crate) auto_schedule: Option<Pin<Box<Sleep>>>,
    pub(crate) scheduled_start: Option<Interval>,
    pub(crate) suspension_expiry: Option<Interval>,
    pub(crate) charge_tick: Option<Interval>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel_all(&mut self) {
        self.auto_schedule = None;
        self.scheduled_start = None;
        self.suspension_expiry = None;
        self.charge_tick = None;
    }

    /// Arm the timers `state` needs. Callers cancel first.
    pub fn arm_for(&mut self, state: &ChargerState, state_of_charge: f64, timings: &SessionTimings) {
        match state {
            ChargerState::Idle => {
                if should_auto_schedule(state, state_of_charge) {
                    self.auto_schedule = Some(Box::pin(sleep(timings.auto_schedule_delay)));
                }
            }
            ChargerState::AwaitingScheduledCharge { .. } => {
                self.scheduled_start = Some(periodic(timings.scheduled_start_poll));
            }
            ChargerState::ScheduleSuspended { .. } => {
                self.suspension_expiry = Some(periodic(timings.suspension_poll));
            }
            ChargerState::ChargingScheduled { .. } | ChargerState::ChargingOverride { .. } => {
                self.charge_tick = Some(periodic(timings.tick_interval));
            }
            ChargerState::Unplugged => {}
        }
    }

    pub fn armed(&self) -> ArmedTimers {
        ArmedTimers {
            auto_schedule: self.auto_schedule.is_some(),
            scheduled_start: self.scheduled_start.is_some(),
            suspension_expiry: self.suspension_expiry.is_some(),
            charge_tick: self.charge_tick.is_some(),
        }
    }
}

/// Interval whose first tick is one full period away
fn periodic(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Resolves once the delay in `slot` elapses, then disarms it.
/// Never resolves while the slot is empty.
pub(crate) async fn delay_elapsed(slot: &mut Option<Pin<Box<Sleep>>>) {
    match slot {
        Some(delay) => {
            delay.as_mut().await;
            *slot = None;
        }
        None => std::future::pending().await,
    }
}

/// Next tick of the interval in `slot`; pending forever while empty
pub(crate) async fn interval_tick(slot: &mut Option<Interval>) {
    match slot {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
