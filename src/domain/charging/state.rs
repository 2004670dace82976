//! Charger state: which charging session, if any, is in effect for a vehicle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Automatically planned charge window targeting a fixed percentage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledCharge {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub target_charge_percent: f64,
}

/// User-forced charge window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideCharge {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Charger state, exactly one variant at a time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ChargerState {
    /// No charger session possible
    Unplugged,
    /// Plugged in, not charging, nothing pending
    Idle,
    /// A future charge window is planned
    AwaitingScheduledCharge { charge: ScheduledCharge },
    /// The scheduled window is active
    ChargingScheduled { charge: ScheduledCharge },
    /// The user forced a charge
    ChargingOverride { charge: OverrideCharge },
    /// Automatic scheduling is paused until `suspended_until`
    ScheduleSuspended { suspended_until: DateTime<Utc> },
}

impl ChargerState {
    pub fn status(&self) -> ChargerStatus {
        match self {
            Self::Unplugged => ChargerStatus::Unplugged,
            Self::Idle => ChargerStatus::Idle,
            Self::AwaitingScheduledCharge { .. } => ChargerStatus::AwaitingScheduledCharge,
            Self::ChargingScheduled { .. } => ChargerStatus::ChargingScheduled,
            Self::ChargingOverride { .. } => ChargerStatus::ChargingOverride,
            Self::ScheduleSuspended { .. } => ChargerStatus::ScheduleSuspended,
        }
    }

    /// Whether the battery is being charged in this state
    pub fn is_charging(&self) -> bool {
        self.status().is_charging()
    }

    pub fn is_plugged_in(&self) -> bool {
        !matches!(self, Self::Unplugged)
    }
}

impl Default for ChargerState {
    fn default() -> Self {
        Self::Unplugged
    }
}

/// Discriminant of [`ChargerState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChargerStatus {
    Unplugged,
    Idle,
    AwaitingScheduledCharge,
    ChargingScheduled,
    ChargingOverride,
    ScheduleSuspended,
}

impl ChargerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unplugged => "unplugged",
            Self::Idle => "idle",
            Self::AwaitingScheduledCharge => "awaiting-scheduled-charge",
            Self::ChargingScheduled => "charging-scheduled",
            Self::ChargingOverride => "charging-override",
            Self::ScheduleSuspended => "schedule-suspended",
        }
    }

    pub fn is_charging(&self) -> bool {
        matches!(self, Self::ChargingScheduled | Self::ChargingOverride)
    }
}

impl fmt::Display for ChargerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
