//! Actions dispatched against the charging state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::vehicle::CarState;

/// Charging action.
///
/// Every action carries its dispatch time `at`, which stamps the audit event.
/// Time-dependent transitions (override window, suspension deadline, schedule
/// window) also compute from `at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargingAction {
    UnplugCar {
        at: DateTime<Utc>,
    },
    PlugInCar {
        at: DateTime<Utc>,
    },
    TriggerOverride {
        at: DateTime<Utc>,
    },
    CancelOverrideCharge {
        at: DateTime<Utc>,
    },
    CancelScheduledCharge {
        at: DateTime<Utc>,
    },
    ScheduleCharge {
        at: DateTime<Utc>,
        car_state: CarState,
    },
    StartScheduledCharge {
        at: DateTime<Utc>,
    },
    ResumeFromSuspension {
        at: DateTime<Utc>,
    },
    /// Charging reached 100% or the scheduled target
    CompleteCharge {
        at: DateTime<Utc>,
        state_of_charge: f64,
    },
    /// Any action type this version does not recognise
    #[serde(other)]
    Unknown,
}

impl ChargingAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UnplugCar { .. } => "UNPLUG_CAR",
            Self::PlugInCar { .. } => "PLUG_IN_CAR",
            Self::TriggerOverride { .. } => "TRIGGER_OVERRIDE",
            Self::CancelOverrideCharge { .. } => "CANCEL_OVERRIDE_CHARGE",
            Self::CancelScheduledCharge { .. } => "CANCEL_SCHEDULED_CHARGE",
            Self::ScheduleCharge { .. } => "SCHEDULE_CHARGE",
            Self::StartScheduledCharge { .. } => "START_SCHEDULED_CHARGE",
            Self::ResumeFromSuspension { .. } => "RESUME_FROM_SUSPENSION",
            Self::CompleteCharge { .. } => "COMPLETE_CHARGE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Parse an action from its JSON form; unrecognised types map to `Unknown`
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_json() {
        let action =
            ChargingAction::from_json(r#"{"type":"PLUG_IN_CAR","at":"2024-01-01T12:00:00Z"}"#)
                .unwrap();
        assert!(matches!(action, ChargingAction::PlugInCar { .. }));
        assert_eq!(action.name(), "PLUG_IN_CAR");
    }

    #[test]
    fn unrecognised_type_becomes_unknown() {
        let action = ChargingAction::from_json(r#"{"type":"INVALID_ACTION"}"#).unwrap();
        assert_eq!(action, ChargingAction::Unknown);
    }

    #[test]
    fn schedule_charge_carries_car_state() {
        let action = ChargingAction::from_json(
            r#"{
                "type": "SCHEDULE_CHARGE",
                "at": "2024-01-01T12:00:00Z",
                "car_state": { "model": "Mini Cooper E", "nickname": "kEVin", "state_of_charge": 21.0 }
            }"#,
        )
        .unwrap();

        match action {
            ChargingAction::ScheduleCharge { car_state, .. } => {
                assert_eq!(car_state.nickname, "kEVin");
                assert_eq!(car_state.state_of_charge, 21.0);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }
}
