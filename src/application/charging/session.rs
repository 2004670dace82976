//! Per-vehicle charging session state

use serde::Serialize;

use super::simulator::ChargeLevelSimulator;
use crate::domain::{CarState, ChargerState, ChargingEvent, ChargingStateWithEvents};

/// Everything one vehicle's session owns: the battery simulator and the
/// charger state with its event history
#[derive(Debug, Clone)]
pub struct ChargingSession {
    vehicle_id: String,
    pub(crate) simulator: ChargeLevelSimulator,
    pub(crate) charging: ChargingStateWithEvents,
}

impl ChargingSession {
    /// Session for an unplugged car
    pub fn new(vehicle_id: impl Into<String>, car: CarState, history_cap: Option<usize>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            simulator: ChargeLevelSimulator::new(car),
            charging: ChargingStateWithEvents::unplugged(history_cap),
        }
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    pub fn charger_state(&self) -> &ChargerState {
        &self.charging.charger_state
    }

    pub fn state_of_charge(&self) -> f64 {
        self.simulator.state_of_charge()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            vehicle_id: self.vehicle_id.clone(),
            car: self.simulator.car().clone(),
            charger_state: self.charging.charger_state.clone(),
            events: self.charging.event_history.to_vec(),
        }
    }
}

/// Point-in-time view of a session, as handed to callers and watchers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub vehicle_id: String,
    pub car: CarState,
    pub charger_state: ChargerState,
    /// Newest first
    pub events: Vec<ChargingEvent>,
}

impl SessionSnapshot {
    pub fn state_of_charge(&self) -> f64 {
        self.car.state_of_charge
    }

    pub fn latest_event(&self) -> Option<&ChargingEvent> {
        self.events.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_unplugged_with_no_history() {
        let session = ChargingSession::new("veh-1", CarState::new("Leaf", "Sparky", 42.0), Some(50));
        let snapshot = session.snapshot();

        assert_eq!(snapshot.charger_state, ChargerState::Unplugged);
        assert_eq!(snapshot.state_of_charge(), 42.0);
        assert!(snapshot.latest_event().is_none());
        assert_eq!(session.vehicle_id(), "veh-1");
    }
}
