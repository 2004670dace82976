pub mod charging;
pub mod vehicle;

// Re-export commonly used types
pub use charging::{
    charging_states_reducer, ChargerState, ChargerStatus, ChargingAction, ChargingEvent,
    ChargingEventType, ChargingStateWithEvents, EventHistory,
};
pub use vehicle::{CarState, NewVehicle, Vehicle, VehicleRepository};

// Re-export DomainError from support for convenience
pub use crate::support::errors::{DomainError, DomainResult};
