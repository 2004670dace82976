//! Charging aggregate
//!
//! Charger state, the actions driving it, the audit events it emits, and
//! the reducer tying them together.

pub mod action;
pub mod event;
pub mod reducer;
pub mod state;

pub use action::ChargingAction;
pub use event::{
    ChargingEvent, ChargingEventType, EventDetails, EventHistory, DEFAULT_EVENT_HISTORY_CAP,
};
pub use reducer::{
    charging_states_reducer, estimate_charge_duration_seconds, next_resume_time,
    ChargingStateWithEvents, CHARGE_RATE_PER_SECOND, MAXIMUM_CHARGE_PERCENT,
    OPTIMAL_CHARGE_PERCENT, OVERRIDE_DURATION_MINUTES, RESUME_HOUR, SCHEDULE_LEAD_SECONDS,
};
pub use state::{ChargerState, ChargerStatus, OverrideCharge, ScheduledCharge};
