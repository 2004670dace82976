//! # Fleet Charging
//!
//! Smart charging for an electric vehicle fleet: a pure charging state
//! machine, a battery simulator, and a per-vehicle orchestrator that drives
//! both in real time.
//!
//! ## Architecture
//!
//! - **domain**: Charger states, actions, audit events, the reducer, vehicle records
//! - **application**: Charging session orchestrator and fleet session management
//! - **infrastructure**: Vehicle storage
//! - **notifications**: Broadcast of session activity to dashboard clients
//! - **support**: Errors, clock, shutdown signal

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod notifications;
pub mod support;
pub mod telemetry;

pub use config::{default_config_path, AppConfig, CONFIG_ENV_VAR};

pub use application::{FleetService, SessionHandle, SessionSnapshot, UserCommand};
pub use domain::{charging_states_reducer, ChargerState, ChargingAction, ChargingStateWithEvents};
pub use infrastructure::InMemoryVehicleStore;
pub use notifications::{create_event_bus, Event, EventBus, SharedEventBus};
pub use support::errors::AppError;
pub use support::shutdown::ShutdownSignal;
pub use telemetry::init_tracing;
