pub mod charging;
pub mod fleet;

pub use charging::{
    spawn_session, ChargeLevelSimulator, ChargingOrchestrator, ChargingSession, SessionHandle,
    SessionSnapshot, SessionTimings, UserCommand,
};
pub use fleet::{FleetService, SessionRegistry, SharedSessionRegistry};
