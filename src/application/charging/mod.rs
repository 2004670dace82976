//! Charging sessions
//!
//! One orchestrator task per vehicle drives the charging state machine in
//! simulated real time. Callers hold a [`SessionHandle`].

pub mod handle;
pub mod orchestrator;
pub mod session;
pub mod simulator;
pub mod timers;

pub use handle::{SessionHandle, UserCommand};
pub use orchestrator::{spawn_session, ChargingOrchestrator};
pub use session::{ChargingSession, SessionSnapshot};
pub use simulator::ChargeLevelSimulator;
pub use timers::{should_auto_schedule, ArmedTimers, SessionTimings, TimerRegistry};
