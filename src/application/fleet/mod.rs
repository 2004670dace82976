//! Fleet-level orchestration: vehicle lookup and session lifecycle

pub mod registry;
pub mod service;

pub use registry::{SessionRegistry, SharedSessionRegistry};
pub use service::FleetService;
