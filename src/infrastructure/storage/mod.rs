//! Vehicle store implementations

mod memory;

pub use memory::InMemoryVehicleStore;
