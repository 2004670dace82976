//! Vehicle aggregate
//!
//! Contains the vehicle record, the live car state used by the simulator,
//! slug helpers, and the repository interface.

pub mod charge_level;
pub mod model;
pub mod repository;
pub mod slug;

pub use charge_level::{format_charge_percentage, ChargeBand};
pub use model::{CarState, NewVehicle, Vehicle, INITIAL_STATE_OF_CHARGE};
pub use repository::VehicleRepository;
pub use slug::{generate_slug, parse_slug, resolve_slug, slugify_nickname, SlugParts};
