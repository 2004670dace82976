//! Vehicle repository interface

use async_trait::async_trait;

use super::model::{NewVehicle, Vehicle};
use crate::support::errors::DomainResult;

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// All vehicles, in creation order
    async fn list(&self) -> DomainResult<Vec<Vehicle>>;

    /// Find vehicle by ID
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Vehicle>>;

    /// Find vehicle by human-readable slug (`nickname-abc123`).
    /// Malformed slugs resolve to `None`.
    async fn find_by_slug(&self, slug: &str) -> DomainResult<Option<Vehicle>>;

    /// Vehicles whose nickname contains `query` (case-insensitive),
    /// optionally restricted to one model
    async fn search(&self, query: &str, model: Option<&str>) -> DomainResult<Vec<Vehicle>>;

    /// Register a vehicle at the initial charge level, returning its ID
    async fn create(&self, vehicle: NewVehicle) -> DomainResult<String>;
}
