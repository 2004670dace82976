//! In-memory vehicle store

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info};
use validator::Validate;

use crate::domain::vehicle::{resolve_slug, INITIAL_STATE_OF_CHARGE};
use crate::domain::{DomainResult, NewVehicle, Vehicle, VehicleRepository};

struct StoredVehicle {
    sequence: u64,
    vehicle: Vehicle,
}

/// In-memory vehicle store for development and testing
pub struct InMemoryVehicleStore {
    vehicles: DashMap<String, StoredVehicle>,
    sequence: AtomicU64,
}

impl InMemoryVehicleStore {
    pub fn new() -> Self {
        Self {
            vehicles: DashMap::new(),
            sequence: AtomicU64::new(1),
        }
    }

    /// Store seeded with existing records, kept in the given order
    pub fn with_vehicles(vehicles: impl IntoIterator<Item = Vehicle>) -> Self {
        let store = Self::new();
        for vehicle in vehicles {
            store.insert(vehicle);
        }
        store
    }

    fn insert(&self, vehicle: Vehicle) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.vehicles
            .insert(vehicle.id.clone(), StoredVehicle { sequence, vehicle });
    }

    fn ordered(&self) -> Vec<Vehicle> {
        let mut entries: Vec<(u64, Vehicle)> = self
            .vehicles
            .iter()
            .map(|e| (e.value().sequence, e.value().vehicle.clone()))
            .collect();
        entries.sort_by_key(|(sequence, _)| *sequence);
        entries.into_iter().map(|(_, v)| v).collect()
    }
}

impl Default for InMemoryVehicleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VehicleRepository for InMemoryVehicleStore {
    async fn list(&self) -> DomainResult<Vec<Vehicle>> {
        Ok(self.ordered())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Vehicle>> {
        Ok(self.vehicles.get(id).map(|e| e.vehicle.clone()))
    }

    async fn find_by_slug(&self, slug: &str) -> DomainResult<Option<Vehicle>> {
        let vehicles = self.ordered();
        let found = resolve_slug(&vehicles, slug).cloned();
        debug!(slug, found = found.is_some(), "Resolved vehicle slug");
        Ok(found)
    }

    async fn search(&self, query: &str, model: Option<&str>) -> DomainResult<Vec<Vehicle>> {
        let query = query.to_lowercase();
        Ok(self
            .ordered()
            .into_iter()
            .filter(|v| v.nickname.to_lowercase().contains(&query))
            .filter(|v| model.map_or(true, |m| v.model == m))
            .collect())
    }

    async fn create(&self, vehicle: NewVehicle) -> DomainResult<String> {
        vehicle.validate()?;

        let vehicle = Vehicle::register(vehicle, INITIAL_STATE_OF_CHARGE);
        let id = vehicle.id.clone();
        self.insert(vehicle);

        info!(vehicle_id = %id, "Vehicle registered");
        Ok(id)
    }
}
