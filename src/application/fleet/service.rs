//! Fleet service
//!
//! Resolves vehicles from the store and runs one charging session per
//! vehicle on demand.

use std::sync::Arc;

use tracing::{debug, info};

use super::registry::{SessionRegistry, SharedSessionRegistry};
use crate::application::charging::{spawn_session, ChargingSession, SessionHandle, SessionTimings};
use crate::config::ChargingConfig;
use crate::domain::{DomainError, DomainResult, NewVehicle, Vehicle, VehicleRepository};
use crate::notifications::{EventSubscriber, SharedEventBus};
use crate::support::clock::{Clock, TokioClock};
use crate::support::shutdown::ShutdownSignal;

pub struct FleetService {
    vehicles: Arc<dyn VehicleRepository>,
    sessions: SharedSessionRegistry,
    config: ChargingConfig,
    clock: Arc<dyn Clock>,
    event_bus: SharedEventBus,
    shutdown: ShutdownSignal,
}

impl FleetService {
    pub fn new(
        vehicles: Arc<dyn VehicleRepository>,
        event_bus: SharedEventBus,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            vehicles,
            sessions: SessionRegistry::shared(),
            config: ChargingConfig::default(),
            clock: Arc::new(TokioClock::system()),
            event_bus,
            shutdown,
        }
    }

    pub fn with_config(mut self, config: ChargingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn sessions(&self) -> &SharedSessionRegistry {
        &self.sessions
    }

    pub async fn register_vehicle(&self, vehicle: NewVehicle) -> DomainResult<Vehicle> {
        let id = self.vehicles.create(vehicle).await?;
        self.vehicles
            .find_by_id(&id)
            .await?
            .ok_or_else(|| DomainError::vehicle_not_found("id", id))
    }

    pub async fn list_vehicles(&self) -> DomainResult<Vec<Vehicle>> {
        self.vehicles.list().await
    }

    /// Look a vehicle up by id, falling back to its slug
    pub async fn find_vehicle(&self, key: &str) -> DomainResult<Vehicle> {
        if let Some(vehicle) = self.vehicles.find_by_id(key).await? {
            return Ok(vehicle);
        }
        self.vehicles
            .find_by_slug(key)
            .await?
            .ok_or_else(|| DomainError::vehicle_not_found("slug", key))
    }

    /// Handle to the vehicle's charging session, starting it if needed.
    /// `key` is a vehicle id or slug.
    pub async fn open_session(&self, key: &str) -> DomainResult<SessionHandle> {
        let vehicle = self.find_vehicle(key).await?;
        debug!(vehicle_id = %vehicle.id, slug = %vehicle.slug(), "Opening charging session");

        let handle = self.sessions.get_or_spawn(&vehicle.id, || {
            let session = ChargingSession::new(
                vehicle.id.clone(),
                vehicle.car_state(),
                self.config.history_cap(),
            );
            spawn_session(
                session,
                SessionTimings::from(&self.config),
                self.clock.clone(),
                self.event_bus.clone(),
                self.shutdown.clone(),
            )
        });
        Ok(handle)
    }

    /// Event feed narrowed to one vehicle. `key` is a vehicle id or slug.
    pub async fn watch_vehicle(&self, key: &str) -> DomainResult<EventSubscriber> {
        let vehicle = self.find_vehicle(key).await?;
        Ok(self.event_bus.subscribe_vehicle(vehicle.id))
    }

    /// Stop the vehicle's session. Returns whether one was running.
    pub fn close_session(&self, vehicle_id: &str) -> bool {
        self.sessions.remove(vehicle_id)
    }

    /// Stop every session
    pub fn shutdown(&self) {
        info!(vehicles = ?self.sessions.vehicle_ids(), "Stopping all charging sessions");
        self.shutdown.trigger();
    }
}
