//! Vehicle domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::slug::generate_slug;

/// Charge given to newly registered vehicles, in percent
pub const INITIAL_STATE_OF_CHARGE: f64 = 50.0;

/// Live state of one vehicle as seen by the charging simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarState {
    pub model: String,
    pub nickname: String,
    /// Battery level, 0–100
    pub state_of_charge: f64,
}

impl CarState {
    pub fn new(model: impl Into<String>, nickname: impl Into<String>, state_of_charge: f64) -> Self {
        Self {
            model: model.into(),
            nickname: nickname.into(),
            state_of_charge,
        }
    }
}

/// Vehicle record kept by the fleet store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub nickname: String,
    pub model: String,
    /// Battery capacity in kWh
    pub battery_capacity: f64,
    /// Battery level, 0–100
    pub state_of_charge: f64,
    pub location: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    /// Fresh record with a random 32-char hex id
    pub fn register(request: NewVehicle, state_of_charge: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().simple().to_string(),
            nickname: request.nickname,
            model: request.model,
            battery_capacity: request.battery_capacity,
            state_of_charge,
            location: None,
            last_updated: Some(now),
            created_at: now,
        }
    }

    pub fn slug(&self) -> String {
        generate_slug(&self.nickname, &self.id)
    }

    pub fn car_state(&self) -> CarState {
        CarState::new(&self.model, &self.nickname, self.state_of_charge)
    }
}

/// Request to register a vehicle
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewVehicle {
    #[validate(length(min = 1, max = 256, message = "nickname must be 1–256 characters"))]
    pub nickname: String,
    #[validate(length(min = 1, max = 256, message = "model must be 1–256 characters"))]
    pub model: String,
    #[validate(range(min = 1.0, max = 1000.0, message = "battery capacity must be 1–1000 kWh"))]
    pub battery_capacity: f64,
}

impl NewVehicle {
    pub fn new(nickname: impl Into<String>, model: impl Into<String>, battery_capacity: f64) -> Self {
        Self {
            nickname: nickname.into(),
            model: model.into(),
            battery_capacity,
        }
    }
}
