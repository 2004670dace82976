//! Charge level simulator
//!
//! Owns one vehicle's battery level and advances it by a fixed step per tick.
//! Ticking is the only way the level changes.

use crate::domain::charging::{CHARGE_RATE_PER_SECOND, MAXIMUM_CHARGE_PERCENT};
use crate::domain::CarState;

#[derive(Debug, Clone)]
pub struct ChargeLevelSimulator {
    car: CarState,
}

impl ChargeLevelSimulator {
    pub fn new(car: CarState) -> Self {
        Self { car }
    }

    pub fn car(&self) -> &CarState {
        &self.car
    }

    pub fn state_of_charge(&self) -> f64 {
        self.car.state_of_charge
    }

    pub fn is_full(&self) -> bool {
        self.car.state_of_charge >= MAXIMUM_CHARGE_PERCENT
    }

    /// Add one step of charge, clamped at 100%. Returns the new level.
    pub fn tick(&mut self) -> f64 {
        self.car.state_of_charge =
            (self.car.state_of_charge + CHARGE_RATE_PER_SECOND).min(MAXIMUM_CHARGE_PERCENT);
        self.car.state_of_charge
    }
}
