//! Temperature driven selection of the steady drive configuration
//!
//! Sustained vibration heats the actuator. Above the upper bound the steady
//! drive is derated to a fixed voltage floor at a lowered frequency; it only
//! returns to nominal once the sample falls below the lower bound. Between
//! the bounds the previous selection holds.

use std::fmt;

use tracing::info;

use crate::drive::config::STEADY_VOLTAGE_FLOOR;
use crate::drive::DriveConfig;

/// Derate above this temperature, milli-degrees Celsius
pub const TEMP_UPPER_BOUND: i64 = 10_000;
/// Return to nominal below this temperature, milli-degrees Celsius
pub const TEMP_LOWER_BOUND: i64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermalState {
    Nominal,
    Derated,
}

impl fmt::Display for ThermalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ThermalState::Nominal => "nominal",
            ThermalState::Derated => "derated",
        })
    }
}

/// Hysteresis between the nominal and derated steady configurations
#[derive(Debug, Clone)]
pub struct ThermalCompensator {
    upper_bound: i64,
    lower_bound: i64,
    state: ThermalState,
    nominal: DriveConfig,
    derated: DriveConfig,
}

impl ThermalCompensator {
    /// `nominal` is the solved steady config; derating keeps its shape and
    /// drives the voltage floor at `shifted_period`. The derated clamp never
    /// exceeds the nominal one.
    pub fn new(nominal: DriveConfig, shifted_period: u32) -> Self {
        Self::with_floor(nominal, shifted_period, STEADY_VOLTAGE_FLOOR)
    }

    pub fn with_floor(nominal: DriveConfig, shifted_period: u32, floor: u32) -> Self {
        let derated = nominal.with_drive(floor.min(nominal.level(0)), shifted_period);
        Self {
            upper_bound: TEMP_UPPER_BOUND,
            lower_bound: TEMP_LOWER_BOUND,
            state: ThermalState::Nominal,
            nominal,
            derated,
        }
    }

    /// Replace the hysteresis bounds, milli-degrees Celsius
    pub fn with_bounds(mut self, lower_bound: i64, upper_bound: i64) -> Self {
        self.lower_bound = lower_bound;
        self.upper_bound = upper_bound;
        self
    }

    /// Fold in a temperature sample and return the steady config to use
    pub fn evaluate(&mut self, sample: i64) -> DriveConfig {
        let next = if sample > self.upper_bound {
            ThermalState::Derated
        } else if sample < self.lower_bound {
            ThermalState::Nominal
        } else {
            self.state
        };
        if next != self.state {
            info!("Steady drive {} at {} m°C", next, sample);
            self.state = next;
        }
        self.current()
    }

    /// Config for the current state without sampling
    pub fn current(&self) -> DriveConfig {
        match self.state {
            ThermalState::Nominal => self.nominal.clone(),
            ThermalState::Derated => self.derated.clone(),
        }
    }

    pub fn state(&self) -> ThermalState {
        self.state
    }

    pub fn bounds(&self) -> (i64, i64) {
        (self.lower_bound, self.upper_bound)
    }
}
