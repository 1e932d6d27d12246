//! Resolved drive configurations
//!
//! A [`DriveConfig`] is a plain value: the wave shape, the over-drive clamp
//! for every voltage slot and the open-loop period. Configurations are
//! derived from the calibration record once and replaced, never mutated.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calibration::CalibrationRecord;
use crate::effects::VoltageSlot;
use crate::hardware::RegisterValue;
use crate::solver::{self, TransferCurve};

/// Target peak acceleration (g) of each effect voltage slot
pub const EFFECT_TARGET_G: [f64; VoltageSlot::COUNT] = [0.15, 0.15, 0.27, 0.43, 0.57];
/// Target peak acceleration (g) of steady vibration
pub const STEADY_TARGET_G: f64 = 1.2;
/// Lowest clamp steady vibration is driven with, 1.8 V peak
pub const STEADY_VOLTAGE_FLOOR: u32 = 90;
/// Largest clamp code accepted for the strongest effect slot
pub const EFFECT_CLAMP_LIMIT: u32 = 161;

/// Open-loop drive waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveShape {
    Square = 0,
    Sine = 1,
}

impl WaveShape {
    pub fn register(self) -> RegisterValue {
        RegisterValue::from(self as u32)
    }
}

impl fmt::Display for WaveShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WaveShape::Square => "square",
            WaveShape::Sine => "sine",
        })
    }
}

/// Drive algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopControl {
    Open,
    Close,
}

impl LoopControl {
    /// Closed loop only for real-time playback longer than `threshold_ms`
    pub fn select(rtp: bool, duration_ms: u32, threshold_ms: u32) -> Self {
        if rtp && duration_ms > threshold_ms {
            LoopControl::Close
        } else {
            LoopControl::Open
        }
    }

    /// The control register holds 1 for open loop
    pub fn register(self) -> RegisterValue {
        RegisterValue::from(self == LoopControl::Open)
    }
}

impl fmt::Display for LoopControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoopControl::Open => "open",
            LoopControl::Close => "close",
        })
    }
}

/// Drive settings applied before playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveConfig {
    pub shape: WaveShape,
    /// One clamp per effect slot, or a single steady clamp
    pub od_clamp: Vec<u32>,
    pub lra_period: u32,
}

impl DriveConfig {
    /// Clamp for a slot. Single-entry configs answer every slot.
    pub fn level(&self, index: usize) -> u32 {
        self.od_clamp
            .get(index)
            .or_else(|| self.od_clamp.last())
            .copied()
            .unwrap_or(0)
    }

    /// Solve the effect clamps from the calibrated transfer curve
    pub fn effect_config(record: &CalibrationRecord) -> Self {
        let ceiling = record.short_voltage_max;
        let mut od_clamp = match record.effect_coeffs {
            Some(coeffs) => {
                let curve = TransferCurve::from_coeffs(coeffs);
                EFFECT_TARGET_G
                    .iter()
                    .map(|target| {
                        let level = curve.level_for(*target);
                        match solver::level_to_od_clamp(level, record.lra_period) {
                            0 => {
                                warn!("No drive level reaches {}g, using ceiling", target);
                                ceiling
                            }
                            clamp => clamp,
                        }
                    })
                    .collect::<Vec<_>>()
            }
            None => {
                debug!("No effect coefficients, effects use the voltage ceiling");
                vec![ceiling; VoltageSlot::COUNT]
            }
        };

        let top = VoltageSlot::Top.index();
        if od_clamp[top] == 0 || od_clamp[top] > EFFECT_CLAMP_LIMIT {
            warn!("Strongest effect clamp {} out of range", od_clamp[top]);
            od_clamp[top] = ceiling;
        }
        for clamp in od_clamp.iter_mut() {
            *clamp = (*clamp).min(ceiling);
        }

        Self {
            shape: record.effect_shape.unwrap_or(WaveShape::Sine),
            od_clamp,
            lra_period: record.lra_period,
        }
    }

    /// Steady configuration at the nominal period, never above
    /// `long_voltage_max`
    pub fn steady_config(record: &CalibrationRecord) -> Self {
        let ceiling = record.long_voltage_max;
        let clamp = match record.steady_amp_max {
            Some(amp_max) if f64::from(amp_max) > STEADY_TARGET_G => {
                let scaled = (STEADY_TARGET_G / f64::from(amp_max) * f64::from(ceiling)).round();
                (scaled as u32).max(STEADY_VOLTAGE_FLOOR).min(ceiling)
            }
            _ => ceiling,
        };

        Self {
            shape: record.steady_shape.unwrap_or(WaveShape::Square),
            od_clamp: vec![clamp],
            lra_period: record.lra_period,
        }
    }

    /// Same shape at `od_clamp` and `lra_period`
    pub fn with_drive(&self, od_clamp: u32, lra_period: u32) -> Self {
        Self {
            shape: self.shape,
            od_clamp: vec![od_clamp],
            lra_period,
        }
    }
}

impl fmt::Display for DriveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clamps: Vec<String> = self.od_clamp.iter().map(u32::to_string).collect();
        write!(
            f,
            "shape={} od_clamp=[{}] lra_period={}",
            self.shape,
            clamps.join(" "),
            self.lra_period
        )
    }
}
