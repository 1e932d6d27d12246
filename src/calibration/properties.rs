//! Per-product tuning properties
//!
//! A TOML file with the board-level settings that are not measured per
//! unit. Every key is optional.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::drive::WaveShape;
use crate::error::{VibratorError, VibratorResult};

pub const DEFAULT_FREQUENCY_SHIFT: u32 = 10;
/// 2.15 V
pub const DEFAULT_VOLTAGE_MAX: u32 = 107;
pub const DEFAULT_CLICK_DURATION_MS: u32 = 6;
pub const DEFAULT_TICK_DURATION_MS: u32 = 2;
pub const DEFAULT_DOUBLE_CLICK_DURATION_MS: u32 = 135;
pub const DEFAULT_HEAVY_CLICK_DURATION_MS: u32 = 8;
/// Arm the click waveform for low-power trigger unless told otherwise
pub const DEFAULT_LP_TRIGGER_EFFECT: u32 = 1;

/// Board tuning properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VibratorProperties {
    /// Steady vibrations longer than this (ms) run closed loop
    pub closeloop_threshold: u32,
    /// Solve drive levels from calibration instead of static settings
    #[serde(alias = "config_dynamic")]
    pub dynamic_config: bool,
    /// Frequency shift (Hz) for derated steady vibration
    pub long_frequency_shift: u32,
    /// Voltage ceiling for effects
    pub short_voltage: u32,
    /// Voltage ceiling for steady vibration
    pub long_voltage: u32,
    pub click_duration: u32,
    pub tick_duration: u32,
    pub double_click_duration: u32,
    pub heavyclick_duration: u32,
    pub effect_shape: Option<WaveShape>,
    pub steady_shape: Option<WaveShape>,
    /// Waveform index armed for low-power trigger, 0 disables
    pub lptrigger_effect: u32,
}

impl Default for VibratorProperties {
    fn default() -> Self {
        Self {
            closeloop_threshold: u32::MAX,
            dynamic_config: false,
            long_frequency_shift: DEFAULT_FREQUENCY_SHIFT,
            short_voltage: DEFAULT_VOLTAGE_MAX,
            long_voltage: DEFAULT_VOLTAGE_MAX,
            click_duration: DEFAULT_CLICK_DURATION_MS,
            tick_duration: DEFAULT_TICK_DURATION_MS,
            double_click_duration: DEFAULT_DOUBLE_CLICK_DURATION_MS,
            heavyclick_duration: DEFAULT_HEAVY_CLICK_DURATION_MS,
            effect_shape: None,
            steady_shape: None,
            lptrigger_effect: DEFAULT_LP_TRIGGER_EFFECT,
        }
    }
}

impl VibratorProperties {
    pub fn from_toml(contents: &str) -> VibratorResult<Self> {
        toml::from_str(contents)
            .map_err(|e| VibratorError::ConfigurationMissing(format!("invalid properties: {}", e)))
    }

    /// Read properties, falling back to defaults on any failure
    pub fn load(path: &Path) -> Self {
        let parsed = fs::read_to_string(path)
            .map_err(|e| VibratorError::ConfigurationMissing(format!("{}: {}", path.display(), e)))
            .and_then(|contents| Self::from_toml(&contents));
        match parsed {
            Ok(properties) => properties,
            Err(e) => {
                warn!("{}, using default properties", e);
                Self::default()
            }
        }
    }
}

impl fmt::Display for VibratorProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = |shape: Option<WaveShape>| match shape {
            Some(shape) => shape.to_string(),
            None => "default".to_string(),
        };
        writeln!(f, "  closeloop_threshold: {}", self.closeloop_threshold)?;
        writeln!(f, "  dynamic_config: {}", self.dynamic_config)?;
        writeln!(f, "  long_frequency_shift: {}", self.long_frequency_shift)?;
        writeln!(f, "  short_voltage: {}", self.short_voltage)?;
        writeln!(f, "  long_voltage: {}", self.long_voltage)?;
        writeln!(f, "  click_duration: {}", self.click_duration)?;
        writeln!(f, "  tick_duration: {}", self.tick_duration)?;
        writeln!(f, "  double_click_duration: {}", self.double_click_duration)?;
        writeln!(f, "  heavyclick_duration: {}", self.heavyclick_duration)?;
        writeln!(f, "  effect_shape: {}", shape(self.effect_shape))?;
        writeln!(f, "  steady_shape: {}", shape(self.steady_shape))?;
        writeln!(f, "  lptrigger_effect: {}", self.lptrigger_effect)
    }
}
