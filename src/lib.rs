//! Haptic Drive Library
//!
//! Calibration and drive control for linear resonant actuators. A request
//! ("play a click", "vibrate for 500 ms") is turned into driver register
//! writes: calibrated acceleration targets are inverted into drive voltages,
//! effects are mapped onto waveform programs, the loop algorithm is chosen
//! from the duration and steady drive is derated when the device runs hot.

pub mod calibration;
pub mod drive;
pub mod effects;
pub mod error;
pub mod hardware;
pub mod host;
pub mod solver;
pub mod thermal;

// Re-export commonly used types
pub use calibration::{CalibrationRecord, CalibrationStore, EffectDurations};
pub use drive::{DriveConfig, LoopControl, PlayMode, Vibrator, WaveShape};
pub use effects::{Effect, EffectCatalog, EffectOutcome, EffectStrength, VoltageSlot};
pub use error::{VibratorError, VibratorResult};
pub use hardware::{Channel, Cs40l25, Drv2624, HardwareIo, RegisterValue};
pub use host::SharedVibrator;
pub use thermal::{ThermalCompensator, ThermalState};

/// Environment variable holding the driver sysfs prefix
pub const HWAPI_PATH_PREFIX_ENV: &str = "HWAPI_PATH_PREFIX";
