//! Per-unit calibration and board configuration
//!
//! Calibration comes from two places: a persisted `key: value` file written
//! at the factory for each unit, and a TOML property file shared by every
//! unit of a product. Both are read once, when the vibrator is built, and
//! never fail: anything missing or unreadable falls back to a documented
//! default.

use std::env;
use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};

pub mod persist;
pub mod properties;

pub use persist::PersistData;
pub use properties::VibratorProperties;

use crate::drive::WaveShape;

pub const AUTOCAL_CONFIG: &str = "autocal";
pub const LRA_PERIOD_CONFIG: &str = "lra_period";
pub const EFFECT_COEFFS_CONFIG: &str = "effect_coeffs";
pub const STEADY_AMP_MAX_CONFIG: &str = "steady_amp_max";
pub const VOLTAGES_CONFIG: &str = "v_levels";
pub const F0_CONFIG: &str = "f0_measured";
pub const REDC_CONFIG: &str = "redc_measured";
pub const Q_CONFIG: &str = "q_measured";
pub const Q_INDEX_CONFIG: &str = "q_index";

pub const DEFAULT_LRA_PERIOD: u32 = 262;
/// Amplitudes in percent of full scale: one per voltage slot, then the
/// global level applied to steady and external playback
pub const V_LEVELS_DEFAULT: [u32; 6] = [60, 70, 80, 90, 100, 76];
/// Position of the global level in `v_levels`
pub const GLOBAL_SCALE_LEVEL: usize = 5;

/// Q values are 16.16 fixed point
const Q_FLOAT_TO_FIXED: u32 = 1 << 16;
/// Each `q_index` step is 1.5
const Q_INDEX_TO_FIXED: u32 = Q_FLOAT_TO_FIXED * 3 / 2;
/// `q_index` 0 means Q = 2.0
const Q_INDEX_OFFSET: u32 = 2 * Q_FLOAT_TO_FIXED;
/// Q = 15.5
pub const Q_DEFAULT: u32 = Q_FLOAT_TO_FIXED * 31 / 2;

/// Environment variable naming the calibration file
pub const CALIBRATION_FILEPATH_ENV: &str = "CALIBRATION_FILEPATH";
/// Environment variable naming the properties file
pub const PROPERTIES_FILEPATH_ENV: &str = "VIBRATOR_PROPERTIES";

/// Nominal playback length of the simple effects, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectDurations {
    pub click: u32,
    pub tick: u32,
    pub double_click: u32,
    pub heavy_click: u32,
}

impl Default for EffectDurations {
    fn default() -> Self {
        Self {
            click: properties::DEFAULT_CLICK_DURATION_MS,
            tick: properties::DEFAULT_TICK_DURATION_MS,
            double_click: properties::DEFAULT_DOUBLE_CLICK_DURATION_MS,
            heavy_click: properties::DEFAULT_HEAVY_CLICK_DURATION_MS,
        }
    }
}

/// Everything the drive core knows about one actuator
#[derive(Debug, Clone)]
pub struct CalibrationRecord {
    /// Factory calibration triple, passed to the driver untouched
    pub autocal: Option<String>,
    /// Resonant period in driver clock ticks
    pub lra_period: u32,
    /// Acceleration (g) as a cubic in drive level (V), `[a, b, c, d]`
    pub effect_coeffs: Option<[f32; 4]>,
    /// Acceleration (g) reached at the rated steady voltage
    pub steady_amp_max: Option<f32>,
    pub short_voltage_max: u32,
    pub long_voltage_max: u32,
    pub long_frequency_shift: u32,
    pub close_loop_threshold: u32,
    pub dynamic_config: bool,
    pub effect_shape: Option<WaveShape>,
    pub steady_shape: Option<WaveShape>,
    pub lp_trigger_effect: u32,
    pub durations: EffectDurations,
    /// Measured resonant frequency, driver fixed point
    pub f0: Option<u32>,
    /// Measured DC resistance, driver fixed point
    pub redc: Option<u32>,
    /// Quality factor, 16.16 fixed point
    pub q: u32,
    /// Effect amplitudes (percent) used without dynamic config, then the
    /// global level
    pub volume_levels: [u32; 6],
    persist: PersistData,
    properties: VibratorProperties,
}

impl Default for CalibrationRecord {
    fn default() -> Self {
        Self::from_sources(PersistData::default(), VibratorProperties::default())
    }
}

impl CalibrationRecord {
    /// Resolve a record from parsed sources
    pub fn from_sources(persist: PersistData, properties: VibratorProperties) -> Self {
        let lra_period = match persist.get::<u32>(LRA_PERIOD_CONFIG) {
            Some(period) if period > 0 => period,
            Some(_) => {
                warn!("Invalid {} config: zero period", LRA_PERIOD_CONFIG);
                DEFAULT_LRA_PERIOD
            }
            None => DEFAULT_LRA_PERIOD,
        };
        let steady_amp_max = persist
            .get::<f32>(STEADY_AMP_MAX_CONFIG)
            .filter(|amp| amp.is_finite() && *amp > 0.0);
        let effect_coeffs = persist
            .get_array::<f32, 4>(EFFECT_COEFFS_CONFIG)
            .filter(|coeffs| coeffs.iter().all(|c| c.is_finite()));

        Self {
            autocal: persist.get_string(AUTOCAL_CONFIG),
            lra_period,
            effect_coeffs,
            steady_amp_max,
            short_voltage_max: properties.short_voltage,
            long_voltage_max: properties.long_voltage,
            long_frequency_shift: properties.long_frequency_shift,
            close_loop_threshold: properties.closeloop_threshold,
            dynamic_config: properties.dynamic_config,
            effect_shape: properties.effect_shape,
            steady_shape: properties.steady_shape,
            lp_trigger_effect: properties.lptrigger_effect,
            durations: EffectDurations {
                click: properties.click_duration,
                tick: properties.tick_duration,
                double_click: properties.double_click_duration,
                heavy_click: properties.heavyclick_duration,
            },
            f0: persist.get::<u32>(F0_CONFIG),
            redc: persist.get::<u32>(REDC_CONFIG),
            q: quality_factor(&persist),
            volume_levels: persist
                .get_array::<u32, 6>(VOLTAGES_CONFIG)
                .unwrap_or(V_LEVELS_DEFAULT),
            persist,
            properties,
        }
    }

    pub fn properties(&self) -> &VibratorProperties {
        &self.properties
    }

    /// Dump properties and the raw calibration file
    pub fn debug(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "Properties:")?;
        write!(out, "{}", self.properties)?;
        writeln!(out)?;
        writeln!(out, "Persist:")?;
        match self.persist.path() {
            Some(path) => writeln!(out, "  {}:", path.display())?,
            None => writeln!(out, "  (none)")?,
        }
        for line in self.persist.lines() {
            writeln!(out, "    {}", line)?;
        }
        Ok(())
    }
}

/// Measured Q, else converted from the factory index, else the default
fn quality_factor(persist: &PersistData) -> u32 {
    if let Some(q) = persist.get::<u32>(Q_CONFIG) {
        return q;
    }
    persist
        .get::<u32>(Q_INDEX_CONFIG)
        .and_then(|index| index.checked_mul(Q_INDEX_TO_FIXED))
        .and_then(|q| q.checked_add(Q_INDEX_OFFSET))
        .unwrap_or(Q_DEFAULT)
}

/// Locates and loads calibration sources
#[derive(Debug, Clone, Default)]
pub struct CalibrationStore {
    persist_path: Option<PathBuf>,
    properties_path: Option<PathBuf>,
}

impl CalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths from `CALIBRATION_FILEPATH` and `VIBRATOR_PROPERTIES`
    pub fn from_env() -> Self {
        let persist_path = env::var_os(CALIBRATION_FILEPATH_ENV).map(PathBuf::from);
        if persist_path.is_none() {
            warn!("Failed to get env {}", CALIBRATION_FILEPATH_ENV);
        }
        Self {
            persist_path,
            properties_path: env::var_os(PROPERTIES_FILEPATH_ENV).map(PathBuf::from),
        }
    }

    pub fn with_persist_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.persist_path = Some(path.into());
        self
    }

    pub fn with_properties_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.properties_path = Some(path.into());
        self
    }

    /// Read both sources. Never fails; missing pieces take defaults.
    pub fn load(&self) -> CalibrationRecord {
        let persist = match &self.persist_path {
            Some(path) => PersistData::open(path).unwrap_or_else(|e| {
                warn!("{}, using default calibration", e);
                PersistData::default()
            }),
            None => PersistData::default(),
        };
        let properties = match &self.properties_path {
            Some(path) => VibratorProperties::load(path),
            None => VibratorProperties::default(),
        };

        let record = CalibrationRecord::from_sources(persist, properties);
        info!(
            "Calibration loaded: lra_period={} dynamic={} coeffs={}",
            record.lra_period,
            record.dynamic_config,
            record.effect_coeffs.is_some()
        );
        record
    }
}
