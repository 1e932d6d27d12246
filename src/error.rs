use std::io;
use thiserror::Error;

use crate::hardware::Channel;

/// Error type for vibrator operations
#[derive(Debug, Error)]
pub enum VibratorError {
    /// A calibration or property source could not be read. Callers fall back
    /// to defaults; this is only ever logged.
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// A driver node rejected a write
    #[error("Failed to write {channel}: {source}")]
    HardwareWriteFailed {
        channel: Channel,
        #[source]
        source: io::Error,
    },

    /// A driver node could not be read
    #[error("Failed to read {channel}: {source}")]
    HardwareReadFailed {
        channel: Channel,
        #[source]
        source: io::Error,
    },

    /// The request is valid but this actuator cannot honor it
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Argument outside its accepted range
    #[error("Bad value: {0}")]
    BadValue(String),

    /// Required driver nodes are absent
    #[error("Failed to construct vibrator: {0}")]
    ConstructionFailed(String),
}

impl VibratorError {
    pub(crate) fn write(channel: Channel, source: io::Error) -> Self {
        VibratorError::HardwareWriteFailed { channel, source }
    }

    pub(crate) fn read(channel: Channel, source: io::Error) -> Self {
        VibratorError::HardwareReadFailed { channel, source }
    }

    /// True for failures reported by the driver itself
    pub fn is_hardware(&self) -> bool {
        matches!(
            self,
            VibratorError::HardwareWriteFailed { .. } | VibratorError::HardwareReadFailed { .. }
        )
    }
}

/// Result type for vibrator operations
pub type VibratorResult<T> = Result<T, VibratorError>;
