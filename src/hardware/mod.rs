//! Driver capability interface
//!
//! The drive core never touches files directly. Everything it needs from the
//! kernel driver goes through [`HardwareIo`], addressed by [`Channel`]. Each
//! actuator family ships its own implementation that maps the channels onto
//! its register set.

use std::fmt;
use std::io;

pub mod cs40l25;
pub mod drv2624;
pub mod sysfs;

pub use cs40l25::Cs40l25;
pub use drv2624::Drv2624;
pub use sysfs::SysfsNodes;

/// Logical driver registers the drive core addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// Starts (1) or stops (0) playback
    Activate,
    /// Playback length in milliseconds
    Duration,
    /// Driver enable state
    State,
    /// Playback mode, `rtp` or `waveform`
    Mode,
    /// Waveform sequencer program, `<index> <count>` pairs
    Sequencer,
    /// Compound waveform queue
    EffectQueue,
    /// Waveform slot to trigger
    EffectIndex,
    /// Effect attenuation in 1/8 dB steps
    Scale,
    /// Attenuation applied on top of every playback, 1/8 dB steps
    GlobalScale,
    /// Loop selection, 1 = open, 0 = closed
    CtrlLoop,
    /// Waveform armed for low-power trigger
    LpTrigger,
    /// Open-loop drive shape
    WaveShape,
    /// Over-drive voltage clamp
    OdClamp,
    /// Open-loop drive period
    LraPeriod,
    /// Factory calibration passthrough
    Autocal,
    /// Measured resonant frequency passthrough
    F0,
    /// Measured DC resistance passthrough
    Redc,
    /// Measured quality factor passthrough
    Q,
    /// Real-time playback amplitude
    RtpInput,
    /// External (audio stream) control
    AspEnable,
    /// Ambient temperature in milli-degrees Celsius
    Temperature,
}

impl Channel {
    /// Channels without which a vibrator cannot be built
    pub const REQUIRED: [Channel; 3] = [Channel::Activate, Channel::Duration, Channel::State];

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Activate => "activate",
            Channel::Duration => "duration",
            Channel::State => "state",
            Channel::Mode => "mode",
            Channel::Sequencer => "sequencer",
            Channel::EffectQueue => "effect queue",
            Channel::EffectIndex => "effect index",
            Channel::Scale => "scale",
            Channel::GlobalScale => "global scale",
            Channel::CtrlLoop => "ctrl loop",
            Channel::LpTrigger => "lp trigger",
            Channel::WaveShape => "wave shape",
            Channel::OdClamp => "od clamp",
            Channel::LraPeriod => "lra period",
            Channel::Autocal => "autocal",
            Channel::F0 => "f0",
            Channel::Redc => "redc",
            Channel::Q => "q",
            Channel::RtpInput => "rtp input",
            Channel::AspEnable => "asp enable",
            Channel::Temperature => "temperature",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scalar written to or read from a driver node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl RegisterValue {
    /// Interpret raw node contents, preferring an integer reading
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(value) => RegisterValue::Int(value),
            Err(_) => RegisterValue::Text(trimmed.to_string()),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            RegisterValue::Bool(value) => Some(i64::from(*value)),
            RegisterValue::Int(value) => Some(*value),
            RegisterValue::Text(text) => text.trim().parse().ok(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_int().map(|value| value != 0)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RegisterValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for RegisterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterValue::Bool(value) => write!(f, "{}", u8::from(*value)),
            RegisterValue::Int(value) => write!(f, "{}", value),
            RegisterValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<bool> for RegisterValue {
    fn from(value: bool) -> Self {
        RegisterValue::Bool(value)
    }
}

impl From<u32> for RegisterValue {
    fn from(value: u32) -> Self {
        RegisterValue::Int(i64::from(value))
    }
}

impl From<i64> for RegisterValue {
    fn from(value: i64) -> Self {
        RegisterValue::Int(value)
    }
}

impl From<&str> for RegisterValue {
    fn from(value: &str) -> Self {
        RegisterValue::Text(value.to_string())
    }
}

impl From<String> for RegisterValue {
    fn from(value: String) -> Self {
        RegisterValue::Text(value)
    }
}

/// Access to the kernel driver of one actuator
///
/// Writes are synchronous and complete before returning. A write to a
/// channel the backend does not expose fails with
/// [`io::ErrorKind::Unsupported`].
pub trait HardwareIo {
    /// Whether the backend exposes this channel
    fn has(&self, channel: Channel) -> bool;

    fn write(&mut self, channel: Channel, value: RegisterValue) -> io::Result<()>;

    fn read(&mut self, channel: Channel) -> io::Result<RegisterValue>;

    /// Time the driver needs to wake before playback starts, ms
    fn start_latency_ms(&self) -> u32 {
        0
    }

    /// Dump node contents and recent traffic
    fn debug(&self, out: &mut dyn fmt::Write) -> fmt::Result;
}

pub(crate) fn unsupported(channel: Channel) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{} is not exposed by this driver", channel),
    )
}
