//! TI DRV2624 LRA driver backend
//!
//! Exposes open/closed loop selection, over-drive clamp, drive shape and
//! period, real-time playback and a waveform sequencer. There is no waveform
//! queue and no external control.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use super::{unsupported, Channel, HardwareIo, RegisterValue, SysfsNodes};

/// USB-C connector thermistor, read for thermal compensation
pub const DEFAULT_TEMPERATURE_NODE: &str = "/dev/thermal/tz-by-name/usbc-therm-adc/temp";

const NODES: [(Channel, &str); 13] = [
    (Channel::Autocal, "device/autocal"),
    (Channel::LraPeriod, "device/ol_lra_period"),
    (Channel::Activate, "activate"),
    (Channel::Duration, "duration"),
    (Channel::State, "state"),
    (Channel::RtpInput, "device/rtp_input"),
    (Channel::Mode, "device/mode"),
    (Channel::Sequencer, "device/set_sequencer"),
    (Channel::Scale, "device/scale"),
    (Channel::CtrlLoop, "device/ctrl_loop"),
    (Channel::LpTrigger, "device/lp_trigger_effect"),
    (Channel::WaveShape, "device/lra_wave_shape"),
    (Channel::OdClamp, "device/od_clamp"),
];

/// DRV2624 node set under a sysfs prefix
#[derive(Debug)]
pub struct Drv2624 {
    nodes: SysfsNodes,
}

impl Drv2624 {
    pub fn open(prefix: impl Into<PathBuf>) -> Self {
        Self::open_with_temperature(prefix, DEFAULT_TEMPERATURE_NODE)
    }

    /// Open with a specific temperature node, relative to the prefix or
    /// absolute
    pub fn open_with_temperature(prefix: impl Into<PathBuf>, temperature: impl AsRef<Path>) -> Self {
        let mut nodes = SysfsNodes::new(prefix);
        for (channel, name) in NODES {
            nodes.open(channel, name);
        }
        nodes.open(Channel::Temperature, &temperature.as_ref().to_string_lossy());
        Self { nodes }
    }

    pub fn nodes_mut(&mut self) -> &mut SysfsNodes {
        &mut self.nodes
    }

    /// The DRV2624 scale register only knows 100/75/50/25 %. Attenuation
    /// steps are mapped to the nearest of those.
    pub fn scale_register(attenuation_steps: i64) -> u32 {
        match attenuation_steps {
            i64::MIN..=9 => 0,
            10..=33 => 1,
            34..=71 => 2,
            _ => 3,
        }
    }
}

impl HardwareIo for Drv2624 {
    fn has(&self, channel: Channel) -> bool {
        self.nodes.has(channel)
    }

    fn write(&mut self, channel: Channel, value: RegisterValue) -> io::Result<()> {
        match channel {
            Channel::EffectQueue | Channel::EffectIndex | Channel::AspEnable => {
                Err(unsupported(channel))
            }
            Channel::Scale => {
                let steps = value.as_int().ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, format!("bad scale '{}'", value))
                })?;
                self.nodes
                    .set(channel, &RegisterValue::from(Self::scale_register(steps)))
            }
            _ => self.nodes.set(channel, &value),
        }
    }

    fn read(&mut self, channel: Channel) -> io::Result<RegisterValue> {
        self.nodes.get(channel)
    }

    fn debug(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        self.nodes.debug(out)
    }
}
