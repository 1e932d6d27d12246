//! Cirrus CS40L25 DSP haptic driver backend
//!
//! Waveforms live in DSP memory and are started by index. There is no
//! loop, shape or clamp control; drive strength is a digital scale. Steady
//! vibration plays the long-vibration waveform at index 0. The DSP takes its
//! measured f0, ReDC and Q at bring-up and needs a few milliseconds to leave
//! standby before any waveform starts.

use std::fmt;
use std::io;
use std::path::PathBuf;

use super::{unsupported, Channel, HardwareIo, RegisterValue, SysfsNodes};

/// Waveform slot holding the long (steady) vibration
pub const LONG_VIBRATION_EFFECT_INDEX: u32 = 0;
/// I2C transaction plus DSP return from standby
pub const COLD_START_LATENCY_MS: u32 = 6;

const NODES: [(Channel, &str); 11] = [
    (Channel::F0, "device/f0_stored"),
    (Channel::Redc, "device/redc_stored"),
    (Channel::Q, "device/q_stored"),
    (Channel::Activate, "activate"),
    (Channel::Duration, "duration"),
    (Channel::State, "state"),
    (Channel::EffectIndex, "device/cp_trigger_index"),
    (Channel::EffectQueue, "device/cp_trigger_queue"),
    (Channel::Scale, "device/cp_dig_scale"),
    (Channel::GlobalScale, "device/dig_scale"),
    (Channel::AspEnable, "device/asp_enable"),
];

/// CS40L25 node set under a sysfs prefix
#[derive(Debug)]
pub struct Cs40l25 {
    nodes: SysfsNodes,
}

impl Cs40l25 {
    pub fn open(prefix: impl Into<PathBuf>) -> Self {
        let mut nodes = SysfsNodes::new(prefix);
        for (channel, name) in NODES {
            nodes.open(channel, name);
        }
        Self { nodes }
    }

    pub fn nodes_mut(&mut self) -> &mut SysfsNodes {
        &mut self.nodes
    }

    fn trigger_index(&mut self, index: u32) -> io::Result<()> {
        self.nodes
            .set(Channel::EffectIndex, &RegisterValue::from(index))
    }
}

/// First index of an `<index> <count>` program
fn program_index(program: &RegisterValue) -> io::Result<u32> {
    program
        .to_string()
        .split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("bad sequencer program '{}'", program),
            )
        })
}

impl HardwareIo for Cs40l25 {
    fn has(&self, channel: Channel) -> bool {
        match channel {
            Channel::Mode | Channel::Sequencer => self.nodes.has(Channel::EffectIndex),
            _ => self.nodes.has(channel),
        }
    }

    fn write(&mut self, channel: Channel, value: RegisterValue) -> io::Result<()> {
        match channel {
            // The mode is implied by the slot being triggered
            Channel::Mode => match value.as_text() {
                Some("rtp") => self.trigger_index(LONG_VIBRATION_EFFECT_INDEX),
                Some("waveform") => Ok(()),
                _ => Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unknown mode '{}'", value),
                )),
            },
            Channel::Sequencer => {
                let index = program_index(&value)?;
                self.trigger_index(index)
            }
            Channel::CtrlLoop
            | Channel::WaveShape
            | Channel::OdClamp
            | Channel::LraPeriod
            | Channel::Autocal
            | Channel::RtpInput
            | Channel::LpTrigger
            | Channel::Temperature => Err(unsupported(channel)),
            _ => self.nodes.set(channel, &value),
        }
    }

    fn read(&mut self, channel: Channel) -> io::Result<RegisterValue> {
        self.nodes.get(channel)
    }

    fn start_latency_ms(&self) -> u32 {
        COLD_START_LATENCY_MS
    }

    fn debug(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        self.nodes.debug(out)
    }
}
