//! Logical effects and the waveform programs that play them

use std::fmt;
use std::str::FromStr;

use crate::calibration::EffectDurations;
use crate::error::VibratorError;

/// Silence between the two halves of a double click, ms
pub const DOUBLE_CLICK_SILENCE_MS: u32 = 100;
/// Timing margin the sequencer adds around a pause, ms
pub const PAUSE_MARGIN_MS: u32 = 1;
/// Effect index that plays whatever sits in the effect queue
pub const TRIGGER_QUEUE_INDEX: u32 = 65534;

const WAVEFORM_CLICK_INDEX: u32 = 1;
const WAVEFORM_TICK_INDEX: u32 = 2;
/// Stored double click, played when the driver has no effect queue
const WAVEFORM_DOUBLE_CLICK_INDEX: u32 = 3;
const WAVEFORM_HEAVY_CLICK_INDEX: u32 = 4;

/// Effects a caller may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Click,
    DoubleClick,
    Tick,
    Thud,
    Pop,
    HeavyClick,
    TextureTick,
}

impl Effect {
    pub const ALL: [Effect; 7] = [
        Effect::Click,
        Effect::DoubleClick,
        Effect::Tick,
        Effect::Thud,
        Effect::Pop,
        Effect::HeavyClick,
        Effect::TextureTick,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Effect::Click => "click",
            Effect::DoubleClick => "double_click",
            Effect::Tick => "tick",
            Effect::Thud => "thud",
            Effect::Pop => "pop",
            Effect::HeavyClick => "heavy_click",
            Effect::TextureTick => "texture_tick",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Effect {
    type Err = VibratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Effect::ALL
            .into_iter()
            .find(|effect| effect.name() == wanted)
            .ok_or_else(|| VibratorError::BadValue(format!("unknown effect '{}'", s)))
    }
}

/// Requested intensity of an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EffectStrength {
    Light,
    #[default]
    Medium,
    Strong,
}

impl EffectStrength {
    /// Voltage slots moved relative to the effect's base slot
    pub fn slot_offset(&self) -> i32 {
        match self {
            EffectStrength::Light => -1,
            EffectStrength::Medium => 0,
            EffectStrength::Strong => 1,
        }
    }
}

impl fmt::Display for EffectStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EffectStrength::Light => "light",
            EffectStrength::Medium => "medium",
            EffectStrength::Strong => "strong",
        })
    }
}

impl FromStr for EffectStrength {
    type Err = VibratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(EffectStrength::Light),
            "medium" => Ok(EffectStrength::Medium),
            "strong" => Ok(EffectStrength::Strong),
            _ => Err(VibratorError::BadValue(format!("unknown strength '{}'", s))),
        }
    }
}

/// Over-drive clamp slot of the effect configuration, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VoltageSlot {
    TextureTick,
    Tick,
    Click,
    HeavyClick,
    Top,
}

impl VoltageSlot {
    pub const COUNT: usize = 5;

    const TABLE: [VoltageSlot; Self::COUNT] = [
        VoltageSlot::TextureTick,
        VoltageSlot::Tick,
        VoltageSlot::Click,
        VoltageSlot::HeavyClick,
        VoltageSlot::Top,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Move by `offset` slots, saturating at either end
    pub fn offset(self, offset: i32) -> Self {
        let max = Self::COUNT as i32 - 1;
        let index = (self.index() as i32 + offset).clamp(0, max);
        Self::TABLE[index as usize]
    }
}

/// What gets handed to the driver to start an effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    /// `<index> <count>` for the waveform sequencer
    Sequence(String),
    /// Comma separated compound program for the effect queue
    Queue(String),
}

/// Resolved playback of one effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectPlan {
    pub program: Program,
    pub duration_ms: u32,
    pub slot: VoltageSlot,
}

/// Result of an effect request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectOutcome {
    Played { duration_ms: u32 },
    Unsupported,
}

impl EffectOutcome {
    pub fn duration_ms(&self) -> u32 {
        match self {
            EffectOutcome::Played { duration_ms } => *duration_ms,
            EffectOutcome::Unsupported => 0,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, EffectOutcome::Played { .. })
    }
}

fn sequence(index: u32) -> String {
    format!("{} 0", index)
}

/// Maps (effect, strength) onto programs, durations and voltage slots
#[derive(Debug, Clone, Copy)]
pub struct EffectCatalog {
    durations: EffectDurations,
    /// Compound programs go through the effect queue
    queue: bool,
    /// Wake-up time added to every waveform, ms
    start_latency_ms: u32,
}

impl Default for EffectCatalog {
    fn default() -> Self {
        Self::new(EffectDurations::default())
    }
}

impl EffectCatalog {
    pub fn new(durations: EffectDurations) -> Self {
        Self {
            durations,
            queue: true,
            start_latency_ms: 0,
        }
    }

    /// Whether the driver takes compound programs. Without a queue the
    /// double click falls back to its stored waveform.
    pub fn with_queue(mut self, queue: bool) -> Self {
        self.queue = queue;
        self
    }

    pub fn with_start_latency(mut self, latency_ms: u32) -> Self {
        self.start_latency_ms = latency_ms;
        self
    }

    pub fn durations(&self) -> &EffectDurations {
        &self.durations
    }

    pub fn start_latency_ms(&self) -> u32 {
        self.start_latency_ms
    }

    /// Plan an effect, `None` when it cannot be played
    pub fn plan(&self, effect: Effect, strength: EffectStrength) -> Option<EffectPlan> {
        let offset = strength.slot_offset();
        let latency = self.start_latency_ms;
        let simple = |index: u32, duration_ms: u32, slot: VoltageSlot| EffectPlan {
            program: Program::Sequence(sequence(index)),
            duration_ms: duration_ms.saturating_add(latency),
            slot: slot.offset(offset),
        };

        match effect {
            Effect::Click => Some(simple(
                WAVEFORM_CLICK_INDEX,
                self.durations.click,
                VoltageSlot::Click,
            )),
            Effect::Tick => Some(simple(
                WAVEFORM_TICK_INDEX,
                self.durations.tick,
                VoltageSlot::Tick,
            )),
            Effect::HeavyClick => Some(simple(
                WAVEFORM_HEAVY_CLICK_INDEX,
                self.durations.heavy_click,
                VoltageSlot::HeavyClick,
            )),
            Effect::TextureTick => Some(EffectPlan {
                program: Program::Sequence(sequence(WAVEFORM_TICK_INDEX)),
                duration_ms: self.durations.tick.saturating_add(latency),
                slot: VoltageSlot::TextureTick,
            }),
            Effect::DoubleClick if !self.queue => Some(simple(
                WAVEFORM_DOUBLE_CLICK_INDEX,
                self.durations.double_click,
                VoltageSlot::Click,
            )),
            Effect::DoubleClick => Some(EffectPlan {
                program: Program::Queue(format!(
                    "{},{},{}",
                    sequence(WAVEFORM_CLICK_INDEX),
                    DOUBLE_CLICK_SILENCE_MS,
                    sequence(WAVEFORM_HEAVY_CLICK_INDEX)
                )),
                // Each half pays the wake-up latency
                duration_ms: self
                    .durations
                    .click
                    .saturating_add(latency)
                    .saturating_add(DOUBLE_CLICK_SILENCE_MS + PAUSE_MARGIN_MS)
                    .saturating_add(self.durations.heavy_click)
                    .saturating_add(latency),
                slot: VoltageSlot::Click.offset(offset),
            }),
            Effect::Thud | Effect::Pop => None,
        }
    }
}
