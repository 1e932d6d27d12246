//! Drive controller
//!
//! [`Vibrator`] is the only component that writes to the driver. It owns the
//! backend, the cached calibration and the derived drive configurations, and
//! turns each request into an ordered sequence of channel writes ending in
//! `activate`. Nothing is retried: the first mandatory write that fails is
//! returned and `activate` is left untouched. Global scale writes are never
//! mandatory.

use std::fmt;

use tracing::{debug, info, warn};

pub mod config;

pub use config::{DriveConfig, LoopControl, WaveShape};

use crate::calibration::{CalibrationRecord, GLOBAL_SCALE_LEVEL};
use crate::effects::{
    Effect, EffectCatalog, EffectOutcome, EffectStrength, Program, VoltageSlot,
    TRIGGER_QUEUE_INDEX,
};
use crate::error::{VibratorError, VibratorResult};
use crate::hardware::{Channel, HardwareIo, RegisterValue};
use crate::solver;
use crate::thermal::{ThermalCompensator, ThermalState};

/// Full-scale real-time playback amplitude
pub const RTP_INPUT_MAX: f32 = 127.0;

/// Channels a backend needs before drive levels can be solved per unit
const DYNAMIC_CHANNELS: [Channel; 3] = [Channel::WaveShape, Channel::OdClamp, Channel::LraPeriod];

/// Driver playback mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    /// Real-time playback, used for steady vibration
    Rtp,
    /// Sequencer playback, used for effects
    Waveform,
}

impl PlayMode {
    pub fn name(&self) -> &'static str {
        match self {
            PlayMode::Rtp => "rtp",
            PlayMode::Waveform => "waveform",
        }
    }
}

/// LRA drive controller over a hardware backend
pub struct Vibrator<H: HardwareIo> {
    hw: H,
    record: CalibrationRecord,
    catalog: EffectCatalog,
    effect_config: Option<DriveConfig>,
    steady_config: Option<DriveConfig>,
    thermal: Option<ThermalCompensator>,
}

impl<H: HardwareIo> Vibrator<H> {
    /// Bring up the driver and derive drive configurations
    pub fn new(mut hw: H, record: CalibrationRecord) -> VibratorResult<Self> {
        let missing: Vec<&str> = Channel::REQUIRED
            .iter()
            .filter(|channel| !hw.has(**channel))
            .map(|channel| channel.name())
            .collect();
        if !missing.is_empty() {
            return Err(VibratorError::ConstructionFailed(format!(
                "driver lacks {}",
                missing.join(", ")
            )));
        }

        if let Err(e) = hw.write(Channel::State, RegisterValue::from(true)) {
            warn!("{}", VibratorError::write(Channel::State, e));
        }

        if hw.has(Channel::Autocal) {
            if let Some(autocal) = &record.autocal {
                if let Err(e) = hw.write(Channel::Autocal, RegisterValue::from(autocal.as_str())) {
                    warn!("{}", VibratorError::write(Channel::Autocal, e));
                }
            }
        }

        let measured = [
            (Channel::F0, record.f0),
            (Channel::Redc, record.redc),
            (Channel::Q, Some(record.q)),
        ];
        for (channel, value) in measured {
            let Some(value) = value.filter(|_| hw.has(channel)) else {
                continue;
            };
            if let Err(e) = hw.write(channel, RegisterValue::from(value)) {
                warn!("{}", VibratorError::write(channel, e));
            }
        }

        let dynamic = record.dynamic_config && DYNAMIC_CHANNELS.iter().all(|c| hw.has(*c));
        if record.dynamic_config && !dynamic {
            warn!("Driver cannot shape the drive, falling back to static configuration");
        }

        if !dynamic && hw.has(Channel::LraPeriod) {
            if let Err(e) = hw.write(Channel::LraPeriod, RegisterValue::from(record.lra_period)) {
                warn!("{}", VibratorError::write(Channel::LraPeriod, e));
            }
        }

        if hw.has(Channel::LpTrigger) {
            let effect = RegisterValue::from(record.lp_trigger_effect);
            if let Err(e) = hw.write(Channel::LpTrigger, effect) {
                warn!("{}", VibratorError::write(Channel::LpTrigger, e));
            }
        }

        let (effect_config, steady_config) = if dynamic {
            (
                Some(DriveConfig::effect_config(&record)),
                Some(DriveConfig::steady_config(&record)),
            )
        } else {
            (None, None)
        };

        let thermal = match &steady_config {
            Some(steady) if hw.has(Channel::Temperature) => {
                let shifted =
                    solver::shifted_period(record.lra_period, record.long_frequency_shift);
                Some(ThermalCompensator::new(steady.clone(), shifted))
            }
            _ => None,
        };

        info!(
            "✅ Vibrator ready ({} configuration)",
            if dynamic { "dynamic" } else { "static" }
        );

        let catalog = EffectCatalog::new(record.durations)
            .with_queue(hw.has(Channel::EffectQueue))
            .with_start_latency(hw.start_latency_ms());

        Ok(Self {
            hw,
            catalog,
            record,
            effect_config,
            steady_config,
            thermal,
        })
    }

    /// Start steady vibration for `duration_ms`
    pub fn on(&mut self, duration_ms: u32) -> VibratorResult<u32> {
        let config = self.sample_steady_config();
        // Pad for driver wake-up unless that would overflow
        let latency = self.catalog.start_latency_ms();
        let timeout_ms = duration_ms.checked_add(latency).unwrap_or(duration_ms);
        self.set_global_scale(true);
        self.play(timeout_ms, PlayMode::Rtp, config.as_ref(), 0)?;
        Ok(duration_ms)
    }

    /// Stop playback
    pub fn off(&mut self) -> VibratorResult<()> {
        self.set_global_scale(false);
        self.write(Channel::Activate, RegisterValue::from(false))
    }

    /// Play a catalog effect
    pub fn perform_effect(
        &mut self,
        effect: Effect,
        strength: EffectStrength,
    ) -> VibratorResult<EffectOutcome> {
        let Some(plan) = self.catalog.plan(effect, strength) else {
            debug!("Effect {} is not supported", effect);
            return Ok(EffectOutcome::Unsupported);
        };

        match &plan.program {
            Program::Sequence(program) => {
                self.write(Channel::Sequencer, RegisterValue::from(program.as_str()))?;
            }
            Program::Queue(queue) => {
                self.write(Channel::EffectQueue, RegisterValue::from(queue.as_str()))?;
                self.write(Channel::EffectIndex, RegisterValue::from(TRIGGER_QUEUE_INDEX))?;
            }
        }

        if self.hw.has(Channel::Scale) {
            let scale = self.effect_scale(plan.slot);
            self.write(Channel::Scale, RegisterValue::from(scale))?;
        }

        let config = self.effect_config.clone();
        self.play(
            plan.duration_ms,
            PlayMode::Waveform,
            config.as_ref(),
            plan.slot.index(),
        )?;
        Ok(EffectOutcome::Played {
            duration_ms: plan.duration_ms,
        })
    }

    pub fn supports_amplitude_control(&mut self) -> bool {
        !self.external_control_active()
            && (self.hw.has(Channel::RtpInput) || self.hw.has(Channel::Scale))
    }

    /// Set playback amplitude, `amplitude` in (0, 1]
    pub fn set_amplitude(&mut self, amplitude: f32) -> VibratorResult<()> {
        if !(amplitude.is_finite() && amplitude > 0.0 && amplitude <= 1.0) {
            return Err(VibratorError::BadValue(format!(
                "amplitude {} outside (0, 1]",
                amplitude
            )));
        }
        if self.external_control_active() {
            return Err(VibratorError::Unsupported(
                "amplitude is owned by external control".to_string(),
            ));
        }

        if self.hw.has(Channel::RtpInput) {
            let input = (amplitude * RTP_INPUT_MAX).round() as u32;
            self.write(Channel::RtpInput, RegisterValue::from(input))
        } else if self.hw.has(Channel::Scale) {
            let steps = solver::attenuation_steps(f64::from(amplitude));
            self.write(Channel::Scale, RegisterValue::from(steps))
        } else {
            Err(VibratorError::Unsupported(
                "driver has no amplitude control".to_string(),
            ))
        }
    }

    pub fn supports_external_control(&self) -> bool {
        self.hw.has(Channel::AspEnable)
    }

    /// Hand playback to (or take it back from) the audio stream
    pub fn set_external_control(&mut self, enabled: bool) -> VibratorResult<()> {
        if !self.supports_external_control() {
            return Err(VibratorError::Unsupported(
                "driver has no external control".to_string(),
            ));
        }
        self.set_global_scale(enabled);
        self.write(Channel::AspEnable, RegisterValue::from(enabled))
    }

    /// Human readable state dump
    pub fn debug(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "Vibrator:")?;
        writeln!(out, "  Close Loop Threshold: {}", self.record.close_loop_threshold)?;
        writeln!(out, "  LRA Period: {}", self.record.lra_period)?;
        match &self.effect_config {
            Some(config) => writeln!(out, "  Effect Config: {}", config)?,
            None => writeln!(out, "  Effect Config: static")?,
        }
        match &self.steady_config {
            Some(config) => writeln!(out, "  Steady Config: {}", config)?,
            None => writeln!(out, "  Steady Config: static")?,
        }
        if let Some(thermal) = &self.thermal {
            writeln!(out, "  Thermal State: {}", thermal.state())?;
            writeln!(out, "  Active Steady Config: {}", thermal.current())?;
        }
        let durations = self.catalog.durations();
        writeln!(
            out,
            "  Durations: click={} tick={} double_click={} heavy_click={}",
            durations.click, durations.tick, durations.double_click, durations.heavy_click
        )?;
        writeln!(out, "  Start Latency: {}", self.catalog.start_latency_ms())?;
        writeln!(out)?;
        self.hw.debug(out)?;
        writeln!(out)?;
        self.record.debug(out)
    }

    pub fn record(&self) -> &CalibrationRecord {
        &self.record
    }

    pub fn effect_config(&self) -> Option<&DriveConfig> {
        self.effect_config.as_ref()
    }

    pub fn steady_config(&self) -> Option<&DriveConfig> {
        self.steady_config.as_ref()
    }

    pub fn thermal_state(&self) -> Option<ThermalState> {
        self.thermal.as_ref().map(ThermalCompensator::state)
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn into_hardware(self) -> H {
        self.hw
    }

    fn write(&mut self, channel: Channel, value: RegisterValue) -> VibratorResult<()> {
        debug!("{} <- {}", channel, value);
        self.hw
            .write(channel, value)
            .map_err(|e| VibratorError::write(channel, e))
    }

    fn play(
        &mut self,
        duration_ms: u32,
        mode: PlayMode,
        config: Option<&DriveConfig>,
        slot: usize,
    ) -> VibratorResult<()> {
        if self.hw.has(Channel::CtrlLoop) {
            let loop_control = LoopControl::select(
                mode == PlayMode::Rtp,
                duration_ms,
                self.record.close_loop_threshold,
            );
            if let Err(e) = self.hw.write(Channel::CtrlLoop, loop_control.register()) {
                warn!("{}", VibratorError::write(Channel::CtrlLoop, e));
            }
        }

        if self.hw.has(Channel::Mode) {
            self.write(Channel::Mode, RegisterValue::from(mode.name()))?;
        }
        self.write(Channel::Duration, RegisterValue::from(duration_ms))?;

        if let Some(config) = config {
            self.write(Channel::WaveShape, config.shape.register())?;
            self.write(Channel::OdClamp, RegisterValue::from(config.level(slot)))?;
            self.write(Channel::LraPeriod, RegisterValue::from(config.lra_period))?;
        }

        self.write(Channel::Activate, RegisterValue::from(true))
    }

    /// Steady config for this playback, sampling temperature if tracked
    fn sample_steady_config(&mut self) -> Option<DriveConfig> {
        let Some(thermal) = self.thermal.as_mut() else {
            return self.steady_config.clone();
        };
        match self.hw.read(Channel::Temperature) {
            Ok(value) => match value.as_int() {
                Some(sample) => Some(thermal.evaluate(sample)),
                None => {
                    warn!("Unreadable temperature '{}'", value);
                    Some(thermal.current())
                }
            },
            Err(e) => {
                warn!("{}", VibratorError::read(Channel::Temperature, e));
                Some(thermal.current())
            }
        }
    }

    /// Attenuate every playback to the global level, or restore full scale
    fn set_global_scale(&mut self, set: bool) {
        if !self.hw.has(Channel::GlobalScale) {
            return;
        }
        let steps = if set {
            let percent = self.record.volume_levels[GLOBAL_SCALE_LEVEL];
            solver::attenuation_steps(f64::from(percent) / 100.0)
        } else {
            0
        };
        debug!("{} <- {}", Channel::GlobalScale, steps);
        if let Err(e) = self.hw.write(Channel::GlobalScale, RegisterValue::from(steps)) {
            warn!("{}", VibratorError::write(Channel::GlobalScale, e));
        }
    }

    /// Scale register for an effect, 0 meaning full scale
    fn effect_scale(&self, slot: VoltageSlot) -> u32 {
        if self.effect_config.is_some() {
            return 0;
        }
        let percent = self.record.volume_levels[slot.index()];
        solver::attenuation_steps(f64::from(percent) / 100.0)
    }

    fn external_control_active(&mut self) -> bool {
        if !self.hw.has(Channel::AspEnable) {
            return false;
        }
        match self.hw.read(Channel::AspEnable) {
            Ok(value) => value.as_bool().unwrap_or(false),
            Err(e) => {
                debug!("{}", VibratorError::read(Channel::AspEnable, e));
                false
            }
        }
    }
}

impl<H: HardwareIo> fmt::Debug for Vibrator<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vibrator")
            .field("effect_config", &self.effect_config)
            .field("steady_config", &self.steady_config)
            .field("thermal", &self.thermal_state())
            .finish()
    }
}
