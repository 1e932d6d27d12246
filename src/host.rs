//! Thread-safe handle for hosts that dispatch from several threads

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::drive::Vibrator;
use crate::effects::{Effect, EffectOutcome, EffectStrength};
use crate::error::VibratorResult;
use crate::hardware::HardwareIo;

/// Cloneable handle serializing every call into one [`Vibrator`]
pub struct SharedVibrator<H: HardwareIo> {
    inner: Arc<Mutex<Vibrator<H>>>,
}

impl<H: HardwareIo> Clone for SharedVibrator<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: HardwareIo> SharedVibrator<H> {
    pub fn new(vibrator: Vibrator<H>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(vibrator)),
        }
    }

    pub fn on(&self, duration_ms: u32) -> VibratorResult<u32> {
        self.inner.lock().on(duration_ms)
    }

    pub fn off(&self) -> VibratorResult<()> {
        self.inner.lock().off()
    }

    pub fn perform_effect(
        &self,
        effect: Effect,
        strength: EffectStrength,
    ) -> VibratorResult<EffectOutcome> {
        self.inner.lock().perform_effect(effect, strength)
    }

    pub fn supports_amplitude_control(&self) -> bool {
        self.inner.lock().supports_amplitude_control()
    }

    pub fn set_amplitude(&self, amplitude: f32) -> VibratorResult<()> {
        self.inner.lock().set_amplitude(amplitude)
    }

    pub fn supports_external_control(&self) -> bool {
        self.inner.lock().supports_external_control()
    }

    pub fn set_external_control(&self, enabled: bool) -> VibratorResult<()> {
        self.inner.lock().set_external_control(enabled)
    }

    pub fn debug(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        self.inner.lock().debug(out)
    }

    /// Run `f` with exclusive access to the vibrator
    pub fn with<R>(&self, f: impl FnOnce(&mut Vibrator<H>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
