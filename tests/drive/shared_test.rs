//! Tests for the thread-safe vibrator handle

use std::thread;

use haptic_drive::{CalibrationRecord, Channel, Effect, EffectStrength, SharedVibrator, Vibrator};

use crate::test_utils::RecordingHardware;

#[test]
fn test_calls_from_several_threads() {
    let vibrator = Vibrator::new(RecordingHardware::drv2624(), CalibrationRecord::default())
        .expect("Failed to build vibrator");
    let shared = SharedVibrator::new(vibrator);
    shared.with(|vibrator| vibrator.hardware_mut().clear());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                shared
                    .perform_effect(Effect::Tick, EffectStrength::Medium)
                    .expect("effect failed");
                shared.off().expect("off failed");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    shared.with(|vibrator| {
        let hw = vibrator.hardware();
        assert_eq!(hw.written(Channel::Sequencer).len(), 4);
        // Each effect activates once and each off deactivates once
        assert_eq!(hw.written(Channel::Activate).len(), 8);
    });
}

#[test]
fn test_handle_forwards_capabilities() {
    let vibrator = Vibrator::new(RecordingHardware::cs40l25(), CalibrationRecord::default())
        .expect("Failed to build vibrator");
    let shared = SharedVibrator::new(vibrator);

    assert!(shared.supports_external_control());
    assert!(shared.supports_amplitude_control());
    assert_eq!(shared.on(250).expect("on failed"), 250);

    let mut out = String::new();
    shared.debug(&mut out).expect("Failed to format dump");
    assert!(out.contains("Vibrator:"));
}
