//! Tests for effect playback

use haptic_drive::{CalibrationRecord, Channel, Effect, EffectOutcome, EffectStrength, Vibrator};

use crate::test_utils::{dynamic_record, RecordingHardware};

fn vibrator(hw: RecordingHardware, record: CalibrationRecord) -> Vibrator<RecordingHardware> {
    let mut vibrator = Vibrator::new(hw, record).expect("Failed to build vibrator");
    vibrator.hardware_mut().clear();
    vibrator
}

#[test]
fn test_click_write_order() {
    let mut vibrator = vibrator(RecordingHardware::drv2624(), dynamic_record());

    let outcome = vibrator
        .perform_effect(Effect::Click, EffectStrength::Medium)
        .expect("effect failed");

    assert_eq!(outcome, EffectOutcome::Played { duration_ms: 6 });
    assert_eq!(
        vibrator.hardware().log(),
        vec![
            (Channel::Sequencer, "1 0"),
            (Channel::Scale, "0"),
            (Channel::CtrlLoop, "1"),
            (Channel::Mode, "waveform"),
            (Channel::Duration, "6"),
            (Channel::WaveShape, "1"),
            (Channel::OdClamp, "45"),
            (Channel::LraPeriod, "262"),
            (Channel::Activate, "1"),
        ]
    );
}

#[test]
fn test_click_strength_selects_clamp() {
    let mut vibrator = vibrator(RecordingHardware::drv2624(), dynamic_record());

    for strength in [
        EffectStrength::Light,
        EffectStrength::Medium,
        EffectStrength::Strong,
    ] {
        vibrator
            .perform_effect(Effect::Click, strength)
            .expect("effect failed");
    }

    assert_eq!(vibrator.hardware().written(Channel::OdClamp), vec!["25", "45", "72"]);
}

#[test]
fn test_texture_tick_ignores_strength() {
    let mut vibrator = vibrator(RecordingHardware::drv2624(), dynamic_record());

    let outcome = vibrator
        .perform_effect(Effect::TextureTick, EffectStrength::Strong)
        .expect("effect failed");

    assert_eq!(outcome.duration_ms(), 2);
    assert_eq!(vibrator.hardware().written(Channel::Sequencer), vec!["2 0"]);
    assert_eq!(vibrator.hardware().written(Channel::OdClamp), vec!["25"]);
}

#[test]
fn test_heavy_click_strong_uses_top_slot() {
    let mut vibrator = vibrator(RecordingHardware::drv2624(), dynamic_record());

    let outcome = vibrator
        .perform_effect(Effect::HeavyClick, EffectStrength::Strong)
        .expect("effect failed");

    assert_eq!(outcome.duration_ms(), 8);
    assert_eq!(vibrator.hardware().written(Channel::Sequencer), vec!["4 0"]);
    assert_eq!(vibrator.hardware().written(Channel::OdClamp), vec!["95"]);
}

#[test]
fn test_effects_never_close_the_loop() {
    let mut record = dynamic_record();
    record.close_loop_threshold = 0;
    let mut vibrator = vibrator(RecordingHardware::drv2624(), record);

    vibrator
        .perform_effect(Effect::HeavyClick, EffectStrength::Medium)
        .expect("effect failed");

    assert_eq!(vibrator.hardware().written(Channel::CtrlLoop), vec!["1"]);
}

#[test]
fn test_unsupported_effects_write_nothing() {
    let mut vibrator = vibrator(RecordingHardware::cs40l25(), CalibrationRecord::default());

    for effect in [Effect::Thud, Effect::Pop] {
        let outcome = vibrator
            .perform_effect(effect, EffectStrength::Medium)
            .expect("unsupported is not an error");
        assert_eq!(outcome, EffectOutcome::Unsupported);
        assert_eq!(outcome.duration_ms(), 0);
    }
    assert!(vibrator.hardware().writes().is_empty());
}

#[test]
fn test_double_click_without_queue_uses_sequencer() {
    let mut vibrator = vibrator(RecordingHardware::drv2624(), dynamic_record());

    let outcome = vibrator
        .perform_effect(Effect::DoubleClick, EffectStrength::Medium)
        .expect("effect failed");

    assert_eq!(outcome, EffectOutcome::Played { duration_ms: 135 });
    assert_eq!(
        vibrator.hardware().log(),
        vec![
            (Channel::Sequencer, "3 0"),
            (Channel::Scale, "0"),
            (Channel::CtrlLoop, "1"),
            (Channel::Mode, "waveform"),
            (Channel::Duration, "135"),
            (Channel::WaveShape, "1"),
            (Channel::OdClamp, "45"),
            (Channel::LraPeriod, "262"),
            (Channel::Activate, "1"),
        ]
    );
}

#[test]
fn test_double_click_without_queue_follows_strength() {
    let mut record = dynamic_record();
    record.durations.double_click = 150;
    let mut vibrator = vibrator(RecordingHardware::drv2624(), record);

    let outcome = vibrator
        .perform_effect(Effect::DoubleClick, EffectStrength::Strong)
        .expect("effect failed");

    assert_eq!(outcome.duration_ms(), 150);
    assert_eq!(vibrator.hardware().written(Channel::OdClamp), vec!["72"]);
    assert!(vibrator.hardware().written(Channel::EffectQueue).is_empty());
}

#[test]
fn test_double_click_queue() {
    let mut vibrator = vibrator(RecordingHardware::cs40l25(), CalibrationRecord::default());

    let outcome = vibrator
        .perform_effect(Effect::DoubleClick, EffectStrength::Medium)
        .expect("effect failed");

    // Both halves wait out the 6 ms wake-up
    assert_eq!(
        outcome,
        EffectOutcome::Played { duration_ms: (6 + 6) + 100 + 1 + (8 + 6) }
    );
    assert_eq!(
        vibrator.hardware().log(),
        vec![
            (Channel::EffectQueue, "1 0,100,4 0"),
            (Channel::EffectIndex, "65534"),
            (Channel::Scale, "16"),
            (Channel::Mode, "waveform"),
            (Channel::Duration, "127"),
            (Channel::Activate, "1"),
        ]
    );
}

#[test]
fn test_static_scale_follows_volume_levels() {
    let mut vibrator = vibrator(RecordingHardware::drv2624(), CalibrationRecord::default());

    vibrator
        .perform_effect(Effect::Click, EffectStrength::Strong)
        .expect("effect failed");
    vibrator
        .perform_effect(Effect::HeavyClick, EffectStrength::Strong)
        .expect("effect failed");

    // 90 % and 100 % of full scale
    assert_eq!(vibrator.hardware().written(Channel::Scale), vec!["7", "0"]);
}

#[test]
fn test_custom_durations() {
    let mut record = CalibrationRecord::default();
    record.durations.click = 12;
    record.durations.heavy_click = 20;
    let mut vibrator = vibrator(RecordingHardware::cs40l25(), record);

    let click = vibrator
        .perform_effect(Effect::Click, EffectStrength::Light)
        .expect("effect failed");
    let double = vibrator
        .perform_effect(Effect::DoubleClick, EffectStrength::Light)
        .expect("effect failed");

    assert_eq!(click.duration_ms(), 12 + 6);
    assert_eq!(double.duration_ms(), (12 + 6) + 100 + 1 + (20 + 6));
}

#[test]
fn test_start_latency_extends_simple_effects() {
    let hw = RecordingHardware::cs40l25().with_start_latency(10);
    let mut vibrator = vibrator(hw, CalibrationRecord::default());

    let tick = vibrator
        .perform_effect(Effect::Tick, EffectStrength::Medium)
        .expect("effect failed");

    assert_eq!(tick.duration_ms(), 2 + 10);
    assert_eq!(vibrator.hardware().written(Channel::Duration), vec!["12"]);
    // Effects leave the global scale alone
    assert!(vibrator.hardware().written(Channel::GlobalScale).is_empty());
}

#[test]
fn test_sequencer_failure_stops_effect() {
    let hw = RecordingHardware::drv2624().failing(Channel::Sequencer);
    let mut vibrator = vibrator(hw, dynamic_record());

    assert!(vibrator
        .perform_effect(Effect::Tick, EffectStrength::Medium)
        .is_err());
    assert!(vibrator.hardware().writes().is_empty());
}
