//! Tests for global attenuation and driver wake-up latency

use haptic_drive::{CalibrationRecord, Channel, Vibrator};

use crate::test_utils::RecordingHardware;

fn vibrator(hw: RecordingHardware, record: CalibrationRecord) -> Vibrator<RecordingHardware> {
    let mut vibrator = Vibrator::new(hw, record).expect("Failed to build vibrator");
    vibrator.hardware_mut().clear();
    vibrator
}

#[test]
fn test_on_sets_global_scale_and_latency() {
    let mut vibrator = vibrator(RecordingHardware::cs40l25(), CalibrationRecord::default());

    let duration = vibrator.on(1_000).expect("on failed");

    // The caller sees the requested time, the driver gets the wake-up on top
    assert_eq!(duration, 1_000);
    assert_eq!(
        vibrator.hardware().log(),
        vec![
            (Channel::GlobalScale, "19"),
            (Channel::Mode, "rtp"),
            (Channel::Duration, "1006"),
            (Channel::Activate, "1"),
        ]
    );
}

#[test]
fn test_on_latency_saturates() {
    let mut vibrator = vibrator(RecordingHardware::cs40l25(), CalibrationRecord::default());

    assert_eq!(vibrator.on(u32::MAX).expect("on failed"), u32::MAX);
    assert_eq!(
        vibrator.hardware().written(Channel::Duration),
        vec![u32::MAX.to_string()]
    );
}

#[test]
fn test_global_level_from_calibration() {
    let mut record = CalibrationRecord::default();
    record.volume_levels[5] = 50;
    let mut vibrator = vibrator(RecordingHardware::cs40l25(), record);

    vibrator.on(100).expect("on failed");
    assert_eq!(vibrator.hardware().written(Channel::GlobalScale), vec!["48"]);
}

#[test]
fn test_off_restores_full_scale() {
    let mut vibrator = vibrator(RecordingHardware::cs40l25(), CalibrationRecord::default());

    vibrator.on(100).expect("on failed");
    vibrator.hardware_mut().clear();
    vibrator.off().expect("off failed");

    assert_eq!(
        vibrator.hardware().log(),
        vec![(Channel::GlobalScale, "0"), (Channel::Activate, "0")]
    );
}

#[test]
fn test_global_scale_failure_is_not_fatal() {
    let hw = RecordingHardware::cs40l25().failing(Channel::GlobalScale);
    let mut vibrator = vibrator(hw, CalibrationRecord::default());

    assert_eq!(vibrator.on(100).expect("on failed"), 100);
    vibrator.off().expect("off failed");
    vibrator.set_external_control(true).expect("enable failed");

    assert_eq!(vibrator.hardware().written(Channel::Activate), vec!["1", "0"]);
    assert_eq!(vibrator.hardware().written(Channel::AspEnable), vec!["1"]);
}

#[test]
fn test_external_control_follows_global_level() {
    let mut vibrator = vibrator(RecordingHardware::cs40l25(), CalibrationRecord::default());

    vibrator.set_external_control(true).expect("enable failed");
    vibrator.set_external_control(false).expect("disable failed");

    assert_eq!(
        vibrator.hardware().log(),
        vec![
            (Channel::GlobalScale, "19"),
            (Channel::AspEnable, "1"),
            (Channel::GlobalScale, "0"),
            (Channel::AspEnable, "0"),
        ]
    );
}

#[test]
fn test_no_global_scale_channel() {
    let hw = RecordingHardware::cs40l25()
        .without(Channel::GlobalScale)
        .with_start_latency(0);
    let mut vibrator = vibrator(hw, CalibrationRecord::default());

    vibrator.on(100).expect("on failed");
    vibrator.off().expect("off failed");

    assert!(vibrator.hardware().written(Channel::GlobalScale).is_empty());
    assert_eq!(vibrator.hardware().written(Channel::Duration), vec!["100"]);
}
