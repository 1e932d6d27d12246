//! Tests for temperature derating of steady vibration

use haptic_drive::{Channel, ThermalState, Vibrator};

use crate::test_utils::{dynamic_record, RecordingHardware};

fn vibrator_at(temperature: i64) -> Vibrator<RecordingHardware> {
    let hw = RecordingHardware::drv2624().with_read(Channel::Temperature, temperature);
    let mut vibrator = Vibrator::new(hw, dynamic_record()).expect("Failed to build vibrator");
    vibrator.hardware_mut().clear();
    vibrator
}

fn steady_drive(vibrator: &Vibrator<RecordingHardware>) -> (String, String) {
    let hw = vibrator.hardware();
    let last = |channel| hw.written(channel).last().map(|v| v.to_string()).unwrap_or_default();
    (last(Channel::OdClamp), last(Channel::LraPeriod))
}

#[test]
fn test_starts_nominal() {
    let vibrator = vibrator_at(7_000);
    assert_eq!(vibrator.thermal_state(), Some(ThermalState::Nominal));
}

#[test]
fn test_hysteresis_across_playbacks() {
    let mut vibrator = vibrator_at(7_000);

    // Between the bounds the initial nominal selection holds
    vibrator.on(1_000).expect("on failed");
    assert_eq!(steady_drive(&vibrator), ("103".into(), "262".into()));

    vibrator.hardware_mut().set_read(Channel::Temperature, 12_000i64);
    let duration = vibrator.on(1_000).expect("on failed");
    assert_eq!(duration, 1_000);
    assert_eq!(vibrator.thermal_state(), Some(ThermalState::Derated));
    assert_eq!(steady_drive(&vibrator), ("90".into(), "280".into()));

    vibrator.hardware_mut().set_read(Channel::Temperature, 7_000i64);
    vibrator.on(1_000).expect("on failed");
    assert_eq!(vibrator.thermal_state(), Some(ThermalState::Derated));
    assert_eq!(steady_drive(&vibrator), ("90".into(), "280".into()));

    vibrator.hardware_mut().set_read(Channel::Temperature, 4_000i64);
    vibrator.on(1_000).expect("on failed");
    assert_eq!(vibrator.thermal_state(), Some(ThermalState::Nominal));
    assert_eq!(steady_drive(&vibrator), ("103".into(), "262".into()));
}

#[test]
fn test_bounds_are_exclusive() {
    let mut vibrator = vibrator_at(10_000);
    vibrator.on(100).expect("on failed");
    assert_eq!(vibrator.thermal_state(), Some(ThermalState::Nominal));

    vibrator.hardware_mut().set_read(Channel::Temperature, 10_001i64);
    vibrator.on(100).expect("on failed");
    assert_eq!(vibrator.thermal_state(), Some(ThermalState::Derated));

    vibrator.hardware_mut().set_read(Channel::Temperature, 5_000i64);
    vibrator.on(100).expect("on failed");
    assert_eq!(vibrator.thermal_state(), Some(ThermalState::Derated));
}

#[test]
fn test_failed_read_keeps_selection() {
    let mut vibrator = vibrator_at(12_000);
    vibrator.on(100).expect("on failed");
    assert_eq!(vibrator.thermal_state(), Some(ThermalState::Derated));

    vibrator.hardware_mut().set_failing(Channel::Temperature, true);
    vibrator.on(100).expect("on failed");
    assert_eq!(vibrator.thermal_state(), Some(ThermalState::Derated));
    assert_eq!(steady_drive(&vibrator), ("90".into(), "280".into()));
}

#[test]
fn test_effects_do_not_sample_temperature() {
    let mut vibrator = vibrator_at(12_000);
    vibrator
        .perform_effect(haptic_drive::Effect::Click, haptic_drive::EffectStrength::Medium)
        .expect("effect failed");
    assert_eq!(vibrator.thermal_state(), Some(ThermalState::Nominal));
}

#[test]
fn test_no_thermistor_no_compensation() {
    let hw = RecordingHardware::drv2624().without(Channel::Temperature);
    let mut vibrator = Vibrator::new(hw, dynamic_record()).expect("Failed to build vibrator");
    assert_eq!(vibrator.thermal_state(), None);

    vibrator.on(100).expect("on failed");
    assert_eq!(steady_drive(&vibrator), ("103".into(), "262".into()));
}

#[test]
fn test_steady_clamp_respects_low_ceiling() {
    let mut record = dynamic_record();
    record.long_voltage_max = 80;
    record.steady_amp_max = Some(2.4);
    let hw = RecordingHardware::drv2624().with_read(Channel::Temperature, 3_000i64);
    let mut vibrator = Vibrator::new(hw, record).expect("Failed to build vibrator");
    vibrator.hardware_mut().clear();

    vibrator.on(500).expect("on failed");
    vibrator.hardware_mut().set_read(Channel::Temperature, 12_000i64);
    vibrator.on(500).expect("on failed");
    assert_eq!(vibrator.thermal_state(), Some(ThermalState::Derated));

    let clamps = vibrator.hardware().written(Channel::OdClamp);
    assert_eq!(clamps, vec!["80", "80"]);
}
