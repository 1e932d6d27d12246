//! Calibration loading tests
