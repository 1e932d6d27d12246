//! Integration tests for the haptic drive library
//!
//! Drive tests run against a recording fake of the driver interface;
//! calibration and hardware tests run against real files in temporary
//! directories.

// Test modules organized by category
pub mod calibration;
pub mod hardware;
