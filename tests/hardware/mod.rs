//! Sysfs backend tests
//!
//! Backends are pointed at node files in a temporary directory.
