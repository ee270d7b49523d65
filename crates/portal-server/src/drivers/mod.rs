//! Driver implementations.
//!
//! Real hardware backends are platform-specific and live out of tree; the
//! mock driver here backs the Linux binary and the test suites.

pub mod mock;
