//! Configuration management for aztarna.
//!
//! Provides scan settings with XDG-compliant default storage.

mod settings;

pub use settings::{Paths, ScanSettings, DEFAULT_PORTS, DEFAULT_RATE};
