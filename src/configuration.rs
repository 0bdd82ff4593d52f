//! Runtime configuration for the capture daemon.
//!
//! Configuration is loaded once at startup from a JSON file and validated
//! before anything else is wired up. A bad configuration is fatal.

pub mod config;

pub use config::CaptureConfig;
