use log::{error, info};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error_handling::types::ConfigError;

/// Snap length applied when the config file omits `cap_size` or sets it to 0.
pub const DEFAULT_CAP_SIZE: u32 = 100;

/// Capture daemon configuration, loaded from a JSON file at startup.
///
/// ```json
/// {
///     "tcpdump_bin": "/usr/sbin/tcpdump",
///     "interface": "eth0",
///     "out_dir": "/var/tmp/captures",
///     "cap_size": 100,
///     "http_port": 9000
/// }
/// ```
///
/// # Fields Overview
///
/// - `tcpdump_bin`: path to the packet capture binary
/// - `interface`: network interface handed to the capture tool via `-i`
/// - `out_dir`: directory receiving capture files; also the directory served
///   by the `/capture_files` route
/// - `cap_size`: snap length in bytes (`-s`), defaults to 100 when unset
/// - `http_port`: TCP port for the control API
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    pub tcpdump_bin: PathBuf,
    pub interface: String,
    pub out_dir: PathBuf,
    #[serde(default)]
    pub cap_size: u32,
    pub http_port: u16,
}

impl CaptureConfig {
    /// Reads and validates the configuration from `path`.
    ///
    /// Any failure here is meant to abort startup; no request is served with
    /// a partially valid configuration.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            error!("Failed to read config file {}: {}", path.display(), e);
            ConfigError::IoError(e)
        })?;

        let mut config: CaptureConfig = serde_json::from_str(&content).map_err(|e| {
            error!("Failed to parse config file {}: {}", path.display(), e);
            ConfigError::JsonError(e.to_string())
        })?;

        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.tcpdump_bin.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("tcpdump_bin"));
        }
        if self.interface.is_empty() {
            return Err(ConfigError::MissingField("interface"));
        }
        if self.out_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("out_dir"));
        }
        if !self.out_dir.is_dir() {
            return Err(ConfigError::DirectoryDoesNotExist(format!(
                "out_dir {} does not exist or is not a directory",
                self.out_dir.display()
            )));
        }
        if self.http_port == 0 {
            return Err(ConfigError::NotInRange(
                "http_port must be non-zero".to_string(),
            ));
        }
        if self.cap_size == 0 {
            self.cap_size = DEFAULT_CAP_SIZE;
        }
        Ok(())
    }
}
