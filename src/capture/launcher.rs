use std::process::Stdio;
use tokio::process::Command;

use crate::configuration::config::CaptureConfig;
use crate::error_handling::types::SupervisorError;

/// Builds the command line for the external capture tool.
///
/// Launching is the supervisor's job; this type only constructs an
/// unstarted command equivalent to
/// `<tcpdump_bin> -i <interface> -w <out_dir>/<filename> -s <cap_size>`,
/// placed in its own process group so a later stop can signal the group
/// rather than the lone child.
pub struct CaptureLauncher {
    config: CaptureConfig,
}

impl CaptureLauncher {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }

    /// Produces the unstarted capture command writing to
    /// `<out_dir>/<filename>`.
    ///
    /// An empty binary path, interface, or filename is a configuration
    /// fault; no process must be launched from such a command.
    pub fn command(&self, filename: &str) -> Result<Command, SupervisorError> {
        if self.config.tcpdump_bin.as_os_str().is_empty() {
            return Err(SupervisorError::InvalidCommand(
                "capture binary path is empty".to_string(),
            ));
        }
        if self.config.interface.is_empty() {
            return Err(SupervisorError::InvalidCommand(
                "capture interface is empty".to_string(),
            ));
        }
        if filename.is_empty() {
            return Err(SupervisorError::InvalidCommand(
                "capture filename is empty".to_string(),
            ));
        }

        let out_path = self.config.out_dir.join(filename);

        let mut command = Command::new(&self.config.tcpdump_bin);
        command
            .arg("-i")
            .arg(&self.config.interface)
            .arg("-w")
            .arg(&out_path)
            .arg("-s")
            .arg(self.config.cap_size.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        command.process_group(0);

        Ok(command)
    }
}
