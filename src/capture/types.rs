//! Core types used by the capture subsystem.

use chrono::{DateTime, Utc};
use nix::unistd::Pid;
use tokio::sync::mpsc::Sender;

use crate::error_handling::types::SupervisorError;

/// Record of the capture process currently owned by the supervisor.
///
/// The `tokio::process::Child` itself lives in the exit-waiter task; the
/// supervisor keeps only what it needs to identify and signal the process.
/// The handle exists exactly from spawn success until the completion event
/// is observed.
#[derive(Debug)]
pub struct CaptureHandle {
    /// Output filename of this capture session, also its retrieval key.
    pub filename: String,
    /// Pid of the capture process; equal to its process group id since the
    /// child is started in its own group.
    pub pid: Pid,
    /// Spawn timestamp.
    pub started_at: DateTime<Utc>,
}

/// Cloneable sender half handed to the HTTP boundary.
///
/// Both channels are bounded to capacity 1: one request can queue without
/// blocking the issuer, a burst beyond that blocks the HTTP handler until
/// the supervisor drains its queue.
#[derive(Clone)]
pub struct CaptureControl {
    start_tx: Sender<String>,
    stop_tx: Sender<()>,
}

impl CaptureControl {
    pub(crate) fn new(start_tx: Sender<String>, stop_tx: Sender<()>) -> Self {
        Self { start_tx, stop_tx }
    }

    /// Requests a capture start writing to `filename`.
    ///
    /// Delivery only; whether a capture actually starts is decided by the
    /// supervisor (a start while one is running is ignored).
    pub async fn start(&self, filename: String) -> Result<(), SupervisorError> {
        self.start_tx
            .send(filename)
            .await
            .map_err(|_| SupervisorError::ChannelClosed)
    }

    /// Requests termination of the running capture, if any.
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        self.stop_tx
            .send(())
            .await
            .map_err(|_| SupervisorError::ChannelClosed)
    }
}

/// Generates a capture filename from the current nanosecond timestamp,
/// hex-encoded with a `.pcap` extension.
///
/// Uniqueness is probabilistic: two calls within the same nanosecond would
/// collide, which does not happen in practice within one process.
pub fn unique_capture_name() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{:x}.pcap", nanos)
}
