//! Process-group signaling seam.
//!
//! The supervisor never signals a lone pid: the capture tool may fork
//! helpers, so termination goes to the whole process group. The trait
//! exists so tests can substitute a recording implementation.

use log::debug;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::{getpgid, Pid};

use crate::error_handling::types::SupervisorError;

/// Resolves and signals process groups.
pub trait GroupSignaler: Send + Sync {
    /// Returns the process group id that `pid` belongs to.
    fn group_of(&self, pid: Pid) -> Result<Pid, SupervisorError>;

    /// Delivers `signal` to every process in the group `pgid`.
    fn signal_group(&self, pgid: Pid, signal: Signal) -> Result<(), SupervisorError>;
}

/// Production implementation backed by `getpgid(2)` and `killpg(2)`.
pub struct NixSignaler;

impl GroupSignaler for NixSignaler {
    fn group_of(&self, pid: Pid) -> Result<Pid, SupervisorError> {
        getpgid(Some(pid)).map_err(|e| {
            SupervisorError::SignalFailed(format!("getpgid for pid {} failed: {}", pid, e))
        })
    }

    fn signal_group(&self, pgid: Pid, signal: Signal) -> Result<(), SupervisorError> {
        debug!("sending {} to process group {}", signal, pgid);
        killpg(pgid, signal).map_err(|e| {
            SupervisorError::SignalFailed(format!("killpg for group {} failed: {}", pgid, e))
        })
    }
}
