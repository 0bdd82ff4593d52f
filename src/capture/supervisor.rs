//! The capture lifecycle supervisor.
//!
//! A single control task owns the active capture slot and reacts to three
//! event sources: start requests, stop requests, and completion
//! notifications from the exit-waiter task. Processing one event at a time
//! is the only mutual exclusion the slot needs.

use std::process::ExitStatus;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::capture::launcher::CaptureLauncher;
use crate::capture::signal::{GroupSignaler, NixSignaler};
use crate::capture::types::{CaptureControl, CaptureHandle};
use crate::configuration::config::CaptureConfig;
use crate::error_handling::types::SupervisorError;

/// Bound for each event channel. One request can queue while the control
/// task is busy; further senders block until it drains.
const EVENT_QUEUE_DEPTH: usize = 1;

/// Control loop owning the state of the single capture process.
///
/// State machine: `Idle` (no handle) -> `Running` (handle present) ->
/// `Idle` again, where only a completion event performs the transition
/// back. A stop request is advisory; it signals the process group and
/// leaves the slot untouched until the process has actually exited.
pub struct Supervisor {
    launcher: CaptureLauncher,
    signaler: Arc<dyn GroupSignaler>,
    active: Option<CaptureHandle>,
    start_rx: Receiver<String>,
    stop_rx: Receiver<()>,
    done_rx: Receiver<std::io::Result<ExitStatus>>,
    done_tx: Sender<std::io::Result<ExitStatus>>,
}

impl Supervisor {
    /// Creates a supervisor and the control half used by the HTTP boundary.
    pub fn new(config: CaptureConfig) -> (Self, CaptureControl) {
        Self::with_signaler(config, Arc::new(NixSignaler))
    }

    /// Same as [`Supervisor::new`] with a caller-provided signaling backend.
    pub fn with_signaler(
        config: CaptureConfig,
        signaler: Arc<dyn GroupSignaler>,
    ) -> (Self, CaptureControl) {
        let (start_tx, start_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let (stop_tx, stop_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let (done_tx, done_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);

        let supervisor = Supervisor {
            launcher: CaptureLauncher::new(config),
            signaler,
            active: None,
            start_rx,
            stop_rx,
            done_rx,
            done_tx,
        };

        (supervisor, CaptureControl::new(start_tx, stop_tx))
    }

    /// Runs the control loop until every control sender is dropped.
    ///
    /// A spawn failure is fatal and surfaces as an `Err`; the caller is
    /// expected to halt the whole process on it.
    pub async fn run(mut self) -> Result<(), SupervisorError> {
        info!("Capture supervisor started");
        loop {
            tokio::select! {
                request = self.start_rx.recv() => match request {
                    Some(filename) => self.handle_start(filename)?,
                    None => break,
                },
                request = self.stop_rx.recv() => match request {
                    Some(()) => self.handle_stop(),
                    None => break,
                },
                outcome = self.done_rx.recv() => {
                    if let Some(outcome) = outcome {
                        self.handle_done(outcome);
                    }
                }
            }
        }
        info!("Capture supervisor stopped");
        Ok(())
    }

    /// Start event: spawn the capture process unless one is already running.
    fn handle_start(&mut self, filename: String) -> Result<(), SupervisorError> {
        info!("Received start request for {}", filename);

        if let Some(handle) = &self.active {
            warn!(
                "Capture {} already running, ignoring start request for {}",
                handle.filename, filename
            );
            return Ok(());
        }

        let mut command = self.launcher.command(&filename)?;
        let mut child = command.spawn().map_err(SupervisorError::SpawnFailed)?;

        let pid = match child.id() {
            Some(raw) => Pid::from_raw(raw as i32),
            None => {
                return Err(SupervisorError::SpawnFailed(std::io::Error::other(
                    "spawned capture process has no pid",
                )))
            }
        };

        // Exit-waiter task: the only code path delivering completion events.
        let done_tx = self.done_tx.clone();
        tokio::spawn(async move {
            let _ = done_tx.send(child.wait().await).await;
        });

        info!("Started capture {} (pid {})", filename, pid);
        self.active = Some(CaptureHandle {
            filename,
            pid,
            started_at: Utc::now(),
        });
        Ok(())
    }

    /// Stop event: signal the process group of the running capture.
    ///
    /// The slot is not cleared here; the process is gone only once the
    /// exit-waiter reports completion.
    fn handle_stop(&mut self) {
        info!("Received stop request");

        let Some(handle) = &self.active else {
            debug!("No capture running, ignoring stop request");
            return;
        };

        match self.signaler.group_of(handle.pid) {
            Ok(pgid) => {
                if let Err(e) = self.signaler.signal_group(pgid, Signal::SIGTERM) {
                    warn!("Failed to signal capture process group {}: {}", pgid, e);
                }
            }
            Err(e) => {
                warn!(
                    "Could not resolve process group for capture pid {}: {}",
                    handle.pid, e
                );
            }
        }
    }

    /// Completion event: clear the slot whatever the exit outcome was.
    fn handle_done(&mut self, outcome: std::io::Result<ExitStatus>) {
        match outcome {
            Ok(status) if status.success() => info!("Capture process exited cleanly"),
            Ok(status) => warn!("Capture process exited abnormally: {}", status),
            Err(e) => warn!("Failed waiting on capture process: {}", e),
        }

        match self.active.take() {
            Some(handle) => info!("Capture {} finished, slot cleared", handle.filename),
            None => debug!("Completion event with no active capture"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::os::unix::process::ExitStatusExt;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_test::assert_ok;

    /// Records every group signal instead of delivering it.
    #[derive(Default)]
    struct RecordingSignaler {
        calls: Mutex<Vec<(Pid, Signal)>>,
    }

    impl GroupSignaler for RecordingSignaler {
        fn group_of(&self, pid: Pid) -> Result<Pid, SupervisorError> {
            Ok(pid)
        }

        fn signal_group(&self, pgid: Pid, signal: Signal) -> Result<(), SupervisorError> {
            self.calls.lock().unwrap().push((pgid, signal));
            Ok(())
        }
    }

    struct FailingSignaler;

    impl GroupSignaler for FailingSignaler {
        fn group_of(&self, _pid: Pid) -> Result<Pid, SupervisorError> {
            Err(SupervisorError::SignalFailed("no such process".to_string()))
        }

        fn signal_group(&self, _pgid: Pid, _signal: Signal) -> Result<(), SupervisorError> {
            Err(SupervisorError::SignalFailed("no such group".to_string()))
        }
    }

    /// Config whose "capture tool" is `true`, which exits immediately and
    /// ignores the tcpdump-style arguments.
    fn harmless_config() -> CaptureConfig {
        CaptureConfig {
            tcpdump_bin: PathBuf::from("true"),
            interface: "lo".to_string(),
            out_dir: std::env::temp_dir(),
            cap_size: 100,
            http_port: 9000,
        }
    }

    fn fake_handle(filename: &str, pid: i32) -> CaptureHandle {
        CaptureHandle {
            filename: filename.to_string(),
            pid: Pid::from_raw(pid),
            started_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn stop_while_idle_is_a_no_op() {
        let signaler = Arc::new(RecordingSignaler::default());
        let (mut supervisor, _control) =
            Supervisor::with_signaler(harmless_config(), signaler.clone());

        supervisor.handle_stop();

        assert!(supervisor.active.is_none());
        assert!(signaler.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stop_while_running_signals_the_whole_group_with_sigterm() {
        let signaler = Arc::new(RecordingSignaler::default());
        let (mut supervisor, _control) =
            Supervisor::with_signaler(harmless_config(), signaler.clone());
        supervisor.active = Some(fake_handle("a.pcap", 4242));

        supervisor.handle_stop();

        let calls = signaler.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (pgid, signal) = calls[0];
        assert_eq!(pgid, Pid::from_raw(4242));
        assert_eq!(signal, Signal::SIGTERM);
        assert_eq!(signal as i32, 15);
        drop(calls);

        // Stop never transitions state by itself.
        assert!(supervisor.active.is_some());
    }

    #[tokio::test]
    async fn signal_failure_keeps_the_capture_running() {
        let (mut supervisor, _control) =
            Supervisor::with_signaler(harmless_config(), Arc::new(FailingSignaler));
        supervisor.active = Some(fake_handle("a.pcap", 4242));

        supervisor.handle_stop();

        assert!(supervisor.active.is_some());
    }

    #[tokio::test]
    async fn completion_clears_the_slot_on_clean_exit() {
        let (mut supervisor, _control) =
            Supervisor::with_signaler(harmless_config(), Arc::new(RecordingSignaler::default()));
        supervisor.active = Some(fake_handle("a.pcap", 4242));

        supervisor.handle_done(Ok(ExitStatus::from_raw(0)));

        assert!(supervisor.active.is_none());
    }

    #[tokio::test]
    async fn completion_clears_the_slot_on_abnormal_exit() {
        let (mut supervisor, _control) =
            Supervisor::with_signaler(harmless_config(), Arc::new(RecordingSignaler::default()));
        supervisor.active = Some(fake_handle("a.pcap", 4242));

        // Raw wait status 256 is an exit code of 1.
        supervisor.handle_done(Ok(ExitStatus::from_raw(256)));
        assert!(supervisor.active.is_none());

        supervisor.active = Some(fake_handle("b.pcap", 4243));
        supervisor.handle_done(Err(std::io::Error::other("wait failed")));
        assert!(supervisor.active.is_none());
    }

    #[tokio::test]
    async fn completion_while_idle_is_harmless() {
        let (mut supervisor, _control) =
            Supervisor::with_signaler(harmless_config(), Arc::new(RecordingSignaler::default()));

        supervisor.handle_done(Ok(ExitStatus::from_raw(0)));

        assert!(supervisor.active.is_none());
    }

    #[tokio::test]
    async fn spawn_failure_is_fatal() {
        let mut config = harmless_config();
        config.tcpdump_bin = PathBuf::from("/definitely/not/a/capture/binary");
        let (mut supervisor, _control) =
            Supervisor::with_signaler(config, Arc::new(RecordingSignaler::default()));

        match supervisor.handle_start("a.pcap".to_string()) {
            Err(SupervisorError::SpawnFailed(_)) => {}
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    #[serial]
    async fn start_stop_completion_walks_the_full_state_machine() {
        let signaler = Arc::new(RecordingSignaler::default());
        let (mut supervisor, _control) =
            Supervisor::with_signaler(harmless_config(), signaler.clone());

        // Start("a.pcap") -> Running with a handle for a.pcap.
        supervisor.handle_start("a.pcap".to_string()).unwrap();
        let pid = {
            let handle = supervisor.active.as_ref().expect("capture should be running");
            assert_eq!(handle.filename, "a.pcap");
            handle.pid
        };

        // Start("b.pcap") while running -> ignored, handle unchanged.
        supervisor.handle_start("b.pcap".to_string()).unwrap();
        assert_eq!(
            supervisor.active.as_ref().map(|h| h.filename.as_str()),
            Some("a.pcap")
        );

        // Stop() -> SIGTERM to a.pcap's process group, state unchanged.
        supervisor.handle_stop();
        {
            let calls = signaler.calls.lock().unwrap();
            assert_eq!(calls.as_slice(), &[(pid, Signal::SIGTERM)]);
        }
        assert!(supervisor.active.is_some());

        // Completion -> Idle, handle cleared.
        let outcome = timeout(Duration::from_secs(5), supervisor.done_rx.recv())
            .await
            .expect("completion event should arrive")
            .expect("done channel should stay open");
        supervisor.handle_done(outcome);
        assert!(supervisor.active.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn run_ends_cleanly_when_the_control_half_is_dropped() {
        let (supervisor, control) = Supervisor::new(harmless_config());
        drop(control);

        let result = timeout(Duration::from_secs(5), supervisor.run()).await;
        assert_ok!(result.expect("run should end once senders are gone"));
    }
}
