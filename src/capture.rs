//! Capture lifecycle subsystem.
//!
//! This module owns everything related to the single packet-capture child
//! process: building its command line, supervising its lifecycle through a
//! message-driven control loop, and signaling its process group on stop.
//!
//! Re-exports:
//! - [`Supervisor`]: the control loop owning the active capture slot.
//! - [`CaptureControl`]: cloneable start/stop senders for the HTTP boundary.
//! - [`CaptureLauncher`], [`CaptureHandle`]: command construction and the
//!   record of the running capture.
//! - [`GroupSignaler`], [`NixSignaler`]: the process-group signaling seam.

pub mod launcher;
pub mod signal;
pub mod supervisor;
pub mod types;


pub use launcher::CaptureLauncher;
pub use signal::{GroupSignaler, NixSignaler};
pub use supervisor::Supervisor;
pub use types::{unique_capture_name, CaptureControl, CaptureHandle};
