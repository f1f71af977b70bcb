//! Execution contexts and initialization monitoring for grading sessions.
//!
//! This crate owns the parts of a session that run concurrently with the
//! controller:
//!
//! * [`Dispatcher`]: a single foreground thread for editor-adjacent work and
//!   the tokio blocking pool for filesystem work.
//! * [`InitializationMonitor`]: triggers the external import of a freshly
//!   mirrored workspace and waits until both of its completion signals agree,
//!   forcing a new import when it gets stuck half-done.
//! * [`Convergence`]: the tick-driven state machine behind the monitor.

pub mod convergence;
pub mod dispatcher;
pub mod error;
pub mod monitor;

pub use convergence::{Convergence, ConvergenceState, TickAction};
pub use dispatcher::Dispatcher;
pub use error::{Result, RuntimeError};
pub use monitor::{ImportSubsystem, InitializationMonitor, MonitorConfig, PanelState, ReadyListener, SignalSink};
