//! Lifecycle controller for exclusive grading sessions.
//!
//! A grading session locks one remote work item, mirrors it into a local
//! workspace, waits until the workspace finished importing and finally
//! releases the lock and empties the workspace again.
//!
//! # Quick Start
//!
//! ```ignore
//! use grd::{Collaborators, SessionController, Settings};
//! use grd_protocol::{CorrectionRound, EndAction, ExerciseId, LockRequest};
//! use grd_runtime::Dispatcher;
//!
//! let settings = Settings::load(None)?;
//! let controller = SessionController::new(&settings, collaborators, Dispatcher::spawn()?);
//! controller.add_listener(|event| println!("{event:?}"));
//!
//! controller.start(LockRequest { exercise_id: ExerciseId(3), round: CorrectionRound::First }).await;
//! controller.end(EndAction::Submit).await;
//! ```
//!
//! # Modules
//!
//! * [`controller`]: start, reopen, end and cleanup of the single session
//! * [`lock`]: lock acquisition and the rule that keeps locks with manual work
//! * [`workspace`]: provisioning and best-effort cleanup of the workspace
//! * [`listeners`]: session events and their observers
//! * [`collaborators`]: traits for the lock service, transport, editor surface and friends

pub mod collaborators;
pub mod config;
pub mod controller;
pub mod error;
pub mod finalize;
pub mod listeners;
pub mod lock;
pub mod notice;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use collaborators::{Autograder, FileSurface, LockService, MirrorTransport, Notifier, Toolchain, ToolchainRegistry, WorkspaceTracking};
pub use config::{MonitorSettings, SETTINGS_SCHEMA_VERSION, Settings};
pub use controller::{Collaborators, EndOutcome, SessionController, StartOutcome};
pub use error::{ErrorKind, GradeError, Result};
pub use finalize::{FinalizeOutcome, ToolchainFinalizer};
pub use listeners::{ListenerId, ListenerRegistry, SessionEvent, SessionSnapshot};
pub use lock::{AcquireRequest, LockLifecycle, OrphanOutcome, should_auto_cancel};
pub use notice::{Notice, NoticeLevel, TracingNotifier};
pub use workspace::{CleanupReport, WorkspaceCleanup, WorkspaceHandle, WorkspaceProvisioner};
