//! Local implementations of the session collaborators.
//!
//! Locks live in a roster directory, submissions are cloned with `git` and
//! notices go to the terminal.

pub mod autograder;
pub mod git;
pub mod import;
pub mod notifier;
pub mod roster;
pub mod surface;
pub mod toolchains;

use std::sync::Arc;

use grd::{Autograder, Collaborators, Settings};
use grd_protocol::CorrectorId;
use grd_runtime::SignalSink;

pub use autograder::CommandAutograder;
pub use git::GitTransport;
pub use import::HeadlessImport;
pub use notifier::TerminalNotifier;
pub use roster::DirectoryLockService;
pub use surface::{LocalFileSurface, LoggingTracking};
pub use toolchains::JvmToolchains;

/// Wires the local collaborators for `settings`.
pub fn collaborators(settings: &Settings) -> Collaborators {
	let signals = SignalSink::new();
	let autograder = settings
		.autograder_enabled()
		.then(|| Arc::new(CommandAutograder::new(settings.autograder_command.clone())) as Arc<dyn Autograder>);

	Collaborators {
		lock_service: Arc::new(DirectoryLockService::new(&settings.roster, CorrectorId::new(settings.corrector.clone()))),
		transport: Arc::new(GitTransport::new(settings.transport, settings.vcs_token.clone())),
		tracking: Arc::new(LoggingTracking),
		surface: Arc::new(LocalFileSurface),
		import: Arc::new(HeadlessImport::new(signals.clone())),
		signals,
		toolchains: Some(Arc::new(JvmToolchains::discover(&settings.workspace_root))),
		autograder,
		notifier: Arc::new(TerminalNotifier),
	}
}
