//! Session controller: the single owner of the active grading session.
//!
//! Every public entry point takes the session slot for its whole duration, so
//! `start`, `reopen`, `end` and `cleanup` never interleave. None of them
//! returns an error. Failures are reported through notices and the returned
//! outcome, and the controller is always left either with an `Active` session
//! or with none at all.
//!
//! # Lifecycle
//!
//! ```text
//! Idle -> Provisioning -> Active -> Finalizing -> Closed -> (cleared) Idle
//!              \-> (failed, lock cancelled or kept) -> Idle
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use grd_protocol::{EndAction, ItemRef, LockRequest, LockedItem, SessionState};
use grd_runtime::{Dispatcher, ImportSubsystem, InitializationMonitor, SignalSink};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::collaborators::{Autograder, FileSurface, LockService, MirrorTransport, Notifier, ToolchainRegistry, WorkspaceTracking};
use crate::config::Settings;
use crate::error::{ErrorKind, GradeError};
use crate::finalize::ToolchainFinalizer;
use crate::listeners::{ListenerId, ListenerRegistry, SessionEvent, SessionSnapshot};
use crate::lock::{AcquireRequest, LockLifecycle};
use crate::notice::Notice;
use crate::workspace::{CleanupReport, WorkspaceCleanup, WorkspaceHandle, WorkspaceProvisioner};


/// Services the controller drives.
pub struct Collaborators {
	pub lock_service: Arc<dyn LockService>,
	pub transport: Arc<dyn MirrorTransport>,
	pub tracking: Arc<dyn WorkspaceTracking>,
	pub surface: Arc<dyn FileSurface>,
	pub import: Arc<dyn ImportSubsystem>,
	/// Sink the import subsystem reports its completion signals to.
	pub signals: SignalSink,
	pub toolchains: Option<Arc<dyn ToolchainRegistry>>,
	pub autograder: Option<Arc<dyn Autograder>>,
	pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
	Started(SessionSnapshot),
	/// No unlocked item is left for the request.
	NothingToGrade,
	/// The item to reopen is locked by someone else.
	LockTaken,
	/// A session is already active.
	Busy,
	Failed(ErrorKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndOutcome {
	NoSession,
	Finished {
		action: EndAction,
		/// Set when the remote submit, save or cancel failed. Cleanup ran regardless.
		mutation_error: Option<ErrorKind>,
	},
}

struct Session {
	item: LockedItem,
	workspace: WorkspaceHandle,
	snapshot: SessionSnapshot,
}

pub struct SessionController {
	slot: Mutex<Option<Session>>,
	current: RwLock<Option<SessionSnapshot>>,
	listeners: Arc<ListenerRegistry>,
	lock: LockLifecycle,
	cleanup: WorkspaceCleanup,
	provisioner: WorkspaceProvisioner,
	monitor: InitializationMonitor,
	autograder: Option<Arc<dyn Autograder>>,
	notifier: Arc<dyn Notifier>,
}

impl SessionController {
	pub fn new(settings: &Settings, collaborators: Collaborators, dispatcher: Dispatcher) -> Self {
		let Collaborators {
			lock_service,
			transport,
			tracking,
			surface,
			import,
			signals,
			toolchains,
			autograder,
			notifier,
		} = collaborators;

		let monitor = InitializationMonitor::new(import, signals, dispatcher.clone(), settings.monitor_config());
		let cleanup = WorkspaceCleanup::new(Arc::clone(&surface), tracking, dispatcher.clone());
		let mut provisioner = WorkspaceProvisioner::new(
			settings.workspace_root.clone(),
			cleanup.clone(),
			transport,
			surface,
			dispatcher.clone(),
			monitor.clone(),
		)
		.with_profile(settings.workspace_profile.clone());
		if let Some(registry) = toolchains {
			provisioner = provisioner.with_finalizer(ToolchainFinalizer::new(registry, dispatcher, settings.toolchain_target));
		}

		Self {
			slot: Mutex::new(None),
			current: RwLock::new(None),
			listeners: Arc::new(ListenerRegistry::new()),
			lock: LockLifecycle::new(lock_service, settings.grading_config.clone(), Arc::clone(&notifier)),
			cleanup,
			provisioner,
			monitor,
			autograder: if settings.autograder { autograder } else { None },
			notifier,
		}
	}

	/// Registers a callback for every session event. Callbacks run on the
	/// task that changed the state and must not block.
	pub fn add_listener<F>(&self, listener: F) -> ListenerId
	where
		F: Fn(&SessionEvent) + Send + Sync + 'static,
	{
		self.listeners.add(listener)
	}

	pub fn state(&self) -> SessionState {
		self.current.read().as_ref().map_or(SessionState::Idle, |snapshot| snapshot.state)
	}

	pub fn current(&self) -> Option<SessionSnapshot> {
		self.current.read().clone()
	}

	pub fn workspace_root(&self) -> &Path {
		self.provisioner.root()
	}

	pub fn monitor(&self) -> &InitializationMonitor {
		&self.monitor
	}

	/// Locks the next item of an exercise and opens it.
	pub async fn start(&self, request: LockRequest) -> StartOutcome {
		self.begin(AcquireRequest::Next(request)).await
	}

	/// Locks a previously graded item again and opens it.
	pub async fn reopen(&self, item: ItemRef) -> StartOutcome {
		self.begin(AcquireRequest::Existing(item)).await
	}

	async fn begin(&self, request: AcquireRequest) -> StartOutcome {
		let mut slot = self.slot.lock().await;
		if let Some(active) = slot.as_ref() {
			warn!(target = "grd.session", item = %active.item.item_id(), "refusing to start, session already active");
			self.notifier.notify(Notice::error(
				"Finish the current assessment first",
				"Close the active assessment before starting another one.",
			));
			return StartOutcome::Busy;
		}

		self.monitor.cancel();
		let fresh = matches!(request, AcquireRequest::Next(_));

		let item = match self.lock.acquire(&request).await {
			Ok(Some(item)) => item,
			Ok(None) if fresh => {
				self.notifier.notify(Notice::info(
					"No more submissions",
					"Every submission of this exercise is graded or locked by someone else.",
				));
				return StartOutcome::NothingToGrade;
			}
			Ok(None) => {
				self.notifier.notify(Notice::warning(
					"Could not reopen assessment",
					"Most likely, your lock has been taken by someone else.",
				));
				return StartOutcome::LockTaken;
			}
			Err(err) => {
				error!(target = "grd.session", error = %err, "could not acquire lock");
				self.notifier.notify(acquire_failure_notice(&err));
				return StartOutcome::Failed(err.kind());
			}
		};

		let item_id = item.item_id();
		let provisioning = SessionSnapshot {
			item: item_id,
			exercise: item.exercise_id,
			round: item.round(),
			workspace_root: self.provisioner.root().to_path_buf(),
			state: SessionState::Provisioning,
			started_at: SystemTime::now(),
		};
		self.publish(provisioning.clone());

		let listeners = Arc::clone(&self.listeners);
		let provisioned = self
			.provisioner
			.provision(&item, move || async move {
				info!(target = "grd.session", item = %item_id, "environment ready");
				listeners.notify(&SessionEvent::EnvironmentReady(item_id));
			})
			.await;

		let workspace = match provisioned {
			Ok(workspace) => workspace,
			Err(err) => {
				error!(target = "grd.session", item = %item_id, error = %err, "provisioning failed");
				self.notifier.notify(provisioning_failure_notice(&err));
				self.monitor.cancel();
				let outcome = self.lock.abandon_after_failure(&item).await;
				debug!(target = "grd.session", item = %item_id, ?outcome, "lock handled after failed start");
				if let Err(err) = self.cleanup.cleanup(self.provisioner.root()).await {
					warn!(target = "grd.session", error = %err, "could not clean workspace after failed start");
				}
				self.clear();
				return StartOutcome::Failed(err.kind());
			}
		};

		let active = provisioning.with_state(SessionState::Active);
		self.publish(active.clone());
		info!(
			target = "grd.session",
			item = %item_id,
			root = %workspace.root.display(),
			reopened = !fresh,
			"session active"
		);

		if fresh {
			self.kick_off_autograder(&item, &workspace);
			self.notifier
				.notify(Notice::info("Assessment started", "You can now grade the submission."));
		} else {
			self.notifier
				.notify(Notice::info("Assessment reopened", "You can continue grading the submission."));
		}

		*slot = Some(Session {
			item,
			workspace,
			snapshot: active.clone(),
		});
		StartOutcome::Started(active)
	}

	fn kick_off_autograder(&self, item: &LockedItem, workspace: &WorkspaceHandle) {
		if !item.annotations.is_empty() {
			self.notifier.notify(Notice::info(
				"Skipping autograder",
				"The submission already has annotations. Run the autograder manually to re-run it.",
			));
			return;
		}
		let Some(autograder) = self.autograder.clone() else {
			debug!(target = "grd.session", "no autograder configured");
			return;
		};

		let notifier = Arc::clone(&self.notifier);
		let item = item.clone();
		let root = workspace.root.clone();
		tokio::spawn(async move {
			info!(target = "grd.session", item = %item.item_id(), "running autograder");
			if let Err(err) = autograder.run(&item, &root).await {
				warn!(target = "grd.session", item = %item.item_id(), error = %err, "autograder failed");
				notifier.notify(Notice::warning("Autograder failed", err.to_string()));
			}
		});
	}

	/// Ends the active session with `action`, then cleans the workspace.
	pub async fn end(&self, action: EndAction) -> EndOutcome {
		let mut slot = self.slot.lock().await;
		let Some(session) = slot.as_mut() else {
			debug!(target = "grd.session", %action, "no session to end");
			self.notifier
				.notify(Notice::error("No active assessment", "Start or reopen an assessment first."));
			return EndOutcome::NoSession;
		};

		session.snapshot = session.snapshot.with_state(SessionState::Finalizing);
		self.publish(session.snapshot.clone());
		info!(target = "grd.session", item = %session.item.item_id(), "{} assessment", action.progressive());

		let mut mutation_error = None;
		if let Some(mode) = action.release_mode() {
			match self.lock.release(&session.item, mode).await {
				Ok(()) if action == EndAction::Save => {
					self.notifier.notify(Notice::info("Assessment saved", "Your grading was saved and the lock is kept."));
				}
				Ok(()) => {}
				Err(err) => {
					error!(target = "grd.session", item = %session.item.item_id(), %action, error = %err, "remote update failed");
					self.notifier.notify(Notice::error(
						format!("Could not {action} assessment"),
						mutation_failure_body(&err),
					));
					mutation_error = Some(err.kind());
				}
			}
		}

		self.close(&mut slot).await;
		EndOutcome::Finished { action, mutation_error }
	}

	/// Drops the active session and empties the workspace. Idempotent.
	pub async fn cleanup(&self) -> Option<CleanupReport> {
		let mut slot = self.slot.lock().await;
		self.close(&mut slot).await
	}

	async fn close(&self, slot: &mut Option<Session>) -> Option<CleanupReport> {
		let Some(session) = slot.take() else {
			debug!(target = "grd.session", "cleanup requested without a session");
			return None;
		};

		self.monitor.cancel();
		let report = match self.cleanup.cleanup(&session.workspace.root).await {
			Ok(report) => report,
			Err(err) => {
				warn!(target = "grd.session", error = %err, "workspace cleanup did not run");
				CleanupReport::default()
			}
		};

		self.publish(session.snapshot.with_state(SessionState::Closed));
		self.clear();
		info!(target = "grd.session", item = %session.item.item_id(), deleted = report.deleted.len(), "session closed");
		Some(report)
	}

	fn publish(&self, snapshot: SessionSnapshot) {
		debug!(target = "grd.session", item = %snapshot.item, state = %snapshot.state, "session transition");
		*self.current.write() = Some(snapshot.clone());
		self.listeners.notify(&SessionEvent::Transition(snapshot));
	}

	fn clear(&self) {
		*self.current.write() = None;
		self.listeners.notify(&SessionEvent::Cleared);
	}
}

const SERIOUS_BUG: &str = "This is a serious bug, please report it together with the log.";

fn acquire_failure_notice(err: &GradeError) -> Notice {
	match err {
		GradeError::MoreRecentSubmission(item) => Notice::error(
			"More recent submission",
			format!("Item {item} has a newer submission than the one that was graded. Start a new assessment instead."),
		),
		GradeError::Serialization(_) => Notice::error("Could not lock assessment", format!("{SERIOUS_BUG} ({err})")),
		_ => Notice::error("Could not lock assessment", err.to_string()),
	}
}

fn provisioning_failure_notice(err: &GradeError) -> Notice {
	match err {
		GradeError::Clone(_) | GradeError::Network(_) => Notice::error("Error cloning submission", err.to_string()),
		GradeError::Serialization(_) => Notice::error("Could not open assessment", format!("{SERIOUS_BUG} ({err})")),
		_ if err.is_user_facing() => Notice::error("Could not open assessment", err.to_string()),
		_ => Notice::error("Could not open assessment", "The workspace could not be prepared. See the log for details."),
	}
}

fn mutation_failure_body(err: &GradeError) -> String {
	match err {
		GradeError::Serialization(_) => format!("{SERIOUS_BUG} ({err})"),
		_ => err.to_string(),
	}
}
