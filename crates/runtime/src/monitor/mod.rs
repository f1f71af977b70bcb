//! Background watcher for the external import subsystem.
//!
//! After a workspace is mirrored, an import subsystem has to index it before
//! the session is usable. The subsystem reports completion through two
//! independent callbacks and sometimes reports only one of them. The monitor
//! triggers the import, polls both signals, forces a fresh import when it is
//! stuck half-done, and invokes one-shot listeners once both signals agree.
//!
//! Only one run is live at a time. [`InitializationMonitor::watch`] cancels
//! every task of the previous run before starting a new one.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, trace, warn};

use crate::convergence::{Convergence, TickAction};
use crate::dispatcher::Dispatcher;
use crate::error::Result;


/// Visibility of the import subsystem's UI panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelState {
	pub visible: bool,
}

/// External subsystem that indexes a mirrored workspace.
///
/// `panel` and `hide_panel` are always called on the foreground context.
/// Completion is reported through the [`SignalSink`] the subsystem was built with.
#[async_trait]
pub trait ImportSubsystem: Send + Sync {
	async fn register_project_files(&self, root: &Path) -> Result<()>;

	/// Returns `None` when the panel does not exist at all.
	fn panel(&self) -> Option<PanelState>;

	fn hide_panel(&self);
}

#[derive(Debug, Default)]
struct SignalFlags {
	expecting: AtomicBool,
	import_completed: AtomicBool,
	project_resolved: AtomicBool,
}

/// Receives the two completion callbacks of the import subsystem.
///
/// Signals only count while a monitor run expects completion.
#[derive(Debug, Clone, Default)]
pub struct SignalSink {
	flags: Arc<SignalFlags>,
}

impl SignalSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn import_completed(&self) {
		if self.flags.expecting.load(Ordering::SeqCst) {
			self.flags.import_completed.store(true, Ordering::SeqCst);
		} else {
			trace!(target = "grd.monitor", "ignoring import completion outside a run");
		}
	}

	pub fn project_resolved(&self) {
		if self.flags.expecting.load(Ordering::SeqCst) {
			self.flags.project_resolved.store(true, Ordering::SeqCst);
		} else {
			trace!(target = "grd.monitor", "ignoring project resolution outside a run");
		}
	}

	/// Current `(import_completed, project_resolved)` pair.
	pub fn observed(&self) -> (bool, bool) {
		(
			self.flags.import_completed.load(Ordering::SeqCst),
			self.flags.project_resolved.load(Ordering::SeqCst),
		)
	}

	pub fn is_expecting(&self) -> bool {
		self.flags.expecting.load(Ordering::SeqCst)
	}

	fn reset(&self) {
		self.flags.import_completed.store(false, Ordering::SeqCst);
		self.flags.project_resolved.store(false, Ordering::SeqCst);
	}

	fn expect(&self, expecting: bool) {
		self.flags.expecting.store(expecting, Ordering::SeqCst);
	}
}

/// Timing of a monitor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
	pub poll_interval: Duration,
	/// How long exactly one signal may be set before the import is forced again.
	pub partial_timeout: Duration,
	/// Delay between convergence and listener dispatch.
	pub settle_delay: Duration,
}

impl Default for MonitorConfig {
	fn default() -> Self {
		Self {
			poll_interval: Duration::from_millis(500),
			partial_timeout: Duration::from_secs(5),
			settle_delay: Duration::from_secs(2),
		}
	}
}

/// Callback invoked once after the next convergence.
pub type ReadyListener = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

enum PanelCheck {
	Quiet,
	Hidden,
	Missing,
}

struct Shared {
	import: Arc<dyn ImportSubsystem>,
	signals: SignalSink,
	dispatcher: Dispatcher,
	config: MonitorConfig,
	generation: AtomicU64,
	tasks: Mutex<Vec<AbortHandle>>,
	listeners: Mutex<Vec<ReadyListener>>,
	retries: AtomicUsize,
	converged: AtomicBool,
}

impl Shared {
	fn is_current(&self, generation: u64) -> bool {
		self.generation.load(Ordering::SeqCst) == generation
	}

	/// Invalidates the running generation and aborts its tasks. Returns the next generation.
	fn abort_running(&self) -> u64 {
		let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
		let tasks = std::mem::take(&mut *self.tasks.lock());
		if !tasks.is_empty() {
			debug!(target = "grd.monitor", count = tasks.len(), "cancelling previous monitor tasks");
		}
		for task in tasks {
			task.abort();
		}
		generation
	}

	fn spawn_trigger(self: &Arc<Self>, generation: u64, root: PathBuf) {
		let shared = Arc::clone(self);
		let handle = tokio::spawn(async move {
			if !shared.is_current(generation) {
				return;
			}
			if let Err(err) = shared.import.register_project_files(&root).await {
				warn!(target = "grd.monitor", root = %root.display(), error = %err, "import trigger failed");
			}
		});
		self.track(handle.abort_handle());
	}

	/// Keeps handles of unfinished tasks only, so retries do not pile up handles.
	fn track(&self, handle: AbortHandle) {
		let mut tasks = self.tasks.lock();
		tasks.retain(|task| !task.is_finished());
		tasks.push(handle);
	}

	fn force_retry(self: &Arc<Self>, generation: u64, root: &Path) {
		if !self.is_current(generation) {
			return;
		}
		self.signals.reset();
		let retries = self.retries.fetch_add(1, Ordering::SeqCst) + 1;
		info!(target = "grd.monitor", root = %root.display(), retries, "forcing workspace import");
		self.spawn_trigger(generation, root.to_path_buf());
	}

	async fn check_panel(&self) -> PanelCheck {
		let import = Arc::clone(&self.import);
		let check = self
			.dispatcher
			.foreground(move || match import.panel() {
				None => PanelCheck::Missing,
				Some(PanelState { visible: true }) => {
					import.hide_panel();
					PanelCheck::Hidden
				}
				Some(_) => PanelCheck::Quiet,
			})
			.await;
		match check {
			Ok(check) => check,
			Err(err) => {
				warn!(target = "grd.monitor", error = %err, "panel check failed");
				PanelCheck::Quiet
			}
		}
	}
}

/// Watches the import subsystem until both completion signals are set.
#[derive(Clone)]
pub struct InitializationMonitor {
	shared: Arc<Shared>,
}

impl InitializationMonitor {
	pub fn new(import: Arc<dyn ImportSubsystem>, signals: SignalSink, dispatcher: Dispatcher, config: MonitorConfig) -> Self {
		Self {
			shared: Arc::new(Shared {
				import,
				signals,
				dispatcher,
				config,
				generation: AtomicU64::new(0),
				tasks: Mutex::new(Vec::new()),
				listeners: Mutex::new(Vec::new()),
				retries: AtomicUsize::new(0),
				converged: AtomicBool::new(false),
			}),
		}
	}

	pub fn config(&self) -> MonitorConfig {
		self.shared.config
	}

	pub fn signals(&self) -> &SignalSink {
		&self.shared.signals
	}

	/// Registers a listener that runs once after the next convergence.
	pub fn add_listener<F, Fut>(&self, listener: F)
	where
		F: FnOnce() -> Fut + Send + 'static,
		Fut: Future<Output = ()> + Send + 'static,
	{
		self.shared.listeners.lock().push(Box::new(move || Box::pin(listener())));
	}

	pub fn pending_listeners(&self) -> usize {
		self.shared.listeners.lock().len()
	}

	/// Number of forced imports in the current run.
	pub fn retry_count(&self) -> usize {
		self.shared.retries.load(Ordering::SeqCst)
	}

	pub fn is_converged(&self) -> bool {
		self.shared.converged.load(Ordering::SeqCst)
	}

	/// Starts a new run for `root`, cancelling the previous one first.
	///
	/// Must be called from within a tokio runtime.
	pub fn watch(&self, root: impl Into<PathBuf>) {
		let root = root.into();
		let generation = self.shared.abort_running();
		self.shared.retries.store(0, Ordering::SeqCst);
		self.shared.converged.store(false, Ordering::SeqCst);

		if !root.exists() {
			warn!(target = "grd.monitor", root = %root.display(), "workspace root missing, not monitoring");
			self.shared.signals.expect(false);
			return;
		}

		self.shared.signals.reset();
		self.shared.signals.expect(true);
		info!(target = "grd.monitor", root = %root.display(), generation, "monitoring workspace import");

		self.shared.spawn_trigger(generation, root.clone());
		let handle = tokio::spawn(run(Arc::clone(&self.shared), generation, root));
		self.shared.track(handle.abort_handle());
	}

	/// Cancels the current run and drops listeners that have not fired yet.
	pub fn cancel(&self) {
		self.shared.abort_running();
		self.shared.signals.expect(false);
		let dropped = std::mem::take(&mut *self.shared.listeners.lock()).len();
		if dropped > 0 {
			debug!(target = "grd.monitor", dropped, "discarded pending ready listeners");
		}
	}
}

async fn run(shared: Arc<Shared>, generation: u64, root: PathBuf) {
	let mut convergence = Convergence::new(shared.config.partial_timeout);

	loop {
		sleep(shared.config.poll_interval).await;
		if !shared.is_current(generation) {
			return;
		}

		match shared.check_panel().await {
			PanelCheck::Missing => {
				debug!(target = "grd.monitor", "import panel missing");
				shared.force_retry(generation, &root);
				convergence.reset();
				continue;
			}
			PanelCheck::Hidden => trace!(target = "grd.monitor", "hid import panel"),
			PanelCheck::Quiet => {}
		}

		let (import_completed, project_resolved) = shared.signals.observed();
		match convergence.observe(import_completed, project_resolved, Instant::now()) {
			TickAction::Wait => {}
			TickAction::ForceRetry => {
				warn!(
					target = "grd.monitor",
					import_completed,
					project_resolved,
					timeout_ms = shared.config.partial_timeout.as_millis() as u64,
					"import stuck half-done"
				);
				shared.force_retry(generation, &root);
			}
			TickAction::Converged => break,
		}
	}

	shared.signals.expect(false);
	shared.converged.store(true, Ordering::SeqCst);
	info!(target = "grd.monitor", root = %root.display(), retries = shared.retries.load(Ordering::SeqCst), "workspace import converged");

	sleep(shared.config.settle_delay).await;
	if !shared.is_current(generation) {
		return;
	}

	let listeners = std::mem::take(&mut *shared.listeners.lock());
	debug!(target = "grd.monitor", count = listeners.len(), "dispatching ready listeners");
	for listener in listeners {
		listener().await;
	}
}
