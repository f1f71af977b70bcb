//! In-memory collaborators for unit tests.
//!
//! Each fake records what it was asked to do so tests can assert on call order
//! and arguments. Filesystem-facing fakes operate on a real temp directory.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use grd_protocol::{
	Annotation, AnnotationSource, CorrectionRound, CorrectorId, ExerciseId, GradingConfig, ItemId, ItemRef, Lock, LockRequest, LockedItem,
	MirroredContent, RepositoryLocation, TransportKind,
};
use grd_runtime::{ImportSubsystem, PanelState, SignalSink};
use parking_lot::Mutex;

use crate::collaborators::{Autograder, FileSurface, LockService, MirrorTransport, Notifier, Toolchain, ToolchainRegistry, WorkspaceTracking};
use crate::error::{GradeError, Result};
use crate::notice::{Notice, NoticeLevel};

/// Shared, ordered log of collaborator calls.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
	pub fn record(&self, entry: impl Into<String>) {
		self.0.lock().push(entry.into());
	}

	pub fn entries(&self) -> Vec<String> {
		self.0.lock().clone()
	}

	/// Index of the first entry starting with `prefix`.
	pub fn position(&self, prefix: &str) -> Option<usize> {
		self.0.lock().iter().position(|entry| entry.starts_with(prefix))
	}

	pub fn count(&self, prefix: &str) -> usize {
		self.0.lock().iter().filter(|entry| entry.starts_with(prefix)).count()
	}
}

pub fn annotation(id: &str, source: AnnotationSource) -> Annotation {
	Annotation {
		id: id.to_string(),
		source,
		path: None,
		message: None,
	}
}

pub fn sample_item(item: u64, annotations: Vec<Annotation>) -> LockedItem {
	LockedItem {
		lock: Lock {
			item_id: ItemId(item),
			corrector_id: CorrectorId::new("tutor"),
			round: CorrectionRound::First,
		},
		exercise_id: ExerciseId(1),
		repository: RepositoryLocation {
			ssh_url: format!("ssh://git@vcs.test/ex1/item{item}.git"),
			https_url: format!("https://vcs.test/ex1/item{item}.git"),
		},
		annotations,
		submitted_at: None,
	}
}

/// Filesystem surface backed by the real filesystem.
#[derive(Debug, Default)]
pub struct RecordingSurface {
	journal: Journal,
	open_files: Mutex<Vec<PathBuf>>,
	failing: Mutex<HashSet<PathBuf>>,
}

impl RecordingSurface {
	pub fn new(journal: Journal) -> Arc<Self> {
		Arc::new(Self {
			journal,
			..Self::default()
		})
	}

	pub fn open(&self, path: impl Into<PathBuf>) {
		self.open_files.lock().push(path.into());
	}

	pub fn fail_deleting(&self, path: impl Into<PathBuf>) {
		self.failing.lock().insert(path.into());
	}
}

impl FileSurface for RecordingSurface {
	fn list_open_files(&self) -> Vec<PathBuf> {
		self.open_files.lock().clone()
	}

	fn close_file(&self, path: &Path) {
		self.journal.record(format!("close:{}", path.display()));
		self.open_files.lock().retain(|open| open != path);
	}

	fn find_file(&self, path: &Path) -> Option<PathBuf> {
		path.exists().then(|| path.to_path_buf())
	}

	fn delete_file(&self, path: &Path) -> std::io::Result<()> {
		if self.failing.lock().contains(path) {
			self.journal.record(format!("delete-failed:{}", path.display()));
			return Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked by test"));
		}
		self.journal.record(format!("delete:{}", path.display()));
		if path.is_dir() {
			std::fs::remove_dir(path)
		} else {
			std::fs::remove_file(path)
		}
	}

	fn mark_dirty_and_refresh(&self, root: &Path) {
		self.journal.record(format!("refresh:{}", root.display()));
	}
}

#[derive(Debug)]
pub struct RecordingTracking {
	journal: Journal,
}

impl RecordingTracking {
	pub fn new(journal: Journal) -> Arc<Self> {
		Arc::new(Self { journal })
	}
}

impl WorkspaceTracking for RecordingTracking {
	fn set_tracked_directories(&self, directories: &[PathBuf]) {
		self.journal.record(format!("tracking:set:{}", directories.len()));
	}

	fn notify_mappings_changed(&self) {
		self.journal.record("tracking:notify");
	}

	fn force_reconcile(&self) {
		self.journal.record("tracking:reconcile");
	}
}

/// Scripted reply of the fake lock service.
#[derive(Debug, Clone)]
pub enum LockReply {
	Item(LockedItem),
	Empty,
	Network,
	Malformed,
	MoreRecent,
}

impl LockReply {
	fn into_result(self) -> Result<Option<LockedItem>> {
		match self {
			Self::Item(item) => Ok(Some(item)),
			Self::Empty => Ok(None),
			Self::Network => Err(GradeError::network("service unavailable")),
			Self::Malformed => Err(GradeError::Serialization("unexpected payload".to_string())),
			Self::MoreRecent => Err(GradeError::MoreRecentSubmission(ItemId(0))),
		}
	}
}

#[derive(Debug, Default)]
pub struct FakeLockService {
	journal: Journal,
	next: Mutex<VecDeque<LockReply>>,
	existing: Mutex<VecDeque<LockReply>>,
	fail_mutations: AtomicBool,
	fail_cancel: AtomicBool,
}

impl FakeLockService {
	pub fn new(journal: Journal) -> Arc<Self> {
		Arc::new(Self {
			journal,
			..Self::default()
		})
	}

	pub fn push_next(&self, reply: LockReply) {
		self.next.lock().push_back(reply);
	}

	pub fn push_existing(&self, reply: LockReply) {
		self.existing.lock().push_back(reply);
	}

	/// Makes submit, save and cancel fail with a network error.
	pub fn fail_mutations(&self) {
		self.fail_mutations.store(true, Ordering::SeqCst);
	}

	pub fn fail_cancel(&self) {
		self.fail_cancel.store(true, Ordering::SeqCst);
	}

	fn mutate(&self, verb: &str, item: &LockedItem) -> Result<()> {
		self.journal.record(format!("lock:{verb}:{}", item.item_id()));
		let failing = self.fail_mutations.load(Ordering::SeqCst) || (verb == "cancel" && self.fail_cancel.load(Ordering::SeqCst));
		if failing {
			return Err(GradeError::network(format!("{verb} rejected")));
		}
		Ok(())
	}
}

#[async_trait]
impl LockService for FakeLockService {
	async fn try_lock_next(&self, request: &LockRequest, _config: &GradingConfig) -> Result<Option<LockedItem>> {
		self.journal.record(format!("lock:next:{}", request.exercise_id));
		self.next.lock().pop_front().unwrap_or(LockReply::Empty).into_result()
	}

	async fn try_lock(&self, item: &ItemRef, _config: &GradingConfig) -> Result<Option<LockedItem>> {
		self.journal.record(format!("lock:existing:{}", item.item_id));
		self.existing.lock().pop_front().unwrap_or(LockReply::Empty).into_result()
	}

	async fn submit(&self, item: &LockedItem) -> Result<()> {
		self.mutate("submit", item)
	}

	async fn save(&self, item: &LockedItem) -> Result<()> {
		self.mutate("save", item)
	}

	async fn cancel(&self, item: &LockedItem) -> Result<()> {
		self.mutate("cancel", item)
	}
}

/// Transport that writes a tiny project into the destination.
#[derive(Debug, Default)]
pub struct FakeTransport {
	journal: Journal,
	fail: AtomicBool,
	malformed: AtomicBool,
}

impl FakeTransport {
	pub fn new(journal: Journal) -> Arc<Self> {
		Arc::new(Self {
			journal,
			..Self::default()
		})
	}

	pub fn fail(&self) {
		self.fail.store(true, Ordering::SeqCst);
	}

	/// Makes the clone fail as if the repository metadata could not be parsed.
	pub fn fail_malformed(&self) {
		self.malformed.store(true, Ordering::SeqCst);
	}
}

#[async_trait]
impl MirrorTransport for FakeTransport {
	fn kind(&self) -> TransportKind {
		TransportKind::Token
	}

	async fn mirror_into(&self, item: &LockedItem, destination: &Path) -> Result<MirroredContent> {
		self.journal.record(format!("clone:{}", item.item_id()));
		if self.fail.load(Ordering::SeqCst) {
			return Err(GradeError::Clone("repository not found".to_string()));
		}
		if self.malformed.load(Ordering::SeqCst) {
			return Err(GradeError::Serialization("unexpected repository descriptor".to_string()));
		}
		let sources = destination.join("src");
		std::fs::create_dir_all(&sources).map_err(|err| GradeError::filesystem(&sources, err))?;
		for (path, contents) in [
			(destination.join("pom.xml"), "<project/>"),
			(sources.join("Main.java"), "class Main {}"),
		] {
			std::fs::write(&path, contents).map_err(|err| GradeError::filesystem(&path, err))?;
		}
		Ok(MirroredContent {
			root: destination.to_path_buf(),
			revision: Some("abc123".to_string()),
		})
	}
}

/// Import subsystem that reports both signals as soon as it is triggered.
#[derive(Debug)]
pub struct InstantImport {
	signals: SignalSink,
	registrations: AtomicUsize,
}

impl InstantImport {
	pub fn new(signals: SignalSink) -> Arc<Self> {
		Arc::new(Self {
			signals,
			registrations: AtomicUsize::new(0),
		})
	}

	pub fn registrations(&self) -> usize {
		self.registrations.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl ImportSubsystem for InstantImport {
	async fn register_project_files(&self, _root: &Path) -> grd_runtime::Result<()> {
		self.registrations.fetch_add(1, Ordering::SeqCst);
		self.signals.import_completed();
		self.signals.project_resolved();
		Ok(())
	}

	fn panel(&self) -> Option<PanelState> {
		Some(PanelState { visible: false })
	}

	fn hide_panel(&self) {}
}

#[derive(Debug, Default)]
pub struct CountingAutograder {
	runs: AtomicUsize,
}

impl CountingAutograder {
	pub fn runs(&self) -> usize {
		self.runs.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Autograder for CountingAutograder {
	async fn run(&self, _item: &LockedItem, _workspace: &Path) -> Result<()> {
		self.runs.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

#[derive(Debug, Default)]
pub struct FakeToolchains {
	current: Mutex<Option<Toolchain>>,
	available: Vec<Toolchain>,
	selected: Mutex<Vec<Toolchain>>,
}

impl FakeToolchains {
	pub fn new(current: Option<Toolchain>, available: Vec<Toolchain>) -> Arc<Self> {
		Arc::new(Self {
			current: Mutex::new(current),
			available,
			selected: Mutex::new(Vec::new()),
		})
	}

	pub fn selected(&self) -> Vec<Toolchain> {
		self.selected.lock().clone()
	}
}

impl ToolchainRegistry for FakeToolchains {
	fn current(&self) -> Option<Toolchain> {
		self.current.lock().clone()
	}

	fn available(&self) -> Vec<Toolchain> {
		self.available.clone()
	}

	fn select(&self, toolchain: &Toolchain) {
		*self.current.lock() = Some(toolchain.clone());
		self.selected.lock().push(toolchain.clone());
	}
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
	notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
	pub fn notices(&self) -> Vec<Notice> {
		self.notices.lock().clone()
	}

	pub fn titles(&self) -> Vec<String> {
		self.notices.lock().iter().map(|notice| notice.title.clone()).collect()
	}

	pub fn has(&self, level: NoticeLevel, title: &str) -> bool {
		self.notices.lock().iter().any(|notice| notice.level == level && notice.title == title)
	}
}

impl Notifier for RecordingNotifier {
	fn notify(&self, notice: Notice) {
		self.notices.lock().push(notice);
	}
}
