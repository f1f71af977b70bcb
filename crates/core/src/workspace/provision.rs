//! Mirrors a locked item into a freshly emptied workspace.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use grd_protocol::{LockedItem, MirroredContent};
use grd_runtime::{Dispatcher, InitializationMonitor};
use tracing::{debug, info, warn};

use super::cleanup::WorkspaceCleanup;
use crate::collaborators::{FileSurface, MirrorTransport};
use crate::error::{GradeError, Result};
use crate::finalize::ToolchainFinalizer;

/// Directory below the workspace root that receives the workspace profile.
pub const PROFILE_DIR: &str = ".grd";

/// Workspace mirrored for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceHandle {
	pub root: PathBuf,
	pub content: MirroredContent,
}

pub struct WorkspaceProvisioner {
	root: PathBuf,
	cleanup: WorkspaceCleanup,
	transport: Arc<dyn MirrorTransport>,
	surface: Arc<dyn FileSurface>,
	dispatcher: Dispatcher,
	monitor: InitializationMonitor,
	finalizer: Option<ToolchainFinalizer>,
	profile: Option<PathBuf>,
}

impl WorkspaceProvisioner {
	pub fn new(
		root: PathBuf,
		cleanup: WorkspaceCleanup,
		transport: Arc<dyn MirrorTransport>,
		surface: Arc<dyn FileSurface>,
		dispatcher: Dispatcher,
		monitor: InitializationMonitor,
	) -> Self {
		Self {
			root,
			cleanup,
			transport,
			surface,
			dispatcher,
			monitor,
			finalizer: None,
			profile: None,
		}
	}

	pub fn with_finalizer(mut self, finalizer: ToolchainFinalizer) -> Self {
		self.finalizer = Some(finalizer);
		self
	}

	pub fn with_profile(mut self, profile: Option<PathBuf>) -> Self {
		self.profile = profile;
		self
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Cleans the root, clones `item` into it and starts watching its import.
	///
	/// `on_ready` runs once after the import converged, after toolchain selection.
	pub async fn provision<F, Fut>(&self, item: &LockedItem, on_ready: F) -> Result<WorkspaceHandle>
	where
		F: FnOnce() -> Fut + Send + 'static,
		Fut: Future<Output = ()> + Send + 'static,
	{
		let root = self.root.clone();
		let created = root.clone();
		self.dispatcher
			.background(move || std::fs::create_dir_all(&created))
			.await?
			.map_err(|err| GradeError::filesystem(&root, err))?;

		let report = self.cleanup.cleanup(&root).await?;
		if !report.is_clean() {
			warn!(target = "grd.workspace", failed = report.failed.len(), "workspace was not fully emptied before cloning");
		}

		info!(
			target = "grd.workspace",
			item = %item.item_id(),
			transport = %self.transport.kind(),
			root = %root.display(),
			"cloning item"
		);
		let content = self.transport.mirror_into(item, &root).await?;
		debug!(target = "grd.workspace", revision = ?content.revision, "clone finished");

		if let Some(profile) = self.profile.clone() {
			let destination = root.clone();
			match self.dispatcher.background(move || install_profile(&profile, &destination)).await? {
				Ok(path) => debug!(target = "grd.workspace", path = %path.display(), "workspace profile installed"),
				Err(err) => warn!(target = "grd.workspace", error = %err, "workspace profile not installed"),
			}
		}

		let surface = Arc::clone(&self.surface);
		let refresh_root = root.clone();
		self.dispatcher.background(move || surface.mark_dirty_and_refresh(&refresh_root)).await?;

		let finalizer = self.finalizer.clone();
		self.monitor.add_listener(move || async move {
			if let Some(finalizer) = finalizer {
				finalizer.finalize().await;
			}
			on_ready().await;
		});
		self.monitor.watch(root.clone());

		Ok(WorkspaceHandle { root, content })
	}
}

fn install_profile(profile: &Path, root: &Path) -> Result<PathBuf> {
	let name = profile
		.file_name()
		.ok_or_else(|| GradeError::MissingResource(format!("workspace profile {}", profile.display())))?;
	if !profile.is_file() {
		return Err(GradeError::MissingResource(format!("workspace profile {}", profile.display())));
	}
	let dir = root.join(PROFILE_DIR);
	std::fs::create_dir_all(&dir).map_err(|err| GradeError::filesystem(&dir, err))?;
	let destination = dir.join(name);
	std::fs::copy(profile, &destination).map_err(|err| GradeError::filesystem(&destination, err))?;
	Ok(destination)
}
