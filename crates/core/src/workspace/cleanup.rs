//! Best-effort removal of everything below the workspace root.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use grd_runtime::Dispatcher;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::collaborators::{FileSurface, WorkspaceTracking};
use crate::error::Result;

/// Outcome of one cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
	pub closed: usize,
	pub deleted: Vec<PathBuf>,
	/// Entries that could not be deleted, with the reason.
	pub failed: Vec<(PathBuf, String)>,
}

impl CleanupReport {
	pub fn is_clean(&self) -> bool {
		self.failed.is_empty()
	}
}

/// Empties the workspace root while keeping the root directory itself.
#[derive(Clone)]
pub struct WorkspaceCleanup {
	surface: Arc<dyn FileSurface>,
	tracking: Arc<dyn WorkspaceTracking>,
	dispatcher: Dispatcher,
}

impl WorkspaceCleanup {
	pub fn new(surface: Arc<dyn FileSurface>, tracking: Arc<dyn WorkspaceTracking>, dispatcher: Dispatcher) -> Self {
		Self {
			surface,
			tracking,
			dispatcher,
		}
	}

	/// Closes open files, detaches tracking, then deletes the tree bottom-up.
	///
	/// Individual deletion failures are logged and reported, never returned.
	/// Only a lost execution context yields an error.
	pub async fn cleanup(&self, root: &Path) -> Result<CleanupReport> {
		let mut report = CleanupReport::default();

		let surface = Arc::clone(&self.surface);
		let scope = root.to_path_buf();
		report.closed = self
			.dispatcher
			.foreground(move || {
				let open: Vec<PathBuf> = surface.list_open_files().into_iter().filter(|path| path.starts_with(&scope)).collect();
				for path in &open {
					surface.close_file(path);
				}
				open.len()
			})
			.await?;

		let surface = Arc::clone(&self.surface);
		let lookup = root.to_path_buf();
		let Some(resolved) = self.dispatcher.background(move || surface.find_file(&lookup)).await? else {
			info!(target = "grd.workspace", root = %root.display(), "workspace root not found, nothing to clean");
			return Ok(report);
		};

		let tracking = Arc::clone(&self.tracking);
		self.dispatcher
			.foreground(move || {
				tracking.set_tracked_directories(&[]);
				tracking.notify_mappings_changed();
				tracking.force_reconcile();
			})
			.await?;

		let traversal_root = resolved.clone();
		let queue = self.dispatcher.background(move || deletion_queue(&traversal_root)).await?;
		debug!(target = "grd.workspace", root = %resolved.display(), entries = queue.len(), "deleting workspace contents");

		for entry in queue {
			let surface = Arc::clone(&self.surface);
			let target = entry.clone();
			match self.dispatcher.background(move || surface.delete_file(&target)).await? {
				Ok(()) => report.deleted.push(entry),
				Err(err) => {
					warn!(target = "grd.workspace", path = %entry.display(), error = %err, "could not delete workspace entry");
					report.failed.push((entry, err.to_string()));
				}
			}
		}

		let surface = Arc::clone(&self.surface);
		let refresh_root = resolved.clone();
		self.dispatcher.background(move || surface.mark_dirty_and_refresh(&refresh_root)).await?;

		info!(
			target = "grd.workspace",
			root = %resolved.display(),
			closed = report.closed,
			deleted = report.deleted.len(),
			failed = report.failed.len(),
			"workspace cleaned"
		);
		Ok(report)
	}
}

/// Lists every entry below `root` so that each directory follows all of its
/// children. The root itself is never listed. Symlinks are not followed.
pub fn deletion_queue(root: &Path) -> Vec<PathBuf> {
	WalkDir::new(root)
		.min_depth(1)
		.follow_links(false)
		.contents_first(true)
		.sort_by_file_name()
		.into_iter()
		.filter_map(|entry| match entry {
			Ok(entry) => Some(entry.into_path()),
			Err(err) => {
				warn!(target = "grd.workspace", path = ?err.path(), error = %err, "could not list directory");
				None
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use std::fs;

	use super::*;
	use crate::testing::{Journal, RecordingSurface, RecordingTracking};

	fn populate(root: &Path) {
		fs::create_dir_all(root.join("src/main")).unwrap();
		fs::write(root.join("pom.xml"), "<project/>").unwrap();
		fs::write(root.join("src/main/App.java"), "class App {}").unwrap();
		fs::write(root.join("src/Util.java"), "class Util {}").unwrap();
	}

	fn cleanup_with(journal: &Journal) -> (WorkspaceCleanup, Arc<RecordingSurface>) {
		let surface = RecordingSurface::new(journal.clone());
		let tracking = RecordingTracking::new(journal.clone());
		(WorkspaceCleanup::new(surface.clone(), tracking, Dispatcher::inline()), surface)
	}

	#[test]
	fn queue_lists_children_before_their_directory() {
		let dir = tempfile::tempdir().unwrap();
		populate(dir.path());

		let queue = deletion_queue(dir.path());
		let index = |relative: &str| queue.iter().position(|path| path == &dir.path().join(relative)).unwrap();

		assert_eq!(queue.len(), 5);
		assert!(index("src/main/App.java") < index("src/main"));
		assert!(index("src/main") < index("src"));
		assert!(index("src/Util.java") < index("src"));
		assert!(!queue.contains(&dir.path().to_path_buf()));
	}

	#[cfg(unix)]
	#[test]
	fn queue_does_not_descend_into_linked_directories() {
		let outside = tempfile::tempdir().unwrap();
		fs::write(outside.path().join("keep.txt"), "").unwrap();
		let dir = tempfile::tempdir().unwrap();
		std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

		assert_eq!(deletion_queue(dir.path()), vec![dir.path().join("link")]);
	}

	#[tokio::test]
	async fn empties_root_but_keeps_it() {
		let dir = tempfile::tempdir().unwrap();
		populate(dir.path());
		let journal = Journal::default();
		let (cleanup, _surface) = cleanup_with(&journal);

		let report = cleanup.cleanup(dir.path()).await.unwrap();

		assert!(report.is_clean());
		assert_eq!(report.deleted.len(), 5);
		assert!(dir.path().exists());
		assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
	}

	#[tokio::test]
	async fn tracking_is_detached_before_first_deletion() {
		let dir = tempfile::tempdir().unwrap();
		populate(dir.path());
		let journal = Journal::default();
		let (cleanup, _surface) = cleanup_with(&journal);

		cleanup.cleanup(dir.path()).await.unwrap();

		let reconcile = journal.position("tracking:reconcile").unwrap();
		assert!(journal.position("tracking:set:0").unwrap() < reconcile);
		assert!(reconcile < journal.position("delete:").unwrap());
		assert_eq!(journal.entries().last().unwrap(), &format!("refresh:{}", dir.path().display()));
	}

	#[tokio::test]
	async fn closes_only_files_under_root() {
		let dir = tempfile::tempdir().unwrap();
		populate(dir.path());
		let journal = Journal::default();
		let (cleanup, surface) = cleanup_with(&journal);
		surface.open(dir.path().join("pom.xml"));
		surface.open("/elsewhere/Notes.md");

		let report = cleanup.cleanup(dir.path()).await.unwrap();

		assert_eq!(report.closed, 1);
		assert_eq!(journal.count("close:"), 1);
		assert!(journal.position("close:").unwrap() < journal.position("tracking:").unwrap());
		assert_eq!(surface.list_open_files(), vec![PathBuf::from("/elsewhere/Notes.md")]);
	}

	#[tokio::test]
	async fn failed_entry_does_not_stop_the_pass() {
		let dir = tempfile::tempdir().unwrap();
		populate(dir.path());
		let journal = Journal::default();
		let (cleanup, surface) = cleanup_with(&journal);
		surface.fail_deleting(dir.path().join("src/Util.java"));

		let report = cleanup.cleanup(dir.path()).await.unwrap();

		assert!(!report.is_clean());
		let failed: Vec<&PathBuf> = report.failed.iter().map(|(path, _)| path).collect();
		// `src` is not empty, so removing it fails as well.
		assert_eq!(failed, vec![&dir.path().join("src/Util.java"), &dir.path().join("src")]);
		assert!(!dir.path().join("pom.xml").exists());
		assert!(!dir.path().join("src/main").exists());
		assert!(journal.position("refresh:").is_some());
	}

	#[tokio::test]
	async fn missing_root_is_not_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let journal = Journal::default();
		let (cleanup, _surface) = cleanup_with(&journal);

		let report = cleanup.cleanup(&dir.path().join("gone")).await.unwrap();

		assert_eq!(report, CleanupReport::default());
		assert_eq!(journal.position("tracking:"), None);
		assert_eq!(journal.position("refresh:"), None);
	}

	#[tokio::test]
	async fn second_pass_on_clean_root_is_a_no_op() {
		let dir = tempfile::tempdir().unwrap();
		populate(dir.path());
		let journal = Journal::default();
		let (cleanup, _surface) = cleanup_with(&journal);

		cleanup.cleanup(dir.path()).await.unwrap();
		let report = cleanup.cleanup(dir.path()).await.unwrap();

		assert!(report.deleted.is_empty());
		assert!(report.is_clean());
	}
}
