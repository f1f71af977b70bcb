//! Plain-filesystem editor surface and workspace tracking.
//!
//! The CLI has no editor, so there are never open files and tracking only
//! logs what an editor integration would have done.

use std::path::{Path, PathBuf};

use grd::{FileSurface, WorkspaceTracking};
use tracing::{debug, trace};

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSurface;

impl FileSurface for LocalFileSurface {
	fn list_open_files(&self) -> Vec<PathBuf> {
		Vec::new()
	}

	fn close_file(&self, path: &Path) {
		trace!(target = "grd.workspace", path = %path.display(), "close requested");
	}

	fn find_file(&self, path: &Path) -> Option<PathBuf> {
		path.exists().then(|| path.to_path_buf())
	}

	fn delete_file(&self, path: &Path) -> std::io::Result<()> {
		let meta = std::fs::symlink_metadata(path)?;
		if meta.is_dir() {
			std::fs::remove_dir(path)
		} else {
			std::fs::remove_file(path)
		}
	}

	fn mark_dirty_and_refresh(&self, root: &Path) {
		debug!(target = "grd.workspace", root = %root.display(), "workspace refreshed");
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingTracking;

impl WorkspaceTracking for LoggingTracking {
	fn set_tracked_directories(&self, directories: &[PathBuf]) {
		debug!(target = "grd.tracking", count = directories.len(), "tracked directories set");
	}

	fn notify_mappings_changed(&self) {
		trace!(target = "grd.tracking", "mappings changed");
	}

	fn force_reconcile(&self) {
		trace!(target = "grd.tracking", "reconcile forced");
	}
}
