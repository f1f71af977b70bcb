//! Contracts of the services a session talks to.
//!
//! The controller owns no network, editor or VCS code of its own. Everything
//! outside the lifecycle is reached through these traits so the CLI, an
//! editor integration and the tests can each plug in their own versions.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use grd_protocol::{GradingConfig, ItemRef, LockRequest, LockedItem, MirroredContent, TransportKind};

use crate::error::Result;
use crate::notice::Notice;

/// Remote service handing out exclusive locks on work items.
#[async_trait]
pub trait LockService: Send + Sync {
	/// Locks the next unlocked item. `None` when nothing is left.
	async fn try_lock_next(&self, request: &LockRequest, config: &GradingConfig) -> Result<Option<LockedItem>>;

	/// Locks a known item again. `None` when someone else holds it.
	async fn try_lock(&self, item: &ItemRef, config: &GradingConfig) -> Result<Option<LockedItem>>;

	async fn submit(&self, item: &LockedItem) -> Result<()>;

	async fn save(&self, item: &LockedItem) -> Result<()>;

	async fn cancel(&self, item: &LockedItem) -> Result<()>;
}

/// Mirrors the content of a locked item into a local directory.
#[async_trait]
pub trait MirrorTransport: Send + Sync {
	fn kind(&self) -> TransportKind;

	async fn mirror_into(&self, item: &LockedItem, destination: &Path) -> Result<MirroredContent>;
}

/// Version-control tracking of the workspace. Called on the foreground context.
pub trait WorkspaceTracking: Send + Sync {
	fn set_tracked_directories(&self, directories: &[PathBuf]);

	fn notify_mappings_changed(&self);

	/// Drops cached state so the tracker reconciles with the new mappings.
	fn force_reconcile(&self);
}

/// Editor-facing view of the filesystem.
///
/// `list_open_files` and `close_file` run on the foreground context; the rest
/// runs on the background context.
pub trait FileSurface: Send + Sync {
	fn list_open_files(&self) -> Vec<PathBuf>;

	fn close_file(&self, path: &Path);

	/// Resolves `path` to a known entry, `None` if it does not exist.
	fn find_file(&self, path: &Path) -> Option<PathBuf>;

	/// Deletes a regular file or an empty directory.
	fn delete_file(&self, path: &Path) -> std::io::Result<()>;

	fn mark_dirty_and_refresh(&self, root: &Path);
}

#[async_trait]
pub trait Autograder: Send + Sync {
	async fn run(&self, item: &LockedItem, workspace: &Path) -> Result<()>;
}

/// Toolchain (JDK) known to the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
	pub name: String,
	pub version: String,
}

impl Toolchain {
	pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			version: version.into(),
		}
	}
}

/// Registry of installed toolchains. Called on the foreground context.
pub trait ToolchainRegistry: Send + Sync {
	fn current(&self) -> Option<Toolchain>;

	fn available(&self) -> Vec<Toolchain>;

	fn select(&self, toolchain: &Toolchain);
}

/// Sink for user-facing notices.
pub trait Notifier: Send + Sync {
	fn notify(&self, notice: Notice);
}
