use std::sync::Arc;

use anyhow::Result;
use grd::{Settings, WorkspaceCleanup};
use grd_runtime::Dispatcher;

use crate::local::{LocalFileSurface, LoggingTracking};

/// Empties the workspace. Locks are left alone.
pub async fn run(settings: Settings) -> Result<i32> {
	let cleanup = WorkspaceCleanup::new(Arc::new(LocalFileSurface), Arc::new(LoggingTracking), Dispatcher::spawn()?);
	let report = cleanup.cleanup(&settings.workspace_root).await?;

	for (path, reason) in &report.failed {
		eprintln!("could not delete {}: {reason}", path.display());
	}
	println!("removed {} entries from {}", report.deleted.len(), settings.workspace_root.display());
	Ok(if report.is_clean() { 0 } else { 1 })
}
