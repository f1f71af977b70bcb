//! Foreground and background execution contexts.
//!
//! Editor-adjacent work (closing files, hiding panels, selecting a toolchain)
//! runs on a single dedicated foreground thread in submission order. Blocking
//! filesystem work runs on the tokio blocking pool. Callers only ever await a
//! result, so neither context is blocked by a pending session step.
//!
//! # Example
//!
//! ```ignore
//! let dispatcher = Dispatcher::spawn()?;
//! let open = dispatcher.foreground(move || surface.list_open_files()).await?;
//! dispatcher.background(move || std::fs::remove_file(path)).await??;
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::error::{Result, RuntimeError};

type Job = Box<dyn FnOnce() + Send + 'static>;

const FOREGROUND_THREAD: &str = "grd-foreground";

enum Mode {
	Threaded { jobs: mpsc::UnboundedSender<Job> },
	Inline,
}

/// Handle to the two execution contexts. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
	mode: Arc<Mode>,
}

impl Dispatcher {
	/// Starts the foreground thread. The thread exits once every handle is dropped.
	pub fn spawn() -> Result<Self> {
		let (jobs, mut rx) = mpsc::unbounded_channel::<Job>();
		std::thread::Builder::new()
			.name(FOREGROUND_THREAD.to_string())
			.spawn(move || {
				while let Some(job) = rx.blocking_recv() {
					if catch_unwind(AssertUnwindSafe(job)).is_err() {
						error!(target = "grd.runtime", "foreground job panicked");
					}
				}
				debug!(target = "grd.runtime", "foreground context stopped");
			})
			.map_err(RuntimeError::Spawn)?;

		Ok(Self {
			mode: Arc::new(Mode::Threaded { jobs }),
		})
	}

	/// Runs every job on the calling task. Used where ordering has to be deterministic.
	pub fn inline() -> Self {
		Self { mode: Arc::new(Mode::Inline) }
	}

	pub fn is_inline(&self) -> bool {
		matches!(*self.mode, Mode::Inline)
	}

	/// Runs `job` on the foreground context and waits for its result.
	pub async fn foreground<F, T>(&self, job: F) -> Result<T>
	where
		F: FnOnce() -> T + Send + 'static,
		T: Send + 'static,
	{
		match &*self.mode {
			Mode::Inline => Ok(job()),
			Mode::Threaded { jobs } => {
				let (tx, rx) = oneshot::channel();
				jobs.send(Box::new(move || {
					let _ = tx.send(job());
				}))
				.map_err(|_| RuntimeError::DispatcherClosed)?;
				rx.await.map_err(|_| RuntimeError::JobDropped)
			}
		}
	}

	/// Runs `job` on the background context and waits for its result.
	pub async fn background<F, T>(&self, job: F) -> Result<T>
	where
		F: FnOnce() -> T + Send + 'static,
		T: Send + 'static,
	{
		match &*self.mode {
			Mode::Inline => Ok(job()),
			Mode::Threaded { .. } => Ok(tokio::task::spawn_blocking(job).await?),
		}
	}
}

impl std::fmt::Debug for Dispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mode = if self.is_inline() { "inline" } else { "threaded" };
		f.debug_struct("Dispatcher").field("mode", &mode).finish()
	}
}
