//! Acquisition and release of the remote exclusive lock.
//!
//! A lock must never be left behind by accident. When a step after a
//! successful acquire fails, the lock is cancelled automatically unless the
//! corrector already did manual work on the item in the current round.

use std::sync::Arc;

use grd_protocol::{GradingConfig, ItemRef, LockRequest, LockedItem, ReleaseMode};
use tracing::{debug, info, warn};

use crate::collaborators::{LockService, Notifier};
use crate::error::{ErrorKind, Result};
use crate::notice::Notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireRequest {
	/// Lock whatever item is next in line.
	Next(LockRequest),
	/// Lock a specific item again.
	Existing(ItemRef),
}

/// What happened to a lock whose session failed to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanOutcome {
	Cancelled,
	Preserved { manual: usize },
	CancelFailed(ErrorKind),
}

pub struct LockLifecycle {
	service: Arc<dyn LockService>,
	config: GradingConfig,
	notifier: Arc<dyn Notifier>,
}

impl LockLifecycle {
	pub fn new(service: Arc<dyn LockService>, config: GradingConfig, notifier: Arc<dyn Notifier>) -> Self {
		Self { service, config, notifier }
	}

	pub fn config(&self) -> &GradingConfig {
		&self.config
	}

	pub async fn acquire(&self, request: &AcquireRequest) -> Result<Option<LockedItem>> {
		let locked = match request {
			AcquireRequest::Next(next) => self.service.try_lock_next(next, &self.config).await?,
			AcquireRequest::Existing(item) => self.service.try_lock(item, &self.config).await?,
		};
		match &locked {
			Some(item) => info!(
				target = "grd.lock",
				item = %item.item_id(),
				exercise = %item.exercise_id,
				round = %item.round(),
				"lock acquired"
			),
			None => debug!(target = "grd.lock", ?request, "no lock available"),
		}
		Ok(locked)
	}

	pub async fn release(&self, item: &LockedItem, mode: ReleaseMode) -> Result<()> {
		match mode {
			ReleaseMode::Submit => self.service.submit(item).await?,
			ReleaseMode::Save => self.service.save(item).await?,
			ReleaseMode::Cancel => self.service.cancel(item).await?,
		}
		info!(target = "grd.lock", item = %item.item_id(), ?mode, keeps_lock = mode.keeps_lock(), "lock released");
		Ok(())
	}

	/// Cleans up after a session that failed between acquire and activation.
	pub async fn abandon_after_failure(&self, item: &LockedItem) -> OrphanOutcome {
		let manual = item.manual_annotation_count();
		if !should_auto_cancel(item) {
			warn!(target = "grd.lock", item = %item.item_id(), manual, "keeping lock, item has manual annotations");
			self.notifier.notify(Notice::warning(
				"Lock kept",
				format!("The assessment already has {manual} manual annotation(s), so its lock was not released."),
			));
			return OrphanOutcome::Preserved { manual };
		}

		match self.release(item, ReleaseMode::Cancel).await {
			Ok(()) => OrphanOutcome::Cancelled,
			Err(err) => {
				warn!(target = "grd.lock", item = %item.item_id(), error = %err, "could not cancel orphaned lock");
				self.notifier
					.notify(Notice::error("Failed to free the assessment lock", err.to_string()));
				OrphanOutcome::CancelFailed(err.kind())
			}
		}
	}
}

/// A lock may be dropped silently only if no manual work for its round exists.
pub fn should_auto_cancel(item: &LockedItem) -> bool {
	item.manual_annotation_count() == 0
}
