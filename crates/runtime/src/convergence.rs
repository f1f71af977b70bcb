//! Two-signal convergence state machine.
//!
//! The import subsystem reports completion through two independent signals.
//! Each monitor tick feeds the current pair into [`Convergence::observe`],
//! which decides whether to keep waiting, force a retry because only one
//! signal arrived for too long, or declare the workspace converged.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceState {
	Waiting,
	PartiallyDone { since: Instant },
	Converged,
}

/// What the monitor has to do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
	Wait,
	ForceRetry,
	Converged,
}

#[derive(Debug, Clone)]
pub struct Convergence {
	state: ConvergenceState,
	partial_timeout: Duration,
}

impl Convergence {
	pub fn new(partial_timeout: Duration) -> Self {
		Self {
			state: ConvergenceState::Waiting,
			partial_timeout,
		}
	}

	pub fn state(&self) -> ConvergenceState {
		self.state
	}

	/// Forgets any partial progress. Called whenever the import is re-triggered.
	pub fn reset(&mut self) {
		self.state = ConvergenceState::Waiting;
	}

	pub fn observe(&mut self, import_completed: bool, project_resolved: bool, now: Instant) -> TickAction {
		if self.state == ConvergenceState::Converged {
			return TickAction::Converged;
		}

		match (import_completed, project_resolved) {
			(true, true) => {
				self.state = ConvergenceState::Converged;
				TickAction::Converged
			}
			(false, false) => {
				self.state = ConvergenceState::Waiting;
				TickAction::Wait
			}
			_ => match self.state {
				ConvergenceState::PartiallyDone { since } if now.saturating_duration_since(since) > self.partial_timeout => {
					self.state = ConvergenceState::Waiting;
					TickAction::ForceRetry
				}
				ConvergenceState::PartiallyDone { .. } => TickAction::Wait,
				_ => {
					self.state = ConvergenceState::PartiallyDone { since: now };
					TickAction::Wait
				}
			},
		}
	}
}
