//! Session events and the observers that receive them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use grd_protocol::{CorrectionRound, ExerciseId, ItemId, SessionState};
use parking_lot::RwLock;
use tracing::trace;

/// Immutable view of the current session handed to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
	pub item: ItemId,
	pub exercise: ExerciseId,
	pub round: CorrectionRound,
	pub workspace_root: PathBuf,
	pub state: SessionState,
	pub started_at: SystemTime,
}

impl SessionSnapshot {
	pub(crate) fn with_state(&self, state: SessionState) -> Self {
		Self { state, ..self.clone() }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
	/// The current session moved to a new state.
	Transition(SessionSnapshot),
	/// The workspace of the session finished importing.
	EnvironmentReady(ItemId),
	/// No session is current any more.
	Cleared,
}

pub type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

/// Append-only, registration-ordered set of session observers.
///
/// Listeners are invoked synchronously on the task that changed the state and
/// outside the registry lock, so a listener may register further listeners.
#[derive(Default)]
pub struct ListenerRegistry {
	listeners: RwLock<Vec<Listener>>,
}

impl ListenerRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add<F>(&self, listener: F) -> ListenerId
	where
		F: Fn(&SessionEvent) + Send + Sync + 'static,
	{
		let mut listeners = self.listeners.write();
		listeners.push(Arc::new(listener));
		ListenerId(listeners.len() - 1)
	}

	pub fn len(&self) -> usize {
		self.listeners.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn notify(&self, event: &SessionEvent) {
		let listeners: Vec<Listener> = self.listeners.read().clone();
		trace!(target = "grd.session", count = listeners.len(), ?event, "notifying listeners");
		for listener in listeners {
			listener(event);
		}
	}
}

impl std::fmt::Debug for ListenerRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ListenerRegistry").field("listeners", &self.len()).finish()
	}
}
