//! Session states, end actions and transport selection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a grading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
	#[default]
	Idle,
	Provisioning,
	Active,
	Finalizing,
	Closed,
}

impl SessionState {
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Closed)
	}
}

impl fmt::Display for SessionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			Self::Idle => "idle",
			Self::Provisioning => "provisioning",
			Self::Active => "active",
			Self::Finalizing => "finalizing",
			Self::Closed => "closed",
		};
		f.write_str(label)
	}
}

/// How the user ends a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndAction {
	Submit,
	Save,
	Cancel,
	/// Drops the local workspace without touching remote state.
	Close,
}

impl EndAction {
	/// Remote mutation that has to happen before the workspace is cleaned.
	pub fn release_mode(self) -> Option<ReleaseMode> {
		match self {
			Self::Submit => Some(ReleaseMode::Submit),
			Self::Save => Some(ReleaseMode::Save),
			Self::Cancel => Some(ReleaseMode::Cancel),
			Self::Close => None,
		}
	}

	/// Progressive verb used in progress messages ("Submitting assessment").
	pub fn progressive(self) -> &'static str {
		match self {
			Self::Submit => "Submitting",
			Self::Save => "Saving",
			Self::Cancel => "Cancelling",
			Self::Close => "Closing",
		}
	}
}

impl fmt::Display for EndAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			Self::Submit => "submit",
			Self::Save => "save",
			Self::Cancel => "cancel",
			Self::Close => "close",
		};
		f.write_str(label)
	}
}

/// Remote lock mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseMode {
	/// Persists the result and releases the lock.
	Submit,
	/// Persists the result and keeps the lock.
	Save,
	/// Releases the lock without persisting anything.
	Cancel,
}

impl ReleaseMode {
	pub fn keeps_lock(self) -> bool {
		matches!(self, Self::Save)
	}
}

/// Transport used to mirror an item into the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
	Ssh,
	#[default]
	Token,
}

impl fmt::Display for TransportKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Ssh => f.write_str("ssh"),
			Self::Token => f.write_str("token"),
		}
	}
}
