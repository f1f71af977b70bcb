//! Error taxonomy of the session lifecycle.

use std::path::PathBuf;

use grd_protocol::ItemId;
use grd_runtime::RuntimeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GradeError>;

#[derive(Debug, Error)]
pub enum GradeError {
	/// The lock service could not be reached or rejected the call.
	#[error("network error: {0}")]
	Network(String),

	/// Data from the lock service could not be mapped.
	#[error("malformed service data: {0}")]
	Serialization(String),

	#[error("filesystem error at {}: {source}", path.display())]
	Filesystem {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("missing resource: {0}")]
	MissingResource(String),

	/// The mirror transport failed to clone the item.
	#[error("clone failed: {0}")]
	Clone(String),

	#[error("a more recent submission exists for item {0}")]
	MoreRecentSubmission(ItemId),

	#[error("autograder failed: {0}")]
	Autograder(String),

	#[error(transparent)]
	Dispatch(#[from] RuntimeError),
}

impl GradeError {
	pub fn network(message: impl Into<String>) -> Self {
		Self::Network(message.into())
	}

	pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::Filesystem {
			path: path.into(),
			source,
		}
	}

	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Network(_) => ErrorKind::Network,
			Self::Serialization(_) => ErrorKind::Serialization,
			Self::Filesystem { .. } => ErrorKind::Filesystem,
			Self::MissingResource(_) => ErrorKind::MissingResource,
			Self::Clone(_) => ErrorKind::Clone,
			Self::MoreRecentSubmission(_) => ErrorKind::MoreRecentSubmission,
			Self::Autograder(_) => ErrorKind::Autograder,
			Self::Dispatch(_) => ErrorKind::Dispatch,
		}
	}

	/// Errors that are reported to the user as notices. The rest is only logged.
	pub fn is_user_facing(&self) -> bool {
		self.kind().is_user_facing()
	}
}

impl From<serde_json::Error> for GradeError {
	fn from(err: serde_json::Error) -> Self {
		Self::Serialization(err.to_string())
	}
}

/// Copyable discriminant of [`GradeError`], carried in controller outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	Network,
	Serialization,
	Filesystem,
	MissingResource,
	Clone,
	MoreRecentSubmission,
	Autograder,
	Dispatch,
}

impl ErrorKind {
	pub fn is_user_facing(self) -> bool {
		matches!(self, Self::Network | Self::Serialization | Self::Clone | Self::MoreRecentSubmission)
	}
}
