//! Identifier newtypes and correction rounds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a lockable work item (one student submission).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Identifier of the exercise an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseId(pub u64);

impl fmt::Display for ExerciseId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Login of the corrector holding a lock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrectorId(pub String);

impl CorrectorId {
	pub fn new(login: impl Into<String>) -> Self {
		Self(login.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for CorrectorId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Correction round a lock is taken for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionRound {
	#[default]
	First,
	Second,
}

impl CorrectionRound {
	/// Parses the one-based round number used on the command line.
	pub fn from_number(number: u8) -> Option<Self> {
		match number {
			1 => Some(Self::First),
			2 => Some(Self::Second),
			_ => None,
		}
	}

	pub fn number(self) -> u8 {
		match self {
			Self::First => 1,
			Self::Second => 2,
		}
	}
}

impl fmt::Display for CorrectionRound {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::First => f.write_str("first"),
			Self::Second => f.write_str("second"),
		}
	}
}
