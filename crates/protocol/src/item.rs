//! Locked items, annotations and lock requests.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ids::{CorrectionRound, CorrectorId, ExerciseId, ItemId};

/// Origin of an annotation attached to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnnotationSource {
	/// Produced by the automated pre-check.
	Automatic,
	ManualFirstRound,
	ManualSecondRound,
	Review,
}

impl AnnotationSource {
	/// Returns `true` when a corrector made this annotation by hand in `round`.
	pub fn is_manual_for(self, round: CorrectionRound) -> bool {
		matches!(
			(round, self),
			(CorrectionRound::First, Self::ManualFirstRound) | (CorrectionRound::Second, Self::ManualSecondRound)
		)
	}
}

/// Single annotation on a locked item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
	pub id: String,
	pub source: AnnotationSource,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

/// Exclusive claim on a remote work item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lock {
	pub item_id: ItemId,
	pub corrector_id: CorrectorId,
	pub round: CorrectionRound,
}

/// Where the content of an item can be mirrored from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryLocation {
	/// Clone URL for SSH access, e.g. `ssh://git@host:7999/exercise/item.git`.
	pub ssh_url: String,
	/// Clone URL for HTTPS access with a VCS token.
	pub https_url: String,
}

/// Work item held under a lock by the current corrector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedItem {
	pub lock: Lock,
	pub exercise_id: ExerciseId,
	pub repository: RepositoryLocation,
	#[serde(default)]
	pub annotations: Vec<Annotation>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub submitted_at: Option<String>,
}

impl LockedItem {
	pub fn item_id(&self) -> ItemId {
		self.lock.item_id
	}

	pub fn round(&self) -> CorrectionRound {
		self.lock.round
	}

	/// Number of annotations a corrector made by hand in the lock's round.
	pub fn manual_annotation_count(&self) -> usize {
		let round = self.round();
		self.annotations.iter().filter(|annotation| annotation.source.is_manual_for(round)).count()
	}

	/// Reference that can be used to re-acquire this item later.
	pub fn item_ref(&self) -> ItemRef {
		ItemRef {
			exercise_id: self.exercise_id,
			item_id: self.item_id(),
			round: self.round(),
		}
	}
}

/// Request for the next unlocked item of an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRequest {
	pub exercise_id: ExerciseId,
	pub round: CorrectionRound,
}

/// Known item that should be locked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
	pub exercise_id: ExerciseId,
	pub item_id: ItemId,
	pub round: CorrectionRound,
}

/// Grading configuration the lock service validates locks against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingConfig {
	#[serde(default)]
	pub name: String,
	/// Whether this configuration is a review configuration.
	#[serde(default)]
	pub review: bool,
}

/// Result of mirroring an item into the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirroredContent {
	pub root: PathBuf,
	/// Revision checked out, when the transport reports one.
	pub revision: Option<String>,
}
