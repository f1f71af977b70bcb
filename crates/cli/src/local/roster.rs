//! Directory-backed lock roster.
//!
//! Layout: `<roster>/<exercise>/<item>.json` describes a submission and an
//! adjacent `<item>.lock` marks it as locked. Lock markers are created with
//! `create_new`, so two processes sharing a roster never lock the same item.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use grd::{GradeError, LockService, Result};
use grd_protocol::{
	Annotation, CorrectionRound, CorrectorId, ExerciseId, GradingConfig, ItemId, ItemRef, Lock, LockRequest, LockedItem, RepositoryLocation,
};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
	#[default]
	Open,
	Saved,
	Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
	pub item_id: ItemId,
	pub repository: RepositoryLocation,
	#[serde(default)]
	pub annotations: Vec<Annotation>,
	#[serde(default)]
	pub status: EntryStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub submitted_at: Option<String>,
	/// The student pushed again after this entry was graded.
	#[serde(default)]
	pub newer_submission: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockMarker {
	corrector_id: CorrectorId,
	round: CorrectionRound,
	locked_at: u64,
}

pub struct DirectoryLockService {
	root: PathBuf,
	corrector: CorrectorId,
}

impl DirectoryLockService {
	pub fn new(root: impl Into<PathBuf>, corrector: CorrectorId) -> Self {
		Self {
			root: root.into(),
			corrector,
		}
	}

	fn exercise_dir(&self, exercise: ExerciseId) -> PathBuf {
		self.root.join(exercise.to_string())
	}

	fn entry_path(&self, exercise: ExerciseId, item: ItemId) -> PathBuf {
		self.exercise_dir(exercise).join(format!("{item}.json"))
	}

	fn lock_path(&self, exercise: ExerciseId, item: ItemId) -> PathBuf {
		self.exercise_dir(exercise).join(format!("{item}.lock"))
	}

	async fn read_entry(&self, exercise: ExerciseId, item: ItemId) -> Result<RosterEntry> {
		let path = self.entry_path(exercise, item);
		let bytes = fs::read(&path).await.map_err(|err| match err.kind() {
			std::io::ErrorKind::NotFound => GradeError::MissingResource(format!("roster entry {}", path.display())),
			_ => GradeError::filesystem(&path, err),
		})?;
		Ok(serde_json::from_slice(&bytes)?)
	}

	async fn write_entry(&self, exercise: ExerciseId, entry: &RosterEntry) -> Result<()> {
		let path = self.entry_path(exercise, entry.item_id);
		let json = serde_json::to_vec_pretty(entry)?;
		fs::write(&path, json).await.map_err(|err| GradeError::filesystem(&path, err))
	}

	async fn read_marker(&self, exercise: ExerciseId, item: ItemId) -> Result<Option<LockMarker>> {
		let path = self.lock_path(exercise, item);
		match fs::read(&path).await {
			Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(err) => Err(GradeError::filesystem(&path, err)),
		}
	}

	/// Creates the lock marker. `false` when someone else created it first.
	async fn create_marker(&self, exercise: ExerciseId, item: ItemId, round: CorrectionRound) -> Result<bool> {
		let path = self.lock_path(exercise, item);
		let marker = LockMarker {
			corrector_id: self.corrector.clone(),
			round,
			locked_at: unix_now(),
		};
		let json = serde_json::to_vec(&marker)?;
		match fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
			Ok(mut file) => {
				file.write_all(&json).await.map_err(|err| GradeError::filesystem(&path, err))?;
				file.flush().await.map_err(|err| GradeError::filesystem(&path, err))?;
				Ok(true)
			}
			Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
			Err(err) => Err(GradeError::filesystem(&path, err)),
		}
	}

	async fn remove_marker(&self, exercise: ExerciseId, item: ItemId) -> Result<()> {
		let path = self.lock_path(exercise, item);
		match fs::remove_file(&path).await {
			Ok(()) => Ok(()),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(err) => Err(GradeError::filesystem(&path, err)),
		}
	}

	/// Fails unless this corrector holds the lock on `item`.
	async fn ensure_owner(&self, item: &LockedItem) -> Result<()> {
		match self.read_marker(item.exercise_id, item.item_id()).await? {
			Some(marker) if marker.corrector_id == self.corrector => Ok(()),
			Some(marker) => Err(GradeError::MissingResource(format!(
				"lock on item {} is held by {}",
				item.item_id(),
				marker.corrector_id
			))),
			None => Err(GradeError::MissingResource(format!("item {} is not locked", item.item_id()))),
		}
	}

	fn locked(&self, entry: RosterEntry, exercise: ExerciseId, round: CorrectionRound) -> LockedItem {
		LockedItem {
			lock: Lock {
				item_id: entry.item_id,
				corrector_id: self.corrector.clone(),
				round,
			},
			exercise_id: exercise,
			repository: entry.repository,
			annotations: entry.annotations,
			submitted_at: entry.submitted_at,
		}
	}

	async fn item_ids(&self, exercise: ExerciseId) -> Result<Vec<ItemId>> {
		let dir = self.exercise_dir(exercise);
		let mut entries = match fs::read_dir(&dir).await {
			Ok(entries) => entries,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(err) => return Err(GradeError::filesystem(&dir, err)),
		};

		let mut ids = Vec::new();
		while let Some(entry) = entries.next_entry().await.map_err(|err| GradeError::filesystem(&dir, err))? {
			if let Some(id) = item_id_of(&entry.path()) {
				ids.push(id);
			}
		}
		ids.sort();
		Ok(ids)
	}
}

#[async_trait]
impl LockService for DirectoryLockService {
	async fn try_lock_next(&self, request: &LockRequest, config: &GradingConfig) -> Result<Option<LockedItem>> {
		debug!(target = "grd.roster", exercise = %request.exercise_id, config = %config.name, "looking for next item");
		for id in self.item_ids(request.exercise_id).await? {
			let entry = self.read_entry(request.exercise_id, id).await?;
			if entry.status != EntryStatus::Open {
				continue;
			}
			if self.create_marker(request.exercise_id, id, request.round).await? {
				info!(target = "grd.roster", item = %id, "locked roster entry");
				return Ok(Some(self.locked(entry, request.exercise_id, request.round)));
			}
		}
		Ok(None)
	}

	async fn try_lock(&self, item: &ItemRef, _config: &GradingConfig) -> Result<Option<LockedItem>> {
		let entry = self.read_entry(item.exercise_id, item.item_id).await?;
		if entry.newer_submission {
			return Err(GradeError::MoreRecentSubmission(item.item_id));
		}

		let owned = match self.read_marker(item.exercise_id, item.item_id).await? {
			Some(marker) => marker.corrector_id == self.corrector,
			None => self.create_marker(item.exercise_id, item.item_id, item.round).await?,
		};
		if !owned {
			debug!(target = "grd.roster", item = %item.item_id, "roster entry locked by someone else");
			return Ok(None);
		}
		Ok(Some(self.locked(entry, item.exercise_id, item.round)))
	}

	async fn submit(&self, item: &LockedItem) -> Result<()> {
		self.ensure_owner(item).await?;
		let mut entry = self.read_entry(item.exercise_id, item.item_id()).await?;
		entry.status = EntryStatus::Submitted;
		self.write_entry(item.exercise_id, &entry).await?;
		self.remove_marker(item.exercise_id, item.item_id()).await
	}

	async fn save(&self, item: &LockedItem) -> Result<()> {
		self.ensure_owner(item).await?;
		let mut entry = self.read_entry(item.exercise_id, item.item_id()).await?;
		entry.status = EntryStatus::Saved;
		self.write_entry(item.exercise_id, &entry).await
	}

	async fn cancel(&self, item: &LockedItem) -> Result<()> {
		self.ensure_owner(item).await?;
		self.remove_marker(item.exercise_id, item.item_id()).await
	}
}

fn item_id_of(path: &Path) -> Option<ItemId> {
	if path.extension()? != "json" {
		return None;
	}
	path.file_stem()?.to_str()?.parse().ok().map(ItemId)
}

fn unix_now() -> u64 {
	SystemTime::now().duration_since(UNIX_EPOCH).map(|elapsed| elapsed.as_secs()).unwrap_or_default()
}
