//! Settings file for the session controller and its local collaborators.
//!
//! Settings live in `<config_dir>/grd/settings.json` unless a path is given
//! explicitly. A missing file means defaults; a malformed one is an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use grd_protocol::{GradingConfig, TransportKind};
use grd_runtime::MonitorConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GradeError, Result};
use crate::finalize::DEFAULT_TOOLCHAIN_TARGET;

pub const SETTINGS_SCHEMA_VERSION: u32 = 1;

const APP_DIR: &str = "grd";
const SETTINGS_FILE: &str = "settings.json";

/// Timings of the initialization monitor in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorSettings {
	pub poll_interval_ms: u64,
	pub partial_timeout_ms: u64,
	pub settle_delay_ms: u64,
}

impl Default for MonitorSettings {
	fn default() -> Self {
		let defaults = MonitorConfig::default();
		Self {
			poll_interval_ms: defaults.poll_interval.as_millis() as u64,
			partial_timeout_ms: defaults.partial_timeout.as_millis() as u64,
			settle_delay_ms: defaults.settle_delay.as_millis() as u64,
		}
	}
}

impl From<MonitorSettings> for MonitorConfig {
	fn from(settings: MonitorSettings) -> Self {
		Self {
			poll_interval: Duration::from_millis(settings.poll_interval_ms.max(1)),
			partial_timeout: Duration::from_millis(settings.partial_timeout_ms),
			settle_delay: Duration::from_millis(settings.settle_delay_ms),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
	pub schema: u32,
	/// Directory the locked item is mirrored into. Emptied on every start and end.
	pub workspace_root: PathBuf,
	/// Directory-backed lock roster used by the CLI.
	pub roster: PathBuf,
	pub corrector: String,
	pub transport: TransportKind,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub vcs_token: Option<String>,
	pub grading_config: GradingConfig,
	pub monitor: MonitorSettings,
	/// Minimum major version of the toolchain selected after import.
	pub toolchain_target: u32,
	/// File copied into the workspace after cloning, e.g. an inspection profile.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub workspace_profile: Option<PathBuf>,
	pub autograder: bool,
	/// Command the CLI runs inside the workspace as autograder.
	pub autograder_command: Vec<String>,
}

impl Default for Settings {
	fn default() -> Self {
		let data = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir).join(APP_DIR);
		Self {
			schema: SETTINGS_SCHEMA_VERSION,
			workspace_root: data.join("workspace"),
			roster: data.join("roster"),
			corrector: std::env::var("USER").unwrap_or_else(|_| "corrector".to_string()),
			transport: TransportKind::default(),
			vcs_token: None,
			grading_config: GradingConfig::default(),
			monitor: MonitorSettings::default(),
			toolchain_target: DEFAULT_TOOLCHAIN_TARGET,
			workspace_profile: None,
			autograder: true,
			autograder_command: Vec::new(),
		}
	}
}

impl Settings {
	pub fn default_path() -> Option<PathBuf> {
		dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
	}

	/// Loads settings from `path`, or from [`Settings::default_path`] when `None`.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let path = match path {
			Some(path) => path.to_path_buf(),
			None => match Self::default_path() {
				Some(path) => path,
				None => return Ok(Self::default()),
			},
		};
		Self::load_from(&path)
	}

	pub fn load_from(path: &Path) -> Result<Self> {
		let content = match fs::read_to_string(path) {
			Ok(content) => content,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				debug!(target = "grd.config", path = %path.display(), "no settings file, using defaults");
				return Ok(Self::default());
			}
			Err(err) => return Err(GradeError::filesystem(path, err)),
		};

		let settings: Self = serde_json::from_str(&content)?;
		if settings.schema > SETTINGS_SCHEMA_VERSION {
			warn!(
				target = "grd.config",
				path = %path.display(),
				schema = settings.schema,
				supported = SETTINGS_SCHEMA_VERSION,
				"settings written by a newer version"
			);
		}
		Ok(settings)
	}

	pub fn save(&self, path: &Path) -> Result<()> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).map_err(|err| GradeError::filesystem(parent, err))?;
		}
		let json = serde_json::to_string_pretty(self)?;
		fs::write(path, json).map_err(|err| GradeError::filesystem(path, err))
	}

	pub fn monitor_config(&self) -> MonitorConfig {
		self.monitor.into()
	}

	pub fn autograder_enabled(&self) -> bool {
		self.autograder && !self.autograder_command.is_empty()
	}
}
