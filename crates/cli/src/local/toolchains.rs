//! JDK discovery for toolchain selection.
//!
//! A JDK is any directory with a `release` file carrying `JAVA_VERSION`. The
//! selection is stored in the workspace, so it is dropped with the workspace.

use std::fs;
use std::path::{Path, PathBuf};

use grd::{Toolchain, ToolchainRegistry};
use tracing::{debug, warn};

const SELECTION_FILE: &str = "toolchain";

pub struct JvmToolchains {
	workspace_root: PathBuf,
	search_roots: Vec<PathBuf>,
}

impl JvmToolchains {
	pub fn new(workspace_root: impl Into<PathBuf>, search_roots: Vec<PathBuf>) -> Self {
		Self {
			workspace_root: workspace_root.into(),
			search_roots,
		}
	}

	/// Searches `JAVA_HOME`, `/usr/lib/jvm` and `~/.jdks`.
	pub fn discover(workspace_root: impl Into<PathBuf>) -> Self {
		let mut roots = Vec::new();
		if let Some(home) = std::env::var_os("JAVA_HOME") {
			roots.push(PathBuf::from(home));
		}
		roots.push(PathBuf::from("/usr/lib/jvm"));
		if let Some(home) = dirs::home_dir() {
			roots.push(home.join(".jdks"));
		}
		Self::new(workspace_root, roots)
	}

	fn selection_path(&self) -> PathBuf {
		self.workspace_root.join(grd::workspace::PROFILE_DIR).join(SELECTION_FILE)
	}
}

impl ToolchainRegistry for JvmToolchains {
	fn current(&self) -> Option<Toolchain> {
		let content = fs::read_to_string(self.selection_path()).ok()?;
		let mut lines = content.lines();
		Some(Toolchain::new(lines.next()?, lines.next()?))
	}

	fn available(&self) -> Vec<Toolchain> {
		let mut found = Vec::new();
		for root in &self.search_roots {
			if let Some(toolchain) = read_jdk(root) {
				found.push(toolchain);
				continue;
			}
			let Ok(entries) = fs::read_dir(root) else {
				continue;
			};
			found.extend(entries.filter_map(|entry| entry.ok()).filter_map(|entry| read_jdk(&entry.path())));
		}
		debug!(target = "grd.finalize", count = found.len(), "toolchains discovered");
		found
	}

	fn select(&self, toolchain: &Toolchain) {
		let path = self.selection_path();
		let written = path
			.parent()
			.map_or(Ok(()), fs::create_dir_all)
			.and_then(|()| fs::write(&path, format!("{}\n{}\n", toolchain.name, toolchain.version)));
		if let Err(err) = written {
			warn!(target = "grd.finalize", path = %path.display(), error = %err, "could not store toolchain selection");
		}
	}
}

fn read_jdk(dir: &Path) -> Option<Toolchain> {
	let release = fs::read_to_string(dir.join("release")).ok()?;
	let version = release
		.lines()
		.find_map(|line| line.strip_prefix("JAVA_VERSION="))
		.map(|value| value.trim().trim_matches('"').to_string())?;
	let name = dir.file_name()?.to_string_lossy().into_owned();
	Some(Toolchain::new(name, version))
}
