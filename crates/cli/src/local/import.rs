//! Headless stand-in for the editor's project import.

use std::path::Path;

use async_trait::async_trait;
use grd_runtime::{ImportSubsystem, PanelState, SignalSink};
use tracing::info;

const BUILD_FILES: [(&str, &str); 4] = [
	("pom.xml", "maven"),
	("build.gradle", "gradle"),
	("build.gradle.kts", "gradle"),
	("build.xml", "ant"),
];

/// Detects the build system and reports the import as done straight away.
pub struct HeadlessImport {
	signals: SignalSink,
}

impl HeadlessImport {
	pub fn new(signals: SignalSink) -> Self {
		Self { signals }
	}
}

#[async_trait]
impl ImportSubsystem for HeadlessImport {
	async fn register_project_files(&self, root: &Path) -> grd_runtime::Result<()> {
		let build = detect_build_system(root);
		info!(target = "grd.import", root = %root.display(), build = build.unwrap_or("none"), "workspace imported");
		self.signals.import_completed();
		self.signals.project_resolved();
		Ok(())
	}

	fn panel(&self) -> Option<PanelState> {
		Some(PanelState { visible: false })
	}

	fn hide_panel(&self) {}
}

pub fn detect_build_system(root: &Path) -> Option<&'static str> {
	BUILD_FILES
		.iter()
		.find(|(file, _)| root.join(file).is_file())
		.map(|(_, system)| *system)
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::time::Duration;

	use grd_runtime::{Dispatcher, InitializationMonitor, MonitorConfig};

	use super::*;

	#[test]
	fn detects_maven_before_gradle() {
		let dir = tempfile::tempdir().unwrap();
		assert_eq!(detect_build_system(dir.path()), None);
		std::fs::write(dir.path().join("build.gradle.kts"), "").unwrap();
		assert_eq!(detect_build_system(dir.path()), Some("gradle"));
		std::fs::write(dir.path().join("pom.xml"), "").unwrap();
		assert_eq!(detect_build_system(dir.path()), Some("maven"));
	}

	#[tokio::test]
	async fn monitor_converges_on_headless_import() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
		let signals = SignalSink::new();
		let import = Arc::new(HeadlessImport::new(signals.clone()));
		let config = MonitorConfig {
			poll_interval: Duration::from_millis(10),
			partial_timeout: Duration::from_secs(5),
			settle_delay: Duration::ZERO,
		};
		let monitor = InitializationMonitor::new(import, signals, Dispatcher::inline(), config);

		monitor.watch(dir.path());
		tokio::time::sleep(Duration::from_millis(200)).await;

		assert!(monitor.is_converged());
		assert_eq!(monitor.retry_count(), 0);
	}
}
