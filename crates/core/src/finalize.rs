//! Toolchain selection once the workspace import converged.

use std::sync::Arc;

use grd_runtime::Dispatcher;
use tracing::{error, info};

use crate::collaborators::{Toolchain, ToolchainRegistry};

pub const DEFAULT_TOOLCHAIN_TARGET: u32 = 21;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
	AlreadySet(Toolchain),
	Selected(Toolchain),
	NoneSuitable,
	/// The foreground context was gone.
	Skipped,
}

#[derive(Clone)]
pub struct ToolchainFinalizer {
	registry: Arc<dyn ToolchainRegistry>,
	dispatcher: Dispatcher,
	target: u32,
}

impl ToolchainFinalizer {
	pub fn new(registry: Arc<dyn ToolchainRegistry>, dispatcher: Dispatcher, target: u32) -> Self {
		Self {
			registry,
			dispatcher,
			target,
		}
	}

	/// Selects a toolchain unless one is already set. Never fails the session.
	pub async fn finalize(&self) -> FinalizeOutcome {
		let registry = Arc::clone(&self.registry);
		let target = self.target;
		let outcome = self
			.dispatcher
			.foreground(move || {
				if let Some(current) = registry.current() {
					return FinalizeOutcome::AlreadySet(current);
				}
				let available = registry.available();
				match choose(&available, target) {
					Some(toolchain) => {
						registry.select(toolchain);
						FinalizeOutcome::Selected(toolchain.clone())
					}
					None => FinalizeOutcome::NoneSuitable,
				}
			})
			.await
			.unwrap_or(FinalizeOutcome::Skipped);

		match &outcome {
			FinalizeOutcome::Selected(toolchain) => {
				info!(target = "grd.finalize", name = %toolchain.name, version = %toolchain.version, "selected toolchain")
			}
			FinalizeOutcome::NoneSuitable => error!(target = "grd.finalize", target_version = target, "no toolchain satisfies the target version"),
			_ => {}
		}
		outcome
	}
}

/// Lowest toolchain whose major version is at least `target`.
pub fn choose(available: &[Toolchain], target: u32) -> Option<&Toolchain> {
	available
		.iter()
		.filter_map(|toolchain| major_version(&toolchain.version).map(|major| (major, toolchain)))
		.filter(|(major, _)| *major >= target)
		.min_by_key(|(major, _)| *major)
		.map(|(_, toolchain)| toolchain)
}

/// Parses the major version from strings like `21.0.2`, `openjdk-17` or `1.8.0_292`.
pub fn major_version(version: &str) -> Option<u32> {
	let start = version.find(|c: char| c.is_ascii_digit())?;
	let mut parts = version[start..].split(|c: char| !c.is_ascii_digit()).filter(|part| !part.is_empty());
	let first: u32 = parts.next()?.parse().ok()?;
	if first == 1 {
		if let Some(second) = parts.next().and_then(|part| part.parse().ok()) {
			return Some(second);
		}
	}
	Some(first)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::FakeToolchains;

	fn toolchains() -> Vec<Toolchain> {
		vec![
			Toolchain::new("jdk-25", "25.0.1"),
			Toolchain::new("jdk-17", "17.0.9"),
			Toolchain::new("broken", "unknown"),
			Toolchain::new("jdk-22", "22"),
			Toolchain::new("jdk-8", "1.8.0_292"),
		]
	}

	#[test]
	fn parses_common_version_shapes() {
		assert_eq!(major_version("21.0.2"), Some(21));
		assert_eq!(major_version("openjdk-17"), Some(17));
		assert_eq!(major_version("1.8.0_292"), Some(8));
		assert_eq!(major_version("unknown"), None);
	}

	#[test]
	fn picks_lowest_version_meeting_target() {
		let available = toolchains();
		assert_eq!(choose(&available, 21).map(|t| t.name.as_str()), Some("jdk-22"));
		assert_eq!(choose(&available, 17).map(|t| t.name.as_str()), Some("jdk-17"));
		assert_eq!(choose(&available, 26), None);
	}

	#[tokio::test]
	async fn keeps_existing_selection() {
		let registry = FakeToolchains::new(Some(Toolchain::new("custom", "11")), toolchains());
		let finalizer = ToolchainFinalizer::new(registry.clone(), Dispatcher::inline(), DEFAULT_TOOLCHAIN_TARGET);

		assert_eq!(finalizer.finalize().await, FinalizeOutcome::AlreadySet(Toolchain::new("custom", "11")));
		assert!(registry.selected().is_empty());
	}

	#[tokio::test]
	async fn selects_when_nothing_is_set() {
		let registry = FakeToolchains::new(None, toolchains());
		let finalizer = ToolchainFinalizer::new(registry.clone(), Dispatcher::inline(), DEFAULT_TOOLCHAIN_TARGET);

		assert_eq!(finalizer.finalize().await, FinalizeOutcome::Selected(Toolchain::new("jdk-22", "22")));
		assert_eq!(registry.selected(), vec![Toolchain::new("jdk-22", "22")]);
	}

	#[tokio::test]
	async fn reports_when_nothing_qualifies() {
		let registry = FakeToolchains::new(None, vec![Toolchain::new("jdk-17", "17")]);
		let finalizer = ToolchainFinalizer::new(registry.clone(), Dispatcher::inline(), DEFAULT_TOOLCHAIN_TARGET);

		assert_eq!(finalizer.finalize().await, FinalizeOutcome::NoneSuitable);
		assert!(registry.selected().is_empty());
	}
}
