use std::path::Path;

use async_trait::async_trait;
use grd::{Autograder, GradeError, Result};
use grd_protocol::LockedItem;
use tokio::process::Command;
use tracing::info;

/// Runs a configured command inside the workspace.
pub struct CommandAutograder {
	command: Vec<String>,
}

impl CommandAutograder {
	pub fn new(command: Vec<String>) -> Self {
		Self { command }
	}
}

#[async_trait]
impl Autograder for CommandAutograder {
	async fn run(&self, item: &LockedItem, workspace: &Path) -> Result<()> {
		let Some((program, args)) = self.command.split_first() else {
			return Err(GradeError::Autograder("no autograder command configured".to_string()));
		};
		let status = Command::new(program)
			.args(args)
			.current_dir(workspace)
			.env("GRD_ITEM", item.item_id().to_string())
			.env("GRD_EXERCISE", item.exercise_id.to_string())
			.status()
			.await
			.map_err(|err| GradeError::Autograder(format!("could not start {program}: {err}")))?;
		if !status.success() {
			return Err(GradeError::Autograder(format!("{program} exited with {status}")));
		}
		info!(target = "grd.autograder", item = %item.item_id(), "autograder finished");
		Ok(())
	}
}
