//! Interactive loop driving an active session from stdin.

use colored::Colorize;
use grd::{EndOutcome, SessionController, SessionEvent};
use grd_protocol::EndAction;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

const HELP: &str = "commands: submit, save, cancel, close, status, help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptCommand {
	End(EndAction),
	Status,
	Help,
}

impl PromptCommand {
	pub fn parse(input: &str) -> Option<Self> {
		match input.trim().to_ascii_lowercase().as_str() {
			"submit" => Some(Self::End(EndAction::Submit)),
			"save" => Some(Self::End(EndAction::Save)),
			"cancel" => Some(Self::End(EndAction::Cancel)),
			"close" | "quit" | "exit" => Some(Self::End(EndAction::Close)),
			"status" => Some(Self::Status),
			"help" | "?" => Some(Self::Help),
			_ => None,
		}
	}
}

/// Prints a line once the workspace finished importing.
pub fn announce_ready(controller: &SessionController) {
	controller.add_listener(|event| {
		if let SessionEvent::EnvironmentReady(item) = event {
			eprintln!("{} submission {item} is ready for grading", "ready:".green().bold());
		}
	});
}

/// Reads commands until the session ends. End of input and ctrl-c close the
/// session without touching the lock.
pub async fn run<R>(controller: &SessionController, input: R) -> EndOutcome
where
	R: AsyncBufRead + Unpin,
{
	let mut lines = input.lines();
	eprintln!("{HELP}");

	loop {
		let line = tokio::select! {
			line = lines.next_line() => line,
			_ = tokio::signal::ctrl_c() => {
				debug!(target = "grd.prompt", "interrupted");
				return controller.end(EndAction::Close).await;
			}
		};

		let line = match line {
			Ok(Some(line)) => line,
			Ok(None) => return controller.end(EndAction::Close).await,
			Err(err) => {
				warn!(target = "grd.prompt", error = %err, "could not read input");
				return controller.end(EndAction::Close).await;
			}
		};
		if line.trim().is_empty() {
			continue;
		}

		match PromptCommand::parse(&line) {
			Some(PromptCommand::End(action)) => return controller.end(action).await,
			Some(PromptCommand::Status) => match controller.current() {
				Some(snapshot) => println!(
					"item {} of exercise {} ({} round): {} in {}",
					snapshot.item,
					snapshot.exercise,
					snapshot.round,
					snapshot.state,
					snapshot.workspace_root.display()
				),
				None => println!("no active assessment"),
			},
			Some(PromptCommand::Help) => eprintln!("{HELP}"),
			None => eprintln!("unknown command {:?}; {HELP}", line.trim()),
		}
	}
}
