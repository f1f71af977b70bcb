//! `grade` and `reopen`: run one session to completion.

use anyhow::{Result, anyhow};
use grd::{EndOutcome, SessionController, Settings, StartOutcome};
use grd_protocol::{CorrectionRound, ExerciseId, ItemId, ItemRef, LockRequest};
use grd_runtime::Dispatcher;
use tokio::io::BufReader;
use tracing::info;

use crate::{local, prompt};

pub async fn grade(settings: Settings, exercise: u64, round: u8) -> Result<i32> {
	let request = LockRequest {
		exercise_id: ExerciseId(exercise),
		round: parse_round(round)?,
	};
	let controller = controller(&settings)?;
	let outcome = controller.start(request).await;
	drive(&controller, outcome).await
}

pub async fn reopen(settings: Settings, exercise: u64, item: u64, round: u8) -> Result<i32> {
	let item = ItemRef {
		exercise_id: ExerciseId(exercise),
		item_id: ItemId(item),
		round: parse_round(round)?,
	};
	let controller = controller(&settings)?;
	let outcome = controller.reopen(item).await;
	drive(&controller, outcome).await
}

fn parse_round(round: u8) -> Result<CorrectionRound> {
	CorrectionRound::from_number(round).ok_or_else(|| anyhow!("unknown correction round {round}"))
}

fn controller(settings: &Settings) -> Result<SessionController> {
	let controller = SessionController::new(settings, local::collaborators(settings), Dispatcher::spawn()?);
	prompt::announce_ready(&controller);
	Ok(controller)
}

async fn drive(controller: &SessionController, outcome: StartOutcome) -> Result<i32> {
	let code = match outcome {
		StartOutcome::Started(snapshot) => {
			println!("{}", snapshot.workspace_root.display());
			let ended = prompt::run(controller, BufReader::new(tokio::io::stdin())).await;
			info!(target = "grd.cli", outcome = ?ended, "session ended");
			match ended {
				EndOutcome::Finished { mutation_error: None, .. } => 0,
				_ => 1,
			}
		}
		StartOutcome::NothingToGrade => 0,
		StartOutcome::LockTaken | StartOutcome::Busy | StartOutcome::Failed(_) => 1,
	};
	Ok(code)
}
