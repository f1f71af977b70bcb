use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use grd_protocol::TransportKind;

#[derive(Parser, Debug)]
#[command(name = "grd")]
#[command(about = "Grade locked submissions in a local workspace")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Settings file (defaults to <config dir>/grd/settings.json)
	#[arg(long, global = true, value_name = "FILE")]
	pub settings: Option<PathBuf>,

	/// Workspace directory the submission is mirrored into
	#[arg(long, global = true, value_name = "DIR")]
	pub workspace: Option<PathBuf>,

	/// Directory holding the lock roster
	#[arg(long, global = true, value_name = "DIR")]
	pub roster: Option<PathBuf>,

	/// How submissions are cloned
	#[arg(long, global = true, value_enum)]
	pub transport: Option<TransportArg>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Lock the next submission of an exercise and grade it
	Grade {
		exercise: u64,
		/// Correction round
		#[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
		round: u8,
	},

	/// Lock a previously graded submission again
	Reopen {
		exercise: u64,
		item: u64,
		#[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
		round: u8,
	},

	/// Empty the workspace without touching any lock
	Clean,

	/// Print the effective settings
	Settings {
		/// Write the effective settings to the settings file
		#[arg(long)]
		init: bool,
	},
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TransportArg {
	Ssh,
	Token,
}

impl From<TransportArg> for TransportKind {
	fn from(arg: TransportArg) -> Self {
		match arg {
			TransportArg::Ssh => TransportKind::Ssh,
			TransportArg::Token => TransportKind::Token,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_grade_with_default_round() {
		let cli = Cli::try_parse_from(["grd", "grade", "12"]).unwrap();
		match cli.command {
			Commands::Grade { exercise, round } => {
				assert_eq!(exercise, 12);
				assert_eq!(round, 1);
			}
			_ => panic!("Expected Grade command"),
		}
	}

	#[test]
	fn parse_reopen_with_round_and_globals() {
		let cli = Cli::try_parse_from(["grd", "reopen", "12", "40", "-r", "2", "--transport", "ssh", "-vv"]).unwrap();
		assert_eq!(cli.verbose, 2);
		assert_eq!(cli.transport, Some(TransportArg::Ssh));
		match cli.command {
			Commands::Reopen { exercise, item, round } => {
				assert_eq!((exercise, item, round), (12, 40, 2));
			}
			_ => panic!("Expected Reopen command"),
		}
	}

	#[test]
	fn rejects_unknown_round() {
		assert!(Cli::try_parse_from(["grd", "grade", "12", "--round", "3"]).is_err());
	}

	#[test]
	fn parse_global_paths_after_subcommand() {
		let cli = Cli::try_parse_from(["grd", "clean", "--workspace", "/tmp/ws"]).unwrap();
		assert_eq!(cli.workspace, Some(PathBuf::from("/tmp/ws")));
		assert!(matches!(cli.command, Commands::Clean));
	}
}
