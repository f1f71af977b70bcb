//! Subcommand implementations.
//!
//! Every command returns the process exit code. Errors are reserved for
//! problems outside a session, such as unreadable settings.

mod clean;
mod session;
mod settings;

use anyhow::{Context, Result};
use grd::Settings;
use tracing::debug;

use crate::cli::{Cli, Commands};

/// Environment variable holding the VCS access token.
pub const TOKEN_ENV: &str = "GRD_VCS_TOKEN";

pub async fn dispatch(cli: Cli) -> Result<i32> {
	let path = cli.settings.clone().or_else(Settings::default_path);
	let mut settings = match path.as_deref() {
		Some(path) => Settings::load_from(path).with_context(|| format!("could not load settings from {}", path.display()))?,
		None => Settings::default(),
	};
	apply_overrides(&mut settings, &cli);
	debug!(target = "grd.cli", workspace = %settings.workspace_root.display(), roster = %settings.roster.display(), "settings resolved");

	match cli.command {
		Commands::Grade { exercise, round } => {
			apply_token_env(&mut settings);
			session::grade(settings, exercise, round).await
		}
		Commands::Reopen { exercise, item, round } => {
			apply_token_env(&mut settings);
			session::reopen(settings, exercise, item, round).await
		}
		Commands::Clean => clean::run(settings).await,
		Commands::Settings { init } => settings::run(&settings, init, path.as_deref()),
	}
}

/// Command-line flags win over the settings file.
fn apply_overrides(settings: &mut Settings, cli: &Cli) {
	if let Some(workspace) = &cli.workspace {
		settings.workspace_root = workspace.clone();
	}
	if let Some(roster) = &cli.roster {
		settings.roster = roster.clone();
	}
	if let Some(transport) = cli.transport {
		settings.transport = transport.into();
	}
}

/// The token variable wins over a stored token. Not applied to `settings --init`
/// so the token never ends up on disk by accident.
fn apply_token_env(settings: &mut Settings) {
	match std::env::var(TOKEN_ENV) {
		Ok(token) if !token.is_empty() => settings.vcs_token = Some(token),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use clap::Parser;
	use grd_protocol::TransportKind;

	use super::*;

	#[test]
	fn flags_override_settings() {
		let cli = Cli::try_parse_from(["grd", "clean", "--workspace", "/tmp/ws", "--roster", "/tmp/roster", "--transport", "ssh"]).unwrap();
		let mut settings = Settings::default();

		apply_overrides(&mut settings, &cli);

		assert_eq!(settings.workspace_root, PathBuf::from("/tmp/ws"));
		assert_eq!(settings.roster, PathBuf::from("/tmp/roster"));
		assert_eq!(settings.transport, TransportKind::Ssh);
	}

	#[test]
	fn missing_flags_keep_settings() {
		let cli = Cli::try_parse_from(["grd", "clean"]).unwrap();
		let mut settings = Settings {
			workspace_root: PathBuf::from("/srv/ws"),
			..Settings::default()
		};

		apply_overrides(&mut settings, &cli);

		assert_eq!(settings.workspace_root, PathBuf::from("/srv/ws"));
	}
}
