use std::path::Path;

use anyhow::{Context, Result, bail};
use grd::Settings;

pub fn run(settings: &Settings, init: bool, path: Option<&Path>) -> Result<i32> {
	let mut shown = settings.clone();
	if shown.vcs_token.is_some() {
		shown.vcs_token = Some("***".to_string());
	}
	println!("{}", serde_json::to_string_pretty(&shown)?);

	if init {
		let Some(path) = path else {
			bail!("no settings location available; pass --settings");
		};
		settings.save(path).with_context(|| format!("could not write {}", path.display()))?;
		eprintln!("wrote {}", path.display());
	}
	Ok(0)
}
