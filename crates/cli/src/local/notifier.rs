use colored::Colorize;
use grd::{Notice, NoticeLevel, Notifier};
use tracing::debug;

/// Prints notices to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
	fn notify(&self, notice: Notice) {
		debug!(target = "grd.notice", level = %notice.level, title = %notice.title, "notice");
		let label = match notice.level {
			NoticeLevel::Info => "info".blue().bold(),
			NoticeLevel::Warning => "warning".yellow().bold(),
			NoticeLevel::Error => "error".red().bold(),
		};
		eprintln!("{label}: {}", notice.title.bold());
		if !notice.body.is_empty() {
			eprintln!("  {}", notice.body);
		}
	}
}
