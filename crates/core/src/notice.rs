//! User-facing notices.

use std::fmt;

use tracing::{error, info, warn};

use crate::collaborators::Notifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
	Info,
	Warning,
	Error,
}

impl fmt::Display for NoticeLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Info => f.write_str("info"),
			Self::Warning => f.write_str("warning"),
			Self::Error => f.write_str("error"),
		}
	}
}

/// Message shown to the corrector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
	pub level: NoticeLevel,
	pub title: String,
	pub body: String,
}

impl Notice {
	pub fn new(level: NoticeLevel, title: impl Into<String>, body: impl Into<String>) -> Self {
		Self {
			level,
			title: title.into(),
			body: body.into(),
		}
	}

	pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
		Self::new(NoticeLevel::Info, title, body)
	}

	pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
		Self::new(NoticeLevel::Warning, title, body)
	}

	pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
		Self::new(NoticeLevel::Error, title, body)
	}
}

/// Notifier that only logs. Used when nothing else is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
	fn notify(&self, notice: Notice) {
		match notice.level {
			NoticeLevel::Info => info!(target = "grd.notice", title = %notice.title, "{}", notice.body),
			NoticeLevel::Warning => warn!(target = "grd.notice", title = %notice.title, "{}", notice.body),
			NoticeLevel::Error => error!(target = "grd.notice", title = %notice.title, "{}", notice.body),
		}
	}
}
