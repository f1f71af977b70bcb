use thiserror::Error;

/// Errors raised by the execution contexts and the import trigger.
#[derive(Debug, Error)]
pub enum RuntimeError {
	#[error("foreground context is shut down")]
	DispatcherClosed,

	#[error("foreground job dropped before completing")]
	JobDropped,

	#[error("failed to start foreground context: {0}")]
	Spawn(#[source] std::io::Error),

	#[error("background job failed: {0}")]
	Join(#[from] tokio::task::JoinError),

	#[error("import trigger failed: {0}")]
	Import(String),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
