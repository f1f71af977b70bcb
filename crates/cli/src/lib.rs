pub mod cli;
pub mod commands;
pub mod local;
pub mod logging;
pub mod prompt;
