//! Riskmine CLI library.
//!
//! Configuration loading, command execution and output formatting for the
//! `riskmine` binary. Each command opens its own store connections and builds
//! the components it needs from [`AppConfig`].

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::{AppConfig, OutputFormat};
pub use error::{CliError, Result};
pub use output::Formatter;
