//! Kiln CLI - builds a theme's scripts, stylesheets, assets and dependency
//! manifest from a `kiln.toml`.
//!
//! - [`cli`] - argument definitions
//! - [`commands`] - `build` and `check`
//! - [`error`] - CLI errors and their miette rendering
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - terminal output helpers

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result};
