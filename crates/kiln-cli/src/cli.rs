//! Command-line interface definition.
//!
//! - `kiln build` - run a full build and write the output directory
//! - `kiln check` - resolve entries, crawl imports and check for cycles

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use kiln_config::Mode;

/// Kiln - asset builds for WordPress themes
#[derive(Parser, Debug)]
#[command(name = "kiln", version, about = "Build theme scripts, styles and dependency manifests")]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build every entry and write the output directory
    Build(BuildArgs),

    /// Validate the configuration and import graph without writing anything
    Check(CheckArgs),
}

/// Where the project lives and how to load it.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Build mode; falls back to KILN_MODE, then the config, then production
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Explicit config file (default: kiln.toml or package.json "kiln")
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Project root (default: current directory)
    #[arg(long)]
    pub cwd: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    #[value(alias = "dev")]
    Development,
    #[value(alias = "prod")]
    Production,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Development => Mode::Development,
            ModeArg::Production => Mode::Production,
        }
    }
}
