//! CLI errors and their conversion to miette reports.

use miette::Report;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Config discovery or parsing failed before a pipeline existed
    #[error(transparent)]
    Config(#[from] kiln_config::ConfigError),

    /// The build pipeline failed
    #[error(transparent)]
    Build(#[from] kiln_bundler::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Render through the bundler's diagnostics so codes and help text show up.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => Report::new(e),
        CliError::Config(e) => Report::new(kiln_bundler::Error::from(e)),
        other => miette::miette!("{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_config::ConfigError;

    #[test]
    fn config_errors_carry_bundler_diagnostic_code() {
        let report = cli_error_to_miette(CliError::Config(ConfigError::NoEntries));
        let code = report.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("kiln::config"));
        assert!(report.help().is_some());
    }

    #[test]
    fn cycle_errors_keep_their_code() {
        let err = kiln_bundler::Error::Cycle {
            cycles: vec!["a.js -> b.js -> a.js".to_string()],
        };
        let report = cli_error_to_miette(err.into());
        assert_eq!(
            report.code().map(|c| c.to_string()).as_deref(),
            Some("kiln::cycle")
        );
        assert!(report.to_string().contains("a.js -> b.js -> a.js"));
    }
}
