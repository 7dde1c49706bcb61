//! Logging setup.
//!
//! Filter precedence: `--verbose` (debug), `--quiet` (warn), `RUST_LOG`,
//! then info for the kiln crates. Logs go to stderr so stdout stays clean.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const KILN_CRATES: &[&str] = &["kiln_cli", "kiln_bundler", "kiln_graph", "kiln_config"];

/// Filter directives for the kiln crates at `level`.
pub fn directives(level: &str) -> String {
    KILN_CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new(directives("debug"))
    } else if quiet {
        EnvFilter::new(directives("warn"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives("info")))
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_every_crate() {
        assert_eq!(
            directives("warn"),
            "kiln_cli=warn,kiln_bundler=warn,kiln_graph=warn,kiln_config=warn"
        );
        let _filter = EnvFilter::new(directives("debug"));
    }
}
