//! Terminal output helpers. Everything goes to stderr.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use console::Term;
use kiln_bundler::{ArtifactSummary, BuildReport};
use owo_colors::OwoColorize;

static COLORS: AtomicBool = AtomicBool::new(true);

/// Decide once whether output is colored: `--no-color`, `NO_COLOR` and a
/// non-terminal stderr all turn colors off.
pub fn init_colors(no_color: bool) {
    let enabled = !no_color
        && std::env::var_os("NO_COLOR").is_none()
        && Term::stderr().features().colors_supported();
    COLORS.store(enabled, Ordering::Relaxed);
}

pub fn colors_enabled() -> bool {
    COLORS.load(Ordering::Relaxed)
}

fn line(symbol: &str, styled_symbol: impl Display, message: &str, styled_message: impl Display) {
    if colors_enabled() {
        eprintln!("{styled_symbol} {styled_message}");
    } else {
        eprintln!("{symbol} {message}");
    }
}

pub fn success(message: &str) {
    line("✓", "✓".green().bold(), message, message);
}

pub fn info(message: &str) {
    line("ℹ", "ℹ".blue().bold(), message, message);
}

pub fn warning(message: &str) {
    line("⚠", "⚠".yellow().bold(), message, message.yellow());
}

pub fn error(message: &str) {
    line("✗", "✗".red().bold(), message, message.red());
}

/// Only printed when `RUST_LOG` is set.
pub fn debug(message: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        line("·", "·".dimmed(), message, message.dimmed());
    }
}

/// ```
/// use kiln_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.2} {}", UNITS[unit])
    }
}

/// ```
/// use std::time::Duration;
/// use kiln_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    if total_ms < 1000 {
        format!("{total_ms}ms")
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

fn artifact_line(artifact: &ArtifactSummary, width: usize) -> String {
    let size = format_size(artifact.size as u64);
    if colors_enabled() {
        format!(
            "  {:<width$}  {size:>10}  {}",
            artifact.path,
            artifact.category.dimmed()
        )
    } else {
        format!("  {:<width$}  {size:>10}  {}", artifact.path, artifact.category)
    }
}

pub fn print_build_summary(report: &BuildReport) {
    let width = report
        .artifacts
        .iter()
        .map(|a| a.path.len())
        .max()
        .unwrap_or(0);

    for artifact in &report.artifacts {
        eprintln!("{}", artifact_line(artifact, width));
    }
    if !report.removed.is_empty() {
        info(&format!("{} stale file(s) removed", report.removed.len()));
    }

    success(&format!(
        "Built {} artifacts into {} in {}",
        report.artifacts.len(),
        report.output_dir.display(),
        format_duration(report.duration)
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_config::Category;

    #[test]
    fn plain_artifact_line_is_aligned() {
        COLORS.store(false, Ordering::Relaxed);
        let artifact = ArtifactSummary {
            path: "js/main.js".to_string(),
            category: Category::Script,
            size: 2048,
            entry: Some("main".to_string()),
        };
        assert_eq!(
            artifact_line(&artifact, 12),
            "  js/main.js       2.00 KB  script"
        );
    }
}
