//! `kiln check`: configure and resolve without bundling.

use kiln_bundler::Pipeline;

use crate::cli::CheckArgs;
use crate::commands::load_project;
use crate::error::Result;
use crate::ui;

pub fn execute(args: CheckArgs) -> Result<()> {
    let (root, config) = load_project(&args.project)?;
    let report = Pipeline::new(&root, config).check()?;

    for warning in &report.warnings {
        ui::warning(warning);
    }
    ui::success(&format!(
        "{} entries, {} modules, {} externals ({})",
        report.entries.len(),
        report.modules,
        report.externals.len(),
        report.mode
    ));
    for external in &report.externals {
        ui::info(&format!("  external {external}"));
    }

    Ok(())
}
