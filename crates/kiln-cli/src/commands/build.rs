//! `kiln build`

use kiln_bundler::Pipeline;

use crate::cli::BuildArgs;
use crate::commands::load_project;
use crate::error::Result;
use crate::ui;

pub async fn execute(args: BuildArgs) -> Result<()> {
    let (root, config) = load_project(&args.project)?;
    ui::info(&format!(
        "Building {} entr{} ({})",
        config.entry.len(),
        if config.entry.len() == 1 { "y" } else { "ies" },
        config.mode
    ));

    let mut pipeline = Pipeline::new(&root, config);
    let report = match pipeline.run().await {
        Ok(report) => report,
        Err(err) => {
            ui::error("Build failed");
            return Err(err.into());
        }
    };

    for warning in &report.warnings {
        ui::warning(warning);
    }
    for removed in &report.removed {
        ui::debug(&format!("removed {removed}"));
    }
    ui::print_build_summary(&report);

    Ok(())
}
