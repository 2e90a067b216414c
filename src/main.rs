//! config-patcher
//!
//! Applies a patch file to a bracket-nested config file, keeping the
//! source's comments, layout and ordering.

use anyhow::{Context, Result};
use clap::Parser;
use config_patcher::cli::{Cli, ReportFormat};
use config_patcher::logging::init_logging;
use config_patcher::patcher::PatchJob;
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log, cli.verbose)
        .with_context(|| format!("failed to initialise logging to {}", cli.log))?;
    info!(version = env!("CARGO_PKG_VERSION"), "config-patcher");

    let job = PatchJob::new(&cli.source, &cli.patch)
        .with_output(cli.outfile.clone())
        .with_dry_run(cli.dry_run)
        .with_options(cli.patch_options());

    let outcome = job.run().with_context(|| {
        format!(
            "failed to patch {} with {}",
            job.source.display(),
            job.patch.display()
        )
    })?;

    if cli.dry_run {
        print!("{}", outcome.text);
    }

    match cli.report {
        Some(ReportFormat::Text) => eprint!("{}", outcome.report),
        Some(ReportFormat::Json) => eprintln!("{}", outcome.report.to_json()?),
        None => {}
    }

    Ok(())
}
