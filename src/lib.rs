pub mod aggregate;
pub mod cli;
pub mod error;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod series;
pub mod settings;
pub mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use cli::{Args, Command};
use pipeline::{CsvReferenceDir, Pipeline};
use settings::AnalysisSettings;

pub use error::AnalysisError;

const ENABLE_LOGS: bool = true;

pub fn run() -> Result<()> {
    let args = Args::parse();
    utils::logging::init(args.verbose);

    match args.command {
        Command::Correlate {
            input,
            config,
            references,
            output,
            series_dir,
        } => correlate(input, config, references, output, series_dir),
        Command::Masterfile { input, output } => masterfile(input, output),
    }
}

fn correlate(
    input: PathBuf,
    config: PathBuf,
    references: Option<PathBuf>,
    output: Option<PathBuf>,
    series_dir: Option<PathBuf>,
) -> Result<()> {
    let settings = AnalysisSettings::load(&config)?;
    let reference_dir = references.unwrap_or_else(|| settings.reference_dir().to_path_buf());
    let output = output.unwrap_or_else(|| settings.output_dir().join("correlations.tsv"));

    if !input.exists() {
        anyhow::bail!("export path {} does not exist", input.display());
    }

    let trials = ingest::load_export(&input, settings.require_full_payload)?;
    log_info!("Read {} trials from {}", trials.len(), input.display());

    let pipeline = Pipeline::new(
        settings.pipeline_config()?,
        CsvReferenceDir::new(reference_dir),
    );
    let report = pipeline.run(trials).context("correlation pipeline failed")?;

    if !report.skipped.is_empty() {
        log_warn!("{} trials skipped", report.skipped.len());
    }
    for ((participant, session), trials) in report.aggregator().by_participant() {
        log_debug!("PPT {} session {}: {} trials", participant, session, trials.len());
    }

    report::save_records(&output, &report.records)?;

    if let Some(dir) = series_dir {
        report::write_stimulus_series(&dir, &report.stimulus_series())?;
    }

    Ok(())
}

fn masterfile(input: PathBuf, output: PathBuf) -> Result<()> {
    let records = report::load_records(&input)?;
    let table = report::rotate(&records);
    report::masterfile::save_table(&output, &table)?;
    log_info!(
        "Wrote {} participants x {} sessions to {}",
        table.rows.len(),
        table.sessions.len(),
        output.display()
    );
    Ok(())
}
