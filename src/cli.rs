use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Empathic accuracy scoring for lab.js rating exports")]
pub struct Args {
    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Correlate every trial with the actor's rating and the group mean
    Correlate {
        /// lab.js export (JSON array of uploads)
        #[arg(value_name = "EXPORT_PATH")]
        input: PathBuf,

        /// Path to settings JSON
        #[arg(long, default_value = "settings.json")]
        config: PathBuf,

        /// Directory of actor self-rating CSVs (overrides settings)
        #[arg(long)]
        references: Option<PathBuf>,

        /// Output TSV (defaults to <output_dir>/correlations.tsv)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also dump dense series for plotting into this directory
        #[arg(long)]
        series_dir: Option<PathBuf>,
    },

    /// Average trials per participant and session, one column per session
    Masterfile {
        /// Correlation TSV written by `correlate`
        input: PathBuf,
        output: PathBuf,
    },
}
