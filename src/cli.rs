//! Command-line interface definitions.
//!
//! One subcommand per pipeline stage plus `run` for the whole process.
//! Paths fall back to environment variables, then to the `data/` layout.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Daily sports-marketing report: collect, curate, compose and email.
///
/// # Examples
///
/// ```sh
/// farol_report --config env.yaml collect
/// farol_report curate --source data/bruto --output data/curado
/// farol_report report --html-out relatorio.html --no-send
/// farol_report run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Settings file (YAML)
    #[arg(short, long, global = true, env = "FAROL_CONFIG", default_value = "env.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Collect every category into today's snapshots, then archive old ones
    Collect {
        #[arg(long, env = "FAROL_DATA_DIR", default_value = "data/bruto")]
        data_dir: PathBuf,
        /// Overrides `collection.retention_days`; at least 1
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        retention_days: Option<i64>,
    },
    /// Move snapshots older than the retention window into `archive/`
    Archive {
        #[arg(long, env = "FAROL_DATA_DIR", default_value = "data/bruto")]
        data_dir: PathBuf,
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        retention_days: Option<i64>,
    },
    /// Run the four analyses over today's snapshots
    Curate {
        #[arg(long, env = "FAROL_DATA_DIR", default_value = "data/bruto")]
        source: PathBuf,
        #[arg(long, env = "FAROL_CURATED_DIR", default_value = "data/curado")]
        output: PathBuf,
    },
    /// Compose the report from the latest analyses and send it
    Report {
        #[arg(long, env = "FAROL_DATA_DIR", default_value = "data/bruto")]
        source: PathBuf,
        #[arg(long, env = "FAROL_CURATED_DIR", default_value = "data/curado")]
        curated: PathBuf,
        /// Also write the rendered HTML here
        #[arg(long)]
        html_out: Option<PathBuf>,
        /// Compose only; skip delivery
        #[arg(long)]
        no_send: bool,
    },
    /// Collect, curate, compose and send in one go
    Run {
        #[arg(long, env = "FAROL_DATA_DIR", default_value = "data/bruto")]
        data_dir: PathBuf,
        #[arg(long, env = "FAROL_CURATED_DIR", default_value = "data/curado")]
        curated: PathBuf,
        #[arg(long)]
        html_out: Option<PathBuf>,
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        retention_days: Option<i64>,
    },
}

impl Command {
    /// Banner name for start/finish messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Collect { .. } => "collect",
            Command::Archive { .. } => "archive",
            Command::Curate { .. } => "curate",
            Command::Report { .. } => "report",
            Command::Run { .. } => "run",
        }
    }
}
