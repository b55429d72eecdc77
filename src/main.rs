//! # Farol de Notícias
//!
//! Daily sports-marketing report for the BetMGM account: collects sports
//! schedules, results, news and special dates, has an LLM curate them into
//! betting-relevant analyses, renders an HTML email and sends it through
//! Gmail.
//!
//! ## Usage
//!
//! ```sh
//! farol_report --config env.yaml run
//! ```
//!
//! ## Architecture
//!
//! 1. **Collect**: one dated JSON snapshot per category under `data/bruto/daily`,
//!    with fixture fallback when a live source fails
//! 2. **Curate**: four analyses (news, events, market, strategy) under `data/curado`
//! 3. **Compose**: extract items from the analyses and render the HTML report
//! 4. **Deliver**: send the report through the Gmail API

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use std::time::Duration as StdDuration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod collector;
mod composer;
mod config;
mod curator;
mod delivery;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use api::{AskFnWrapper, RetryAsk, build_generator};
use cli::{Cli, Command};
use collector::Collector;
use collector::fixtures::StaticFixtures;
use config::Settings;
use curator::Curator;
use delivery::gmail::GmailSender;
use pipeline::{MailRoute, PipelinePaths};
use scrapers::HttpSources;
use utils::now_sao_paulo;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    let name = args.command.name();
    let start_time = std::time::Instant::now();
    info!(command = name, version = env!("CARGO_PKG_VERSION"), "🚨 Farol de Notícias starting");

    match run(args).await {
        Ok(()) => {
            info!(
                command = name,
                secs = start_time.elapsed().as_secs_f64(),
                "✅ {name} completed successfully"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(command = name, error = %e, "❌ {name} failed");
            ExitCode::FAILURE
        }
    }
}

fn collector(
    settings: &Settings,
    data_dir: std::path::PathBuf,
) -> Result<Collector<HttpSources, StaticFixtures>, Box<dyn Error>> {
    let sources = HttpSources::new(settings.require_sources()?.clone())?;
    Ok(Collector::new(sources, StaticFixtures, data_dir))
}

async fn generator(settings: &Settings) -> Result<RetryAsk<AskFnWrapper>, Box<dyn Error>> {
    let generation = settings.require_generation()?;
    build_generator(
        &generation.template,
        generation.aj_config.as_deref(),
        generation.max_attempts,
        StdDuration::from_secs(generation.retry_delay_secs),
    )
    .await
}

fn mail(settings: &Settings) -> Result<(GmailSender, MailRoute), Box<dyn Error>> {
    let gmail = settings.require_gmail()?;
    let route = MailRoute {
        from: gmail.sender_email.clone(),
        to: gmail.recipient_email.clone(),
    };
    Ok((GmailSender::new(gmail)?, route))
}

async fn run(args: Cli) -> Result<(), Box<dyn Error>> {
    let settings = Settings::load(&args.config)?;

    match args.command {
        Command::Collect {
            data_dir,
            retention_days,
        } => {
            let retention = retention_days.unwrap_or(settings.collection.retention_days);
            let summary = collector(&settings, data_dir)?
                .run_full_collection(retention)
                .await?;
            info!(
                total = summary.total_items_collected,
                archived = summary.archived_files,
                "Collection summary"
            );
        }
        Command::Archive {
            data_dir,
            retention_days,
        } => {
            let retention = retention_days.unwrap_or(settings.collection.retention_days);
            let outcome = collector(&settings, data_dir)?
                .archive_old_snapshots(retention)
                .await?;
            info!(
                archived = outcome.archived.len(),
                skipped = outcome.skipped.len(),
                failed = outcome.failed.len(),
                "Archive summary"
            );
        }
        Command::Curate { source, output } => {
            let curator = Curator::new(generator(&settings).await?);
            let run = curator.run_full_curation(&source, &output).await?;
            info!(
                processed = run.summary.total_data_processed,
                success = run.summary.processing_success,
                "Curation summary"
            );
        }
        Command::Report {
            source,
            curated,
            html_out,
            no_send,
        } => {
            let report = pipeline::generate_report(&source, &curated, now_sao_paulo()).await?;
            if let Some(path) = &html_out {
                pipeline::save_html(&report, path).await?;
            }
            if no_send {
                info!(subject = %report.subject, "Delivery skipped (--no-send)");
            } else {
                let (sender, route) = mail(&settings)?;
                let id = pipeline::send_report(&sender, &route, &report).await?;
                info!(message_id = %id, to = %route.to, "Report sent");
            }
        }
        Command::Run {
            data_dir,
            curated,
            html_out,
            retention_days,
        } => {
            let retention = retention_days.unwrap_or(settings.collection.retention_days);
            let (sender, route) = mail(&settings)?;
            let now = now_sao_paulo();
            let collector = collector(&settings, data_dir.clone())?.with_now(now);
            let curator = Curator::new(generator(&settings).await?).with_now(now);
            let paths = PipelinePaths {
                raw_dir: data_dir,
                curated_dir: curated,
                html_out,
            };
            let outcome = pipeline::run_full_process(
                &collector, &curator, &sender, &route, &paths, retention, now,
            )
            .await?;
            info!(
                collected = outcome.collection.total_items_collected,
                curation_success = outcome.curation.processing_success,
                message_id = %outcome.message_id,
                "Full process summary"
            );
        }
    }
    Ok(())
}
