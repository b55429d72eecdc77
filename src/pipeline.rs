//! Stage orchestration: collect → curate → compose → deliver.
//!
//! Each stage is also callable on its own from the command surface. Stages
//! talk only through the files under the raw and curated directories.

use crate::api::AskAsync;
use crate::collector::Collector;
use crate::collector::fixtures::FixtureProvider;
use crate::collector::snapshot::load_day;
use crate::composer::compose;
use crate::curator::{Curator, load_latest};
use crate::delivery::{MailSender, deliver};
use crate::models::{CollectionSummary, CurationSummary, Report};
use crate::scrapers::SportsSource;
use chrono::{DateTime, FixedOffset};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Where each stage reads and writes.
#[derive(Debug, Clone)]
pub struct PipelinePaths {
    /// Collector output; snapshots live in `raw_dir/daily`.
    pub raw_dir: PathBuf,
    pub curated_dir: PathBuf,
    /// Optional copy of the rendered HTML.
    pub html_out: Option<PathBuf>,
}

/// Sender and recipient of the report.
#[derive(Debug, Clone)]
pub struct MailRoute {
    pub from: String,
    pub to: String,
}

#[derive(Debug)]
pub struct ProcessOutcome {
    pub collection: CollectionSummary,
    pub curation: CurationSummary,
    pub message_id: String,
}

/// Compose today's report from whatever has been curated and collected.
#[instrument(level = "info", skip_all, fields(raw = %raw_dir.display(), curated = %curated_dir.display()))]
pub async fn generate_report(
    raw_dir: &Path,
    curated_dir: &Path,
    now: DateTime<FixedOffset>,
) -> Result<Report, Box<dyn Error>> {
    let curation = load_latest(curated_dir).await?;
    if curation.is_empty() {
        warn!("No curated analyses found; composing from raw data only");
    }
    let day = load_day(&raw_dir.join("daily"), now.date_naive()).await;
    let total_collected = day.values().map(Vec::len).sum();
    Ok(compose(&curation, &day, total_collected, now))
}

/// Write the rendered HTML next to the run's outputs.
pub async fn save_html(report: &Report, path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &report.html).await?;
    info!(path = %path.display(), bytes = report.html.len(), "Report HTML saved");
    Ok(())
}

/// Send a composed report.
pub async fn send_report<M: MailSender>(
    sender: &M,
    route: &MailRoute,
    report: &Report,
) -> Result<String, Box<dyn Error>> {
    deliver(
        sender,
        &route.from,
        &route.to,
        &report.subject,
        &report.html,
        report.plain_text.as_deref(),
    )
    .await
}

/// Run every stage in order. Collection, curation and delivery failures
/// abort the run; degraded sources and analyses do not.
#[instrument(level = "info", skip_all, fields(date = %now.format("%Y-%m-%d")))]
pub async fn run_full_process<S, F, G, M>(
    collector: &Collector<S, F>,
    curator: &Curator<G>,
    sender: &M,
    route: &MailRoute,
    paths: &PipelinePaths,
    retention_days: i64,
    now: DateTime<FixedOffset>,
) -> Result<ProcessOutcome, Box<dyn Error>>
where
    S: SportsSource,
    F: FixtureProvider,
    G: AskAsync<Response = String>,
    M: MailSender,
{
    let started = Instant::now();

    info!("Step 1/3: collecting");
    let collection = collector
        .run_full_collection(retention_days)
        .await
        .inspect_err(|e| error!(error = %e, "Collection failed"))?;

    info!("Step 2/3: curating");
    let curation = curator
        .run_full_curation(&paths.raw_dir, &paths.curated_dir)
        .await
        .inspect_err(|e| error!(error = %e, "Curation failed"))?;
    if !curation.summary.processing_success {
        warn!("Some analyses degraded; the report will use raw samples");
    }

    info!("Step 3/3: composing and sending");
    let report = generate_report(&paths.raw_dir, &paths.curated_dir, now).await?;
    if let Some(path) = &paths.html_out {
        if let Err(e) = save_html(&report, path).await {
            error!(error = %e, "Could not save report HTML");
        }
    }
    let message_id = send_report(sender, route, &report).await?;

    info!(
        secs = started.elapsed().as_secs_f64(),
        collected = collection.total_items_collected,
        %message_id,
        "Full process complete"
    );
    Ok(ProcessOutcome {
        collection,
        curation: curation.summary,
        message_id,
    })
}
