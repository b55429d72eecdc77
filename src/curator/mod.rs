//! Stage 2: turn the day's snapshots into generated analyses.
//!
//! Each [`AnalysisKind`] selects its inputs from the day's snapshots, renders
//! them into a bounded plain-text digest, prepends its instruction template
//! and sends the prompt to the generator. A failed or empty generation never
//! aborts the run: the analysis is stored in its failure shape with every
//! input passed through, and the composer renders from those instead.

pub mod prompts;

use crate::api::AskAsync;
use crate::collector::snapshot::load_day;
use crate::error::PipelineError;
use crate::models::{
    Category, CompletedAnalysis, CuratedAnalysis, CurationRun, CurationSummary, FailedAnalysis,
    NA, RawItem,
};
use crate::outputs::json::{read_json, write_json};
use crate::utils::{ensure_writable_dir, now_sao_paulo, truncate_for_log};
use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};

/// Inputs kept alongside a successful analysis.
pub const SAMPLE_SIZE: usize = 10;

/// Name of the summary entry saved next to the four analyses.
pub const SUMMARY_PREFIX: &str = "resumo_executivo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnalysisKind {
    News,
    Events,
    Market,
    Strategy,
}

impl AnalysisKind {
    /// Fixed processing order.
    pub const ALL: [AnalysisKind; 4] = [
        AnalysisKind::News,
        AnalysisKind::Events,
        AnalysisKind::Market,
        AnalysisKind::Strategy,
    ];

    pub fn file_prefix(self) -> &'static str {
        match self {
            AnalysisKind::News => "noticias_curadas",
            AnalysisKind::Events => "eventos_analisados",
            AnalysisKind::Market => "impacto_mercado",
            AnalysisKind::Strategy => "estrategia_betmgm",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            AnalysisKind::News => prompts::NEWS_CURATION,
            AnalysisKind::Events => prompts::EVENTS_ANALYSIS,
            AnalysisKind::Market => prompts::MARKET_IMPACT,
            AnalysisKind::Strategy => prompts::BETMGM_STRATEGY,
        }
    }

    fn digest_header(self) -> &'static str {
        match self {
            AnalysisKind::News => "NOTÍCIAS COLETADAS:",
            AnalysisKind::Events => "EVENTOS PROGRAMADOS:",
            AnalysisKind::Market => "TÓPICOS EM ALTA E MERCADO:",
            AnalysisKind::Strategy => "DADOS PARA ESTRATÉGIA BETMGM:",
        }
    }

    /// Most items rendered into one digest.
    pub fn digest_cap(self) -> usize {
        match self {
            AnalysisKind::News => 20,
            AnalysisKind::Events | AnalysisKind::Market => 15,
            AnalysisKind::Strategy => 13,
        }
    }

    /// Pick this analysis' inputs from a day of snapshots.
    pub fn select_inputs(self, day: &BTreeMap<Category, Vec<RawItem>>) -> Vec<RawItem> {
        let get = |c: Category| day.get(&c).map(Vec::as_slice).unwrap_or_default();
        match self {
            AnalysisKind::News => get(Category::News).to_vec(),
            AnalysisKind::Events => [Category::EventsToday, Category::EventsTomorrow, Category::Esports]
                .into_iter()
                .flat_map(|c| get(c).iter().cloned())
                .collect(),
            AnalysisKind::Market => get(Category::Trending)
                .iter()
                .chain(get(Category::Market))
                .cloned()
                .collect(),
            AnalysisKind::Strategy => get(Category::EventsToday)
                .iter()
                .take(5)
                .chain(get(Category::News).iter().take(5))
                .chain(get(Category::Trending).iter().take(3))
                .cloned()
                .collect(),
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_prefix())
    }
}

fn or_na(s: &str) -> &str {
    if s.trim().is_empty() { NA } else { s }
}

fn render_item(i: usize, item: &RawItem) -> String {
    match item {
        RawItem::Event(e) => {
            let mut out = format!(
                "{i}. {} vs {}\n   COMPETIÇÃO: {}\n   DATA: {} - HORÁRIO: {}\n   ESPORTE: {}\n",
                or_na(&e.home_team),
                or_na(&e.away_team),
                or_na(&e.league),
                or_na(&e.date),
                or_na(&e.time),
                or_na(&e.sport),
            );
            if let Some(score) = &e.score {
                out.push_str(&format!("   PLACAR: {score}\n"));
            }
            out
        }
        RawItem::News(n) => format!(
            "{i}. TÍTULO: {}\n   DESCRIÇÃO: {}\n   FONTE: {}\n   CATEGORIA: {}\n",
            or_na(&n.title),
            or_na(&n.description),
            or_na(&n.source),
            or_na(&n.category),
        ),
        RawItem::Trend(t) => format!("{i}. {}: {} menções\n", or_na(&t.keyword), t.mentions),
        RawItem::Holiday(h) => format!(
            "{i}. {} ({}): {}\n",
            or_na(&h.name),
            or_na(&h.date),
            or_na(&h.impact)
        ),
    }
}

/// Plain-text rendering of at most [`AnalysisKind::digest_cap`] items.
pub fn digest(kind: AnalysisKind, items: &[RawItem]) -> String {
    let mut out = format!("{}\n\n", kind.digest_header());
    for (i, item) in items.iter().take(kind.digest_cap()).enumerate() {
        out.push_str(&render_item(i + 1, item));
        out.push('\n');
    }
    out
}

/// Full prompt sent to the generator.
pub fn build_prompt(kind: AnalysisKind, items: &[RawItem]) -> String {
    format!("{}\n\nDADOS:\n{}", kind.instruction(), digest(kind, items))
}

pub struct Curator<G> {
    generator: G,
    now: DateTime<FixedOffset>,
}

impl<G> Curator<G>
where
    G: AskAsync<Response = String>,
{
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            now: now_sao_paulo(),
        }
    }

    pub fn with_now(mut self, now: DateTime<FixedOffset>) -> Self {
        self.now = now;
        self
    }

    /// Run one analysis over `items`.
    ///
    /// Generator errors and empty responses produce the failure shape with
    /// every input untouched.
    #[instrument(level = "info", skip_all, fields(%kind, items = items.len()))]
    pub async fn curate(&self, kind: AnalysisKind, items: Vec<RawItem>) -> CuratedAnalysis {
        if items.is_empty() {
            warn!("No input data for analysis");
            return CuratedAnalysis::Failed(FailedAnalysis {
                error: "no input data".to_string(),
                source_data: items,
            });
        }

        let prompt = build_prompt(kind, &items);
        debug!(prompt = %truncate_for_log(&prompt, 200), "Prompt built");

        let generated = match self.generator.ask(&prompt).await {
            Ok(text) if text.trim().is_empty() => {
                Err(PipelineError::GenerationFailure("empty response".to_string()).to_string())
            }
            Ok(text) => Ok(text),
            Err(e) => Err(PipelineError::GenerationFailure(e.to_string()).to_string()),
        };

        match generated {
            Ok(text) => {
                info!(chars = text.chars().count(), "Analysis generated");
                let total = items.len();
                let mut sample = items;
                sample.truncate(SAMPLE_SIZE);
                CuratedAnalysis::Completed(CompletedAnalysis {
                    analysis_timestamp: self.now.to_rfc3339(),
                    total_items_analyzed: total,
                    ai_analysis: text,
                    source_data: sample,
                })
            }
            Err(reason) => {
                error!(error = %reason, "Analysis failed; passing inputs through");
                CuratedAnalysis::Failed(FailedAnalysis {
                    error: reason,
                    source_data: items,
                })
            }
        }
    }

    /// Curate today's snapshots from `source_dir` into `output_dir`.
    ///
    /// Fails only when every category is empty; each analysis degrades on
    /// its own otherwise.
    #[instrument(level = "info", skip_all, fields(source = %source_dir.display(), output = %output_dir.display()))]
    pub async fn run_full_curation(
        &self,
        source_dir: &Path,
        output_dir: &Path,
    ) -> Result<CurationRun, Box<dyn Error>> {
        let day = load_day(&source_dir.join("daily"), self.now.date_naive()).await;
        let total_data_processed: usize = day.values().map(Vec::len).sum();
        if total_data_processed == 0 {
            return Err(Box::new(PipelineError::NoRawData {
                dir: source_dir.display().to_string(),
            }));
        }
        info!(total_data_processed, "Loaded raw data");

        let mut results = BTreeMap::new();
        for kind in AnalysisKind::ALL {
            let analysis = self.curate(kind, kind.select_inputs(&day)).await;
            results.insert(kind, analysis);
        }

        let summary = CurationSummary {
            timestamp: self.now.to_rfc3339(),
            total_data_processed,
            analysis_types: AnalysisKind::ALL
                .iter()
                .map(|k| k.file_prefix().to_string())
                .chain(std::iter::once(SUMMARY_PREFIX.to_string()))
                .collect(),
            processing_success: results.values().all(|a| !a.is_failed()),
        };

        let mut take = |kind| {
            results.remove(&kind).unwrap_or_else(|| {
                CuratedAnalysis::Failed(FailedAnalysis {
                    error: "analysis not run".to_string(),
                    source_data: Vec::new(),
                })
            })
        };
        let run = CurationRun {
            news: take(AnalysisKind::News),
            events: take(AnalysisKind::Events),
            market: take(AnalysisKind::Market),
            strategy: take(AnalysisKind::Strategy),
            summary,
        };

        self.save(&run, output_dir).await?;
        info!(success = run.summary.processing_success, "Curation finished");
        Ok(run)
    }

    async fn save(&self, run: &CurationRun, output_dir: &Path) -> Result<(), Box<dyn Error>> {
        ensure_writable_dir(output_dir).await?;
        let stamp = self.now.format("%Y%m%d_%H%M").to_string();
        let entries = [
            (AnalysisKind::News, &run.news),
            (AnalysisKind::Events, &run.events),
            (AnalysisKind::Market, &run.market),
            (AnalysisKind::Strategy, &run.strategy),
        ];
        for (kind, analysis) in entries {
            let path = curated_path(output_dir, kind.file_prefix(), &stamp);
            if let Err(e) = write_json(&path, analysis).await {
                error!(%kind, error = %e, "Failed to save analysis");
            }
        }
        write_json(&curated_path(output_dir, SUMMARY_PREFIX, &stamp), &run.summary).await?;
        Ok(())
    }
}

fn curated_path(dir: &Path, prefix: &str, stamp: &str) -> PathBuf {
    dir.join(format!("{prefix}_curado_{stamp}.json"))
}

/// Load the newest saved file of each analysis kind from `dir`.
///
/// Kinds with no file, or whose newest file cannot be read, are absent from
/// the map.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn load_latest(dir: &Path) -> Result<BTreeMap<AnalysisKind, CuratedAnalysis>, Box<dyn Error>> {
    let mut names = Vec::new();
    if dir.exists() {
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();

    let mut latest = BTreeMap::new();
    for kind in AnalysisKind::ALL {
        let prefix = format!("{}_curado_", kind.file_prefix());
        let Some(name) = names
            .iter()
            .rev()
            .find(|n| n.starts_with(&prefix) && n.ends_with(".json"))
        else {
            warn!(%kind, "No curated file found");
            continue;
        };
        match read_json::<CuratedAnalysis>(&dir.join(name)).await {
            Ok(analysis) => {
                latest.insert(kind, analysis);
            }
            Err(e) => warn!(%kind, file = %name, error = %e, "Unreadable curated file"),
        }
    }
    Ok(latest)
}
