//! Turn curated analyses and the day's raw snapshots into the report.
//!
//! The composer never fails: every missing analysis or empty category has a
//! placeholder, and short extractions are backfilled from raw samples.

pub mod extract;
pub mod html;

use crate::curator::AnalysisKind;
use crate::models::{
    Category, CuratedAnalysis, ExtractedEvent, ExtractedNews, RawItem, Report,
};
use chrono::{DateTime, FixedOffset};
use extract::{EVENTS_CAP, NEWS_CAP, backfill, extract_bullets, extract_events, extract_news};
use html::{ReportView, render_html};
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::{info, instrument};

const MAX_RESULTS: usize = 5;
const MAX_ESPORTS: usize = 5;
const FALLBACK_BULLETS: usize = 5;
const UNAVAILABLE: &str = "Análise não disponível";

/// Subject line for the report of `now`'s day.
pub fn subject_for(now: DateTime<FixedOffset>) -> String {
    format!(
        "🚨 Farol de Notícias Artplan-BetMGM • IA • {}",
        now.format("%d/%m/%Y")
    )
}

fn category<'a>(day: &'a BTreeMap<Category, Vec<RawItem>>, c: Category) -> &'a [RawItem] {
    day.get(&c).map(Vec::as_slice).unwrap_or_default()
}

/// The analysis' own inputs, or the day's category when the analysis is missing.
fn sample<'a>(
    analysis: Option<&'a CuratedAnalysis>,
    day: &'a BTreeMap<Category, Vec<RawItem>>,
    fallback: &[Category],
) -> Vec<&'a RawItem> {
    match analysis {
        Some(a) => a.source_data().iter().collect(),
        None => fallback.iter().flat_map(|c| category(day, *c)).collect(),
    }
}

fn news_section(
    analysis: Option<&CuratedAnalysis>,
    day: &BTreeMap<Category, Vec<RawItem>>,
) -> Vec<ExtractedNews> {
    let raw: Vec<ExtractedNews> = sample(analysis, day, &[Category::News])
        .into_iter()
        .filter_map(RawItem::as_news)
        .map(ExtractedNews::from)
        .collect();
    let extracted = extract_news(analysis.and_then(CuratedAnalysis::ai_text).unwrap_or_default());
    backfill(extracted, raw, NEWS_CAP)
}

fn events_section(
    analysis: Option<&CuratedAnalysis>,
    day: &BTreeMap<Category, Vec<RawItem>>,
) -> Vec<ExtractedEvent> {
    let raw: Vec<ExtractedEvent> = sample(
        analysis,
        day,
        &[Category::EventsToday, Category::EventsTomorrow, Category::Esports],
    )
    .into_iter()
    .filter_map(RawItem::as_event)
    .map(ExtractedEvent::from)
    .collect();
    let extracted = extract_events(analysis.and_then(CuratedAnalysis::ai_text).unwrap_or_default());
    backfill(extracted, raw, EVENTS_CAP)
}

/// Bullets from the generated text, or a digest of the raw inputs when the
/// analysis failed.
fn bullets_section(analysis: Option<&CuratedAnalysis>) -> Vec<String> {
    let Some(analysis) = analysis else {
        return vec![UNAVAILABLE.to_string()];
    };
    if let Some(text) = analysis.ai_text() {
        return extract_bullets(text);
    }
    let fallback: Vec<String> = analysis
        .source_data()
        .iter()
        .filter_map(|item| {
            if let Some(t) = item.as_trend() {
                return Some(format!("{}: {} menções", t.keyword, t.mentions));
            }
            item.as_news()
                .filter(|n| !n.title.trim().is_empty())
                .map(|n| n.title.clone())
        })
        .take(FALLBACK_BULLETS)
        .collect();
    if fallback.is_empty() {
        vec![UNAVAILABLE.to_string()]
    } else {
        fallback
    }
}

fn plain_text(
    subject: &str,
    news: &[ExtractedNews],
    events: &[ExtractedEvent],
    market: &[String],
    strategy: &[String],
) -> String {
    let mut out = format!("{subject}\n\n");
    out.push_str("NOTÍCIAS CURADAS\n");
    for (i, n) in news.iter().enumerate() {
        let _ = writeln!(out, "{}. {} ({})", i + 1, n.title(), n.source());
    }
    out.push_str("\nEVENTOS SELECIONADOS\n");
    for e in events {
        let _ = writeln!(
            out,
            "- {} vs {} • {} • {} {}",
            e.home_team(),
            e.away_team(),
            e.league(),
            e.date(),
            e.time()
        );
    }
    out.push_str("\nIMPACTO NO MERCADO\n");
    for b in market {
        let _ = writeln!(out, "• {b}");
    }
    out.push_str("\nESTRATÉGIA DO DIA\n");
    for b in strategy {
        let _ = writeln!(out, "• {b}");
    }
    out
}

/// Build the report for `now`'s day.
///
/// `curation` holds whatever analyses could be loaded; `day` is the day's
/// raw snapshots by category.
#[instrument(level = "info", skip_all, fields(analyses = curation.len(), total_collected = total_collected))]
pub fn compose(
    curation: &BTreeMap<AnalysisKind, CuratedAnalysis>,
    day: &BTreeMap<Category, Vec<RawItem>>,
    total_collected: usize,
    now: DateTime<FixedOffset>,
) -> Report {
    let news = news_section(curation.get(&AnalysisKind::News), day);
    let events = events_section(curation.get(&AnalysisKind::Events), day);
    let market = bullets_section(curation.get(&AnalysisKind::Market));
    let strategy = bullets_section(curation.get(&AnalysisKind::Strategy));

    let view = ReportView {
        date: now.format("%d/%m/%Y").to_string(),
        generated_at: now.format("%d/%m/%Y às %H:%M:%S").to_string(),
        total_collected,
        news: &news,
        events: &events,
        results: category(day, Category::RecentResults)
            .iter()
            .filter_map(RawItem::as_event)
            .take(MAX_RESULTS)
            .collect(),
        esports: category(day, Category::Esports)
            .iter()
            .filter_map(RawItem::as_event)
            .take(MAX_ESPORTS)
            .collect(),
        holidays: category(day, Category::Holidays)
            .iter()
            .filter_map(RawItem::as_holiday)
            .collect(),
        market: &market,
        strategy: &strategy,
    };

    let subject = subject_for(now);
    let html = render_html(&view);
    let plain = plain_text(&subject, &news, &events, &market, &strategy);
    info!(news = news.len(), events = events.len(), bytes = html.len(), "Report composed");

    Report {
        subject,
        html,
        plain_text: Some(plain),
    }
}
