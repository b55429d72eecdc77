//! Data models shared by every pipeline stage.
//!
//! This module defines the core data structures used throughout the application:
//! - [`RawItem`]: one collected fact (event, news article, trend or holiday)
//! - [`Snapshot`]: a dated, write-once bundle of raw items for one [`Category`]
//! - [`CuratedAnalysis`]: generated text plus a sample of the inputs it was built from
//! - [`ExtractedNews`] / [`ExtractedEvent`]: records recovered from generated text
//! - [`Report`]: the rendered HTML and its subject line
//!
//! Field names follow the snake_case JSON layout of the snapshot files, so
//! the structs serialize without renames.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A collection category. Each category produces exactly one snapshot file per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    EventsToday,
    EventsTomorrow,
    Next24h,
    RecentResults,
    Esports,
    WeeklySchedule,
    News,
    Market,
    Trending,
    Holidays,
}

impl Category {
    /// Every category, in the order the collector processes them.
    pub const ALL: [Category; 10] = [
        Category::EventsToday,
        Category::EventsTomorrow,
        Category::Next24h,
        Category::RecentResults,
        Category::Esports,
        Category::WeeklySchedule,
        Category::News,
        Category::Market,
        Category::Trending,
        Category::Holidays,
    ];

    /// Filename prefix used for the category's snapshot files.
    pub fn file_prefix(self) -> &'static str {
        match self {
            Category::EventsToday => "eventos_hoje",
            Category::EventsTomorrow => "eventos_amanha",
            Category::Next24h => "jogos_proximas_24h",
            Category::RecentResults => "resultados_recentes",
            Category::Esports => "eventos_esports",
            Category::WeeklySchedule => "programacao_semanal",
            Category::News => "noticias_brutas_ultimas_24h",
            Category::Market => "dados_mercado",
            Category::Trending => "topicos_trending",
            Category::Holidays => "feriados",
        }
    }

    /// Human readable label stored in `metadata.data_type`.
    pub fn label(self) -> &'static str {
        match self {
            Category::EventsToday => "Eventos de Hoje",
            Category::EventsTomorrow => "Eventos de Amanhã",
            Category::Next24h => "Jogos Próximas 24h",
            Category::RecentResults => "Resultados Recentes",
            Category::Esports => "Eventos E-sports",
            Category::WeeklySchedule => "Programação Semanal",
            Category::News => "Notícias Brutas Últimas 24h",
            Category::Market => "Dados de Mercado",
            Category::Trending => "Tópicos em Alta",
            Category::Holidays => "Feriados e Datas Especiais",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_prefix())
    }
}

/// One collected fact.
///
/// The JSON representation is untagged: the variant is recognised by its
/// required fields (`home_team`/`away_team` for events, `title` for news,
/// `keyword` for trends, `name` for holidays). Identity is positional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawItem {
    Event(SportEvent),
    News(NewsItem),
    Trend(TrendRecord),
    Holiday(Holiday),
}

impl RawItem {
    pub fn as_event(&self) -> Option<&SportEvent> {
        match self {
            RawItem::Event(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_news(&self) -> Option<&NewsItem> {
        match self {
            RawItem::News(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_trend(&self) -> Option<&TrendRecord> {
        match self {
            RawItem::Trend(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_holiday(&self) -> Option<&Holiday> {
        match self {
            RawItem::Holiday(h) => Some(h),
            _ => None,
        }
    }
}

/// A scheduled game, a finished result or an e-sports match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportEvent {
    pub home_team: String,
    pub away_team: String,
    pub league: String,
    /// `dd/mm/YYYY`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub sport: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Final score for results, e.g. `"2-1"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    /// Title of the video game for e-sports matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tv: Option<String>,
}

/// A news article as collected from a feed or the fixture table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub description: String,
    pub source: String,
    pub link: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// ISO-8601 timestamp of the collection run that produced this item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_source: Option<String>,
}

/// Keyword frequency over the day's news.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub keyword: String,
    pub mentions: u32,
    /// Titles of the first few articles mentioning the keyword.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_news: Vec<String>,
}

/// An upcoming public holiday or special commercial date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// `dd/mm`
    pub date: String,
    pub name: String,
    pub days_until: i64,
    pub impact: String,
}

/// Metadata block written at the top of every snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub timestamp: String,
    pub data_type: String,
    pub total_items: usize,
    pub collection_success: bool,
    pub source: String,
}

/// A dated, write-once bundle of raw items for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub metadata: SnapshotMetadata,
    pub data: Vec<RawItem>,
}

/// Aggregate record of one collection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub collection_timestamp: String,
    pub collection_date: String,
    pub collection_time: String,
    pub timezone: String,
    pub statistics: BTreeMap<String, usize>,
    pub total_items_collected: usize,
    pub duration_secs: f64,
    pub archived_files: usize,
    pub collection_success: bool,
}

/// The output of one curation pass.
///
/// On success the generated narrative is kept with a small sample of the
/// inputs; on failure the error is recorded and every input is passed
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CuratedAnalysis {
    Completed(CompletedAnalysis),
    Failed(FailedAnalysis),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedAnalysis {
    pub analysis_timestamp: String,
    #[serde(alias = "total_news_analyzed", alias = "total_events_analyzed")]
    pub total_items_analyzed: usize,
    pub ai_analysis: String,
    pub source_data: Vec<RawItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedAnalysis {
    pub error: String,
    pub source_data: Vec<RawItem>,
}

impl CuratedAnalysis {
    /// Generated text, if the pass succeeded.
    pub fn ai_text(&self) -> Option<&str> {
        match self {
            CuratedAnalysis::Completed(c) => Some(&c.ai_analysis),
            CuratedAnalysis::Failed(_) => None,
        }
    }

    pub fn source_data(&self) -> &[RawItem] {
        match self {
            CuratedAnalysis::Completed(c) => &c.source_data,
            CuratedAnalysis::Failed(f) => &f.source_data,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CuratedAnalysis::Failed(_))
    }
}

/// Synthetic entry appended after the four curation passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurationSummary {
    pub timestamp: String,
    pub total_data_processed: usize,
    pub analysis_types: Vec<String>,
    pub processing_success: bool,
}

/// Every analysis produced by one curation run.
#[derive(Debug, Clone, PartialEq)]
pub struct CurationRun {
    pub news: CuratedAnalysis,
    pub events: CuratedAnalysis,
    pub market: CuratedAnalysis,
    pub strategy: CuratedAnalysis,
    pub summary: CurationSummary,
}

/// Coarse relevance tag attached to extracted items. Assigned heuristically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relevance {
    High,
    Medium,
    Low,
}

impl Relevance {
    pub fn label(self) -> &'static str {
        match self {
            Relevance::High => "Alta",
            Relevance::Medium => "Média",
            Relevance::Low => "Baixa",
        }
    }

    /// Badge colour used by the HTML report.
    pub fn color(self) -> &'static str {
        match self {
            Relevance::High => "#ff6b6b",
            Relevance::Medium => "#feca57",
            Relevance::Low => "#48dbfb",
        }
    }
}

pub const NA: &str = "N/A";

/// A news entry recovered from curated text or backfilled from a raw sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedNews {
    pub title: Option<String>,
    pub description: Option<String>,
    pub source: Option<String>,
    pub category: Option<String>,
    pub relevance: Relevance,
}

impl ExtractedNews {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("Título não disponível")
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("Descrição não disponível")
    }

    pub fn source(&self) -> &str {
        self.source.as_deref().unwrap_or("Fonte IA")
    }

    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or("Geral")
    }
}

impl From<&NewsItem> for ExtractedNews {
    fn from(n: &NewsItem) -> Self {
        let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());
        ExtractedNews {
            title: non_empty(&n.title),
            description: non_empty(&n.description),
            source: non_empty(&n.source),
            category: non_empty(&n.category),
            relevance: Relevance::Medium,
        }
    }
}

/// An event entry recovered from curated text or backfilled from a raw sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedEvent {
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub league: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub sport: Option<String>,
    pub relevance: Relevance,
}

impl ExtractedEvent {
    pub fn home_team(&self) -> &str {
        self.home_team.as_deref().unwrap_or("Time A")
    }

    pub fn away_team(&self) -> &str {
        self.away_team.as_deref().unwrap_or("Time B")
    }

    pub fn league(&self) -> &str {
        self.league.as_deref().unwrap_or("Liga não informada")
    }

    pub fn date(&self) -> &str {
        self.date.as_deref().unwrap_or("Data a definir")
    }

    pub fn time(&self) -> &str {
        self.time.as_deref().unwrap_or("Horário a definir")
    }

    pub fn sport(&self) -> &str {
        self.sport.as_deref().unwrap_or("Esporte não informado")
    }
}

impl From<&SportEvent> for ExtractedEvent {
    fn from(e: &SportEvent) -> Self {
        ExtractedEvent {
            home_team: Some(e.home_team.clone()),
            away_team: Some(e.away_team.clone()),
            league: Some(e.league.clone()),
            date: Some(e.date.clone()),
            time: Some(e.time.clone()),
            sport: Some(e.sport.clone()),
            relevance: Relevance::Medium,
        }
    }
}

/// Structured items recovered from free text.
///
/// `low_yield` is set when fewer items than the extraction threshold were
/// recovered; the composer then decides whether to backfill.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult<T> {
    pub items: Vec<T>,
    pub low_yield: bool,
}

/// The rendered report handed to delivery. Never persisted by the pipeline.
#[derive(Debug, Clone)]
pub struct Report {
    pub subject: String,
    pub html: String,
    pub plain_text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> SportEvent {
        SportEvent {
            home_team: "Flamengo".to_string(),
            away_team: "Botafogo".to_string(),
            league: "Brasileirão Série A".to_string(),
            date: "09/06/2024".to_string(),
            time: "16:00".to_string(),
            sport: "Futebol".to_string(),
            venue: Some("Maracanã".to_string()),
            status: None,
            score: None,
            game: None,
            viewers: None,
            tv: None,
        }
    }

    #[test]
    fn test_untagged_variants_are_recognised() {
        let json = r#"[
            {"home_team": "LOUD", "away_team": "FURIA", "league": "CBLOL", "date": "01/01/2025", "time": "20:00", "sport": "E-Sports"},
            {"title": "Flamengo vence", "description": "d", "source": "GloboEsporte", "link": "https://ge.globo.com/x", "category": "Futebol"},
            {"keyword": "flamengo", "mentions": 3},
            {"date": "25/12", "name": "Natal", "days_until": 10, "impact": "Campanhas familiares"}
        ]"#;
        let items: Vec<RawItem> = serde_json::from_str(json).unwrap();
        assert!(items[0].as_event().is_some());
        assert!(items[1].as_news().is_some());
        assert_eq!(items[2].as_trend().unwrap().mentions, 3);
        assert_eq!(items[3].as_holiday().unwrap().name, "Natal");
    }

    #[test]
    fn test_optional_event_fields_are_omitted() {
        let json = serde_json::to_string(&RawItem::Event(event())).unwrap();
        assert!(json.contains("\"venue\""));
        assert!(!json.contains("\"score\""));
    }

    #[test]
    fn test_curated_analysis_shapes() {
        let failed = r#"{"error": "boom", "source_data": [{"keyword": "santos", "mentions": 1}]}"#;
        let parsed: CuratedAnalysis = serde_json::from_str(failed).unwrap();
        assert!(parsed.is_failed());
        assert_eq!(parsed.source_data().len(), 1);
        assert_eq!(parsed.ai_text(), None);

        let ok = r#"{"analysis_timestamp": "2025-01-01T09:30:00-03:00", "total_news_analyzed": 4,
                     "ai_analysis": "texto", "source_data": []}"#;
        let parsed: CuratedAnalysis = serde_json::from_str(ok).unwrap();
        assert_eq!(parsed.ai_text(), Some("texto"));
        match parsed {
            CuratedAnalysis::Completed(c) => assert_eq!(c.total_items_analyzed, 4),
            CuratedAnalysis::Failed(_) => panic!("expected a completed analysis"),
        }
    }

    #[test]
    fn test_placeholders_for_missing_fields() {
        let news = ExtractedNews {
            title: None,
            description: None,
            source: None,
            category: None,
            relevance: Relevance::Low,
        };
        assert_eq!(news.title(), "Título não disponível");
        assert_eq!(news.description(), "Descrição não disponível");
        assert_eq!(news.source(), "Fonte IA");

        let ev = ExtractedEvent {
            home_team: None,
            away_team: None,
            league: None,
            date: None,
            time: None,
            sport: None,
            relevance: Relevance::High,
        };
        assert_eq!(ev.home_team(), "Time A");
        assert_eq!(ev.league(), "Liga não informada");
        assert_eq!(ev.time(), "Horário a definir");
    }

    #[test]
    fn test_blank_news_fields_become_placeholders() {
        let item = NewsItem {
            title: "  ".to_string(),
            description: "Desc".to_string(),
            source: "Lance!".to_string(),
            link: "https://lance.com.br".to_string(),
            category: String::new(),
            date: None,
            collected_at: None,
            collection_source: None,
        };
        let extracted = ExtractedNews::from(&item);
        assert_eq!(extracted.title(), "Título não disponível");
        assert_eq!(extracted.category(), "Geral");
        assert_eq!(extracted.relevance, Relevance::Medium);
    }

    #[test]
    fn test_category_prefixes_are_unique() {
        let mut prefixes: Vec<_> = Category::ALL.iter().map(|c| c.file_prefix()).collect();
        prefixes.sort();
        prefixes.dedup();
        assert_eq!(prefixes.len(), Category::ALL.len());
    }
}
