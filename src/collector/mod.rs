//! Stage 1: gather raw items per category and store them as daily snapshots.
//!
//! The [`Collector`] asks its [`SportsSource`] for each category and falls
//! back to its [`FixtureProvider`] when the live call fails or comes back
//! short, so a category is empty only when its fixture table is. Market data and
//! trending topics are derived from the day's news rather than fetched.
//!
//! # Layout
//!
//! ```text
//! <data_dir>/
//! ├── daily/      one snapshot per category per day
//! ├── archive/    snapshots older than the retention window
//! └── collection_summary_YYYYMMDD.json
//! ```

pub mod fixtures;
pub mod snapshot;

use crate::error::PipelineError;
use crate::models::{Category, CollectionSummary, NewsItem, RawItem, TrendRecord};
use crate::outputs::json::write_json;
use crate::scrapers::SportsSource;
use crate::utils::{TIMEZONE_NAME, ensure_writable_dir, now_sao_paulo};
use chrono::{DateTime, Duration, FixedOffset};
use fixtures::FixtureProvider;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;
use tokio::fs;
use tracing::{error, info, instrument, warn};

/// Fewer live records than this triggers the fixture fallback.
pub const MIN_LIVE_RECORDS: usize = 1;

/// Tag stored in `collection_source` on every collected news item.
pub const COLLECTION_SOURCE: &str = "farol_collector";

const MARKET_KEYWORDS: [&str; 5] = ["transferência", "contratação", "venda", "mercado", "reforço"];

const TRENDING_KEYWORDS: [&str; 15] = [
    "flamengo",
    "palmeiras",
    "corinthians",
    "são paulo",
    "santos",
    "vasco",
    "botafogo",
    "fluminense",
    "brasileirão",
    "libertadores",
    "copa do brasil",
    "seleção",
    "neymar",
    "lesão",
    "técnico",
];

const MAX_TRENDING: usize = 10;
const MAX_RELATED_NEWS: usize = 3;

fn searchable_text(n: &NewsItem) -> String {
    format!("{} {}", n.title, n.description).to_lowercase()
}

/// News mentioning the transfer market.
pub fn market_news(news: &[NewsItem]) -> Vec<RawItem> {
    news.iter()
        .filter(|n| {
            let text = searchable_text(n);
            MARKET_KEYWORDS.iter().any(|k| text.contains(k))
        })
        .cloned()
        .map(RawItem::News)
        .collect()
}

/// How many articles mention each tracked keyword, most mentioned first,
/// with the titles of the first matching articles.
/// Keywords nobody mentions are left out; ties keep the keyword list order.
pub fn trending_topics(news: &[NewsItem]) -> Vec<RawItem> {
    let texts: Vec<String> = news.iter().map(searchable_text).collect();
    let mut counts: Vec<TrendRecord> = TRENDING_KEYWORDS
        .iter()
        .map(|k| {
            let matching: Vec<&NewsItem> = news
                .iter()
                .zip(&texts)
                .filter(|(_, t)| t.contains(k))
                .map(|(n, _)| n)
                .collect();
            TrendRecord {
                keyword: k.to_string(),
                mentions: matching.len() as u32,
                related_news: matching
                    .iter()
                    .take(MAX_RELATED_NEWS)
                    .map(|n| n.title.clone())
                    .collect(),
            }
        })
        .filter(|t| t.mentions > 0)
        .collect();
    counts.sort_by(|a, b| b.mentions.cmp(&a.mentions));
    counts.truncate(MAX_TRENDING);
    counts.into_iter().map(RawItem::Trend).collect()
}

/// Result of one archiving pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArchiveOutcome {
    pub archived: Vec<String>,
    /// Files whose name carries no parseable date token.
    pub skipped: Vec<String>,
    /// Expired files that could not be moved. They stay in `daily/`.
    pub failed: Vec<String>,
}

pub struct Collector<S, F> {
    source: S,
    fixtures: F,
    data_dir: PathBuf,
    now: DateTime<FixedOffset>,
}

impl<S: SportsSource, F: FixtureProvider> Collector<S, F> {
    pub fn new(source: S, fixtures: F, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            fixtures,
            data_dir: data_dir.into(),
            now: now_sao_paulo(),
        }
    }

    /// Pin the collection clock.
    pub fn with_now(mut self, now: DateTime<FixedOffset>) -> Self {
        self.now = now;
        self
    }

    pub fn daily_dir(&self) -> PathBuf {
        self.data_dir.join("daily")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.data_dir.join("archive")
    }

    fn summary_path(&self) -> PathBuf {
        self.data_dir.join(format!(
            "collection_summary_{}.json",
            self.now.format("%Y%m%d")
        ))
    }

    /// Items for one category. Empty only when the live source and the
    /// fixture table both come back empty.
    pub async fn collect(&self, category: Category) -> Vec<RawItem> {
        match category {
            Category::Next24h => {
                let mut all = self.collect_primary(Category::EventsToday).await;
                all.extend(self.collect_primary(Category::EventsTomorrow).await);
                all
            }
            Category::Market | Category::Trending => {
                let news = self.collect_primary(Category::News).await;
                self.derive(category, &news)
            }
            other => self.collect_primary(other).await,
        }
    }

    /// Fixture items for `category`. An empty table is logged; its snapshot
    /// is still written, flagged as unsuccessful.
    fn fallback(&self, category: Category) -> Vec<RawItem> {
        let items = self.fixtures.fixtures(category, self.now);
        if items.is_empty() {
            error!(%category, "Fixture table is empty; snapshot will have no items");
        }
        items
    }

    /// Live fetch with fixture fallback for a category backed by a source.
    #[instrument(level = "info", skip_all, fields(%category))]
    async fn collect_primary(&self, category: Category) -> Vec<RawItem> {
        let mut items = match self.source.fetch(category, self.now.date_naive()).await {
            Ok(items) if items.len() >= MIN_LIVE_RECORDS => {
                info!(count = items.len(), "Live data collected");
                items
            }
            Ok(items) => {
                warn!(count = items.len(), "Too few live records; using fixtures");
                self.fallback(category)
            }
            Err(e) => {
                warn!(error = %e, "Live source failed; using fixtures");
                self.fallback(category)
            }
        };
        if category == Category::News {
            self.tag_news(&mut items);
        }
        items
    }

    fn tag_news(&self, items: &mut [RawItem]) {
        let stamp = self.now.to_rfc3339();
        for item in items.iter_mut() {
            if let RawItem::News(n) = item {
                n.collected_at = Some(stamp.clone());
                n.collection_source = Some(COLLECTION_SOURCE.to_string());
            }
        }
    }

    /// Market or trending items computed from already collected news.
    fn derive(&self, category: Category, news: &[RawItem]) -> Vec<RawItem> {
        let news: Vec<NewsItem> = news.iter().filter_map(RawItem::as_news).cloned().collect();
        let derived = match category {
            Category::Market => market_news(&news),
            _ => trending_topics(&news),
        };
        if derived.is_empty() {
            warn!(%category, "Nothing derived from news; using fixtures");
            return self.fallback(category);
        }
        derived
    }

    /// Move `daily/*.json` snapshots dated strictly before
    /// `today - retention_days` into `archive/`.
    #[instrument(level = "info", skip(self), fields(dir = %self.data_dir.display()))]
    pub async fn archive_old_snapshots(
        &self,
        retention_days: i64,
    ) -> Result<ArchiveOutcome, Box<dyn Error>> {
        let cutoff = self.now.date_naive() - Duration::days(retention_days);
        let daily = self.daily_dir();
        let archive = self.archive_dir();
        ensure_writable_dir(&archive).await?;

        let mut outcome = ArchiveOutcome::default();
        if !daily.exists() {
            return Ok(outcome);
        }

        let mut entries = fs::read_dir(&daily).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();

        for name in names {
            match snapshot::parse_date_token(&name) {
                Some(date) if date < cutoff => {
                    match fs::rename(daily.join(&name), archive.join(&name)).await {
                        Ok(()) => {
                            info!(file = %name, "Archived snapshot");
                            outcome.archived.push(name);
                        }
                        Err(e) => {
                            warn!(file = %name, error = %e, "Could not archive snapshot; continuing");
                            outcome.failed.push(name);
                        }
                    }
                }
                Some(_) => {}
                None => {
                    warn!(file = %name, "Snapshot name has no date token; skipping");
                    outcome.skipped.push(name);
                }
            }
        }

        info!(
            archived = outcome.archived.len(),
            skipped = outcome.skipped.len(),
            failed = outcome.failed.len(),
            "Archiving finished"
        );
        Ok(outcome)
    }

    /// Collect every category, write the snapshots and the run summary,
    /// then archive old snapshots.
    ///
    /// Fails only when no snapshot could be written.
    #[instrument(level = "info", skip(self), fields(dir = %self.data_dir.display()))]
    pub async fn run_full_collection(
        &self,
        retention_days: i64,
    ) -> Result<CollectionSummary, Box<dyn Error>> {
        let started = Instant::now();
        let daily = self.daily_dir();
        ensure_writable_dir(&daily).await?;

        let mut collected: BTreeMap<Category, Vec<RawItem>> = BTreeMap::new();
        for category in Category::ALL {
            let items = match category {
                Category::Next24h => {
                    let mut all = collected
                        .get(&Category::EventsToday)
                        .cloned()
                        .unwrap_or_default();
                    all.extend(
                        collected
                            .get(&Category::EventsTomorrow)
                            .cloned()
                            .unwrap_or_default(),
                    );
                    all
                }
                Category::Market | Category::Trending => {
                    let news = collected.get(&Category::News).cloned().unwrap_or_default();
                    self.derive(category, &news)
                }
                other => self.collect_primary(other).await,
            };
            collected.insert(category, items);
        }

        let mut statistics = BTreeMap::new();
        for category in Category::ALL {
            let items = collected.remove(&category).unwrap_or_default();
            let count = items.len();
            match snapshot::write_snapshot(&daily, category, items, self.now).await {
                Ok(path) => {
                    info!(%category, count, file = %path.display(), "Snapshot saved");
                    statistics.insert(category.file_prefix().to_string(), count);
                }
                Err(e) => error!(%category, error = %e, "Failed to save snapshot"),
            }
        }

        if statistics.is_empty() {
            return Err(Box::new(PipelineError::NoCollectedData));
        }

        let archived_files = match self.archive_old_snapshots(retention_days).await {
            Ok(outcome) => outcome.archived.len(),
            Err(e) => {
                error!(error = %e, "Archiving failed");
                0
            }
        };

        let summary = CollectionSummary {
            collection_timestamp: self.now.to_rfc3339(),
            collection_date: self.now.format("%Y-%m-%d").to_string(),
            collection_time: self.now.format("%H:%M:%S").to_string(),
            timezone: TIMEZONE_NAME.to_string(),
            total_items_collected: statistics.values().sum(),
            statistics,
            duration_secs: started.elapsed().as_secs_f64(),
            archived_files,
            collection_success: true,
        };
        write_json(&self.summary_path(), &summary).await?;

        info!(
            total = summary.total_items_collected,
            duration_secs = summary.duration_secs,
            "Collection finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SportEvent;
    use chrono::{NaiveDate, TimeZone};
    use fixtures::StaticFixtures;
    use std::cell::RefCell;
    use std::path::Path;

    /// Answers from a fixed table; categories not in the table fail.
    struct TableSource {
        table: BTreeMap<Category, Vec<RawItem>>,
        calls: RefCell<Vec<Category>>,
    }

    impl TableSource {
        fn failing() -> Self {
            Self {
                table: BTreeMap::new(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl SportsSource for TableSource {
        async fn fetch(
            &self,
            category: Category,
            _today: NaiveDate,
        ) -> Result<Vec<RawItem>, Box<dyn Error>> {
            self.calls.borrow_mut().push(category);
            match self.table.get(&category) {
                Some(items) => Ok(items.clone()),
                None => Err(Box::new(PipelineError::SourceUnavailable {
                    source: "table".to_string(),
                    reason: "timeout".to_string(),
                })),
            }
        }
    }

    fn now() -> DateTime<FixedOffset> {
        crate::utils::sao_paulo_offset()
            .with_ymd_and_hms(2025, 5, 6, 9, 30, 0)
            .unwrap()
    }

    fn news(title: &str, description: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            description: description.to_string(),
            source: "GloboEsporte".to_string(),
            link: "https://ge.globo.com".to_string(),
            category: "Futebol".to_string(),
            date: None,
            collected_at: None,
            collection_source: None,
        }
    }

    fn event(home: &str, away: &str) -> RawItem {
        RawItem::Event(SportEvent {
            home_team: home.to_string(),
            away_team: away.to_string(),
            league: "Brazilian Serie A".to_string(),
            date: "06/05/2025".to_string(),
            time: "19:00".to_string(),
            sport: "Futebol".to_string(),
            venue: None,
            status: None,
            score: None,
            game: None,
            viewers: None,
            tv: None,
        })
    }

    fn tagged(items: Vec<RawItem>) -> Vec<RawItem> {
        items
            .into_iter()
            .map(|mut item| {
                if let RawItem::News(n) = &mut item {
                    n.collected_at = Some(now().to_rfc3339());
                    n.collection_source = Some(COLLECTION_SOURCE.to_string());
                }
                item
            })
            .collect()
    }

    #[tokio::test]
    async fn test_failing_source_falls_back_to_fixtures() {
        let dir = tempfile::tempdir().unwrap();
        let collector =
            Collector::new(TableSource::failing(), StaticFixtures, dir.path()).with_now(now());
        for category in Category::ALL {
            let items = collector.collect(category).await;
            assert!(!items.is_empty(), "{category} came back empty");
            assert_eq!(items, tagged(StaticFixtures.fixtures(category, now())));
        }
    }

    #[tokio::test]
    async fn test_empty_live_answer_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = TableSource::failing();
        source.table.insert(Category::EventsToday, Vec::new());
        let collector = Collector::new(source, StaticFixtures, dir.path()).with_now(now());
        let items = collector.collect(Category::EventsToday).await;
        assert_eq!(items, StaticFixtures.fixtures(Category::EventsToday, now()));
    }

    #[tokio::test]
    async fn test_live_data_is_used_and_news_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = TableSource::failing();
        source
            .table
            .insert(Category::EventsToday, vec![event("Bahia", "Vitória")]);
        source.table.insert(
            Category::News,
            vec![RawItem::News(news("Flamengo acerta contratação", "Reforço chega"))],
        );
        let collector = Collector::new(source, StaticFixtures, dir.path()).with_now(now());

        let today = collector.collect(Category::EventsToday).await;
        assert_eq!(today, vec![event("Bahia", "Vitória")]);

        let collected = collector.collect(Category::News).await;
        let n = collected[0].as_news().unwrap();
        assert_eq!(n.collection_source.as_deref(), Some(COLLECTION_SOURCE));
        assert_eq!(n.collected_at.as_deref(), Some(now().to_rfc3339().as_str()));

        let market = collector.collect(Category::Market).await;
        assert_eq!(market.len(), 1);
    }

    #[test]
    fn test_trending_counts_articles_per_keyword() {
        let items = vec![
            news("Flamengo vence", "Rubro-negro lidera o Brasileirão"),
            news("Flamengo e Santos empatam", ""),
            news("Santos demite técnico", "Flamengo observa"),
            news("Nada relevante", "Sem palavras-chave"),
        ];
        let trends: Vec<TrendRecord> = trending_topics(&items)
            .into_iter()
            .filter_map(|i| i.as_trend().cloned())
            .collect();
        assert_eq!(trends[0].keyword, "flamengo");
        assert_eq!(trends[0].mentions, 3);
        assert_eq!(
            trends[0].related_news,
            vec!["Flamengo vence", "Flamengo e Santos empatam", "Santos demite técnico"]
        );
        assert_eq!(trends[1].keyword, "santos");
        assert_eq!(trends[1].mentions, 2);
        assert_eq!(
            trends[1].related_news,
            vec!["Flamengo e Santos empatam", "Santos demite técnico"]
        );
        assert!(trends.iter().all(|t| t.mentions > 0));
        assert_eq!(trends.len(), 4);
    }

    #[test]
    fn test_market_filter() {
        let items = vec![
            news("Palmeiras anuncia reforço", ""),
            news("Clássico no domingo", "Ingressos esgotados"),
            news("Janela aberta", "Mercado da bola agitado"),
        ];
        assert_eq!(market_news(&items).len(), 2);
    }

    fn touch(dir: &Path, name: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(name), "{}").unwrap();
    }

    #[tokio::test]
    async fn test_archive_moves_only_expired_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let collector =
            Collector::new(TableSource::failing(), StaticFixtures, dir.path()).with_now(now());
        let daily = collector.daily_dir();
        // 2025-05-06 minus 7 days is 2025-04-29.
        touch(&daily, "eventos_hoje_20250428.json");
        touch(&daily, "eventos_hoje_20250429.json");
        touch(&daily, "eventos_hoje_20250506.json");
        touch(&daily, "notas_sem_data.json");

        let outcome = collector.archive_old_snapshots(7).await.unwrap();
        assert_eq!(outcome.archived, vec!["eventos_hoje_20250428.json"]);
        assert_eq!(outcome.skipped, vec!["notas_sem_data.json"]);
        assert!(collector.archive_dir().join("eventos_hoje_20250428.json").exists());
        assert!(daily.join("eventos_hoje_20250429.json").exists());
        assert!(daily.join("notas_sem_data.json").exists());

        let again = collector.archive_old_snapshots(7).await.unwrap();
        assert!(again.archived.is_empty());
    }

    #[tokio::test]
    async fn test_archive_keeps_going_past_a_failed_move() {
        let dir = tempfile::tempdir().unwrap();
        let collector =
            Collector::new(TableSource::failing(), StaticFixtures, dir.path()).with_now(now());
        let daily = collector.daily_dir();
        touch(&daily, "eventos_hoje_20250427.json");
        touch(&daily, "eventos_hoje_20250428.json");
        // A directory in the way makes the first move fail.
        std::fs::create_dir_all(collector.archive_dir().join("eventos_hoje_20250427.json"))
            .unwrap();

        let outcome = collector.archive_old_snapshots(7).await.unwrap();
        assert_eq!(outcome.failed, vec!["eventos_hoje_20250427.json"]);
        assert_eq!(outcome.archived, vec!["eventos_hoje_20250428.json"]);
        assert!(daily.join("eventos_hoje_20250427.json").exists());
        assert!(collector.archive_dir().join("eventos_hoje_20250428.json").is_file());
    }

    #[tokio::test]
    async fn test_full_collection_fails_when_no_snapshot_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let collector =
            Collector::new(TableSource::failing(), StaticFixtures, dir.path()).with_now(now());
        for category in Category::ALL {
            let name = snapshot::snapshot_filename(category, now().date_naive());
            std::fs::create_dir_all(collector.daily_dir().join(name)).unwrap();
        }

        let err = collector.run_full_collection(7).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NoCollectedData)
        ));
        assert!(!dir.path().join("collection_summary_20250506.json").exists());
    }

    struct NoFixtures;

    impl FixtureProvider for NoFixtures {
        fn fixtures(&self, _category: Category, _now: DateTime<FixedOffset>) -> Vec<RawItem> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn test_empty_fixture_table_writes_unsuccessful_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = TableSource::failing();
        source
            .table
            .insert(Category::EventsToday, vec![event("Bahia", "Vitória")]);
        let collector = Collector::new(source, NoFixtures, dir.path()).with_now(now());
        assert!(collector.collect(Category::Esports).await.is_empty());

        let summary = collector.run_full_collection(7).await.unwrap();
        assert_eq!(summary.total_items_collected, 2);
        assert_eq!(summary.statistics["eventos_esports"], 0);

        let day = now().date_naive();
        let esports = snapshot::read_snapshot(
            &collector
                .daily_dir()
                .join(snapshot::snapshot_filename(Category::Esports, day)),
        )
        .await
        .unwrap();
        assert!(!esports.metadata.collection_success);
        let today = snapshot::read_snapshot(
            &collector
                .daily_dir()
                .join(snapshot::snapshot_filename(Category::EventsToday, day)),
        )
        .await
        .unwrap();
        assert!(today.metadata.collection_success);
    }

    #[tokio::test]
    async fn test_full_collection_writes_every_snapshot_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let collector =
            Collector::new(TableSource::failing(), StaticFixtures, dir.path()).with_now(now());
        touch(&collector.daily_dir(), "feriados_20250401.json");

        let summary = collector.run_full_collection(7).await.unwrap();
        assert_eq!(summary.statistics.len(), Category::ALL.len());
        assert_eq!(summary.archived_files, 1);
        assert_eq!(summary.collection_date, "2025-05-06");
        assert_eq!(
            summary.total_items_collected,
            summary.statistics.values().sum::<usize>()
        );

        for category in Category::ALL {
            let name = snapshot::snapshot_filename(category, now().date_naive());
            let snap = snapshot::read_snapshot(&collector.daily_dir().join(name))
                .await
                .unwrap();
            assert_eq!(snap.metadata.total_items, snap.data.len());
            assert!(snap.metadata.total_items > 0);
        }
        assert!(dir.path().join("collection_summary_20250506.json").exists());

        // Rerunning the same day overwrites the same files.
        collector.run_full_collection(7).await.unwrap();
        assert_eq!(
            std::fs::read_dir(collector.daily_dir()).unwrap().count(),
            Category::ALL.len()
        );
    }

    #[tokio::test]
    async fn test_full_collection_fetches_news_once() {
        let dir = tempfile::tempdir().unwrap();
        let collector =
            Collector::new(TableSource::failing(), StaticFixtures, dir.path()).with_now(now());
        collector.run_full_collection(7).await.unwrap();
        let calls = collector.source.calls.borrow();
        assert_eq!(calls.iter().filter(|c| **c == Category::News).count(), 1);
        assert!(!calls.contains(&Category::Market));
        assert!(!calls.contains(&Category::Next24h));
    }
}
