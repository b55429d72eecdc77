//! Dated snapshot files under `daily/` and `archive/`.
//!
//! A snapshot file is named `{category prefix}_{YYYYMMDD}.json`; the date
//! token is always the last `_`-separated part of the stem, which is what
//! archiving keys on.

use crate::models::{Category, RawItem, Snapshot, SnapshotMetadata};
use crate::outputs::json::{read_json, write_json};
use chrono::{DateTime, FixedOffset, NaiveDate};
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{instrument, warn};

/// Value of `metadata.source` in every snapshot this crate writes.
pub const SNAPSHOT_SOURCE: &str = "farol_collector";

pub fn snapshot_filename(category: Category, date: NaiveDate) -> String {
    format!("{}_{}.json", category.file_prefix(), date.format("%Y%m%d"))
}

/// Date encoded in the trailing `_YYYYMMDD` token of a snapshot filename.
pub fn parse_date_token(file_name: &str) -> Option<NaiveDate> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    let token = stem.rsplit('_').next()?;
    if token.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(token, "%Y%m%d").ok()
}

pub fn build_snapshot(
    category: Category,
    items: Vec<RawItem>,
    now: DateTime<FixedOffset>,
) -> Snapshot {
    Snapshot {
        metadata: SnapshotMetadata {
            timestamp: now.to_rfc3339(),
            data_type: category.label().to_string(),
            total_items: items.len(),
            collection_success: !items.is_empty(),
            source: SNAPSHOT_SOURCE.to_string(),
        },
        data: items,
    }
}

/// Write the category's snapshot for `now`'s date into `daily_dir`.
/// A second write on the same day replaces the first.
pub async fn write_snapshot(
    daily_dir: &Path,
    category: Category,
    items: Vec<RawItem>,
    now: DateTime<FixedOffset>,
) -> Result<PathBuf, Box<dyn Error>> {
    let path = daily_dir.join(snapshot_filename(category, now.date_naive()));
    let snapshot = build_snapshot(category, items, now);
    write_json(&path, &snapshot).await?;
    Ok(path)
}

pub async fn read_snapshot(path: &Path) -> Result<Snapshot, Box<dyn Error>> {
    read_json(path).await
}

/// Load every category's snapshot for `date`.
///
/// Missing or unreadable files are logged and yield an empty list, so the
/// map always has one entry per category.
#[instrument(level = "info", skip(daily_dir), fields(dir = %daily_dir.display()))]
pub async fn load_day(daily_dir: &Path, date: NaiveDate) -> BTreeMap<Category, Vec<RawItem>> {
    let mut day = BTreeMap::new();
    for category in Category::ALL {
        let path = daily_dir.join(snapshot_filename(category, date));
        let items = if path.exists() {
            match read_snapshot(&path).await {
                Ok(snapshot) => snapshot.data,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Unreadable snapshot");
                    Vec::new()
                }
            }
        } else {
            warn!(file = %path.display(), "Snapshot not found");
            Vec::new()
        };
        day.insert(category, items);
    }
    day
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrendRecord;
    use chrono::TimeZone;

    fn trend(keyword: &str, mentions: u32) -> TrendRecord {
        TrendRecord {
            keyword: keyword.to_string(),
            mentions,
            related_news: Vec::new(),
        }
    }

    fn now() -> DateTime<FixedOffset> {
        crate::utils::sao_paulo_offset()
            .with_ymd_and_hms(2025, 5, 6, 9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_filename_and_token() {
        let day = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        let name = snapshot_filename(Category::News, day);
        assert_eq!(name, "noticias_brutas_ultimas_24h_20250506.json");
        assert_eq!(parse_date_token(&name), Some(day));
        assert_eq!(parse_date_token("collection_summary_20250506.json"), Some(day));
    }

    #[test]
    fn test_unparseable_tokens() {
        assert_eq!(parse_date_token("notes.json"), None);
        assert_eq!(parse_date_token("eventos_hoje_2025.json"), None);
        assert_eq!(parse_date_token("eventos_hoje_20251340.json"), None);
        assert_eq!(parse_date_token("eventos_hoje_abcdefgh.json"), None);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip_counts_items() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![
            RawItem::Trend(trend("flamengo", 3)),
            RawItem::Trend(trend("santos", 1)),
        ];
        let path = write_snapshot(dir.path(), Category::Trending, items.clone(), now())
            .await
            .unwrap();
        assert!(path.ends_with("topicos_trending_20250506.json"));

        let back = read_snapshot(&path).await.unwrap();
        assert_eq!(back.metadata.total_items, back.data.len());
        assert!(back.metadata.collection_success);
        assert_eq!(back.metadata.data_type, "Tópicos em Alta");
        assert_eq!(back.data, items);
    }

    #[test]
    fn test_empty_snapshot_is_flagged_unsuccessful() {
        let snapshot = build_snapshot(Category::Esports, Vec::new(), now());
        assert_eq!(snapshot.metadata.total_items, 0);
        assert!(!snapshot.metadata.collection_success);
    }

    #[tokio::test]
    async fn test_same_day_rewrite_keeps_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let item = RawItem::Trend(trend("vasco", 2));
        write_snapshot(dir.path(), Category::Trending, vec![item.clone()], now())
            .await
            .unwrap();
        write_snapshot(dir.path(), Category::Trending, vec![item.clone(), item], now())
            .await
            .unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_load_day_fills_missing_categories() {
        let dir = tempfile::tempdir().unwrap();
        let item = RawItem::Trend(trend("vasco", 2));
        write_snapshot(dir.path(), Category::Trending, vec![item], now())
            .await
            .unwrap();
        let day = load_day(dir.path(), now().date_naive()).await;
        assert_eq!(day.len(), Category::ALL.len());
        assert_eq!(day[&Category::Trending].len(), 1);
        assert!(day[&Category::News].is_empty());
    }
}
