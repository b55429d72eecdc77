//! Sports news from RSS feeds.
//!
//! Each configured feed is fetched in turn, its `<item>`s are mapped into
//! [`NewsItem`]s, and the merged list is deduplicated and ranked so the
//! collector stores at most [`MAX_NEWS`] articles per day.
//!
//! Descriptions frequently embed HTML (images, links); only their visible
//! text is kept.

use super::{RetryPolicy, get_with_retry};
use crate::config::FeedSettings;
use crate::error::PipelineError;
use crate::models::NewsItem;
use chrono::DateTime;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use scraper::Html;
use serde::Deserialize;
use std::error::Error;
use tracing::{debug, error, info, instrument};

/// Upper bound on stored articles per run.
pub const MAX_NEWS: usize = 15;

/// Feeds ranked ahead of the rest when ordering the merged list.
const PRIORITY_SOURCES: [&str; 3] = ["GloboEsporte", "ESPN Brasil", "Lance!"];

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

/// Replace HTML entities that are not valid XML before parsing.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

/// Visible text of an HTML fragment, whitespace collapsed.
pub fn strip_html(fragment: &str) -> String {
    let doc = Html::parse_fragment(fragment);
    doc.root_element()
        .text()
        .flat_map(str::split_whitespace)
        .join(" ")
}

/// RFC 2822 `pubDate` → `dd/mm/YYYY HH:MM`; unparseable dates are kept as-is.
fn display_pub_date(raw: &str) -> String {
    DateTime::parse_from_rfc2822(raw.trim())
        .map(|d| {
            d.with_timezone(&crate::utils::sao_paulo_offset())
                .format("%d/%m/%Y %H:%M")
                .to_string()
        })
        .unwrap_or_else(|_| raw.trim().to_string())
}

/// Parse one feed document. Items without a title or link are dropped.
pub fn parse_feed(xml: &str, feed: &FeedSettings) -> Result<Vec<NewsItem>, Box<dyn Error>> {
    let rss: Rss = quick_xml::de::from_str(&scrub_html_entities_for_xml(xml))?;
    let items = rss
        .channel
        .item
        .into_iter()
        .filter_map(|it| {
            let title = strip_html(it.title.as_deref()?);
            let link = it.link?.trim().to_string();
            if title.is_empty() || link.is_empty() {
                return None;
            }
            Some(NewsItem {
                title,
                description: it.description.as_deref().map(strip_html).unwrap_or_default(),
                source: feed.name.clone(),
                link,
                category: feed.category.clone(),
                date: it.pub_date.as_deref().map(display_pub_date),
                collected_at: None,
                collection_source: None,
            })
        })
        .collect();
    Ok(items)
}

/// Deduplicate by case-insensitive title, put priority sources first
/// (then group by source name), and keep at most [`MAX_NEWS`].
pub fn rank_news(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut unique: Vec<NewsItem> = items
        .into_iter()
        .unique_by(|n| n.title.trim().to_lowercase())
        .collect();
    unique.sort_by_key(|n| {
        (
            !PRIORITY_SOURCES.contains(&n.source.as_str()),
            n.source.clone(),
        )
    });
    unique.truncate(MAX_NEWS);
    unique
}

/// Fetch every feed in order. Failed feeds are logged and skipped; the call
/// fails only when no feed could be read at all.
#[instrument(level = "info", skip_all, fields(feeds = feeds.len()))]
pub async fn fetch_feeds(
    client: &reqwest::Client,
    feeds: &[FeedSettings],
    policy: RetryPolicy,
) -> Result<Vec<NewsItem>, Box<dyn Error>> {
    let results: Vec<Option<Vec<NewsItem>>> = stream::iter(feeds)
        .then(|feed| async move {
            let parsed = match get_with_retry(client, &feed.url, policy).await {
                Ok(body) => parse_feed(&body, feed),
                Err(e) => Err(e),
            };
            match parsed {
                Ok(items) => {
                    debug!(feed = %feed.name, count = items.len(), "Parsed feed");
                    Some(items)
                }
                Err(e) => {
                    error!(feed = %feed.name, error = %e, "Feed fetch failed");
                    None
                }
            }
        })
        .collect()
        .await;

    if !feeds.is_empty() && results.iter().all(Option::is_none) {
        return Err(Box::new(PipelineError::SourceUnavailable {
            source: "rss".to_string(),
            reason: "every feed failed".to_string(),
        }));
    }

    let ranked = rank_news(results.into_iter().flatten().flatten().collect());
    info!(count = ranked.len(), "Fetched news feeds");
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(name: &str) -> FeedSettings {
        FeedSettings {
            name: name.to_string(),
            url: "https://example.com/rss".to_string(),
            category: "Futebol".to_string(),
        }
    }

    fn news(title: &str, source: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            description: String::new(),
            source: source.to_string(),
            link: format!("https://example.com/{}", title.len()),
            category: "Futebol".to_string(),
            date: None,
            collected_at: None,
            collection_source: None,
        }
    }

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>ge</title>
    <item>
      <title>Flamengo vence o Vasco&nbsp;no Maracanã</title>
      <link>https://ge.globo.com/a</link>
      <pubDate>Sun, 09 Jun 2024 18:00:00 +0000</pubDate>
      <description><![CDATA[<img src="x.jpg"/><p>Rubro-Negro   sobe na tabela</p>]]></description>
    </item>
    <item>
      <title>Sem link</title>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed_extracts_items() {
        let items = parse_feed(XML, &feed("GloboEsporte")).unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.title, "Flamengo vence o Vasco no Maracanã");
        assert_eq!(item.description, "Rubro-Negro sobe na tabela");
        assert_eq!(item.source, "GloboEsporte");
        assert_eq!(item.date.as_deref(), Some("09/06/2024 15:00"));
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<b>Gol</b> de <i>placa</i>"), "Gol de placa");
        assert_eq!(strip_html("texto simples"), "texto simples");
    }

    #[test]
    fn test_rank_news_dedups_and_prioritises() {
        let ranked = rank_news(vec![
            news("Mercado agitado", "UOL Esporte"),
            news("Flamengo vence", "GloboEsporte"),
            news("FLAMENGO VENCE ", "Lance!"),
            news("Endrick no Real", "ESPN Brasil"),
        ]);
        let titles: Vec<_> = ranked.iter().map(|n| n.source.as_str()).collect();
        assert_eq!(titles, vec!["ESPN Brasil", "GloboEsporte", "UOL Esporte"]);
    }

    #[test]
    fn test_rank_news_caps_output() {
        let many = (0..40).map(|i| news(&format!("noticia {i}"), "Lance!")).collect();
        assert_eq!(rank_news(many).len(), MAX_NEWS);
    }
}
