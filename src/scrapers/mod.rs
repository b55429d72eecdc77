//! Live data sources for the collector.
//!
//! Every category the collector fetches goes through [`SportsSource`], so a
//! failing or absent upstream can be simulated in tests. The production
//! implementation, [`HttpSources`], dispatches to one submodule per service.
//!
//! # Supported Sources
//!
//! | Service | Module | Categories |
//! |---------|--------|------------|
//! | TheSportsDB | [`sportsdb`] | today, tomorrow, recent results, weekly schedule |
//! | RSS feeds | [`rss`] | news |
//! | Nager.Date | [`holidays`] | upcoming public holidays |
//!
//! E-sports has no public schedule feed and always comes from fixtures.
//! Market data and trending topics are derived from news by the collector.
//!
//! # Common Patterns
//!
//! - One shared `reqwest::Client` with a short per-request timeout
//! - [`get_with_retry`]: fixed attempt count, fixed sleep between attempts
//! - Upstream records are mapped into [`RawItem`]s; unusable records are
//!   dropped, never padded

pub mod holidays;
pub mod rss;
pub mod sportsdb;

use crate::config::SourceSettings;
use crate::error::PipelineError;
use crate::models::{Category, RawItem};
use chrono::{Duration, NaiveDate};
use std::error::Error;
use std::time::Duration as StdDuration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// Per-request timeout for every outbound call.
pub const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Trait for a live upstream.
pub trait SportsSource {
    /// Fetch the raw items for `category` as of `today`.
    ///
    /// An empty `Ok` means the upstream answered but had nothing usable.
    async fn fetch(
        &self,
        category: Category,
        today: NaiveDate,
    ) -> Result<Vec<RawItem>, Box<dyn Error>>;
}

/// Bounded retry for outbound HTTP calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: StdDuration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: StdDuration::from_secs(1),
        }
    }
}

/// GET `url` and return the body, retrying on transport errors and
/// non-success statuses.
#[instrument(level = "debug", skip_all, fields(%url))]
pub async fn get_with_retry(
    client: &reqwest::Client,
    url: &str,
    policy: RetryPolicy,
) -> Result<String, Box<dyn Error>> {
    let max = policy.max_attempts.max(1);
    let mut attempt = 0usize;
    loop {
        attempt += 1;
        let res = match client.get(url).send().await {
            Ok(resp) => match resp.error_for_status() {
                Ok(resp) => resp.text().await.map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            },
            Err(e) => Err(e.to_string()),
        };

        match res {
            Ok(body) => {
                debug!(attempt, bytes = body.len(), "GET succeeded");
                return Ok(body);
            }
            Err(reason) if attempt >= max => {
                return Err(Box::new(PipelineError::SourceUnavailable {
                    source: url.to_string(),
                    reason,
                }));
            }
            Err(reason) => {
                warn!(attempt, max, error = %reason, "GET failed; retrying");
                sleep(policy.delay).await;
            }
        }
    }
}

/// Production [`SportsSource`] backed by the public HTTP services.
#[derive(Debug)]
pub struct HttpSources {
    client: reqwest::Client,
    settings: SourceSettings,
    policy: RetryPolicy,
}

impl HttpSources {
    pub fn new(settings: SourceSettings) -> Result<Self, Box<dyn Error>> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            settings,
            policy: RetryPolicy::default(),
        })
    }
}

impl SportsSource for HttpSources {
    #[instrument(level = "info", skip_all, fields(%category, %today))]
    async fn fetch(
        &self,
        category: Category,
        today: NaiveDate,
    ) -> Result<Vec<RawItem>, Box<dyn Error>> {
        let key = &self.settings.sportsdb_api_key;
        let items = match category {
            Category::EventsToday => {
                sportsdb::events_on_day(&self.client, key, today, self.policy).await?
            }
            Category::EventsTomorrow => {
                let tomorrow = today + Duration::days(1);
                sportsdb::events_on_day(&self.client, key, tomorrow, self.policy).await?
            }
            Category::RecentResults => {
                let yesterday = today - Duration::days(1);
                sportsdb::results_on_day(&self.client, key, yesterday, self.policy).await?
            }
            Category::WeeklySchedule => {
                sportsdb::next_league_events(
                    &self.client,
                    key,
                    self.settings.brasileirao_league_id,
                    self.policy,
                )
                .await?
            }
            Category::News => {
                rss::fetch_feeds(&self.client, &self.settings.news_feeds, self.policy)
                    .await?
                    .into_iter()
                    .map(RawItem::News)
                    .collect()
            }
            Category::Holidays => {
                holidays::upcoming(
                    &self.client,
                    &self.settings.holiday_country,
                    today,
                    self.policy,
                )
                .await?
            }
            // No public feed; derived categories never reach the source.
            Category::Esports | Category::Next24h | Category::Market | Category::Trending => {
                Vec::new()
            }
        };
        Ok(items)
    }
}
