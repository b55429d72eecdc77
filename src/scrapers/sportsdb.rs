//! TheSportsDB schedule and results client.
//!
//! Uses the v1 JSON API:
//! - `eventsday.php?d=YYYY-MM-DD&s=Soccer` for a single day's fixtures
//! - `eventsnextleague.php?id=<league>` for the upcoming league schedule
//!
//! Day listings are worldwide, so they are filtered down to competitions a
//! Brazilian audience follows.

use super::{RetryPolicy, get_with_retry};
use crate::models::{RawItem, SportEvent};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::error::Error;
use tracing::{info, instrument};
use url::Url;

const BASE_URL: &str = "https://www.thesportsdb.com/api/v1/json";

/// League-name fragments that mark a fixture as relevant.
const LEAGUE_KEYWORDS: [&str; 5] = ["brazil", "brasileir", "copa", "libertadores", "sudamericana"];

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    events: Option<Vec<ApiEvent>>,
}

#[allow(non_snake_case)]
#[derive(Debug, Deserialize)]
struct ApiEvent {
    strHomeTeam: Option<String>,
    strAwayTeam: Option<String>,
    strLeague: Option<String>,
    dateEvent: Option<String>,
    strTime: Option<String>,
    strVenue: Option<String>,
    strStatus: Option<String>,
    strSport: Option<String>,
    intHomeScore: Option<Value>,
    intAwayScore: Option<Value>,
}

fn endpoint(api_key: &str, script: &str) -> String {
    format!("{BASE_URL}/{}/{script}", urlencoding::encode(api_key))
}

fn day_url(api_key: &str, day: NaiveDate) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        &endpoint(api_key, "eventsday.php"),
        &[("d", day.format("%Y-%m-%d").to_string()), ("s", "Soccer".to_string())],
    )
}

fn next_league_url(api_key: &str, league_id: u32) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        &endpoint(api_key, "eventsnextleague.php"),
        &[("id", league_id.to_string())],
    )
}

/// True when the league name matches one of [`LEAGUE_KEYWORDS`].
pub fn is_relevant_league(league: &str) -> bool {
    let league = league.to_lowercase();
    LEAGUE_KEYWORDS.iter().any(|k| league.contains(k))
}

fn score_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// `2024-06-09` → `09/06/2024`; anything unparseable is kept verbatim.
fn display_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// `19:00:00+00:00` → `19:00`.
fn display_time(raw: Option<&str>) -> String {
    match raw {
        Some(t) if t.len() >= 5 && t.is_char_boundary(5) => t[..5].to_string(),
        _ => "A definir".to_string(),
    }
}

fn to_event(api: ApiEvent) -> Option<SportEvent> {
    let home_team = non_empty(api.strHomeTeam)?;
    let away_team = non_empty(api.strAwayTeam)?;
    let score = match (
        api.intHomeScore.as_ref().and_then(score_text),
        api.intAwayScore.as_ref().and_then(score_text),
    ) {
        (Some(h), Some(a)) => Some(format!("{h}-{a}")),
        _ => None,
    };
    Some(SportEvent {
        home_team,
        away_team,
        league: non_empty(api.strLeague).unwrap_or_else(|| "Liga não informada".to_string()),
        date: api
            .dateEvent
            .as_deref()
            .map(display_date)
            .unwrap_or_else(|| "Data a definir".to_string()),
        time: display_time(api.strTime.as_deref()),
        sport: match api.strSport.as_deref() {
            Some("Soccer") | None => "Futebol".to_string(),
            Some(other) => other.to_string(),
        },
        venue: non_empty(api.strVenue),
        status: non_empty(api.strStatus),
        score,
        game: None,
        viewers: None,
        tv: None,
    })
}

/// Parse an `events` response body into events. A `null` list is empty.
pub fn parse_events(body: &str) -> Result<Vec<SportEvent>, Box<dyn Error>> {
    let resp: EventsResponse = serde_json::from_str(body)?;
    Ok(resp
        .events
        .unwrap_or_default()
        .into_iter()
        .filter_map(to_event)
        .collect())
}

/// Relevant fixtures scheduled on `day`.
#[instrument(level = "info", skip(client, api_key, policy))]
pub async fn events_on_day(
    client: &reqwest::Client,
    api_key: &str,
    day: NaiveDate,
    policy: RetryPolicy,
) -> Result<Vec<RawItem>, Box<dyn Error>> {
    let url = day_url(api_key, day)?;
    let body = get_with_retry(client, url.as_str(), policy).await?;
    let events: Vec<RawItem> = parse_events(&body)?
        .into_iter()
        .filter(|e| is_relevant_league(&e.league))
        .map(|mut e| {
            e.status.get_or_insert_with(|| "Agendado".to_string());
            RawItem::Event(e)
        })
        .collect();
    info!(count = events.len(), "Fetched day fixtures");
    Ok(events)
}

/// Relevant fixtures on `day` that already have a final score.
#[instrument(level = "info", skip(client, api_key, policy))]
pub async fn results_on_day(
    client: &reqwest::Client,
    api_key: &str,
    day: NaiveDate,
    policy: RetryPolicy,
) -> Result<Vec<RawItem>, Box<dyn Error>> {
    let url = day_url(api_key, day)?;
    let body = get_with_retry(client, url.as_str(), policy).await?;
    let results: Vec<RawItem> = parse_events(&body)?
        .into_iter()
        .filter(|e| e.score.is_some() && is_relevant_league(&e.league))
        .map(|mut e| {
            e.status = Some("Finalizado".to_string());
            RawItem::Event(e)
        })
        .collect();
    info!(count = results.len(), "Fetched recent results");
    Ok(results)
}

/// The next scheduled fixtures of one league.
#[instrument(level = "info", skip(client, api_key, policy))]
pub async fn next_league_events(
    client: &reqwest::Client,
    api_key: &str,
    league_id: u32,
    policy: RetryPolicy,
) -> Result<Vec<RawItem>, Box<dyn Error>> {
    let url = next_league_url(api_key, league_id)?;
    let body = get_with_retry(client, url.as_str(), policy).await?;
    let events: Vec<RawItem> = parse_events(&body)?
        .into_iter()
        .map(RawItem::Event)
        .collect();
    info!(count = events.len(), "Fetched league schedule");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"events": [
        {"strHomeTeam": "Flamengo", "strAwayTeam": "Vasco", "strLeague": "Brazilian Serie A",
         "dateEvent": "2024-06-09", "strTime": "19:00:00", "strVenue": "Maracanã",
         "strStatus": "Match Finished", "strSport": "Soccer", "intHomeScore": "2", "intAwayScore": "1"},
        {"strHomeTeam": "Arsenal", "strAwayTeam": "Chelsea", "strLeague": "English Premier League",
         "dateEvent": "2024-06-09", "strTime": null, "strVenue": "", "strStatus": null,
         "strSport": "Soccer", "intHomeScore": null, "intAwayScore": null},
        {"strHomeTeam": null, "strAwayTeam": "Santos", "strLeague": "Copa do Brasil"}
    ]}"#;

    #[test]
    fn test_parse_events_maps_fields() {
        let events = parse_events(BODY).unwrap();
        assert_eq!(events.len(), 2);
        let fla = &events[0];
        assert_eq!(fla.home_team, "Flamengo");
        assert_eq!(fla.date, "09/06/2024");
        assert_eq!(fla.time, "19:00");
        assert_eq!(fla.sport, "Futebol");
        assert_eq!(fla.score.as_deref(), Some("2-1"));
        assert_eq!(fla.venue.as_deref(), Some("Maracanã"));

        let ars = &events[1];
        assert_eq!(ars.time, "A definir");
        assert_eq!(ars.venue, None);
        assert_eq!(ars.score, None);
    }

    #[test]
    fn test_null_event_list_is_empty() {
        assert!(parse_events(r#"{"events": null}"#).unwrap().is_empty());
        assert!(parse_events("{}").unwrap().is_empty());
    }

    #[test]
    fn test_relevant_leagues() {
        assert!(is_relevant_league("Brazilian Serie A"));
        assert!(is_relevant_league("CONMEBOL Libertadores"));
        assert!(is_relevant_league("Copa do Brasil"));
        assert!(!is_relevant_league("English Premier League"));
    }

    #[test]
    fn test_urls_encode_parameters() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
        let url = day_url("3", day).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.thesportsdb.com/api/v1/json/3/eventsday.php?d=2024-06-09&s=Soccer"
        );
        let url = next_league_url("3", 4351).unwrap();
        assert!(url.as_str().ends_with("eventsnextleague.php?id=4351"));
    }

    #[test]
    fn test_numeric_scores_are_accepted() {
        let body = r#"{"events": [{"strHomeTeam": "Bahia", "strAwayTeam": "Vitória",
            "strLeague": "Brazilian Serie A", "intHomeScore": 0, "intAwayScore": 3}]}"#;
        let events = parse_events(body).unwrap();
        assert_eq!(events[0].score.as_deref(), Some("0-3"));
        assert_eq!(events[0].date, "Data a definir");
    }
}
