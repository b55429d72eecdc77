//! Upcoming public holidays from the Nager.Date API.
//!
//! Holidays shift betting traffic, so the report lists the next few dates
//! that fall within [`HORIZON_DAYS`] of the run.

use super::{RetryPolicy, get_with_retry};
use crate::models::{Holiday, RawItem};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Deserialize;
use std::error::Error;
use tracing::{info, instrument};

const BASE_URL: &str = "https://date.nager.at/api/v3/PublicHolidays";

/// Only holidays this many days ahead (inclusive) are kept.
pub const HORIZON_DAYS: i64 = 30;

const MAX_HOLIDAYS: usize = 3;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiHoliday {
    date: String,
    local_name: Option<String>,
    name: String,
}

fn impact_for(days_until: i64) -> &'static str {
    if days_until <= 3 {
        "Alto tráfego esperado"
    } else {
        "Monitorar campanhas"
    }
}

/// Turn one year's listing into the holidays within the horizon, nearest first.
pub fn upcoming_from(body: &str, today: NaiveDate) -> Result<Vec<Holiday>, Box<dyn Error>> {
    let listing: Vec<ApiHoliday> = serde_json::from_str(body)?;
    let mut holidays: Vec<(NaiveDate, Holiday)> = listing
        .into_iter()
        .filter_map(|h| {
            let date = NaiveDate::parse_from_str(&h.date, "%Y-%m-%d").ok()?;
            let days_until = (date - today).num_days();
            if !(0..=HORIZON_DAYS).contains(&days_until) {
                return None;
            }
            Some((
                date,
                Holiday {
                    date: date.format("%d/%m").to_string(),
                    name: h.local_name.filter(|n| !n.trim().is_empty()).unwrap_or(h.name),
                    days_until,
                    impact: impact_for(days_until).to_string(),
                },
            ))
        })
        .collect();
    holidays.sort_by_key(|(date, _)| *date);
    Ok(holidays.into_iter().map(|(_, h)| h).collect())
}

/// Holidays in `country` between `today` and the horizon, at most three.
///
/// When the horizon crosses into the next year both listings are fetched.
#[instrument(level = "info", skip(client, policy))]
pub async fn upcoming(
    client: &reqwest::Client,
    country: &str,
    today: NaiveDate,
    policy: RetryPolicy,
) -> Result<Vec<RawItem>, Box<dyn Error>> {
    let last_year = (today + Duration::days(HORIZON_DAYS)).year();
    let mut holidays = Vec::new();
    for year in today.year()..=last_year {
        let url = format!("{BASE_URL}/{year}/{}", urlencoding::encode(country));
        let body = get_with_retry(client, &url, policy).await?;
        holidays.extend(upcoming_from(&body, today)?);
    }
    holidays.truncate(MAX_HOLIDAYS);
    info!(count = holidays.len(), "Fetched upcoming holidays");
    Ok(holidays.into_iter().map(RawItem::Holiday).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"[
        {"date": "2025-11-02", "localName": "Finados", "name": "All Souls' Day"},
        {"date": "2025-11-20", "localName": "Dia da Consciência Negra", "name": "Black Consciousness Day"},
        {"date": "2025-11-15", "localName": "", "name": "Republic Proclamation Day"},
        {"date": "2025-12-25", "localName": "Natal", "name": "Christmas Day"},
        {"date": "2025-10-12", "localName": "Nossa Senhora Aparecida", "name": "Our Lady of Aparecida"}
    ]"#;

    #[test]
    fn test_window_and_ordering() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 31).unwrap();
        let holidays = upcoming_from(BODY, today).unwrap();
        let names: Vec<_> = holidays.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Finados",
                "Republic Proclamation Day",
                "Dia da Consciência Negra"
            ]
        );
        assert_eq!(holidays[0].date, "02/11");
        assert_eq!(holidays[0].days_until, 2);
        assert_eq!(holidays[0].impact, "Alto tráfego esperado");
        assert_eq!(holidays[1].impact, "Monitorar campanhas");
    }

    #[test]
    fn test_same_day_holiday_is_kept() {
        let today = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        let holidays = upcoming_from(BODY, today).unwrap();
        assert_eq!(holidays.len(), 1);
        assert_eq!(holidays[0].days_until, 0);
    }

    #[test]
    fn test_bad_body_is_an_error() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(upcoming_from("<html>", today).is_err());
    }
}
