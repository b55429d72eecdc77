//! Settings file (`env.yaml`) loading and validation.
//!
//! Every stage reads its section from one YAML document. There are no
//! embedded credentials: a command that needs a section calls the matching
//! `require_*` accessor before doing any work, and a missing or blank key
//! fails the command immediately with the key's dotted name.
//!
//! ```yaml
//! gmail:
//!   sender_email: relatorios@artplan.com.br
//!   recipient_email: marketing@artplan.com.br
//!   token_file: token.json
//! generation:
//!   template: sports_curator
//! sources:
//!   sportsdb_api_key: "3"
//! ```

use crate::error::PipelineError;
use lettre::message::Mailbox;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub gmail: Option<GmailSettings>,
    #[serde(default)]
    pub generation: Option<GenerationSettings>,
    #[serde(default)]
    pub sources: Option<SourceSettings>,
    #[serde(default)]
    pub collection: CollectionSettings,
}

/// Mail delivery settings. The OAuth token itself lives in `token_file`.
#[derive(Debug, Clone, Deserialize)]
pub struct GmailSettings {
    pub sender_email: String,
    pub recipient_email: String,
    pub token_file: PathBuf,
    /// OAuth client used to refresh an expired access token.
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// Text generation settings. The model endpoint and key are read from the
/// awful_aj `config.yaml`; only the template name and its location are ours.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSettings {
    pub template: String,
    /// Path to the awful_aj config file. Defaults to awful_aj's config dir.
    #[serde(default)]
    pub aj_config: Option<PathBuf>,
    #[serde(default = "default_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    pub sportsdb_api_key: String,
    #[serde(default = "default_league_id")]
    pub brasileirao_league_id: u32,
    #[serde(default = "default_country")]
    pub holiday_country: String,
    #[serde(default = "default_feeds")]
    pub news_feeds: Vec<FeedSettings>,
}

/// One RSS feed polled by the news collector.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FeedSettings {
    pub name: String,
    pub url: String,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    #[serde(default = "default_retention")]
    pub retention_days: i64,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            retention_days: default_retention(),
        }
    }
}

fn default_attempts() -> usize {
    3
}

fn default_retry_delay() -> u64 {
    2
}

fn default_league_id() -> u32 {
    4351
}

fn default_country() -> String {
    "BR".to_string()
}

fn default_retention() -> i64 {
    7
}

fn default_feeds() -> Vec<FeedSettings> {
    [
        ("GloboEsporte", "https://ge.globo.com/rss/ge/", "Futebol Brasileiro"),
        ("ESPN Brasil", "https://www.espn.com.br/rss", "Esportes"),
        ("Lance!", "https://www.lance.com.br/feed", "Futebol"),
        ("UOL Esporte", "https://rss.uol.com.br/feed/esporte.xml", "Futebol"),
        ("Mais Esports", "https://maisesports.com.br/feed/", "E-sports"),
    ]
    .into_iter()
    .map(|(name, url, category)| FeedSettings {
        name: name.to_string(),
        url: url.to_string(),
        category: category.to_string(),
    })
    .collect()
}

fn require_text(value: &str, key: &str) -> Result<(), PipelineError> {
    if value.trim().is_empty() {
        return Err(PipelineError::Config(format!("{key} is required")));
    }
    Ok(())
}

fn require_mailbox(value: &str, key: &str) -> Result<(), PipelineError> {
    require_text(value, key)?;
    value
        .parse::<Mailbox>()
        .map(|_| ())
        .map_err(|e| PipelineError::Config(format!("{key} is not a valid address: {e}")))
}

impl Settings {
    /// Read and parse the settings file. Section validation happens in the
    /// `require_*` accessors.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let settings = Self::from_yaml(&text)?;
        info!("Loaded settings");
        Ok(settings)
    }

    pub fn from_yaml(text: &str) -> Result<Self, PipelineError> {
        let settings: Settings = serde_yaml::from_str(text)
            .map_err(|e| PipelineError::Config(format!("cannot parse settings: {e}")))?;
        if settings.collection.retention_days < 1 {
            return Err(PipelineError::Config(
                "collection.retention_days must be at least 1".to_string(),
            ));
        }
        Ok(settings)
    }

    pub fn require_gmail(&self) -> Result<&GmailSettings, PipelineError> {
        let gmail = self
            .gmail
            .as_ref()
            .ok_or_else(|| PipelineError::Config("gmail section is required".to_string()))?;
        require_mailbox(&gmail.sender_email, "gmail.sender_email")?;
        require_mailbox(&gmail.recipient_email, "gmail.recipient_email")?;
        if gmail.token_file.as_os_str().is_empty() {
            return Err(PipelineError::Config("gmail.token_file is required".to_string()));
        }
        Ok(gmail)
    }

    pub fn require_generation(&self) -> Result<&GenerationSettings, PipelineError> {
        let generation = self
            .generation
            .as_ref()
            .ok_or_else(|| PipelineError::Config("generation section is required".to_string()))?;
        require_text(&generation.template, "generation.template")?;
        if generation.max_attempts == 0 {
            return Err(PipelineError::Config(
                "generation.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(generation)
    }

    pub fn require_sources(&self) -> Result<&SourceSettings, PipelineError> {
        let sources = self
            .sources
            .as_ref()
            .ok_or_else(|| PipelineError::Config("sources section is required".to_string()))?;
        require_text(&sources.sportsdb_api_key, "sources.sportsdb_api_key")?;
        require_text(&sources.holiday_country, "sources.holiday_country")?;
        for (i, feed) in sources.news_feeds.iter().enumerate() {
            url::Url::parse(&feed.url).map_err(|e| {
                PipelineError::Config(format!("sources.news_feeds[{i}].url is invalid: {e}"))
            })?;
        }
        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
gmail:
  sender_email: relatorios@artplan.com.br
  recipient_email: marketing@artplan.com.br
  token_file: token.json
generation:
  template: sports_curator
sources:
  sportsdb_api_key: "3"
"#;

    #[test]
    fn test_full_settings_validate() {
        let settings = Settings::from_yaml(FULL).unwrap();
        assert_eq!(settings.require_gmail().unwrap().token_file, PathBuf::from("token.json"));
        assert_eq!(settings.require_generation().unwrap().max_attempts, 3);
        let sources = settings.require_sources().unwrap();
        assert_eq!(sources.brasileirao_league_id, 4351);
        assert_eq!(sources.news_feeds.len(), 5);
        assert_eq!(settings.collection.retention_days, 7);
    }

    #[test]
    fn test_missing_section_fails_fast() {
        let settings = Settings::from_yaml("collection:\n  retention_days: 3\n").unwrap();
        let err = settings.require_gmail().unwrap_err();
        assert!(err.to_string().contains("gmail section is required"));
        assert!(settings.require_sources().is_err());
    }

    #[test]
    fn test_blank_recipient_is_rejected() {
        let yaml = FULL.replace("marketing@artplan.com.br", "\"\"");
        let settings = Settings::from_yaml(&yaml).unwrap();
        let err = settings.require_gmail().unwrap_err();
        assert!(err.to_string().contains("gmail.recipient_email is required"));
    }

    #[test]
    fn test_malformed_sender_is_rejected() {
        let yaml = FULL.replace("relatorios@artplan.com.br", "not-an-address");
        let settings = Settings::from_yaml(&yaml).unwrap();
        let err = settings.require_gmail().unwrap_err();
        assert!(err.to_string().contains("gmail.sender_email is not a valid address"));
    }

    #[test]
    fn test_zero_retention_is_rejected() {
        let yaml = format!("{FULL}collection:\n  retention_days: 0\n");
        assert!(Settings::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.yaml");
        std::fs::write(&path, FULL).unwrap();
        let settings = Settings::load(&path).unwrap();
        assert!(settings.gmail.is_some());

        let missing = Settings::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(missing.to_string().contains("cannot read"));
    }
}
