//! Gmail REST transport.
//!
//! The access token is read from a cached JSON token file (the layout written
//! by Google's OAuth client libraries). An expired or rejected token is
//! refreshed at most once per send, and only when a refresh token and client
//! credentials are available; otherwise the send fails with
//! [`PipelineError::Auth`].

use super::MailSender;
use crate::config::GmailSettings;
use crate::error::PipelineError;
use crate::outputs::json::{read_json, write_json};
use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::error::Error;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

const SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Cached OAuth credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCache {
    #[serde(alias = "access_token")]
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

impl TokenCache {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .is_some_and(|exp| exp - Duration::seconds(EXPIRY_MARGIN_SECS) <= now)
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    raw: &'a str,
}

/// Sends through `users/me/messages/send` as the cached token's owner.
pub struct GmailSender {
    client: reqwest::Client,
    token_file: PathBuf,
    client_id: Option<String>,
    client_secret: Option<String>,
    token: RefCell<Option<TokenCache>>,
}

impl GmailSender {
    pub fn new(settings: &GmailSettings) -> Result<Self, Box<dyn Error>> {
        let client = reqwest::Client::builder()
            .timeout(crate::scrapers::REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            token_file: settings.token_file.clone(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            token: RefCell::new(None),
        })
    }

    async fn cached_token(&self) -> Result<TokenCache, PipelineError> {
        if let Some(token) = self.token.borrow().clone() {
            return Ok(token);
        }
        let token: TokenCache = read_json(&self.token_file).await.map_err(|e| {
            PipelineError::Auth(format!(
                "cannot read token file {}: {e}",
                self.token_file.display()
            ))
        })?;
        *self.token.borrow_mut() = Some(token.clone());
        Ok(token)
    }

    /// Exchange the refresh token for a new access token and persist it.
    #[instrument(level = "info", skip_all)]
    async fn refresh(&self, token: &TokenCache) -> Result<TokenCache, Box<dyn Error>> {
        let body = refresh_body(token, self.client_id.as_deref(), self.client_secret.as_deref())?;
        let resp = self
            .client
            .post(TOKEN_URL)
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Box::new(PipelineError::Auth(format!(
                "token refresh rejected ({status}): {text}"
            ))));
        }
        let refreshed: RefreshResponse = resp.json().await?;

        let mut updated = token.clone();
        updated.token = refreshed.access_token;
        updated.expiry = refreshed
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        if let Err(e) = write_json(&self.token_file, &updated).await {
            warn!(error = %e, "Refreshed token could not be cached");
        }
        *self.token.borrow_mut() = Some(updated.clone());
        info!("Access token refreshed");
        Ok(updated)
    }

    async fn post_message(&self, token: &str, raw: &str) -> Result<reqwest::Response, Box<dyn Error>> {
        Ok(self
            .client
            .post(SEND_URL)
            .bearer_auth(token)
            .json(&SendRequest { raw })
            .send()
            .await?)
    }
}

/// Form body for the refresh grant. Settings credentials win over the ones
/// cached in the token file.
fn refresh_body(
    token: &TokenCache,
    client_id: Option<&str>,
    client_secret: Option<&str>,
) -> Result<String, PipelineError> {
    let refresh_token = token
        .refresh_token
        .as_deref()
        .ok_or_else(|| PipelineError::Auth("token expired and no refresh token cached".to_string()))?;
    let client_id = client_id
        .or(token.client_id.as_deref())
        .ok_or_else(|| PipelineError::Auth("token expired and no client_id available".to_string()))?;
    let client_secret = client_secret
        .or(token.client_secret.as_deref())
        .ok_or_else(|| {
            PipelineError::Auth("token expired and no client_secret available".to_string())
        })?;
    Ok(format!(
        "client_id={}&client_secret={}&refresh_token={}&grant_type=refresh_token",
        urlencoding::encode(client_id),
        urlencoding::encode(client_secret),
        urlencoding::encode(refresh_token),
    ))
}

impl MailSender for GmailSender {
    #[instrument(level = "info", skip_all, fields(bytes = raw.len()))]
    async fn send(&self, raw: &str) -> Result<String, Box<dyn Error>> {
        let mut token = self.cached_token().await?;
        let mut refreshed = false;
        if token.is_expired(Utc::now()) {
            token = self.refresh(&token).await?;
            refreshed = true;
        }

        let mut resp = self.post_message(&token.token, raw).await?;
        if resp.status() == StatusCode::UNAUTHORIZED && !refreshed {
            warn!("Access token rejected; refreshing once");
            token = self.refresh(&token).await?;
            resp = self.post_message(&token.token, raw).await?;
        }

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let text = resp.text().await.unwrap_or_default();
            return Err(Box::new(PipelineError::Auth(format!("{status}: {text}"))));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Box::new(PipelineError::Delivery(format!("{status}: {text}"))));
        }
        let sent: SendResponse = resp
            .json()
            .await
            .map_err(|e| PipelineError::Delivery(format!("unexpected send response: {e}")))?;
        Ok(sent.id)
    }
}
