//! Text-generation API interaction with a bounded fixed-delay retry.
//!
//! The curator talks to the generator only through [`AskAsync`], so tests
//! and alternative backends can be swapped in without touching the curation
//! logic.
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait defining async text generation
//! - [`AskFnWrapper`]: Wraps the `awful_aj` library's `ask` function
//! - [`RetryAsk`]: Decorator that retries any `AskAsync` implementation
//!
//! # Retry Strategy
//!
//! A fixed number of attempts with the same sleep between each one. There is
//! no exponential growth and no jitter; runs are sequential and infrequent.

use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Trait for async text generation.
///
/// Implementors receive the full prompt (instruction template plus data
/// digest) and return the generated text.
pub trait AskAsync {
    /// The type of response returned by the generator.
    type Response;

    /// Send a prompt and receive the generated response.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper that retries any [`AskAsync`] implementation a fixed number of times.
///
/// ```text
/// attempt 1 -> fail -> sleep(delay) -> attempt 2 -> fail -> sleep(delay) -> ... -> give up
/// ```
pub struct RetryAsk<T> {
    /// The underlying client to wrap.
    inner: T,
    /// Total number of attempts, including the first one.
    max_attempts: usize,
    /// Fixed pause between attempts.
    delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Create a new retry wrapper around an existing [`AskAsync`] implementation.
    ///
    /// `max_attempts` is clamped to at least one attempt.
    pub fn new(inner: T, max_attempts: usize, delay: StdDuration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            attempt += 1;
            match self.inner.ask(text).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt >= self.max_attempts {
                        error!(
                            attempt,
                            max = self.max_attempts,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "ask() exhausted attempts"
                        );
                        return Err(e);
                    }

                    warn!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        delay = ?self.delay,
                        error = %e,
                        "ask() attempt failed; retrying"
                    );
                    sleep(self.delay).await;
                }
            }
        }
    }
}

/// Wrapper around `awful_aj::api::ask` that implements [`AskAsync`].
///
/// Owns its configuration and template so a curator can hold it for the
/// whole run.
#[derive(Debug)]
pub struct AskFnWrapper {
    /// LLM configuration (API endpoint, key, model settings).
    pub config: AwfulJadeConfig,
    /// Chat template holding the system prompt shared by all analyses.
    pub template: ChatTemplate,
}

impl AskAsync for AskFnWrapper {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = ask(&self.config, text.to_string(), &self.template, None, None).await;
        let dt = t0.elapsed();

        match &res {
            Ok(_) => info!(elapsed_ms = dt.as_millis() as u128, "API call succeeded"),
            Err(e) => warn!(elapsed_ms = dt.as_millis() as u128, error = %e, "API call failed"),
        }
        res
    }
}

/// Build the production generator: awful_aj client wrapped in [`RetryAsk`].
///
/// The awful_aj config is read from `config_path` when given, otherwise
/// from `config.yaml` in awful_aj's own config directory.
#[instrument(level = "info", skip_all, fields(%template_name))]
pub async fn build_generator(
    template_name: &str,
    config_path: Option<&std::path::Path>,
    max_attempts: usize,
    delay: StdDuration,
) -> Result<RetryAsk<AskFnWrapper>, Box<dyn Error>> {
    let template = awful_aj::template::load_template(template_name).await?;
    info!("Loaded generation template");

    let conf_file = match config_path {
        Some(p) => p.to_path_buf(),
        None => awful_aj::config_dir()?.join("config.yaml"),
    };
    let conf_str = conf_file
        .to_str()
        .ok_or("awful_aj config path is not valid UTF-8")?;
    let config = awful_aj::config::load_config(conf_str)?;
    info!(config_path = conf_str, "Loaded generation configuration");

    Ok(RetryAsk::new(
        AskFnWrapper { config, template },
        max_attempts,
        delay,
    ))
}
