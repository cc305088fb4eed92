//! Question bank fetched over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use cbtprep_core::bank::{BankFormat, QuestionSource, RawDocument};
use cbtprep_core::LoadError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A bank served at a URL, fetched once with a GET request.
pub struct HttpSource {
    url: String,
    format: BankFormat,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpSource {
    pub fn new(url: &str) -> Self {
        Self::with_timeout(url, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(url: &str, timeout_secs: u64) -> Self {
        // Builder only fails if the TLS backend cannot initialize.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            url: url.to_string(),
            format: BankFormat::from_name(url),
            client,
            timeout_secs,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl QuestionSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<RawDocument, LoadError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                LoadError::Unreachable(format!(
                    "{} timed out after {}s",
                    self.url, self.timeout_secs
                ))
            } else {
                LoadError::Unreachable(format!("{} not reachable: {e}", self.url))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Unreachable(format!(
                "{} returned HTTP {}",
                self.url,
                status.as_u16()
            )));
        }

        let format = match response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            Some(ct) if ct.contains("toml") => BankFormat::Toml,
            Some(ct) if ct.contains("json") => BankFormat::Json,
            _ => self.format,
        };

        let body = response
            .text()
            .await
            .map_err(|e| LoadError::Unreachable(format!("failed to read body of {}: {e}", self.url)))?;

        tracing::debug!("fetched {} bytes", body.len());
        Ok(RawDocument { body, format })
    }
}
