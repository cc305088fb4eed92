//! In-memory source for tests and embedded banks.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use cbtprep_core::bank::{BankFormat, QuestionSource, RawDocument};
use cbtprep_core::LoadError;

/// A source that always returns the same document, or the same failure.
pub struct StaticSource {
    body: Result<String, String>,
    format: BankFormat,
    /// Number of fetches made.
    fetch_count: AtomicU32,
}

impl StaticSource {
    pub fn new(body: impl Into<String>, format: BankFormat) -> Self {
        Self {
            body: Ok(body.into()),
            format,
            fetch_count: AtomicU32::new(0),
        }
    }

    pub fn json(body: impl Into<String>) -> Self {
        Self::new(body, BankFormat::Json)
    }

    /// A source whose every fetch fails as unreachable.
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            body: Err(reason.into()),
            format: BankFormat::Json,
            fetch_count: AtomicU32::new(0),
        }
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl QuestionSource for StaticSource {
    fn describe(&self) -> String {
        "static".to_string()
    }

    async fn fetch(&self) -> Result<RawDocument, LoadError> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        match &self.body {
            Ok(body) => Ok(RawDocument {
                body: body.clone(),
                format: self.format,
            }),
            Err(reason) => Err(LoadError::Unreachable(reason.clone())),
        }
    }
}
