//! Question bank read from the local filesystem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::instrument;

use cbtprep_core::bank::{BankFormat, QuestionSource, RawDocument};
use cbtprep_core::LoadError;

/// A bank stored in a `.json` or `.toml` file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: BankFormat,
}

impl FileSource {
    /// The format is taken from the file extension.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = BankFormat::from_name(&path.to_string_lossy());
        Self { path, format }
    }

    pub fn with_format(mut self, format: BankFormat) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl QuestionSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self) -> Result<RawDocument, LoadError> {
        let body = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            LoadError::Unreachable(format!("failed to read {}: {e}", self.path.display()))
        })?;
        Ok(RawDocument {
            body,
            format: self.format,
        })
    }
}
