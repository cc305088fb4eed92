pub mod history;
pub mod init;
pub mod login;
pub mod take;
pub mod validate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use cbtprep_core::bank;
use cbtprep_core::QuestionPool;
use cbtprep_sources::config::load_config_from;
use cbtprep_sources::{create_source, CbtprepConfig};
use cbtprep_store::LocalStore;

/// Load the config, honoring an explicit `--config` path.
pub(crate) fn config(path: Option<PathBuf>) -> Result<CbtprepConfig> {
    load_config_from(path.as_deref())
}

/// Fetch the configured bank, or the one named by `--bank`.
pub(crate) async fn load_pool(config: &CbtprepConfig, bank: Option<&str>) -> Result<QuestionPool> {
    let source_config = match bank {
        Some(location) => config.source.relocate(location),
        None => config.source.clone(),
    };
    let source = create_source(&source_config)?;
    bank::load(source.as_ref(), source_config.collection())
        .await
        .with_context(|| format!("failed to load question bank from {}", source.describe()))
}

pub(crate) fn open_store(data_dir: &Path) -> Arc<LocalStore> {
    Arc::new(LocalStore::new(data_dir))
}
