//! Configuration file loading and the question source factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use cbtprep_core::bank::{QuestionSource, DEFAULT_COLLECTION};
use cbtprep_core::controller::DEFAULT_HISTORY_PREFIX;
use cbtprep_core::ExamConfig;

use crate::file::FileSource;
use crate::http::HttpSource;

/// Where the question bank comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    File {
        path: PathBuf,
        #[serde(default = "default_collection")]
        collection: String,
    },
    Http {
        url: String,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
        #[serde(default = "default_collection")]
        collection: String,
    },
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}
fn default_timeout() -> u64 {
    30
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::File {
            path: PathBuf::from("questions.json"),
            collection: default_collection(),
        }
    }
}

impl SourceConfig {
    /// Build a source from a path or an `http(s)://` URL.
    pub fn from_location(location: &str, collection: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            SourceConfig::Http {
                url: location.to_string(),
                timeout_secs: default_timeout(),
                collection: collection.to_string(),
            }
        } else {
            SourceConfig::File {
                path: PathBuf::from(location),
                collection: collection.to_string(),
            }
        }
    }

    /// Named collection inside the bank document.
    pub fn collection(&self) -> &str {
        match self {
            SourceConfig::File { collection, .. } | SourceConfig::Http { collection, .. } => {
                collection
            }
        }
    }

    /// Point at a different bank, keeping the collection name.
    pub fn relocate(&self, location: &str) -> Self {
        Self::from_location(location, self.collection())
    }
}

/// Top-level cbtprep configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CbtprepConfig {
    /// Directory holding the profile and score histories.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Prefix of the per-user history key.
    #[serde(default = "default_history_prefix")]
    pub history_prefix: String,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub exam: ExamConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".cbtprep")
}
fn default_history_prefix() -> String {
    DEFAULT_HISTORY_PREFIX.to_string()
}

impl Default for CbtprepConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            history_prefix: default_history_prefix(),
            source: SourceConfig::default(),
            exam: ExamConfig::default(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

fn resolve_source_config(config: &SourceConfig) -> SourceConfig {
    match config {
        SourceConfig::File { path, collection } => SourceConfig::File {
            path: resolve_path(path),
            collection: resolve_env_vars(collection),
        },
        SourceConfig::Http {
            url,
            timeout_secs,
            collection,
        } => SourceConfig::Http {
            url: resolve_env_vars(url),
            timeout_secs: *timeout_secs,
            collection: resolve_env_vars(collection),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `cbtprep.toml` in the current directory
/// 2. `~/.config/cbtprep/config.toml`
///
/// Environment variable overrides: `CBTPREP_BANK`, `CBTPREP_DATA_DIR`.
pub fn load_config() -> Result<CbtprepConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<CbtprepConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("cbtprep.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<CbtprepConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => CbtprepConfig::default(),
    };

    if config.exam.question_count == 0 {
        anyhow::bail!("exam.question_count must be at least 1");
    }
    if config.exam.duration_secs == 0 {
        anyhow::bail!("exam.duration_secs must be at least 1");
    }

    Ok(apply_overrides(
        config,
        std::env::var("CBTPREP_BANK").ok(),
        std::env::var("CBTPREP_DATA_DIR").ok(),
    ))
}

/// Apply environment overrides, then expand `${VAR}` references.
fn apply_overrides(
    mut config: CbtprepConfig,
    bank: Option<String>,
    data_dir: Option<String>,
) -> CbtprepConfig {
    if let Some(bank) = bank.filter(|b| !b.trim().is_empty()) {
        config.source = config.source.relocate(bank.trim());
    }
    if let Some(dir) = data_dir.filter(|d| !d.trim().is_empty()) {
        config.data_dir = PathBuf::from(dir.trim());
    }

    config.source = resolve_source_config(&config.source);
    config.data_dir = resolve_path(&config.data_dir);
    config.history_prefix = resolve_env_vars(&config.history_prefix);
    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("cbtprep"))
}

/// Create a question source from its configuration.
pub fn create_source(config: &SourceConfig) -> Result<Box<dyn QuestionSource>> {
    match config {
        SourceConfig::File { path, .. } => Ok(Box::new(FileSource::new(path))),
        SourceConfig::Http {
            url, timeout_secs, ..
        } => {
            if url.trim().is_empty() {
                anyhow::bail!("http source needs a url");
            }
            Ok(Box::new(HttpSource::with_timeout(url, *timeout_secs)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_CBTPREP_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_CBTPREP_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_CBTPREP_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("no_close_${brace"), "no_close_${brace");
        std::env::remove_var("_CBTPREP_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = CbtprepConfig::default();
        assert_eq!(config.data_dir, PathBuf::from(".cbtprep"));
        assert_eq!(config.history_prefix, "phy107");
        assert_eq!(config.source.collection(), "all");
        assert_eq!(config.exam.question_count, 30);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
data_dir = "/tmp/cbt"
history_prefix = "phy108"

[source]
type = "http"
url = "https://example.org/bank.json"
timeout_secs = 5
collection = "mechanics"

[exam]
question_count = 20
duration_secs = 600
"#;
        let config: CbtprepConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.history_prefix, "phy108");
        assert_eq!(
            config.source,
            SourceConfig::Http {
                url: "https://example.org/bank.json".into(),
                timeout_secs: 5,
                collection: "mechanics".into(),
            }
        );
        assert_eq!(config.exam.question_count, 20);
        assert_eq!(config.exam.warning_secs, 180);
    }

    #[test]
    fn file_source_defaults_collection() {
        let config: CbtprepConfig =
            toml::from_str("[source]\ntype = \"file\"\npath = \"bank.toml\"\n").unwrap();
        assert_eq!(
            config.source,
            SourceConfig::File {
                path: PathBuf::from("bank.toml"),
                collection: "all".into(),
            }
        );
    }

    #[test]
    fn bank_override_switches_source_kind() {
        let config = apply_overrides(
            CbtprepConfig::default(),
            Some("https://example.org/q.json".into()),
            Some("/var/lib/cbtprep".into()),
        );
        assert!(matches!(config.source, SourceConfig::Http { .. }));
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/cbtprep"));

        let config = apply_overrides(CbtprepConfig::default(), Some("other.json".into()), None);
        assert_eq!(
            config.source,
            SourceConfig::File {
                path: PathBuf::from("other.json"),
                collection: "all".into(),
            }
        );
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let config = apply_overrides(CbtprepConfig::default(), Some("  ".into()), Some(String::new()));
        assert_eq!(config, CbtprepConfig::default());
    }

    #[test]
    fn explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_from(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn explicit_path_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cbtprep.toml");
        std::fs::write(&path, "history_prefix = \"chem101\"\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.history_prefix, "chem101");
    }

    #[test]
    fn zero_sized_exam_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cbtprep.toml");

        std::fs::write(&path, "[exam]\nduration_secs = 0\n").unwrap();
        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("exam.duration_secs"));

        std::fs::write(&path, "[exam]\nquestion_count = 0\n").unwrap();
        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("exam.question_count"));
    }

    #[test]
    fn factory_rejects_empty_url() {
        let config = SourceConfig::Http {
            url: String::new(),
            timeout_secs: 1,
            collection: "all".into(),
        };
        assert!(create_source(&config).is_err());
        let source = create_source(&SourceConfig::default()).unwrap();
        assert_eq!(source.describe(), "questions.json");
    }
}
