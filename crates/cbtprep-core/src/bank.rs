//! Question bank loading and validation.
//!
//! A bank is a JSON or TOML document holding a named collection of question
//! records. Sources only fetch the raw document; decoding and validation
//! happen here so every source rejects malformed banks the same way.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::LoadError;
use crate::model::{Question, QuestionPool};

/// Collection name used when none is configured.
pub const DEFAULT_COLLECTION: &str = "all";

/// Encoding of a raw bank document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BankFormat {
    #[default]
    Json,
    Toml,
}

impl BankFormat {
    /// Guess the format from a path or URL. Anything not ending in `.toml` is JSON.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        let stem = lower.split(['?', '#']).next().unwrap_or_default();
        if stem.ends_with(".toml") {
            BankFormat::Toml
        } else {
            BankFormat::Json
        }
    }
}

impl fmt::Display for BankFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankFormat::Json => write!(f, "json"),
            BankFormat::Toml => write!(f, "toml"),
        }
    }
}

/// A fetched, not yet decoded, bank document.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub body: String,
    pub format: BankFormat,
}

/// Where question banks come from.
///
/// Implemented by `cbtprep-sources` for files, HTTP and in-memory documents.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Human-readable location, for logs and error messages.
    fn describe(&self) -> String;

    /// Fetch the raw document.
    async fn fetch(&self) -> Result<RawDocument, LoadError>;
}

/// Fetch and decode a bank from any source.
///
/// Undersized pools load fine; the session rejects them at start with the count.
pub async fn load(source: &dyn QuestionSource, collection: &str) -> Result<QuestionPool, LoadError> {
    let raw = source.fetch().await?;
    let pool = parse_document(&raw, collection)?;
    tracing::info!(
        "loaded {} questions from {} ({})",
        pool.len(),
        source.describe(),
        raw.format
    );
    Ok(pool)
}

/// One record as written in the document. Everything is optional here so
/// that a missing field is reported with the record's position.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    options: Option<BTreeMap<String, String>>,
    #[serde(default)]
    correct_answer: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
}

/// Decode a raw document into a pool.
pub fn parse_document(raw: &RawDocument, collection: &str) -> Result<QuestionPool, LoadError> {
    let records: Vec<RawQuestion> = match raw.format {
        BankFormat::Json => {
            let mut doc: serde_json::Value = serde_json::from_str(&raw.body)
                .map_err(|e| LoadError::Malformed(format!("invalid JSON: {e}")))?;
            let items = doc
                .get_mut(collection)
                .map(serde_json::Value::take)
                .ok_or_else(|| missing_collection(collection))?;
            serde_json::from_value(items).map_err(|e| {
                LoadError::Malformed(format!("collection '{collection}' is not a list of records: {e}"))
            })?
        }
        BankFormat::Toml => {
            let mut doc: toml::Table = toml::from_str(&raw.body)
                .map_err(|e| LoadError::Malformed(format!("invalid TOML: {e}")))?;
            let items = doc
                .remove(collection)
                .ok_or_else(|| missing_collection(collection))?;
            items.try_into::<Vec<RawQuestion>>().map_err(|e| {
                LoadError::Malformed(format!("collection '{collection}' is not a list of records: {e}"))
            })?
        }
    };

    records
        .into_iter()
        .enumerate()
        .map(|(i, r)| into_question(i + 1, r))
        .collect::<Result<Vec<_>, _>>()
        .map(QuestionPool::new)
}

fn missing_collection(collection: &str) -> LoadError {
    LoadError::Malformed(format!("document has no '{collection}' collection"))
}

fn into_question(position: usize, raw: RawQuestion) -> Result<Question, LoadError> {
    let invalid = |message: String| LoadError::InvalidQuestion { position, message };

    let text = raw
        .question
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| invalid("missing question text".into()))?;
    let options = raw
        .options
        .ok_or_else(|| invalid("missing options".into()))?;
    if options.is_empty() {
        return Err(invalid("options must not be empty".into()));
    }
    let correct_answer = raw
        .correct_answer
        .ok_or_else(|| invalid("missing correct_answer".into()))?;
    if !options.contains_key(&correct_answer) {
        return Err(invalid(format!(
            "correct_answer '{correct_answer}' is not one of the options"
        )));
    }
    let explanation = raw
        .explanation
        .ok_or_else(|| invalid("missing explanation".into()))?;

    Ok(Question {
        id: raw.id.unwrap_or_else(|| format!("q{position}")),
        text,
        options,
        correct_answer,
        explanation,
    })
}

/// A non-fatal problem found in a loaded pool.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check a pool for issues that do not prevent loading.
pub fn validate_pool(pool: &QuestionPool, exam_size: usize) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if pool.len() < exam_size {
        warnings.push(ValidationWarning {
            question_id: None,
            message: format!(
                "only {} questions available, an exam needs {exam_size}",
                pool.len()
            ),
        });
    }

    let mut seen_ids = HashSet::new();
    let mut seen_texts = HashSet::new();
    for q in pool.iter() {
        if !seen_ids.insert(q.id.as_str()) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
        if !seen_texts.insert(q.text.trim()) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "question text duplicates an earlier question".into(),
            });
        }
        if q.explanation.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "explanation is empty".into(),
            });
        }
    }

    warnings
}
