//! Core data model types for cbtprep.
//!
//! Questions are immutable once loaded and shared between the pool and any
//! session drawn from it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LoginError;

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier within the bank.
    pub id: String,
    /// The question text shown to the user.
    #[serde(rename = "question")]
    pub text: String,
    /// Option key (e.g. "A") to option text.
    pub options: BTreeMap<String, String>,
    /// Key of the correct option. Always one of `options`' keys.
    #[serde(rename = "correct_answer")]
    pub correct_answer: String,
    /// Shown next to the question during review.
    pub explanation: String,
}

impl Question {
    /// Text of the option with the given key.
    pub fn option_text(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn has_option(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn is_correct(&self, key: &str) -> bool {
        self.correct_answer == key
    }
}

/// The full static collection of questions, in document order.
#[derive(Debug, Clone, Default)]
pub struct QuestionPool {
    questions: Vec<Arc<Question>>,
}

impl QuestionPool {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions: questions.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Question>> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Question>> {
        self.questions.iter()
    }
}

impl FromIterator<Question> for QuestionPool {
    fn from_iter<I: IntoIterator<Item = Question>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The outcome of one completed session.
///
/// Serialized with the short field names used by previously stored histories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(rename = "correct")]
    pub correct_count: u32,
    #[serde(rename = "wrong")]
    pub wrong_count: u32,
    /// Whole-number percentage, rounded half-up.
    pub percentage: u32,
    pub timestamp: DateTime<Utc>,
}

impl ScoreRecord {
    pub fn total(&self) -> u32 {
        self.correct_count + self.wrong_count
    }
}

/// The locally stored identity of the person taking the exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "name")]
    pub display_name: String,
    pub department: String,
}

impl UserProfile {
    /// Build a profile from raw login input. Both fields are trimmed.
    pub fn new(display_name: &str, department: &str) -> Result<Self, LoginError> {
        let display_name = display_name.trim();
        let department = department.trim();
        if display_name.is_empty() {
            return Err(LoginError::EmptyName);
        }
        if department.is_empty() {
            return Err(LoginError::EmptyDepartment);
        }
        Ok(Self {
            display_name: display_name.to_string(),
            department: department.to_string(),
        })
    }
}
