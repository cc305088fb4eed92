//! Grading.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Question, ScoreRecord};

/// Score a set of answers against their questions.
///
/// `answers` maps a question's position to the chosen option key; a missing
/// entry or a wrong key counts as wrong. Pure: the same inputs always give the
/// same record.
pub fn grade(
    questions: &[Arc<Question>],
    answers: &BTreeMap<usize, String>,
    graded_at: DateTime<Utc>,
) -> ScoreRecord {
    let correct = questions
        .iter()
        .enumerate()
        .filter(|(i, q)| answers.get(i).is_some_and(|key| q.is_correct(key)))
        .count();
    let total = questions.len();

    ScoreRecord {
        correct_count: correct as u32,
        wrong_count: (total - correct) as u32,
        percentage: percentage(correct, total),
        timestamp: graded_at,
    }
}

/// `correct / total * 100`, rounded half-up to a whole number.
pub fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct * 200 + total) / (total * 2)) as u32
}

/// Pass or fail against a pass mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn of(record: &ScoreRecord, pass_mark: u32) -> Self {
        if record.percentage >= pass_mark {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "Good job!"),
            Verdict::Fail => write!(f, "Keep practicing!"),
        }
    }
}
