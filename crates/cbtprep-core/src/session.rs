//! Exam session state machine.
//!
//! A session moves `NotStarted → InProgress → Submitted` and never back. All
//! mutating operations check the state first and leave the session untouched
//! when they reject an action.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ExamConfig;
use crate::error::ExamError;
use crate::grader;
use crate::model::{Question, QuestionPool, ScoreRecord};
use crate::timer::{Countdown, TimerEvent};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Submitted,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::NotStarted => write!(f, "not started"),
            SessionStatus::InProgress => write!(f, "in progress"),
            SessionStatus::Submitted => write!(f, "submitted"),
        }
    }
}

/// Result of moving forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Moved to the given index.
    Moved(usize),
    /// Already on the last question; the caller should route to submit.
    Complete,
}

/// How a question looks in the navigation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridCell {
    pub answered: bool,
    pub flagged: bool,
    pub current: bool,
}

/// One attempt at the exam.
#[derive(Debug, Clone)]
pub struct ExamSession {
    id: Uuid,
    questions: Vec<Arc<Question>>,
    current: usize,
    answers: BTreeMap<usize, String>,
    flagged: BTreeSet<usize>,
    countdown: Countdown,
    status: SessionStatus,
    started_at: Option<DateTime<Utc>>,
}

impl ExamSession {
    /// Draw a fresh question set and start the exam immediately.
    pub fn start<R: Rng + ?Sized>(
        pool: &QuestionPool,
        config: &ExamConfig,
        rng: &mut R,
    ) -> Result<Self, ExamError> {
        let mut session = Self::draw(pool, config, rng)?;
        session.begin(Utc::now())?;
        Ok(session)
    }

    /// Draw `config.question_count` distinct questions without starting.
    ///
    /// The whole pool is shuffled (Fisher–Yates) and the first
    /// `question_count` entries are kept, so every ordering is equally likely.
    pub fn draw<R: Rng + ?Sized>(
        pool: &QuestionPool,
        config: &ExamConfig,
        rng: &mut R,
    ) -> Result<Self, ExamError> {
        let required = config.question_count;
        if required == 0 || pool.len() < required {
            return Err(ExamError::InsufficientQuestions {
                available: pool.len(),
                required,
            });
        }

        let mut shuffled: Vec<Arc<Question>> = pool.iter().cloned().collect();
        shuffled.shuffle(rng);
        shuffled.truncate(required);

        let id = Uuid::new_v4();
        tracing::debug!(session = %id, pool = pool.len(), "drew {required} questions");

        Ok(Self {
            id,
            questions: shuffled,
            current: 0,
            answers: BTreeMap::new(),
            flagged: BTreeSet::new(),
            countdown: Countdown::new(config.duration_secs, config.warning_secs),
            status: SessionStatus::NotStarted,
            started_at: None,
        })
    }

    /// Move a drawn session into `InProgress`.
    pub fn begin(&mut self, now: DateTime<Utc>) -> Result<(), ExamError> {
        self.require(SessionStatus::NotStarted, "begin")?;
        self.status = SessionStatus::InProgress;
        self.started_at = Some(now);
        tracing::info!(session = %self.id, "exam started");
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Arc<Question>] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    pub fn answers(&self) -> &BTreeMap<usize, String> {
        &self.answers
    }

    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn unanswered_count(&self) -> usize {
        self.len() - self.answers.len()
    }

    pub fn flagged(&self) -> &BTreeSet<usize> {
        &self.flagged
    }

    pub fn is_flagged(&self, index: usize) -> bool {
        self.flagged.contains(&index)
    }

    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining_secs()
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    /// Grid state for every question, in presentation order.
    pub fn grid(&self) -> Vec<GridCell> {
        (0..self.len())
            .map(|i| GridCell {
                answered: self.answers.contains_key(&i),
                flagged: self.flagged.contains(&i),
                current: i == self.current,
            })
            .collect()
    }

    /// Record `key` as the answer to the current question, replacing any earlier one.
    pub fn select_answer(&mut self, key: &str) -> Result<(), ExamError> {
        self.require(SessionStatus::InProgress, "answer")?;
        let question = &self.questions[self.current];
        if !question.has_option(key) {
            return Err(ExamError::UnknownOption {
                key: key.to_string(),
                number: self.current + 1,
            });
        }
        tracing::debug!(session = %self.id, index = self.current, key, "answer selected");
        self.answers.insert(self.current, key.to_string());
        Ok(())
    }

    /// Jump to any question.
    pub fn go_to(&mut self, index: usize) -> Result<(), ExamError> {
        self.check_index(index)?;
        self.current = index;
        Ok(())
    }

    pub fn next(&mut self) -> Step {
        if self.current + 1 >= self.len() {
            Step::Complete
        } else {
            self.current += 1;
            Step::Moved(self.current)
        }
    }

    /// Move back one question. A no-op on the first question.
    pub fn previous(&mut self) -> usize {
        self.current = self.current.saturating_sub(1);
        self.current
    }

    /// Flag or unflag a question. Returns whether it is flagged afterwards.
    pub fn toggle_flag(&mut self, index: usize) -> Result<bool, ExamError> {
        self.check_index(index)?;
        let flagged = if self.flagged.remove(&index) {
            false
        } else {
            self.flagged.insert(index);
            true
        };
        Ok(flagged)
    }

    /// Advance the countdown by one period.
    ///
    /// Ignored unless the session is in progress.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if self.status != SessionStatus::InProgress {
            tracing::debug!(session = %self.id, status = %self.status, "tick ignored");
            return None;
        }
        self.countdown.tick()
    }

    /// Finish the exam and grade it. Unanswered questions count as wrong.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<ScoreRecord, ExamError> {
        self.require(SessionStatus::InProgress, "submit")?;
        self.status = SessionStatus::Submitted;
        let record = grader::grade(&self.questions, &self.answers, now);
        tracing::info!(
            session = %self.id,
            unanswered = self.unanswered_count(),
            "exam submitted: {}/{} ({}%)",
            record.correct_count,
            record.total(),
            record.percentage
        );
        Ok(record)
    }

    fn require(&self, expected: SessionStatus, action: &'static str) -> Result<(), ExamError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(ExamError::InvalidTransition {
                action,
                status: self.status,
            })
        }
    }

    fn check_index(&self, index: usize) -> Result<(), ExamError> {
        if index < self.len() {
            Ok(())
        } else {
            Err(ExamError::IndexOutOfRange {
                index,
                len: self.len(),
            })
        }
    }
}
