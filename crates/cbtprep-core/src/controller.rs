//! The exam controller.
//!
//! Owns the active profile, the current session and its ticker, and the
//! stores. The presentation layer sends every user intent and every timer
//! tick through here, one at a time.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tokio::sync::mpsc;

use crate::config::ExamConfig;
use crate::error::{ControllerError, ExamError};
use crate::grader::Verdict;
use crate::history::{history_key, HistoryStore, ProfileStore};
use crate::model::{QuestionPool, ScoreRecord, UserProfile};
use crate::review::{build_review, ReviewItem};
use crate::session::{ExamSession, SessionStatus, Step};
use crate::timer::{spawn_ticker, Tick, TimerEvent, TimerHandle};

/// Default prefix for history keys.
pub const DEFAULT_HISTORY_PREFIX: &str = "phy107";

/// Outcome of submitting an exam.
#[derive(Debug, Clone)]
pub struct Submission {
    pub record: ScoreRecord,
    pub verdict: Verdict,
    /// Why the record could not be added to the history, if it could not.
    /// The record itself is still valid and should be shown.
    pub persist_error: Option<String>,
}

impl Submission {
    pub fn persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

/// Things the presentation layer must react to after a tick.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    LowTime { remaining_secs: u32 },
    /// Time ran out and the exam was submitted on the user's behalf.
    AutoSubmitted(Submission),
}

pub struct ExamController {
    config: ExamConfig,
    pool: Arc<QuestionPool>,
    history: Arc<dyn HistoryStore>,
    profiles: Arc<dyn ProfileStore>,
    history_prefix: String,
    user: Option<UserProfile>,
    session: Option<ExamSession>,
    timer: Option<TimerHandle>,
    ticks: Option<mpsc::UnboundedSender<Tick>>,
}

impl ExamController {
    pub fn new(
        pool: Arc<QuestionPool>,
        config: ExamConfig,
        history: Arc<dyn HistoryStore>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            config,
            pool,
            history,
            profiles,
            history_prefix: DEFAULT_HISTORY_PREFIX.to_string(),
            user: None,
            session: None,
            timer: None,
            ticks: None,
        }
    }

    pub fn with_history_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.history_prefix = prefix.into();
        self
    }

    /// Run a real-time ticker for every started session, delivering to `ticks`.
    ///
    /// With a tick channel attached, `start_exam` must be called inside a
    /// tokio runtime.
    pub fn with_ticks(mut self, ticks: mpsc::UnboundedSender<Tick>) -> Self {
        self.ticks = Some(ticks);
        self
    }

    pub fn config(&self) -> &ExamConfig {
        &self.config
    }

    pub fn pool(&self) -> &QuestionPool {
        &self.pool
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn session(&self) -> Option<&ExamSession> {
        self.session.as_ref()
    }

    pub fn has_running_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Reactivate the profile saved by an earlier login, if any.
    pub fn restore_user(&mut self) -> Result<Option<&UserProfile>, ControllerError> {
        self.user = self.profiles.load_profile()?;
        if let Some(user) = &self.user {
            tracing::debug!("restored profile for {}", user.display_name);
        }
        Ok(self.user.as_ref())
    }

    /// Validate, persist and activate a profile.
    pub fn login(&mut self, name: &str, department: &str) -> Result<&UserProfile, ControllerError> {
        let profile = UserProfile::new(name, department)?;
        self.profiles.save_profile(&profile)?;
        tracing::info!("logged in as {} ({})", profile.display_name, profile.department);
        Ok(self.user.insert(profile))
    }

    /// Start a new exam with a thread-local random source.
    pub fn start_exam(&mut self) -> Result<&ExamSession, ControllerError> {
        let mut rng = rand::rng();
        self.start_exam_with(&mut rng)
    }

    /// Start a new exam, discarding any previous session and its ticker.
    pub fn start_exam_with<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<&ExamSession, ControllerError> {
        if self.user.is_none() {
            return Err(ControllerError::NotLoggedIn);
        }
        let session = ExamSession::start(&self.pool, &self.config, rng)?;
        self.discard();

        if let Some(ticks) = &self.ticks {
            self.timer = Some(spawn_ticker(
                session.id(),
                self.config.tick_period(),
                ticks.clone(),
            ));
        }
        Ok(self.session.insert(session))
    }

    pub fn select_answer(&mut self, key: &str) -> Result<(), ControllerError> {
        Ok(self.session_mut("answer")?.select_answer(key)?)
    }

    pub fn go_to(&mut self, index: usize) -> Result<(), ControllerError> {
        Ok(self.session_mut("navigate")?.go_to(index)?)
    }

    pub fn next(&mut self) -> Result<Step, ControllerError> {
        Ok(self.session_mut("navigate")?.next())
    }

    pub fn previous(&mut self) -> Result<usize, ControllerError> {
        Ok(self.session_mut("navigate")?.previous())
    }

    pub fn toggle_flag(&mut self, index: usize) -> Result<bool, ControllerError> {
        Ok(self.session_mut("flag")?.toggle_flag(index)?)
    }

    /// Flag or unflag the question currently shown.
    pub fn toggle_current_flag(&mut self) -> Result<bool, ControllerError> {
        let session = self.session_mut("flag")?;
        let index = session.current_index();
        Ok(session.toggle_flag(index)?)
    }

    /// Submit the current exam by hand.
    pub fn submit(&mut self) -> Result<Submission, ControllerError> {
        self.finish()
    }

    /// Feed one timer period to the current session.
    ///
    /// Ticks addressed to any other session are dropped, so a ticker that
    /// outlived its session can never touch the one that replaced it.
    pub fn on_tick(&mut self, tick: Tick) -> Result<Option<ControllerEvent>, ControllerError> {
        let Some(session) = self.session.as_mut() else {
            tracing::warn!(session = %tick.session_id, "tick with no active session");
            return Ok(None);
        };
        if session.id() != tick.session_id {
            tracing::warn!(
                stale = %tick.session_id,
                current = %session.id(),
                "ignoring tick from a replaced session"
            );
            return Ok(None);
        }

        match session.tick() {
            Some(TimerEvent::LowTime { remaining_secs }) => {
                tracing::info!(session = %session.id(), "low time: {remaining_secs}s left");
                Ok(Some(ControllerEvent::LowTime { remaining_secs }))
            }
            Some(TimerEvent::Expired) => {
                tracing::info!(session = %session.id(), "time up, submitting");
                let submission = self.finish()?;
                Ok(Some(ControllerEvent::AutoSubmitted(submission)))
            }
            None => Ok(None),
        }
    }

    /// Review rows for the submitted session.
    pub fn review(&self) -> Result<Vec<ReviewItem>, ControllerError> {
        let session = self.session.as_ref().ok_or(ExamError::InvalidTransition {
            action: "review",
            status: SessionStatus::NotStarted,
        })?;
        Ok(build_review(session)?)
    }

    /// Throw the current session away so a new one can be started.
    pub fn retake(&mut self) {
        self.discard();
    }

    /// The active user's past results, oldest first.
    pub fn history(&self) -> Result<Vec<ScoreRecord>, ControllerError> {
        let user = self.user.as_ref().ok_or(ControllerError::NotLoggedIn)?;
        Ok(self.history.read(&history_key(&self.history_prefix, user))?)
    }

    fn finish(&mut self) -> Result<Submission, ControllerError> {
        let session = self.session.as_mut().ok_or(ExamError::InvalidTransition {
            action: "submit",
            status: SessionStatus::NotStarted,
        })?;
        let record = session.submit(Utc::now())?;

        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }

        let persist_error = match &self.user {
            Some(user) => {
                let key = history_key(&self.history_prefix, user);
                match self.history.append(&key, &record) {
                    Ok(()) => {
                        tracing::info!("appended result to history '{key}'");
                        None
                    }
                    Err(e) => {
                        tracing::warn!("could not save result to history '{key}': {e}");
                        Some(e.to_string())
                    }
                }
            }
            None => {
                tracing::warn!("no active user, result not saved");
                Some("no user is logged in".to_string())
            }
        };

        Ok(Submission {
            verdict: Verdict::of(&record, self.config.pass_mark),
            record,
            persist_error,
        })
    }

    fn discard(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        if let Some(old) = self.session.take() {
            tracing::debug!(session = %old.id(), status = %old.status(), "session discarded");
        }
    }

    fn session_mut(&mut self, action: &'static str) -> Result<&mut ExamSession, ExamError> {
        self.session.as_mut().ok_or(ExamError::InvalidTransition {
            action,
            status: SessionStatus::NotStarted,
        })
    }
}
