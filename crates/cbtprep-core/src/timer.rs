//! Exam countdown.
//!
//! [`Countdown`] holds the tick semantics as plain state so they can be
//! exercised without a runtime. [`spawn_ticker`] drives it in real time by
//! sending [`Tick`]s to whoever owns the session.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

/// Something the owner of a session must react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Remaining time reached the warning threshold. Fires once per countdown.
    LowTime { remaining_secs: u32 },
    /// Time is up; the session must be submitted. Fires once per countdown.
    Expired,
}

/// Remaining time of one exam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining_secs: u32,
    warning_secs: u32,
    warned: bool,
    expired: bool,
}

impl Countdown {
    pub fn new(duration_secs: u32, warning_secs: u32) -> Self {
        Self {
            remaining_secs: duration_secs,
            warning_secs,
            warned: false,
            expired: false,
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Whether the display should show the low-time state.
    pub fn is_low(&self) -> bool {
        self.remaining_secs <= self.warning_secs
    }

    /// Advance by one second.
    ///
    /// Expiry takes precedence when both thresholds are crossed on the same
    /// tick. A countdown that starts at zero expires on its first tick.
    /// Ticks after expiry change nothing.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if self.expired {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);

        if self.remaining_secs == 0 {
            self.expired = true;
            self.warned = true;
            return Some(TimerEvent::Expired);
        }
        if !self.warned && self.remaining_secs <= self.warning_secs {
            self.warned = true;
            return Some(TimerEvent::LowTime {
                remaining_secs: self.remaining_secs,
            });
        }
        None
    }
}

/// Format seconds as `m:ss`.
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// One timer period elapsed for the given session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub session_id: Uuid,
}

/// Handle to a running ticker. Cancelling or dropping it stops the ticks.
#[derive(Debug)]
pub struct TimerHandle {
    session_id: Uuid,
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn cancel(&self) {
        if !self.task.is_finished() {
            tracing::debug!(session = %self.session_id, "ticker cancelled");
        }
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start sending a [`Tick`] for `session_id` every `period`.
///
/// The first tick arrives one full period after the call. The task ends by
/// itself once the receiver is gone. Must be called inside a tokio runtime.
pub fn spawn_ticker(
    session_id: Uuid,
    period: Duration,
    ticks: mpsc::UnboundedSender<Tick>,
) -> TimerHandle {
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if ticks.send(Tick { session_id }).is_err() {
                break;
            }
        }
    });
    TimerHandle { session_id, task }
}
