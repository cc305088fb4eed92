//! Exam parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Size, timing and pass mark of an exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamConfig {
    /// Questions drawn per session.
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    /// Total time allowed, in seconds.
    #[serde(default = "default_duration")]
    pub duration_secs: u32,
    /// Remaining seconds at which the one-time low-time warning fires.
    #[serde(default = "default_warning")]
    pub warning_secs: u32,
    /// Minimum percentage counted as a pass.
    #[serde(default = "default_pass_mark")]
    pub pass_mark: u32,
    /// Timer period in milliseconds.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

fn default_question_count() -> usize {
    30
}
fn default_duration() -> u32 {
    15 * 60
}
fn default_warning() -> u32 {
    3 * 60
}
fn default_pass_mark() -> u32 {
    50
}
fn default_tick_millis() -> u64 {
    1000
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            question_count: default_question_count(),
            duration_secs: default_duration(),
            warning_secs: default_warning(),
            pass_mark: default_pass_mark(),
            tick_millis: default_tick_millis(),
        }
    }
}

impl ExamConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_practice_exam() {
        let config = ExamConfig::default();
        assert_eq!(config.question_count, 30);
        assert_eq!(config.duration_secs, 900);
        assert_eq!(config.warning_secs, 180);
        assert_eq!(config.pass_mark, 50);
        assert_eq!(config.tick_period(), Duration::from_secs(1));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: ExamConfig = toml::from_str("duration_secs = 600").unwrap();
        assert_eq!(config.duration_secs, 600);
        assert_eq!(config.question_count, 30);
    }
}
