//! cbtprep-core — Exam session state machine, timer, grading and review.
//!
//! This crate defines the data model, the question bank loader contract and
//! the exam lifecycle that the rest of cbtprep builds on. Rendering and
//! storage mechanics live in other crates.

pub mod bank;
pub mod config;
pub mod controller;
pub mod error;
pub mod grader;
pub mod history;
pub mod model;
pub mod review;
pub mod session;
pub mod timer;

pub use config::ExamConfig;
pub use controller::{ControllerEvent, ExamController, Submission};
pub use error::{ControllerError, ExamError, LoadError, LoginError, StoreError};
pub use model::{Question, QuestionPool, ScoreRecord, UserProfile};
pub use session::{ExamSession, SessionStatus, Step};
