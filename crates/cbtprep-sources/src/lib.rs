//! cbtprep-sources — Question bank sources and configuration.
//!
//! Implements the `QuestionSource` trait for local files, HTTP endpoints and
//! in-memory documents, and loads the cbtprep configuration file.

pub mod config;
pub mod file;
pub mod http;
pub mod mock;

pub use config::{create_source, load_config, CbtprepConfig, SourceConfig};
pub use file::FileSource;
pub use http::HttpSource;
pub use mock::StaticSource;
