//! cbtprep-store — File-backed profile and score history storage.
//!
//! Everything lives under one data directory: the active profile in
//! `profile.json` and one JSON array per user under `history/`. Writes go
//! through a temporary file in the same directory and are renamed into
//! place, so a crash never leaves a half-written history behind.

pub mod atomic;
pub mod local;

pub use local::LocalStore;
