//! # SESAN Common Library
//!
//! Shared code for the SESAN client suite:
//! - Error taxonomy used across all crates
//! - Client configuration loading and resolution
//! - Wire types for the speech analysis service API
//! - Progress tracking primitives (correlation tokens, monotonic merge)

pub mod config;
pub mod error;
pub mod progress;
pub mod types;

pub use error::{Error, Result};
pub use progress::{
    CorrelationToken, ProgressSnapshot, ProgressSource, ProgressStatus, ProgressTracker,
};
