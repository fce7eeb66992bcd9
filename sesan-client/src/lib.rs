//! # SESAN Client Library
//!
//! HTTP/SSE client for the speech analysis service. Covers the full API
//! surface (authentication, participants, analysis submission, results,
//! reports) and the dual-channel progress monitor that tracks a running
//! analysis job through server-sent events with a polling fallback.

pub mod analyze;
pub mod auth;
pub mod client;
pub mod monitor;
pub mod participants;
pub mod reports;
pub mod results;
pub mod session;
pub mod sse;

pub use client::ApiClient;
pub use monitor::ProgressMonitor;
pub use session::SessionStore;
