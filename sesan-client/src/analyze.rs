//! Analysis job submission and progress reads
//!
//! Submission is one long blocking POST: the service holds the connection
//! until the whole pipeline has run and returns the finished record. A
//! client-minted correlation token rides along as a form field so the
//! progress endpoints can be watched while the upload request is in flight.

use crate::ApiClient;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use sesan_common::error::check_response;
use sesan_common::types::AnalysisResult;
use sesan_common::{CorrelationToken, Error, ProgressSnapshot, Result};
use std::path::Path;

/// Audio formats the service accepts
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["wav", "mp3", "m4a", "webm"];

/// Upload size cap, matching the service's limit
pub const MAX_FILE_SIZE: u64 = 25 * 1024 * 1024;

fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "webm" => "audio/webm",
        _ => "application/octet-stream",
    }
}

/// Reject files the service would bounce, before uploading them
fn validate_audio_file(path: &Path, size: u64) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(Error::InvalidInput(format!(
            "unsupported audio format '{}' (expected one of: {})",
            path.display(),
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    if size > MAX_FILE_SIZE {
        return Err(Error::InvalidInput(format!(
            "file is {} bytes, exceeding the {} MB limit",
            size,
            MAX_FILE_SIZE / 1024 / 1024
        )));
    }

    Ok(extension)
}

impl ApiClient {
    /// Submit a recording for analysis
    ///
    /// Blocks until the service has run the entire pipeline; watch progress
    /// concurrently via [`crate::ProgressMonitor`] keyed by `token`. On any
    /// failure the token is dead: a retry must mint a fresh one and starts a
    /// brand-new job.
    pub async fn submit_analysis(
        &self,
        participant_id: i64,
        audio_path: &Path,
        token: &CorrelationToken,
    ) -> Result<AnalysisResult> {
        let metadata = tokio::fs::metadata(audio_path).await?;
        let extension = validate_audio_file(audio_path, metadata.len())?;

        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("recording")
            .to_string();
        let bytes = tokio::fs::read(audio_path).await?;

        let file_part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(mime_for_extension(&extension))?;
        let form = Form::new()
            .part("file", file_part)
            .text("participant_id", participant_id.to_string())
            .text("progress_id", token.to_string());

        tracing::info!(
            participant_id,
            file = %file_name,
            token = %token,
            "Submitting analysis job"
        );

        let response = self
            .request(Method::POST, "/api/analyze/")
            .multipart(form)
            .timeout(self.upload_timeout())
            .send()
            .await?;
        let response = check_response(response).await?;

        let result: AnalysisResult = response.json().await?;
        tracing::info!(analysis_id = result.id, "Analysis job finished");
        Ok(result)
    }

    /// Point-in-time read of a job's progress
    pub async fn poll_progress(&self, token: &CorrelationToken) -> Result<ProgressSnapshot> {
        self.get_json(&format!("/api/analyze/progress/{}", token))
            .await
    }

    /// Open the server-push progress feed for a job
    ///
    /// Returns a stream of snapshots that ends after a terminal snapshot or
    /// when the connection drops; transport errors after the stream opens
    /// are swallowed by design (the polling channel carries the job).
    pub async fn observe_progress(
        &self,
        token: &CorrelationToken,
    ) -> Result<impl futures::Stream<Item = ProgressSnapshot>> {
        let response = self
            .request(Method::GET, &format!("/api/analyze/progress/{}/stream", token))
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(crate::sse::snapshot_stream(response))
    }
}
