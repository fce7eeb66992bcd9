//! Report and statistics endpoints

use crate::ApiClient;
use futures::StreamExt;
use reqwest::Method;
use sesan_common::error::check_response;
use sesan_common::types::{GroupReport, GroupType, Statistics};
use sesan_common::Result;
use std::path::Path;
use tokio::io::AsyncWriteExt;

impl ApiClient {
    /// Aggregate study statistics
    pub async fn statistics(&self) -> Result<Statistics> {
        self.get_json("/api/reports/statistics").await
    }

    /// Per-participant reports for one study group
    pub async fn group_report(&self, group: GroupType) -> Result<GroupReport> {
        self.get_json(&format!("/api/reports/group/{}", group)).await
    }

    /// Download an analysis's PDF report, streaming it to `dest`
    pub async fn download_report(&self, analysis_id: i64, dest: &Path) -> Result<u64> {
        let response = self
            .request(Method::GET, &format!("/api/reports/pdf/{}", analysis_id))
            .send()
            .await?;
        let response = check_response(response).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::info!(
            analysis_id,
            bytes = written,
            dest = %dest.display(),
            "Downloaded PDF report"
        );
        Ok(written)
    }
}
