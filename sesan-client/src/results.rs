//! Analysis result endpoints

use crate::ApiClient;
use sesan_common::types::{AnalysisPage, AnalysisResult, AnalysisSummary};
use sesan_common::Result;

impl ApiClient {
    /// List the authenticated user's analyses, newest first
    pub async fn list_results(&self, limit: u32, offset: u32) -> Result<AnalysisPage> {
        self.get_json(&format!("/api/results/?limit={}&offset={}", limit, offset))
            .await
    }

    /// Fetch one complete analysis record
    pub async fn get_result(&self, id: i64) -> Result<AnalysisResult> {
        self.get_json(&format!("/api/results/{}", id)).await
    }

    /// List all analyses for one participant
    pub async fn results_for_participant(&self, participant_id: i64) -> Result<Vec<AnalysisSummary>> {
        self.get_json(&format!("/api/results/participant/{}", participant_id))
            .await
    }

    /// Delete an analysis record
    pub async fn delete_result(&self, id: i64) -> Result<()> {
        self.delete(&format!("/api/results/{}", id)).await
    }
}
