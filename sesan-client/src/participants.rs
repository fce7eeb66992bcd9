//! Participant endpoints

use crate::ApiClient;
use sesan_common::types::{NewParticipant, Participant};
use sesan_common::Result;

impl ApiClient {
    /// Enroll a new participant
    pub async fn create_participant(&self, participant: &NewParticipant) -> Result<Participant> {
        self.post_json("/api/participants/", participant).await
    }

    /// List the authenticated user's participants
    pub async fn list_participants(&self) -> Result<Vec<Participant>> {
        self.get_json("/api/participants/").await
    }

    /// Fetch one participant by id
    pub async fn get_participant(&self, id: i64) -> Result<Participant> {
        self.get_json(&format!("/api/participants/{}", id)).await
    }
}
