//! Wire types for the speech analysis service API
//!
//! Mirrors the JSON payloads exchanged with the remote service: participant
//! records, analysis results with their acoustic/linguistic feature blocks,
//! authentication payloads, and study statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Study group assignment for a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    Alzheimer,
    Mci,
    Control,
}

impl GroupType {
    /// All groups in the study's conventional reporting order
    pub const ALL: [GroupType; 3] = [GroupType::Alzheimer, GroupType::Mci, GroupType::Control];
}

impl std::fmt::Display for GroupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            GroupType::Alzheimer => "alzheimer",
            GroupType::Mci => "mci",
            GroupType::Control => "control",
        })
    }
}

impl std::str::FromStr for GroupType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alzheimer" => Ok(GroupType::Alzheimer),
            "mci" => Ok(GroupType::Mci),
            "control" => Ok(GroupType::Control),
            other => Err(format!(
                "unknown group type '{}' (expected alzheimer, mci or control)",
                other
            )),
        }
    }
}

/// Payload for creating a participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewParticipant {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub group_type: GroupType,
    /// Mini-Mental State Examination score (0-30), when assessed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mmse_score: Option<u32>,
}

/// A research subject enrolled in the study
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub group_type: GroupType,
    pub mmse_score: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// Mean/max pair for signal energy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyStats {
    pub mean: f64,
    pub max: f64,
}

/// Mean/std pair for pitch tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitchStats {
    pub mean: f64,
    pub std: f64,
}

/// Per-coefficient MFCC statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfccStats {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

/// Spectral shape features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectralFeatures {
    pub centroid: f64,
    pub rolloff: f64,
    pub zero_crossing_rate: f64,
}

/// Basic acoustic feature block, extracted server-side from the recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcousticFeatures {
    /// Recording duration in seconds
    pub duration: f64,
    pub energy: EnergyStats,
    pub pitch: PitchStats,
    pub mfcc: MfccStats,
    pub spectral: SpectralFeatures,
    pub tempo: f64,
}

/// Jitter measurements (cycle-to-cycle frequency perturbation)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JitterStats {
    pub local: f64,
    pub rap: f64,
    pub ppq5: f64,
}

/// Shimmer measurements (cycle-to-cycle amplitude perturbation)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShimmerStats {
    pub local: f64,
    pub apq3: f64,
    pub apq5: f64,
}

/// Pause timing statistics over the recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseAnalysis {
    pub total_pause_time: f64,
    pub pause_count: u32,
    pub avg_pause_duration: f64,
    pub pause_percentage: f64,
}

/// Advanced voice-quality feature block (jitter, shimmer, formants)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedAcoustic {
    pub jitter: JitterStats,
    pub shimmer: ShimmerStats,
    /// Harmonics-to-noise ratio in dB
    pub hnr: f64,
    /// Formant frequencies keyed "F1".."F4"
    pub formants: HashMap<String, f64>,
    pub speech_rate_audio: f64,
    pub pause_analysis: PauseAnalysis,
    pub voice_onset_time: f64,
}

/// A repeated word detected in the transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repetition {
    pub word: String,
    pub count: u32,
    pub position: u32,
}

/// Linguistic feature block computed from the transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinguisticAnalysis {
    pub word_count: u32,
    pub unique_word_count: u32,
    pub type_token_ratio: f64,
    pub diversity_score: f64,
    pub mean_length_utterance: f64,
    pub sentence_count: u32,
    pub avg_sentence_length: f64,
    pub hesitation_markers: Vec<String>,
    pub hesitation_count: u32,
    pub hesitation_ratio: f64,
    pub repetitions: Vec<Repetition>,
    pub repetition_count: u32,
    pub repetition_ratio: f64,
    pub conjunction_count: u32,
    pub conjunction_ratio: f64,
    pub syntactic_complexity: String,
}

/// Emotional tone assessment of the recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionAnalysis {
    pub tone: String,
    pub intensity: f64,
    pub emotions: Vec<String>,
}

/// Content-level fluency/coherence assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub word_count: u32,
    pub unique_words: u32,
    pub fluency_score: f64,
    pub coherence_score: f64,
}

/// Complete analysis record returned when a job finishes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: i64,
    pub participant_id: i64,
    pub transcript: String,
    pub acoustic_features: AcousticFeatures,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_acoustic: Option<AdvancedAcoustic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linguistic_analysis: Option<LinguisticAnalysis>,
    pub emotion_analysis: EmotionAnalysis,
    pub content_analysis: ContentAnalysis,
    /// Generated clinical report text, when the report service succeeded.
    /// Older service builds send this as `gemini_report`.
    #[serde(alias = "gemini_report", skip_serializing_if = "Option::is_none")]
    pub clinical_report: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_pdf_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Abbreviated analysis record for listings (transcript truncated server-side)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub id: i64,
    pub participant_id: i64,
    pub transcript: String,
    pub emotion_analysis: EmotionAnalysis,
    pub content_analysis: ContentAnalysis,
    #[serde(alias = "has_gemini_report", default)]
    pub has_clinical_report: bool,
    #[serde(default)]
    pub has_pdf: bool,
    pub created_at: DateTime<Utc>,
}

/// One page of analysis listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisPage {
    pub total: u64,
    pub items: Vec<AnalysisSummary>,
}

/// Bearer token issued after successful authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Authenticated user record from `/api/auth/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Email + password credential payload (register and login)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Email + verification code payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub email: String,
    pub code: String,
}

/// Informational response carrying a message and optional attempt budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_attempts: Option<u32>,
}

/// Abbreviated participant record inside a group report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantBrief {
    pub id: i64,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub mmse_score: Option<u32>,
}

/// One analysis entry inside a group report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupReportAnalysis {
    pub id: i64,
    pub transcript: String,
    pub emotion_analysis: EmotionAnalysis,
    pub content_analysis: ContentAnalysis,
    pub created_at: DateTime<Utc>,
}

/// A participant and their analyses, as listed by the group report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantGroupReport {
    pub participant: ParticipantBrief,
    pub analyses_count: u64,
    pub analyses: Vec<GroupReportAnalysis>,
}

/// All participants of one study group with their analyses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupReport {
    pub group_type: String,
    pub participants: Vec<ParticipantGroupReport>,
}

/// Aggregate study statistics from the reports surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub total_participants: u64,
    /// Participant count keyed by group type wire name
    pub group_counts: HashMap<String, u64>,
    pub total_analyses: u64,
    /// Mean MMSE score per group; None where no scores were recorded
    #[serde(rename = "average_mmse_scores")]
    pub avg_mmse: HashMap<String, Option<f64>>,
}
