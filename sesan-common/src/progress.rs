//! Progress tracking primitives
//!
//! A long-running analysis job is correlated between the upload request and
//! its progress feeds by a client-minted random token. Progress arrives over
//! two redundant channels (server-sent events and polling) with no sequence
//! numbers, so the merged display is kept consistent by a monotonic rule:
//! the shown step is the maximum step observed from either channel, and a
//! terminal status latches. The two channels carry different weight: a push
//! is a new event, while a poll re-reads the stored snapshot, so only polls
//! that strictly advance the step are news.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client-minted correlation token for one submission attempt
///
/// A 128-bit random value formatted as a canonical UUID string. Generated
/// before the job submission is sent, passed out-of-band on the upload so
/// the server can key progress updates to it, and discarded once the job
/// reaches a terminal status. Never reused across submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(Uuid);

impl CorrelationToken {
    /// Mint a fresh random token
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CorrelationToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Job status as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Running,
    Completed,
    Error,
}

impl ProgressStatus {
    /// Completed and Error end the job; no further updates follow
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressStatus::Completed | ProgressStatus::Error)
    }
}

/// One named stage of the analysis pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressStep {
    pub step: u32,
    pub title: String,
    pub description: String,
}

/// Point-in-time view of a job's progress, owned by the server
///
/// The client only ever holds the most recently observed copy; there are no
/// sequence numbers on the wire, so out-of-order delivery is not detectable
/// beyond the step-maximum rule applied by [`ProgressTracker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub current_step: u32,
    pub total_steps: u32,
    #[serde(default)]
    pub message: String,
    pub status: ProgressStatus,
    #[serde(default)]
    pub steps: Vec<ProgressStep>,
}

impl ProgressSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// The analysis pipeline's stage table, used to seed the display before the
/// first snapshot arrives. The server sends its own copy with every snapshot.
pub fn default_steps() -> Vec<ProgressStep> {
    let stages = [
        ("File Upload", "Receiving the audio recording"),
        ("Acoustic Analysis", "Extracting basic acoustic features"),
        ("Advanced Acoustics", "Jitter, shimmer and formant analysis"),
        ("Transcription", "Converting speech to text"),
        ("Linguistic Analysis", "Analyzing the transcript"),
        ("Emotion Analysis", "Assessing emotion and content"),
        ("Clinical Report", "Generating the clinical report"),
        ("PDF Generation", "Preparing the PDF report"),
        ("Persistence", "Saving results to the database"),
    ];

    stages
        .iter()
        .enumerate()
        .map(|(i, (title, description))| ProgressStep {
            step: (i + 1) as u32,
            title: title.to_string(),
            description: description.to_string(),
        })
        .collect()
}

/// Number of stages in the analysis pipeline
pub const TOTAL_STEPS: u32 = 9;

/// Which channel a snapshot was observed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressSource {
    /// Server-sent events subscription; every delivery is a fresh event
    Push,
    /// Fixed-interval poll; each read re-serves the stored snapshot
    Poll,
}

/// Monotonic merge of progress snapshots from the two observation channels
///
/// Snapshots are applied in arrival order. The displayed step never
/// decreases: a snapshot strictly behind the highest step seen so far is
/// discarded. A push that ties the highest step is a genuine update and
/// replaces the display (last-write-wins for message, status and step
/// table); a poll that ties it is a re-read of state already shown and is
/// discarded. A terminal snapshot is always accepted and latches the
/// tracker; everything after it is ignored.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    latest: Option<ProgressSnapshot>,
    high_water: u32,
    finished: bool,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one observed snapshot
    ///
    /// Returns the updated display when the snapshot was accepted, or None
    /// when it was discarded (stale, a tied poll, or arrived after a
    /// terminal status).
    pub fn apply(
        &mut self,
        snapshot: ProgressSnapshot,
        source: ProgressSource,
    ) -> Option<&ProgressSnapshot> {
        if self.finished {
            return None;
        }

        let terminal = snapshot.is_terminal();
        if !terminal {
            let advanced = match source {
                ProgressSource::Push => snapshot.current_step >= self.high_water,
                ProgressSource::Poll => snapshot.current_step > self.high_water,
            };
            if !advanced {
                // Stale arrival, or a poll re-serving the snapshot already
                // on display
                return None;
            }
        }

        self.high_water = self.high_water.max(snapshot.current_step);
        self.finished = terminal;

        let mut display = snapshot;
        // A terminal snapshot may carry a lower step than one already shown;
        // the displayed step still never goes backwards
        display.current_step = self.high_water;
        self.latest = Some(display);
        self.latest.as_ref()
    }

    /// Most recently accepted display state
    pub fn latest(&self) -> Option<&ProgressSnapshot> {
        self.latest.as_ref()
    }

    /// Highest step observed so far
    pub fn current_step(&self) -> u32 {
        self.high_water
    }

    /// True once a terminal snapshot has been accepted
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
