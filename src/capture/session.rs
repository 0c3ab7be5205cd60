//! Contribution Session
//!
//! A contribution session collects the completed attempts for one vocabulary
//! word, together with the anonymous contributor id and the sign
//! classification the submission contract carries. Sessions serialize to
//! JSON so a capture can be reviewed, retried, and submitted later without
//! re-recording.

use crate::landmark::types::Attempt;
pub use crate::landmark::types::{HandUse, SignClassification, SignMovement};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Current session file format version
pub const CURRENT_FORMAT_VERSION: &str = "1.0";

/// Session metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionMetadata {
    /// Unique session ID
    pub id: Uuid,
    /// The vocabulary word being signed
    pub word: String,
    /// Anonymous contributor ID (no cross-session identity)
    pub user_id: Uuid,
    /// Session start time
    pub started_at: DateTime<Utc>,
    /// Set when the target number of attempts has been captured
    pub completed_at: Option<DateTime<Utc>>,
    /// Number of stored attempts
    pub attempt_count: usize,
    /// Version of the session file format
    pub format_version: String,
}

impl SessionMetadata {
    fn new(word: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            word,
            user_id: Uuid::new_v4(),
            started_at: Utc::now(),
            completed_at: None,
            attempt_count: 0,
            format_version: CURRENT_FORMAT_VERSION.to_string(),
        }
    }
}

impl Default for SessionMetadata {
    fn default() -> Self {
        Self::new(String::new())
    }
}

/// All capture state for one word: the single unit of shared mutable state
/// in the pipeline. Discarded entirely when the user switches words.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionSession {
    pub metadata: SessionMetadata,
    pub classification: SignClassification,
    /// Completed attempts, immutable once pushed
    pub attempts: Vec<Attempt>,
}

impl ContributionSession {
    /// Start a session for a word.
    pub fn new(word: impl Into<String>, classification: SignClassification) -> Self {
        Self {
            metadata: SessionMetadata::new(word.into()),
            classification,
            attempts: Vec::new(),
        }
    }

    /// Append a completed attempt.
    pub fn push_attempt(&mut self, attempt: Attempt) {
        self.attempts.push(attempt);
        self.metadata.attempt_count = self.attempts.len();
    }

    /// Mark the capture phase finished.
    pub fn finalize(&mut self) {
        self.metadata.completed_at = Some(Utc::now());
        self.metadata.attempt_count = self.attempts.len();
    }

    /// Number of completed attempts
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Frame count of each attempt, in capture order.
    pub fn frame_counts(&self) -> Vec<usize> {
        self.attempts.iter().map(Attempt::len).collect()
    }

    /// Quick quality estimate of each attempt, in capture order.
    pub fn attempt_qualities(&self) -> Vec<f64> {
        self.attempts.iter().map(|a| a.quality).collect()
    }

    /// Duration of each attempt in seconds, in capture order.
    pub fn attempt_durations(&self) -> Vec<f64> {
        self.attempts.iter().map(|a| a.duration).collect()
    }

    /// Save the session to a file.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a session from a file.
    ///
    /// Logs a warning on an unknown format version but still attempts to
    /// deserialize (forward-compatible via `#[serde(default)]`).
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let session: ContributionSession = serde_json::from_str(&content)?;
        if session.metadata.format_version != CURRENT_FORMAT_VERSION {
            tracing::warn!(
                word = %session.metadata.word,
                found = %session.metadata.format_version,
                expected = CURRENT_FORMAT_VERSION,
                "Session has a different format version; some fields may use default values"
            );
        }
        Ok(session)
    }
}
