//! # Sign Capture
//!
//! A capture-and-consensus engine for community sign language contributions.
//! Repeated recordings of the same vocabulary sign are captured from an
//! external landmark-detection engine, aligned to a common length, averaged
//! into one consensus motion sequence, and scored for acceptability before
//! submission as community ground truth.
//!
//! ## Overview
//!
//! The landmark engine delivers one skeletal frame per detected video frame
//! (33 pose points plus up to two 21-point hands, each with a confidence-like
//! visibility). This library consumes that stream; it never touches raw video.
//!
//! ## Quick Start
//!
//! ```
//! use signcap::analysis::{average, quality::QualityScorer, resample};
//! use signcap::capture::session::SignMovement;
//! use signcap::landmark::types::{Frame, StreamFrame};
//!
//! // Frames normally come from the landmark stream; build some by hand here.
//! let stream = StreamFrame::default();
//! let frames: Vec<Frame> = (0..31)
//!     .map(|i| Frame::from_stream(&stream, i, i as f64 / 30.0))
//!     .collect();
//!
//! // Align to a reference length and score the result.
//! let resampled = resample::resample(&frames, 31);
//! let consensus = average::consensus(&[resampled]);
//! let scorer = QualityScorer::new();
//! let breakdown = scorer.score(&consensus, SignMovement::Dynamic);
//! assert!(breakdown.overall <= 1.0);
//! ```
//!
//! ## Architecture
//!
//! - [`landmark`]: Shared frame model (points, frames, attempts, stream contract)
//! - [`time`]: Monotonic clock used to drive the capture state machine
//! - [`capture`]: Lock-free frame buffering, the attempt recorder state
//!   machine, environment monitoring, and session persistence
//! - [`analysis`]: Temporal resampling, cross-attempt averaging, quality
//!   scoring, and multi-attempt statistics
//! - [`submit`]: Wire contracts, payload assembly with the local acceptance
//!   gate, and the HTTP submission client
//! - [`app`]: CLI and configuration management
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────┐   ┌─────────────┐
//! │ Landmark     │──▶│ Frame Ring  │──▶│ Recorder /   │──▶│ Contribution│
//! │ Engine       │   │ Buffer      │   │ Env. Monitor │   │ Session     │
//! └──────────────┘   └─────────────┘   └──────────────┘   └─────────────┘
//!                                                               │
//!                                                               ▼
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────┐   ┌─────────────┐
//! │ Submission   │◀──│ Quality     │◀──│ Cross-Attempt│◀──│ Temporal    │
//! │ Payload      │   │ Scorer      │   │ Averager     │   │ Resampler   │
//! └──────────────┘   └─────────────┘   └──────────────┘   └─────────────┘
//! ```

pub mod landmark;
pub mod time;
pub mod capture;
pub mod analysis;
pub mod submit;
pub mod app;

// Re-export commonly used types
pub use analysis::quality::{QualityBreakdown, QualityScorer};
pub use capture::monitor::EnvironmentMonitor;
pub use capture::recorder::{AttemptRecorder, RecorderConfig, RecorderEvent};
pub use capture::session::ContributionSession;
pub use landmark::types::{Attempt, Frame, Point, StreamFrame};
pub use submit::assembler::SubmissionAssembler;
pub use submit::client::SubmissionClient;

/// Result type alias for the capture pipeline
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the capture pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Fewer frames were captured than the minimum the recorder accepts.
    /// Recoverable: the user is prompted to retake the attempt.
    #[error("attempt too short: {got} frames captured, {min} required")]
    TooShort { got: usize, min: usize },

    /// The session holds no completed attempts, so there is nothing to
    /// resample, average, or submit.
    #[error("session contains no completed attempts")]
    EmptySession,

    /// The composite quality score failed the acceptance gate. The breakdown
    /// carries per-component scores and targeted recommendations; no network
    /// call is made.
    #[error("composite quality {score:.2} is below the acceptance threshold {threshold:.2}")]
    QualityRejected {
        score: f64,
        threshold: f64,
        breakdown: analysis::quality::QualityBreakdown,
    },

    /// The server rejected the submission. The reason is surfaced verbatim;
    /// quality rejections carry the same breakdown shape the local gate
    /// produces so diagnostics render identically.
    #[error("submission rejected by server ({status}): {reason}")]
    Backend {
        status: u16,
        reason: String,
        breakdown: Option<analysis::quality::QualityBreakdown>,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("capture error: {0}")]
    Capture(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
