//! Submission Assembler
//!
//! Turns a completed contribution session into an outbound payload: derives
//! the consensus sequence, computes the authoritative quality breakdown, and
//! enforces the local acceptance gate. Anything that fails here fails before
//! a single byte goes over the wire, and the session stays intact for a
//! retake or resubmission.

use crate::analysis::average;
use crate::analysis::quality::{QualityBreakdown, QualityScorer};
use crate::analysis::stats::AttemptStats;
use crate::capture::session::ContributionSession;
use crate::submit::payload::{ClientMetadata, SubmissionPayload};
use tracing::{debug, info};

/// Assembles and gates submission payloads.
#[derive(Debug, Clone)]
pub struct SubmissionAssembler {
    scorer: QualityScorer,
    /// Minimum consensus length, mirroring the recorder's attempt floor
    min_frames: usize,
}

impl Default for SubmissionAssembler {
    fn default() -> Self {
        Self::new(
            QualityScorer::new(),
            crate::capture::recorder::RecorderConfig::default().min_frames,
        )
    }
}

impl SubmissionAssembler {
    pub fn new(scorer: QualityScorer, min_frames: usize) -> Self {
        Self { scorer, min_frames }
    }

    /// Build the payload for a session, or fail locally.
    ///
    /// Returns the payload together with the authoritative breakdown so the
    /// caller can show the scores alongside a successful submission too.
    pub fn assemble(
        &self,
        session: &ContributionSession,
    ) -> crate::Result<(SubmissionPayload, QualityBreakdown)> {
        let consensus = average::derive_consensus(&session.attempts)?;
        debug!(
            attempts = session.len(),
            reference_length = consensus.reference_length,
            "consensus derived"
        );

        if consensus.frames.len() < self.min_frames {
            return Err(crate::Error::TooShort {
                got: consensus.frames.len(),
                min: self.min_frames,
            });
        }

        let breakdown = self
            .scorer
            .score(&consensus.frames, session.classification.movement);
        if !self.scorer.accepts(&breakdown) {
            return Err(crate::Error::QualityRejected {
                score: breakdown.overall,
                threshold: self.scorer.config().acceptance_threshold,
                breakdown,
            });
        }

        let frames = crate::submit::payload::normalize_frames(&consensus.frames);
        let duration = frames.last().map(|f| f.timestamp).unwrap_or(0.0);

        info!(
            word = %session.metadata.word,
            frames = frames.len(),
            overall = breakdown.overall,
            "submission assembled"
        );

        Ok((
            SubmissionPayload {
                word: session.metadata.word.clone(),
                user_id: session.metadata.user_id,
                frames,
                duration,
                metadata: ClientMetadata::current(),
                sign_type_movement: session.classification.movement,
                sign_type_hands: session.classification.hand_use,
                stats: AttemptStats::from_attempts(&session.attempts),
            },
            breakdown,
        ))
    }
}
