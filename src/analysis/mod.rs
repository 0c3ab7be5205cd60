//! Sequence analysis: align, average, score
//!
//! Pure, synchronous computations over already-collected attempts:
//! - Temporal resampling aligns attempts of differing frame counts
//! - Cross-attempt averaging produces the consensus sequence
//! - Quality scoring rates a sequence against the acceptance gate
//! - Attempt statistics summarize how the contributor's takes evolved
//!
//! Everything here is idempotent and safe to re-run; a retake simply
//! recomputes every derived structure from scratch.

pub mod average;
pub mod quality;
pub mod resample;
pub mod stats;

pub use average::{consensus, derive_consensus, Consensus};
pub use quality::{QualityBreakdown, QualityScorer};
pub use stats::{AttemptStats, ImprovementTrend};
