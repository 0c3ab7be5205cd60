//! Multi-Attempt Statistics
//!
//! Summarizes how a contributor's repeated takes evolved: per-attempt
//! quality estimates and durations, the variance of those qualities, and a
//! qualitative improvement trend. The whole summary travels with the
//! submission so the server can weigh contributions from consistent signers
//! differently from erratic ones.

use crate::landmark::types::Attempt;
use serde::{Deserialize, Serialize};

/// How attempt quality evolved over the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImprovementTrend {
    /// Last attempt clearly better than the first (delta > +0.1)
    Improving,
    /// Last attempt clearly worse than the first (delta < -0.1)
    Declining,
    /// All attempts within a narrow band (spread < 0.05)
    Stable,
    /// No clear direction
    Variable,
}

impl ImprovementTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImprovementTrend::Improving => "improving",
            ImprovementTrend::Declining => "declining",
            ImprovementTrend::Stable => "stable",
            ImprovementTrend::Variable => "variable",
        }
    }
}

/// Per-session attempt summary carried in the submission payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptStats {
    pub num_attempts: usize,
    /// Quick quality estimate of each attempt, in capture order
    pub individual_qualities: Vec<f64>,
    /// Duration of each attempt in seconds, in capture order
    pub individual_durations: Vec<f64>,
    /// Population variance of the quality estimates
    pub quality_variance: f64,
    pub improvement_trend: ImprovementTrend,
}

impl AttemptStats {
    pub fn from_attempts(attempts: &[Attempt]) -> Self {
        let qualities: Vec<f64> = attempts.iter().map(|a| a.quality).collect();
        let durations: Vec<f64> = attempts.iter().map(|a| a.duration).collect();
        let quality_variance = variance(&qualities);
        let improvement_trend = trend(&qualities);

        Self {
            num_attempts: attempts.len(),
            individual_qualities: qualities,
            individual_durations: durations,
            quality_variance,
            improvement_trend,
        }
    }
}

/// Population variance; 0 for fewer than two values.
fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

/// First-vs-last delta decides the direction; only when the delta is small
/// does the overall spread distinguish stable from variable.
fn trend(qualities: &[f64]) -> ImprovementTrend {
    let (Some(first), Some(last)) = (qualities.first(), qualities.last()) else {
        return ImprovementTrend::Stable;
    };

    let delta = last - first;
    if delta > 0.1 {
        return ImprovementTrend::Improving;
    }
    if delta < -0.1 {
        return ImprovementTrend::Declining;
    }

    let max = qualities.iter().cloned().fold(f64::MIN, f64::max);
    let min = qualities.iter().cloned().fold(f64::MAX, f64::min);
    if max - min < 0.05 {
        ImprovementTrend::Stable
    } else {
        ImprovementTrend::Variable
    }
}
