//! Quality Scorer
//!
//! Rates a frame sequence for acceptability: three weighted sub-scores
//! (hand visibility 0.5, motion smoothness 0.3, frame completeness 0.2)
//! plus an informational lighting score, each in [0, 1].
//!
//! The same scoring code serves both call sites: the cheap per-attempt
//! estimate right after a stop ([`quick_score`], mean point visibility only)
//! and the authoritative breakdown over the consensus sequence before
//! submission ([`QualityScorer::score`]). Keeping the formulas in one module
//! prevents the two paths from drifting apart.

use crate::landmark::indices::pose::{LEFT_WRIST, RIGHT_WRIST};
use crate::landmark::types::{Frame, SignMovement};
use serde::{Deserialize, Serialize};

/// Sub-scores below this get a remediation recommendation.
const RECOMMENDATION_CUTOFF: f64 = 0.7;

/// Weights, gates, and thresholds for scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    pub hand_visibility_weight: f64,
    pub motion_smoothness_weight: f64,
    pub frame_completeness_weight: f64,
    /// Composite score required for submission
    pub acceptance_threshold: f64,
    /// Maximum plausible per-frame wrist displacement (normalized image
    /// units) for a dynamic sign; larger movement scores as jerk
    pub displacement_threshold: f64,
    /// Scale applied to the displacement threshold for static signs,
    /// which should barely move at all
    pub static_threshold_scale: f64,
    /// Mean point visibility above which a hand counts as visible
    pub visible_hand_threshold: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            hand_visibility_weight: 0.5,
            motion_smoothness_weight: 0.3,
            frame_completeness_weight: 0.2,
            acceptance_threshold: 0.5,
            displacement_threshold: 0.15,
            static_threshold_scale: 0.5,
            visible_hand_threshold: 0.5,
        }
    }
}

impl QualityConfig {
    pub fn validate(&self) -> crate::Result<()> {
        let weights = [
            ("hand_visibility_weight", self.hand_visibility_weight),
            ("motion_smoothness_weight", self.motion_smoothness_weight),
            ("frame_completeness_weight", self.frame_completeness_weight),
        ];
        for (name, value) in weights {
            if !(0.0..=1.0).contains(&value) {
                return Err(crate::Error::Config(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(crate::Error::Config(format!(
                "score weights must sum to 1.0, got {sum}"
            )));
        }
        if !(0.0..=1.0).contains(&self.acceptance_threshold) {
            return Err(crate::Error::Config(format!(
                "acceptance_threshold must be in [0, 1], got {}",
                self.acceptance_threshold
            )));
        }
        if self.displacement_threshold <= 0.0 {
            return Err(crate::Error::Config(format!(
                "displacement_threshold must be > 0, got {}",
                self.displacement_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.static_threshold_scale) || self.static_threshold_scale == 0.0
        {
            return Err(crate::Error::Config(format!(
                "static_threshold_scale must be in (0, 1], got {}",
                self.static_threshold_scale
            )));
        }
        if !(0.0..=1.0).contains(&self.visible_hand_threshold) {
            return Err(crate::Error::Config(format!(
                "visible_hand_threshold must be in [0, 1], got {}",
                self.visible_hand_threshold
            )));
        }
        Ok(())
    }

    /// Displacement threshold adjusted for the sign's movement class.
    pub fn displacement_threshold_for(&self, movement: SignMovement) -> f64 {
        match movement {
            SignMovement::Static => self.displacement_threshold * self.static_threshold_scale,
            SignMovement::Dynamic => self.displacement_threshold,
        }
    }
}

/// Qualitative rating of a score component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLabel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            QualityLabel::Excellent
        } else if score >= 0.70 {
            QualityLabel::Good
        } else if score >= 0.50 {
            QualityLabel::Fair
        } else {
            QualityLabel::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLabel::Excellent => "excellent",
            QualityLabel::Good => "good",
            QualityLabel::Fair => "fair",
            QualityLabel::Poor => "poor",
        }
    }
}

/// Qualitative lighting rating (finer-grained at the dark end, where the
/// remediation advice differs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingLabel {
    Excellent,
    Good,
    Acceptable,
    Poor,
    TooDark,
}

impl LightingLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            LightingLabel::Excellent
        } else if score >= 0.70 {
            LightingLabel::Good
        } else if score >= 0.55 {
            LightingLabel::Acceptable
        } else if score >= 0.25 {
            LightingLabel::Poor
        } else {
            LightingLabel::TooDark
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LightingLabel::Excellent => "excellent",
            LightingLabel::Good => "good",
            LightingLabel::Acceptable => "acceptable",
            LightingLabel::Poor => "poor",
            LightingLabel::TooDark => "too dark",
        }
    }
}

/// Qualitative labels for each breakdown component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentLabels {
    pub hand_visibility: QualityLabel,
    pub motion_smoothness: QualityLabel,
    pub frame_completeness: QualityLabel,
    pub lighting: LightingLabel,
}

/// Full scoring result for a sequence.
///
/// Recomputed whenever the underlying frames change; never persisted apart
/// from its sequence. The same shape arrives in server rejections so local
/// and remote diagnostics render identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityBreakdown {
    /// Weighted composite of the three scored components
    pub overall: f64,
    pub hand_visibility: f64,
    pub motion_smoothness: f64,
    pub frame_completeness: f64,
    /// Informational; not part of the weighted composite
    pub lighting_quality: f64,
    pub labels: ComponentLabels,
    /// Remediation advice, weakest component first
    pub recommendations: Vec<String>,
}

impl QualityBreakdown {
    pub fn overall_label(&self) -> QualityLabel {
        QualityLabel::from_score(self.overall)
    }
}

/// Fast per-attempt estimate: mean visibility over every point of every
/// frame. Gives the contributor immediate feedback after each stop without
/// the full breakdown.
pub fn quick_score(frames: &[Frame]) -> f64 {
    if frames.is_empty() {
        return 0.0;
    }
    let sum: f64 = frames.iter().map(Frame::mean_visibility).sum();
    (sum / frames.len() as f64).clamp(0.0, 1.0)
}

/// The authoritative scorer.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: QualityConfig,
}

impl QualityScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Whether a breakdown clears the acceptance gate.
    pub fn accepts(&self, breakdown: &QualityBreakdown) -> bool {
        breakdown.overall >= self.config.acceptance_threshold
    }

    /// Score a sequence and derive labels and recommendations.
    pub fn score(&self, frames: &[Frame], movement: SignMovement) -> QualityBreakdown {
        let hand_visibility = self.hand_visibility(frames);
        let motion_smoothness =
            self.motion_smoothness(frames, self.config.displacement_threshold_for(movement));
        let frame_completeness = Self::frame_completeness(frames);
        let lighting_quality = Self::lighting(frames);

        let overall = (self.config.hand_visibility_weight * hand_visibility
            + self.config.motion_smoothness_weight * motion_smoothness
            + self.config.frame_completeness_weight * frame_completeness)
            .clamp(0.0, 1.0);

        QualityBreakdown {
            overall,
            hand_visibility,
            motion_smoothness,
            frame_completeness,
            lighting_quality,
            labels: ComponentLabels {
                hand_visibility: QualityLabel::from_score(hand_visibility),
                motion_smoothness: QualityLabel::from_score(motion_smoothness),
                frame_completeness: QualityLabel::from_score(frame_completeness),
                lighting: LightingLabel::from_score(lighting_quality),
            },
            recommendations: Self::recommendations(
                hand_visibility,
                motion_smoothness,
                frame_completeness,
                lighting_quality,
            ),
        }
    }

    /// Per frame: visible hands (mean point visibility above the threshold)
    /// out of the maximum of two, averaged across frames.
    fn hand_visibility(&self, frames: &[Frame]) -> f64 {
        if frames.is_empty() {
            return 0.0;
        }
        let sum: f64 = frames
            .iter()
            .map(|frame| {
                let visible = [&frame.left_hand, &frame.right_hand]
                    .into_iter()
                    .filter_map(Frame::hand_mean_visibility)
                    .filter(|&v| v > self.config.visible_hand_threshold)
                    .count();
                visible as f64 / 2.0
            })
            .sum();
        (sum / frames.len() as f64).clamp(0.0, 1.0)
    }

    /// Per consecutive pair: wrist displacement normalized by the maximum
    /// plausible per-frame movement, converted to `max(0, 1 - d/threshold)`
    /// and averaged. Sequences shorter than two frames score 1.0.
    ///
    /// The reference wrist is whichever pose wrist carries more total
    /// visibility over the sequence, so one-handed signs track the hand
    /// that is actually present.
    fn motion_smoothness(&self, frames: &[Frame], threshold: f64) -> f64 {
        if frames.len() < 2 {
            return 1.0;
        }

        let wrist = Self::reference_wrist(frames);
        let sum: f64 = frames
            .windows(2)
            .map(|pair| {
                let d = pair[0].pose[wrist].planar_distance(&pair[1].pose[wrist]);
                (1.0 - d / threshold).max(0.0)
            })
            .sum();
        (sum / (frames.len() - 1) as f64).clamp(0.0, 1.0)
    }

    /// The wrist index with the greater summed visibility; right wins ties.
    fn reference_wrist(frames: &[Frame]) -> usize {
        let total = |idx: usize| -> f64 { frames.iter().map(|f| f.pose[idx].visibility).sum() };
        if total(LEFT_WRIST) > total(RIGHT_WRIST) {
            LEFT_WRIST
        } else {
            RIGHT_WRIST
        }
    }

    /// Per frame: structural parts present (pose, left hand, right hand)
    /// out of three, averaged across frames.
    fn frame_completeness(frames: &[Frame]) -> f64 {
        if frames.is_empty() {
            return 0.0;
        }
        let sum: f64 = frames
            .iter()
            .map(|f| f.parts_present() as f64 / 3.0)
            .sum();
        (sum / frames.len() as f64).clamp(0.0, 1.0)
    }

    /// Mean visibility over the sequence, the environment monitor's formula
    /// applied to the final frames.
    fn lighting(frames: &[Frame]) -> f64 {
        if frames.is_empty() {
            return 0.0;
        }
        let sum: f64 = frames.iter().map(Frame::mean_visibility).sum();
        (sum / frames.len() as f64).clamp(0.0, 1.0)
    }

    /// Remediation advice ordered weakest component first.
    fn recommendations(
        hand_visibility: f64,
        motion_smoothness: f64,
        frame_completeness: f64,
        lighting_quality: f64,
    ) -> Vec<String> {
        let mut candidates: Vec<(f64, &str)> = Vec::new();
        if hand_visibility < RECOMMENDATION_CUTOFF {
            candidates.push((
                hand_visibility,
                "Keep both hands clearly inside the camera frame while signing",
            ));
        }
        if motion_smoothness < RECOMMENDATION_CUTOFF {
            candidates.push((
                motion_smoothness,
                "Sign at a steady, moderate speed without abrupt movements",
            ));
        }
        if frame_completeness < RECOMMENDATION_CUTOFF {
            candidates.push((
                frame_completeness,
                "Position yourself so your upper body and hands stay fully in view",
            ));
        }
        if lighting_quality < 0.55 {
            candidates.push((
                lighting_quality,
                "Improve the lighting or move to a brighter area",
            ));
        }

        candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        candidates.into_iter().map(|(_, text)| text.to_string()).collect()
    }
}
