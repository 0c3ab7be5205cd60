//! Environment Monitor
//!
//! Continuous, non-recording assessment of the incoming landmark stream used
//! to gate readiness before recording starts. Runs per frame while the
//! recorder is idle and buffers nothing.
//!
//! The monitor is advisory: it never blocks the recorder on its own. The
//! caller decides whether `can_proceed` is required before enabling the
//! start control.

use crate::analysis::quality::LightingLabel;
use crate::landmark::types::StreamFrame;
use serde::{Deserialize, Serialize};

/// Readiness thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Minimum mean visibility across all points
    pub min_lighting: f64,
    /// Minimum mean visibility of the present hands
    pub min_hand_visibility: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            min_lighting: 0.25,
            min_hand_visibility: 0.30,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> crate::Result<()> {
        for (name, value) in [
            ("min_lighting", self.min_lighting),
            ("min_hand_visibility", self.min_hand_visibility),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(crate::Error::Config(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// One readiness assessment of a stream frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentReading {
    /// Mean visibility across every delivered point (pose + hands)
    pub lighting_quality: f64,
    /// Mean visibility of the present hands; 0 when no hand is detected
    pub hand_visibility: f64,
    /// Both readiness thresholds met
    pub can_proceed: bool,
    pub lighting: LightingLabel,
    /// Short remediation text, present only when `can_proceed` is false
    pub guidance: Option<String>,
}

/// Per-frame environment assessment.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentMonitor {
    config: MonitorConfig,
}

impl EnvironmentMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MonitorConfig) -> Self {
        Self { config }
    }

    /// Assess a single frame from the landmark stream.
    pub fn assess(&self, frame: &StreamFrame) -> EnvironmentReading {
        let lighting_quality = mean_visibility(frame);
        let hand_visibility = hand_visibility(frame);
        let can_proceed = lighting_quality >= self.config.min_lighting
            && hand_visibility >= self.config.min_hand_visibility;

        let guidance = if can_proceed {
            None
        } else if lighting_quality < self.config.min_lighting {
            Some("Improve the lighting or move to a brighter area".to_string())
        } else {
            Some("Keep your hands visible inside the camera frame".to_string())
        };

        EnvironmentReading {
            lighting_quality,
            hand_visibility,
            can_proceed,
            lighting: LightingLabel::from_score(lighting_quality),
            guidance,
        }
    }
}

/// Mean visibility across all points the engine delivered.
fn mean_visibility(frame: &StreamFrame) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for p in frame.all_points() {
        sum += p.visibility;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Mean visibility of whichever hands are present; 0 with no hands.
fn hand_visibility(frame: &StreamFrame) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for p in frame.left_hand.iter().chain(frame.right_hand.iter()) {
        sum += p.visibility;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
