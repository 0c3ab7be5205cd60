//! Submission wire contracts
//!
//! The serialization format shared with the contribution backend. Frames are
//! normalized for transport here: coordinates and visibilities clamped into
//! [0, 1] (z stays unbounded relative depth), short pose arrays padded to the
//! full 33 points, and malformed hand arrays nulled out. The same
//! minimum-frame and minimum-quality rules run on both sides of the wire;
//! the client never assumes the server re-validates leniently.

use crate::analysis::quality::QualityBreakdown;
use crate::analysis::stats::AttemptStats;
use crate::landmark::types::{Frame, HandUse, Point, SignMovement, HAND_POINTS, POSE_POINTS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client identification attached to every submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMetadata {
    /// Client name and version, e.g. `signcap/0.1.0`
    pub client_info: String,
    /// Wall-clock submission time
    pub timestamp: DateTime<Utc>,
}

impl ClientMetadata {
    pub fn current() -> Self {
        Self {
            client_info: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            timestamp: Utc::now(),
        }
    }
}

/// Outbound submission record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    /// The vocabulary word this consensus sequence represents
    pub word: String,
    /// Anonymous contributor id
    pub user_id: Uuid,
    /// Normalized consensus frames
    pub frames: Vec<Frame>,
    /// Total duration in seconds (the last frame's timestamp)
    pub duration: f64,
    pub metadata: ClientMetadata,
    pub sign_type_movement: SignMovement,
    pub sign_type_hands: HandUse,
    /// Multi-attempt statistics, flattened into the top-level record
    #[serde(flatten)]
    pub stats: AttemptStats,
}

/// Successful submission response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionAccepted {
    /// Total contributions stored for this word so far
    pub total_contributions: u64,
    /// Collection progress toward the word's target
    pub progress_percentage: f64,
    /// Server-side quality assessment, when computed
    #[serde(default)]
    pub quality_breakdown: Option<QualityBreakdown>,
}

/// Rejection response body.
///
/// Quality rejections carry the same breakdown shape the local gate
/// produces, so the UI renders identical diagnostics either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRejected {
    /// Human-readable reason, surfaced verbatim
    pub reason: String,
    #[serde(default)]
    pub quality_breakdown: Option<QualityBreakdown>,
}

/// Normalize frames for transport.
pub fn normalize_frames(frames: &[Frame]) -> Vec<Frame> {
    frames
        .iter()
        .map(|frame| Frame {
            frame_number: frame.frame_number,
            timestamp: frame.timestamp,
            pose: normalize_pose(&frame.pose),
            left_hand: normalize_hand(&frame.left_hand),
            right_hand: normalize_hand(&frame.right_hand),
        })
        .collect()
}

fn clamp_point(p: &Point) -> Point {
    Point::new(
        p.x.clamp(0.0, 1.0),
        p.y.clamp(0.0, 1.0),
        p.z,
        p.visibility.clamp(0.0, 1.0),
    )
}

fn normalize_pose(pose: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = pose.iter().take(POSE_POINTS).map(clamp_point).collect();
    out.resize(POSE_POINTS, Point::zero());
    out
}

fn normalize_hand(hand: &Option<Vec<Point>>) -> Option<Vec<Point>> {
    match hand {
        Some(points) if points.len() == HAND_POINTS => {
            Some(points.iter().map(clamp_point).collect())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let frame = Frame {
            frame_number: 0,
            timestamp: 0.0,
            pose: vec![Point::new(-0.5, 1.5, -3.0, 2.0); POSE_POINTS],
            left_hand: None,
            right_hand: None,
        };
        let out = normalize_frames(&[frame]);
        let p = out[0].pose[0];
        assert_eq!(p.x, 0.0);
        assert_eq!(p.y, 1.0);
        assert_eq!(p.z, -3.0); // depth stays unbounded
        assert_eq!(p.visibility, 1.0);
    }

    #[test]
    fn test_short_pose_padded_with_zero_points() {
        let frame = Frame {
            frame_number: 0,
            timestamp: 0.0,
            pose: vec![Point::new(0.5, 0.5, 0.0, 1.0); 10],
            left_hand: None,
            right_hand: None,
        };
        let out = normalize_frames(&[frame]);
        assert_eq!(out[0].pose.len(), POSE_POINTS);
        assert_eq!(out[0].pose[10], Point::zero());
    }

    #[test]
    fn test_malformed_hand_nulled_out() {
        let frame = Frame {
            frame_number: 0,
            timestamp: 0.0,
            pose: vec![Point::zero(); POSE_POINTS],
            left_hand: Some(vec![Point::new(0.5, 0.5, 0.0, 1.0); 7]),
            right_hand: Some(vec![Point::new(0.5, 0.5, 0.0, 1.0); HAND_POINTS]),
        };
        let out = normalize_frames(&[frame]);
        assert!(out[0].left_hand.is_none());
        assert!(out[0].right_hand.is_some());
    }

    #[test]
    fn test_payload_wire_field_names() {
        let payload = SubmissionPayload {
            word: "hello".to_string(),
            user_id: Uuid::nil(),
            frames: Vec::new(),
            duration: 3.2,
            metadata: ClientMetadata {
                client_info: "signcap/0.1.0".to_string(),
                timestamp: Utc::now(),
            },
            sign_type_movement: SignMovement::Dynamic,
            sign_type_hands: HandUse::TwoHanded,
            stats: AttemptStats::from_attempts(&[]),
        };
        let json = serde_json::to_value(&payload).unwrap();

        // The stats block flattens into the top-level record
        for field in [
            "word",
            "user_id",
            "frames",
            "duration",
            "metadata",
            "sign_type_movement",
            "sign_type_hands",
            "num_attempts",
            "individual_qualities",
            "individual_durations",
            "quality_variance",
            "improvement_trend",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(json["sign_type_movement"], "dynamic");
        assert_eq!(json["sign_type_hands"], "two-handed");
        assert!(json["metadata"].get("client_info").is_some());
    }

    #[test]
    fn test_rejection_parses_with_and_without_breakdown() {
        let bare: SubmissionRejected =
            serde_json::from_str(r#"{"reason":"word not in dictionary"}"#).unwrap();
        assert_eq!(bare.reason, "word not in dictionary");
        assert!(bare.quality_breakdown.is_none());

        let with_breakdown = r#"{
            "reason": "quality below threshold",
            "quality_breakdown": {
                "overall": 0.4,
                "hand_visibility": 0.2,
                "motion_smoothness": 0.9,
                "frame_completeness": 0.5,
                "lighting_quality": 0.6,
                "labels": {
                    "hand_visibility": "poor",
                    "motion_smoothness": "excellent",
                    "frame_completeness": "fair",
                    "lighting": "acceptable"
                },
                "recommendations": ["Keep both hands clearly inside the camera frame while signing"]
            }
        }"#;
        let parsed: SubmissionRejected = serde_json::from_str(with_breakdown).unwrap();
        let breakdown = parsed.quality_breakdown.unwrap();
        assert_eq!(breakdown.overall, 0.4);
        assert_eq!(breakdown.recommendations.len(), 1);
    }

    #[test]
    fn test_accepted_response_parses() {
        let json = r#"{"total_contributions":12,"progress_percentage":60.0}"#;
        let accepted: SubmissionAccepted = serde_json::from_str(json).unwrap();
        assert_eq!(accepted.total_contributions, 12);
        assert_eq!(accepted.progress_percentage, 60.0);
        assert!(accepted.quality_breakdown.is_none());
    }
}
