//! Core types for the landmark pipeline
//!
//! Defines the fundamental data structures used throughout the capture and
//! analysis pipeline, plus the inbound per-frame contract of the external
//! landmark-detection engine.

use serde::{Deserialize, Deserializer, Serialize};

/// Number of pose landmarks in a complete skeleton
pub const POSE_POINTS: usize = 33;

/// Number of landmarks in a complete hand
pub const HAND_POINTS: usize = 21;

fn default_visibility() -> f64 {
    1.0
}

/// Deserialize a landmark array that the engine may send as `null`.
fn nullable_points<'de, D>(deserializer: D) -> Result<Vec<Point>, D::Error>
where
    D: Deserializer<'de>,
{
    let points = Option::<Vec<Point>>::deserialize(deserializer)?;
    Ok(points.unwrap_or_default())
}

/// A single 3D landmark point.
///
/// `x`, `y`, and `visibility` are normalized to `[0, 1]`; `z` is relative
/// depth and unbounded. Sources that omit visibility get the default of 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default = "default_visibility")]
    pub visibility: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }

    /// The zero point used to fill undetected pose landmarks.
    /// Visibility 0 marks it as carrying no signal.
    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            visibility: 0.0,
        }
    }

    /// Linear interpolation between two points by fractional weight `t`.
    pub fn lerp(a: &Point, b: &Point, t: f64) -> Point {
        Point {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
            z: a.z + (b.z - a.z) * t,
            visibility: a.visibility + (b.visibility - a.visibility) * t,
        }
    }

    /// Euclidean distance in the normalized image plane.
    ///
    /// `z` is excluded: it is relative depth on a different scale, and the
    /// displacement thresholds downstream are expressed in normalized image
    /// units.
    pub fn planar_distance(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One frame as delivered by the landmark-detection engine.
///
/// Parts are all-or-nothing: `pose` holds 0 or 33 points, each hand holds 0
/// or 21, and an absent part arrives as an empty array or `null`. Face
/// landmarks are also delivered by the engine but are not modeled here; serde
/// drops the field on deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamFrame {
    #[serde(default, deserialize_with = "nullable_points")]
    pub pose: Vec<Point>,
    #[serde(default, deserialize_with = "nullable_points")]
    pub left_hand: Vec<Point>,
    #[serde(default, deserialize_with = "nullable_points")]
    pub right_hand: Vec<Point>,
}

impl StreamFrame {
    /// Whether the engine detected a pose in this frame.
    pub fn has_pose(&self) -> bool {
        !self.pose.is_empty()
    }

    /// Iterate over every point the engine delivered, pose and hands alike.
    pub fn all_points(&self) -> impl Iterator<Item = &Point> {
        self.pose
            .iter()
            .chain(self.left_hand.iter())
            .chain(self.right_hand.iter())
    }
}

/// A captured skeletal frame, normalized to the model invariants.
///
/// `pose` always holds exactly [`POSE_POINTS`] entries (undetected landmarks
/// are zero-filled with visibility 0). Hands are either a complete
/// [`HAND_POINTS`]-point set or absent; partial sets from the source are
/// treated as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Monotonically increasing index within the attempt
    pub frame_number: u64,
    /// Seconds since the attempt's recording started
    pub timestamp: f64,
    /// Exactly 33 pose points
    pub pose: Vec<Point>,
    /// Complete 21-point left hand, or absent
    #[serde(default)]
    pub left_hand: Option<Vec<Point>>,
    /// Complete 21-point right hand, or absent
    #[serde(default)]
    pub right_hand: Option<Vec<Point>>,
}

impl Frame {
    /// Build a normalized frame from an engine frame.
    pub fn from_stream(stream: &StreamFrame, frame_number: u64, timestamp: f64) -> Self {
        Self {
            frame_number,
            timestamp,
            pose: Self::normalize_pose(&stream.pose),
            left_hand: Self::complete_hand(&stream.left_hand),
            right_hand: Self::complete_hand(&stream.right_hand),
        }
    }

    /// Pad or truncate a pose array to exactly [`POSE_POINTS`] entries.
    fn normalize_pose(points: &[Point]) -> Vec<Point> {
        let mut pose: Vec<Point> = points.iter().take(POSE_POINTS).copied().collect();
        pose.resize(POSE_POINTS, Point::zero());
        pose
    }

    /// A hand is kept only when the full 21-point set arrived.
    fn complete_hand(points: &[Point]) -> Option<Vec<Point>> {
        if points.len() == HAND_POINTS {
            Some(points.to_vec())
        } else {
            None
        }
    }

    /// Mean visibility of a hand's points, if the hand is present.
    pub fn hand_mean_visibility(hand: &Option<Vec<Point>>) -> Option<f64> {
        hand.as_ref()
            .map(|points| points.iter().map(|p| p.visibility).sum::<f64>() / points.len() as f64)
    }

    /// Whether any pose landmark carries signal.
    pub fn has_visible_pose(&self) -> bool {
        self.pose.iter().any(|p| p.visibility > 0.0)
    }

    /// Number of structural parts present (pose, left hand, right hand).
    pub fn parts_present(&self) -> usize {
        usize::from(self.has_visible_pose())
            + usize::from(self.left_hand.is_some())
            + usize::from(self.right_hand.is_some())
    }

    /// Mean visibility across the pose and any present hands.
    pub fn mean_visibility(&self) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for p in &self.pose {
            sum += p.visibility;
            count += 1;
        }
        for hand in [&self.left_hand, &self.right_hand].into_iter().flatten() {
            for p in hand {
                sum += p.visibility;
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }
}

/// Gross movement class of a sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SignMovement {
    /// A held posture with little hand travel
    Static,
    /// A sign whose meaning lives in the motion
    Dynamic,
}

/// How many hands the sign uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum HandUse {
    #[serde(rename = "one-handed")]
    OneHanded,
    #[serde(rename = "two-handed")]
    TwoHanded,
}

/// Classification metadata carried with every submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignClassification {
    pub movement: SignMovement,
    pub hand_use: HandUse,
}

impl Default for SignClassification {
    fn default() -> Self {
        Self {
            movement: SignMovement::Dynamic,
            hand_use: HandUse::TwoHanded,
        }
    }
}

/// A completed recording of one sign attempt.
///
/// Frozen by the attempt recorder when a session stops; immutable once stored
/// in a contribution session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// Time-ordered captured frames
    pub frames: Vec<Frame>,
    /// Fast quality estimate in `[0, 1]` computed at freeze time
    pub quality: f64,
    /// Recording duration in seconds
    pub duration: f64,
}

impl Attempt {
    pub fn new(frames: Vec<Frame>, quality: f64, duration: f64) -> Self {
        Self {
            frames,
            quality,
            duration,
        }
    }

    /// Number of captured frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
