//! Temporal Resampler
//!
//! Attempts at the same sign rarely produce identical frame counts: capture
//! timing varies with camera load and how early the contributor stops. To
//! compare attempts position-by-position, every attempt is resampled to one
//! reference length via linear interpolation over normalized position.
//!
//! The reference length is the lower median of the attempt lengths. With an
//! odd attempt count this is the true median; with an even count the lower
//! of the two middle values is taken, a fixed convention so the choice never
//! depends on which attempt happens to match.

use crate::landmark::types::{Frame, Point};

/// Reference length for a set of attempt lengths: the lower median.
///
/// Returns `None` for an empty set.
pub fn reference_length(lengths: &[usize]) -> Option<usize> {
    if lengths.is_empty() {
        return None;
    }
    let mut sorted = lengths.to_vec();
    sorted.sort_unstable();
    Some(sorted[(sorted.len() - 1) / 2])
}

/// Resample a frame sequence to exactly `target` frames.
///
/// A sequence already at the target length is returned unchanged. A target
/// of 1 returns the first frame unchanged (the interpolation scale is
/// undefined there). Output frames are renumbered `0..target`; timestamps
/// are interpolated alongside the coordinates and remain non-decreasing.
pub fn resample(frames: &[Frame], target: usize) -> Vec<Frame> {
    if frames.is_empty() || target == 0 {
        return Vec::new();
    }
    if frames.len() == target {
        return frames.to_vec();
    }
    if target == 1 {
        return vec![frames[0].clone()];
    }

    let last = frames.len() - 1;
    let scale = last as f64 / (target - 1) as f64;

    (0..target)
        .map(|i| {
            let s = i as f64 * scale;
            let lo = s.floor() as usize;
            let hi = (s.ceil() as usize).min(last);
            let w = s - lo as f64;
            interpolate(&frames[lo], &frames[hi], w, i as u64)
        })
        .collect()
}

/// Linearly interpolate between two bracketing frames.
fn interpolate(lo: &Frame, hi: &Frame, w: f64, frame_number: u64) -> Frame {
    Frame {
        frame_number,
        timestamp: lo.timestamp + (hi.timestamp - lo.timestamp) * w,
        pose: lo
            .pose
            .iter()
            .zip(hi.pose.iter())
            .map(|(a, b)| Point::lerp(a, b, w))
            .collect(),
        left_hand: interpolate_hand(&lo.left_hand, &hi.left_hand, w),
        right_hand: interpolate_hand(&lo.right_hand, &hi.right_hand, w),
    }
}

/// Hands interpolate only when both bracketing frames have them; a hand
/// present on one side passes through unchanged, and absent stays absent.
fn interpolate_hand(
    lo: &Option<Vec<Point>>,
    hi: &Option<Vec<Point>>,
    w: f64,
) -> Option<Vec<Point>> {
    match (lo, hi) {
        (Some(a), Some(b)) => Some(
            a.iter()
                .zip(b.iter())
                .map(|(pa, pb)| Point::lerp(pa, pb, w))
                .collect(),
        ),
        (Some(a), None) => Some(a.clone()),
        (None, Some(b)) => Some(b.clone()),
        (None, None) => None,
    }
}
