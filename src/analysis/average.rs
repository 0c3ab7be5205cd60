//! Cross-Attempt Averager
//!
//! Reconciles the resampled attempts into one consensus sequence: for each
//! of the T aligned positions, every landmark is the arithmetic mean (x, y,
//! z, visibility) over the attempts that have a value there. The result is
//! the averaged representative of all attempts, used both for submission and
//! for community preview.
//!
//! Hands average only over the attempts where the hand is present at that
//! position; with zero contributors the hand stays absent, keeping the frame
//! invariant that a hand is a complete 21-point set or nothing.
//!
//! Consensus timestamps are taken from the first attempt's resampled
//! timestamps; relative timing is what matters downstream, not the absolute
//! values.

use crate::analysis::resample;
use crate::landmark::types::{Attempt, Frame, Point};

/// A derived consensus sequence and the reference length it was aligned to.
#[derive(Debug, Clone, PartialEq)]
pub struct Consensus {
    /// Median frame count the attempts were resampled to
    pub reference_length: usize,
    pub frames: Vec<Frame>,
}

/// Resample every attempt to the session's reference length and average
/// them into a consensus sequence.
///
/// Empty attempts are skipped; an entirely empty session is an error.
pub fn derive_consensus(attempts: &[Attempt]) -> crate::Result<Consensus> {
    let sequences: Vec<&[Frame]> = attempts
        .iter()
        .filter(|a| !a.is_empty())
        .map(|a| a.frames.as_slice())
        .collect();

    let lengths: Vec<usize> = sequences.iter().map(|s| s.len()).collect();
    let reference_length = resample::reference_length(&lengths).ok_or(crate::Error::EmptySession)?;

    let resampled: Vec<Vec<Frame>> = sequences
        .iter()
        .map(|s| resample::resample(s, reference_length))
        .collect();

    Ok(Consensus {
        reference_length,
        frames: consensus(&resampled),
    })
}

/// Average equal-length frame sequences position by position.
///
/// All sequences must share one length (the resampler guarantees this);
/// passing none, or empty sequences, yields an empty result.
pub fn consensus(sequences: &[Vec<Frame>]) -> Vec<Frame> {
    let Some(first) = sequences.first() else {
        return Vec::new();
    };
    let len = first.len();
    debug_assert!(sequences.iter().all(|s| s.len() == len));

    (0..len)
        .map(|position| average_position(sequences, position))
        .collect()
}

fn average_position(sequences: &[Vec<Frame>], position: usize) -> Frame {
    let point_count = sequences[0][position].pose.len();
    let pose = (0..point_count)
        .map(|i| mean_point(sequences.iter().map(|s| &s[position].pose[i])))
        .collect();

    Frame {
        frame_number: position as u64,
        timestamp: sequences[0][position].timestamp,
        pose,
        left_hand: average_hand(sequences.iter().map(|s| &s[position].left_hand)),
        right_hand: average_hand(sequences.iter().map(|s| &s[position].right_hand)),
    }
}

fn mean_point<'a>(points: impl Iterator<Item = &'a Point>) -> Point {
    let mut sum = Point::zero();
    let mut count = 0usize;
    for p in points {
        sum.x += p.x;
        sum.y += p.y;
        sum.z += p.z;
        sum.visibility += p.visibility;
        count += 1;
    }
    if count == 0 {
        return Point::zero();
    }
    let n = count as f64;
    Point::new(sum.x / n, sum.y / n, sum.z / n, sum.visibility / n)
}

fn average_hand<'a>(hands: impl Iterator<Item = &'a Option<Vec<Point>>>) -> Option<Vec<Point>> {
    let present: Vec<&Vec<Point>> = hands.flatten().collect();
    let first = present.first()?;
    Some(
        (0..first.len())
            .map(|i| mean_point(present.iter().map(|hand| &hand[i])))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::types::{StreamFrame, HAND_POINTS, POSE_POINTS};

    fn frame_at(value: f64, n: u64, timestamp: f64) -> Frame {
        let stream = StreamFrame {
            pose: vec![Point::new(value, value, value, 1.0); POSE_POINTS],
            ..Default::default()
        };
        Frame::from_stream(&stream, n, timestamp)
    }

    fn attempt_of(values: &[f64]) -> Attempt {
        let frames: Vec<Frame> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| frame_at(v, i as u64, i as f64 / 30.0))
            .collect();
        Attempt::new(frames, 0.9, values.len() as f64 / 30.0)
    }

    #[test]
    fn test_identical_attempts_average_to_themselves() {
        let a = attempt_of(&[0.1, 0.2, 0.3, 0.4]);
        let sequences = vec![a.frames.clone(), a.frames.clone(), a.frames.clone()];
        let out = consensus(&sequences);

        assert_eq!(out.len(), 4);
        for (got, want) in out.iter().zip(a.frames.iter()) {
            for (gp, wp) in got.pose.iter().zip(want.pose.iter()) {
                assert!((gp.x - wp.x).abs() < 1e-12);
                assert!((gp.visibility - wp.visibility).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_pose_points_average_arithmetically() {
        let sequences = vec![attempt_of(&[0.2, 0.2]).frames, attempt_of(&[0.6, 0.6]).frames];
        let out = consensus(&sequences);
        assert!((out[0].pose[0].x - 0.4).abs() < 1e-12);
        assert!((out[1].pose[0].z - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_timestamps_come_from_first_sequence() {
        let mut a = attempt_of(&[0.1, 0.2]).frames;
        a[0].timestamp = 0.0;
        a[1].timestamp = 0.5;
        let mut b = attempt_of(&[0.3, 0.4]).frames;
        b[0].timestamp = 10.0;
        b[1].timestamp = 20.0;

        let out = consensus(&[a, b]);
        assert_eq!(out[0].timestamp, 0.0);
        assert_eq!(out[1].timestamp, 0.5);
    }

    #[test]
    fn test_hand_averages_only_contributing_attempts() {
        let hand = |v: f64| Some(vec![Point::new(v, v, 0.0, 1.0); HAND_POINTS]);

        let mut a = attempt_of(&[0.1]).frames;
        a[0].left_hand = hand(0.2);
        let mut b = attempt_of(&[0.1]).frames;
        b[0].left_hand = hand(0.6);
        let c = attempt_of(&[0.1]).frames; // no left hand

        let out = consensus(&[a, b, c]);
        let left = out[0].left_hand.as_ref().unwrap();
        // Mean of the two contributors, the absent attempt does not dilute
        assert!((left[0].x - 0.4).abs() < 1e-12);
        assert!(out[0].right_hand.is_none());
    }

    #[test]
    fn test_hand_absent_everywhere_stays_absent() {
        let out = consensus(&[attempt_of(&[0.1, 0.2]).frames, attempt_of(&[0.3, 0.4]).frames]);
        assert!(out.iter().all(|f| f.left_hand.is_none() && f.right_hand.is_none()));
    }

    #[test]
    fn test_empty_input() {
        assert!(consensus(&[]).is_empty());
        assert!(consensus(&[Vec::new()]).is_empty());
    }

    #[test]
    fn test_derive_consensus_uses_median_length() {
        let attempts = vec![
            attempt_of(&vec![0.5; 28]),
            attempt_of(&vec![0.5; 34]),
            attempt_of(&vec![0.5; 31]),
        ];
        let consensus = derive_consensus(&attempts).unwrap();
        assert_eq!(consensus.reference_length, 31);
        assert_eq!(consensus.frames.len(), 31);
    }

    #[test]
    fn test_derive_consensus_empty_session_is_error() {
        assert!(matches!(
            derive_consensus(&[]),
            Err(crate::Error::EmptySession)
        ));
        let empty = Attempt::new(Vec::new(), 0.0, 0.0);
        assert!(matches!(
            derive_consensus(&[empty]),
            Err(crate::Error::EmptySession)
        ));
    }

    #[test]
    fn test_consensus_frame_numbers_are_sequential() {
        let out = consensus(&[attempt_of(&[0.1, 0.2, 0.3]).frames]);
        let numbers: Vec<u64> = out.iter().map(|f| f.frame_number).collect();
        assert_eq!(numbers, vec![0, 1, 2]);
    }
}
