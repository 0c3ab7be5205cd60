//! Landmark frame model
//!
//! The shared data shapes every other component operates on: 3D points with
//! visibility, skeletal frames (33-point pose, optional 21-point hands),
//! completed attempts, and the inbound per-frame contract of the external
//! landmark-detection engine.

pub mod indices;
pub mod types;

pub use types::{
    Attempt, Frame, HandUse, Point, SignClassification, SignMovement, StreamFrame, HAND_POINTS,
    POSE_POINTS,
};
