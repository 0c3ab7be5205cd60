//! Frame capture module
//!
//! Consumes the external landmark engine's per-frame output through a
//! lock-free ring buffer and turns it into completed attempts: the engine
//! callback is the single producer, and the capture loop drains the buffer
//! into whichever of the attempt recorder or the environment monitor the
//! current state selects.

pub mod frame_buffer;
pub mod monitor;
pub mod recorder;
pub mod session;
pub mod source;

pub use frame_buffer::FrameRingBuffer;
pub use monitor::{EnvironmentMonitor, EnvironmentReading};
pub use recorder::{AttemptRecorder, RecorderConfig, RecorderEvent, RecorderState, StopReason};
pub use session::{ContributionSession, HandUse, SignClassification, SignMovement};
pub use source::JsonlSource;
