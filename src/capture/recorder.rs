//! Attempt Recorder State Machine
//!
//! A bounded-duration capture session: countdown, a recording window fed by
//! the landmark stream, and a short completion acknowledgment before the
//! frame buffer is frozen into an [`Attempt`].
//!
//! The machine is pure with respect to time: every entry point takes the
//! current instant (seconds from a monotonic clock) and returns the events
//! the transition produced. The capture loop owns the clock and the timers;
//! two of its timers (the 100 ms progress tick and the hard-ceiling cutoff)
//! may race to stop the recorder, which is why stop is idempotent.

use crate::analysis::quality;
use crate::landmark::types::{Attempt, Frame, StreamFrame};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

/// Recorder timing and validity thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Countdown length in whole seconds before recording starts
    pub countdown_secs: u32,
    /// Soft recording target; reaching it stops the attempt normally
    pub soft_stop_secs: f64,
    /// Hard safety ceiling, strictly greater than the soft target
    pub hard_stop_secs: f64,
    /// Completion acknowledgment window between stop and freeze
    pub completion_ack_secs: f64,
    /// Minimum frames for a valid attempt
    pub min_frames: usize,
    /// Nominal capture rate of the landmark engine (frames/second)
    pub nominal_fps: f64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 5,
            soft_stop_secs: 3.0,
            hard_stop_secs: 6.0,
            completion_ack_secs: 0.5,
            min_frames: 30,
            nominal_fps: 30.0,
        }
    }
}

impl RecorderConfig {
    /// Check config values are within acceptable ranges.
    pub fn validate(&self) -> crate::Result<()> {
        if self.soft_stop_secs <= 0.0 {
            return Err(crate::Error::Config(format!(
                "soft_stop_secs must be > 0, got {}",
                self.soft_stop_secs
            )));
        }
        if self.hard_stop_secs <= self.soft_stop_secs {
            return Err(crate::Error::Config(format!(
                "hard_stop_secs ({}) must be strictly greater than soft_stop_secs ({})",
                self.hard_stop_secs, self.soft_stop_secs
            )));
        }
        if self.completion_ack_secs < 0.0 {
            return Err(crate::Error::Config(
                "completion_ack_secs must not be negative".to_string(),
            ));
        }
        if self.min_frames == 0 {
            return Err(crate::Error::Config("min_frames must be > 0".to_string()));
        }
        if self.nominal_fps <= 0.0 {
            return Err(crate::Error::Config(format!(
                "nominal_fps must be > 0, got {}",
                self.nominal_fps
            )));
        }
        Ok(())
    }
}

/// Why a recording stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Explicit user stop
    Manual,
    /// Elapsed time passed the soft target
    SoftTarget,
    /// Elapsed time passed the hard safety ceiling
    HardCeiling,
}

/// Public view of the recorder's current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    CountingDown,
    Recording,
    Stopping,
}

/// Events emitted by recorder transitions, in occurrence order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    /// One countdown second elapsed; `remaining` counts down to 0
    CountdownTick { remaining: u32 },
    RecordingStarted,
    /// Periodic progress against the soft target
    Progress { elapsed: f64, remaining: f64 },
    RecordingStopped { reason: StopReason },
    /// The completed attempt, frozen after the acknowledgment window
    AttemptReady(Attempt),
    /// The buffer held fewer than `min` frames and was discarded
    AttemptTooShort { got: usize, min: usize },
}

/// Internal state with per-phase data. The frame buffer travels through
/// Recording and Stopping by ownership; no transition copies it.
#[derive(Debug)]
enum State {
    Idle,
    CountingDown {
        started_at: f64,
        ticks_emitted: u32,
    },
    Recording {
        started_at: f64,
        frames: Vec<Frame>,
    },
    Stopping {
        started_at: f64,
        stopped_at: f64,
        frames: Vec<Frame>,
        reason: StopReason,
    },
}

/// The attempt recorder state machine.
pub struct AttemptRecorder {
    config: RecorderConfig,
    state: State,
    /// Frames delivered outside the recording window (diagnostic only)
    ignored_frames: u64,
}

impl AttemptRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            state: State::Idle,
            ignored_frames: 0,
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Current phase.
    pub fn state(&self) -> RecorderState {
        match self.state {
            State::Idle => RecorderState::Idle,
            State::CountingDown { .. } => RecorderState::CountingDown,
            State::Recording { .. } => RecorderState::Recording,
            State::Stopping { .. } => RecorderState::Stopping,
        }
    }

    /// Frames accepted into the current attempt buffer.
    pub fn frames_captured(&self) -> usize {
        match &self.state {
            State::Recording { frames, .. } | State::Stopping { frames, .. } => frames.len(),
            _ => 0,
        }
    }

    /// Frames delivered while the recorder was not accepting them.
    pub fn ignored_frames(&self) -> u64 {
        self.ignored_frames
    }

    /// Begin a capture: Idle → CountingDown.
    ///
    /// A zero-length countdown transitions straight into Recording. Calling
    /// from any other state is a no-op.
    pub fn start(&mut self, now: f64) -> Vec<RecorderEvent> {
        if !matches!(self.state, State::Idle) {
            warn!(state = ?self.state(), "start() ignored: recorder is not idle");
            return Vec::new();
        }

        if self.config.countdown_secs == 0 {
            info!("recording started (no countdown)");
            self.state = State::Recording {
                started_at: now,
                frames: Vec::new(),
            };
            return vec![RecorderEvent::RecordingStarted];
        }

        info!(countdown = self.config.countdown_secs, "countdown started");
        self.state = State::CountingDown {
            started_at: now,
            ticks_emitted: 0,
        };
        vec![RecorderEvent::CountdownTick {
            remaining: self.config.countdown_secs,
        }]
    }

    /// Deliver one frame from the landmark stream.
    ///
    /// Frames are appended only while Recording; in every other state they
    /// are counted and dropped. A frame arriving past the hard ceiling
    /// triggers the safety stop instead of being appended, covering the case
    /// where the timer-driven tick stalls.
    pub fn handle_frame(&mut self, stream: &StreamFrame, now: f64) -> Vec<RecorderEvent> {
        let over_ceiling = match &self.state {
            State::Recording { started_at, .. } => {
                (now - started_at).max(0.0) >= self.config.hard_stop_secs
            }
            _ => {
                self.ignored_frames += 1;
                trace!(state = ?self.state(), "frame ignored");
                return Vec::new();
            }
        };
        if over_ceiling {
            return self.stop_with(StopReason::HardCeiling, now);
        }

        if let State::Recording { started_at, frames } = &mut self.state {
            let elapsed = (now - *started_at).max(0.0);
            let frame_number = frames.len() as u64;
            frames.push(Frame::from_stream(stream, frame_number, elapsed));
            trace!(frame_number, elapsed, "frame captured");
        }
        Vec::new()
    }

    /// Explicit user stop.
    ///
    /// Idempotent: stopping while already Stopping or Idle is a no-op, which
    /// guards the race between the manual stop and the ceiling timer. A stop
    /// during the countdown cancels it without producing an attempt.
    pub fn request_stop(&mut self, now: f64) -> Vec<RecorderEvent> {
        match self.state {
            State::Recording { .. } => self.stop_with(StopReason::Manual, now),
            State::CountingDown { .. } => {
                info!("countdown cancelled");
                self.state = State::Idle;
                Vec::new()
            }
            State::Idle | State::Stopping { .. } => {
                debug!(state = ?self.state(), "stop ignored: not recording");
                Vec::new()
            }
        }
    }

    /// Discard any in-progress buffer and return to Idle.
    ///
    /// Previously completed attempts are unaffected; they were already handed
    /// to the caller.
    pub fn abort(&mut self) {
        if !matches!(self.state, State::Idle) {
            info!(
                discarded_frames = self.frames_captured(),
                "attempt aborted"
            );
        }
        self.state = State::Idle;
    }

    /// Advance time-driven transitions. The capture loop calls this on its
    /// periodic (~100 ms) tick.
    pub fn tick(&mut self, now: f64) -> Vec<RecorderEvent> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => Vec::new(),

            State::CountingDown {
                started_at,
                mut ticks_emitted,
            } => {
                let elapsed = (now - started_at).max(0.0);
                if elapsed >= self.config.countdown_secs as f64 {
                    info!("recording started");
                    self.state = State::Recording {
                        started_at: now,
                        frames: Vec::new(),
                    };
                    return vec![RecorderEvent::RecordingStarted];
                }

                let mut events = Vec::new();
                let whole = elapsed.floor() as u32;
                while ticks_emitted < whole {
                    ticks_emitted += 1;
                    events.push(RecorderEvent::CountdownTick {
                        remaining: self.config.countdown_secs - ticks_emitted,
                    });
                }
                self.state = State::CountingDown {
                    started_at,
                    ticks_emitted,
                };
                events
            }

            State::Recording { started_at, frames } => {
                let elapsed = now - started_at;
                self.state = State::Recording { started_at, frames };
                if elapsed >= self.config.hard_stop_secs {
                    self.stop_with(StopReason::HardCeiling, now)
                } else if elapsed >= self.config.soft_stop_secs {
                    self.stop_with(StopReason::SoftTarget, now)
                } else {
                    vec![RecorderEvent::Progress {
                        elapsed,
                        remaining: self.config.soft_stop_secs - elapsed,
                    }]
                }
            }

            State::Stopping {
                started_at,
                stopped_at,
                frames,
                reason,
            } => {
                if now - stopped_at < self.config.completion_ack_secs {
                    self.state = State::Stopping {
                        started_at,
                        stopped_at,
                        frames,
                        reason,
                    };
                    return Vec::new();
                }
                // Acknowledgment window over: freeze the buffer.
                vec![self.freeze(frames, stopped_at - started_at)]
            }
        }
    }

    /// Transition Recording → Stopping. Only callable while Recording.
    fn stop_with(&mut self, reason: StopReason, now: f64) -> Vec<RecorderEvent> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Recording { started_at, frames } => {
                info!(?reason, frames = frames.len(), "recording stopped");
                self.state = State::Stopping {
                    started_at,
                    stopped_at: now,
                    frames,
                    reason,
                };
                vec![RecorderEvent::RecordingStopped { reason }]
            }
            other => {
                self.state = other;
                Vec::new()
            }
        }
    }

    /// Validate and freeze the buffer into an attempt; always returns to Idle.
    fn freeze(&mut self, frames: Vec<Frame>, duration: f64) -> RecorderEvent {
        self.state = State::Idle;
        if frames.len() < self.config.min_frames {
            warn!(
                got = frames.len(),
                min = self.config.min_frames,
                "attempt too short, discarded"
            );
            return RecorderEvent::AttemptTooShort {
                got: frames.len(),
                min: self.config.min_frames,
            };
        }

        let estimate = quality::quick_score(&frames);
        info!(
            frames = frames.len(),
            duration,
            quality = estimate,
            "attempt ready"
        );
        RecorderEvent::AttemptReady(Attempt::new(frames, estimate, duration.max(0.0)))
    }
}
