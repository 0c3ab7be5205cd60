//! Integration tests for the capture pipeline
//!
//! These tests verify the path from landmark stream to completed attempts:
//! Engine frames -> Ring buffer -> Recorder / Environment monitor -> Session

use signcap::capture::frame_buffer::FrameRingBuffer;
use signcap::capture::monitor::EnvironmentMonitor;
use signcap::capture::recorder::{
    AttemptRecorder, RecorderConfig, RecorderEvent, RecorderState, StopReason,
};
use signcap::capture::session::ContributionSession;
use signcap::landmark::types::{
    Attempt, Frame, Point, SignClassification, StreamFrame, HAND_POINTS, POSE_POINTS,
};
use signcap::time::{Clock, ManualClock};
use std::sync::atomic::Ordering;

// ============================================================================
// Test Helpers
// ============================================================================

/// An engine frame with a fully visible signer
fn visible_frame() -> StreamFrame {
    StreamFrame {
        pose: vec![Point::new(0.5, 0.5, 0.0, 1.0); POSE_POINTS],
        left_hand: vec![Point::new(0.4, 0.6, 0.0, 1.0); HAND_POINTS],
        right_hand: vec![Point::new(0.6, 0.6, 0.0, 1.0); HAND_POINTS],
    }
}

/// An engine frame where detection found nothing
fn empty_frame() -> StreamFrame {
    StreamFrame::default()
}

/// Feed `n` frames at the nominal 30 fps starting at `t0`, returning all
/// emitted events.
fn feed_frames(
    recorder: &mut AttemptRecorder,
    frame: &StreamFrame,
    n: usize,
    t0: f64,
) -> Vec<RecorderEvent> {
    let mut events = Vec::new();
    for i in 0..n {
        events.extend(recorder.handle_frame(frame, t0 + i as f64 / 30.0));
    }
    events
}

// ============================================================================
// Ring buffer to recorder handoff
// ============================================================================

#[test]
fn test_frames_flow_producer_to_recorder() {
    let buffer = FrameRingBuffer::with_capacity(128);
    let (mut producer, mut consumer) = buffer.split();

    // Engine thread pushes a burst of frames
    let feeder = std::thread::spawn(move || {
        for _ in 0..60 {
            while !producer.push(visible_frame()) {
                std::thread::yield_now();
            }
        }
    });
    feeder.join().unwrap();

    // Capture loop drains them into a recording
    let mut recorder = AttemptRecorder::new(RecorderConfig {
        countdown_secs: 0,
        ..Default::default()
    });
    recorder.start(0.0);

    let mut t = 0.0;
    loop {
        let batch = consumer.pop_batch(16);
        if batch.is_empty() {
            break;
        }
        for slot in batch {
            recorder.handle_frame(&slot.frame, t);
            t += 1.0 / 30.0;
        }
    }

    assert_eq!(recorder.frames_captured(), 60);
}

#[test]
fn test_buffer_overflow_does_not_corrupt_sequence() {
    let buffer = FrameRingBuffer::with_capacity(8);
    let stats = buffer.stats();
    let (mut producer, mut consumer) = buffer.split();

    for _ in 0..20 {
        producer.push(visible_frame());
    }
    assert!(stats.frames_dropped.load(Ordering::Relaxed) > 0);

    // Consumed sequence numbers stay gapless despite the drops
    let sequences: Vec<u64> = consumer.pop_batch(64).iter().map(|s| s.sequence).collect();
    assert_eq!(sequences, (0..sequences.len() as u64).collect::<Vec<_>>());
}

// ============================================================================
// Recorder lifecycle
// ============================================================================

#[test]
fn test_full_attempt_lifecycle() {
    let mut recorder = AttemptRecorder::new(RecorderConfig::default());

    // Countdown: 5 seconds, one tick per second
    let mut events = recorder.start(0.0);
    for t in 1..5 {
        events.extend(recorder.tick(t as f64));
    }
    let ticks = events
        .iter()
        .filter(|e| matches!(e, RecorderEvent::CountdownTick { .. }))
        .count();
    assert_eq!(ticks, 5);

    let events = recorder.tick(5.0);
    assert_eq!(events, vec![RecorderEvent::RecordingStarted]);

    // Capture ~2 seconds of frames, then stop manually
    let frame = visible_frame();
    feed_frames(&mut recorder, &frame, 60, 5.0);
    let events = recorder.request_stop(7.0);
    assert_eq!(
        events,
        vec![RecorderEvent::RecordingStopped {
            reason: StopReason::Manual
        }]
    );

    // The attempt comes out after the acknowledgment window
    assert!(recorder.tick(7.2).is_empty());
    let events = recorder.tick(7.6);
    let attempt = match &events[..] {
        [RecorderEvent::AttemptReady(attempt)] => attempt,
        other => panic!("expected a ready attempt, got {other:?}"),
    };
    assert_eq!(attempt.len(), 60);
    assert!((attempt.duration - 2.0).abs() < 1e-9);
    assert!(attempt.quality > 0.9);
    assert_eq!(recorder.state(), RecorderState::Idle);
}

#[test]
fn test_clock_driven_capture_loop() {
    // Drive the recorder exactly as the capture loop does, with a manual
    // clock standing in for wall time.
    let clock = ManualClock::new();
    let mut recorder = AttemptRecorder::new(RecorderConfig::default());
    recorder.start(clock.now());

    // 100 ms ticks through the 5 s countdown
    while recorder.state() == RecorderState::CountingDown {
        clock.advance(0.1);
        recorder.tick(clock.now());
    }
    assert_eq!(recorder.state(), RecorderState::Recording);

    // 1.2 s of frames at 30 fps, ticks interleaved
    let frame = visible_frame();
    let mut events = Vec::new();
    for _ in 0..36 {
        clock.advance(1.0 / 30.0);
        events.extend(recorder.handle_frame(&frame, clock.now()));
        events.extend(recorder.tick(clock.now()));
    }

    // Still inside the soft target, so the stop is manual
    events.extend(recorder.request_stop(clock.now()));
    clock.advance(0.6);
    events.extend(recorder.tick(clock.now()));

    let attempt = events
        .iter()
        .find_map(|e| match e {
            RecorderEvent::AttemptReady(a) => Some(a),
            _ => None,
        })
        .expect("attempt ready");
    assert_eq!(attempt.len(), 36);
}

#[test]
fn test_racing_stop_sources_produce_one_attempt() {
    // Manual stop and the ceiling timer race: only one wins.
    let mut recorder = AttemptRecorder::new(RecorderConfig {
        countdown_secs: 0,
        ..Default::default()
    });
    recorder.start(0.0);
    feed_frames(&mut recorder, &visible_frame(), 45, 0.0);

    let manual = recorder.request_stop(1.5);
    let timer = recorder.tick(1.5); // would be the 100 ms tick firing stop too
    assert_eq!(manual.len(), 1);
    assert!(timer.is_empty());

    let mut ready = 0;
    for t in [1.8, 2.0, 2.5] {
        ready += recorder
            .tick(t)
            .iter()
            .filter(|e| matches!(e, RecorderEvent::AttemptReady(_)))
            .count();
    }
    assert_eq!(ready, 1);
}

#[test]
fn test_too_short_attempt_is_rejected_not_silently_accepted() {
    let mut recorder = AttemptRecorder::new(RecorderConfig {
        countdown_secs: 0,
        ..Default::default()
    });
    recorder.start(0.0);
    feed_frames(&mut recorder, &visible_frame(), 12, 0.0);
    recorder.request_stop(0.4);

    let events = recorder.tick(1.0);
    assert_eq!(events, vec![RecorderEvent::AttemptTooShort { got: 12, min: 30 }]);
    assert_eq!(recorder.state(), RecorderState::Idle);
}

#[test]
fn test_retake_after_abort_starts_clean() {
    let mut recorder = AttemptRecorder::new(RecorderConfig {
        countdown_secs: 0,
        ..Default::default()
    });
    recorder.start(0.0);
    feed_frames(&mut recorder, &visible_frame(), 40, 0.0);
    recorder.abort();

    // A fresh attempt sees none of the discarded frames
    recorder.start(10.0);
    feed_frames(&mut recorder, &visible_frame(), 31, 10.0);
    recorder.request_stop(11.05);
    let events = recorder.tick(11.6);
    match &events[..] {
        [RecorderEvent::AttemptReady(attempt)] => {
            assert_eq!(attempt.len(), 31);
            assert_eq!(attempt.frames[0].frame_number, 0);
            assert!(attempt.frames[0].timestamp < 0.01);
        }
        other => panic!("expected a ready attempt, got {other:?}"),
    }
}

#[test]
fn test_degraded_sensor_data_is_not_an_error() {
    // A hand dropping out mid-attempt is absorbed as absent data.
    let mut recorder = AttemptRecorder::new(RecorderConfig {
        countdown_secs: 0,
        ..Default::default()
    });
    recorder.start(0.0);

    let full = visible_frame();
    let degraded = StreamFrame {
        pose: vec![Point::new(0.5, 0.5, 0.0, 0.4); POSE_POINTS],
        ..Default::default()
    };
    feed_frames(&mut recorder, &full, 20, 0.0);
    feed_frames(&mut recorder, &degraded, 20, 20.0 / 30.0);
    recorder.request_stop(40.0 / 30.0);

    let events = recorder.tick(2.0);
    match &events[..] {
        [RecorderEvent::AttemptReady(attempt)] => {
            assert_eq!(attempt.len(), 40);
            assert!(attempt.frames[30].left_hand.is_none());
            // Quality reflects the dropout instead of erroring
            assert!(attempt.quality < 0.9);
        }
        other => panic!("expected a ready attempt, got {other:?}"),
    }
}

// ============================================================================
// Environment monitor alongside the recorder
// ============================================================================

#[test]
fn test_monitor_gates_readiness_without_blocking_recorder() {
    let monitor = EnvironmentMonitor::new();

    // Dark, handless stream: not ready
    assert!(!monitor.assess(&empty_frame()).can_proceed);

    // The recorder can still be started; the gate is advisory
    let mut recorder = AttemptRecorder::new(RecorderConfig::default());
    assert!(!recorder.start(0.0).is_empty());
    assert_eq!(recorder.state(), RecorderState::CountingDown);

    // Once the signer is visible, the monitor agrees
    assert!(monitor.assess(&visible_frame()).can_proceed);
}

#[test]
fn test_monitor_consumes_stream_without_buffering() {
    let monitor = EnvironmentMonitor::new();
    let buffer = FrameRingBuffer::with_capacity(64);
    let (mut producer, mut consumer) = buffer.split();

    for _ in 0..30 {
        producer.push(visible_frame());
    }
    for slot in consumer.pop_batch(64) {
        let reading = monitor.assess(&slot.frame);
        assert!(reading.can_proceed);
    }
    // Nothing retained: the buffer is drained and the monitor holds no frames
    assert_eq!(consumer.pending(), 0);
}

// ============================================================================
// Session persistence of captured attempts
// ============================================================================

#[test]
fn test_completed_attempts_survive_save_load() {
    let mut recorder = AttemptRecorder::new(RecorderConfig {
        countdown_secs: 0,
        ..Default::default()
    });
    let mut session = ContributionSession::new("hello", SignClassification::default());

    for attempt_no in 0..2 {
        let t0 = attempt_no as f64 * 10.0;
        recorder.start(t0);
        feed_frames(&mut recorder, &visible_frame(), 32, t0);
        recorder.request_stop(t0 + 32.0 / 30.0);
        let events = recorder.tick(t0 + 2.0);
        match &events[..] {
            [RecorderEvent::AttemptReady(attempt)] => session.push_attempt(attempt.clone()),
            other => panic!("expected a ready attempt, got {other:?}"),
        }
    }
    session.finalize();

    let file = tempfile::NamedTempFile::new().unwrap();
    session.save(file.path()).unwrap();
    let loaded = ContributionSession::load(file.path()).unwrap();

    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.frame_counts(), vec![32, 32]);
    let first: &Attempt = &loaded.attempts[0];
    let frame: &Frame = &first.frames[0];
    assert_eq!(frame.pose.len(), POSE_POINTS);
    assert!(frame.left_hand.is_some());
}
