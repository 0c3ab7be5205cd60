//! Criterion benchmarks for performance-critical hot paths
//!
//! Covers: frame ring buffer push/pop, temporal resampling, cross-attempt
//! averaging, and quality scoring.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use signcap::analysis::quality::QualityScorer;
use signcap::analysis::{average, resample};
use signcap::capture::frame_buffer::FrameRingBuffer;
use signcap::landmark::types::{
    Frame, Point, SignMovement, StreamFrame, HAND_POINTS, POSE_POINTS,
};

fn make_stream_frame() -> StreamFrame {
    StreamFrame {
        pose: vec![Point::new(0.5, 0.5, 0.0, 0.9); POSE_POINTS],
        left_hand: vec![Point::new(0.4, 0.6, 0.0, 0.9); HAND_POINTS],
        right_hand: vec![Point::new(0.6, 0.6, 0.0, 0.9); HAND_POINTS],
    }
}

fn make_sequence(len: usize) -> Vec<Frame> {
    let stream = make_stream_frame();
    (0..len)
        .map(|i| Frame::from_stream(&stream, i as u64, i as f64 / 30.0))
        .collect()
}

// ---------------------------------------------------------------------------
// Ring buffer benchmarks
// ---------------------------------------------------------------------------

fn bench_ring_buffer(c: &mut Criterion) {
    c.bench_function("ring_buffer_push_pop_batch", |b| {
        b.iter_batched(
            || FrameRingBuffer::with_capacity(256).split(),
            |(mut producer, mut consumer)| {
                for _ in 0..100 {
                    producer.push(black_box(make_stream_frame()));
                }
                black_box(consumer.pop_batch(100));
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

// ---------------------------------------------------------------------------
// Resampling and averaging benchmarks
// ---------------------------------------------------------------------------

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");
    for len in [28usize, 90, 300] {
        let frames = make_sequence(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &frames, |b, frames| {
            b.iter(|| black_box(resample::resample(frames, 31)))
        });
    }
    group.finish();
}

fn bench_consensus(c: &mut Criterion) {
    let sequences: Vec<Vec<Frame>> = (0..3).map(|_| make_sequence(31)).collect();
    c.bench_function("consensus_3x31", |b| {
        b.iter(|| black_box(average::consensus(&sequences)))
    });
}

// ---------------------------------------------------------------------------
// Quality scoring benchmarks
// ---------------------------------------------------------------------------

fn bench_quality(c: &mut Criterion) {
    let scorer = QualityScorer::new();
    let frames = make_sequence(31);
    c.bench_function("quality_score_31", |b| {
        b.iter(|| black_box(scorer.score(&frames, SignMovement::Dynamic)))
    });
}

criterion_group!(
    benches,
    bench_ring_buffer,
    bench_resample,
    bench_consensus,
    bench_quality
);
criterion_main!(benches);
