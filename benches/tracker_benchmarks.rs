//! Tracker and analysis benchmarks using Criterion.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::DMatrix;

use casa_track::assignment::linear_sum_assignment;
use casa_track::kinematics::analyze_trajectories;
use casa_track::{
    Calibration, FrameDetections, KinematicsConfig, Tracker, TrackerConfig, Trajectory,
};

/// Objects on a grid, each drifting 2 px per frame along x.
fn create_test_frames(n_objects: usize, n_frames: u64) -> Vec<FrameDetections> {
    (0..n_frames)
        .map(|frame| {
            let points = (0..n_objects)
                .map(|i| {
                    let x = (i % 10) as f64 * 100.0 + 2.0 * frame as f64;
                    let y = (i / 10) as f64 * 100.0 + (frame % 3) as f64;
                    [x, y]
                })
                .collect();
            FrameDetections::from_frame_index(frame, 25.0, points).expect("valid frame")
        })
        .collect()
}

fn benchmark_tracker_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker_update");
    for n_objects in [10, 50, 100] {
        let frames = create_test_frames(n_objects, 50);
        group.bench_with_input(BenchmarkId::from_parameter(n_objects), &frames, |b, frames| {
            b.iter(|| {
                let mut tracker = Tracker::new(TrackerConfig::default()).expect("valid tracker");
                for frame in frames {
                    tracker.update(black_box(frame)).expect("valid frame");
                }
                tracker.total_track_count()
            })
        });
    }
    group.finish();
}

fn benchmark_hungarian(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear_sum_assignment");
    for size in [10, 50, 100] {
        // Deterministic pseudo-random costs
        let matrix = DMatrix::from_fn(size, size + size / 5, |i, j| {
            ((i * 7919 + j * 104729) % 1000) as f64 / 10.0
        });
        group.bench_with_input(BenchmarkId::from_parameter(size), &matrix, |b, matrix| {
            b.iter(|| linear_sum_assignment(black_box(matrix)))
        });
    }
    group.finish();
}

fn benchmark_kinematics(c: &mut Criterion) {
    let calibration = Calibration::new(0.5, 25.0).expect("valid calibration");
    let mut tracker = Tracker::new(TrackerConfig::default()).expect("valid tracker");
    for frame in create_test_frames(100, 60) {
        tracker.update(&frame).expect("valid frame");
    }
    let trajectories: Vec<Trajectory> = tracker
        .valid_tracks()
        .into_iter()
        .map(|track| Trajectory::from_track(track, &calibration))
        .collect();
    let config = KinematicsConfig::default();

    c.bench_function("analyze_100_trajectories", |b| {
        b.iter(|| analyze_trajectories(black_box(&trajectories), 100, &config))
    });
}

criterion_group!(
    benches,
    benchmark_tracker_update,
    benchmark_hungarian,
    benchmark_kinematics,
);
criterion_main!(benches);
