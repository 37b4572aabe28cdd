// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Step integrator microbenchmarks
//!
//! Covers the per-step hot path (drain, propagate, aggregate) across receptor
//! counts on both sides of the parallel threshold, plus spike delivery.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lfp_detector::{ConnectivitySnapshot, LfpDetector, NullSink, ParameterUpdate, SpikeEvent};

/// Detector with `populations²` receptors, routing disabled
fn detector(populations: usize, parallel_threshold: usize) -> LfpDetector {
    let n = populations * populations;
    let mut detector = LfpDetector::new(1).with_parallel_threshold(parallel_threshold);
    detector
        .set_status(
            &ParameterUpdate::new()
                .with_primary(vec![0.5; n], vec![3.0; n], vec![1.0; n])
                .with_secondary(vec![1.0], vec![8.0], vec![0.1; n]),
        )
        .expect("valid parameters");
    detector
        .calibrate(0.1, &ConnectivitySnapshot::new())
        .expect("calibration");
    detector
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("lfp_update");
    group.sample_size(20);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));

    const STEPS: u64 = 100;
    for populations in [2usize, 8, 32] {
        let n = populations * populations;
        group.throughput(Throughput::Elements(n as u64 * STEPS));

        for (label, threshold) in [("sequential", usize::MAX), ("parallel", 1)] {
            group.bench_with_input(BenchmarkId::new(label, n), &populations, |b, &populations| {
                let mut detector = detector(populations, threshold);
                b.iter(|| {
                    let from = detector.next_step();
                    detector
                        .handle_spike(&SpikeEvent::new(7, 1.0, from))
                        .expect("fresh step");
                    detector
                        .update(from..from + STEPS, &mut NullSink)
                        .expect("update");
                    black_box(detector.recordable_value("lfp").expect("lfp"))
                });
            });
        }
    }
    group.finish();
}

fn bench_delivery(c: &mut Criterion) {
    let mut group = c.benchmark_group("lfp_delivery");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(1));

    const SPIKES: u64 = 10_000;
    group.throughput(Throughput::Elements(SPIKES));
    group.bench_function("deliver_all", |b| {
        let mut detector = detector(4, usize::MAX);
        let inbox = detector.spike_inbox();
        b.iter(|| {
            let from = detector.next_step();
            let events: Vec<SpikeEvent> = (0..SPIKES)
                .map(|i| SpikeEvent::new(i % 97, 0.25, from + i % 50))
                .collect();
            black_box(inbox.deliver_all(&events).expect("deliver"));
            detector.update(from..from + 50, &mut NullSink).expect("update");
        });
    });
    group.finish();
}

criterion_group!(benches, bench_update, bench_delivery);
criterion_main!(benches);
