// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Response of the integrated detector to single and combined spikes
//!
//! The recursion must reproduce the continuous beta kernel sampled at the
//! step grid, add up linearly, and keep an inactive secondary component at
//! exactly zero.

use lfp_detector::{
    beta_kernel, ConnectivitySnapshot, KernelComponent, LfpDetector, MemoryRecorder, ParameterUpdate,
    SpikeEvent,
};

const H: f64 = 0.1;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1e-300)
}

fn primary_only(tau_rise: f64, tau_decay: f64, normalizer: f64) -> LfpDetector {
    let mut detector = LfpDetector::new(1);
    detector
        .set_status(&ParameterUpdate::new().with_primary(vec![tau_rise], vec![tau_decay], vec![normalizer]))
        .unwrap();
    detector.calibrate(H, &ConnectivitySnapshot::new()).unwrap();
    detector
}

fn run(detector: &mut LfpDetector, spikes: &[SpikeEvent], steps: u64) -> Vec<f64> {
    for spike in spikes {
        detector.handle_spike(spike).unwrap();
    }
    let mut recorder = MemoryRecorder::new();
    detector.update(0..steps, &mut recorder).unwrap();
    recorder.values()
}

#[test]
fn test_impulse_response_samples_beta_kernel() {
    let (tau_rise, tau_decay, normalizer, weight) = (0.5, 3.0, 2.0, 1.5);
    let spike_step = 5;
    let mut detector = primary_only(tau_rise, tau_decay, normalizer);
    let lfp = run(&mut detector, &[SpikeEvent::new(9, weight, spike_step)], 200);

    for (step, &value) in lfp.iter().enumerate().take(spike_step as usize + 1) {
        assert_eq!(value, 0.0, "no response at or before the spike step (step {step})");
    }

    let p21 = detector.calibration().unwrap().kernels().coefficients(KernelComponent::Primary)[0].p21;
    assert!(close(lfp[spike_step as usize + 1], normalizer * weight * p21));

    for k in 1..(200 - spike_step as usize) {
        let expected = beta_kernel(k as f64 * H, tau_rise, tau_decay, normalizer * weight);
        assert!(
            close(lfp[spike_step as usize + k], expected),
            "k={k}: got {} expected {expected}",
            lfp[spike_step as usize + k]
        );
    }
}

#[test]
fn test_default_detector_end_to_end() {
    let mut detector = LfpDetector::new(1);
    detector.calibrate(H, &ConnectivitySnapshot::new()).unwrap();
    let lfp = run(&mut detector, &[SpikeEvent::new(3, 1.0, 0)], 2000);

    assert_eq!(lfp[0], 0.0);
    assert!(lfp[1..].iter().all(|&v| v > 0.0));

    let peak = lfp
        .iter()
        .enumerate()
        .fold((0, 0.0), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
    for pair in lfp[peak.0..].windows(2) {
        assert!(pair[1] <= pair[0], "decays monotonically after the peak");
    }
    assert!(lfp[1999] < peak.1 * 1e-30);
}

#[test]
fn test_responses_add_linearly() {
    let build = || primary_only(0.5, 3.0, 1.0);
    let a = run(&mut build(), &[SpikeEvent::new(1, 0.7, 2)], 100);
    let b = run(&mut build(), &[SpikeEvent::new(2, -0.3, 2)], 100);
    let both = run(
        &mut build(),
        &[SpikeEvent::new(1, 0.7, 2), SpikeEvent::new(2, -0.3, 2)],
        100,
    );
    for i in 0..100 {
        assert!((both[i] - (a[i] + b[i])).abs() < 1e-15);
    }
}

#[test]
fn test_multiplicity_scales_amplitude() {
    let single = run(&mut primary_only(0.5, 3.0, 1.0), &[SpikeEvent::new(1, 0.5, 0)], 50);
    let tripled = run(
        &mut primary_only(0.5, 3.0, 1.0),
        &[SpikeEvent::new(1, 0.5, 0).with_multiplicity(3)],
        50,
    );
    for i in 0..50 {
        assert!(close(tripled[i], 3.0 * single[i]));
    }
}

#[test]
fn test_inactive_secondary_stays_zero() {
    let mut detector = primary_only(0.5, 3.0, 1.0);
    run(&mut detector, &[SpikeEvent::new(1, 1.0, 0), SpikeEvent::new(1, 2.0, 4)], 30);
    assert!(detector
        .state()
        .component(KernelComponent::Secondary)
        .iter()
        .all(|&v| v == 0.0));
    assert!(detector.recordable_value("lfp").unwrap() > 0.0);
}

#[test]
fn test_secondary_component_adds_second_kernel() {
    let mut detector = LfpDetector::new(1);
    detector
        .set_status(
            &ParameterUpdate::new()
                .with_primary(vec![0.5], vec![3.0], vec![1.0])
                .with_secondary(vec![1.0], vec![8.0], vec![-0.25]),
        )
        .unwrap();
    detector.calibrate(H, &ConnectivitySnapshot::new()).unwrap();
    let lfp = run(&mut detector, &[SpikeEvent::new(1, 2.0, 0)], 100);

    for k in 1..100 {
        let t = k as f64 * H;
        let expected = beta_kernel(t, 0.5, 3.0, 2.0) + beta_kernel(t, 1.0, 8.0, -0.5);
        assert!((lfp[k] - expected).abs() < 1e-12, "k={k}");
    }
}

#[test]
fn test_time_axis_follows_resolution() {
    let mut detector = LfpDetector::new(1);
    detector.calibrate(0.25, &ConnectivitySnapshot::new()).unwrap();
    let mut recorder = MemoryRecorder::new();
    detector.update(0..4, &mut recorder).unwrap();
    let times: Vec<f64> = recorder.samples().iter().map(|s| s.time_ms).collect();
    assert_eq!(times, vec![0.0, 0.25, 0.5, 0.75]);
}
