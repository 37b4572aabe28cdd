// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Step Integrator
//!
//! Advances every receptor's `(DG, G)` pair by one step, for both kernel
//! components, from the amplitude drained out of that receptor's buffer.
//!
//! Per receptor and component the order is fixed: `G` is updated from the
//! old `DG`, then `DG` decays and takes the new spike. A spike therefore shows
//! up in `G` one step after it was drained.
//!
//! Receptors are independent, so past `parallel_threshold` receptors the
//! update runs on the rayon pool.

use std::sync::OnceLock;

use rayon::prelude::*;
use tracing::trace;

use crate::kernel::{BetaCoefficients, KernelComponent, KernelTable};
use crate::state::{ReceptorStateBank, STATE_STRIDE};

/// Receptor count from which the update is parallelized
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

/// Per-step tracing, enabled with LFP_TRACE_STEPS=1
fn step_trace_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var("LFP_TRACE_STEPS")
            .ok()
            .as_deref()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepIntegrator {
    parallel_threshold: usize,
}

impl Default for StepIntegrator {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLEL_THRESHOLD)
    }
}

impl StepIntegrator {
    pub fn new(parallel_threshold: usize) -> Self {
        Self {
            parallel_threshold: parallel_threshold.max(1),
        }
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    /// Advance `state` by one step with `spikes[i]` drained for receptor `i`
    ///
    /// `state`, `spikes` and `kernels` must all be sized for the same
    /// receptor count.
    pub fn advance(&self, kernels: &KernelTable, state: &mut ReceptorStateBank, spikes: &[f64], step: u64) {
        let n = kernels.n_receptors();
        debug_assert_eq!(state.n_receptors(), n);
        debug_assert_eq!(spikes.len(), n);

        let c1 = kernels.coefficients(KernelComponent::Primary);
        let c2 = kernels.coefficients(KernelComponent::Secondary);
        let n1 = kernels.normalizers(KernelComponent::Primary);
        let n2 = kernels.normalizers(KernelComponent::Secondary);
        let (primary, secondary) = state.split_mut();

        if n >= self.parallel_threshold {
            primary
                .par_chunks_mut(STATE_STRIDE)
                .zip(secondary.par_chunks_mut(STATE_STRIDE))
                .enumerate()
                .for_each(|(i, (p, s))| {
                    propagate(&c1[i], n1[i], p, spikes[i]);
                    propagate(&c2[i], n2[i], s, spikes[i]);
                });
        } else {
            for (i, (p, s)) in primary
                .chunks_mut(STATE_STRIDE)
                .zip(secondary.chunks_mut(STATE_STRIDE))
                .enumerate()
            {
                propagate(&c1[i], n1[i], p, spikes[i]);
                propagate(&c2[i], n2[i], s, spikes[i]);
            }
        }

        if step_trace_enabled() {
            trace!(
                "[LFP-STEP] step={} receptors={} drained={:.6} lfp={:.9}",
                step,
                n,
                spikes.iter().sum::<f64>(),
                state.lfp()
            );
        }
    }
}

/// One receptor, one component; `pair` is `[DG, G]`
#[inline(always)]
fn propagate(c: &BetaCoefficients, normalizer: f64, pair: &mut [f64], spike: f64) {
    let dg = pair[0];
    pair[1] = c.p21 * dg + c.p22 * pair[1];
    pair[0] = c.p11 * dg + normalizer * spike;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{DetectorParameters, ParameterUpdate};

    fn kernels(n: usize) -> KernelTable {
        let params = DetectorParameters::default()
            .apply(&ParameterUpdate::new().with_primary(vec![0.5; n], vec![3.0; n], vec![1.0; n]))
            .unwrap();
        KernelTable::derive(&params, 0.1)
    }

    #[test]
    fn test_spike_reaches_g_one_step_later() {
        let kernels = kernels(1);
        let mut state = ReceptorStateBank::new(1);
        let integrator = StepIntegrator::default();

        integrator.advance(&kernels, &mut state, &[2.0], 0);
        assert_eq!(state.g(KernelComponent::Primary, 0), 0.0);
        assert_eq!(state.dg(KernelComponent::Primary, 0), 2.0);

        integrator.advance(&kernels, &mut state, &[0.0], 1);
        let c = kernels.coefficients(KernelComponent::Primary)[0];
        assert!((state.g(KernelComponent::Primary, 0) - 2.0 * c.p21).abs() < 1e-15);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let n = 16;
        let kernels = kernels(n);
        let spikes: Vec<f64> = (0..n).map(|i| i as f64 * 0.5).collect();

        let mut sequential = ReceptorStateBank::new(n);
        let mut parallel = ReceptorStateBank::new(n);
        for step in 0..20 {
            let drained = if step % 3 == 0 { spikes.clone() } else { vec![0.0; n] };
            StepIntegrator::new(usize::MAX).advance(&kernels, &mut sequential, &drained, step);
            StepIntegrator::new(1).advance(&kernels, &mut parallel, &drained, step);
        }
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_zero_threshold_clamped() {
        assert_eq!(StepIntegrator::new(0).parallel_threshold(), 1);
    }
}
