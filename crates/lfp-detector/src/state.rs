// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Receptor state bank: `(DG, G)` per receptor, one flat array per kernel
//! component, plus the aggregated LFP read out of it.

use crate::kernel::KernelComponent;

/// Number of state values per receptor
pub const STATE_STRIDE: usize = 2;
const DG: usize = 0;
const G: usize = 1;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReceptorStateBank {
    components: [Vec<f64>; 2],
}

impl ReceptorStateBank {
    pub fn new(n_receptors: usize) -> Self {
        Self {
            components: [vec![0.0; STATE_STRIDE * n_receptors], vec![0.0; STATE_STRIDE * n_receptors]],
        }
    }

    pub fn n_receptors(&self) -> usize {
        self.components[0].len() / STATE_STRIDE
    }

    /// Existing receptors keep their state, new ones start at zero
    pub fn resize(&mut self, n_receptors: usize) {
        for values in &mut self.components {
            values.resize(STATE_STRIDE * n_receptors, 0.0);
        }
    }

    pub fn reset(&mut self) {
        for values in &mut self.components {
            values.fill(0.0);
        }
    }

    /// Flat `(DG, G)` pairs of one component
    pub fn component(&self, component: KernelComponent) -> &[f64] {
        &self.components[component.index()]
    }

    pub fn component_mut(&mut self, component: KernelComponent) -> &mut [f64] {
        &mut self.components[component.index()]
    }

    /// Both components mutably, primary first
    pub(crate) fn split_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        let [primary, secondary] = &mut self.components;
        (primary.as_mut_slice(), secondary.as_mut_slice())
    }

    pub fn dg(&self, component: KernelComponent, receptor: usize) -> f64 {
        self.components[component.index()][STATE_STRIDE * receptor + DG]
    }

    pub fn g(&self, component: KernelComponent, receptor: usize) -> f64 {
        self.components[component.index()][STATE_STRIDE * receptor + G]
    }

    /// Per-receptor DG summed over both components
    pub fn dg_sums(&self) -> Vec<f64> {
        self.sums(DG)
    }

    /// Per-receptor G summed over both components
    pub fn g_sums(&self) -> Vec<f64> {
        self.sums(G)
    }

    /// Sum of G over every receptor and both components
    pub fn lfp(&self) -> f64 {
        self.components
            .iter()
            .flat_map(|values| values.iter().skip(G).step_by(STATE_STRIDE))
            .sum()
    }

    fn sums(&self, offset: usize) -> Vec<f64> {
        let [primary, secondary] = &self.components;
        primary
            .chunks_exact(STATE_STRIDE)
            .zip(secondary.chunks_exact(STATE_STRIDE))
            .map(|(p, s)| p[offset] + s[offset])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> ReceptorStateBank {
        let mut bank = ReceptorStateBank::new(2);
        bank.component_mut(KernelComponent::Primary).copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        bank.component_mut(KernelComponent::Secondary).copy_from_slice(&[0.5, 0.25, 0.0, 1.0]);
        bank
    }

    #[test]
    fn test_layout_and_sums() {
        let bank = seeded();
        assert_eq!(bank.n_receptors(), 2);
        assert_eq!(bank.dg(KernelComponent::Primary, 1), 3.0);
        assert_eq!(bank.g(KernelComponent::Secondary, 0), 0.25);
        assert_eq!(bank.dg_sums(), vec![1.5, 3.0]);
        assert_eq!(bank.g_sums(), vec![2.25, 5.0]);
        assert_eq!(bank.lfp(), 7.25);
    }

    #[test]
    fn test_resize_preserves_existing() {
        let mut bank = seeded();
        bank.resize(3);
        assert_eq!(bank.g_sums(), vec![2.25, 5.0, 0.0]);
        bank.resize(1);
        assert_eq!(bank.g_sums(), vec![2.25]);
    }

    #[test]
    fn test_reset_zeroes() {
        let mut bank = seeded();
        bank.reset();
        assert_eq!(bank.lfp(), 0.0);
        assert_eq!(bank.n_receptors(), 2);
    }

    #[test]
    fn test_empty_bank() {
        let bank = ReceptorStateBank::new(0);
        assert_eq!(bank.lfp(), 0.0);
        assert!(bank.g_sums().is_empty());
    }
}
