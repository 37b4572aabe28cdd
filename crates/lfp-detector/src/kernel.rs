// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Beta Kernel Coefficients
//!
//! Exact propagator of the two-state linear filter whose impulse response is
//! the beta (difference of exponentials) kernel
//!
//! ```text
//! g(t) = n * td*tr/(td - tr) * (exp(-t/td) - exp(-t/tr))
//! ```
//!
//! Over one step `h`, `(DG, G)` evolves as
//!
//! ```text
//! G'  = P21*DG + P22*G
//! DG' = P11*DG + n*spike
//! ```
//!
//! with `P11 = exp(-h/td)`, `P22 = exp(-h/tr)` and
//! `P21 = td*tr/(td - tr) * (P11 - P22)`.

use serde::Serialize;

use crate::params::DetectorParameters;

/// Which of the two kernel components a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelComponent {
    Primary,
    Secondary,
}

impl KernelComponent {
    pub const ALL: [KernelComponent; 2] = [KernelComponent::Primary, KernelComponent::Secondary];

    pub fn index(self) -> usize {
        match self {
            KernelComponent::Primary => 0,
            KernelComponent::Secondary => 1,
        }
    }
}

/// Propagator coefficients of one receptor, one component
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BetaCoefficients {
    pub p11: f64,
    pub p21: f64,
    pub p22: f64,
}

impl BetaCoefficients {
    /// Coefficients for step `h`; caller guarantees `tau_rise != tau_decay`, both non-zero
    pub fn new(tau_rise: f64, tau_decay: f64, h: f64) -> Self {
        let p11 = (-h / tau_decay).exp();
        let p22 = (-h / tau_rise).exp();
        let p21 = tau_decay * tau_rise / (tau_decay - tau_rise) * (p11 - p22);
        Self { p11, p21, p22 }
    }

    /// All-zero coefficients; the component never carries state
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_disabled(&self) -> bool {
        self.p11 == 0.0 && self.p21 == 0.0 && self.p22 == 0.0
    }
}

/// Continuous beta kernel at `t` ms, zero for negative `t`
pub fn beta_kernel(t: f64, tau_rise: f64, tau_decay: f64, normalizer: f64) -> f64 {
    if t < 0.0 {
        return 0.0;
    }
    normalizer * tau_decay * tau_rise / (tau_decay - tau_rise)
        * ((-t / tau_decay).exp() - (-t / tau_rise).exp())
}

/// Per-receptor coefficients and normalizers for both components
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct KernelTable {
    resolution_ms: f64,
    primary: Vec<BetaCoefficients>,
    secondary: Vec<BetaCoefficients>,
    normalizer: Vec<f64>,
    normalizer2: Vec<f64>,
}

impl KernelTable {
    /// Derive the table for validated `params` at step `h`
    ///
    /// Secondary components with a zero normalizer get disabled coefficients
    /// whatever their taus are.
    pub fn derive(params: &DetectorParameters, h: f64) -> Self {
        let n = params.n_receptors();
        let mut primary = Vec::with_capacity(n);
        let mut secondary = Vec::with_capacity(n);
        let mut normalizer2 = Vec::with_capacity(n);

        for i in 0..n {
            primary.push(BetaCoefficients::new(params.tau_rise()[i], params.tau_decay()[i], h));

            let n2 = params.normalizer2_at(i);
            normalizer2.push(n2);
            secondary.push(if n2 == 0.0 {
                BetaCoefficients::disabled()
            } else {
                BetaCoefficients::new(params.tau_rise2_at(i), params.tau_decay2_at(i), h)
            });
        }

        Self {
            resolution_ms: h,
            primary,
            secondary,
            normalizer: params.normalizer().to_vec(),
            normalizer2,
        }
    }

    pub fn resolution_ms(&self) -> f64 {
        self.resolution_ms
    }

    pub fn n_receptors(&self) -> usize {
        self.primary.len()
    }

    pub fn coefficients(&self, component: KernelComponent) -> &[BetaCoefficients] {
        match component {
            KernelComponent::Primary => &self.primary,
            KernelComponent::Secondary => &self.secondary,
        }
    }

    pub fn normalizers(&self, component: KernelComponent) -> &[f64] {
        match component {
            KernelComponent::Primary => &self.normalizer,
            KernelComponent::Secondary => &self.normalizer2,
        }
    }

    /// Receptors whose secondary component carries state
    pub fn active_secondary(&self) -> usize {
        self.secondary.iter().filter(|c| !c.is_disabled()).count()
    }
}
