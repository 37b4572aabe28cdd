// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Detector Parameters
//!
//! Committed parameter set plus the partial update used to change it.
//!
//! Updates are applied to a copy and only returned when the whole candidate
//! passes every consistency rule, so a rejected update leaves the committed
//! set untouched:
//!
//! 1. `tau_rise` and `tau_decay` have equal length
//! 2. the secondary tau arrays have length 1 (shared) or the receptor count
//! 3. a receptor count change supplies `tau_rise` and `tau_decay` together;
//!    checked ahead of rule 2 so a secondary array sized for another
//!    receptor count is reported as an incomplete resize
//! 4. no zero tau, no `tau_rise == tau_decay` (secondary: only where active)
//! 5. `normalizer` matches the receptor count, `normalizer2` matches `tau_rise2`;
//!    an omitted `normalizer2` is only padded when the receptor count changes
//! 6. the receptor count is a perfect square
//! 7. non-empty `borders` holds two values per population

use serde::{Deserialize, Serialize};

use crate::error::ParameterError;
use crate::population::PopulationBorders;

pub const PRIMARY: &str = "primary";
pub const SECONDARY: &str = "secondary";

/// Validated beta-kernel parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectorParameters {
    tau_rise: Vec<f64>,
    tau_decay: Vec<f64>,
    tau_rise2: Vec<f64>,
    tau_decay2: Vec<f64>,
    normalizer: Vec<f64>,
    normalizer2: Vec<f64>,
    borders: Vec<u64>,
}

/// Partial parameter update. `None` keeps the committed value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterUpdate {
    pub tau_rise: Option<Vec<f64>>,
    pub tau_decay: Option<Vec<f64>>,
    pub tau_rise2: Option<Vec<f64>>,
    pub tau_decay2: Option<Vec<f64>>,
    pub normalizer: Option<Vec<f64>>,
    pub normalizer2: Option<Vec<f64>>,
    pub borders: Option<Vec<u64>>,
}

impl ParameterUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary kernel for every receptor; the usual way to resize the detector
    pub fn with_primary(mut self, tau_rise: Vec<f64>, tau_decay: Vec<f64>, normalizer: Vec<f64>) -> Self {
        self.tau_rise = Some(tau_rise);
        self.tau_decay = Some(tau_decay);
        self.normalizer = Some(normalizer);
        self
    }

    pub fn with_secondary(mut self, tau_rise2: Vec<f64>, tau_decay2: Vec<f64>, normalizer2: Vec<f64>) -> Self {
        self.tau_rise2 = Some(tau_rise2);
        self.tau_decay2 = Some(tau_decay2);
        self.normalizer2 = Some(normalizer2);
        self
    }

    pub fn with_borders(mut self, borders: Vec<u64>) -> Self {
        self.borders = Some(borders);
        self
    }

    fn touches_tau(&self) -> bool {
        self.tau_rise.is_some()
            || self.tau_decay.is_some()
            || self.tau_rise2.is_some()
            || self.tau_decay2.is_some()
    }
}

impl Default for DetectorParameters {
    fn default() -> Self {
        Self {
            tau_rise: vec![2.0468],        // ms
            tau_decay: vec![2.0456],       // ms
            tau_rise2: vec![2.0468],       // ms
            tau_decay2: vec![2.0456],      // ms
            normalizer: vec![1.58075e-4],  // mV / ms
            normalizer2: vec![0.0],        // mV / ms
            borders: Vec::new(),
        }
    }
}

impl DetectorParameters {
    /// Defaults with `update` applied on top
    pub fn from_update(update: &ParameterUpdate) -> Result<Self, ParameterError> {
        Self::default().apply(update)
    }

    /// Validate `update` against this parameter set and return the new set
    pub fn apply(&self, update: &ParameterUpdate) -> Result<Self, ParameterError> {
        let previous = self.n_receptors();
        let mut candidate = self.clone();

        if let Some(v) = &update.tau_rise {
            candidate.tau_rise = v.clone();
        }
        if let Some(v) = &update.tau_decay {
            candidate.tau_decay = v.clone();
        }
        if let Some(v) = &update.tau_rise2 {
            candidate.tau_rise2 = v.clone();
        }
        if let Some(v) = &update.tau_decay2 {
            candidate.tau_decay2 = v.clone();
        }

        let receptors = candidate.tau_rise.len();

        if candidate.tau_decay.len() != receptors {
            return Err(ParameterError::TauLengthMismatch {
                tau_rise: receptors,
                tau_decay: candidate.tau_decay.len(),
            });
        }

        let rise2 = candidate.tau_rise2.len();
        let decay2 = candidate.tau_decay2.len();

        if update.touches_tau() && (update.tau_rise.is_none() || update.tau_decay.is_none()) {
            // Primary length is unchanged here (rule 1), so only a full-length
            // secondary array can ask for another receptor count
            if let Some(requested) = [rise2, decay2].into_iter().find(|&len| len > 1 && len != previous) {
                return Err(ParameterError::ReceptorCountChangeIncomplete { previous, requested });
            }
        }

        let rise2_ok = if rise2 > 1 {
            rise2 == receptors && decay2 == receptors
        } else {
            rise2 == 1
        };
        if !rise2_ok || !is_shared_or_full(decay2, receptors) {
            return Err(ParameterError::SecondaryTauLengthMismatch {
                receptors,
                tau_rise2: rise2,
                tau_decay2: decay2,
            });
        }

        for i in 0..receptors {
            check_kernel(candidate.tau_rise[i], candidate.tau_decay[i], i, PRIMARY)?;
        }

        if let Some(v) = &update.normalizer {
            candidate.normalizer = v.clone();
        }
        if candidate.normalizer.len() != receptors {
            return Err(ParameterError::NormalizerLengthMismatch {
                normalizer: candidate.normalizer.len(),
                receptors,
            });
        }

        match &update.normalizer2 {
            Some(v) => {
                if v.len() != rise2 && v.len() != receptors {
                    return Err(ParameterError::SecondaryNormalizerLengthMismatch {
                        normalizer2: v.len(),
                        tau_rise2: rise2,
                    });
                }
                candidate.normalizer2 = v.clone();
            }
            None => {
                // Length 1 over several receptors is shared and stays shared
                let shared = candidate.normalizer2.len() == 1 && previous > 1;
                if receptors != previous && !shared {
                    candidate.normalizer2.resize(receptors, 0.0);
                }
            }
        }

        for i in 0..receptors {
            if candidate.normalizer2_at(i) != 0.0 {
                check_kernel(candidate.tau_rise2_at(i), candidate.tau_decay2_at(i), i, SECONDARY)?;
            }
        }

        let populations =
            exact_sqrt(receptors).ok_or(ParameterError::NonSquareReceptorCount { receptors })?;

        if let Some(v) = &update.borders {
            candidate.borders = v.clone();
        }
        if !candidate.borders.is_empty() && candidate.borders.len() != 2 * populations {
            return Err(ParameterError::BorderCountMismatch {
                borders: candidate.borders.len(),
                populations,
                expected: 2 * populations,
            });
        }

        Ok(candidate)
    }

    /// Number of receptor ports, one per (source, target) population pair
    pub fn n_receptors(&self) -> usize {
        self.tau_rise.len()
    }

    /// Square root of the receptor count
    pub fn num_populations(&self) -> usize {
        // Validated on every commit
        exact_sqrt(self.n_receptors()).unwrap_or(0)
    }

    pub fn tau_rise(&self) -> &[f64] {
        &self.tau_rise
    }

    pub fn tau_decay(&self) -> &[f64] {
        &self.tau_decay
    }

    pub fn tau_rise2(&self) -> &[f64] {
        &self.tau_rise2
    }

    pub fn tau_decay2(&self) -> &[f64] {
        &self.tau_decay2
    }

    pub fn normalizer(&self) -> &[f64] {
        &self.normalizer
    }

    pub fn normalizer2(&self) -> &[f64] {
        &self.normalizer2
    }

    pub fn borders(&self) -> &[u64] {
        &self.borders
    }

    /// Population ranges described by `borders`
    pub fn population_borders(&self) -> PopulationBorders {
        PopulationBorders::from_flat(&self.borders)
    }

    /// Routing is only active when population borders are given
    pub fn routing_enabled(&self) -> bool {
        !self.borders.is_empty()
    }

    pub fn tau_rise2_at(&self, receptor: usize) -> f64 {
        shared_at(&self.tau_rise2, receptor)
    }

    pub fn tau_decay2_at(&self, receptor: usize) -> f64 {
        shared_at(&self.tau_decay2, receptor)
    }

    /// Effective secondary normalizer; zero disables the secondary kernel
    pub fn normalizer2_at(&self, receptor: usize) -> f64 {
        shared_at(&self.normalizer2, receptor)
    }
}

fn check_kernel(tau_rise: f64, tau_decay: f64, receptor: usize, component: &'static str) -> Result<(), ParameterError> {
    if tau_rise == 0.0 || tau_decay == 0.0 {
        return Err(ParameterError::ZeroTau { receptor, component });
    }
    if tau_rise == tau_decay {
        return Err(ParameterError::DegenerateKernel { receptor, component });
    }
    Ok(())
}

fn is_shared_or_full(len: usize, receptors: usize) -> bool {
    len == 1 || len == receptors
}

/// Length-1 arrays are shared by every receptor
fn shared_at(values: &[f64], receptor: usize) -> f64 {
    match values {
        [shared] => *shared,
        _ => values.get(receptor).copied().unwrap_or(0.0),
    }
}

/// Integer square root, `None` when `n` is not a perfect square
pub fn exact_sqrt(n: usize) -> Option<usize> {
    let mut root = (n as f64).sqrt() as usize;
    // Correct float rounding for large n
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    (root * root == n).then_some(root)
}
