// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `lfp_configuration.toml`.

use serde::{Deserialize, Serialize};

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::string::{String, ToString};
#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LfpConfig {
    pub simulation: SimulationConfig,
    pub detector: DetectorConfig,
    pub integrator: IntegratorConfig,
    pub logging: LoggingConfig,
}

/// Host simulation settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Step size in ms, same unit as the tau parameters
    pub resolution_ms: f64,
    /// Number of steps the trace tool integrates
    pub steps: u64,
    /// Node id the detector occupies in the connectivity snapshot
    pub detector_id: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            resolution_ms: 0.1,
            steps: 1000,
            detector_id: 0,
        }
    }
}

/// Beta-kernel parameters, one entry per receptor unless noted.
///
/// Field names match the detector's status dictionary.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub tau_rise: Vec<f64>,
    pub tau_decay: Vec<f64>,
    /// Length 1 shares the value across all receptors
    pub tau_rise2: Vec<f64>,
    pub tau_decay2: Vec<f64>,
    pub normalizer: Vec<f64>,
    /// Missing entries are zero, which disables the second kernel
    pub normalizer2: Vec<f64>,
    /// Flat `[min_0, max_0, min_1, max_1, ...]` node id ranges
    pub borders: Vec<u64>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            tau_rise: vec![2.0468],
            tau_decay: vec![2.0456],
            tau_rise2: vec![2.0468],
            tau_decay2: vec![2.0456],
            normalizer: vec![1.58075e-4],
            normalizer2: vec![0.0],
            borders: Vec::new(),
        }
    }
}

/// Step integrator tuning
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IntegratorConfig {
    /// Receptor count from which a step is updated with rayon
    pub parallel_threshold: usize,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 64,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Log levels accepted by `logging.level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
