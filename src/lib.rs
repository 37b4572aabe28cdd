// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # LFP - Local Field Potential Detector
//!
//! Computes a simulated LFP from spike events: each spike is convolved with a
//! beta (double-exponential) kernel chosen by the (source, target) population
//! pair it travels along, and every receptor's response is summed into one
//! value per simulation step.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lfp::prelude::*;
//!
//! let config = load_config(None, None)?;
//! let mut detector = build_detector(&config)?;
//! detector.calibrate(config.simulation.resolution_ms, &ConnectivitySnapshot::new())?;
//!
//! detector.handle_spike(&SpikeEvent::new(42, 1.0, 0))?;
//! let mut recorder = MemoryRecorder::new();
//! detector.update(0..config.simulation.steps, &mut recorder)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: lfp-config                                 │
//! │  (TOML + env + CLI configuration)                       │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Algorithm: lfp-detector                                │
//! │  (kernels, routing, spike buffers, step integration)    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Cross-cutting: lfp-observability                       │
//! │  (tracing subscribers, per-crate debug flags)           │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Feature Flags
//! - **`file-logging`**: per-run log folders with retention cleanup
//!
//! ## License
//!
//! Apache-2.0

pub use lfp_config as config;
pub use lfp_detector as detector;
pub use lfp_observability as observability;

use lfp_config::{DetectorConfig, LfpConfig};
use lfp_detector::{LfpDetector, ParameterUpdate};
use tracing::debug;

/// Parameter update carrying every field of a `[detector]` config section
pub fn parameter_update(config: &DetectorConfig) -> ParameterUpdate {
    ParameterUpdate {
        tau_rise: Some(config.tau_rise.clone()),
        tau_decay: Some(config.tau_decay.clone()),
        tau_rise2: Some(config.tau_rise2.clone()),
        tau_decay2: Some(config.tau_decay2.clone()),
        normalizer: Some(config.normalizer.clone()),
        normalizer2: Some(config.normalizer2.clone()),
        borders: Some(config.borders.clone()),
    }
}

/// Detector configured from `config`, not yet calibrated
pub fn build_detector(config: &LfpConfig) -> lfp_detector::Result<LfpDetector> {
    let mut detector = LfpDetector::new(config.simulation.detector_id)
        .with_parallel_threshold(config.integrator.parallel_threshold);
    detector.set_status(&parameter_update(&config.detector))?;
    debug!(
        "[LFP] Built detector {} with {} receptors (parallel threshold {})",
        detector.id(),
        detector.n_receptors(),
        config.integrator.parallel_threshold
    );
    Ok(detector)
}

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::{build_detector, parameter_update};

    pub use lfp_config::{load_config, LfpConfig};

    pub use lfp_detector::{
        ConnectivitySnapshot, ConnectivitySource, DetectorError, DetectorParameters, KernelFitSet, LfpDetector,
        LfpSample, MemoryRecorder, NodeKind, ParameterUpdate, RecordingSink, SpikeEvent, SpikeInbox,
    };

    pub use lfp_observability::{init_console_logging, parse_debug_flags, CrateDebugFlags};
}
