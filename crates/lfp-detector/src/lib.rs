// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # LFP Detector
//!
//! Computes a simulated local field potential from spike events by convolving
//! each spike with a beta (double-exponential) kernel, separately for every
//! source/target population pair, and summing the result per step.
//!
//! ## Pipeline
//! - **Routing**: spikes are mapped to receptors `src_pop * P + tgt_pop`
//!   from population id ranges and a one-shot connectivity query
//! - **Buffering**: weighted amplitudes accumulate per receptor and step
//! - **Integration**: exact two-state recursion per receptor, up to two
//!   kernel components, rayon for large receptor counts
//! - **Output**: summed `G` over every receptor, one sample per step
//!
//! ## Example
//! ```
//! use lfp_detector::{ConnectivitySnapshot, LfpDetector, MemoryRecorder, SpikeEvent};
//!
//! let mut detector = LfpDetector::new(1);
//! detector.calibrate(0.1, &ConnectivitySnapshot::new()).unwrap();
//! detector.handle_spike(&SpikeEvent::new(42, 1.0, 0)).unwrap();
//!
//! let mut recorder = MemoryRecorder::new();
//! detector.update(0..10, &mut recorder).unwrap();
//! assert_eq!(recorder.samples()[0].lfp, 0.0);
//! assert!(recorder.samples()[1].lfp > 0.0);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod connectivity;
pub mod detector;
pub mod error;
pub mod integrator;
pub mod kernel;
pub mod kernel_fit;
pub mod params;
pub mod population;
pub mod recording;
pub mod routing;
pub mod spike_buffer;
pub mod state;
pub mod status;

pub use connectivity::{Connection, ConnectivitySnapshot, ConnectivitySource, NodeId, NodeKind};
pub use detector::{Calibration, LfpDetector};
pub use error::{DetectorError, KernelFitError, ParameterError, Result};
pub use integrator::{StepIntegrator, DEFAULT_PARALLEL_THRESHOLD};
pub use kernel::{beta_kernel, BetaCoefficients, KernelComponent, KernelTable};
pub use kernel_fit::{KernelFit, KernelFitSet};
pub use params::{DetectorParameters, ParameterUpdate};
pub use population::{PopulationBorders, PopulationRange};
pub use recording::{LfpSample, MemoryRecorder, NullSink, Recordable, RecordingSink, RECORDABLES};
pub use routing::{RoutingStats, RoutingTable};
pub use spike_buffer::{SpikeEvent, SpikeInbox};
pub use state::ReceptorStateBank;
pub use status::DetectorStatus;
