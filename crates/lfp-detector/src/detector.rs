// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # LFP Detector
//!
//! The device a host simulator drives. Lifecycle:
//!
//! 1. set parameters (`set_status`), validated atomically
//! 2. `calibrate` with the step size and the host's connectivity
//! 3. deliver spikes through `handle_spike` or a cloned [`SpikeInbox`]
//! 4. `update` over ascending step ranges, one sample per step
//!
//! A committed parameter change drops the calibration, so the detector has
//! to be calibrated again before it can be stepped.

use std::ops::Range;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::connectivity::{ConnectivitySource, NodeId};
use crate::error::{DetectorError, Result};
use crate::integrator::StepIntegrator;
use crate::kernel::KernelTable;
use crate::params::{DetectorParameters, ParameterUpdate};
use crate::recording::{LfpSample, Recordable, RecordingSink, RECORDABLES};
use crate::routing::{RoutingStats, RoutingTable};
use crate::spike_buffer::{SpikeEvent, SpikeInbox};
use crate::state::ReceptorStateBank;
use crate::status::{parse_status_update, DetectorStatus};

/// Everything derived at calibration, swapped in as one value
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    kernels: KernelTable,
    routing: Arc<RoutingTable>,
    stats: RoutingStats,
}

impl Calibration {
    pub fn kernels(&self) -> &KernelTable {
        &self.kernels
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    pub fn stats(&self) -> RoutingStats {
        self.stats
    }

    pub fn resolution_ms(&self) -> f64 {
        self.kernels.resolution_ms()
    }
}

#[derive(Debug)]
pub struct LfpDetector {
    id: NodeId,
    params: DetectorParameters,
    integrator: StepIntegrator,
    calibration: Option<Calibration>,
    state: ReceptorStateBank,
    inbox: SpikeInbox,
    drained: Vec<f64>,
}

impl LfpDetector {
    /// Detector with default parameters; spikes are dropped until it is calibrated
    pub fn new(id: NodeId) -> Self {
        let params = DetectorParameters::default();
        Self {
            id,
            state: ReceptorStateBank::new(params.n_receptors()),
            params,
            integrator: StepIntegrator::default(),
            calibration: None,
            inbox: SpikeInbox::new(RoutingTable::default()),
            drained: Vec::new(),
        }
    }

    pub fn with_parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.integrator = StepIntegrator::new(parallel_threshold);
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parameters(&self) -> &DetectorParameters {
        &self.params
    }

    pub fn n_receptors(&self) -> usize {
        self.params.n_receptors()
    }

    pub fn integrator(&self) -> StepIntegrator {
        self.integrator
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    pub fn state(&self) -> &ReceptorStateBank {
        &self.state
    }

    // ---- status ----

    pub fn get_status(&self) -> DetectorStatus {
        DetectorStatus {
            tau_rise: self.params.tau_rise().to_vec(),
            tau_decay: self.params.tau_decay().to_vec(),
            tau_rise2: self.params.tau_rise2().to_vec(),
            tau_decay2: self.params.tau_decay2().to_vec(),
            normalizer: self.params.normalizer().to_vec(),
            normalizer2: self.params.normalizer2().to_vec(),
            borders: self.params.borders().to_vec(),
            n_receptors: self.params.n_receptors(),
            dg: self.state.dg_sums(),
            g: self.state.g_sums(),
            recordables: RECORDABLES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Validate and commit `update`; on error nothing changes
    pub fn set_status(&mut self, update: &ParameterUpdate) -> Result<()> {
        let candidate = match self.params.apply(update) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("[LFP-PARAMS] Detector {} rejected parameter update: {}", self.id, e);
                return Err(e.into());
            }
        };

        if candidate != self.params {
            debug!(
                "[LFP-PARAMS] Detector {} committed {} receptors, calibration required",
                self.id,
                candidate.n_receptors()
            );
            self.params = candidate;
            self.calibration = None;
        }
        Ok(())
    }

    /// `set_status` from a JSON object of named fields
    pub fn set_status_json(&mut self, status: &Value) -> Result<()> {
        let update = parse_status_update(status).map_err(|e| {
            warn!("[LFP-PARAMS] Detector {} rejected status: {}", self.id, e);
            e
        })?;
        self.set_status(&update)
    }

    // ---- calibration ----

    /// Derive coefficients for step `resolution_ms` and rebuild routing
    ///
    /// State and pending spikes of existing receptors survive; receptors
    /// added since the last calibration start at zero.
    pub fn calibrate(&mut self, resolution_ms: f64, connectivity: &impl ConnectivitySource) -> Result<RoutingStats> {
        if !resolution_ms.is_finite() || resolution_ms <= 0.0 {
            return Err(DetectorError::InvalidResolution(resolution_ms));
        }

        let n = self.params.n_receptors();
        let kernels = KernelTable::derive(&self.params, resolution_ms);

        let (routing, stats) = if self.params.routing_enabled() {
            RoutingTable::build(&self.params.population_borders(), n, self.id, connectivity)
        } else {
            (RoutingTable::disabled(n), RoutingStats::default())
        };
        let routing = Arc::new(routing);

        info!(
            "[LFP-CALIBRATE] Detector {}: {} receptors, {} populations, h={} ms, routing {}",
            self.id,
            n,
            self.params.num_populations(),
            resolution_ms,
            if routing.is_enabled() { "enabled" } else { "disabled" }
        );
        if routing.is_enabled() {
            info!(
                "[LFP-CALIBRATE] Detector {}: {} sources routed out of {} wired",
                self.id,
                routing.routed_sources(),
                stats.detector_sources
            );
            debug!(
                "[LFP-CALIBRATE] Detector {}: {} edges examined, {} routed, {} non-network skipped, {} unresolved skipped",
                self.id,
                stats.edges_examined,
                stats.routed_edges,
                stats.skipped_non_network,
                stats.skipped_unresolved
            );
        }
        if kernels.active_secondary() > 0 {
            debug!(
                "[LFP-CALIBRATE] Detector {}: secondary kernel active on {} receptors",
                self.id,
                kernels.active_secondary()
            );
        }

        self.state.resize(n);
        self.drained.resize(n, 0.0);
        self.inbox.install_routing(Arc::clone(&routing));
        self.calibration = Some(Calibration {
            kernels,
            routing,
            stats,
        });
        Ok(stats)
    }

    // ---- spikes ----

    /// Delivery handle that can be moved to other threads
    pub fn spike_inbox(&self) -> SpikeInbox {
        self.inbox.clone()
    }

    /// Buffer one spike; returns the number of receptors it reached
    pub fn handle_spike(&self, event: &SpikeEvent) -> Result<usize> {
        self.inbox.deliver(event)
    }

    /// Connection-time check of a spike receptor port
    pub fn check_spike_port(&self, port: usize) -> Result<usize> {
        let n_receptors = self.params.n_receptors();
        if port > n_receptors {
            return Err(DetectorError::UnknownReceptor { port, n_receptors });
        }
        Ok(port)
    }

    /// Connection-time check for a recording device asking for `names`
    pub fn check_logging_port(&self, port: usize, names: &[&str]) -> Result<usize> {
        if port != 0 {
            return Err(DetectorError::UnknownReceptor { port, n_receptors: 1 });
        }
        for name in names {
            Recordable::from_name(name)?;
        }
        Ok(0)
    }

    // ---- stepping ----

    /// First step `update` has not integrated yet
    pub fn next_step(&self) -> u64 {
        self.inbox.next_step()
    }

    /// Integrate `steps` in order and hand one sample per step to `sink`
    ///
    /// Spikes due in a gap between the previous range and `steps.start` are
    /// discarded.
    pub fn update(&mut self, steps: Range<u64>, sink: &mut impl RecordingSink) -> Result<()> {
        let calibration = self.calibration.as_ref().ok_or(DetectorError::NotCalibrated)?;
        let next_step = self.inbox.next_step();
        if steps.start < next_step {
            return Err(DetectorError::StepOutOfOrder {
                from: steps.start,
                next_step,
            });
        }

        let h = calibration.resolution_ms();
        for step in steps {
            self.inbox.drain(step, &mut self.drained);
            self.integrator
                .advance(&calibration.kernels, &mut self.state, &self.drained, step);
            sink.record(LfpSample {
                step,
                time_ms: step as f64 * h,
                lfp: self.state.lfp(),
            });
        }
        Ok(())
    }

    /// Current value of a recordable
    pub fn recordable_value(&self, name: &str) -> Result<f64> {
        match Recordable::from_name(name)? {
            Recordable::Lfp => Ok(self.state.lfp()),
        }
    }

    /// Zero every receptor state
    pub fn reset_state(&mut self) {
        self.state.reset();
    }

    /// Drop pending spikes and restart stepping at `step`
    pub fn init_buffers(&mut self, step: u64) {
        self.inbox.reset(step);
    }

    /// Amplitude buffered but not yet integrated
    pub fn pending_amplitude(&self) -> f64 {
        self.inbox.pending_total()
    }
}
