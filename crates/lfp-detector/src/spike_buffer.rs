// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Spike Buffering
//!
//! Per-receptor accumulators of weighted spike amplitude, keyed by the
//! absolute step the spike is due. Only steps that actually hold a spike are
//! stored, so the delivery horizon does not cost memory. Amplitudes for the
//! same step add up and are drained exactly once, when the integrator reaches
//! that step.
//!
//! [`SpikeInbox`] is the delivery handle. It is `Clone + Send + Sync`, so the
//! host can hand copies to whatever threads deliver events while the step
//! loop owns the detector. Writes for step `t` made before the integrator
//! drains `t` are always seen, because both sides go through the same lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::connectivity::NodeId;
use crate::error::{DetectorError, Result};
use crate::routing::RoutingTable;

/// Spike as delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeEvent {
    pub sender: NodeId,
    pub weight: f64,
    #[serde(default = "default_multiplicity")]
    pub multiplicity: u32,
    /// Absolute step the spike takes effect, delay already applied
    #[serde(alias = "step")]
    pub delivery_step: u64,
}

fn default_multiplicity() -> u32 {
    1
}

impl SpikeEvent {
    pub fn new(sender: NodeId, weight: f64, delivery_step: u64) -> Self {
        Self {
            sender,
            weight,
            multiplicity: 1,
            delivery_step,
        }
    }

    pub fn with_multiplicity(mut self, multiplicity: u32) -> Self {
        self.multiplicity = multiplicity;
        self
    }

    #[inline]
    pub fn amplitude(&self) -> f64 {
        self.weight * f64::from(self.multiplicity)
    }
}

/// Pending amplitudes of one receptor, by absolute step
#[derive(Debug, Clone, Default)]
struct ReceptorBuffer {
    pending: BTreeMap<u64, f64>,
}

impl ReceptorBuffer {
    fn add(&mut self, step: u64, amount: f64) {
        *self.pending.entry(step).or_insert(0.0) += amount;
    }

    /// Take the amount due at `step`, discarding anything earlier
    fn take(&mut self, step: u64) -> f64 {
        let mut taken = 0.0;
        while let Some(entry) = self.pending.first_entry() {
            if *entry.key() > step {
                break;
            }
            let (due, amount) = entry.remove_entry();
            if due == step {
                taken = amount;
            }
        }
        taken
    }
}

/// All receptor buffers, sharing one drain cursor
#[derive(Debug, Clone, Default)]
pub struct SpikeBuffers {
    receptors: Vec<ReceptorBuffer>,
    next_step: u64,
}

impl SpikeBuffers {
    pub fn new(n_receptors: usize) -> Self {
        Self {
            receptors: vec![ReceptorBuffer::default(); n_receptors],
            next_step: 0,
        }
    }

    pub fn n_receptors(&self) -> usize {
        self.receptors.len()
    }

    /// First step not yet drained
    pub fn next_step(&self) -> u64 {
        self.next_step
    }

    /// Keep existing receptors' pending spikes, add empty ones
    pub fn resize(&mut self, n_receptors: usize) {
        self.receptors.resize_with(n_receptors, ReceptorBuffer::default);
    }

    /// Drop every pending spike and restart the cursor at `step`
    pub fn reset(&mut self, step: u64) {
        for buffer in &mut self.receptors {
            buffer.pending.clear();
        }
        self.next_step = step;
    }

    /// Add `amount` at `step` to each of `receptors`
    ///
    /// Checked before any write, so a rejected spike touches nothing.
    pub fn add(&mut self, receptors: &[usize], step: u64, amount: f64) -> Result<()> {
        if step < self.next_step {
            return Err(DetectorError::StaleDelivery {
                step,
                next_step: self.next_step,
            });
        }
        for &receptor in receptors {
            if let Some(buffer) = self.receptors.get_mut(receptor) {
                buffer.add(step, amount);
            }
        }
        Ok(())
    }

    /// Drain `step` into `out` (one slot per receptor) and advance the cursor
    ///
    /// Steps between the cursor and `step` are discarded. Draining a step
    /// that was already drained yields zeros.
    pub fn drain(&mut self, step: u64, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.receptors.len());
        if step < self.next_step {
            out.fill(0.0);
            return;
        }
        for (slot, buffer) in out.iter_mut().zip(self.receptors.iter_mut()) {
            *slot = buffer.take(step);
        }
        self.next_step = step.saturating_add(1);
    }

    /// Total amplitude still pending, over all receptors and steps
    pub fn pending_total(&self) -> f64 {
        self.receptors
            .iter()
            .flat_map(|b| b.pending.values())
            .sum()
    }
}

struct InboxShared {
    routing: RwLock<Arc<RoutingTable>>,
    buffers: Mutex<SpikeBuffers>,
}

/// Shareable spike delivery handle
#[derive(Clone)]
pub struct SpikeInbox {
    shared: Arc<InboxShared>,
}

impl std::fmt::Debug for SpikeInbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let buffers = self.shared.buffers.lock();
        f.debug_struct("SpikeInbox")
            .field("n_receptors", &buffers.n_receptors())
            .field("next_step", &buffers.next_step())
            .finish()
    }
}

impl SpikeInbox {
    pub(crate) fn new(routing: RoutingTable) -> Self {
        let n_receptors = routing.n_receptors();
        Self {
            shared: Arc::new(InboxShared {
                routing: RwLock::new(Arc::new(routing)),
                buffers: Mutex::new(SpikeBuffers::new(n_receptors)),
            }),
        }
    }

    /// Route and buffer one spike
    ///
    /// Returns how many receptors received it. Senders the routing table does
    /// not know are dropped and yield `Ok(0)`.
    pub fn deliver(&self, event: &SpikeEvent) -> Result<usize> {
        let routing = Arc::clone(&self.shared.routing.read());
        let receptors = routing.receptors_for(event.sender);
        if receptors.is_empty() {
            return Ok(0);
        }
        self.shared
            .buffers
            .lock()
            .add(receptors, event.delivery_step, event.amplitude())?;
        Ok(receptors.len())
    }

    /// Deliver a batch under one buffer lock
    ///
    /// Every routed spike is checked against the drain cursor first. If any
    /// of them is stale the whole batch is rejected and nothing is buffered.
    pub fn deliver_all<'a>(&self, events: impl IntoIterator<Item = &'a SpikeEvent>) -> Result<usize> {
        let routing = Arc::clone(&self.shared.routing.read());
        let routed: Vec<(&SpikeEvent, &[usize])> = events
            .into_iter()
            .map(|event| (event, routing.receptors_for(event.sender)))
            .filter(|(_, receptors)| !receptors.is_empty())
            .collect();

        let mut buffers = self.shared.buffers.lock();
        let next_step = buffers.next_step();
        if let Some((stale, _)) = routed.iter().find(|(event, _)| event.delivery_step < next_step) {
            return Err(DetectorError::StaleDelivery {
                step: stale.delivery_step,
                next_step,
            });
        }

        let mut delivered = 0;
        for (event, receptors) in routed {
            buffers.add(receptors, event.delivery_step, event.amplitude())?;
            delivered += receptors.len();
        }
        Ok(delivered)
    }

    /// First step the integrator has not drained yet
    pub fn next_step(&self) -> u64 {
        self.shared.buffers.lock().next_step()
    }

    /// Current routing table
    pub fn routing(&self) -> Arc<RoutingTable> {
        Arc::clone(&self.shared.routing.read())
    }

    /// Swap in a fully built table and size the buffers to match
    pub(crate) fn install_routing(&self, table: Arc<RoutingTable>) {
        let n_receptors = table.n_receptors();
        let mut buffers = self.shared.buffers.lock();
        *self.shared.routing.write() = table;
        buffers.resize(n_receptors);
    }

    pub(crate) fn drain(&self, step: u64, out: &mut [f64]) {
        self.shared.buffers.lock().drain(step, out);
    }

    pub(crate) fn reset(&self, step: u64) {
        self.shared.buffers.lock().reset(step);
    }

    pub(crate) fn pending_total(&self) -> f64 {
        self.shared.buffers.lock().pending_total()
    }
}
