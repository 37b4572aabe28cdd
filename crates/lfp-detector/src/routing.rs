// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Spike Routing Table
//!
//! Maps a spiking node to the receptors (source population, target
//! population) its spikes feed. Built once per calibration from a
//! connectivity snapshot and never mutated afterwards; a recalibration
//! builds a fresh table.
//!
//! Receptor index for a pair is `source_pop * num_populations + target_pop`.

use ahash::{AHashMap, AHashSet};

use crate::connectivity::{ConnectivitySource, NodeId};
use crate::population::PopulationBorders;

/// Everything goes to receptor 0 when routing is disabled
const FIRST_RECEPTOR: &[usize] = &[0];

/// Counters from one routing table build, for calibration logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutingStats {
    /// Distinct nodes wired into the detector
    pub detector_sources: usize,
    /// Edges returned for those nodes
    pub edges_examined: usize,
    /// Edges that landed in a receptor
    pub routed_edges: usize,
    /// Edges into devices or other detectors
    pub skipped_non_network: usize,
    /// Edges with an endpoint outside every population
    pub skipped_unresolved: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingTable {
    enabled: bool,
    n_receptors: usize,
    receptor_sources: Vec<AHashSet<NodeId>>,
    lookup: AHashMap<NodeId, Vec<usize>>,
}

impl RoutingTable {
    /// Table that sends every spike to receptor 0
    pub fn disabled(n_receptors: usize) -> Self {
        Self {
            enabled: false,
            n_receptors,
            receptor_sources: vec![AHashSet::new(); n_receptors],
            lookup: AHashMap::new(),
        }
    }

    /// Build the table for `detector` from the host's connectivity
    ///
    /// Edge order in the snapshot does not affect the result.
    pub fn build(
        borders: &PopulationBorders,
        n_receptors: usize,
        detector: NodeId,
        connectivity: &impl ConnectivitySource,
    ) -> (Self, RoutingStats) {
        let mut stats = RoutingStats::default();
        let num_populations = borders.len();
        let mut receptor_sources = vec![AHashSet::new(); n_receptors];

        let mut sources: Vec<NodeId> = connectivity
            .connections_to(detector)
            .iter()
            .map(|c| c.source)
            .collect();
        sources.sort_unstable();
        sources.dedup();
        stats.detector_sources = sources.len();

        for edge in connectivity.connections_from(&sources) {
            stats.edges_examined += 1;

            if !edge.target_kind.is_network_target() {
                stats.skipped_non_network += 1;
                continue;
            }

            let receptor = match (
                borders.population_of(edge.source),
                borders.population_of(edge.target),
            ) {
                (Some(source_pop), Some(target_pop)) => source_pop * num_populations + target_pop,
                _ => {
                    stats.skipped_unresolved += 1;
                    continue;
                }
            };

            match receptor_sources.get_mut(receptor) {
                Some(set) => {
                    set.insert(edge.source);
                    stats.routed_edges += 1;
                }
                None => stats.skipped_unresolved += 1,
            }
        }

        // Ascending receptor order per source
        let mut lookup: AHashMap<NodeId, Vec<usize>> = AHashMap::new();
        for (receptor, set) in receptor_sources.iter().enumerate() {
            for &source in set {
                lookup.entry(source).or_default().push(receptor);
            }
        }

        let table = Self {
            enabled: true,
            n_receptors,
            receptor_sources,
            lookup,
        };
        (table, stats)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn n_receptors(&self) -> usize {
        self.n_receptors
    }

    /// Receptors a spike from `sender` is delivered to; empty means dropped
    #[inline]
    pub fn receptors_for(&self, sender: NodeId) -> &[usize] {
        if !self.enabled {
            return if self.n_receptors > 0 { FIRST_RECEPTOR } else { &[] };
        }
        self.lookup.get(&sender).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sources routed into `receptor`
    pub fn sources_of(&self, receptor: usize) -> Option<&AHashSet<NodeId>> {
        self.receptor_sources.get(receptor)
    }

    /// Number of distinct routed sources
    pub fn routed_sources(&self) -> usize {
        self.lookup.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::{ConnectivitySnapshot, NodeKind};

    const DETECTOR: NodeId = 1000;

    /// Populations 0..=9 and 10..=19, every neuron wired to the detector
    fn two_population_snapshot() -> ConnectivitySnapshot {
        let mut snapshot = ConnectivitySnapshot::new();
        snapshot
            .connect(1, 2, NodeKind::Neuron) // pop 0 -> pop 0
            .connect(1, 12, NodeKind::Neuron) // pop 0 -> pop 1
            .connect(11, 3, NodeKind::Neuron) // pop 1 -> pop 0
            .connect(13, 14, NodeKind::Neuron) // pop 1 -> pop 1
            .connect(13, 500, NodeKind::Device)
            .connect(11, 25, NodeKind::Neuron) // target outside populations
            .record_into([1, 11, 13], DETECTOR);
        snapshot
    }

    #[test]
    fn test_build_routes_population_pairs() {
        let borders = PopulationBorders::from_flat(&[0, 9, 10, 19]);
        let (table, stats) = RoutingTable::build(&borders, 4, DETECTOR, &two_population_snapshot());

        assert!(table.is_enabled());
        assert_eq!(table.receptors_for(1), &[0, 1]);
        assert_eq!(table.receptors_for(11), &[2]);
        assert_eq!(table.receptors_for(13), &[3]);
        assert_eq!(table.receptors_for(2), &[] as &[usize]);

        assert_eq!(stats.detector_sources, 3);
        assert_eq!(stats.routed_edges, 4);
        // device edge plus the three edges into the detector itself
        assert_eq!(stats.skipped_non_network, 4);
        assert_eq!(stats.skipped_unresolved, 1);
    }

    #[test]
    fn test_sources_not_wired_to_detector_are_ignored() {
        let borders = PopulationBorders::from_flat(&[0, 9, 10, 19]);
        let mut snapshot = two_population_snapshot();
        snapshot.connect(5, 6, NodeKind::Neuron);
        let (table, _) = RoutingTable::build(&borders, 4, DETECTOR, &snapshot);
        assert!(table.receptors_for(5).is_empty());
    }

    #[test]
    fn test_edges_into_other_detectors_skipped() {
        let borders = PopulationBorders::from_flat(&[0, 9, 10, 19]);
        let mut snapshot = ConnectivitySnapshot::new();
        snapshot.connect(1, 15, NodeKind::LfpDetector).record_into([1], DETECTOR);
        let (table, stats) = RoutingTable::build(&borders, 4, DETECTOR, &snapshot);
        assert_eq!(table.routed_sources(), 0);
        assert_eq!(stats.routed_edges, 0);
    }

    #[test]
    fn test_edge_order_does_not_matter() {
        let borders = PopulationBorders::from_flat(&[0, 9, 10, 19]);
        let snapshot = two_population_snapshot();
        let mut reversed: Vec<_> = snapshot.connections().to_vec();
        reversed.reverse();
        let reversed = ConnectivitySnapshot::from_connections(reversed);

        let (a, _) = RoutingTable::build(&borders, 4, DETECTOR, &snapshot);
        let (b, _) = RoutingTable::build(&borders, 4, DETECTOR, &reversed);
        assert_eq!(a, b);
    }

    #[test]
    fn test_disabled_routes_to_first_receptor() {
        let table = RoutingTable::disabled(4);
        assert!(!table.is_enabled());
        assert_eq!(table.receptors_for(12345), &[0]);
        assert!(RoutingTable::disabled(0).receptors_for(1).is_empty());
    }
}
