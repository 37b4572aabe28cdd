// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Connectivity Queries
//!
//! The detector never holds the host's network graph. At calibration it asks
//! a [`ConnectivitySource`] two batch questions:
//!
//! 1. which nodes project onto the detector, and
//! 2. where those nodes project to.
//!
//! The second answer, filtered to genuine network targets, is what the
//! routing table is built from.

use serde::{Deserialize, Serialize};

/// Host node identifier
pub type NodeId = u64;

/// What kind of node sits at the end of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Simulated neuron with network presence
    Neuron,
    /// Recording or stimulation device
    Device,
    /// Another LFP detector instance
    LfpDetector,
}

impl NodeKind {
    /// Only edges into real neurons say anything about population pairs
    pub fn is_network_target(self) -> bool {
        matches!(self, NodeKind::Neuron)
    }
}

/// One directed edge of the host network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,
    pub target_kind: NodeKind,
}

impl Connection {
    pub fn new(source: NodeId, target: NodeId, target_kind: NodeKind) -> Self {
        Self {
            source,
            target,
            target_kind,
        }
    }
}

/// Host connectivity, queried once per calibration
pub trait ConnectivitySource {
    /// All edges terminating at `target`
    fn connections_to(&self, target: NodeId) -> Vec<Connection>;

    /// All edges originating from any of `sources`
    fn connections_from(&self, sources: &[NodeId]) -> Vec<Connection>;
}

/// In-memory edge list implementing [`ConnectivitySource`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectivitySnapshot {
    connections: Vec<Connection>,
}

impl ConnectivitySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_connections(connections: Vec<Connection>) -> Self {
        Self { connections }
    }

    pub fn connect(&mut self, source: NodeId, target: NodeId, target_kind: NodeKind) -> &mut Self {
        self.connections.push(Connection::new(source, target, target_kind));
        self
    }

    /// Wire every node in `sources` to `detector`
    pub fn record_into(&mut self, sources: impl IntoIterator<Item = NodeId>, detector: NodeId) -> &mut Self {
        for source in sources {
            self.connect(source, detector, NodeKind::LfpDetector);
        }
        self
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl ConnectivitySource for ConnectivitySnapshot {
    fn connections_to(&self, target: NodeId) -> Vec<Connection> {
        self.connections
            .iter()
            .filter(|c| c.target == target)
            .copied()
            .collect()
    }

    fn connections_from(&self, sources: &[NodeId]) -> Vec<Connection> {
        let wanted: ahash::AHashSet<NodeId> = sources.iter().copied().collect();
        self.connections
            .iter()
            .filter(|c| wanted.contains(&c.source))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_queries() {
        let mut snapshot = ConnectivitySnapshot::new();
        snapshot
            .connect(1, 2, NodeKind::Neuron)
            .connect(2, 3, NodeKind::Neuron)
            .connect(4, 2, NodeKind::Neuron)
            .record_into([1, 4], 100);

        let into_detector = snapshot.connections_to(100);
        assert_eq!(into_detector.len(), 2);
        assert!(into_detector.iter().all(|c| c.target_kind == NodeKind::LfpDetector));

        let from_sources = snapshot.connections_from(&[1, 4]);
        // 1->2, 4->2, plus both edges into the detector
        assert_eq!(from_sources.len(), 4);
    }

    #[test]
    fn test_network_target_filter() {
        assert!(NodeKind::Neuron.is_network_target());
        assert!(!NodeKind::Device.is_network_target());
        assert!(!NodeKind::LfpDetector.is_network_target());
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = r#"[{"source": 1, "target": 5, "target_kind": "neuron"},
                       {"source": 1, "target": 9, "target_kind": "lfp_detector"}]"#;
        let snapshot: ConnectivitySnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.connections()[1].target_kind, NodeKind::LfpDetector);
    }
}
