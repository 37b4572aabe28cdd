// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Population membership by node id range.

use serde::{Deserialize, Serialize};

use crate::connectivity::NodeId;

/// Inclusive node id range of one population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationRange {
    pub min_id: NodeId,
    pub max_id: NodeId,
}

impl PopulationRange {
    pub fn contains(&self, id: NodeId) -> bool {
        self.min_id <= id && id <= self.max_id
    }
}

/// Ordered population ranges; the ordinal of a range is its population index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationBorders {
    ranges: Vec<PopulationRange>,
}

impl PopulationBorders {
    /// Build from `[min_0, max_0, min_1, max_1, ...]`. A trailing odd value is ignored.
    pub fn from_flat(borders: &[u64]) -> Self {
        let ranges = borders
            .chunks_exact(2)
            .map(|pair| PopulationRange {
                min_id: pair[0],
                max_id: pair[1],
            })
            .collect();
        Self { ranges }
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[PopulationRange] {
        &self.ranges
    }

    /// Population index of `id`, first declared range wins on overlap
    pub fn population_of(&self, id: NodeId) -> Option<usize> {
        self.ranges.iter().position(|range| range.contains(id))
    }
}
