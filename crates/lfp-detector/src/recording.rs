// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Recording of the LFP signal.

use serde::{Deserialize, Serialize};

use crate::error::{DetectorError, Result};

/// Names accepted by `recordable_value` and logging port checks
pub const RECORDABLES: &[&str] = &["lfp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recordable {
    /// Summed G over every receptor and component
    Lfp,
}

impl Recordable {
    pub fn name(self) -> &'static str {
        match self {
            Recordable::Lfp => "lfp",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "lfp" => Ok(Recordable::Lfp),
            other => Err(DetectorError::UnknownRecordable(other.to_string())),
        }
    }
}

/// One output value per integrated step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LfpSample {
    pub step: u64,
    pub time_ms: f64,
    pub lfp: f64,
}

/// Host-side consumer of per-step samples
pub trait RecordingSink {
    fn record(&mut self, sample: LfpSample);
}

impl RecordingSink for Vec<LfpSample> {
    fn record(&mut self, sample: LfpSample) {
        self.push(sample);
    }
}

/// Sink that discards samples; used when only the state matters
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RecordingSink for NullSink {
    fn record(&mut self, _sample: LfpSample) {}
}

/// In-memory recorder with optional capacity bound
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    samples: Vec<LfpSample>,
    capacity: Option<usize>,
    dropped: u64,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` samples; later ones are counted as dropped
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            capacity: Some(capacity),
            dropped: 0,
        }
    }

    pub fn samples(&self) -> &[LfpSample] {
        &self.samples
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.lfp).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.dropped = 0;
    }

    pub fn into_samples(self) -> Vec<LfpSample> {
        self.samples
    }
}

impl RecordingSink for MemoryRecorder {
    fn record(&mut self, sample: LfpSample) {
        match self.capacity {
            Some(limit) if self.samples.len() >= limit => self.dropped += 1,
            _ => self.samples.push(sample),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(step: u64) -> LfpSample {
        LfpSample {
            step,
            time_ms: step as f64 * 0.1,
            lfp: step as f64,
        }
    }

    #[test]
    fn test_recordable_names() {
        assert_eq!(Recordable::from_name("lfp").unwrap(), Recordable::Lfp);
        assert_eq!(Recordable::Lfp.name(), RECORDABLES[0]);
        assert_eq!(
            Recordable::from_name("V_m"),
            Err(DetectorError::UnknownRecordable("V_m".to_string()))
        );
    }

    #[test]
    fn test_memory_recorder_capacity() {
        let mut recorder = MemoryRecorder::with_capacity_limit(2);
        for step in 0..5 {
            recorder.record(sample(step));
        }
        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.dropped(), 3);
        assert_eq!(recorder.values(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_vec_sink() {
        let mut sink: Vec<LfpSample> = Vec::new();
        sink.record(sample(3));
        assert_eq!(sink, vec![sample(3)]);
    }
}
