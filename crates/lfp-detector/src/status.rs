// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Status Marshalling
//!
//! Named-field view of a detector for hosts that drive it through property
//! dictionaries. Reads produce a [`DetectorStatus`]; writes accept a JSON
//! object whose keys are checked against the writable fields before the
//! values are handed to parameter validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DetectorError, Result};
use crate::params::ParameterUpdate;

/// Fields a status update may set
pub const WRITABLE_FIELDS: &[&str] = &[
    "tau_rise",
    "tau_decay",
    "tau_rise2",
    "tau_decay2",
    "normalizer",
    "normalizer2",
    "borders",
];

/// Fields reported by `get_status` but never written
pub const READ_ONLY_FIELDS: &[&str] = &["n_receptors", "dg", "g", "recordables"];

/// Snapshot of parameters and state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorStatus {
    pub tau_rise: Vec<f64>,
    pub tau_decay: Vec<f64>,
    pub tau_rise2: Vec<f64>,
    pub tau_decay2: Vec<f64>,
    pub normalizer: Vec<f64>,
    pub normalizer2: Vec<f64>,
    pub borders: Vec<u64>,
    pub n_receptors: usize,
    /// Per-receptor DG, summed over both components
    pub dg: Vec<f64>,
    /// Per-receptor G, summed over both components
    pub g: Vec<f64>,
    pub recordables: Vec<String>,
}

impl DetectorStatus {
    pub fn to_json(&self) -> Value {
        // Plain numeric fields always serialize
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Turn a JSON status object into a parameter update
///
/// Every key is checked first, so an unknown or read-only key rejects the
/// whole object.
pub fn parse_status_update(status: &Value) -> Result<ParameterUpdate> {
    let object = status
        .as_object()
        .ok_or_else(|| DetectorError::MalformedStatus(format!("expected an object, got {status}")))?;

    for key in object.keys() {
        if READ_ONLY_FIELDS.contains(&key.as_str()) {
            return Err(DetectorError::ReadOnlyField(key.clone()));
        }
        if !WRITABLE_FIELDS.contains(&key.as_str()) {
            return Err(DetectorError::UnknownField(key.clone()));
        }
    }

    serde_json::from_value(status.clone()).map_err(|e| DetectorError::MalformedStatus(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_partial_update() {
        let update = parse_status_update(&json!({"tau_rise": [1.0], "borders": []})).unwrap();
        assert_eq!(update.tau_rise, Some(vec![1.0]));
        assert_eq!(update.borders, Some(vec![]));
        assert_eq!(update.tau_decay, None);
    }

    #[test]
    fn test_read_only_rejected() {
        assert_eq!(
            parse_status_update(&json!({"tau_rise": [1.0], "n_receptors": 4})),
            Err(DetectorError::ReadOnlyField("n_receptors".to_string()))
        );
        assert!(matches!(
            parse_status_update(&json!({"g": [0.0]})),
            Err(DetectorError::ReadOnlyField(_))
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert_eq!(
            parse_status_update(&json!({"tau_syn": [1.0]})),
            Err(DetectorError::UnknownField("tau_syn".to_string()))
        );
    }

    #[test]
    fn test_malformed_values() {
        assert!(matches!(
            parse_status_update(&json!({"tau_rise": "fast"})),
            Err(DetectorError::MalformedStatus(_))
        ));
        assert!(matches!(
            parse_status_update(&json!([1, 2])),
            Err(DetectorError::MalformedStatus(_))
        ));
        assert!(matches!(
            parse_status_update(&json!({"borders": [-1]})),
            Err(DetectorError::MalformedStatus(_))
        ));
    }
}
