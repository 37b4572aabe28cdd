// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks simulation and integrator settings for sane ranges. The detector
//! parameter arrays are validated by the detector itself when applied, since
//! their rules depend on the previously committed parameter set.

use crate::{ConfigError, ConfigResult, LfpConfig, LOG_LEVELS};
use core::fmt;

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::{format, string::String, string::ToString, vec::Vec};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - A finite, positive simulation resolution
/// - A non-zero step count and parallel threshold
/// - A known log level
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &LfpConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_simulation(config, &mut errors);
    validate_detector_arrays(config, &mut errors);
    validate_integrator(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_simulation(config: &LfpConfig, errors: &mut Vec<ConfigValidationError>) {
    let h = config.simulation.resolution_ms;
    if !h.is_finite() || h <= 0.0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simulation.resolution_ms".to_string(),
            reason: "must be a finite positive number".to_string(),
        });
    }

    if config.simulation.steps == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simulation.steps".to_string(),
            reason: "must be positive".to_string(),
        });
    }
}

fn validate_detector_arrays(config: &LfpConfig, errors: &mut Vec<ConfigValidationError>) {
    // Only presence is checked here; consistency rules live in the detector.
    if config.detector.tau_rise.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "detector.tau_rise".to_string(),
        });
    }
    if config.detector.tau_decay.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "detector.tau_decay".to_string(),
        });
    }
    if config.detector.normalizer.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "detector.normalizer".to_string(),
        });
    }
}

fn validate_integrator(config: &LfpConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.integrator.parallel_threshold == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "integrator.parallel_threshold".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
}

fn validate_logging(config: &LfpConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("must be one of {}", LOG_LEVELS.join(", ")),
        });
    }
}
