// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{validate_config, ConfigError, ConfigResult, LfpConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "lfp_configuration.toml";

/// Find the LFP configuration file
///
/// Search order:
/// 1. `LFP_CONFIG_PATH` environment variable
/// 2. Current working directory: `./lfp_configuration.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("LFP_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by LFP_CONFIG_PATH not found: {}",
                path.display()
            )));
        }
    }

    let mut search_paths = Vec::new();

    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "LFP configuration file '{}' not found in any of these locations:\n{}\n\nSet LFP_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Returns
///
/// Complete `LfpConfig` with all overrides applied and validated
///
/// # Errors
///
/// Returns error if config file is not found, contains invalid TOML, or fails validation
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<LfpConfig> {
    let config_file = if let Some(path) = config_path {
        path.to_path_buf()
    } else {
        find_config_file()?
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: LfpConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    validate_config(&config)?;
    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `LFP_RESOLUTION_MS` -> `simulation.resolution_ms`
/// - `LFP_STEPS` -> `simulation.steps`
/// - `LFP_PARALLEL_THRESHOLD` -> `integrator.parallel_threshold`
/// - `LFP_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut LfpConfig) {
    if let Ok(value) = env::var("LFP_RESOLUTION_MS") {
        if let Ok(h) = value.parse::<f64>() {
            config.simulation.resolution_ms = h;
        }
    }
    if let Ok(value) = env::var("LFP_STEPS") {
        if let Ok(steps) = value.parse::<u64>() {
            config.simulation.steps = steps;
        }
    }
    if let Ok(value) = env::var("LFP_PARALLEL_THRESHOLD") {
        if let Ok(threshold) = value.parse::<usize>() {
            config.integrator.parallel_threshold = threshold;
        }
    }
    if let Ok(value) = env::var("LFP_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"resolution_ms": "0.05", "steps": "200"}`)
pub fn apply_cli_overrides(config: &mut LfpConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("resolution_ms") {
        if let Ok(h) = value.parse::<f64>() {
            config.simulation.resolution_ms = h;
        }
    }
    if let Some(value) = cli_args.get("steps") {
        if let Ok(steps) = value.parse::<u64>() {
            config.simulation.steps = steps;
        }
    }
    if let Some(value) = cli_args.get("parallel_threshold") {
        if let Ok(threshold) = value.parse::<usize>() {
            config.integrator.parallel_threshold = threshold;
        }
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}
