// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! LFP trace tool.
//!
//! Builds a detector from configuration, calibrates it against a connectivity
//! snapshot, feeds it a spike list and prints one JSON sample per step.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use lfp::config::{apply_cli_overrides, apply_environment_overrides, load_config, validate_config, ConfigError, LfpConfig};
use lfp::detector::{ConnectivitySnapshot, KernelFitSet, MemoryRecorder, SpikeEvent};
use lfp::observability::{debug_flags_help, init_console_logging, CrateDebugFlags, LoggingConfig};
use tracing::{info, warn};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: lfp_trace [--config <toml>] [--spikes <json>] [--connectivity <json>] [--steps N]\n\
         \x20                [--resolution-ms H] [--fit <json> --channel <name> --layers <a,b,...>]\n\
         \x20                [--debug-<crate>] [--debug-all]\n\n\
         Defaults:\n\
         - config: $LFP_CONFIG_PATH or lfp_configuration.toml in cwd/parents, else built-in defaults\n\
         - spikes: none\n\
         - connectivity: empty (only relevant when borders are configured)\n"
    );
    eprintln!("{}", debug_flags_help());
    process::exit(2);
}

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    spikes: Option<PathBuf>,
    connectivity: Option<PathBuf>,
    fit: Option<PathBuf>,
    channel: Option<String>,
    layers: Vec<String>,
    overrides: HashMap<String, String>,
    debug_args: Vec<String>,
}

fn parse_args() -> Args {
    let mut parsed = Args::default();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = || args.next().unwrap_or_else(|| usage_and_exit());
        match arg.as_str() {
            "--config" => parsed.config = Some(PathBuf::from(value())),
            "--spikes" => parsed.spikes = Some(PathBuf::from(value())),
            "--connectivity" => parsed.connectivity = Some(PathBuf::from(value())),
            "--fit" => parsed.fit = Some(PathBuf::from(value())),
            "--channel" => parsed.channel = Some(value()),
            "--layers" => parsed.layers = value().split(',').map(|s| s.trim().to_string()).collect(),
            "--steps" => {
                parsed.overrides.insert("steps".to_string(), value());
            }
            "--resolution-ms" => {
                parsed.overrides.insert("resolution_ms".to_string(), value());
            }
            "-h" | "--help" => usage_and_exit(),
            other if other.starts_with("--debug-") => parsed.debug_args.push(other.to_string()),
            _ => usage_and_exit(),
        }
    }
    parsed
}

fn resolve_config(args: &Args) -> Result<LfpConfig> {
    match load_config(args.config.as_deref(), Some(&args.overrides)) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) if args.config.is_none() => {
            let mut config = LfpConfig::default();
            apply_environment_overrides(&mut config);
            apply_cli_overrides(&mut config, &args.overrides);
            validate_config(&config)?;
            Ok(config)
        }
        Err(e) => Err(e.into()),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> Result<()> {
    let args = parse_args();
    let config = resolve_config(&args)?;

    let debug_flags = CrateDebugFlags::from_args(args.debug_args.iter().cloned());
    init_console_logging(&debug_flags, &LoggingConfig::with_level(config.logging.level.clone()))?;

    let mut detector = lfp::build_detector(&config)?;

    if let Some(path) = &args.fit {
        let channel = args.channel.as_deref().unwrap_or_else(|| usage_and_exit());
        let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let fits = KernelFitSet::from_json_str(&content)?;
        let layers: Vec<&str> = if args.layers.is_empty() {
            fits.layers(channel)?
        } else {
            args.layers.iter().map(String::as_str).collect()
        };
        let mut update = fits.parameters_for_channel(channel, &layers)?;
        update.borders = Some(config.detector.borders.clone());
        detector.set_status(&update)?;
        info!("Loaded kernel fits for channel {} ({} layers)", channel, layers.len());
    }

    let connectivity: ConnectivitySnapshot = match &args.connectivity {
        Some(path) => read_json(path)?,
        None => ConnectivitySnapshot::new(),
    };
    let stats = detector.calibrate(config.simulation.resolution_ms, &connectivity)?;
    if detector.parameters().routing_enabled() && stats.routed_edges == 0 {
        warn!("Population borders are set but no edges were routed; every spike will be dropped");
    }

    let spikes: Vec<SpikeEvent> = match &args.spikes {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let delivered = detector.spike_inbox().deliver_all(&spikes)?;
    info!("Delivered {} spikes to {} receptor slots", spikes.len(), delivered);

    let mut recorder = MemoryRecorder::new();
    detector.update(0..config.simulation.steps, &mut recorder)?;

    println!("{}", serde_json::to_string_pretty(recorder.samples())?);
    Ok(())
}
