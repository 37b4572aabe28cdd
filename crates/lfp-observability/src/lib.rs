// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # lfp-observability
//!
//! Logging infrastructure shared by the LFP workspace crates, with per-crate
//! debug flag support.
//!
//! ## Features
//! - `file-logging`: per-run log folders with daily rotation (desktop only)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known LFP crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &["lfp", "lfp-config", "lfp-detector", "lfp-observability"];
