// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the LFP detector

use thiserror::Error;

/// Rejection reasons for a parameter update, one per consistency rule.
///
/// A rejected update never touches the committed parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("tau_rise and tau_decay must have the same length (got {tau_rise} and {tau_decay})")]
    TauLengthMismatch { tau_rise: usize, tau_decay: usize },

    #[error(
        "tau_rise2/tau_decay2 must have length 1 or match tau_rise (tau_rise={receptors}, tau_rise2={tau_rise2}, tau_decay2={tau_decay2})"
    )]
    SecondaryTauLengthMismatch {
        receptors: usize,
        tau_rise2: usize,
        tau_decay2: usize,
    },

    #[error("changing the receptor count from {previous} to {requested} requires tau_rise and tau_decay together")]
    ReceptorCountChangeIncomplete { previous: usize, requested: usize },

    #[error("tau constants cannot be zero (receptor {receptor}, {component} kernel)")]
    ZeroTau { receptor: usize, component: &'static str },

    #[error("tau_rise equals tau_decay for receptor {receptor} ({component} kernel)")]
    DegenerateKernel { receptor: usize, component: &'static str },

    #[error("normalizer length {normalizer} does not match the {receptors} tau coefficients")]
    NormalizerLengthMismatch { normalizer: usize, receptors: usize },

    #[error("normalizer2 length {normalizer2} does not match tau_rise2 length {tau_rise2}")]
    SecondaryNormalizerLengthMismatch { normalizer2: usize, tau_rise2: usize },

    #[error("receptor count {receptors} is not a perfect square of the population count")]
    NonSquareReceptorCount { receptors: usize },

    #[error("borders has {borders} values but {populations} populations need {expected}")]
    BorderCountMismatch {
        borders: usize,
        populations: usize,
        expected: usize,
    },
}

/// Detector-level errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectorError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(#[from] ParameterError),

    #[error("receptor port {port} is out of range for {n_receptors} receptors")]
    UnknownReceptor { port: usize, n_receptors: usize },

    #[error("unknown recordable '{0}'")]
    UnknownRecordable(String),

    #[error("status field '{0}' is read-only")]
    ReadOnlyField(String),

    #[error("unknown status field '{0}'")]
    UnknownField(String),

    #[error("malformed status: {0}")]
    MalformedStatus(String),

    #[error("simulation resolution must be finite and positive, got {0}")]
    InvalidResolution(f64),

    #[error("detector must be calibrated before it can be stepped")]
    NotCalibrated,

    #[error("spike for step {step} arrived after the step was integrated (next pending step {next_step})")]
    StaleDelivery { step: u64, next_step: u64 },

    #[error("step range starting at {from} is behind the next pending step {next_step}")]
    StepOutOfOrder { from: u64, next_step: u64 },
}

pub type Result<T> = core::result::Result<T, DetectorError>;

/// Errors importing a fitted kernel file
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelFitError {
    #[error("failed to parse kernel fit file: {0}")]
    Parse(String),

    #[error("channel '{0}' not present in kernel fit file")]
    UnknownChannel(String),

    #[error("no fit for layer pair {pre} -> {post}")]
    MissingPair { pre: String, post: String },

    #[error("fit for {pre} -> {post} has zero rate '{field}'")]
    ZeroRate {
        pre: String,
        post: String,
        field: &'static str,
    },

    #[error("at least one layer is required")]
    NoLayers,
}
