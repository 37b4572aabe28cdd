// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Kernel Fit Import
//!
//! Reads kernels fitted offline to recorded LFP responses and turns one
//! channel of them into a parameter update.
//!
//! File layout: `channel -> pre layer -> post layer -> fit`, where a fit
//! describes `n * (exp(-a t) - exp(-b t)) / (b - a)` plus an optional second
//! term with `a2`, `b2`, `deta02`. Rates map to time constants as
//! `tau_decay = 1/a` and `tau_rise = 1/b`; `deta0` is the normalizer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::KernelFitError;
use crate::params::{DetectorParameters, ParameterUpdate};

/// One fitted pre -> post kernel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelFit {
    pub a: f64,
    pub b: f64,
    pub deta0: f64,
    #[serde(default)]
    pub a2: f64,
    #[serde(default)]
    pub b2: f64,
    #[serde(default)]
    pub deta02: f64,
}

type LayerFits = BTreeMap<String, BTreeMap<String, KernelFit>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KernelFitSet {
    channels: BTreeMap<String, LayerFits>,
}

impl KernelFitSet {
    pub fn from_json_str(json: &str) -> Result<Self, KernelFitError> {
        serde_json::from_str(json).map_err(|e| KernelFitError::Parse(e.to_string()))
    }

    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Pre-synaptic layer names of `channel`, sorted
    pub fn layers(&self, channel: &str) -> Result<Vec<&str>, KernelFitError> {
        let fits = self.channel(channel)?;
        Ok(fits.keys().map(String::as_str).collect())
    }

    pub fn fit(&self, channel: &str, pre: &str, post: &str) -> Result<&KernelFit, KernelFitError> {
        self.channel(channel)?
            .get(pre)
            .and_then(|posts| posts.get(post))
            .ok_or_else(|| KernelFitError::MissingPair {
                pre: pre.to_string(),
                post: post.to_string(),
            })
    }

    /// Full update for `channel` with `layers` as populations, in that order
    ///
    /// Receptor `pre * P + post` gets the `layers[pre] -> layers[post]` fit.
    /// Secondary terms with `deta02 == 0` stay inactive; their taus fall back
    /// to the defaults when the fitted rates are zero.
    pub fn parameters_for_channel(&self, channel: &str, layers: &[&str]) -> Result<ParameterUpdate, KernelFitError> {
        if layers.is_empty() {
            return Err(KernelFitError::NoLayers);
        }
        let defaults = DetectorParameters::default();
        let n = layers.len() * layers.len();

        let mut tau_rise = Vec::with_capacity(n);
        let mut tau_decay = Vec::with_capacity(n);
        let mut normalizer = Vec::with_capacity(n);
        let mut tau_rise2 = Vec::with_capacity(n);
        let mut tau_decay2 = Vec::with_capacity(n);
        let mut normalizer2 = Vec::with_capacity(n);

        for pre in layers {
            for post in layers {
                let fit = self.fit(channel, pre, post)?;
                let rate = |value: f64, field: &'static str| {
                    if value == 0.0 {
                        Err(KernelFitError::ZeroRate {
                            pre: pre.to_string(),
                            post: post.to_string(),
                            field,
                        })
                    } else {
                        Ok(1.0 / value)
                    }
                };

                tau_decay.push(rate(fit.a, "a")?);
                tau_rise.push(rate(fit.b, "b")?);
                normalizer.push(fit.deta0);

                if fit.deta02 != 0.0 {
                    tau_decay2.push(rate(fit.a2, "a2")?);
                    tau_rise2.push(rate(fit.b2, "b2")?);
                } else {
                    tau_decay2.push(if fit.a2 != 0.0 { 1.0 / fit.a2 } else { defaults.tau_decay2_at(0) });
                    tau_rise2.push(if fit.b2 != 0.0 { 1.0 / fit.b2 } else { defaults.tau_rise2_at(0) });
                }
                normalizer2.push(fit.deta02);
            }
        }

        debug!(
            "[LFP-FIT] channel {} -> {} receptors over {} layers",
            channel,
            n,
            layers.len()
        );

        Ok(ParameterUpdate::new()
            .with_primary(tau_rise, tau_decay, normalizer)
            .with_secondary(tau_rise2, tau_decay2, normalizer2))
    }

    fn channel(&self, channel: &str) -> Result<&LayerFits, KernelFitError> {
        self.channels
            .get(channel)
            .ok_or_else(|| KernelFitError::UnknownChannel(channel.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FITS: &str = r#"{
        "0": {
            "L4E": {
                "L4E": {"a": 0.5, "b": 2.0, "deta0": 0.001, "a2": 0.5, "b2": 1.0, "deta02": 0.0},
                "L4I": {"a": 0.25, "b": 4.0, "deta0": -0.002, "a2": 0.1, "b2": 0.2, "deta02": 0.0005}
            },
            "L4I": {
                "L4E": {"a": 1.0, "b": 5.0, "deta0": 0.003, "a2": 0.0, "b2": 0.0, "deta02": 0.0},
                "L4I": {"a": 0.2, "b": 0.8, "deta0": 0.004, "a2": 0.5, "b2": 1.0, "deta02": 0.0}
            }
        }
    }"#;

    #[test]
    fn test_channel_to_parameters() {
        let fits = KernelFitSet::from_json_str(FITS).unwrap();
        assert_eq!(fits.channels().collect::<Vec<_>>(), vec!["0"]);
        assert_eq!(fits.layers("0").unwrap(), vec!["L4E", "L4I"]);

        let update = fits.parameters_for_channel("0", &["L4E", "L4I"]).unwrap();
        assert_eq!(update.tau_decay, Some(vec![2.0, 4.0, 1.0, 5.0]));
        assert_eq!(update.tau_rise, Some(vec![0.5, 0.25, 0.2, 1.25]));
        assert_eq!(update.normalizer, Some(vec![0.001, -0.002, 0.003, 0.004]));
        assert_eq!(update.normalizer2, Some(vec![0.0, 0.0005, 0.0, 0.0]));
        assert_eq!(update.tau_decay2.as_ref().unwrap()[1], 10.0);
        assert_eq!(update.tau_rise2.as_ref().unwrap()[1], 5.0);

        // Inactive secondary with zero rates falls back to defaults
        let defaults = DetectorParameters::default();
        assert_eq!(update.tau_rise2.as_ref().unwrap()[2], defaults.tau_rise2_at(0));

        assert!(DetectorParameters::from_update(&update).is_ok());
    }

    #[test]
    fn test_layer_order_defines_receptors() {
        let fits = KernelFitSet::from_json_str(FITS).unwrap();
        let update = fits.parameters_for_channel("0", &["L4I", "L4E"]).unwrap();
        assert_eq!(update.normalizer, Some(vec![0.004, 0.003, -0.002, 0.001]));
    }

    #[test]
    fn test_zero_primary_rate_rejected() {
        let json = r#"{"1": {"A": {"A": {"a": 0.0, "b": 2.0, "deta0": 1.0}}}}"#;
        let fits = KernelFitSet::from_json_str(json).unwrap();
        assert_eq!(
            fits.parameters_for_channel("1", &["A"]),
            Err(KernelFitError::ZeroRate {
                pre: "A".to_string(),
                post: "A".to_string(),
                field: "a",
            })
        );
    }

    #[test]
    fn test_missing_pieces() {
        let fits = KernelFitSet::from_json_str(FITS).unwrap();
        assert_eq!(
            fits.parameters_for_channel("7", &["L4E"]),
            Err(KernelFitError::UnknownChannel("7".to_string()))
        );
        assert!(matches!(
            fits.parameters_for_channel("0", &["L4E", "L5E"]),
            Err(KernelFitError::MissingPair { .. })
        ));
        assert_eq!(fits.parameters_for_channel("0", &[]), Err(KernelFitError::NoLayers));
        assert!(matches!(
            KernelFitSet::from_json_str("{not json"),
            Err(KernelFitError::Parse(_))
        ));
    }
}
