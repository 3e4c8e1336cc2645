//! Per-pair score functions.
//!
//! # Score formulas (log-likelihood contribution of one block pair)
//!
//! ```text
//! plain:   score(m, N) = m ln m + (N - m) ln (N - m) - N ln N
//! degree:  score(m, T) = m ln (m / T) - m
//! ```
//!
//! `m` is the observed edge count of the pair. `N` is the number of
//! possible node pairs (plain) and `T` the product of block degree sums
//! (degree-corrected). Both are the profile likelihoods at the maximum
//! likelihood rate, with `0 ln 0 = 0`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Edge model of a block model, fixed when the model is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelVariant {
    /// Bernoulli edges with a density per block pair
    #[default]
    #[serde(rename = "uncorrected")]
    Uncorrected,
    /// Poisson edges with rates scaled by node degrees
    #[serde(rename = "degree")]
    DegreeCorrected,
}

impl ModelVariant {
    /// Score of one block pair with `edge` observed edges out of `total`.
    #[inline]
    pub fn score(&self, edge: f64, total: f64) -> f64 {
        match self {
            ModelVariant::Uncorrected => bernoulli_score(edge, total),
            ModelVariant::DegreeCorrected => poisson_score(edge, total),
        }
    }

    /// Token used on the command line and in model files
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::Uncorrected => "uncorrected",
            ModelVariant::DegreeCorrected => "degree",
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "uncorrected" => Ok(ModelVariant::Uncorrected),
            "degree" => Ok(ModelVariant::DegreeCorrected),
            _ => anyhow::bail!("Unknown model type: {}", s),
        }
    }
}

/// `x ln x`, extended by continuity to `0` for `x <= 0`
#[inline]
pub fn xlogx(x: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else {
        x * x.ln()
    }
}

/// Bernoulli profile log-likelihood of `edge` successes out of `total` pairs.
///
/// Zero when the pair is empty or fully connected.
#[inline]
pub fn bernoulli_score(edge: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    xlogx(edge) + xlogx(total - edge) - xlogx(total)
}

/// Poisson profile log-likelihood of `edge` counts with exposure `total`.
#[inline]
pub fn poisson_score(edge: f64, total: f64) -> f64 {
    if edge <= 0.0 || total <= 0.0 {
        return 0.0;
    }
    edge * (edge / total).ln() - edge
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bernoulli_boundaries() {
        assert_eq!(bernoulli_score(0.0, 0.0), 0.0);
        assert_eq!(bernoulli_score(0.0, 10.0), 0.0);
        assert!(bernoulli_score(10.0, 10.0).abs() < 1e-12);
        assert!(bernoulli_score(5.0, 10.0).is_finite());
    }

    #[test]
    fn test_bernoulli_with_data() {
        // p = 0.25: 2 ln 2 + 6 ln 6 - 8 ln 8 = 2 ln 0.25 + 6 ln 0.75
        let score = bernoulli_score(2.0, 8.0);
        let expected = 2.0 * 0.25_f64.ln() + 6.0 * 0.75_f64.ln();
        assert!(
            (score - expected).abs() < 1e-10,
            "score={}, expected={}",
            score,
            expected
        );
    }

    #[test]
    fn test_bernoulli_prefers_extreme_density() {
        // the profile likelihood is lowest at p = 1/2
        let half = bernoulli_score(5.0, 10.0);
        assert!(bernoulli_score(1.0, 10.0) > half);
        assert!(bernoulli_score(9.0, 10.0) > half);
        assert!(bernoulli_score(0.0, 10.0) > bernoulli_score(1.0, 10.0));
    }

    #[test]
    fn test_poisson_score() {
        assert_eq!(poisson_score(0.0, 4.0), 0.0);
        assert_eq!(poisson_score(3.0, 0.0), 0.0);
        let expected = 3.0 * (3.0_f64 / 12.0).ln() - 3.0;
        assert!((poisson_score(3.0, 12.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_variant_tokens() {
        assert_eq!(
            "uncorrected".parse::<ModelVariant>().unwrap(),
            ModelVariant::Uncorrected
        );
        assert_eq!(
            "degree".parse::<ModelVariant>().unwrap(),
            ModelVariant::DegreeCorrected
        );
        let err = "directed".parse::<ModelVariant>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown model type: directed");
        assert_eq!(ModelVariant::DegreeCorrected.to_string(), "degree");
        assert_eq!(
            serde_json::to_string(&ModelVariant::DegreeCorrected).unwrap(),
            "\"degree\""
        );
    }
}
