//! Convergence criteria for streaming chain summaries.

use crate::traits::ConvergenceCriterion;

/// Entropy-based convergence test.
///
/// The samples are treated as per-observation entropy contributions and
/// averaged. The chain is judged converged when the average moved less than
/// `threshold` since the previous call. The baseline is overwritten on every
/// call, converged or not.
#[derive(Debug, Clone)]
pub struct EntropyConvergenceCriterion {
    threshold: f64,
    last_entropy: Option<f64>,
}

impl EntropyConvergenceCriterion {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            last_entropy: None,
        }
    }

    /// Entropy recorded by the last `check`, if any
    pub fn last_entropy(&self) -> Option<f64> {
        self.last_entropy
    }
}

impl Default for EntropyConvergenceCriterion {
    fn default() -> Self {
        Self::new(1e-3)
    }
}

impl ConvergenceCriterion for EntropyConvergenceCriterion {
    fn check(&mut self, samples: &[f64]) -> bool {
        // an empty window carries no estimate
        if samples.is_empty() {
            self.last_entropy = None;
            return false;
        }

        let entropy = samples.iter().sum::<f64>() / samples.len() as f64;
        let converged = self
            .last_entropy
            .is_some_and(|prev| (entropy - prev).abs() < self.threshold);
        self.last_entropy = Some(entropy);
        converged
    }

    fn report(&self) -> String {
        match self.last_entropy {
            None => "no estimated entropy so far".to_string(),
            Some(h) => format!("estimated entropy of distribution: {}", h),
        }
    }

    fn reset(&mut self) {
        self.last_entropy = None;
    }
}
