/// Log-likelihood values recorded at each taken sample of a chain.
#[derive(Debug, Clone, Default)]
pub struct SampleTrace {
    pub log_likelihoods: Vec<f64>,
}

impl SampleTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, log_likelihood: f64) {
        self.log_likelihoods.push(log_likelihood);
    }

    pub fn n_samples(&self) -> usize {
        self.log_likelihoods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_likelihoods.is_empty()
    }

    /// Largest recorded value
    pub fn best(&self) -> Option<f64> {
        self.log_likelihoods.iter().cloned().reduce(f64::max)
    }

    /// Sample mean (`None` without samples)
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.log_likelihoods.iter().sum::<f64>() / self.n_samples() as f64)
    }

    /// Unbiased sample variance (`None` with fewer than two samples)
    pub fn variance(&self) -> Option<f64> {
        let n = self.n_samples();
        if n < 2 {
            return None;
        }
        let mean = self.mean()?;
        let ss: f64 = self
            .log_likelihoods
            .iter()
            .map(|x| (x - mean) * (x - mean))
            .sum();
        Some(ss / (n - 1) as f64)
    }

    /// Linearly interpolated quantile, `0 <= q <= 1`
    pub fn quantile(&self, q: f64) -> Option<f64> {
        let n = self.n_samples();
        if n == 0 {
            return None;
        }
        let mut vals = self.log_likelihoods.clone();
        vals.sort_unstable_by(|a, b| a.total_cmp(b));

        let idx = (q * (n - 1) as f64).clamp(0.0, (n - 1) as f64);
        let lo = idx.floor() as usize;
        let hi = idx.ceil() as usize;
        if lo == hi {
            Some(vals[lo])
        } else {
            let frac = idx - lo as f64;
            Some(vals[lo] * (1.0 - frac) + vals[hi] * frac)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_trace() {
        let trace = SampleTrace::new();
        assert!(trace.is_empty());
        assert!(trace.mean().is_none());
        assert!(trace.variance().is_none());
        assert!(trace.quantile(0.5).is_none());
        assert!(trace.best().is_none());
    }

    #[test]
    fn test_summaries() {
        let mut trace = SampleTrace::new();
        for x in [-4.0, -1.0, -3.0, -2.0] {
            trace.push(x);
        }
        assert_eq!(trace.n_samples(), 4);
        assert!((trace.mean().unwrap() + 2.5).abs() < 1e-12);
        // deviations 1.5, 1.5, 0.5, 0.5 => ss = 5.0
        assert!((trace.variance().unwrap() - 5.0 / 3.0).abs() < 1e-12);
        assert_eq!(trace.best(), Some(-1.0));
        assert_eq!(trace.quantile(0.0), Some(-4.0));
        assert_eq!(trace.quantile(1.0), Some(-1.0));
        assert!((trace.quantile(0.5).unwrap() + 2.5).abs() < 1e-12);
    }
}
