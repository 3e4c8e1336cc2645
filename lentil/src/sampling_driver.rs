//! The sampling run loop: step the chain, take samples at random, and
//! report progress.

use crate::common::*;
use mcmc_util::SampleTrace;
use sblock::MetropolisHastingsStrategy;
use thiserror::Error;

/// Preconditions of a run that cannot be met by the loaded model
#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("Loaded model has no associated graph; cannot start sampling.")]
    GraphRequired,
}

/// Run parameters of the sampling loop.
#[derive(Debug, Clone)]
pub struct SamplingOptions {
    /// Number of samples to take. Default: 1
    pub num_samples: usize,
    /// Probability of taking a sample before each step. Default: 0.01
    pub sampling_prob: f64,
    /// Steps between progress lines. Default: 8192
    pub log_period: usize,
    /// Suppress progress lines. Default: false
    pub quiet: bool,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        SamplingOptions {
            num_samples: 1,
            sampling_prob: 0.01,
            log_period: 8192,
            quiet: false,
        }
    }
}

/// Outcome of one run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps: usize,
    pub samples_taken: usize,
    pub initial_log_likelihood: f64,
    pub best_log_likelihood: f64,
    pub final_log_likelihood: f64,
    pub acceptance_ratio: f64,
    pub trace: SampleTrace,
    /// Outcome of the last convergence check, if any ran
    pub converged: Option<bool>,
}

impl RunSummary {
    fn untouched(log_likelihood: f64) -> Self {
        RunSummary {
            steps: 0,
            samples_taken: 0,
            initial_log_likelihood: log_likelihood,
            best_log_likelihood: log_likelihood,
            final_log_likelihood: log_likelihood,
            acceptance_ratio: 0.0,
            trace: SampleTrace::new(),
            converged: None,
        }
    }
}

/// Feeds per-node entropy estimates of taken samples into a criterion,
/// one window at a time.
struct ConvergenceHook {
    criterion: Box<dyn ConvergenceCriterion>,
    window_size: usize,
    window: Vec<f64>,
}

impl ConvergenceHook {
    fn push(&mut self, value: f64) -> Option<bool> {
        self.window.push(value);
        if self.window.len() < self.window_size {
            return None;
        }
        let converged = self.criterion.check(&self.window);
        debug!(
            "convergence check over {} samples: {} ({})",
            self.window.len(),
            if converged { "converged" } else { "not converged" },
            self.criterion.report()
        );
        self.window.clear();
        Some(converged)
    }
}

pub struct SamplingDriver {
    options: SamplingOptions,
    convergence: Option<ConvergenceHook>,
    proposal_nodes: Option<Vec<usize>>,
}

impl SamplingDriver {
    pub fn new(options: SamplingOptions) -> Self {
        SamplingDriver {
            options,
            convergence: None,
            proposal_nodes: None,
        }
    }

    /// Check `criterion` after every `window_size` (positive) taken samples.
    pub fn with_convergence(
        mut self,
        criterion: Box<dyn ConvergenceCriterion>,
        window_size: usize,
    ) -> Self {
        self.convergence = Some(ConvergenceHook {
            criterion,
            window_size,
            window: Vec::new(),
        });
        self
    }

    /// Only propose moves of `nodes`.
    pub fn with_proposal_nodes(mut self, nodes: Vec<usize>) -> Self {
        self.proposal_nodes = Some(nodes);
        self
    }

    /// Run the chain on `model` until the requested number of samples
    /// has been taken.
    ///
    /// A single-sample run records the initial state without stepping.
    /// More than one sample needs a graph to mix over.
    pub fn run(&mut self, model: &mut Blockmodel, rng: RandomSource) -> anyhow::Result<RunSummary> {
        let num_samples = self.options.num_samples;
        let mut summary = RunSummary::untouched(model.log_likelihood());

        if num_samples == 0 {
            return Ok(summary);
        }

        let sampling_prob = if num_samples == 1 {
            1.0
        } else {
            self.options.sampling_prob
        };

        if !model.has_graph() && num_samples > 1 {
            return Err(SamplingError::GraphRequired.into());
        }

        let log_period = self.options.log_period.max(1);
        let n_nodes = model.num_nodes().max(1) as f64;

        let mut mh = MetropolisHastingsStrategy::new(model, rng);
        if let Some(nodes) = &self.proposal_nodes {
            mh.set_proposal_nodes(Some(nodes.clone()));
        }

        info!(">> starting Markov chain");
        let mut best = summary.initial_log_likelihood;

        loop {
            if mh.rng_mut().uniform() < sampling_prob {
                summary.samples_taken += 1;
                let ll = mh.model().log_likelihood();
                summary.trace.push(ll);
                if let Some(hook) = self.convergence.as_mut() {
                    if let Some(converged) = hook.push(-ll / n_nodes) {
                        summary.converged = Some(converged);
                    }
                }
            }

            if summary.samples_taken >= num_samples {
                break;
            }

            mh.step()?;

            let ll = mh.model().log_likelihood();
            if best < ll {
                best = ll;
            }

            if !self.options.quiet && mh.step_count() % log_period == 0 {
                info!(
                    "[{:>6}] ({:>6}) {:>12.4}\t({:.4})\t{}{:>8.4}",
                    mh.step_count(),
                    summary.samples_taken,
                    ll,
                    best,
                    if mh.was_last_proposal_accepted() { '*' } else { ' ' },
                    mh.acceptance_ratio()
                );
            }
        }

        summary.steps = mh.step_count();
        summary.acceptance_ratio = mh.acceptance_ratio();
        summary.best_log_likelihood = best;
        summary.final_log_likelihood = mh.model().log_likelihood();
        Ok(summary)
    }
}
