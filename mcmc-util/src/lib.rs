//! Building blocks shared by the Markov chain Monte Carlo samplers:
//! a seeded random source, convergence criteria over streaming chain
//! summaries, and a trace of sampled log-likelihoods.

/// Reproducible uniform and integer draws
pub mod rng;

/// Capability interface for convergence detection
pub mod traits;

/// Convergence criteria
pub mod convergence;

/// Recorded samples and their summary statistics
pub mod chain;

pub use chain::SampleTrace;
pub use convergence::EntropyConvergenceCriterion;
pub use rng::RandomSource;
pub use traits::ConvergenceCriterion;
