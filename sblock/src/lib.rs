//! Stochastic block model (SBM) inference by Metropolis-Hastings sampling.
//!
//! Nodes of an undirected graph are partitioned into a fixed number of
//! blocks. The edge and possible-pair counts of every block pair are kept
//! as sufficient statistics, so a single-node move costs O(degree + K)
//! instead of a rescan of the graph.
//!
//! # Model
//!
//! Bernoulli profile likelihood (plain) or Poisson profile likelihood with
//! degree correction (Karrer & Newman, 2011).

#![deny(missing_docs)]

/// Error types for model construction and moves
pub mod error;

/// Undirected graph with adjacency lists
pub mod graph;

/// Model variants and per-pair score functions
pub mod model;

/// Block-pair sufficient statistics with O(degree) updates
pub mod sufficient_stats;

/// Partition, statistics and cached log-likelihood
pub mod blockmodel;

/// Metropolis-Hastings single-node move sampler
pub mod metropolis;

/// Buffered readers/writers for files and standard streams
pub mod common_io;

/// Model readers and writers (plain text, JSON, null)
pub mod io;


pub use blockmodel::Blockmodel;
pub use error::BlockmodelError;
pub use graph::UndirectedGraph;
pub use metropolis::MetropolisHastingsStrategy;
pub use model::ModelVariant;
