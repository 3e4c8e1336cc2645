//! Block model state: graph, partition, sufficient statistics and the
//! cached log-likelihood, kept consistent across every committed move.

use crate::error::BlockmodelError;
use crate::graph::UndirectedGraph;
use crate::model::ModelVariant;
use crate::sufficient_stats::{BlockMass, SufficientStats};
use mcmc_util::RandomSource;
use std::sync::Arc;

/// Undirected stochastic block model over a fixed graph.
///
/// The graph is optional so a stored model can be inspected without it.
/// In that case no edges are counted, and moves only shift block sizes.
#[derive(Debug, Clone)]
pub struct Blockmodel {
    graph: Option<Arc<UndirectedGraph>>,
    variant: ModelVariant,
    stats: SufficientStats,
    log_likelihood: f64,
}

impl Blockmodel {
    /// Build a model from an explicit partition.
    ///
    /// * `graph` - Graph the partition refers to, if available
    /// * `num_blocks` - Number of blocks K (fixed for the model's lifetime)
    /// * `partition` - Block of each node, in `0..num_blocks`
    /// * `variant` - Edge model
    pub fn new(
        graph: Option<Arc<UndirectedGraph>>,
        num_blocks: usize,
        partition: Vec<usize>,
        variant: ModelVariant,
    ) -> Result<Self, BlockmodelError> {
        if num_blocks == 0 {
            return Err(BlockmodelError::NoBlocks);
        }

        if let Some(g) = graph.as_deref() {
            if g.num_nodes() != partition.len() {
                return Err(BlockmodelError::SizeMismatch {
                    partition: partition.len(),
                    graph: g.num_nodes(),
                });
            }
        }

        // the K x K table must stay addressable; empty partitions allow one block
        if num_blocks > partition.len().max(1) || num_blocks.checked_mul(num_blocks).is_none() {
            return Err(BlockmodelError::TooManyBlocks {
                num_blocks,
                num_nodes: partition.len(),
            });
        }

        if let Some((node, &block)) = partition
            .iter()
            .enumerate()
            .find(|&(_, &b)| b >= num_blocks)
        {
            return Err(BlockmodelError::BlockOutOfRange {
                node,
                block,
                num_blocks,
            });
        }

        let stats = SufficientStats::from_graph(graph.as_deref(), num_blocks, &partition);
        let log_likelihood = stats.log_likelihood(variant);

        Ok(Blockmodel {
            graph,
            variant,
            stats,
            log_likelihood,
        })
    }

    /// Assign every node of `graph` to a uniformly random block.
    pub fn random(
        graph: Arc<UndirectedGraph>,
        num_blocks: usize,
        variant: ModelVariant,
        rng: &mut RandomSource,
    ) -> Result<Self, BlockmodelError> {
        if num_blocks == 0 {
            return Err(BlockmodelError::NoBlocks);
        }
        let partition: Vec<usize> = (0..graph.num_nodes())
            .map(|_| rng.index(num_blocks))
            .collect();
        Self::new(Some(graph), num_blocks, partition, variant)
    }

    /// Cached log-likelihood of the current partition
    #[inline]
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Log-likelihood summed from the statistics, bypassing the cache
    pub fn recompute_log_likelihood(&self) -> f64 {
        self.stats.log_likelihood(self.variant)
    }

    /// Rebuild the statistics and the cached log-likelihood from scratch.
    pub fn recalibrate(&mut self) {
        self.stats.recompute(self.graph.as_deref());
        self.log_likelihood = self.stats.log_likelihood(self.variant);
    }

    /// Log-likelihood change of moving `node` to `new_block`, without
    /// changing any state. `0` when `node` already sits in `new_block`.
    pub fn propose_move(&self, node: usize, new_block: usize) -> Result<f64, BlockmodelError> {
        self.check_move(node, new_block)?;
        let current = self.stats.membership[node];
        if current == new_block {
            return Ok(0.0);
        }
        Ok(self.move_delta(node, current, new_block))
    }

    /// Move `node` to `new_block`, updating the partition, the statistics
    /// and the cached log-likelihood together. Returns the applied delta.
    pub fn apply_move(&mut self, node: usize, new_block: usize) -> Result<f64, BlockmodelError> {
        self.check_move(node, new_block)?;
        let current = self.stats.membership[node];
        if current == new_block {
            return Err(BlockmodelError::NullMove {
                node,
                block: current,
            });
        }

        let delta = self.move_delta(node, current, new_block);
        let neighbors: &[usize] = match self.graph.as_deref() {
            Some(g) => g.neighbors(node),
            None => &[],
        };
        self.stats.delta_move(node, current, new_block, neighbors);
        self.log_likelihood += delta;
        Ok(delta)
    }

    /// Put `node` into `block`, moving it only if needed.
    pub fn assign(&mut self, node: usize, block: usize) -> Result<(), BlockmodelError> {
        self.check_move(node, block)?;
        if self.stats.membership[node] != block {
            self.apply_move(node, block)?;
        }
        Ok(())
    }

    /// Attached graph, if any
    pub fn graph(&self) -> Option<&UndirectedGraph> {
        self.graph.as_deref()
    }

    /// Whether a graph is attached
    pub fn has_graph(&self) -> bool {
        self.graph.is_some()
    }

    /// Edge model
    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    /// Number of nodes
    pub fn num_nodes(&self) -> usize {
        self.stats.n
    }

    /// Number of blocks
    pub fn num_blocks(&self) -> usize {
        self.stats.k
    }

    /// Block of `node`
    ///
    /// # Panics
    ///
    /// If `node` is not below [`Self::num_nodes`].
    #[inline]
    pub fn block_of(&self, node: usize) -> usize {
        self.stats.membership[node]
    }

    /// Node-to-block assignment
    pub fn partition(&self) -> &[usize] {
        &self.stats.membership
    }

    /// Number of nodes in each block
    pub fn block_sizes(&self) -> Vec<usize> {
        self.stats.block_size.iter().map(|&s| s as usize).collect()
    }

    /// Observed edges between blocks `r` and `s`
    ///
    /// # Panics
    ///
    /// If `r` or `s` is not below [`Self::num_blocks`].
    pub fn edge_count(&self, r: usize, s: usize) -> f64 {
        self.stats.edge_stat(r, s)
    }

    /// Possible-pair (or degree product) statistic of blocks `r` and `s`
    ///
    /// Panics like [`Self::edge_count`].
    pub fn possible_pairs(&self, r: usize, s: usize) -> f64 {
        self.stats.total_stat(r, s, self.variant)
    }

    fn check_move(&self, node: usize, block: usize) -> Result<(), BlockmodelError> {
        if node >= self.stats.n {
            return Err(BlockmodelError::NodeOutOfRange {
                node,
                num_nodes: self.stats.n,
            });
        }
        if block >= self.stats.k {
            return Err(BlockmodelError::BlockOutOfRange {
                node,
                block,
                num_blocks: self.stats.k,
            });
        }
        Ok(())
    }

    /// Score change of moving `node` from `src` to `tgt` (`src != tgt`).
    ///
    /// Only pairs touching `src` or `tgt` change. The node's edges are
    /// scanned once to count its links into each block.
    ///
    /// Complexity: O(degree + K).
    fn move_delta(&self, node: usize, src: usize, tgt: usize) -> f64 {
        let stats = &self.stats;
        let k = stats.k;
        let variant = self.variant;

        let mut edge_to_block = vec![0.0f64; k];
        let mut loops = 0.0;
        if let Some(g) = self.graph.as_deref() {
            for &nbr in g.neighbors(node) {
                if nbr == node {
                    loops += 1.0;
                } else {
                    edge_to_block[stats.membership[nbr]] += 1.0;
                }
            }
        }

        let deg = stats.vertex_degree[node];
        let mass_after = |c: usize| -> BlockMass {
            let m = stats.block_mass(c);
            if c == src {
                BlockMass {
                    size: m.size - 1.0,
                    volume: m.volume - deg,
                }
            } else if c == tgt {
                BlockMass {
                    size: m.size + 1.0,
                    volume: m.volume + deg,
                }
            } else {
                m
            }
        };

        // Edge count of the pair (a, b) after the move
        let edge_after = |a: usize, b: usize| -> f64 {
            let e = stats.edge_stat(a, b);
            if a == b {
                if a == src {
                    e - edge_to_block[src] - loops
                } else {
                    e + edge_to_block[tgt] + loops
                }
            } else if (a == src && b == tgt) || (a == tgt && b == src) {
                e - edge_to_block[tgt] + edge_to_block[src]
            } else if a == src {
                e - edge_to_block[b]
            } else if b == src {
                e - edge_to_block[a]
            } else if a == tgt {
                e + edge_to_block[b]
            } else {
                e + edge_to_block[a]
            }
        };

        let pair_delta = |a: usize, b: usize| -> f64 {
            let old_s = variant.score(stats.edge_stat(a, b), stats.total_stat(a, b, variant));
            let new_total = stats.pair_total(a == b, mass_after(a), mass_after(b), variant);
            let new_s = variant.score(edge_after(a, b), new_total);
            new_s - old_s
        };

        let mut delta = 0.0;
        for c in 0..k {
            delta += pair_delta(src, c);
            if c != src {
                delta += pair_delta(tgt, c);
            }
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> Arc<UndirectedGraph> {
        // triangles {0,1,2} and {3,4,5} joined by 2-3
        let edges = [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)];
        Arc::new(UndirectedGraph::from_edges(6, &edges).unwrap())
    }

    #[test]
    fn test_new_validates_blocks() {
        let g = two_triangles();
        let err = Blockmodel::new(
            Some(g.clone()),
            2,
            vec![0, 0, 0, 1, 1, 2],
            ModelVariant::Uncorrected,
        )
        .unwrap_err();
        assert_eq!(
            err,
            BlockmodelError::BlockOutOfRange {
                node: 5,
                block: 2,
                num_blocks: 2
            }
        );

        let err = Blockmodel::new(Some(g), 2, vec![0, 0, 1], ModelVariant::Uncorrected)
            .unwrap_err();
        assert_eq!(
            err,
            BlockmodelError::SizeMismatch {
                partition: 3,
                graph: 6
            }
        );

        let err = Blockmodel::new(None, 0, vec![], ModelVariant::Uncorrected).unwrap_err();
        assert_eq!(err, BlockmodelError::NoBlocks);
    }

    #[test]
    fn test_planted_partition_scores_higher() {
        let g = two_triangles();
        let good = Blockmodel::new(
            Some(g.clone()),
            2,
            vec![0, 0, 0, 1, 1, 1],
            ModelVariant::Uncorrected,
        )
        .unwrap();
        let bad = Blockmodel::new(Some(g), 2, vec![0, 1, 0, 1, 0, 1], ModelVariant::Uncorrected)
            .unwrap();
        assert!(good.log_likelihood() > bad.log_likelihood());
    }

    #[test]
    fn test_propose_move_to_current_block_is_zero() {
        let g = two_triangles();
        for variant in [ModelVariant::Uncorrected, ModelVariant::DegreeCorrected] {
            let model =
                Blockmodel::new(Some(g.clone()), 3, vec![0, 1, 2, 0, 1, 2], variant).unwrap();
            for v in 0..6 {
                let delta = model.propose_move(v, model.block_of(v)).unwrap();
                assert_eq!(delta, 0.0);
            }
        }
    }

    #[test]
    fn test_propose_does_not_mutate() {
        let g = two_triangles();
        let model = Blockmodel::new(
            Some(g),
            2,
            vec![0, 0, 0, 1, 1, 1],
            ModelVariant::DegreeCorrected,
        )
        .unwrap();
        let before = model.log_likelihood();
        let _ = model.propose_move(2, 1).unwrap();
        assert_eq!(model.log_likelihood(), before);
        assert_eq!(model.partition(), &[0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_apply_move_matches_recompute() {
        let g = two_triangles();
        for variant in [ModelVariant::Uncorrected, ModelVariant::DegreeCorrected] {
            let mut model =
                Blockmodel::new(Some(g.clone()), 3, vec![0, 0, 1, 1, 2, 2], variant).unwrap();
            let moves = [(0, 2), (3, 0), (5, 1), (2, 0), (0, 1), (4, 0)];
            for &(v, b) in &moves {
                let before = model.log_likelihood();
                let proposed = model.propose_move(v, b).unwrap();
                let applied = model.apply_move(v, b).unwrap();
                assert!((proposed - applied).abs() < 1e-12);
                assert!((model.log_likelihood() - (before + applied)).abs() < 1e-12);

                let fresh = model.recompute_log_likelihood();
                assert!(
                    (model.log_likelihood() - fresh).abs() < 1e-9,
                    "{:?} move ({}, {}): cached={}, fresh={}",
                    variant,
                    v,
                    b,
                    model.log_likelihood(),
                    fresh
                );
                assert_eq!(model.block_of(v), b);
            }
        }
    }

    #[test]
    fn test_apply_move_errors() {
        let g = two_triangles();
        let mut model = Blockmodel::new(
            Some(g),
            2,
            vec![0, 0, 0, 1, 1, 1],
            ModelVariant::Uncorrected,
        )
        .unwrap();
        let before = model.log_likelihood();

        assert_eq!(
            model.apply_move(0, 0).unwrap_err(),
            BlockmodelError::NullMove { node: 0, block: 0 }
        );
        assert_eq!(
            model.apply_move(0, 2).unwrap_err(),
            BlockmodelError::BlockOutOfRange {
                node: 0,
                block: 2,
                num_blocks: 2
            }
        );
        assert_eq!(
            model.propose_move(6, 1).unwrap_err(),
            BlockmodelError::NodeOutOfRange {
                node: 6,
                num_nodes: 6
            }
        );
        assert_eq!(model.log_likelihood(), before);
        assert_eq!(model.partition(), &[0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_block_count_bounded_by_nodes() {
        let err = Blockmodel::new(Some(two_triangles()), 7, vec![0; 6], ModelVariant::Uncorrected)
            .unwrap_err();
        assert_eq!(
            err,
            BlockmodelError::TooManyBlocks {
                num_blocks: 7,
                num_nodes: 6
            }
        );

        let huge = Blockmodel::new(None, 5_000_000_000, vec![0], ModelVariant::Uncorrected);
        assert!(matches!(
            huge.unwrap_err(),
            BlockmodelError::TooManyBlocks { num_nodes: 1, .. }
        ));

        let empty = Blockmodel::new(None, 1, vec![], ModelVariant::Uncorrected).unwrap();
        assert_eq!(empty.num_nodes(), 0);
        assert!(Blockmodel::new(None, 2, vec![], ModelVariant::Uncorrected).is_err());

        let mut rng = RandomSource::new(1);
        let random = Blockmodel::random(two_triangles(), 10, ModelVariant::Uncorrected, &mut rng);
        assert!(matches!(
            random.unwrap_err(),
            BlockmodelError::TooManyBlocks { num_blocks: 10, .. }
        ));
    }

    #[test]
    #[should_panic]
    fn test_block_of_out_of_range_panics() {
        let model =
            Blockmodel::new(Some(two_triangles()), 2, vec![0, 0, 0, 1, 1, 1], ModelVariant::Uncorrected)
                .unwrap();
        model.block_of(6);
    }

    #[test]
    fn test_model_without_graph() {
        let mut model =
            Blockmodel::new(None, 2, vec![0, 1, 1], ModelVariant::Uncorrected).unwrap();
        assert!(!model.has_graph());
        assert!(model.graph().is_none());
        assert_eq!(model.log_likelihood(), 0.0);
        assert_eq!(model.apply_move(0, 1).unwrap(), 0.0);
        assert_eq!(model.block_sizes(), vec![0, 3]);
    }

    #[test]
    fn test_random_init_and_recalibrate() {
        let g = two_triangles();
        let mut rng = RandomSource::new(11);
        let mut model = Blockmodel::random(g, 3, ModelVariant::DegreeCorrected, &mut rng).unwrap();
        assert_eq!(model.num_nodes(), 6);
        assert!(model.partition().iter().all(|&b| b < 3));
        assert_eq!(model.block_sizes().iter().sum::<usize>(), 6);

        let cached = model.log_likelihood();
        model.recalibrate();
        assert!((model.log_likelihood() - cached).abs() < 1e-12);
    }

    #[test]
    fn test_assign() {
        let g = two_triangles();
        let mut model = Blockmodel::new(
            Some(g),
            2,
            vec![0, 0, 0, 1, 1, 1],
            ModelVariant::Uncorrected,
        )
        .unwrap();
        model.assign(0, 0).unwrap();
        model.assign(3, 0).unwrap();
        assert_eq!(model.block_of(3), 0);
        assert!(model.assign(1, 5).is_err());
    }
}
