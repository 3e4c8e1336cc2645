//! Sufficient statistics for the stochastic block model.
//!
//! Tracks the K×K block-pair edge count matrix, block sizes and block
//! volumes (degree sums) needed by both edge models.
//!
//! Supports O(degree) incremental updates when a single node moves, plus
//! full recomputation for periodic recalibration.

use crate::graph::UndirectedGraph;
use crate::model::ModelVariant;

/// Size and degree sum of one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockMass {
    /// Number of nodes
    pub size: f64,
    /// Sum of node degrees
    pub volume: f64,
}

/// Sufficient statistics of a partition.
///
/// All arrays use block indices in `0..k`.
#[derive(Debug, Clone)]
pub struct SufficientStats {
    /// Number of nodes
    pub n: usize,
    /// Number of blocks
    pub k: usize,
    /// K×K edge count matrix, flattened row-major and kept symmetric.
    /// The diagonal holds the number of edges inside a block.
    pub edge_counts: Vec<f64>,
    /// Block sizes
    pub block_size: Vec<f64>,
    /// Block volumes: sum of node degrees in each block
    pub block_volume: Vec<f64>,
    /// Membership: node -> block assignment
    pub membership: Vec<usize>,
    /// Per-node degree
    pub vertex_degree: Vec<f64>,
    /// Whether a node may pair with itself
    pub self_loops: bool,
}

impl SufficientStats {
    /// Build statistics for `labels` over `graph`.
    ///
    /// Without a graph the statistics only count nodes: no edges, zero
    /// degrees.
    pub fn from_graph(graph: Option<&UndirectedGraph>, k: usize, labels: &[usize]) -> Self {
        let n = labels.len();
        let vertex_degree: Vec<f64> = match graph {
            Some(g) => (0..n).map(|v| g.degree(v) as f64).collect(),
            None => vec![0.0; n],
        };

        let mut stats = SufficientStats {
            n,
            k,
            edge_counts: vec![0.0; k * k],
            block_size: vec![0.0; k],
            block_volume: vec![0.0; k],
            membership: labels.to_vec(),
            vertex_degree,
            self_loops: graph.is_some_and(|g| g.has_self_loops()),
        };
        stats.recompute(graph);
        stats
    }

    /// Edge count between blocks `ci` and `cj`.
    #[inline]
    pub fn edge_stat(&self, ci: usize, cj: usize) -> f64 {
        self.edge_counts[ci * self.k + cj]
    }

    /// Size and volume of block `c`
    #[inline]
    pub fn block_mass(&self, c: usize) -> BlockMass {
        BlockMass {
            size: self.block_size[c],
            volume: self.block_volume[c],
        }
    }

    /// The "total" statistic for the pair (ci, cj) in the current state.
    #[inline]
    pub fn total_stat(&self, ci: usize, cj: usize, variant: ModelVariant) -> f64 {
        self.pair_total(ci == cj, self.block_mass(ci), self.block_mass(cj), variant)
    }

    /// The "total" statistic of a pair with the given block masses.
    ///
    /// * Plain model: `size_i * size_j`, or `size * (size - 1) / 2` for a
    ///   self-pair (`size * (size + 1) / 2` when self-loops exist)
    /// * Degree-corrected: `vol_i * vol_j`, or `vol^2 / 2` for a self-pair
    #[inline]
    pub fn pair_total(
        &self,
        same_block: bool,
        a: BlockMass,
        b: BlockMass,
        variant: ModelVariant,
    ) -> f64 {
        match variant {
            ModelVariant::DegreeCorrected => {
                if same_block {
                    a.volume * a.volume / 2.0
                } else {
                    a.volume * b.volume
                }
            }
            ModelVariant::Uncorrected => {
                if same_block {
                    if self.self_loops {
                        a.size * (a.size + 1.0) / 2.0
                    } else {
                        a.size * (a.size - 1.0) / 2.0
                    }
                } else {
                    a.size * b.size
                }
            }
        }
    }

    /// Sum of pair scores over all unordered block pairs.
    pub fn log_likelihood(&self, variant: ModelVariant) -> f64 {
        let mut score = 0.0;
        for ci in 0..self.k {
            for cj in ci..self.k {
                score += variant.score(self.edge_stat(ci, cj), self.total_stat(ci, cj, variant));
            }
        }
        score
    }

    /// Incrementally update statistics when moving `vertex` from `old_c` to `new_c`.
    ///
    /// * `vertex` - The node being moved
    /// * `old_c` - Previous block of the node
    /// * `new_c` - New block of the node
    /// * `neighbors` - Adjacency list of the node (itself once per self-loop)
    pub fn delta_move(&mut self, vertex: usize, old_c: usize, new_c: usize, neighbors: &[usize]) {
        if old_c == new_c {
            return;
        }

        let k = self.k;
        let deg = self.vertex_degree[vertex];

        self.block_size[old_c] -= 1.0;
        self.block_size[new_c] += 1.0;

        self.block_volume[old_c] -= deg;
        self.block_volume[new_c] += deg;

        for &nbr in neighbors {
            if nbr == vertex {
                // a self-loop travels with the node
                self.edge_counts[old_c * k + old_c] -= 1.0;
                self.edge_counts[new_c * k + new_c] += 1.0;
                continue;
            }

            let nc = self.membership[nbr];

            self.edge_counts[old_c * k + nc] -= 1.0;
            if old_c != nc {
                self.edge_counts[nc * k + old_c] -= 1.0;
            }

            self.edge_counts[new_c * k + nc] += 1.0;
            if new_c != nc {
                self.edge_counts[nc * k + new_c] += 1.0;
            }
        }

        self.membership[vertex] = new_c;
    }

    /// Full recomputation of the statistics from the current membership.
    ///
    /// Useful for periodic recalibration against floating-point drift
    /// from many incremental `delta_move` updates.
    pub fn recompute(&mut self, graph: Option<&UndirectedGraph>) {
        let k = self.k;

        self.edge_counts = vec![0.0; k * k];
        self.block_size = vec![0.0; k];
        self.block_volume = vec![0.0; k];

        for v in 0..self.n {
            let c = self.membership[v];
            self.block_size[c] += 1.0;
            self.block_volume[c] += self.vertex_degree[v];
        }

        if let Some(g) = graph {
            for &(i, j) in g.edges() {
                let ci = self.membership[i];
                let cj = self.membership[j];
                self.edge_counts[ci * k + cj] += 1.0;
                if ci != cj {
                    self.edge_counts[cj * k + ci] += 1.0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_graph() -> UndirectedGraph {
        // Triangle: 0-1-2-0, plus edge 3-4 and a bridge 1-3
        // Two natural blocks: {0,1,2} and {3,4}
        UndirectedGraph::from_edges(5, &[(0, 1), (1, 2), (0, 2), (3, 4), (1, 3)]).unwrap()
    }

    #[test]
    fn test_from_graph() {
        let g = simple_graph();
        let labels = vec![0, 0, 0, 1, 1];
        let stats = SufficientStats::from_graph(Some(&g), 2, &labels);

        assert_eq!(stats.block_size, vec![3.0, 2.0]);
        assert_eq!(stats.block_volume, vec![7.0, 3.0]);
        assert_eq!(stats.edge_stat(0, 0), 3.0);
        assert_eq!(stats.edge_stat(1, 1), 1.0);
        assert_eq!(stats.edge_stat(0, 1), 1.0);
        assert_eq!(stats.edge_stat(1, 0), 1.0);

        assert_eq!(stats.total_stat(0, 0, ModelVariant::Uncorrected), 3.0);
        assert_eq!(stats.total_stat(0, 1, ModelVariant::Uncorrected), 6.0);
        assert_eq!(stats.total_stat(0, 0, ModelVariant::DegreeCorrected), 24.5);
        assert_eq!(stats.total_stat(0, 1, ModelVariant::DegreeCorrected), 21.0);
    }

    #[test]
    fn test_without_graph() {
        let stats = SufficientStats::from_graph(None, 3, &[0, 2, 2]);
        assert_eq!(stats.block_size, vec![1.0, 0.0, 2.0]);
        assert!(stats.edge_counts.iter().all(|&e| e == 0.0));
        assert_eq!(stats.log_likelihood(ModelVariant::Uncorrected), 0.0);
    }

    #[test]
    fn test_delta_move_consistency() {
        let g = simple_graph();
        let labels = vec![0, 0, 0, 1, 1];
        let mut stats = SufficientStats::from_graph(Some(&g), 2, &labels);

        stats.delta_move(1, 0, 1, g.neighbors(1));

        let fresh = SufficientStats::from_graph(Some(&g), 2, &stats.membership);
        assert_eq!(stats.edge_counts, fresh.edge_counts);
        assert_eq!(stats.block_size, fresh.block_size);
        assert_eq!(stats.block_volume, fresh.block_volume);
    }

    #[test]
    fn test_delta_move_with_self_loop() {
        let g = UndirectedGraph::from_edges(3, &[(0, 0), (0, 1), (1, 2)]).unwrap();
        let mut stats = SufficientStats::from_graph(Some(&g), 2, &[0, 0, 1]);
        assert!(stats.self_loops);
        assert_eq!(stats.edge_stat(0, 0), 2.0);
        assert_eq!(stats.total_stat(0, 0, ModelVariant::Uncorrected), 3.0);

        stats.delta_move(0, 0, 1, g.neighbors(0));

        let fresh = SufficientStats::from_graph(Some(&g), 2, &[1, 0, 1]);
        assert_eq!(stats.edge_counts, fresh.edge_counts);
        assert_eq!(stats.edge_stat(1, 1), 1.0);
        assert_eq!(stats.block_volume, fresh.block_volume);
    }

    #[test]
    fn test_recompute() {
        let g = simple_graph();
        let mut stats = SufficientStats::from_graph(Some(&g), 2, &[0, 1, 0, 1, 0]);
        let orig_counts = stats.edge_counts.clone();
        stats.recompute(Some(&g));
        assert_eq!(stats.edge_counts, orig_counts);
    }
}
