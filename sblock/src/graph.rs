//! Immutable undirected graph backed by adjacency lists.
//!
//! Self-loops are allowed: a loop at `v` adds 2 to the degree of `v` and
//! appears once in its adjacency list. The edge relation is a set: `(u, v)`
//! and `(v, u)` name the same edge and may be listed only once.

use crate::error::BlockmodelError;
use std::collections::HashSet;

/// An undirected edge `(u, v)`
pub type Edge = (usize, usize);

/// Undirected graph over nodes `0..n`.
#[derive(Debug, Clone)]
pub struct UndirectedGraph {
    edges: Vec<Edge>,
    adj_list: Vec<Vec<usize>>,
    degree: Vec<usize>,
    self_loops: bool,
}

impl UndirectedGraph {
    /// Build a graph with `n` nodes from an edge list (each edge once).
    pub fn from_edges(n: usize, edges: &[Edge]) -> Result<Self, BlockmodelError> {
        let mut adj_list = vec![Vec::new(); n];
        let mut degree = vec![0; n];
        let mut self_loops = false;
        let mut seen: HashSet<Edge> = HashSet::with_capacity(edges.len());

        for &(u, v) in edges {
            if u >= n || v >= n {
                return Err(BlockmodelError::EdgeOutOfRange { u, v, num_nodes: n });
            }
            if !seen.insert((u.min(v), u.max(v))) {
                return Err(BlockmodelError::DuplicateEdge {
                    u: u.min(v),
                    v: u.max(v),
                });
            }
            if u == v {
                adj_list[u].push(u);
                degree[u] += 2;
                self_loops = true;
            } else {
                adj_list[u].push(v);
                adj_list[v].push(u);
                degree[u] += 1;
                degree[v] += 1;
            }
        }

        Ok(UndirectedGraph {
            edges: edges.to_vec(),
            adj_list,
            degree,
            self_loops,
        })
    }

    /// Number of nodes
    pub fn num_nodes(&self) -> usize {
        self.adj_list.len()
    }

    /// Number of edges (loops included)
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Degree of `v`; a self-loop counts twice
    #[inline]
    pub fn degree(&self, v: usize) -> usize {
        self.degree[v]
    }

    /// Neighbours of `v`, with `v` itself listed once per self-loop
    #[inline]
    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.adj_list[v]
    }

    /// Whether any edge is a self-loop
    pub fn has_self_loops(&self) -> bool {
        self.self_loops
    }

    /// Edge list in insertion order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}
