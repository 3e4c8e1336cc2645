use thiserror::Error;

/// Everything that can go wrong when building a block model or moving a node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockmodelError {
    /// A model needs at least one block
    #[error("the number of blocks must be positive")]
    NoBlocks,

    /// Block id outside `0..num_blocks`
    #[error("block {block} of node {node} is out of range (number of blocks: {num_blocks})")]
    BlockOutOfRange {
        /// offending node
        node: usize,
        /// requested block
        block: usize,
        /// number of blocks in the model
        num_blocks: usize,
    },

    /// Node id outside `0..num_nodes`
    #[error("node {node} is out of range (number of nodes: {num_nodes})")]
    NodeOutOfRange {
        /// offending node
        node: usize,
        /// number of nodes in the model
        num_nodes: usize,
    },

    /// Moving a node into the block it already belongs to
    #[error("node {node} already belongs to block {block}")]
    NullMove {
        /// node that was asked to move
        node: usize,
        /// its current block
        block: usize,
    },

    /// Partition length differs from the number of graph nodes
    #[error("partition covers {partition} nodes but the graph has {graph}")]
    SizeMismatch {
        /// number of partition entries
        partition: usize,
        /// number of graph nodes
        graph: usize,
    },

    /// A node was never assigned to a block
    #[error("node {0} has no block assignment")]
    MissingNode(usize),

    /// A node was assigned more than once
    #[error("node {0} is assigned to a block more than once")]
    DuplicateNode(usize),

    /// Edge endpoint outside the node range
    #[error("edge ({u}, {v}) refers to a node outside 0..{num_nodes}")]
    EdgeOutOfRange {
        /// first endpoint
        u: usize,
        /// second endpoint
        v: usize,
        /// number of graph nodes
        num_nodes: usize,
    },

    /// The same undirected edge listed twice
    #[error("edge ({u}, {v}) is listed more than once")]
    DuplicateEdge {
        /// smaller endpoint
        u: usize,
        /// larger endpoint
        v: usize,
    },

    /// More blocks than nodes to fill them
    #[error("{num_blocks} blocks cannot be used with {num_nodes} nodes")]
    TooManyBlocks {
        /// requested number of blocks
        num_blocks: usize,
        /// number of nodes in the partition
        num_nodes: usize,
    },

    /// Operation needs a graph but the model has none
    #[error("model has no associated graph")]
    NoGraph,
}
