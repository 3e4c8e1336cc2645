//! Metropolis-Hastings sampler over single-node moves.
//!
//! Each step picks a node uniformly (from all nodes, or from a configured
//! set of free nodes) and a different block uniformly from the remaining
//! K-1. The proposal is symmetric, so the move is accepted with
//! probability `min(1, exp(delta))`.

use crate::blockmodel::Blockmodel;
use crate::error::BlockmodelError;
use mcmc_util::RandomSource;

/// One MCMC transition per [`step`](Self::step) on a borrowed model.
pub struct MetropolisHastingsStrategy<'m> {
    model: &'m mut Blockmodel,
    rng: RandomSource,
    /// Nodes eligible for proposals; `None` means every node
    proposal_nodes: Option<Vec<usize>>,
    step_count: usize,
    accepted_count: usize,
    last_accepted: bool,
}

impl<'m> MetropolisHastingsStrategy<'m> {
    /// Bind a sampler to `model`, drawing randomness from `rng`.
    pub fn new(model: &'m mut Blockmodel, rng: RandomSource) -> Self {
        MetropolisHastingsStrategy {
            model,
            rng,
            proposal_nodes: None,
            step_count: 0,
            accepted_count: 0,
            last_accepted: false,
        }
    }

    /// Bind a different model, returning the previous one.
    ///
    /// The proposal node set is cleared since it referred to the old model.
    pub fn set_model(&mut self, model: &'m mut Blockmodel) -> &'m mut Blockmodel {
        self.proposal_nodes = None;
        std::mem::replace(&mut self.model, model)
    }

    /// Restrict proposals to `nodes`; `None` restores all nodes.
    pub fn set_proposal_nodes(&mut self, nodes: Option<Vec<usize>>) {
        self.proposal_nodes = nodes;
    }

    /// Currently bound model
    pub fn model(&self) -> &Blockmodel {
        self.model
    }

    /// Perform one transition: propose, then accept or reject.
    ///
    /// Without a movable node or with a single block, the step is counted
    /// as a rejected null transition.
    pub fn step(&mut self) -> Result<(), BlockmodelError> {
        self.step_count += 1;
        self.last_accepted = false;

        let k = self.model.num_blocks();
        let n_candidates = match &self.proposal_nodes {
            Some(nodes) => nodes.len(),
            None => self.model.num_nodes(),
        };
        if k < 2 || n_candidates == 0 {
            return Ok(());
        }

        let pick = self.rng.index(n_candidates);
        let node = match &self.proposal_nodes {
            Some(nodes) => nodes[pick],
            None => pick,
        };

        let current = self.model.block_of(node);
        let mut candidate = self.rng.index(k - 1);
        if candidate >= current {
            candidate += 1;
        }

        let delta = self.model.propose_move(node, candidate)?;
        let accept = delta >= 0.0 || self.rng.uniform() < delta.exp();

        if accept {
            self.model.apply_move(node, candidate)?;
            self.accepted_count += 1;
            self.last_accepted = true;
        }

        Ok(())
    }

    /// Number of steps taken so far
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Number of accepted proposals
    pub fn accepted_count(&self) -> usize {
        self.accepted_count
    }

    /// accepted / steps, or `0` before the first step
    pub fn acceptance_ratio(&self) -> f64 {
        if self.step_count == 0 {
            0.0
        } else {
            self.accepted_count as f64 / self.step_count as f64
        }
    }

    /// Whether the most recent step accepted its proposal
    pub fn was_last_proposal_accepted(&self) -> bool {
        self.last_accepted
    }

    /// Random source shared with the driving loop
    pub fn rng_mut(&mut self) -> &mut RandomSource {
        &mut self.rng
    }
}
