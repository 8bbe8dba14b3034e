//! Greedy regression-tree growth.
//!
//! The grower keeps the set of open (unsplit) leaves, each with a cached
//! best split found by the variance-loss threshold search over every
//! feature. One growth step picks the open leaf whose best split achieves
//! the globally smallest loss, splits exactly that leaf, and opens its two
//! children. Growth stops at the leaf budget, or earlier when no open leaf
//! admits a legal split.

use rayon::prelude::*;

use crate::data::{Document, FeatureSortedDocs};
use crate::repr::tree::{NodeId, RegressionTree, TreeError};

use super::split::{better_candidate, find_split, SplitCandidate, VarianceLoss};

/// Parameters for growing one tree.
#[derive(Debug, Clone)]
pub struct TreeParams {
    /// Target number of terminal leaves.
    pub num_leaves: usize,
    /// Candidate thresholds per feature; 0 scans every distinct value.
    pub num_steps: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            num_leaves: 10,
            num_steps: 0,
        }
    }
}

/// Grows a [`RegressionTree`] by repeatedly splitting the worst leaf.
///
/// `targets` is indexed by global document id and supplies the regression
/// values the variance loss runs on: plain labels for a standalone tree,
/// pseudo-residuals when driven by the gradient ensemble trainer. Leaf
/// scores are kept at the mean target of the routed documents.
pub struct TreeGrower<'a> {
    corpus: &'a [Document],
    targets: Vec<f64>,
    params: TreeParams,
    tree: RegressionTree,
    /// Open leaves with their cached best split.
    open: Vec<(NodeId, SplitCandidate)>,
}

impl<'a> TreeGrower<'a> {
    /// Start a tree whose root owns `docs` (global indices into `corpus`).
    pub fn new(
        corpus: &'a [Document],
        targets: Vec<f64>,
        docs: Vec<u32>,
        params: TreeParams,
    ) -> Result<Self, TreeError> {
        debug_assert_eq!(corpus.len(), targets.len());

        let score = mean_target(&targets, &docs);
        let tree = RegressionTree::new_root(docs, score)?;
        let mut grower = Self {
            corpus,
            targets,
            params,
            tree,
            open: Vec::new(),
        };
        let root_split = grower.best_split(0);
        grower.open.push((0, root_split));
        Ok(grower)
    }

    /// Start a tree over every document, regressing on the labels.
    pub fn from_labels(corpus: &'a [Document], params: TreeParams) -> Result<Self, TreeError> {
        let targets = corpus.iter().map(|d| f64::from(d.label())).collect();
        let docs = (0..corpus.len() as u32).collect();
        Self::new(corpus, targets, docs, params)
    }

    /// Best split over every feature for one leaf's documents.
    ///
    /// The per-feature searches are independent and run sharded across
    /// threads; the reduction is deterministic (lower loss, then lower
    /// feature id).
    fn best_split(&self, leaf: NodeId) -> SplitCandidate {
        let docs = self.tree.node(leaf).docs();
        if docs.len() < 2 {
            return SplitCandidate::none();
        }
        let n_features = self.corpus[docs[0] as usize].n_features() as u32;

        (0..n_features)
            .into_par_iter()
            .map(|feature| {
                let sorted = FeatureSortedDocs::sort_subset(self.corpus, docs, feature);
                if sorted.is_constant() {
                    return SplitCandidate::none();
                }
                let loss = VarianceLoss::new(&sorted, &self.targets);
                find_split(&sorted, &loss, self.params.num_steps)
            })
            .reduce(SplitCandidate::none, better_candidate)
    }

    /// Position in the open list of the leaf with the globally smallest
    /// achievable loss; ties go to the lower arena id.
    fn find_optimal_leaf(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (k, (leaf, split)) in self.open.iter().enumerate() {
            if !split.is_valid() {
                continue;
            }
            best = match best {
                None => Some(k),
                Some(b) => {
                    let (b_leaf, b_split) = &self.open[b];
                    if split.loss < b_split.loss
                        || (split.loss == b_split.loss && leaf < b_leaf)
                    {
                        Some(k)
                    } else {
                        Some(b)
                    }
                }
            };
        }
        best
    }

    /// Split the best open leaf.
    ///
    /// Returns `false` without touching the tree when the leaf budget is
    /// reached or no open leaf has a legal split.
    pub fn grow_one_leaf(&mut self) -> Result<bool, TreeError> {
        if self.tree.n_leaves() >= self.params.num_leaves {
            return Ok(false);
        }
        let Some(k) = self.find_optimal_leaf() else {
            return Ok(false);
        };

        let (leaf, split) = self.open.swap_remove(k);
        let (left, right) = self
            .tree
            .split_leaf(leaf, split.feature, split.threshold, self.corpus)?;

        for child in [left, right] {
            let score = mean_target(&self.targets, self.tree.node(child).docs());
            self.tree.set_leaf_score(child, score)?;
            let child_split = self.best_split(child);
            self.open.push((child, child_split));
        }
        Ok(true)
    }

    /// Grow until the leaf budget is exhausted (or no splits remain).
    pub fn grow_to_target(&mut self) -> Result<(), TreeError> {
        while self.grow_one_leaf()? {}
        Ok(())
    }

    #[inline]
    pub fn n_leaves(&self) -> usize {
        self.tree.n_leaves()
    }

    #[inline]
    pub fn tree(&self) -> &RegressionTree {
        &self.tree
    }

    pub fn into_tree(self) -> RegressionTree {
        self.tree
    }
}

fn mean_target(targets: &[f64], docs: &[u32]) -> f32 {
    if docs.is_empty() {
        return 0.0;
    }
    let sum: f64 = docs.iter().map(|&d| targets[d as usize]).sum();
    (sum / docs.len() as f64) as f32
}
