//! Tree ensembles: ordered collections of regression trees.

use super::tree::RegressionTree;

/// An ordered collection of regression trees voting additively.
///
/// Trees are immutable once appended; the ensemble's score is the plain sum
/// of the per-tree outputs.
#[derive(Debug, Clone, Default)]
pub struct TreeEnsemble {
    trees: Vec<RegressionTree>,
}

impl TreeEnsemble {
    pub fn new() -> Self {
        Self { trees: Vec::new() }
    }

    /// Append a grown tree.
    pub fn push_tree(&mut self, tree: RegressionTree) {
        self.trees.push(tree);
    }

    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    #[inline]
    pub fn tree(&self, idx: usize) -> &RegressionTree {
        &self.trees[idx]
    }

    /// Iterate trees in append order.
    pub fn trees(&self) -> impl Iterator<Item = &RegressionTree> {
        self.trees.iter()
    }

    /// Sum of the per-tree predictions.
    pub fn predict(&self, features: &[f32]) -> f32 {
        self.trees.iter().map(|t| t.predict(features)).sum()
    }
}
