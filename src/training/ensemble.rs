//! Gradient tree-ensemble training.
//!
//! Builds a [`TreeEnsemble`] one tree per round: compute pseudo-residuals
//! against the running predictions, grow a regression tree on them with the
//! shared split machinery, scale its leaf scores by the learning rate, and
//! fold the tree's output back into the predictions. Round counts stay with
//! the caller; `train_round` does exactly one tree.

use crate::data::RankingDataset;
use crate::repr::forest::TreeEnsemble;
use crate::repr::tree::TreeError;

use super::grower::{TreeGrower, TreeParams};
use super::logger::{TrainingLogger, Verbosity};
use super::metric::{Metric, Rmse};

/// Parameters for ensemble training.
#[derive(Debug, Clone)]
pub struct EnsembleParams {
    /// Per-tree growth parameters.
    pub tree: TreeParams,
    /// Shrinkage applied to every leaf score.
    pub learning_rate: f64,
    /// Logging verbosity.
    pub verbosity: Verbosity,
}

impl Default for EnsembleParams {
    fn default() -> Self {
        Self {
            tree: TreeParams::default(),
            learning_rate: 0.1,
            verbosity: Verbosity::Info,
        }
    }
}

/// Trains a tree ensemble by gradient steps on squared error.
pub struct GradientTreeTrainer<'a> {
    dataset: &'a RankingDataset,
    labels: Vec<f64>,
    predictions: Vec<f64>,
    ensemble: TreeEnsemble,
    params: EnsembleParams,
    logger: TrainingLogger,
    round: usize,
}

impl<'a> GradientTreeTrainer<'a> {
    pub fn new(dataset: &'a RankingDataset, params: EnsembleParams) -> Self {
        let labels: Vec<f64> = dataset.docs().iter().map(|d| f64::from(d.label())).collect();
        let logger = TrainingLogger::new(params.verbosity);
        Self {
            dataset,
            predictions: vec![0.0; labels.len()],
            labels,
            ensemble: TreeEnsemble::new(),
            params,
            logger,
            round: 0,
        }
    }

    /// Grow one tree against the current residuals and append it.
    pub fn train_round(&mut self) -> Result<(), TreeError> {
        let residuals: Vec<f64> = self
            .labels
            .iter()
            .zip(self.predictions.iter())
            .map(|(l, p)| l - p)
            .collect();

        let docs: Vec<u32> = (0..self.dataset.n_docs() as u32).collect();
        let mut grower = TreeGrower::new(
            self.dataset.docs(),
            residuals,
            docs,
            self.params.tree.clone(),
        )?;
        grower.grow_to_target()?;
        let mut tree = grower.into_tree();

        // Gradient step: shrink every leaf before folding the tree in.
        for leaf in tree.leaf_ids() {
            let score = tree.node(leaf).score();
            tree.set_leaf_score(leaf, (f64::from(score) * self.params.learning_rate) as f32)?;
        }

        for (i, doc) in self.dataset.docs().iter().enumerate() {
            self.predictions[i] += f64::from(tree.predict(doc.features()));
        }
        self.ensemble.push_tree(tree);

        if self.logger.verbosity() >= Verbosity::Info {
            let rmse = Rmse.compute(&self.predictions, &self.labels);
            self.logger.log_round(self.round, &[("train_rmse", rmse)]);
        }
        self.round += 1;
        Ok(())
    }

    /// Convenience loop: grow `rounds` trees.
    pub fn train(&mut self, rounds: usize) -> Result<(), TreeError> {
        for _ in 0..rounds {
            self.train_round()?;
        }
        Ok(())
    }

    #[inline]
    pub fn ensemble(&self) -> &TreeEnsemble {
        &self.ensemble
    }

    /// Running per-document predictions, indexed by global document id.
    #[inline]
    pub fn predictions(&self) -> &[f64] {
        &self.predictions
    }

    pub fn into_ensemble(self) -> TreeEnsemble {
        self.ensemble
    }
}
