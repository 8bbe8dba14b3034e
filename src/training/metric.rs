//! Evaluation metrics for monitoring training.
//!
//! Metrics are separate from the losses driving the optimization; a model
//! trained on pairwise weights is still most naturally monitored by how many
//! orderable pairs it scores in the right order.

use crate::data::RankingDataset;

/// A metric over flat prediction/target slices.
pub trait Metric: Send + Sync {
    /// Compute the metric value.
    fn compute(&self, preds: &[f64], targets: &[f64]) -> f64;

    /// Whether higher values indicate better performance.
    fn higher_is_better(&self) -> bool;

    /// Name of the metric (for logging).
    fn name(&self) -> &'static str;
}

/// Root mean squared error. Lower is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rmse;

impl Metric for Rmse {
    fn compute(&self, preds: &[f64], targets: &[f64]) -> f64 {
        debug_assert_eq!(preds.len(), targets.len());
        if preds.is_empty() {
            return 0.0;
        }
        let mse = preds
            .iter()
            .zip(targets.iter())
            .map(|(p, t)| (p - t) * (p - t))
            .sum::<f64>()
            / preds.len() as f64;
        mse.sqrt()
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "rmse"
    }
}

/// Fraction of orderable pairs scored in label order.
///
/// `scores` is indexed by global document id. A pair counts as correct when
/// the better-labeled document scores strictly higher; exact score ties
/// count half, so a constant scorer sits at 0.5 rather than 0 or 1.
pub fn pairwise_accuracy(dataset: &RankingDataset, scores: &[f64]) -> f64 {
    let mut correct = 0.0;
    let mut total = 0usize;

    for ranked in dataset.queries() {
        let n = ranked.len();
        for i in 0..n {
            for j in i + 1..n {
                if ranked.label(i) == ranked.label(j) {
                    continue;
                }
                let si = scores[ranked.global_index(i) as usize];
                let sj = scores[ranked.global_index(j) as usize];
                total += 1;
                if si > sj {
                    correct += 1.0;
                } else if si == sj {
                    correct += 0.5;
                }
            }
        }
    }

    if total == 0 {
        return 0.0;
    }
    correct / total as f64
}
