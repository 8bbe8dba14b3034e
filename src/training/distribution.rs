//! Weight distributions over training pairs and documents.
//!
//! Pairwise boosting maintains a normalized weight for every orderable
//! document pair; the single-document margin variant keeps one weight per
//! document instead. Both distributions follow the same round contract:
//! multiply every entry by the exponential reweighting factor of the newest
//! weak learner, accumulate the raw sum while doing so, then divide every
//! entry by that sum. The normalizer always comes from the updated values,
//! never from the previous round.

use thiserror::Error;

use crate::data::RankingDataset;
use crate::repr::stump::Stump;

/// Distribution construction errors.
///
/// These are caller contract violations; nothing here is recovered locally.
#[derive(Debug, Clone, Error)]
pub enum DistributionError {
    #[error("query {query} contributes no orderable pair; exclude it before training")]
    NoEligiblePairs { query: usize },
}

// ============================================================================
// PairDistribution
// ============================================================================

/// Pair weights of one query.
///
/// Documents are in descending-label order, so for a better-doc position `i`
/// the orderable partners are a contiguous tail `start[i]..n`. Only those
/// entries are stored; an ineligible pair has no storage and reads as an
/// exact zero forever.
#[derive(Debug, Clone)]
struct QueryPairs {
    /// First orderable partner position for each `i` (first position with a
    /// strictly smaller label); `start[i] == n` when there is none.
    start: Vec<usize>,
    /// `weights[i][k]` = weight of the pair `(i, start[i] + k)`.
    weights: Vec<Vec<f64>>,
}

/// The 3-level pairwise weight tensor `d[query][better][worse]`.
///
/// Initialized uniformly over every orderable pair across all queries and
/// renormalized to sum 1 after every update.
#[derive(Debug, Clone)]
pub struct PairDistribution {
    queries: Vec<QueryPairs>,
    n_pairs: usize,
}

impl PairDistribution {
    /// Build the uniform initial distribution over `dataset`.
    ///
    /// Errors when a query contributes no orderable pair. The dataset
    /// constructor already rejects such queries; the check here guards
    /// callers assembling datasets through other paths.
    pub fn new(dataset: &RankingDataset) -> Result<Self, DistributionError> {
        let mut queries = Vec::with_capacity(dataset.n_queries());
        let mut n_pairs = 0usize;

        for (q, ranked) in dataset.queries().enumerate() {
            let n = ranked.len();
            let mut start = Vec::with_capacity(n);
            let mut query_pairs = 0usize;

            for i in 0..n {
                // Labels are descending; scan to the first strictly smaller.
                let mut j = i + 1;
                while j < n && ranked.label(j) == ranked.label(i) {
                    j += 1;
                }
                start.push(j);
                query_pairs += n - j;
            }

            if query_pairs == 0 {
                return Err(DistributionError::NoEligiblePairs { query: q });
            }

            queries.push(QueryPairs {
                start,
                weights: Vec::new(),
            });
            n_pairs += query_pairs;
        }

        let init = 1.0 / n_pairs as f64;
        for (query, ranked) in queries.iter_mut().zip(dataset.queries()) {
            let n = ranked.len();
            query.weights = query
                .start
                .iter()
                .map(|&s| vec![init; n - s])
                .collect();
        }

        Ok(Self { queries, n_pairs })
    }

    /// Total number of orderable pairs across all queries.
    #[inline]
    pub fn n_pairs(&self) -> usize {
        self.n_pairs
    }

    /// Whether `(i, j)` is an orderable pair of query `q`.
    #[inline]
    pub fn is_eligible(&self, q: usize, i: usize, j: usize) -> bool {
        let query = &self.queries[q];
        i < query.start.len() && j >= query.start[i] && j < query.start.len()
    }

    /// Weight of the pair `(i, j)` of query `q`.
    ///
    /// Ineligible pairs have no storage and read as exactly 0.
    #[inline]
    pub fn weight(&self, q: usize, i: usize, j: usize) -> f64 {
        if self.is_eligible(q, i, j) {
            self.queries[q].weights[i][j - self.queries[q].start[i]]
        } else {
            0.0
        }
    }

    /// Sum of all stored weights (1.0 after any update, within tolerance).
    pub fn sum(&self) -> f64 {
        self.queries
            .iter()
            .flat_map(|q| q.weights.iter())
            .flat_map(|row| row.iter())
            .sum()
    }

    /// Apply one round's exponential reweighting for `stump`, then normalize.
    ///
    /// Every orderable pair is multiplied by
    /// `exp(alpha * (h(worse) - h(better)))`: pairs the stump ordered
    /// wrongly grow heavier. The normalization factor is accumulated from
    /// the updated entries in the same pass and applied in a second pass.
    pub fn update(&mut self, stump: &Stump, dataset: &RankingDataset) {
        // Weighted responses, one per document; exp(a*h_j - a*h_i) per pair.
        let weighted: Vec<f64> = dataset
            .docs()
            .iter()
            .map(|d| stump.score(d.features()))
            .collect();

        let mut sum = 0.0;
        for (query, ranked) in self.queries.iter_mut().zip(dataset.queries()) {
            for (i, row) in query.weights.iter_mut().enumerate() {
                let wi = weighted[ranked.global_index(i) as usize];
                for (k, w) in row.iter_mut().enumerate() {
                    let j = query.start[i] + k;
                    let wj = weighted[ranked.global_index(j) as usize];
                    *w *= (wj - wi).exp();
                    sum += *w;
                }
            }
        }

        self.normalize(sum);
    }

    /// Divide every entry by `sum`.
    fn normalize(&mut self, sum: f64) {
        for query in &mut self.queries {
            for row in &mut query.weights {
                for w in row {
                    *w /= sum;
                }
            }
        }
    }

    /// Per-document potentials, recomputed fresh from the current weights.
    ///
    /// `potential[doc] = sum_k d[k][doc] - d[doc][k]`: the mass of pairs the
    /// document participates in as the worse member, minus the mass where it
    /// is the better one. Indexed by global document id. Never cached across
    /// rounds; the weights change every update.
    pub fn potential(&self, dataset: &RankingDataset) -> Vec<f64> {
        let mut potential = vec![0.0; dataset.n_docs()];
        for (query, ranked) in self.queries.iter().zip(dataset.queries()) {
            for (i, row) in query.weights.iter().enumerate() {
                let gi = ranked.global_index(i) as usize;
                for (k, &w) in row.iter().enumerate() {
                    let gj = ranked.global_index(query.start[i] + k) as usize;
                    potential[gj] += w;
                    potential[gi] -= w;
                }
            }
        }
        potential
    }
}

// ============================================================================
// SingleDocDistribution
// ============================================================================

/// The 2-level per-document weight tensor of the margin boosting variant.
///
/// A document counts as a positive example when its label is above zero.
/// Weights are flat, indexed by global document id, uniform at start and
/// renormalized to sum 1 after every update.
#[derive(Debug, Clone)]
pub struct SingleDocDistribution {
    weights: Vec<f64>,
    positive: Vec<bool>,
}

impl SingleDocDistribution {
    /// Build the uniform initial distribution over `dataset`.
    pub fn new(dataset: &RankingDataset) -> Self {
        let n = dataset.n_docs();
        Self {
            weights: vec![1.0 / n as f64; n],
            positive: dataset.docs().iter().map(|d| d.label() > 0).collect(),
        }
    }

    /// Per-document weights, indexed by global document id.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Per-document class flags (label above zero), same indexing.
    #[inline]
    pub fn positive(&self) -> &[bool] {
        &self.positive
    }

    /// Sum of all weights (1.0 after any update, within tolerance).
    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Weighted error of `stump` under the current weights.
    pub fn error(&self, stump: &Stump, dataset: &RankingDataset) -> f64 {
        self.weights
            .iter()
            .zip(self.positive.iter())
            .zip(dataset.docs())
            .filter(|((_, &pos), doc)| {
                let h = stump.response(doc.features());
                (h > 0.0) != pos
            })
            .map(|((w, _), _)| w)
            .sum()
    }

    /// Apply one round's reweighting for `stump`, then normalize.
    ///
    /// Each weight is multiplied by `exp(-alpha * y * h(x))` with `y = +1`
    /// for positive documents and `-1` otherwise; misclassified documents
    /// grow heavier. Two passes, same as the pairwise tensor.
    pub fn update(&mut self, stump: &Stump, dataset: &RankingDataset) {
        let alpha = stump.alpha();
        let mut sum = 0.0;
        for ((w, &pos), doc) in self
            .weights
            .iter_mut()
            .zip(self.positive.iter())
            .zip(dataset.docs())
        {
            let y = if pos { 1.0 } else { -1.0 };
            let h = stump.response(doc.features());
            *w *= (-alpha * y * h).exp();
            sum += *w;
        }
        for w in &mut self.weights {
            *w /= sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Document;
    use crate::repr::stump::{Stump, StumpOutput};

    /// Five documents, labels {0, 0, 1, 1, 2}, feature 4 carrying
    /// {3, 1, 30, 10, 0.03}; eight orderable pairs per query.
    fn five_doc_query() -> Vec<Document> {
        let labels = [0, 0, 1, 1, 2];
        let feature4 = [3.0, 1.0, 30.0, 10.0, 0.03];
        labels
            .iter()
            .zip(feature4.iter())
            .map(|(&l, &f)| Document::new(vec![0.0, 0.0, 0.0, 0.0, f], l))
            .collect()
    }

    fn three_query_dataset() -> RankingDataset {
        RankingDataset::new(vec![five_doc_query(), five_doc_query(), five_doc_query()])
            .unwrap()
    }

    #[test]
    fn uniform_init_over_eligible_pairs() {
        let ds = three_query_dataset();
        let dist = PairDistribution::new(&ds).unwrap();

        // 8 orderable pairs per query, 3 queries.
        assert_eq!(dist.n_pairs(), 24);

        for q in 0..3 {
            for i in 0..5 {
                for j in 0..5 {
                    let w = dist.weight(q, i, j);
                    if dist.is_eligible(q, i, j) {
                        assert_eq!(w, 1.0 / 24.0);
                    } else {
                        assert_eq!(w, 0.0);
                    }
                }
            }
        }

        // Sorted labels are [2, 1, 1, 0, 0]: position 0 pairs with 1..4,
        // positions 1 and 2 pair with 3..4, the rest with nobody.
        assert!(dist.is_eligible(0, 0, 1));
        assert!(dist.is_eligible(0, 2, 4));
        assert!(!dist.is_eligible(0, 1, 2), "equal labels never pair");
        assert!(!dist.is_eligible(0, 3, 4));
        assert!(!dist.is_eligible(0, 4, 0));
    }

    #[test]
    fn update_applies_exponential_factors_then_normalizes() {
        let ds = three_query_dataset();
        let mut dist = PairDistribution::new(&ds).unwrap();

        // Threshold 5 on feature 4: responds 1 for values {30, 10}, else 0.
        let stump = Stump::new(4, 5.0, 2.0, StumpOutput::Binary);
        dist.update(&stump, &ds);

        // Sorted docs per query: labels [2,1,1,0,0], feature4 [0.03,30,10,3,1].
        // Pair (0,1): better doc responds 0, worse responds 1 -> exp(+2).
        // Pair (1,3): better doc responds 1, worse responds 0 -> exp(-2).
        // Pair (3,4) ineligible; pair (0,3): both respond 0 -> exp(0).
        let base = 1.0 / 24.0;
        let e2 = (2.0f64).exp();
        // Raw sums per query: pairs from position 0: {e^2, e^2, 1, 1};
        // positions 1 and 2: {e^-2, e^-2} each.
        let z = 3.0 * (2.0 * base * e2 + 2.0 * base + 4.0 * base / e2);

        let w01 = dist.weight(0, 0, 1);
        assert!((w01 - base * e2 / z).abs() < 1e-12);
        let w13 = dist.weight(0, 1, 3);
        assert!((w13 - base / e2 / z).abs() < 1e-12);
        let w03 = dist.weight(0, 0, 3);
        assert!((w03 - base / z).abs() < 1e-12);

        // Normalized, and ineligible entries untouched.
        assert!((dist.sum() - 1.0).abs() < 1e-9);
        assert_eq!(dist.weight(0, 1, 2), 0.0);
        assert_eq!(dist.weight(0, 3, 4), 0.0);
    }

    #[test]
    fn potential_sums_to_zero_per_query() {
        let ds = three_query_dataset();
        let dist = PairDistribution::new(&ds).unwrap();
        let potential = dist.potential(&ds);

        let total: f64 = potential.iter().sum();
        assert!(total.abs() < 1e-12);

        // The top-labeled doc of query 0 sits at global position 0 and is
        // better in 4 pairs, worse in none.
        assert!((potential[0] + 4.0 / 24.0).abs() < 1e-12);
        // A bottom-labeled doc is worse in 3 pairs (one per higher label).
        assert!((potential[3] - 3.0 / 24.0).abs() < 1e-12);
    }

    #[test]
    fn potential_is_recomputed_not_cached() {
        let ds = three_query_dataset();
        let mut dist = PairDistribution::new(&ds).unwrap();
        let before = dist.potential(&ds);

        let stump = Stump::new(4, 5.0, 1.0, StumpOutput::Binary);
        dist.update(&stump, &ds);
        let after = dist.potential(&ds);

        assert!(before
            .iter()
            .zip(after.iter())
            .any(|(b, a)| (b - a).abs() > 1e-9));
    }

    #[test]
    fn single_doc_distribution_update() {
        let ds = three_query_dataset();
        let mut dist = SingleDocDistribution::new(&ds);
        assert_eq!(dist.weights().len(), 15);
        assert!((dist.sum() - 1.0).abs() < 1e-12);

        let stump = Stump::new(4, 5.0, 0.5, StumpOutput::Signed);
        let err = dist.error(&stump, &ds);
        assert!(err > 0.0 && err < 1.0);

        dist.update(&stump, &ds);
        assert!((dist.sum() - 1.0).abs() < 1e-9);
    }
}
