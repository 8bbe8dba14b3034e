//! Per-feature sorted views of a document set.
//!
//! Threshold search enumerates candidate split points along one feature's
//! value axis. [`FeatureSortedDocs`] caches the ascending sort order (as
//! global document indices) together with a parallel array of the raw values,
//! so the search never touches the feature vectors again after construction.

use super::dataset::Document;

/// A stable ascending sort of a document set by one feature.
///
/// Holds indices into the source buffer, not document copies, plus the sorted
/// raw values for fast numeric comparisons. Built once per (feature, search)
/// and never mutated.
#[derive(Debug, Clone)]
pub struct FeatureSortedDocs {
    feature: u32,
    /// Global document indices in ascending feature-value order.
    order: Vec<u32>,
    /// `values[k]` = raw feature value of `order[k]`.
    values: Vec<f32>,
}

impl FeatureSortedDocs {
    /// Sort every document of `corpus` by `feature`.
    pub fn sort(corpus: &[Document], feature: u32) -> Self {
        let subset: Vec<u32> = (0..corpus.len() as u32).collect();
        Self::sort_subset(corpus, &subset, feature)
    }

    /// Sort the documents named by `subset` (global indices) by `feature`.
    ///
    /// The sort is stable: equal values keep their `subset` order.
    pub fn sort_subset(corpus: &[Document], subset: &[u32], feature: u32) -> Self {
        let mut order = subset.to_vec();
        order.sort_by(|&a, &b| {
            let va = corpus[a as usize].feature(feature);
            let vb = corpus[b as usize].feature(feature);
            va.partial_cmp(&vb).unwrap_or(std::cmp::Ordering::Equal)
        });

        let values = order
            .iter()
            .map(|&d| corpus[d as usize].feature(feature))
            .collect();

        Self {
            feature,
            order,
            values,
        }
    }

    /// Feature this view is sorted by.
    #[inline]
    pub fn feature(&self) -> u32 {
        self.feature
    }

    /// Number of documents in the view.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Global document indices in ascending feature-value order.
    #[inline]
    pub fn order(&self) -> &[u32] {
        &self.order
    }

    /// Sorted raw feature values, parallel to [`Self::order`].
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Smallest feature value in the view.
    #[inline]
    pub fn min_feature(&self) -> f32 {
        self.values[0]
    }

    /// Largest feature value in the view.
    #[inline]
    pub fn max_feature(&self) -> f32 {
        self.values[self.values.len() - 1]
    }

    /// O(1) degenerate check: every document carries the same value.
    ///
    /// Callers skip the feature entirely when this holds; there is no split
    /// point on a constant axis.
    #[inline]
    pub fn is_constant(&self) -> bool {
        self.min_feature() == self.max_feature()
    }

    /// First sorted position whose value is `>= threshold`.
    ///
    /// Binary search over the cached value array; positions below the result
    /// form the `value < threshold` side of a split.
    #[inline]
    pub fn partition_index(&self, threshold: f32) -> usize {
        self.values.partition_point(|&v| v < threshold)
    }

    /// Number of distinct values in the view.
    pub fn n_distinct(&self) -> usize {
        if self.values.is_empty() {
            return 0;
        }
        1 + self
            .values
            .windows(2)
            .filter(|w| w[0] != w[1])
            .count()
    }
}
