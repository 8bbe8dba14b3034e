//! Ranking dataset types.
//!
//! A [`Document`] is one scoreable item: a fixed-length feature vector plus an
//! integer relevance label. Documents are grouped per query; inside a query
//! they are kept sorted descending by label ([`RankedDocs`]), which is the
//! order every pairwise component of the crate relies on.
//!
//! [`RankingDataset`] owns all documents in one flat buffer (queries are
//! contiguous ranges), so training code can address any document by a single
//! global index.

use thiserror::Error;

/// Dataset construction/validation errors.
#[derive(Debug, Clone, Error)]
pub enum DatasetError {
    #[error("dataset contains no queries")]
    Empty,

    #[error("query {query} has {n_docs} documents, need at least 2")]
    QueryTooSmall { query: usize, n_docs: usize },

    #[error("query {query} has a single label value ({label}); no orderable pair exists")]
    SingleLabel { query: usize, label: i32 },

    #[error("query {query} document {doc} has {got} features, expected {expected}")]
    InconsistentFeatures {
        query: usize,
        doc: usize,
        expected: usize,
        got: usize,
    },
}

/// One scoreable item: a feature vector and an integer relevance label.
///
/// Immutable once loaded into a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    features: Vec<f32>,
    label: i32,
}

impl Document {
    pub fn new(features: Vec<f32>, label: i32) -> Self {
        Self { features, label }
    }

    /// Full feature vector.
    #[inline]
    pub fn features(&self) -> &[f32] {
        &self.features
    }

    /// Raw value of one feature.
    #[inline]
    pub fn feature(&self, index: u32) -> f32 {
        self.features[index as usize]
    }

    /// Relevance label.
    #[inline]
    pub fn label(&self) -> i32 {
        self.label
    }

    /// Feature vector length.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.len()
    }
}

/// One query's documents, sorted descending by label.
///
/// A borrowed view into the dataset's flat document buffer. The order is
/// fixed at dataset construction and never changes afterwards.
#[derive(Debug, Clone, Copy)]
pub struct RankedDocs<'a> {
    docs: &'a [Document],
    /// Global index of `docs[0]` in the owning dataset.
    offset: usize,
}

impl<'a> RankedDocs<'a> {
    /// Number of documents in this query.
    #[inline]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Document at rank position `i` (0 = highest label).
    #[inline]
    pub fn doc(&self, i: usize) -> &'a Document {
        &self.docs[i]
    }

    /// Label at rank position `i`.
    #[inline]
    pub fn label(&self, i: usize) -> i32 {
        self.docs[i].label
    }

    /// Global dataset index of rank position `i`.
    #[inline]
    pub fn global_index(&self, i: usize) -> u32 {
        (self.offset + i) as u32
    }

    /// Iterate documents in rank order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Document> {
        self.docs.iter()
    }
}

/// The validated training set: all documents of all queries.
///
/// Construction sorts every query descending by label (stable) and checks
/// the invariants the training components depend on:
///
/// - at least one query, every query with at least 2 documents;
/// - at least 2 distinct label values per query (a single-label query has no
///   orderable pair and must never reach the pairwise machinery);
/// - a constant feature-vector length across the whole dataset.
#[derive(Debug, Clone)]
pub struct RankingDataset {
    /// All documents, grouped by query, each group sorted descending by label.
    docs: Vec<Document>,
    /// Query boundaries: query `q` spans `offsets[q]..offsets[q + 1]`.
    offsets: Vec<usize>,
    n_features: usize,
}

impl RankingDataset {
    /// Build a dataset from per-query document lists.
    pub fn new(queries: Vec<Vec<Document>>) -> Result<Self, DatasetError> {
        if queries.is_empty() {
            return Err(DatasetError::Empty);
        }

        let n_features = queries[0]
            .first()
            .map(Document::n_features)
            .unwrap_or_default();

        let n_docs = queries.iter().map(Vec::len).sum();
        let mut docs: Vec<Document> = Vec::with_capacity(n_docs);
        let mut offsets = Vec::with_capacity(queries.len() + 1);
        offsets.push(0);

        for (q, mut query) in queries.into_iter().enumerate() {
            if query.len() < 2 {
                return Err(DatasetError::QueryTooSmall {
                    query: q,
                    n_docs: query.len(),
                });
            }
            for (d, doc) in query.iter().enumerate() {
                if doc.n_features() != n_features {
                    return Err(DatasetError::InconsistentFeatures {
                        query: q,
                        doc: d,
                        expected: n_features,
                        got: doc.n_features(),
                    });
                }
            }

            // Stable, so equal labels keep their input order.
            query.sort_by(|a, b| b.label.cmp(&a.label));

            let first = query[0].label;
            let last = query[query.len() - 1].label;
            if first == last {
                return Err(DatasetError::SingleLabel {
                    query: q,
                    label: first,
                });
            }

            docs.extend(query);
            offsets.push(docs.len());
        }

        Ok(Self {
            docs,
            offsets,
            n_features,
        })
    }

    /// Drop queries that cannot contribute an orderable pair (fewer than 2
    /// documents, or a single label value), keeping the rest.
    ///
    /// Convenience for loaders that hand over raw query logs; [`Self::new`]
    /// still validates whatever survives.
    pub fn filter_rankable(queries: Vec<Vec<Document>>) -> Vec<Vec<Document>> {
        queries
            .into_iter()
            .filter(|q| q.len() >= 2 && q.iter().any(|d| d.label != q[0].label))
            .collect()
    }

    /// Number of queries.
    #[inline]
    pub fn n_queries(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Total number of documents across all queries.
    #[inline]
    pub fn n_docs(&self) -> usize {
        self.docs.len()
    }

    /// Feature vector length, constant across the dataset.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Flat document buffer, grouped by query.
    #[inline]
    pub fn docs(&self) -> &[Document] {
        &self.docs
    }

    /// Document by global index.
    #[inline]
    pub fn doc(&self, global: u32) -> &Document {
        &self.docs[global as usize]
    }

    /// Query `q` as a label-sorted view.
    #[inline]
    pub fn query(&self, q: usize) -> RankedDocs<'_> {
        let start = self.offsets[q];
        let end = self.offsets[q + 1];
        RankedDocs {
            docs: &self.docs[start..end],
            offset: start,
        }
    }

    /// Iterate all queries.
    pub fn queries(&self) -> impl Iterator<Item = RankedDocs<'_>> {
        (0..self.n_queries()).map(move |q| self.query(q))
    }
}
