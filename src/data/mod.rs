//! Dataset types consumed by the training components.

pub mod dataset;
pub mod sorted;

pub use dataset::{DatasetError, Document, RankedDocs, RankingDataset};
pub use sorted::FeatureSortedDocs;
