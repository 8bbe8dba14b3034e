//! ranke-rs: pairwise boosting and regression-tree learning-to-rank.
//!
//! This crate provides the training core of a learning-to-rank toolkit:
//! RankBoost-style pairwise boosting, an AdaBoost-style margin variant, and
//! a greedy regression-tree builder shared with a gradient tree-ensemble
//! trainer. Feature extraction, configuration loading, and report metrics
//! live with the callers; the crate consumes ready-made feature vectors and
//! hands back rankers that score them.

pub mod data;
pub mod io;
pub mod repr;
pub mod testing;
pub mod training;
