//! Training machinery for the ranking models.
//!
//! - [`distribution`]: pairwise and per-document weight tensors
//! - [`split`]: threshold search and its pluggable loss functionals
//! - [`booster`]: RankBoost / AdaBoost round drivers
//! - [`grower`]: greedy regression-tree growth
//! - [`ensemble`]: gradient tree-ensemble training
//! - [`metric`], [`logger`]: monitoring

pub mod booster;
pub mod distribution;
pub mod ensemble;
pub mod grower;
pub mod logger;
pub mod metric;
pub mod split;

pub use booster::{find_stump, AdaBoostTrainer, BoostParams, RankBoostTrainer, StumpFit};
pub use distribution::{DistributionError, PairDistribution, SingleDocDistribution};
pub use ensemble::{EnsembleParams, GradientTreeTrainer};
pub use grower::{TreeGrower, TreeParams};
pub use logger::{TrainingLogger, Verbosity};
pub use metric::{pairwise_accuracy, Metric, Rmse};
pub use split::{
    better_candidate, exact_search, find_split, stepped_search, ErrorLoss, PotentialLoss,
    SplitCandidate, SplitLoss, VarianceLoss,
};
