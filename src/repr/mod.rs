//! Model representations produced by training and used for scoring.

pub mod forest;
pub mod stump;
pub mod tree;

pub use forest::TreeEnsemble;
pub use stump::{Stump, StumpEnsemble, StumpOutput};
pub use tree::{NodeId, RegressionTree, TreeError, TreeNode, NO_NODE};
