//! Persistent model forms and their JSON codec.
//!
//! Models are saved as parallel arrays, one entry per component:
//!
//! - a boosting model is three arrays `(features, thresholds, alphas)` plus
//!   the response convention;
//! - a tree is a node list in preorder with `(node_id, feature, threshold,
//!   score)` per node, where `feature == -1` and a `-inf` threshold mark a
//!   leaf. Node ids are heap-style (root 0, children of `i` at `2i + 1` and
//!   `2i + 2`), which is what ties children back to parents on load.
//!
//! Reading validates array lengths and node-list structure; a malformed
//! model aborts the load with a descriptive error rather than producing a
//! degenerate ranker.

use std::collections::HashMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repr::stump::{Stump, StumpEnsemble, StumpOutput};
use crate::repr::tree::{NodeId, RegressionTree, TreeNode, NO_NODE};
use crate::repr::forest::TreeEnsemble;

/// Model read/write errors.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("parallel array length mismatch: {what} has {got} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("tree model is empty")]
    EmptyTree,

    #[error("tree model has no root (node id 0)")]
    MissingRoot,

    #[error("node {id} references missing child {child}")]
    MissingChild { id: u64, child: u64 },

    #[error("node id {id} appears more than once")]
    DuplicateNode { id: u64 },

    #[error("node {id} has invalid feature id {feature}")]
    BadFeature { id: u64, feature: i64 },

    #[error("{got} of {expected} nodes are unreachable from the root")]
    DisconnectedNodes { expected: usize, got: usize },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Leaf thresholds are `-inf`, which JSON numbers cannot carry; non-finite
/// values travel as `null` on the wire.
mod null_as_neg_inf {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for &v in values {
            if v.is_finite() {
                seq.serialize_element(&Some(v))?;
            } else {
                seq.serialize_element(&None::<f32>)?;
            }
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
        let raw: Vec<Option<f32>> = Vec::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|v| v.unwrap_or(f32::NEG_INFINITY))
            .collect())
    }
}

// ============================================================================
// StumpModel
// ============================================================================

/// Persistent form of a [`StumpEnsemble`]: parallel arrays, one entry per
/// stump in boosting-round order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StumpModel {
    pub output: StumpOutput,
    pub features: Vec<u32>,
    pub thresholds: Vec<f32>,
    pub alphas: Vec<f64>,
}

impl StumpModel {
    pub fn from_ensemble(ensemble: &StumpEnsemble) -> Self {
        let stumps = ensemble.stumps();
        Self {
            output: ensemble.output(),
            features: stumps.iter().map(Stump::feature).collect(),
            thresholds: stumps.iter().map(Stump::threshold).collect(),
            alphas: stumps.iter().map(Stump::alpha).collect(),
        }
    }

    /// Rebuild the ensemble, validating array lengths.
    pub fn to_ensemble(&self) -> Result<StumpEnsemble, ModelError> {
        let n = self.features.len();
        for (what, got) in [
            ("thresholds", self.thresholds.len()),
            ("alphas", self.alphas.len()),
        ] {
            if got != n {
                return Err(ModelError::LengthMismatch {
                    what,
                    expected: n,
                    got,
                });
            }
        }

        let mut ensemble = StumpEnsemble::new(self.output);
        for i in 0..n {
            ensemble.push(Stump::new(
                self.features[i],
                self.thresholds[i],
                self.alphas[i],
                self.output,
            ));
        }
        Ok(ensemble)
    }

    pub fn save<W: Write>(&self, writer: W) -> Result<(), ModelError> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn load<R: Read>(reader: R) -> Result<Self, ModelError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

// ============================================================================
// TreeModel
// ============================================================================

/// Persistent form of a [`RegressionTree`]: a preorder node list keyed by
/// heap-style node ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeModel {
    pub node_ids: Vec<u64>,
    pub features: Vec<i64>,
    #[serde(with = "null_as_neg_inf")]
    pub thresholds: Vec<f32>,
    pub scores: Vec<f32>,
}

impl TreeModel {
    pub fn from_tree(tree: &RegressionTree) -> Self {
        let n = tree.n_nodes();
        let mut model = Self {
            node_ids: Vec::with_capacity(n),
            features: Vec::with_capacity(n),
            thresholds: Vec::with_capacity(n),
            scores: Vec::with_capacity(n),
        };

        // Preorder: node, left subtree, right subtree.
        let mut stack: Vec<NodeId> = vec![0];
        while let Some(id) = stack.pop() {
            let node = tree.node(id);
            model.node_ids.push(node.persist_id());
            model.scores.push(node.score());
            if node.is_leaf() {
                model.features.push(-1);
                model.thresholds.push(f32::NEG_INFINITY);
            } else {
                model.features.push(i64::from(node.feature()));
                model.thresholds.push(node.threshold());
                stack.push(node.right());
                stack.push(node.left());
            }
        }
        model
    }

    /// Rebuild the tree, validating lengths and node-list structure.
    pub fn to_tree(&self) -> Result<RegressionTree, ModelError> {
        let n = self.node_ids.len();
        if n == 0 {
            return Err(ModelError::EmptyTree);
        }
        for (what, got) in [
            ("features", self.features.len()),
            ("thresholds", self.thresholds.len()),
            ("scores", self.scores.len()),
        ] {
            if got != n {
                return Err(ModelError::LengthMismatch {
                    what,
                    expected: n,
                    got,
                });
            }
        }

        let mut index_of = HashMap::with_capacity(n);
        for (entry, &id) in self.node_ids.iter().enumerate() {
            if index_of.insert(id, entry).is_some() {
                return Err(ModelError::DuplicateNode { id });
            }
        }
        if !index_of.contains_key(&0) {
            return Err(ModelError::MissingRoot);
        }

        let mut nodes = Vec::with_capacity(n);
        self.build_node(&index_of, 0, NO_NODE, &mut nodes)?;
        if nodes.len() != n {
            return Err(ModelError::DisconnectedNodes {
                expected: n,
                got: n - nodes.len(),
            });
        }
        Ok(RegressionTree::from_nodes(nodes))
    }

    /// Materialize the node `id` (and its subtree) into the arena.
    fn build_node(
        &self,
        index_of: &HashMap<u64, usize>,
        id: u64,
        parent: NodeId,
        nodes: &mut Vec<TreeNode>,
    ) -> Result<NodeId, ModelError> {
        let &entry = index_of.get(&id).ok_or_else(|| ModelError::MissingChild {
            // Only child lookups can miss; the root is checked up front.
            id: id.saturating_sub(1) / 2,
            child: id,
        })?;

        let arena = nodes.len() as NodeId;
        nodes.push(TreeNode {
            parent,
            left: NO_NODE,
            right: NO_NODE,
            feature: 0,
            threshold: 0.0,
            score: self.scores[entry],
            persist_id: id,
            docs: Vec::new(),
            is_leaf: true,
        });

        let feature = self.features[entry];
        if feature >= 0 {
            let left = self.build_node(index_of, 2 * id + 1, arena, nodes)?;
            let right = self.build_node(index_of, 2 * id + 2, arena, nodes)?;
            let node = &mut nodes[arena as usize];
            node.feature = feature as u32;
            node.threshold = self.thresholds[entry];
            node.left = left;
            node.right = right;
            node.is_leaf = false;
        } else if feature != -1 {
            return Err(ModelError::BadFeature { id, feature });
        }
        Ok(arena)
    }

    pub fn save<W: Write>(&self, writer: W) -> Result<(), ModelError> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn load<R: Read>(reader: R) -> Result<Self, ModelError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

// ============================================================================
// EnsembleModel
// ============================================================================

/// Persistent form of a [`TreeEnsemble`]: one [`TreeModel`] per tree, in
/// append order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleModel {
    pub trees: Vec<TreeModel>,
}

impl EnsembleModel {
    pub fn from_ensemble(ensemble: &TreeEnsemble) -> Self {
        Self {
            trees: ensemble.trees().map(TreeModel::from_tree).collect(),
        }
    }

    pub fn to_ensemble(&self) -> Result<TreeEnsemble, ModelError> {
        let mut ensemble = TreeEnsemble::new();
        for tree in &self.trees {
            ensemble.push_tree(tree.to_tree()?);
        }
        Ok(ensemble)
    }

    pub fn save<W: Write>(&self, writer: W) -> Result<(), ModelError> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn load<R: Read>(reader: R) -> Result<Self, ModelError> {
        Ok(serde_json::from_reader(reader)?)
    }
}
