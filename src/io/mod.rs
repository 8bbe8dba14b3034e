//! Model persistence.

pub mod model;

pub use model::{EnsembleModel, ModelError, StumpModel, TreeModel};
