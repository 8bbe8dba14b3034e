//! Decision stumps and their additive ensembles.
//!
//! A stump is one boosting round's weak learner: a single-feature threshold
//! rule with a signed confidence weight. The ensemble ranks by the weighted
//! sum of stump responses.

use serde::{Deserialize, Serialize};

/// Response convention of a stump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StumpOutput {
    /// `{0, 1}` responses, the pairwise booster's convention.
    Binary,
    /// `{-1, +1}` responses, the margin booster's convention.
    Signed,
}

/// A single-feature threshold rule with a confidence weight.
///
/// The response fires on `value >= threshold`; orientation is carried by the
/// sign of `alpha`, so a stump that separates in the opposite direction
/// simply votes with a negative weight. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stump {
    feature: u32,
    threshold: f32,
    alpha: f64,
    output: StumpOutput,
}

impl Stump {
    pub fn new(feature: u32, threshold: f32, alpha: f64, output: StumpOutput) -> Self {
        Self {
            feature,
            threshold,
            alpha,
            output,
        }
    }

    #[inline]
    pub fn feature(&self) -> u32 {
        self.feature
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Confidence weight; finite for any non-degenerate training round.
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    #[inline]
    pub fn output(&self) -> StumpOutput {
        self.output
    }

    /// Unweighted response on a feature vector.
    #[inline]
    pub fn response(&self, features: &[f32]) -> f64 {
        let fires = features[self.feature as usize] >= self.threshold;
        match self.output {
            StumpOutput::Binary => {
                if fires {
                    1.0
                } else {
                    0.0
                }
            }
            StumpOutput::Signed => {
                if fires {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }

    /// Weighted response: `alpha * response`.
    #[inline]
    pub fn score(&self, features: &[f32]) -> f64 {
        self.alpha * self.response(features)
    }
}

/// An ordered collection of stumps voting additively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StumpEnsemble {
    stumps: Vec<Stump>,
    output: StumpOutput,
}

impl StumpEnsemble {
    pub fn new(output: StumpOutput) -> Self {
        Self {
            stumps: Vec::new(),
            output,
        }
    }

    /// Append one round's stump. Stumps are immutable afterwards.
    pub fn push(&mut self, stump: Stump) {
        debug_assert_eq!(stump.output(), self.output, "mixed stump conventions");
        self.stumps.push(stump);
    }

    #[inline]
    pub fn n_stumps(&self) -> usize {
        self.stumps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stumps.is_empty()
    }

    #[inline]
    pub fn stumps(&self) -> &[Stump] {
        &self.stumps
    }

    #[inline]
    pub fn output(&self) -> StumpOutput {
        self.output
    }

    /// Ranking score: sum of weighted responses.
    pub fn predict(&self, features: &[f32]) -> f64 {
        self.stumps.iter().map(|s| s.score(features)).sum()
    }

    /// Signed vote over the summed score, the margin booster's final output.
    pub fn vote(&self, features: &[f32]) -> f64 {
        self.predict(features).signum()
    }
}
