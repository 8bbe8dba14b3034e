//! Seeded synthetic ranking data for tests and benchmarks.

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::{Document, RankingDataset};

/// Generate a ranking dataset where two features carry the signal.
///
/// Feature 0 (strong) and feature 1 (weak) drive a noisy relevance score;
/// the remaining features are uniform noise. Labels are assigned by rank
/// within each query (top third 2, middle third 1, rest 0), so every query
/// is guaranteed at least two distinct labels.
pub fn synthetic_ranking(
    n_queries: usize,
    docs_per_query: usize,
    n_features: usize,
    seed: u64,
) -> RankingDataset {
    assert!(docs_per_query >= 3, "need three docs for three label bands");
    assert!(n_features >= 2, "need the two informative features");

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut queries = Vec::with_capacity(n_queries);

    for _ in 0..n_queries {
        let mut scored: Vec<(f64, Vec<f32>)> = (0..docs_per_query)
            .map(|_| {
                let features: Vec<f32> = (0..n_features).map(|_| rng.gen::<f32>()).collect();
                let noise: f64 = rng.gen::<f64>() * 0.1;
                let score = 2.0 * f64::from(features[0]) + f64::from(features[1]) + noise;
                (score, features)
            })
            .collect();

        // Best score first; label bands follow the rank.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        let band = docs_per_query / 3;

        let docs = scored
            .into_iter()
            .enumerate()
            .map(|(rank, (_, features))| {
                let label = if rank < band {
                    2
                } else if rank < 2 * band {
                    1
                } else {
                    0
                };
                Document::new(features, label)
            })
            .collect();
        queries.push(docs);
    }

    RankingDataset::new(queries).expect("generated queries are always rankable")
}
