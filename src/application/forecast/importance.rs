use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;

use super::model::r_squared;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Permutation importance over the held-out split: the R² drop when one
/// column is shuffled. The forest exposes no impurity importances, so this
/// stands in for them. Deterministic under the given seed; columns are
/// scored in parallel and the result is normalized to sum to 1, sorted
/// descending.
pub fn permutation_importance(
    model: &Forest,
    x_test: &[Vec<f64>],
    y_test: &[f64],
    feature_names: &[String],
    seed: u64,
) -> Vec<(String, f64)> {
    let baseline = match score(model, x_test, y_test) {
        Some(s) => s,
        None => return feature_names.iter().map(|n| (n.clone(), 0.0)).collect(),
    };

    let mut drops: Vec<(String, f64)> = feature_names
        .par_iter()
        .enumerate()
        .map(|(j, name)| {
            // Column-local seed keeps each shuffle independent of rayon's
            // scheduling order
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(j as u64));
            let mut column: Vec<f64> = x_test.iter().map(|row| row[j]).collect();
            column.shuffle(&mut rng);

            let mut permuted = x_test.to_vec();
            for (row, v) in permuted.iter_mut().zip(column) {
                row[j] = v;
            }

            let drop = score(model, &permuted, y_test)
                .map(|s| (baseline - s).max(0.0))
                .unwrap_or(0.0);
            (name.clone(), drop)
        })
        .collect();

    let total: f64 = drops.iter().map(|(_, d)| d).sum();
    if total > 0.0 {
        for (_, d) in drops.iter_mut() {
            *d /= total;
        }
    }
    drops.sort_by(|a, b| b.1.total_cmp(&a.1));
    drops
}

fn score(model: &Forest, x: &[Vec<f64>], y: &[f64]) -> Option<f64> {
    let matrix = DenseMatrix::from_2d_vec(&x.to_vec()).ok()?;
    let pred = model.predict(&matrix).ok()?;
    Some(r_squared(&pred, y))
}
