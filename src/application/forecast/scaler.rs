use serde::{Deserialize, Serialize};

/// Per-column min-max normalization to [0, 1].
///
/// Fitted once on the training feature matrix and frozen: prediction and
/// evaluation must transform with the training-time parameters, never refit.
/// A constant column scales by 1 so its training rows map to 0, the same
/// zero-range handling the reference scaler uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    mins: Vec<f64>,
    scales: Vec<f64>,
}

impl MinMaxScaler {
    pub fn fit(matrix: &[Vec<f64>]) -> Self {
        let n_cols = matrix.first().map(|r| r.len()).unwrap_or(0);
        let mut mins = vec![f64::INFINITY; n_cols];
        let mut maxs = vec![f64::NEG_INFINITY; n_cols];
        for row in matrix {
            for (j, &v) in row.iter().enumerate() {
                if v < mins[j] {
                    mins[j] = v;
                }
                if v > maxs[j] {
                    maxs[j] = v;
                }
            }
        }
        let scales = mins
            .iter()
            .zip(&maxs)
            .map(|(&lo, &hi)| {
                let range = hi - lo;
                if range == 0.0 || !range.is_finite() {
                    1.0
                } else {
                    range
                }
            })
            .collect();
        Self { mins, scales }
    }

    pub fn transform(&self, matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
        matrix
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(j, &v)| (v - self.mins[j]) / self.scales[j])
                    .collect()
            })
            .collect()
    }

    pub fn fit_transform(matrix: &[Vec<f64>]) -> (Self, Vec<Vec<f64>>) {
        let scaler = Self::fit(matrix);
        let scaled = scaler.transform(matrix);
        (scaler, scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scales_to_unit_interval() {
        let m = vec![vec![0.0, 10.0], vec![5.0, 20.0], vec![10.0, 30.0]];
        let (_, scaled) = MinMaxScaler::fit_transform(&m);
        assert_eq!(scaled[0], vec![0.0, 0.0]);
        assert_eq!(scaled[1], vec![0.5, 0.5]);
        assert_eq!(scaled[2], vec![1.0, 1.0]);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let m = vec![vec![7.0], vec![7.0]];
        let (_, scaled) = MinMaxScaler::fit_transform(&m);
        assert_eq!(scaled, vec![vec![0.0], vec![0.0]]);
    }

    #[test]
    fn test_frozen_parameters_applied_to_new_data() {
        let train = vec![vec![0.0], vec![10.0]];
        let scaler = MinMaxScaler::fit(&train);
        // Out-of-range serving data extrapolates past [0, 1] instead of
        // being refit
        let out = scaler.transform(&[vec![20.0]]);
        assert_eq!(out, vec![vec![2.0]]);
    }
}
