use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column-name prefix marking a training target. Target columns are excluded
/// from the trainable feature set wherever the table is turned into a matrix.
pub const TARGET_PREFIX: &str = "target_";

pub const TARGET_1D: &str = "target_1d";
pub const TARGET_7D: &str = "target_7d";
pub const TARGET_30D: &str = "target_30d";

/// Column-major feature table, one row per input bar.
///
/// Column order is append order and is a hard contract: the model freezes
/// the names at training time and re-selects by name at prediction time, so
/// the builder must always emit the same ordering for the same input shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    data: Vec<Vec<f64>>,
}

impl FeatureTable {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            columns: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Appends a column. Panics on length mismatch, which would be a builder
    /// bug, not an input error.
    pub fn push_column(&mut self, name: &str, values: Vec<f64>) {
        assert_eq!(
            values.len(),
            self.dates.len(),
            "column {} length mismatch",
            name
        );
        self.columns.push(name.to_string());
        self.data.push(values);
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.data[i].as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Names of every non-target column, in table order. This is the set the
    /// model freezes as its feature schema.
    pub fn feature_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !c.starts_with(TARGET_PREFIX))
            .cloned()
            .collect()
    }

    /// Row-major matrix of the named columns. Returns the missing names
    /// instead when the table cannot reproduce the requested schema.
    pub fn matrix(&self, column_names: &[String]) -> Result<Vec<Vec<f64>>, Vec<String>> {
        let mut selected = Vec::with_capacity(column_names.len());
        let mut missing = Vec::new();
        for name in column_names {
            match self.column(name) {
                Some(col) => selected.push(col),
                None => missing.push(name.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(missing);
        }
        let rows = (0..self.n_rows())
            .map(|i| selected.iter().map(|col| col[i]).collect())
            .collect();
        Ok(rows)
    }

    /// Single-pass missing-value policy: per column, forward-fill then
    /// backward-fill. Leading warm-up NaNs take the first observed value and
    /// trailing target NaNs take the last. No row is dropped. This mirrors
    /// the studied behavior exactly and is not a rigorous imputation.
    pub fn fill_missing(&mut self) {
        for col in &mut self.data {
            let mut last = f64::NAN;
            for v in col.iter_mut() {
                if v.is_nan() {
                    *v = last;
                } else {
                    last = *v;
                }
            }
            let mut next = f64::NAN;
            for v in col.iter_mut().rev() {
                if v.is_nan() {
                    *v = next;
                } else {
                    next = *v;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(values: Vec<f64>) -> FeatureTable {
        let dates = (1..=values.len() as u32)
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        let mut table = FeatureTable::new(dates);
        table.push_column("x", values);
        table
    }

    #[test]
    fn test_fill_missing_forward_then_backward() {
        let mut table = table_with(vec![f64::NAN, f64::NAN, 3.0, f64::NAN, 5.0, f64::NAN]);
        table.fill_missing();
        assert_eq!(table.column("x").unwrap(), &[3.0, 3.0, 3.0, 3.0, 5.0, 5.0]);
    }

    #[test]
    fn test_feature_columns_exclude_targets() {
        let mut table = table_with(vec![1.0]);
        table.push_column(TARGET_1D, vec![2.0]);
        assert_eq!(table.feature_columns(), vec!["x".to_string()]);
    }

    #[test]
    fn test_matrix_reports_missing_columns() {
        let table = table_with(vec![1.0, 2.0]);
        let err = table
            .matrix(&["x".to_string(), "volume_ratio".to_string()])
            .unwrap_err();
        assert_eq!(err, vec!["volume_ratio".to_string()]);
    }

    #[test]
    fn test_matrix_row_major_order() {
        let mut table = table_with(vec![1.0, 2.0]);
        table.push_column("y", vec![10.0, 20.0]);
        let m = table
            .matrix(&["x".to_string(), "y".to_string()])
            .unwrap();
        assert_eq!(m, vec![vec![1.0, 10.0], vec![2.0, 20.0]]);
    }
}
