//! CSV persistence for window-sweep signal frames.

use crate::domain::signals::SignalFrame;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Writes one CSV per `(short, long)` window pair into a results directory.
/// Undefined (NaN) signal values are written as empty cells.
pub struct SignalCsvStore {
    dir: PathBuf,
}

impl SignalCsvStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn save(&self, frame: &SignalFrame) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating results directory {:?}", self.dir))?;

        let path = self.dir.join(format!(
            "trading_strategy_{}_{}.csv",
            frame.short_window, frame.long_window
        ));
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("creating {:?}", path))?;

        writer.write_record([
            "date",
            "price",
            "short_mavg",
            "long_mavg",
            "signal",
            "positions",
        ])?;
        for row in &frame.rows {
            writer.write_record([
                row.date.to_string(),
                cell(row.price),
                cell(row.short_mavg),
                cell(row.long_mavg),
                cell(row.signal),
                cell(row.position),
            ])?;
        }
        writer.flush()?;
        Ok(path)
    }
}

fn cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}
