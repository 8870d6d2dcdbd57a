use crate::domain::errors::DataError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One daily (or coarser) OHLCV bar. Every price field is optional because
/// provider payloads routinely omit columns; the close-equivalent is resolved
/// lazily by [`PriceSeries::close_prices`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adj_close: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl PriceBar {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close: Some(close),
            adj_close: None,
            price: None,
            volume: None,
        }
    }
}

/// Ordered-by-date price history for a single symbol.
///
/// Invariant: non-empty, dates strictly increasing. Enforced at construction
/// so downstream components never re-validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, DataError> {
        if bars.is_empty() {
            return Err(DataError::Empty);
        }
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(DataError::UnsortedDates {
                    prev: pair[0].date.to_string(),
                    next: pair[1].date.to_string(),
                });
            }
        }
        Ok(Self { bars })
    }

    /// Builds a series from loosely-keyed JSON records (the `price_history`
    /// payload shape). Column labels are normalized case-insensitively, and
    /// composite labels from ticker-grouped exports, e.g. `"('Close', 'NVDA')"`
    /// or `"Close NVDA"`, are flattened onto the close-equivalent column they
    /// contain.
    pub fn from_records(records: &[BTreeMap<String, Value>]) -> Result<Self, DataError> {
        let mut bars = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let mut bar = PriceBar {
                date: NaiveDate::MIN,
                open: None,
                high: None,
                low: None,
                close: None,
                adj_close: None,
                price: None,
                volume: None,
            };
            let mut date = None;
            for (label, value) in record {
                match ColumnKind::classify(label) {
                    Some(ColumnKind::Date) => {
                        if let Some(text) = value.as_str() {
                            date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok();
                        }
                    }
                    Some(kind) => {
                        let num = value.as_f64();
                        match kind {
                            ColumnKind::Open => bar.open = num,
                            ColumnKind::High => bar.high = num,
                            ColumnKind::Low => bar.low = num,
                            ColumnKind::Close => bar.close = num,
                            ColumnKind::AdjClose => bar.adj_close = num,
                            ColumnKind::Price => bar.price = num,
                            ColumnKind::Volume => bar.volume = num,
                            ColumnKind::Date => unreachable!(),
                        }
                    }
                    None => {}
                }
            }
            bar.date = date.ok_or(DataError::MissingDate { index })?;
            bars.push(bar);
        }
        Self::new(bars)
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    fn column(&self, get: impl Fn(&PriceBar) -> Option<f64>) -> Option<Vec<f64>> {
        if self.bars.iter().any(|b| get(b).is_some()) {
            Some(
                self.bars
                    .iter()
                    .map(|b| get(b).unwrap_or(f64::NAN))
                    .collect(),
            )
        } else {
            None
        }
    }

    pub fn has_close(&self) -> bool {
        self.bars.iter().any(|b| b.close.is_some())
    }

    pub fn open(&self) -> Option<Vec<f64>> {
        self.column(|b| b.open)
    }

    pub fn high(&self) -> Option<Vec<f64>> {
        self.column(|b| b.high)
    }

    pub fn low(&self) -> Option<Vec<f64>> {
        self.column(|b| b.low)
    }

    pub fn close(&self) -> Option<Vec<f64>> {
        self.column(|b| b.close)
    }

    pub fn adj_close(&self) -> Option<Vec<f64>> {
        self.column(|b| b.adj_close)
    }

    pub fn raw_price(&self) -> Option<Vec<f64>> {
        self.column(|b| b.price)
    }

    pub fn volume(&self) -> Option<Vec<f64>> {
        self.column(|b| b.volume)
    }

    /// Resolves the canonical close-equivalent column: `close`, falling back
    /// to `adj_close`, then `price`. Absence of all three is a schema error.
    pub fn close_prices(&self) -> Result<Vec<f64>, DataError> {
        if let Some(close) = self.close() {
            return Ok(close);
        }
        if let Some(adj) = self.adj_close() {
            tracing::info!("'close' column not found, using 'adj_close' as target column");
            return Ok(adj);
        }
        if let Some(price) = self.raw_price() {
            tracing::info!("'close' column not found, using 'price' as target column");
            return Ok(price);
        }
        Err(DataError::MissingPriceColumn {
            available: self.available_columns().join(", "),
        })
    }

    /// Last resolved close-equivalent price in the series.
    pub fn last_price(&self) -> Result<f64, DataError> {
        Ok(*self
            .close_prices()?
            .last()
            .expect("series is non-empty by construction"))
    }

    pub fn available_columns(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.open().is_some() {
            names.push("open");
        }
        if self.high().is_some() {
            names.push("high");
        }
        if self.low().is_some() {
            names.push("low");
        }
        if self.has_close() {
            names.push("close");
        }
        if self.adj_close().is_some() {
            names.push("adj_close");
        }
        if self.raw_price().is_some() {
            names.push("price");
        }
        if self.volume().is_some() {
            names.push("volume");
        }
        names
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Date,
    Open,
    High,
    Low,
    Close,
    AdjClose,
    Price,
    Volume,
}

impl ColumnKind {
    /// Classifies a raw column label. Substring matching (on the lowercased,
    /// alphanumeric-only form) is what flattens ticker-grouped composite
    /// labels onto their base column.
    fn classify(label: &str) -> Option<Self> {
        let folded: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if folded.contains("date") {
            Some(ColumnKind::Date)
        } else if folded.contains("adjclose") {
            Some(ColumnKind::AdjClose)
        } else if folded.contains("close") {
            Some(ColumnKind::Close)
        } else if folded.contains("volume") {
            Some(ColumnKind::Volume)
        } else if folded.contains("open") {
            Some(ColumnKind::Open)
        } else if folded.contains("high") {
            Some(ColumnKind::High)
        } else if folded.contains("low") {
            Some(ColumnKind::Low)
        } else if folded.contains("price") {
            Some(ColumnKind::Price)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_rejects_empty_series() {
        assert!(matches!(PriceSeries::new(vec![]), Err(DataError::Empty)));
    }

    #[test]
    fn test_rejects_unsorted_dates() {
        let bars = vec![
            PriceBar::new(date("2024-01-02"), 100.0),
            PriceBar::new(date("2024-01-01"), 101.0),
        ];
        let err = PriceSeries::new(bars).unwrap_err();
        assert!(matches!(err, DataError::UnsortedDates { .. }));
    }

    #[test]
    fn test_close_resolution_prefers_close() {
        let mut bar = PriceBar::new(date("2024-01-01"), 100.0);
        bar.adj_close = Some(99.0);
        let series = PriceSeries::new(vec![bar]).unwrap();
        assert_eq!(series.close_prices().unwrap(), vec![100.0]);
    }

    #[test]
    fn test_close_resolution_falls_back_to_adj_close() {
        let bar = PriceBar {
            date: date("2024-01-01"),
            open: None,
            high: None,
            low: None,
            close: None,
            adj_close: Some(99.5),
            price: Some(98.0),
            volume: None,
        };
        let series = PriceSeries::new(vec![bar]).unwrap();
        assert_eq!(series.close_prices().unwrap(), vec![99.5]);
    }

    #[test]
    fn test_missing_price_column_is_schema_error() {
        let bar = PriceBar {
            date: date("2024-01-01"),
            open: Some(1.0),
            high: None,
            low: None,
            close: None,
            adj_close: None,
            price: None,
            volume: Some(1000.0),
        };
        let series = PriceSeries::new(vec![bar]).unwrap();
        let err = series.close_prices().unwrap_err();
        assert!(matches!(err, DataError::MissingPriceColumn { .. }));
        assert!(err.to_string().contains("open"));
    }

    #[test]
    fn test_from_records_flattens_composite_labels() {
        let mut record = BTreeMap::new();
        record.insert("Date".to_string(), Value::from("2024-01-01"));
        record.insert("('Close', 'NVDA')".to_string(), Value::from(512.3));
        record.insert("('Volume', 'NVDA')".to_string(), Value::from(1_000_000.0));
        let series = PriceSeries::from_records(&[record]).unwrap();
        assert_eq!(series.close_prices().unwrap(), vec![512.3]);
        assert!(series.volume().is_some());
    }

    #[test]
    fn test_from_records_distinguishes_adj_close() {
        let mut record = BTreeMap::new();
        record.insert("Date".to_string(), Value::from("2024-01-01"));
        record.insert("Adj Close".to_string(), Value::from(42.0));
        let series = PriceSeries::from_records(&[record]).unwrap();
        assert!(!series.has_close());
        assert_eq!(series.close_prices().unwrap(), vec![42.0]);
    }
}
