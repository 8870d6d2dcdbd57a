use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lookback span requested from the market-data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
}

impl Timeframe {
    /// Calendar days covered by this lookback span.
    pub fn to_days(&self) -> i64 {
        match self {
            Timeframe::OneMonth => 30,
            Timeframe::ThreeMonths => 90,
            Timeframe::SixMonths => 180,
            Timeframe::OneYear => 365,
            Timeframe::TwoYears => 730,
            Timeframe::FiveYears => 1825,
        }
    }

    pub fn all() -> Vec<Timeframe> {
        vec![
            Timeframe::OneMonth,
            Timeframe::ThreeMonths,
            Timeframe::SixMonths,
            Timeframe::OneYear,
            Timeframe::TwoYears,
            Timeframe::FiveYears,
        ]
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::OneMonth => "1M",
            Timeframe::ThreeMonths => "3M",
            Timeframe::SixMonths => "6M",
            Timeframe::OneYear => "1Y",
            Timeframe::TwoYears => "2Y",
            Timeframe::FiveYears => "5Y",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1M" => Ok(Timeframe::OneMonth),
            "3M" => Ok(Timeframe::ThreeMonths),
            "6M" => Ok(Timeframe::SixMonths),
            "1Y" => Ok(Timeframe::OneYear),
            "2Y" => Ok(Timeframe::TwoYears),
            "5Y" => Ok(Timeframe::FiveYears),
            _ => anyhow::bail!(
                "Invalid timeframe: {}. Must be one of 1M, 3M, 6M, 1Y, 2Y, 5Y",
                s
            ),
        }
    }
}

/// Bar granularity requested from the market-data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    Day,
    Week,
}

impl Interval {
    /// Converts to the Yahoo chart API interval string.
    pub fn to_provider_string(&self) -> &'static str {
        match self {
            Interval::Day => "1d",
            Interval::Week => "1wk",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Interval::Day => "day",
            Interval::Week => "week",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Interval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" => Ok(Interval::Day),
            "week" => Ok(Interval::Week),
            _ => anyhow::bail!("Invalid interval: {}. Must be 'day' or 'week'", s),
        }
    }
}
