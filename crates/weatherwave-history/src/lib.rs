//! Historical weather exploration for WeatherWave
//!
//! Loads the daily observation dataset and computes the tables behind the
//! exploration views: summaries, missing values, correlations, per-month and
//! per-year distributions, histograms and rainy-day counts.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod dataset;
pub mod error;
pub mod rain;
pub mod stats;

pub use dataset::{DailyRecord, HistoricalDataset, Overview, DATE_COLUMN, DESCRIPTION_COLUMN};
pub use error::HistoryError;
pub use rain::{is_rainy, RainyMonth};
pub use stats::{
    ColumnSummary, CorrelationMatrix, GroupBy, GroupSpread, Histogram, Spread,
    MAX_HISTOGRAM_BINS,
};
