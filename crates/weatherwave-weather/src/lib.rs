//! Weather forecasts for WeatherWave
//!
//! Fetches ensemble forecasts from the Open-Meteo ensemble API, collapses the
//! members into hourly and daily tables, and classifies WMO weather codes.
//! Place names are resolved through Nominatim.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod aggregate;
pub mod codes;
pub mod ensemble;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod types;

pub use aggregate::{
    DailyMaxRow, DailyMeanRow, DailyTables, DailyValues, HourlyRow, HourlyTable, MemberColumn,
    TomorrowOutlook,
};
pub use codes::WeatherCategory;
pub use ensemble::{EnsembleResponse, EnsembleVariable, SeriesKey, TimeAxis, VariableSeries};
pub use geocode::Geocoder;
pub use location::{apply_map_pin, resolve_location};
pub use provider::{build_report, EnsembleProvider, ForecastReport};
pub use types::*;
