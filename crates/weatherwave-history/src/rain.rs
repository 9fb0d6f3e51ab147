//! Rainy-day counts from the description column.

use std::collections::BTreeMap;

use serde::Serialize;
use weatherwave_weather::WeatherCategory;

use crate::dataset::{DailyRecord, HistoricalDataset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RainyMonth {
    pub year: i32,
    pub month: u32,
    pub days_with_rain: usize,
}

/// Whether the day's description is one of the drizzle or rain tiers
pub fn is_rainy(record: &DailyRecord) -> bool {
    record
        .description
        .as_deref()
        .and_then(WeatherCategory::from_label)
        .is_some_and(|c| c.is_rain())
}

impl HistoricalDataset {
    /// Rows whose description marks rain
    pub fn rainy_days(&self) -> impl Iterator<Item = &DailyRecord> {
        self.records().iter().filter(|r| is_rainy(r))
    }

    /// Rainy days per (year, month), ascending; months without rain are absent
    pub fn rain_months(&self) -> Vec<RainyMonth> {
        let mut counts: BTreeMap<(i32, u32), usize> = BTreeMap::new();
        for record in self.rainy_days() {
            *counts.entry((record.year(), record.month())).or_default() += 1;
        }

        counts
            .into_iter()
            .map(|((year, month), days_with_rain)| RainyMonth {
                year,
                month,
                days_with_rain,
            })
            .collect()
    }
}
