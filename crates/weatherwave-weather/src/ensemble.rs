//! Ensemble API response model and decoder.
//!
//! The JSON `hourly` object carries a `time` array (unix seconds with
//! `timeformat=unixtime`) and one array per series. Series keys look like
//! `temperature_2m` (control run, member 0), `temperature_2m_member07`, and, when
//! several models are requested, `temperature_2m_member07_gfs_seamless`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::WeatherError;

/// Hourly variables requested from the ensemble API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsembleVariable {
    Temperature,
    WeatherCode,
    RelativeHumidity,
    WindSpeed,
}

impl EnsembleVariable {
    pub const ALL: [EnsembleVariable; 4] = [
        Self::Temperature,
        Self::WeatherCode,
        Self::RelativeHumidity,
        Self::WindSpeed,
    ];

    /// Name used in the `hourly` request parameter
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature_2m",
            Self::WeatherCode => "weather_code",
            Self::RelativeHumidity => "relative_humidity_2m",
            Self::WindSpeed => "wind_speed_10m",
        }
    }

    /// Variable name without the height suffix
    pub fn base_name(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::WeatherCode => "weather_code",
            Self::RelativeHumidity => "relative_humidity",
            Self::WindSpeed => "wind_speed",
        }
    }

    /// The only measurement height accepted for this variable (meters)
    pub fn canonical_altitude(&self) -> Option<u32> {
        match self {
            Self::Temperature | Self::RelativeHumidity => Some(2),
            Self::WeatherCode => None,
            Self::WindSpeed => Some(10),
        }
    }

    pub fn from_base_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.base_name() == name)
    }
}

/// Regular time index described by (start, end, interval), end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeAxis {
    /// Unix seconds of the first slot
    pub start: i64,
    /// Unix seconds one interval past the last slot
    pub end: i64,
    /// Slot width in seconds
    pub interval: i64,
}

const DEFAULT_INTERVAL_SECS: i64 = 3600;
pub const SECONDS_PER_DAY: i64 = 86_400;

fn axis_error(message: String) -> WeatherError {
    WeatherError::TimeAxis(message)
}

fn utc(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}

impl TimeAxis {
    /// The interval must be positive and divide a day evenly, and both ends
    /// must be representable as UTC instants.
    pub fn new(start: i64, end: i64, interval: i64) -> Result<Self, WeatherError> {
        if interval <= 0 {
            return Err(axis_error(format!("interval must be positive, got {}", interval)));
        }
        if SECONDS_PER_DAY % interval != 0 {
            return Err(axis_error(format!(
                "interval {}s does not divide a day",
                interval
            )));
        }
        if end < start {
            return Err(axis_error(format!("end {} precedes start {}", end, start)));
        }
        if utc(start).is_none() || utc(end).is_none() {
            return Err(axis_error(format!("timestamps {}..{} out of range", start, end)));
        }
        Ok(Self {
            start,
            end,
            interval,
        })
    }

    /// Derive the axis from explicit timestamps, which must be evenly spaced.
    pub fn from_unix_times(times: &[i64]) -> Result<Self, WeatherError> {
        let (first, last) = match (times.first(), times.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(axis_error("no timestamps".to_string())),
        };

        let interval = match times.get(1) {
            Some(second) => second
                .checked_sub(first)
                .ok_or_else(|| axis_error(format!("step from {} to {} overflows", first, second)))?,
            None => DEFAULT_INTERVAL_SECS,
        };
        if interval <= 0 {
            return Err(axis_error(format!(
                "timestamps not increasing (step {})",
                interval
            )));
        }
        if let Some(w) = times
            .windows(2)
            .find(|w| w[1].checked_sub(w[0]) != Some(interval))
        {
            return Err(axis_error(format!(
                "uneven spacing between {} and {}",
                w[0], w[1]
            )));
        }

        let end = last
            .checked_add(interval)
            .ok_or_else(|| axis_error(format!("last timestamp {} overflows", last)))?;
        Self::new(first, end, interval)
    }

    /// Number of slots: ceil((end - start) / interval)
    pub fn len(&self) -> usize {
        let span = self.end - self.start;
        ((span + self.interval - 1) / self.interval) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One instant per slot, index-aligned with the series values
    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        // every slot lies within [start, end], checked in new()
        (0..self.len()).map(move |i| {
            utc(self.start + i as i64 * self.interval).unwrap_or(DateTime::UNIX_EPOCH)
        })
    }
}

/// Identity of one series in the response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesKey {
    /// Variable name without height suffix, e.g. `wind_speed`
    pub name: String,
    /// Height in meters from a `_<N>m` suffix
    pub altitude: Option<u32>,
    /// Ensemble member; 0 is the control run
    pub member: u32,
    /// Model suffix when several models were requested
    pub model: Option<String>,
}

impl SeriesKey {
    /// Parse a response key against the requested model identifiers
    pub fn parse(key: &str, models: &[String]) -> Self {
        let mut rest = key;

        // Longest suffix wins so `icon_seamless` is not mistaken for `seamless`
        let mut model = None;
        let mut best_len = 0;
        for m in models {
            let suffix = format!("_{}", m);
            if rest.ends_with(&suffix) && suffix.len() > best_len && rest.len() > suffix.len() {
                best_len = suffix.len();
                model = Some(m.clone());
            }
        }
        if best_len > 0 {
            rest = &rest[..rest.len() - best_len];
        }

        let mut member = 0;
        if let Some(idx) = rest.rfind("_member") {
            let digits = &rest[idx + "_member".len()..];
            if let Ok(n) = digits.parse::<u32>() {
                member = n;
                rest = &rest[..idx];
            }
        }

        let mut altitude = None;
        if let Some(idx) = rest.rfind('_') {
            let tail = &rest[idx + 1..];
            if let Some(number) = tail.strip_suffix('m') {
                if let Ok(h) = number.parse::<u32>() {
                    altitude = Some(h);
                    rest = &rest[..idx];
                }
            }
        }

        Self {
            name: rest.to_string(),
            altitude,
            member,
            model,
        }
    }

    /// Declared variable this series feeds, if its height is the canonical one
    pub fn accepted_variable(&self) -> Option<EnsembleVariable> {
        let variable = EnsembleVariable::from_base_name(&self.name)?;
        (variable.canonical_altitude() == self.altitude).then_some(variable)
    }
}

/// One member's trajectory for one variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSeries {
    pub key: SeriesKey,
    pub values: Vec<Option<f64>>,
}

/// Decoded ensemble response
#[derive(Debug, Clone, Serialize)]
pub struct EnsembleResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub time: TimeAxis,
    /// Sorted by (model request order, variable, member)
    pub series: Vec<VariableSeries>,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    elevation: f64,
    hourly: Option<BTreeMap<String, serde_json::Value>>,
}

impl EnsembleResponse {
    /// Decode a JSON body. `models` is the request's model list, used to strip key suffixes.
    pub fn from_json(body: &str, models: &[String]) -> Result<Self, WeatherError> {
        let raw: RawResponse = serde_json::from_str(body)?;
        let mut hourly = raw
            .hourly
            .ok_or_else(|| WeatherError::Malformed("response has no hourly block".to_string()))?;

        let times = hourly
            .remove("time")
            .ok_or_else(|| WeatherError::Malformed("hourly block has no time array".to_string()))?;
        let times: Vec<i64> = serde_json::from_value(times)
            .map_err(|e| WeatherError::Malformed(format!("time: {}", e)))?;
        let time = TimeAxis::from_unix_times(&times)?;

        let mut series = Vec::with_capacity(hourly.len());
        for (name, value) in hourly {
            let values: Vec<Option<f64>> = serde_json::from_value(value)
                .map_err(|e| WeatherError::Malformed(format!("{}: {}", name, e)))?;
            if values.len() != time.len() {
                return Err(WeatherError::Malformed(format!(
                    "{} has {} values for {} timestamps",
                    name,
                    values.len(),
                    time.len()
                )));
            }
            series.push(VariableSeries {
                key: SeriesKey::parse(&name, models),
                values,
            });
        }

        let model_rank = |key: &SeriesKey| {
            key.model
                .as_ref()
                .and_then(|m| models.iter().position(|x| x == m))
                .unwrap_or(0)
        };
        series.sort_by(|a, b| {
            model_rank(&a.key)
                .cmp(&model_rank(&b.key))
                .then_with(|| a.key.name.cmp(&b.key.name))
                .then_with(|| a.key.altitude.cmp(&b.key.altitude))
                .then_with(|| a.key.member.cmp(&b.key.member))
        });

        tracing::debug!(
            "Decoded {} series over {} timestamps",
            series.len(),
            time.len()
        );

        Ok(Self {
            latitude: raw.latitude,
            longitude: raw.longitude,
            elevation: raw.elevation,
            time,
            series,
        })
    }
}
