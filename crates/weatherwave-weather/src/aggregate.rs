//! Ensemble aggregation: member collapse per hour, then daily resampling.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::codes::WeatherCategory;
use crate::ensemble::{EnsembleResponse, EnsembleVariable, SeriesKey, SECONDS_PER_DAY};

/// One (variable, member) column of the hourly table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberColumn {
    pub variable: EnsembleVariable,
    pub member: u32,
    pub model: Option<String>,
}

impl MemberColumn {
    /// Column label such as `temperature_2m_member3`
    pub fn label(&self) -> String {
        let mut label = format!("{}_member{}", self.variable.api_name(), self.member);
        if let Some(model) = &self.model {
            label.push('_');
            label.push_str(model);
        }
        label
    }
}

/// All members at one timestamp plus the derived per-hour summaries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRow {
    pub time: DateTime<Utc>,
    /// Aligned with [`HourlyTable::columns`]
    pub members: Vec<Option<f64>>,
    pub max_temp: Option<f64>,
    pub max_weather_code: Option<f64>,
    pub mode_weather_code: Option<f64>,
    pub max_relative_humidity: Option<f64>,
    pub max_wind_speed: Option<f64>,
    /// Category of the rounded max weather code
    pub category: WeatherCategory,
}

impl HourlyRow {
    /// Row with derived fields only (no member columns)
    pub fn summary(
        time: DateTime<Utc>,
        max_temp: Option<f64>,
        max_weather_code: Option<f64>,
        max_relative_humidity: Option<f64>,
        max_wind_speed: Option<f64>,
    ) -> Self {
        Self {
            time,
            members: Vec::new(),
            max_temp,
            max_weather_code,
            mode_weather_code: max_weather_code,
            max_relative_humidity,
            max_wind_speed,
            category: WeatherCategory::from_code_value(max_weather_code),
        }
    }

    fn fields(&self) -> [Option<f64>; 4] {
        [
            self.max_temp,
            self.max_weather_code,
            self.max_relative_humidity,
            self.max_wind_speed,
        ]
    }
}

/// Hourly table: one row per slot of the time axis
#[derive(Debug, Clone, Serialize)]
pub struct HourlyTable {
    /// Slot width in seconds
    pub interval: i64,
    pub columns: Vec<MemberColumn>,
    pub rows: Vec<HourlyRow>,
}

/// Aggregated values of one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyValues {
    pub max_temp: f64,
    pub max_weather_code: f64,
    pub max_relative_humidity: f64,
    pub max_wind_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMeanRow {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: DailyValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMaxRow {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: DailyValues,
    pub category: WeatherCategory,
}

/// Daily mean and daily max tables; incomplete days appear in neither
#[derive(Debug, Clone, Default, Serialize)]
pub struct DailyTables {
    pub mean: Vec<DailyMeanRow>,
    pub max: Vec<DailyMaxRow>,
}

/// Forecast for the day after today
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TomorrowOutlook {
    pub date: NaiveDate,
    /// Daily mean of the hourly member-max temperature, rounded
    pub temperature: f64,
    /// Category of the rounded daily max weather code
    pub category: WeatherCategory,
}

/// Largest present value; `None` when every input is missing
pub fn max_of(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    values
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
}

/// Most frequent present value. Ties go to the value encountered first.
pub fn mode_of(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for v in values.into_iter().flatten().filter(|v| !v.is_nan()) {
        match counts.iter_mut().find(|(seen, _)| *seen == v) {
            Some((_, n)) => *n += 1,
            None => counts.push((v, 1)),
        }
    }

    let mut best: Option<(f64, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, n)| count > n) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

type AcceptedSeries<'a> = (EnsembleVariable, &'a SeriesKey, &'a [Option<f64>]);

/// Values of one hour's members that belong to `wanted`
fn values_of<'a>(
    accepted: &'a [AcceptedSeries<'a>],
    members: &'a [Option<f64>],
    wanted: EnsembleVariable,
) -> impl Iterator<Item = Option<f64>> + 'a {
    accepted
        .iter()
        .zip(members)
        .filter(move |((variable, _, _), _)| *variable == wanted)
        .map(|(_, value)| *value)
}

fn mean_of(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

impl HourlyTable {
    /// Pivot the response into one row per timestamp and collapse members.
    ///
    /// Series whose variable is not requested, or whose height differs from the
    /// variable's canonical height, are dropped.
    pub fn from_response(response: &EnsembleResponse) -> Self {
        let accepted: Vec<AcceptedSeries<'_>> = response
            .series
            .iter()
            .filter_map(|s| match s.key.accepted_variable() {
                Some(variable) => Some((variable, &s.key, s.values.as_slice())),
                None => {
                    tracing::debug!(
                        "Dropping series {} (altitude {:?})",
                        s.key.name,
                        s.key.altitude
                    );
                    None
                }
            })
            .collect();

        let columns: Vec<MemberColumn> = accepted
            .iter()
            .map(|(variable, key, _)| MemberColumn {
                variable: *variable,
                member: key.member,
                model: key.model.clone(),
            })
            .collect();

        let rows = response
            .time
            .timestamps()
            .enumerate()
            .map(|(i, time)| {
                let members: Vec<Option<f64>> = accepted
                    .iter()
                    .map(|(_, _, values)| values.get(i).copied().flatten())
                    .collect();
                let of = |wanted| values_of(&accepted, &members, wanted);

                let max_weather_code = max_of(of(EnsembleVariable::WeatherCode));
                HourlyRow {
                    time,
                    max_temp: max_of(of(EnsembleVariable::Temperature)),
                    max_weather_code,
                    mode_weather_code: mode_of(of(EnsembleVariable::WeatherCode)),
                    max_relative_humidity: max_of(of(EnsembleVariable::RelativeHumidity)),
                    max_wind_speed: max_of(of(EnsembleVariable::WindSpeed)),
                    category: WeatherCategory::from_code_value(max_weather_code),
                    members,
                }
            })
            .collect();

        Self {
            interval: response.time.interval,
            columns,
            rows,
        }
    }

    /// Slots per calendar day, when the interval divides a day evenly
    fn slots_per_day(&self) -> Option<usize> {
        (self.interval > 0 && SECONDS_PER_DAY % self.interval == 0)
            .then(|| (SECONDS_PER_DAY / self.interval) as usize)
    }

    /// Bucket rows by UTC calendar day into mean and max tables.
    ///
    /// A day is kept only if it has every slot and no derived field is missing
    /// in any of them.
    pub fn resample_daily(&self) -> DailyTables {
        let mut buckets: BTreeMap<NaiveDate, Vec<&HourlyRow>> = BTreeMap::new();
        for row in &self.rows {
            buckets.entry(row.time.date_naive()).or_default().push(row);
        }

        let expected = self.slots_per_day();
        let mut tables = DailyTables::default();

        for (date, rows) in buckets {
            if expected.is_some_and(|n| rows.len() != n) {
                tracing::debug!("Dropping {}: {} of {:?} slots", date, rows.len(), expected);
                continue;
            }

            let mut columns: [Vec<f64>; 4] = Default::default();
            let mut complete = true;
            for row in &rows {
                for (column, field) in columns.iter_mut().zip(row.fields()) {
                    match field {
                        Some(v) if !v.is_nan() => column.push(v),
                        _ => complete = false,
                    }
                }
            }
            if !complete {
                tracing::debug!("Dropping {}: missing values", date);
                continue;
            }

            let [temp, code, humidity, wind] = &columns;
            let mean = DailyValues {
                max_temp: mean_of(temp),
                max_weather_code: mean_of(code),
                max_relative_humidity: mean_of(humidity),
                max_wind_speed: mean_of(wind),
            };
            // complete guarantees non-empty columns
            let max = DailyValues {
                max_temp: max_of(temp.iter().copied().map(Some)).unwrap_or(f64::NAN),
                max_weather_code: max_of(code.iter().copied().map(Some)).unwrap_or(f64::NAN),
                max_relative_humidity: max_of(humidity.iter().copied().map(Some))
                    .unwrap_or(f64::NAN),
                max_wind_speed: max_of(wind.iter().copied().map(Some)).unwrap_or(f64::NAN),
            };

            tables.mean.push(DailyMeanRow { date, values: mean });
            tables.max.push(DailyMaxRow {
                date,
                values: max,
                category: WeatherCategory::from_code_value(Some(max.max_weather_code)),
            });
        }

        tables
    }
}

impl DailyTables {
    pub fn mean_for(&self, date: NaiveDate) -> Option<&DailyMeanRow> {
        self.mean.iter().find(|r| r.date == date)
    }

    pub fn max_for(&self, date: NaiveDate) -> Option<&DailyMaxRow> {
        self.max.iter().find(|r| r.date == date)
    }

    /// Outlook for `today + 1`, or `None` when that day is not in both tables
    pub fn tomorrow(&self, today: NaiveDate) -> Option<TomorrowOutlook> {
        let date = today.succ_opt()?;
        let mean = self.mean_for(date)?;
        let max = self.max_for(date)?;

        Some(TomorrowOutlook {
            date,
            temperature: mean.values.max_temp.round_ties_even(),
            category: WeatherCategory::from_code_value(Some(max.values.max_weather_code)),
        })
    }
}
