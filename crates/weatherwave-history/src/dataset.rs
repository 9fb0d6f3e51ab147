//! Daily observation table loaded from CSV.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::HistoryError;

pub const DATE_COLUMN: &str = "date";
/// Textual description column; never part of the numeric statistics
pub const DESCRIPTION_COLUMN: &str = "weather_code";

/// One day of observations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    /// Aligned with [`HistoricalDataset::columns`]; empty cells are `None`
    pub values: Vec<Option<f64>>,
    /// Text weather label; only feeds the rain counts
    #[serde(skip)]
    pub description: Option<String>,
}

impl DailyRecord {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoricalDataset {
    columns: Vec<String>,
    records: Vec<DailyRecord>,
}

/// Shape, column names and leading rows
#[derive(Debug, Clone, Serialize)]
pub struct Overview<'a> {
    pub rows: usize,
    pub columns: &'a [String],
    pub head: &'a [DailyRecord],
}

fn parse_cell(raw: &str) -> Result<Option<f64>, String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| format!("not a number: {:?}", raw))
}

impl HistoricalDataset {
    pub fn new(columns: Vec<String>, records: Vec<DailyRecord>) -> Self {
        Self { columns, records }
    }

    /// Load a CSV with a `date` column (YYYY-MM-DD), numeric columns, and an
    /// optional `weather_code` description column.
    pub fn load_csv(path: &Path) -> Result<Self, HistoryError> {
        if !path.exists() {
            return Err(HistoryError::NotFound(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|e| HistoryError::Csv(e.into()))?;
        let dataset = Self::from_reader(BufReader::new(file))?;

        tracing::info!(
            "Loaded {} rows x {} columns from {}",
            dataset.records.len(),
            dataset.columns.len(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, HistoryError> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();

        let date_idx = headers
            .iter()
            .position(|h| h == DATE_COLUMN)
            .ok_or_else(|| HistoryError::UnknownColumn(DATE_COLUMN.to_string()))?;
        let description_idx = headers.iter().position(|h| h == DESCRIPTION_COLUMN);

        let numeric: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != date_idx && Some(*i) != description_idx)
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());
            let malformed = |message: String| HistoryError::Malformed { line, message };

            let raw_date = record.get(date_idx).unwrap_or_default().trim();
            // Timestamps like "2020-01-01 00:00:00" keep only the date part
            let date_part = raw_date.split([' ', 'T']).next().unwrap_or_default();
            let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                .map_err(|e| malformed(format!("bad date {:?}: {}", raw_date, e)))?;

            let values = numeric
                .iter()
                .map(|(i, name)| {
                    parse_cell(record.get(*i).unwrap_or_default())
                        .map_err(|e| malformed(format!("{}: {}", name, e)))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let description = description_idx
                .and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            records.push(DailyRecord {
                date,
                values,
                description,
            });
        }

        if records.is_empty() {
            return Err(HistoryError::Empty);
        }

        Ok(Self {
            columns: numeric.into_iter().map(|(_, name)| name).collect(),
            records,
        })
    }

    /// Numeric column names in file order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    /// (rows, numeric columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.records.len(), self.columns.len())
    }

    pub fn overview(&self, head: usize) -> Overview<'_> {
        Overview {
            rows: self.records.len(),
            columns: &self.columns,
            head: &self.records[..head.min(self.records.len())],
        }
    }

    pub fn column_index(&self, name: &str) -> Result<usize, HistoryError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| HistoryError::UnknownColumn(name.to_string()))
    }

    /// All values of one column, missing cells included
    pub fn column(&self, name: &str) -> Result<Vec<Option<f64>>, HistoryError> {
        let idx = self.column_index(name)?;
        Ok(self
            .records
            .iter()
            .map(|r| r.values.get(idx).copied().flatten())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
date,tmax,tmin,weather_code,prec_sum
2021-01-01,30.5,22.1,Light Rain,4.2
2021-01-02,31.0,,Overcast,0
2021-02-01 00:00:00,29.0,21.0,,nan
";

    #[test]
    fn test_parses_columns_and_missing() {
        let data = HistoricalDataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(data.columns(), ["tmax", "tmin", "prec_sum"]);
        assert_eq!(data.shape(), (3, 3));

        assert_eq!(data.column("tmin").unwrap(), vec![Some(22.1), None, Some(21.0)]);
        assert_eq!(data.column("prec_sum").unwrap(), vec![Some(4.2), Some(0.0), None]);
        assert_eq!(data.records()[0].description.as_deref(), Some("Light Rain"));
        assert_eq!(data.records()[2].description, None);
        assert_eq!(data.records()[2].month(), 2);
    }

    #[test]
    fn test_description_column_is_not_numeric() {
        let data = HistoricalDataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert!(matches!(
            data.column("weather_code"),
            Err(HistoryError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let csv = "date,tmax\n2021-01-01,30\n2021-01-02,hot\n";
        match HistoricalDataset::from_reader(csv.as_bytes()) {
            Err(HistoryError::Malformed { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("tmax"));
            }
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_date_column() {
        let csv = "day,tmax\n2021-01-01,30\n";
        assert!(matches!(
            HistoricalDataset::from_reader(csv.as_bytes()),
            Err(HistoryError::UnknownColumn(c)) if c == "date"
        ));
    }

    #[test]
    fn test_overview_head() {
        let data = HistoricalDataset::from_reader(SAMPLE.as_bytes()).unwrap();
        let overview = data.overview(2);
        assert_eq!(overview.rows, 3);
        assert_eq!(overview.head.len(), 2);
        assert_eq!(data.overview(10).head.len(), 3);
    }
}
