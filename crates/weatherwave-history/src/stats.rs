//! Descriptive statistics over the numeric columns.
//!
//! Semantics follow the usual dataframe conventions: missing values are
//! skipped, the standard deviation is the sample one (n - 1), and quantiles
//! interpolate linearly between order statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dataset::HistoricalDataset;
use crate::error::HistoryError;

/// `describe()` row for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Five-number summary plus count
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spread {
    pub count: usize,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

fn present(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().filter(|v| !v.is_nan()).collect()
}

/// Linear-interpolated quantile of sorted data
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation; `None` below two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

impl Spread {
    pub fn of(values: &[Option<f64>]) -> Option<Self> {
        let data = sorted(present(values));
        Some(Self {
            count: data.len(),
            min: *data.first()?,
            q25: quantile(&data, 0.25)?,
            median: quantile(&data, 0.5)?,
            q75: quantile(&data, 0.75)?,
            max: *data.last()?,
        })
    }
}

impl ColumnSummary {
    pub fn of(column: &str, values: &[Option<f64>]) -> Self {
        let data = sorted(present(values));
        Self {
            column: column.to_string(),
            count: data.len(),
            mean: mean(&data),
            std: sample_std(&data),
            min: data.first().copied(),
            q25: quantile(&data, 0.25),
            median: quantile(&data, 0.5),
            q75: quantile(&data, 0.75),
            max: data.last().copied(),
        }
    }
}

/// Pearson correlation over pairwise-complete observations
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) if !x.is_nan() && !y.is_nan() => Some((*x, *y)),
            _ => None,
        })
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// `values[i][j]` is the correlation of `columns[i]` with `columns[j]`
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values.get(i)?.get(j).copied().flatten()
    }
}

/// Calendar grouping for distribution comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Month,
    Year,
}

/// Spread of one column within one calendar group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSpread {
    pub group: i32,
    pub column: String,
    #[serde(flatten)]
    pub spread: Spread,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub column: String,
    /// `bins + 1` ascending edges; the last bin includes its right edge
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Histograms never allocate more bins than this
pub const MAX_HISTOGRAM_BINS: usize = 1000;

impl HistoricalDataset {
    /// Summary rows for every numeric column
    pub fn describe(&self) -> Vec<ColumnSummary> {
        self.columns()
            .iter()
            .map(|name| ColumnSummary::of(name, &self.column(name).unwrap_or_default()))
            .collect()
    }

    /// Summary rows for selected columns
    pub fn describe_columns(&self, names: &[&str]) -> Result<Vec<ColumnSummary>, HistoryError> {
        names
            .iter()
            .map(|name| Ok(ColumnSummary::of(name, &self.column(name)?)))
            .collect()
    }

    /// Missing-cell count per numeric column, in column order
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let missing = self
                    .records()
                    .iter()
                    .filter(|r| r.values.get(i).copied().flatten().map_or(true, f64::is_nan))
                    .count();
                (name.clone(), missing)
            })
            .collect()
    }

    pub fn correlation(&self) -> CorrelationMatrix {
        let columns: Vec<Vec<Option<f64>>> = self
            .columns()
            .iter()
            .map(|name| self.column(name).unwrap_or_default())
            .collect();

        let values = columns
            .iter()
            .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
            .collect();

        CorrelationMatrix {
            columns: self.columns().to_vec(),
            values,
        }
    }

    /// Spread of each selected column per month (1-12) or year, groups ascending
    pub fn distribution(&self, names: &[&str], by: GroupBy) -> Result<Vec<GroupSpread>, HistoryError> {
        let mut out = Vec::new();
        for name in names {
            let idx = self.column_index(name)?;
            let mut groups: BTreeMap<i32, Vec<Option<f64>>> = BTreeMap::new();
            for record in self.records() {
                let key = match by {
                    GroupBy::Month => record.month() as i32,
                    GroupBy::Year => record.year(),
                };
                groups
                    .entry(key)
                    .or_default()
                    .push(record.values.get(idx).copied().flatten());
            }

            for (group, values) in groups {
                if let Some(spread) = Spread::of(&values) {
                    out.push(GroupSpread {
                        group,
                        column: name.to_string(),
                        spread,
                    });
                }
            }
        }
        Ok(out)
    }

    /// Equal-width histogram of one column
    pub fn histogram(&self, name: &str, bins: usize) -> Result<Histogram, HistoryError> {
        let data = present(&self.column(name)?);
        let bins = bins.clamp(1, MAX_HISTOGRAM_BINS);

        let (lo, hi) = match (
            data.iter().copied().reduce(f64::min),
            data.iter().copied().reduce(f64::max),
        ) {
            (Some(lo), Some(hi)) if hi > lo => (lo, hi),
            (Some(v), Some(_)) => (v - 0.5, v + 0.5),
            _ => {
                return Ok(Histogram {
                    column: name.to_string(),
                    edges: Vec::new(),
                    counts: Vec::new(),
                })
            }
        };

        let width = (hi - lo) / bins as f64;
        let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0; bins];
        for v in data {
            let bin = (((v - lo) / width) as usize).min(bins - 1);
            counts[bin] += 1;
        }

        Ok(Histogram {
            column: name.to_string(),
            edges,
            counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_quantiles_interpolate() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&data, 0.25), Some(1.75));
        assert_eq!(quantile(&data, 0.5), Some(2.5));
        assert_eq!(quantile(&data, 0.75), Some(3.25));
        assert_eq!(quantile(&[7.0], 0.75), Some(7.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_sample_std() {
        // mean 5, squared deviations sum to 32, n - 1 = 7
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(close(sample_std(&data), (32.0_f64 / 7.0).sqrt()));
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn test_summary_skips_missing() {
        let summary = ColumnSummary::of("tmax", &[Some(4.0), None, Some(1.0), Some(3.0), Some(2.0)]);
        assert_eq!(summary.count, 4);
        assert!(close(summary.mean, 2.5));
        assert_eq!(summary.min, Some(1.0));
        assert_eq!(summary.median, Some(2.5));
        assert_eq!(summary.max, Some(4.0));

        let empty = ColumnSummary::of("tmax", &[None, None]);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.mean, None);
        assert_eq!(empty.q25, None);
    }

    #[test]
    fn test_pearson() {
        let a = [Some(1.0), Some(2.0), Some(3.0), None];
        let b = [Some(2.0), Some(4.0), Some(6.0), Some(100.0)];
        assert!(close(pearson(&a, &b), 1.0));

        let c = [Some(3.0), Some(2.0), Some(1.0), Some(0.0)];
        assert!(close(pearson(&a, &c), -1.0));

        let flat = [Some(1.0), Some(1.0), Some(1.0), Some(1.0)];
        assert_eq!(pearson(&a, &flat), None);
    }
}
