//! Exploration page: tables computed from the historical dataset.

use std::fmt;

use serde::Serialize;
use weatherwave_core::{AppError, Config};
use weatherwave_history::{
    ColumnSummary, CorrelationMatrix, GroupBy, GroupSpread, HistoricalDataset, Histogram,
    Overview, RainyMonth,
};

use crate::cli::{ExploreArgs, ExploreView};
use crate::render::{num, Table};

const DISTRIBUTION_COLUMNS: [&str; 3] = ["tmax", "tmin", "tmean"];
const HISTOGRAM_COLUMN: &str = "tmax";
const BAR_WIDTH: usize = 40;

pub struct ExploreContext {
    dataset: HistoricalDataset,
}

impl ExploreContext {
    pub fn load(config: &Config) -> Result<Self, AppError> {
        Ok(Self::new(HistoricalDataset::load_csv(&config.dataset.path)?))
    }

    pub fn new(dataset: HistoricalDataset) -> Self {
        Self { dataset }
    }

    pub fn explore(&self, args: &ExploreArgs) -> Result<ExplorePage<'_>, AppError> {
        let selected: Vec<&str> = args.columns.iter().map(String::as_str).collect();
        let data = &self.dataset;

        let page = match args.view {
            ExploreView::Overview => ExplorePage::Overview(data.overview(args.head)),
            ExploreView::Describe if selected.is_empty() => ExplorePage::Describe(data.describe()),
            ExploreView::Describe => ExplorePage::Describe(data.describe_columns(&selected)?),
            ExploreView::Missing => ExplorePage::Missing(
                data.missing_counts()
                    .into_iter()
                    .map(|(column, missing)| MissingCount { column, missing })
                    .collect(),
            ),
            ExploreView::Correlation => ExplorePage::Correlation(data.correlation()),
            ExploreView::Distribution => {
                let names = if selected.is_empty() {
                    DISTRIBUTION_COLUMNS.to_vec()
                } else {
                    selected
                };
                let by = GroupBy::from(args.by);
                ExplorePage::Distribution {
                    by,
                    groups: data.distribution(&names, by)?,
                }
            }
            ExploreView::Histogram => {
                let name = selected.first().copied().unwrap_or(HISTOGRAM_COLUMN);
                ExplorePage::Histogram(data.histogram(name, usize::from(args.bins))?)
            }
            ExploreView::Rain => ExplorePage::Rain {
                rainy_days: data.rainy_days().count(),
                months: data.rain_months(),
            },
        };
        Ok(page)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

#[derive(Debug, Serialize)]
#[serde(tag = "view", content = "data", rename_all = "snake_case")]
pub enum ExplorePage<'a> {
    Overview(Overview<'a>),
    Describe(Vec<ColumnSummary>),
    Missing(Vec<MissingCount>),
    Correlation(CorrelationMatrix),
    Distribution { by: GroupBy, groups: Vec<GroupSpread> },
    Histogram(Histogram),
    Rain { rainy_days: usize, months: Vec<RainyMonth> },
}

fn overview_table(overview: &Overview<'_>) -> Table {
    let mut headers = vec!["date".to_string()];
    headers.extend(overview.columns.iter().cloned());

    let mut table = Table::new(headers);
    for record in overview.head {
        let mut cells = vec![record.date.to_string()];
        cells.extend(record.values.iter().map(|v| num(*v, 2)));
        table.row(cells);
    }
    table
}

fn describe_table(summaries: &[ColumnSummary]) -> Table {
    let mut table = Table::new(["column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"]);
    for s in summaries {
        table.row([
            s.column.clone(),
            s.count.to_string(),
            num(s.mean, 3),
            num(s.std, 3),
            num(s.min, 3),
            num(s.q25, 3),
            num(s.median, 3),
            num(s.q75, 3),
            num(s.max, 3),
        ]);
    }
    table
}

fn correlation_table(matrix: &CorrelationMatrix) -> Table {
    let mut headers = vec![String::new()];
    headers.extend(matrix.columns.iter().cloned());

    let mut table = Table::new(headers);
    for (name, row) in matrix.columns.iter().zip(&matrix.values) {
        let mut cells = vec![name.clone()];
        cells.extend(row.iter().map(|v| num(*v, 2)));
        table.row(cells);
    }
    table
}

fn distribution_table(by: GroupBy, groups: &[GroupSpread]) -> Table {
    let group = match by {
        GroupBy::Month => "month",
        GroupBy::Year => "year",
    };
    let mut table = Table::new(["column", group, "count", "min", "25%", "50%", "75%", "max"]);
    for g in groups {
        let s = &g.spread;
        table.row([
            g.column.clone(),
            g.group.to_string(),
            s.count.to_string(),
            num(Some(s.min), 2),
            num(Some(s.q25), 2),
            num(Some(s.median), 2),
            num(Some(s.q75), 2),
            num(Some(s.max), 2),
        ]);
    }
    table
}

fn histogram_table(histogram: &Histogram) -> Table {
    let peak = histogram.counts.iter().copied().max().unwrap_or(0).max(1);
    let mut table = Table::new(["from", "to", "count", ""]);
    for (i, count) in histogram.counts.iter().enumerate() {
        let lo = histogram.edges.get(i).copied();
        let hi = histogram.edges.get(i + 1).copied();
        table.row([
            num(lo, 2),
            num(hi, 2),
            count.to_string(),
            "#".repeat(count * BAR_WIDTH / peak),
        ]);
    }
    table
}

fn rain_table(months: &[RainyMonth]) -> Table {
    let mut table = Table::new(["year", "month", "days with rain"]);
    for m in months {
        table.row([m.year.to_string(), m.month.to_string(), m.days_with_rain.to_string()]);
    }
    table
}

impl fmt::Display for ExplorePage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplorePage::Overview(overview) => {
                writeln!(f, "Shape: ({}, {})", overview.rows, overview.columns.len())?;
                writeln!(f, "Columns: {}\n", overview.columns.join(", "))?;
                write!(f, "{}", overview_table(overview))
            }
            ExplorePage::Describe(summaries) => write!(f, "{}", describe_table(summaries)),
            ExplorePage::Missing(counts) => {
                let mut table = Table::new(["column", "missing"]);
                for c in counts {
                    table.row([c.column.clone(), c.missing.to_string()]);
                }
                write!(f, "{}", table)
            }
            ExplorePage::Correlation(matrix) => write!(f, "{}", correlation_table(matrix)),
            ExplorePage::Distribution { by, groups } => {
                write!(f, "{}", distribution_table(*by, groups))
            }
            ExplorePage::Histogram(histogram) if histogram.counts.is_empty() => {
                writeln!(f, "{}: no values", histogram.column)
            }
            ExplorePage::Histogram(histogram) => {
                writeln!(f, "Histogram of {}", histogram.column)?;
                write!(f, "{}", histogram_table(histogram))
            }
            ExplorePage::Rain { rainy_days, months } => {
                writeln!(f, "Days with rain: {}\n", rainy_days)?;
                write!(f, "{}", rain_table(months))
            }
        }
    }
}
