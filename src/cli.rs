//! Command-line surface: one subcommand per dashboard page.

use std::path::PathBuf;

use clap::{ArgMatches, Args, Parser, Subcommand, ValueEnum};
use weatherwave_history::GroupBy;
use weatherwave_predict::InputView;

#[derive(Debug, Parser)]
#[command(name = "weatherwave")]
#[command(about = "Ensemble weather forecasts, next-day temperature models and historical exploration", long_about = None)]
pub struct Cli {
    /// Config file (default: <config dir>/weatherwave/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print JSON instead of text tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch and aggregate the ensemble forecast for a place
    Forecast(ForecastArgs),

    /// Predict tomorrow's maximum temperature from daily features
    Predict(PredictArgs),

    /// Explore the historical dataset
    Explore(ExploreArgs),
}

#[derive(Debug, Args)]
pub struct ForecastArgs {
    /// Place name to geocode (default location when omitted)
    pub location: Vec<String>,

    /// Pinned latitude; overrides the place name
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Pinned longitude; overrides the place name
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Hourly rows to print
    #[arg(long, default_value = "24")]
    pub hours: usize,

    /// Skip the reverse lookup of the forecast point's address
    #[arg(long)]
    pub no_address: bool,
}

impl ForecastArgs {
    pub fn query(&self) -> Option<String> {
        let joined = self.location.join(" ");
        (!joined.trim().is_empty()).then_some(joined)
    }
}

/// `name=value` on the command line
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub value: f64,
}

fn parse_assignment(raw: &str) -> Result<Assignment, String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {:?}", raw))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("{}: {}", name, e))?;
    Ok(Assignment {
        name: name.trim().to_string(),
        value,
    })
}

#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Set a feature through the number box, e.g. --set tmin=24
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub set: Vec<Assignment>,

    /// Set a feature through the slider, e.g. --slide wsmax=40
    #[arg(long = "slide", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub slide: Vec<Assignment>,
}

impl PredictArgs {
    /// All writes in command-line order, so the last one given wins.
    /// Without parsed matches, number writes come before slider writes.
    pub fn ordered_writes(&self, matches: Option<&ArgMatches>) -> Vec<(InputView, Assignment)> {
        let mut writes: Vec<(usize, InputView, Assignment)> = Vec::new();
        let mut collect = |id: &str, view: InputView, values: &[Assignment], offset: usize| {
            let indices: Vec<usize> = matches
                .and_then(|m| m.indices_of(id))
                .map(|i| i.collect())
                .unwrap_or_default();
            for (n, assignment) in values.iter().enumerate() {
                let position = indices.get(n).copied().unwrap_or(offset + n);
                writes.push((position, view, assignment.clone()));
            }
        };
        collect("set", InputView::Number, &self.set, 0);
        collect("slide", InputView::Slider, &self.slide, self.set.len());

        writes.sort_by_key(|(position, _, _)| *position);
        writes.into_iter().map(|(_, view, a)| (view, a)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExploreView {
    /// Shape, columns and first rows
    Overview,
    /// count, mean, std, min, quartiles, max per column
    Describe,
    /// Missing cells per column
    Missing,
    /// Pearson correlation matrix
    Correlation,
    /// Spread per month or year
    Distribution,
    /// Histogram of one column
    Histogram,
    /// Rainy days per year and month
    Rain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Grouping {
    Month,
    Year,
}

impl From<Grouping> for GroupBy {
    fn from(g: Grouping) -> Self {
        match g {
            Grouping::Month => GroupBy::Month,
            Grouping::Year => GroupBy::Year,
        }
    }
}

const MAX_BINS: i64 = 1000;

#[derive(Debug, Args)]
pub struct ExploreArgs {
    #[arg(value_enum, default_value = "overview")]
    pub view: ExploreView,

    /// Columns for describe, distribution and histogram (repeatable)
    #[arg(long = "column", short = 'c')]
    pub columns: Vec<String>,

    /// Grouping for the distribution view
    #[arg(long, value_enum, default_value = "month")]
    pub by: Grouping,

    /// Histogram bin count
    #[arg(long, default_value = "20", value_parser = clap::value_parser!(u16).range(1..=MAX_BINS))]
    pub bins: u16,

    /// Rows shown by the overview
    #[arg(long, default_value = "5")]
    pub head: usize,
}
