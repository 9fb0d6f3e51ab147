#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod cli;
mod pages;
mod render;

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{ArgMatches, CommandFactory, FromArgMatches};
use weatherwave_core::{App, AppError};

use crate::cli::{Cli, Command};
use crate::pages::{emit, ExploreContext, ForecastContext, PredictionContext};

const FALLBACK_MESSAGE: &str = "An unexpected error occurred. Please try again.";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Raw matches keep argument positions for ordering input writes
    let matches = Cli::command().get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    if let Err(e) = weatherwave_core::init() {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli, &matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            let message = e
                .downcast_ref::<AppError>()
                .map_or(FALLBACK_MESSAGE, AppError::user_message);
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, matches: &ArgMatches) -> Result<()> {
    let app = App::new(cli.config.as_deref())?;
    tracing::info!("WeatherWave started");

    let outcome = dispatch(&app, &cli, matches).await;

    app.shutdown();
    outcome
}

async fn dispatch(app: &App, cli: &Cli, matches: &ArgMatches) -> Result<()> {
    let config = app.config();

    match &cli.command {
        Command::Forecast(args) => {
            let context = ForecastContext::new(config).context("Failed to set up forecast clients")?;
            let page = context
                .load(args, Utc::now().date_naive())
                .await
                .context("Failed to load forecast")?;
            emit(&page, cli.json)
        }
        Command::Predict(args) => {
            let context = PredictionContext::load(config).context("Failed to load model artifacts")?;
            let writes = args.ordered_writes(matches.subcommand_matches("predict"));
            let page = context.predict(&writes).context("Prediction failed")?;
            emit(&page, cli.json)
        }
        Command::Explore(args) => {
            let context = ExploreContext::load(config).context("Failed to load historical dataset")?;
            let page = context.explore(args).context("Exploration failed")?;
            emit(&page, cli.json)
        }
    }
}
