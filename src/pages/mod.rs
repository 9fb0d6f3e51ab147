//! One module per dashboard page. Each page owns a context built once from the
//! configuration and produces a serializable view.

pub mod explore;
pub mod forecast;
pub mod predict;

use std::fmt::Display;

use anyhow::{Context, Result};
use serde::Serialize;

pub use explore::ExploreContext;
pub use forecast::ForecastContext;
pub use predict::PredictionContext;

/// Write a computed page to stdout as text tables or pretty JSON
pub fn emit<P: Serialize + Display>(page: &P, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(page).context("Failed to serialize page")?;
        println!("{}", text);
    } else {
        print!("{}", page);
    }
    Ok(())
}
