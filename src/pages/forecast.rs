//! Forecast page: resolve a place, fetch the ensemble, show the tables.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use weatherwave_core::{AppError, Config};
use weatherwave_weather::{
    apply_map_pin, resolve_location, Coordinates, EnsembleProvider, ForecastReport, Geocoder,
    LocationSource, ResolvedLocation,
};

use crate::cli::ForecastArgs;
use crate::render::{num, Table};

pub struct ForecastContext {
    provider: EnsembleProvider,
    geocoder: Geocoder,
    default: Coordinates,
}

impl ForecastContext {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            provider: EnsembleProvider::from_config(config)?,
            geocoder: Geocoder::new(&config.geocoding)?,
            default: Coordinates::new(
                config.location.default_latitude,
                config.location.default_longitude,
            ),
        })
    }

    pub async fn load(&self, args: &ForecastArgs, today: NaiveDate) -> Result<ForecastPage, AppError> {
        let query = args.query();
        let pin = args.lat.zip(args.lon).map(|(lat, lon)| Coordinates::new(lat, lon));

        let resolved = resolve_location(&self.geocoder, query.as_deref(), self.default).await;
        let location = apply_map_pin(resolved, pin);
        let warning = location.warning();

        // Aborts before any aggregation when the upstream call fails
        let report = self.provider.fetch_report(location.coordinates, today).await?;

        let address = if args.no_address {
            None
        } else {
            self.geocoder.reverse_geocode(location.coordinates).await
        };

        Ok(ForecastPage {
            location,
            warning,
            address,
            models: self.provider.models().to_vec(),
            hours: args.hours,
            report,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ForecastPage {
    pub location: ResolvedLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Ensemble models the forecast was requested from
    pub models: Vec<String>,
    #[serde(skip)]
    pub hours: usize,
    pub report: ForecastReport,
}

impl ForecastPage {
    fn source_note(&self) -> String {
        match &self.location.source {
            LocationSource::Default => "default location".to_string(),
            LocationSource::Geocoded { query } => format!("found {:?}", query),
            LocationSource::LookupMiss { query } => format!("{:?} not found, default location", query),
            LocationSource::MapPin => "map pin".to_string(),
        }
    }

    fn daily_table(&self) -> Table {
        let mut table = Table::new([
            "date",
            "mean temp",
            "max temp",
            "max humidity",
            "max wind",
            "max code",
            "category",
        ]);
        for max in &self.report.daily.max {
            let mean = self.report.daily.mean_for(max.date);
            table.row([
                max.date.to_string(),
                num(mean.map(|m| m.values.max_temp), 1),
                num(Some(max.values.max_temp), 1),
                num(Some(max.values.max_relative_humidity), 0),
                num(Some(max.values.max_wind_speed), 1),
                num(Some(max.values.max_weather_code), 0),
                max.category.to_string(),
            ]);
        }
        table
    }

    fn hourly_table(&self) -> Table {
        let mut table = Table::new(["time (UTC)", "temp", "humidity", "wind", "max code", "mode code", "category"]);
        for row in self.report.hourly.rows.iter().take(self.hours) {
            table.row([
                row.time.format("%Y-%m-%d %H:%M").to_string(),
                num(row.max_temp, 1),
                num(row.max_relative_humidity, 0),
                num(row.max_wind_speed, 1),
                num(row.max_weather_code, 0),
                num(row.mode_weather_code, 0),
                row.category.to_string(),
            ]);
        }
        table
    }
}

impl fmt::Display for ForecastPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = &self.report;

        if let Some(warning) = &self.warning {
            writeln!(f, "Warning: {}", warning)?;
        }
        writeln!(f, "{} ({})", self.location.coordinates, self.source_note())?;
        if let Some(address) = &self.address {
            writeln!(f, "Address: {}", address)?;
        }
        writeln!(
            f,
            "Grid point: {:.4}, {:.4} at {:.0} m",
            report.latitude, report.longitude, report.elevation
        )?;
        writeln!(f, "Models: {}\n", self.models.join(", "))?;

        match &report.tomorrow {
            Some(t) => writeln!(f, "Tomorrow ({}): {:.0}°C, {}\n", t.date, t.temperature, t.category)?,
            None => writeln!(f, "Tomorrow's forecast is not available.\n")?,
        }

        let daily = self.daily_table();
        if daily.is_empty() {
            writeln!(f, "No complete forecast days.\n")?;
        } else {
            writeln!(f, "Daily (mean of hourly max, and max)")?;
            writeln!(f, "{}", daily)?;
        }

        writeln!(
            f,
            "Hourly, first {} of {} (member max, {} members)",
            self.hours.min(report.hourly.rows.len()),
            report.hourly.rows.len(),
            report.hourly.columns.len()
        )?;
        write!(f, "{}", self.hourly_table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use weatherwave_weather::{
        DailyMaxRow, DailyMeanRow, DailyTables, DailyValues, HourlyRow, HourlyTable,
        TomorrowOutlook, WeatherCategory,
    };

    fn page(tomorrow: Option<TomorrowOutlook>, source: LocationSource) -> ForecastPage {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let values = DailyValues {
            max_temp: 31.2,
            max_weather_code: 61.0,
            max_relative_humidity: 88.0,
            max_wind_speed: 14.5,
        };
        let rows = (0..3)
            .map(|h| {
                HourlyRow::summary(
                    Utc.with_ymd_and_hms(2026, 10, 19, h, 0, 0).unwrap(),
                    Some(29.0 + h as f64),
                    Some(61.0),
                    Some(80.0),
                    Some(10.0),
                )
            })
            .collect();

        ForecastPage {
            location: ResolvedLocation {
                coordinates: Coordinates::new(11.9338, 79.8298),
                source,
            },
            warning: None,
            address: None,
            models: vec!["icon_seamless".to_string()],
            hours: 2,
            report: ForecastReport {
                latitude: 11.93,
                longitude: 79.83,
                elevation: 12.0,
                hourly: HourlyTable {
                    interval: 3600,
                    columns: Vec::new(),
                    rows,
                },
                daily: DailyTables {
                    mean: vec![DailyMeanRow { date, values }],
                    max: vec![DailyMaxRow {
                        date,
                        values,
                        category: WeatherCategory::LightRain,
                    }],
                },
                tomorrow,
            },
        }
    }

    #[test]
    fn test_render_tomorrow_outlook() {
        let outlook = TomorrowOutlook {
            date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            temperature: 31.0,
            category: WeatherCategory::LightRain,
        };
        let text = page(Some(outlook), LocationSource::MapPin).to_string();
        assert!(text.contains("Tomorrow (2026-10-19): 31°C, Light Rain"));
        assert!(text.contains("(map pin)"));
        assert!(text.contains("Models: icon_seamless"));
        assert!(text.contains("Hourly, first 2 of 3"));
        assert!(!text.contains("2026-10-19 02:00"));
    }

    #[test]
    fn test_render_missing_tomorrow() {
        let text = page(None, LocationSource::Default).to_string();
        assert!(text.contains("Tomorrow's forecast is not available."));
    }

    #[test]
    fn test_json_omits_absent_fields() {
        let json = serde_json::to_value(page(None, LocationSource::Default)).unwrap();
        assert!(json.get("warning").is_none());
        assert!(json.get("hours").is_none());
        assert_eq!(json["models"][0], "icon_seamless");
        assert_eq!(json["location"]["source"]["kind"], "default");
        assert!(json["report"]["tomorrow"].is_null());
    }
}
