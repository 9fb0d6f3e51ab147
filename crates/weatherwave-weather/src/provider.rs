//! Ensemble forecast provider (Open-Meteo ensemble API).

use chrono::NaiveDate;
use serde::Serialize;
use url::Url;
use weatherwave_core::{Config, ForecastConfig};
use weatherwave_services::HttpFetcher;

use crate::aggregate::{DailyTables, HourlyTable, TomorrowOutlook};
use crate::ensemble::{EnsembleResponse, EnsembleVariable};
use crate::types::{Coordinates, WeatherError};

/// Everything the forecast page shows for one location
#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub hourly: HourlyTable,
    pub daily: DailyTables,
    /// `None` when tomorrow is not fully covered by the forecast
    pub tomorrow: Option<TomorrowOutlook>,
}

#[derive(Debug, Clone)]
pub struct EnsembleProvider {
    fetcher: HttpFetcher,
    api_url: Url,
    models: Vec<String>,
    forecast_days: u32,
}

impl EnsembleProvider {
    pub fn new(fetcher: HttpFetcher, forecast: &ForecastConfig) -> Result<Self, WeatherError> {
        let api_url = Url::parse(&forecast.api_url).map_err(|e| {
            WeatherError::InvalidRequest(format!("api_url {}: {}", forecast.api_url, e))
        })?;
        if forecast.models.is_empty() {
            return Err(WeatherError::InvalidRequest(
                "at least one ensemble model is required".to_string(),
            ));
        }

        Ok(Self {
            fetcher,
            api_url,
            models: forecast.models.clone(),
            forecast_days: forecast.forecast_days,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        let fetcher = HttpFetcher::from_config(config)?;
        Self::new(fetcher, &config.forecast)
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Request URL for the given point
    pub fn request_url(&self, coords: Coordinates) -> Url {
        let hourly = EnsembleVariable::ALL
            .iter()
            .map(|v| v.api_name())
            .collect::<Vec<_>>()
            .join(",");

        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &coords.latitude.to_string())
            .append_pair("longitude", &coords.longitude.to_string())
            .append_pair("hourly", &hourly)
            .append_pair("forecast_days", &self.forecast_days.to_string())
            .append_pair("models", &self.models.join(","))
            .append_pair("timeformat", "unixtime");
        url
    }

    /// Fetch and decode the raw ensemble response
    pub async fn fetch(&self, coords: Coordinates) -> Result<EnsembleResponse, WeatherError> {
        let url = self.request_url(coords);
        tracing::info!("Fetching ensemble forecast for {}", coords);

        let body = self.fetcher.get_text(&url).await?;
        EnsembleResponse::from_json(&body, &self.models)
    }

    /// Fetch, collapse, resample, and look up the day after `today`
    pub async fn fetch_report(
        &self,
        coords: Coordinates,
        today: NaiveDate,
    ) -> Result<ForecastReport, WeatherError> {
        let response = self.fetch(coords).await?;
        let report = build_report(&response, today);

        tracing::info!(
            "Forecast: {} hourly rows, {} complete days, tomorrow {}",
            report.hourly.rows.len(),
            report.daily.max.len(),
            if report.tomorrow.is_some() { "available" } else { "unavailable" }
        );
        Ok(report)
    }
}

/// Aggregate a decoded response into a report
pub fn build_report(response: &EnsembleResponse, today: NaiveDate) -> ForecastReport {
    let hourly = HourlyTable::from_response(response);
    let daily = hourly.resample_daily();
    let tomorrow = daily.tomorrow(today);

    ForecastReport {
        latitude: response.latitude,
        longitude: response.longitude,
        elevation: response.elevation,
        hourly,
        daily,
        tomorrow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weatherwave_core::HttpConfig;

    fn provider(models: &[&str]) -> EnsembleProvider {
        let fetcher = HttpFetcher::new(&HttpConfig::default(), "test-agent", None).unwrap();
        let forecast = ForecastConfig {
            models: models.iter().map(|m| m.to_string()).collect(),
            ..ForecastConfig::default()
        };
        EnsembleProvider::new(fetcher, &forecast).unwrap()
    }

    #[test]
    fn test_request_url_parameters() {
        let url = provider(&["icon_seamless", "gfs_seamless"])
            .request_url(Coordinates::new(11.9338, 79.8298));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        let get = |k: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("latitude"), "11.9338");
        assert_eq!(get("longitude"), "79.8298");
        assert_eq!(
            get("hourly"),
            "temperature_2m,weather_code,relative_humidity_2m,wind_speed_10m"
        );
        assert_eq!(get("forecast_days"), "7");
        assert_eq!(get("models"), "icon_seamless,gfs_seamless");
        assert_eq!(get("timeformat"), "unixtime");
    }

    #[test]
    fn test_empty_model_list_rejected() {
        let fetcher = HttpFetcher::new(&HttpConfig::default(), "test-agent", None).unwrap();
        let forecast = ForecastConfig {
            models: Vec::new(),
            ..ForecastConfig::default()
        };
        assert!(matches!(
            EnsembleProvider::new(fetcher, &forecast),
            Err(WeatherError::InvalidRequest(_))
        ));
    }
}
