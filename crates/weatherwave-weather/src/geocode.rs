//! Forward and reverse geocoding via Nominatim (OpenStreetMap).
//! Free, no API key, but a user agent is mandatory.

use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use weatherwave_core::GeocodingConfig;

use crate::types::{Coordinates, WeatherError};

#[derive(Debug, Deserialize)]
struct SearchHit {
    // Nominatim returns coordinates as strings
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<NominatimAddress>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    state_district: Option<String>,
    state: Option<String>,
    county: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    /// "Place, Region" with the most specific place available
    fn compose(self) -> Option<String> {
        let state = self.state.clone();
        let country = self.country.clone();

        let place = self
            .city
            .or(self.town)
            .or(self.village)
            .or(self.municipality)
            .or(self.state_district)
            .or(self.county)
            .or(self.state)
            .or(self.country)?;

        let suffix = state
            .filter(|s| !s.is_empty() && *s != place)
            .or_else(|| country.filter(|c| !c.is_empty() && *c != place));

        Some(match suffix {
            Some(s) => format!("{}, {}", place, s),
            None => place,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    client: Arc<Client>,
    base_url: Url,
}

impl Geocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self, WeatherError> {
        // Trailing slash so join() appends instead of replacing the last segment
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| WeatherError::InvalidRequest(format!("geocoding url {}: {}", base, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| WeatherError::InvalidRequest(format!("geocoding client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Option<Url> {
        match self.base_url.join(path) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Bad geocoding endpoint {}: {}", path, e);
                None
            }
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: Url) -> Option<T> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Geocode request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Geocode returned status {}", response.status());
            return None;
        }

        match response.json().await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::debug!("Geocode parse error: {}", e);
                None
            }
        }
    }

    /// Place name to coordinates. `None` when nothing matches or the service fails.
    pub async fn geocode(&self, query: &str) -> Option<Coordinates> {
        let mut url = self.endpoint("search")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "json")
            .append_pair("limit", "1");

        let hits: Vec<SearchHit> = self.get_json(url).await?;
        let hit = hits.into_iter().next()?;

        match (hit.lat.parse::<f64>(), hit.lon.parse::<f64>()) {
            (Ok(latitude), Ok(longitude)) => {
                let coords = Coordinates::new(latitude, longitude);
                tracing::info!("Geocoded {:?} to {}", query, coords);
                Some(coords)
            }
            _ => {
                tracing::debug!("Geocode hit has unparsable coordinates: {:?}", hit);
                None
            }
        }
    }

    /// Coordinates to an address. Prefers Nominatim's display name and falls
    /// back to a composed "place, region" string.
    pub async fn reverse_geocode(&self, coords: Coordinates) -> Option<String> {
        let mut url = self.endpoint("reverse")?;
        url.query_pairs_mut()
            .append_pair("lat", &coords.latitude.to_string())
            .append_pair("lon", &coords.longitude.to_string())
            .append_pair("format", "json");

        let body: ReverseResponse = self.get_json(url).await?;
        let name = body
            .display_name
            .filter(|n| !n.is_empty())
            .or_else(|| body.address.and_then(NominatimAddress::compose))?;

        tracing::info!("Reverse geocoded to: {}", name);
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> NominatimAddress {
        NominatimAddress {
            city: None,
            town: None,
            village: None,
            municipality: None,
            state_district: None,
            state: None,
            county: None,
            country: None,
        }
    }

    #[test]
    fn test_compose_prefers_city_and_state() {
        let addr = NominatimAddress {
            city: Some("Puducherry".to_string()),
            town: Some("Ignored".to_string()),
            state: Some("Puducherry UT".to_string()),
            country: Some("India".to_string()),
            ..address()
        };
        assert_eq!(addr.compose().as_deref(), Some("Puducherry, Puducherry UT"));
    }

    #[test]
    fn test_compose_skips_duplicate_region() {
        let addr = NominatimAddress {
            state: Some("Goa".to_string()),
            country: Some("India".to_string()),
            ..address()
        };
        assert_eq!(addr.compose().as_deref(), Some("Goa, India"));

        let addr = NominatimAddress {
            country: Some("Monaco".to_string()),
            ..address()
        };
        assert_eq!(addr.compose().as_deref(), Some("Monaco"));
        assert_eq!(address().compose(), None);
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let geocoder = Geocoder::new(&GeocodingConfig {
            base_url: "http://localhost:9/nominatim".to_string(),
            ..GeocodingConfig::default()
        })
        .unwrap();
        assert_eq!(
            geocoder.endpoint("search").unwrap().as_str(),
            "http://localhost:9/nominatim/search"
        );
    }
}
