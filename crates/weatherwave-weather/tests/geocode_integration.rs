//! Integration tests for Geocoder and location resolution using wiremock.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use weatherwave_core::GeocodingConfig;
use weatherwave_weather::{resolve_location, Coordinates, Geocoder, LocationSource};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn geocoder(server: &MockServer) -> Geocoder {
    Geocoder::new(&GeocodingConfig {
        base_url: server.uri(),
        user_agent: "weatherwave-test".to_string(),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_forward_geocode_hit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Chennai"))
        .and(query_param("format", "json"))
        .and(query_param("limit", "1"))
        .and(header("user-agent", "weatherwave-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "lat": "13.0836939", "lon": "80.270186", "display_name": "Chennai, Tamil Nadu, India" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let coords = geocoder(&mock_server).geocode("Chennai").await.unwrap();
    assert!((coords.latitude - 13.0836939).abs() < 1e-9);
    assert!((coords.longitude - 80.270186).abs() < 1e-9);
}

#[tokio::test]
async fn test_lookup_miss_falls_back_with_warning() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let default = Coordinates::new(11.9338, 79.8298);
    let resolved = resolve_location(&geocoder(&mock_server), Some("Nowhereville"), default).await;

    assert_eq!(resolved.coordinates, default);
    assert_eq!(
        resolved.source,
        LocationSource::LookupMiss {
            query: "Nowhereville".to_string()
        }
    );
    assert!(resolved.warning().unwrap().contains("Nowhereville"));
}

#[tokio::test]
async fn test_server_error_degrades_to_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let geocoder = geocoder(&mock_server);
    assert!(geocoder.geocode("Chennai").await.is_none());
    assert!(geocoder
        .reverse_geocode(Coordinates::new(13.08, 80.27))
        .await
        .is_none());
}

#[tokio::test]
async fn test_reverse_geocode_display_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("lat", "11.9338"))
        .and(query_param("lon", "79.8298"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "display_name": "Puducherry, India",
            "address": { "city": "Puducherry", "country": "India" }
        })))
        .mount(&mock_server)
        .await;

    let name = geocoder(&mock_server)
        .reverse_geocode(Coordinates::new(11.9338, 79.8298))
        .await;
    assert_eq!(name.as_deref(), Some("Puducherry, India"));
}

#[tokio::test]
async fn test_reverse_geocode_composes_without_display_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "address": { "town": "Auroville", "state": "Tamil Nadu" }
        })))
        .mount(&mock_server)
        .await;

    let name = geocoder(&mock_server)
        .reverse_geocode(Coordinates::new(12.0, 79.8))
        .await;
    assert_eq!(name.as_deref(), Some("Auroville, Tamil Nadu"));
}
