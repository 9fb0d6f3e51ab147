//! Turning user input into forecast coordinates.

use crate::geocode::Geocoder;
use crate::types::{Coordinates, LocationSource, ResolvedLocation};

/// Resolve free-text input to coordinates.
///
/// Empty input uses `default`. A lookup miss also uses `default` but carries a
/// warning for the user. Never fails.
pub async fn resolve_location(
    geocoder: &Geocoder,
    query: Option<&str>,
    default: Coordinates,
) -> ResolvedLocation {
    let query = match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => q,
        None => {
            return ResolvedLocation {
                coordinates: default,
                source: LocationSource::Default,
            }
        }
    };

    match geocoder.geocode(query).await {
        Some(coordinates) => ResolvedLocation {
            coordinates,
            source: LocationSource::Geocoded {
                query: query.to_string(),
            },
        },
        None => {
            tracing::warn!("No coordinates for {:?}, using default {}", query, default);
            ResolvedLocation {
                coordinates: default,
                source: LocationSource::LookupMiss {
                    query: query.to_string(),
                },
            }
        }
    }
}

/// A pinned map coordinate overrides whatever was resolved from text
pub fn apply_map_pin(resolved: ResolvedLocation, pin: Option<Coordinates>) -> ResolvedLocation {
    match pin {
        Some(coordinates) => ResolvedLocation {
            coordinates,
            source: LocationSource::MapPin,
        },
        None => resolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weatherwave_core::GeocodingConfig;

    fn offline_geocoder() -> Geocoder {
        // Port 9 (discard) refuses connections, so any lookup would miss
        Geocoder::new(&GeocodingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            ..GeocodingConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_empty_input_uses_default() {
        let default = Coordinates::new(11.9338, 79.8298);
        for input in [None, Some(""), Some("   ")] {
            let resolved = resolve_location(&offline_geocoder(), input, default).await;
            assert_eq!(resolved.coordinates, default);
            assert_eq!(resolved.source, LocationSource::Default);
            assert!(resolved.warning().is_none());
        }
    }

    #[tokio::test]
    async fn test_unreachable_geocoder_is_a_miss() {
        let default = Coordinates::new(11.9338, 79.8298);
        let resolved = resolve_location(&offline_geocoder(), Some("Chennai"), default).await;
        assert_eq!(resolved.coordinates, default);
        assert!(resolved.warning().is_some());
    }

    #[test]
    fn test_map_pin_overrides() {
        let resolved = ResolvedLocation {
            coordinates: Coordinates::new(13.08, 80.27),
            source: LocationSource::Geocoded {
                query: "Chennai".to_string(),
            },
        };
        let pin = Coordinates::new(12.0, 79.0);

        let pinned = apply_map_pin(resolved.clone(), Some(pin));
        assert_eq!(pinned.coordinates, pin);
        assert_eq!(pinned.source, LocationSource::MapPin);

        assert_eq!(apply_map_pin(resolved.clone(), None), resolved);
    }
}
