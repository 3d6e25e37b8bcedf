#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the parking board server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the stored report type and the index result type so that the API
//! contract can evolve independently.

use chrono::{DateTime, Utc};
use parking_index::{DistanceUnit, RankedReport, SearchRequest, SearchResults};
use parking_report_models::{
    Coordinates, LocationKind, ParkingReport, ReportStatus, ValidationError,
};
use serde::{Deserialize, Serialize};

/// A ranked parking spot as returned by the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSpot {
    /// Report id.
    pub id: String,
    /// How the reporter obtained the coordinates.
    pub location_kind: LocationKind,
    /// Number of open spots.
    pub spot_count: u32,
    /// Free-text street address.
    pub address: String,
    /// Where the spots are.
    pub coordinates: Coordinates,
    /// When the spot was reported (ISO 8601).
    pub reported_at: DateTime<Utc>,
    /// Availability status.
    pub status: ReportStatus,
    /// Distance from the query point, in the response's `unit`.
    pub distance: f64,
}

impl From<RankedReport> for ApiSpot {
    fn from(ranked: RankedReport) -> Self {
        let RankedReport { report, distance } = ranked;
        Self {
            id: report.id,
            location_kind: report.location_kind,
            spot_count: report.spot_count,
            address: report.address,
            coordinates: report.coordinates,
            reported_at: report.reported_at,
            status: report.status,
            distance,
        }
    }
}

/// Query parameters for the search endpoint.
///
/// Values arrive as raw strings so that a malformed number can be reported
/// with a specific message instead of a generic extractor failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQueryParams {
    /// Query latitude.
    pub lat: Option<String>,
    /// Query longitude.
    pub lng: Option<String>,
    /// Search radius in the server's configured unit.
    pub radius: Option<String>,
}

impl SearchQueryParams {
    /// Converts the raw parameters into a [`SearchRequest`].
    ///
    /// Unparseable coordinates count as missing.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::RadiusNotANumber`] if `radius` is present
    /// but not a number.
    pub fn to_request(&self) -> Result<SearchRequest, ValidationError> {
        let number = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .and_then(|v| v.parse::<f64>().ok())
        };

        let radius = match self.radius.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<f64>()
                    .map_err(|_| ValidationError::RadiusNotANumber(raw.to_string()))?,
            ),
        };

        Ok(SearchRequest {
            lat: number(&self.lat),
            lng: number(&self.lng),
            radius,
        })
    }
}

/// Response from the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Ranked spots, freshest first.
    pub spots: Vec<ApiSpot>,
    /// Number of spots returned.
    pub total: usize,
    /// Radius that was applied.
    pub radius: f64,
    /// Unit of `radius` and of each spot's distance.
    pub unit: DistanceUnit,
    /// Human-readable note, present only when nothing matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<SearchResults> for SearchResponse {
    fn from(results: SearchResults) -> Self {
        let message = results.is_empty().then(|| {
            format!(
                "No open parking spots found within {} {}",
                results.radius,
                results.unit.abbreviation()
            )
        });

        Self {
            total: results.total(),
            spots: results.spots.into_iter().map(ApiSpot::from).collect(),
            radius: results.radius,
            unit: results.unit,
            message,
        }
    }
}

/// Response from the report endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCreatedResponse {
    /// Confirmation text.
    pub message: String,
    /// The stored record, including its generated fields.
    pub report: ParkingReport,
}

/// Error body returned for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable reason.
    pub message: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(lat: Option<&str>, lng: Option<&str>, radius: Option<&str>) -> SearchQueryParams {
        SearchQueryParams {
            lat: lat.map(str::to_string),
            lng: lng.map(str::to_string),
            radius: radius.map(str::to_string),
        }
    }

    #[test]
    fn parses_numbers_and_treats_garbage_coordinates_as_missing() {
        let request = params(Some("37.77"), Some(" -122.41 "), Some("0.25"))
            .to_request()
            .unwrap();
        assert_eq!(request, SearchRequest::new(37.77, -122.41, Some(0.25)));

        let request = params(Some("north"), None, None).to_request().unwrap();
        assert_eq!(request.lat, None);
        assert_eq!(request.lng, None);
        assert_eq!(request.radius, None);
    }

    #[test]
    fn garbage_radius_is_rejected() {
        assert_eq!(
            params(Some("1"), Some("1"), Some("wide")).to_request(),
            Err(ValidationError::RadiusNotANumber("wide".to_string()))
        );
        assert_eq!(
            params(Some("1"), Some("1"), Some("")).to_request().unwrap().radius,
            None
        );
    }

    #[test]
    fn empty_results_carry_a_message() {
        let response = SearchResponse::from(SearchResults {
            spots: Vec::new(),
            radius: 0.5,
            unit: DistanceUnit::Miles,
        });

        assert_eq!(response.total, 0);
        assert_eq!(
            response.message.as_deref(),
            Some("No open parking spots found within 0.5 mi")
        );

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["unit"], "mi");
        assert_eq!(json["spots"], serde_json::json!([]));
    }

    #[test]
    fn non_empty_results_omit_the_message() {
        let report: ParkingReport = serde_json::from_value(serde_json::json!({
            "id": "a",
            "location_kind": "current",
            "spot_count": 2,
            "address": "Market St",
            "coordinates": { "lat": 37.79, "lng": -122.40 },
            "reported_at": "2024-06-01T12:00:00Z",
        }))
        .unwrap();

        let response = SearchResponse::from(SearchResults {
            spots: vec![RankedReport {
                report,
                distance: 0.1,
            }],
            radius: 0.5,
            unit: DistanceUnit::Miles,
        });

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("message").is_none());
        assert_eq!(json["total"], 1);
        assert_eq!(json["spots"][0]["distance"], 0.1);
        assert_eq!(json["spots"][0]["spot_count"], 2);
        assert_eq!(json["spots"][0]["status"], "active");
    }
}
