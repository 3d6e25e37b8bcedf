#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parking report types shared by the store, the index, and the server.
//!
//! A [`ReportDraft`] is what a reporter submits. Every field is optional at
//! the type level so that each missing field maps onto its own
//! [`ValidationError`] instead of a generic decode failure. Once validated,
//! a draft becomes a [`NewReport`], and the store turns that into a
//! persisted [`ParkingReport`] by assigning the id, timestamp, and status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How the reporter obtained the coordinates. Informational only.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LocationKind {
    /// The device's own position at the time of the report.
    Current,
    /// An address the reporter picked by hand.
    Other,
}

/// Availability status of a report.
///
/// Only [`ReportStatus::Active`] reports are eligible for search results.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportStatus {
    /// The spot was reported open and has not been claimed.
    #[default]
    Active,
    /// The spot is no longer available.
    Taken,
}

/// Errors produced when a draft or a search request is rejected.
///
/// The messages are user-facing and are returned verbatim by the HTTP layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// `location_kind` was not supplied.
    #[error("Location type is required")]
    MissingLocationKind,

    /// `spot_count` was not supplied.
    #[error("Number of spots is required")]
    MissingSpotCount,

    /// `spot_count` was a fractional number.
    #[error("Number of spots must be a whole number, got {0}")]
    SpotCountNotInteger(String),

    /// `spot_count` was zero or negative.
    #[error("Number of spots must be at least 1, got {0}")]
    SpotCountTooSmall(i64),

    /// `spot_count` does not fit in a `u32`.
    #[error("Number of spots is too large, got {0}")]
    SpotCountTooLarge(u64),

    /// `address` was absent or blank.
    #[error("Address is required")]
    MissingAddress,

    /// Latitude or longitude was absent (or the zero sentinel).
    #[error("Latitude and longitude are required")]
    MissingCoordinates,

    /// Latitude outside `[-90, 90]` or not finite.
    #[error("Latitude must be between -90 and 90, got {0}")]
    LatitudeOutOfRange(f64),

    /// Longitude outside `[-180, 180]` or not finite.
    #[error("Longitude must be between -180 and 180, got {0}")]
    LongitudeOutOfRange(f64),

    /// Search radius that is negative or not finite.
    #[error("Search radius must be a non-negative number, got {0}")]
    InvalidRadius(f64),

    /// Search radius that is not a number at all.
    #[error("Search radius must be a non-negative number, got {0:?}")]
    RadiusNotANumber(String),

    /// The request body could not be decoded at all.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
}

/// A WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in `[-90, 90]`.
    pub lat: f64,
    /// Longitude in `[-180, 180]`.
    pub lng: f64,
}

impl Coordinates {
    /// Creates a point after checking both axes are finite and in range.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::LatitudeOutOfRange`] or
    /// [`ValidationError::LongitudeOutOfRange`].
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::LatitudeOutOfRange(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(ValidationError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }
}

/// A persisted parking availability report.
///
/// The legacy field names `location`, `spots`, and `timestamp` are accepted
/// when reading so that older record logs still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingReport {
    /// Opaque unique identifier assigned at creation.
    pub id: String,
    /// How the coordinates were obtained.
    #[serde(alias = "location")]
    pub location_kind: LocationKind,
    /// Number of open spots, at least 1.
    #[serde(alias = "spots")]
    pub spot_count: u32,
    /// Free-text street address.
    pub address: String,
    /// Where the spots are.
    pub coordinates: Coordinates,
    /// Server-side ingest time.
    #[serde(alias = "timestamp")]
    pub reported_at: DateTime<Utc>,
    /// Availability status.
    #[serde(default)]
    pub status: ReportStatus,
}

impl ParkingReport {
    /// Builds an `active` report from a validated draft.
    #[must_use]
    pub fn new(report: NewReport, id: String, reported_at: DateTime<Utc>) -> Self {
        Self {
            id,
            location_kind: report.location_kind,
            spot_count: report.spot_count,
            address: report.address,
            coordinates: report.coordinates,
            reported_at,
            status: ReportStatus::Active,
        }
    }

    /// Whether this report may appear in search results.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ReportStatus::Active
    }
}

/// Raw coordinates as submitted by a reporter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftCoordinates {
    /// Submitted latitude.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Submitted longitude.
    #[serde(default)]
    pub lng: Option<f64>,
}

/// An unvalidated report submission.
///
/// Fields the server assigns (`id`, `reported_at`, `status`) are not part of
/// the draft; if a client sends them they are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportDraft {
    /// How the coordinates were obtained.
    #[serde(default, alias = "location")]
    pub location_kind: Option<LocationKind>,
    /// Number of open spots, kept as a raw JSON number until validated.
    #[serde(default, alias = "spots")]
    pub spot_count: Option<serde_json::Number>,
    /// Free-text street address.
    #[serde(default)]
    pub address: Option<String>,
    /// Where the spots are.
    #[serde(default)]
    pub coordinates: Option<DraftCoordinates>,
}

/// A draft that passed validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    /// How the coordinates were obtained.
    pub location_kind: LocationKind,
    /// Number of open spots, at least 1.
    pub spot_count: u32,
    /// Trimmed, non-empty address.
    pub address: String,
    /// In-range coordinates.
    pub coordinates: Coordinates,
}

impl ReportDraft {
    /// Checks every field and produces a [`NewReport`].
    ///
    /// Fields are checked in declaration order and the first failure wins.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] for the first missing or invalid
    /// field.
    pub fn validate(&self) -> Result<NewReport, ValidationError> {
        let location_kind = self
            .location_kind
            .ok_or(ValidationError::MissingLocationKind)?;

        let spot_count = self
            .spot_count
            .as_ref()
            .ok_or(ValidationError::MissingSpotCount)
            .and_then(parse_spot_count)?;

        let address = self
            .address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or(ValidationError::MissingAddress)?
            .to_string();

        let coordinates = match self.coordinates {
            Some(DraftCoordinates {
                lat: Some(lat),
                lng: Some(lng),
            }) => Coordinates::new(lat, lng)?,
            _ => return Err(ValidationError::MissingCoordinates),
        };

        Ok(NewReport {
            location_kind,
            spot_count,
            address,
            coordinates,
        })
    }
}

fn parse_spot_count(value: &serde_json::Number) -> Result<u32, ValidationError> {
    if let Some(count) = value.as_u64() {
        if count < 1 {
            return Err(ValidationError::SpotCountTooSmall(0));
        }
        return u32::try_from(count).map_err(|_| ValidationError::SpotCountTooLarge(count));
    }

    if let Some(count) = value.as_i64() {
        return Err(ValidationError::SpotCountTooSmall(count));
    }

    Err(ValidationError::SpotCountNotInteger(value.to_string()))
}
