#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Proximity-ranked availability index.
//!
//! Answers "which open spots are near this point" over a snapshot of the
//! report store. The index holds no state of its own: every query scans the
//! store, measures haversine distance to each active report, drops reports
//! outside the radius, orders the rest freshest-first (nearest breaks
//! ties), and truncates to the configured cap.

pub mod config;
pub mod distance;

use std::cmp::Ordering;

use parking_report_models::{Coordinates, ParkingReport, ValidationError};
use parking_store::{ReportStore, StoreError};
use serde::Serialize;

pub use config::IndexConfig;
pub use distance::{DistanceUnit, haversine_distance};

/// Errors from [`AvailabilityIndex::query`].
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The query point or radius was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store could not be read. Never masked with partial results.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// A search as received from a caller, before validation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchRequest {
    /// Query latitude.
    pub lat: Option<f64>,
    /// Query longitude.
    pub lng: Option<f64>,
    /// Search radius in the index's unit; the configured default if absent.
    pub radius: Option<f64>,
}

impl SearchRequest {
    /// Creates a request for a point with an optional radius.
    #[must_use]
    pub const fn new(lat: f64, lng: f64, radius: Option<f64>) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
            radius,
        }
    }

    /// Resolves the query point and the effective radius.
    ///
    /// A latitude or longitude of exactly zero is treated as missing.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for missing or out-of-range coordinates
    /// and for a radius that is negative or not finite. A zero radius is a
    /// query for the exact point.
    pub fn validate(&self, default_radius: f64) -> Result<(Coordinates, f64), ValidationError> {
        let (Some(lat), Some(lng)) = (self.lat, self.lng) else {
            return Err(ValidationError::MissingCoordinates);
        };
        if lat == 0.0 || lng == 0.0 {
            return Err(ValidationError::MissingCoordinates);
        }

        let origin = Coordinates::new(lat, lng)?;

        let radius = self.radius.unwrap_or(default_radius);
        if !radius.is_finite() || radius < 0.0 {
            return Err(ValidationError::InvalidRadius(radius));
        }

        Ok((origin, radius))
    }
}

/// An active report annotated with its distance from the query point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedReport {
    /// The stored report.
    #[serde(flatten)]
    pub report: ParkingReport,
    /// Great-circle distance from the query point, in the index's unit.
    pub distance: f64,
}

/// The ranked answer to one query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    /// Ranked, radius-bounded, capped spots.
    pub spots: Vec<RankedReport>,
    /// The radius that was applied.
    pub radius: f64,
    /// Unit of `radius` and of each spot's distance.
    pub unit: DistanceUnit,
}

impl SearchResults {
    /// Number of spots returned.
    #[must_use]
    pub fn total(&self) -> usize {
        self.spots.len()
    }

    /// Whether nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }
}

/// Ranking front-end over a [`ReportStore`].
#[derive(Clone)]
pub struct AvailabilityIndex {
    store: ReportStore,
    config: IndexConfig,
}

impl AvailabilityIndex {
    /// Creates an index reading from `store`.
    #[must_use]
    pub const fn new(store: ReportStore, config: IndexConfig) -> Self {
        Self { store, config }
    }

    /// The index configuration.
    #[must_use]
    pub const fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Finds the freshest open spots within the radius of a point.
    ///
    /// An empty result is a success, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Validation`] before touching the store if the
    /// request is invalid, and [`QueryError::Storage`] if the scan fails.
    pub async fn query(&self, request: &SearchRequest) -> Result<SearchResults, QueryError> {
        let (origin, radius) = request.validate(self.config.default_radius)?;

        let reports = self.store.scan_active().await?;
        let candidates = reports.len();

        let spots = rank(
            reports,
            origin,
            radius,
            self.config.unit,
            self.config.max_results,
        );

        log::debug!(
            "query ({}, {}) radius={radius}{}: {candidates} candidate(s), {} returned",
            origin.lat,
            origin.lng,
            self.config.unit,
            spots.len()
        );

        Ok(SearchResults {
            spots,
            radius,
            unit: self.config.unit,
        })
    }
}

/// Filters, orders, and truncates reports for one query point.
///
/// Only active reports within `radius` (inclusive) survive. Order is newest
/// `reported_at` first, then ascending distance, then id so that equal keys
/// still produce a stable order regardless of store order.
#[must_use]
pub fn rank(
    reports: Vec<ParkingReport>,
    origin: Coordinates,
    radius: f64,
    unit: DistanceUnit,
    max_results: usize,
) -> Vec<RankedReport> {
    let mut ranked: Vec<RankedReport> = reports
        .into_iter()
        .filter(ParkingReport::is_active)
        .map(|report| RankedReport {
            distance: haversine_distance(origin, report.coordinates, unit),
            report,
        })
        .filter(|r| r.distance <= radius)
        .collect();

    ranked.sort_by(compare_ranked);
    ranked.truncate(max_results);
    ranked
}

fn compare_ranked(a: &RankedReport, b: &RankedReport) -> Ordering {
    b.report
        .reported_at
        .cmp(&a.report.reported_at)
        .then_with(|| a.distance.total_cmp(&b.distance))
        .then_with(|| a.report.id.cmp(&b.report.id))
}
