#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Durable, append-oriented storage of parking reports.
//!
//! The [`StoreBackend`] trait is the only thing a storage engine has to
//! implement: insert one finished record, and hand back every active record
//! as a consistent snapshot. Validation, id and timestamp assignment, and
//! operation timeouts all live in [`ReportStore`] so that every backend
//! behaves identically.
//!
//! Three backends ship with the crate:
//! - [`json_log::JsonLogBackend`]: a single JSON array file rewritten in
//!   full on every append.
//! - [`sqlite::SqliteBackend`]: one JSON document per row in `SQLite`.
//! - [`memory::MemoryBackend`]: a process-local vector.

pub mod config;
pub mod json_log;
pub mod memory;
pub mod sqlite;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_report_models::{ParkingReport, ReportDraft, ValidationError};
use tokio::time::Instant;

pub use config::{BackendKind, ConfigError, StoreConfig};

/// Default bound on a single storage operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// I/O or connectivity failures from a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem read or write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A database query or command failed.
    #[error("Database error: {0}")]
    Database(String),

    /// The operation did not finish within the configured bound.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Which store operation expired.
        operation: &'static str,
        /// The bound that was exceeded.
        after: Duration,
    },
}

/// Errors from [`ReportStore::append`].
#[derive(Debug, thiserror::Error)]
pub enum AppendError {
    /// The draft was rejected before anything was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend failed; the store is unchanged.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Point in time by which a store operation has to be decided.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// A deadline `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    /// Whether the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Fails with [`StoreError::Timeout`] once the deadline has passed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the deadline has passed.
    pub fn check(&self, operation: &'static str) -> Result<(), StoreError> {
        if self.is_expired() {
            return Err(self.expired(operation));
        }
        Ok(())
    }

    /// Runs `op`, dropping it if the deadline passes first.
    ///
    /// Only for steps that are safe to abandon midway (reads, lock
    /// acquisition). Never wrap a commit in this.
    ///
    /// # Errors
    ///
    /// Returns the error of `op`, or [`StoreError::Timeout`] if the deadline
    /// passed first.
    pub async fn run<T>(
        &self,
        operation: &'static str,
        op: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        tokio::time::timeout_at(self.at, op)
            .await
            .map_err(|_| self.expired(operation))?
    }

    const fn expired(&self, operation: &'static str) -> StoreError {
        StoreError::Timeout {
            operation,
            after: self.budget,
        }
    }
}

/// A storage engine for parking reports.
///
/// Implementations must make `insert` all-or-nothing and must never let
/// `scan_active` observe a partially written record. They do not validate,
/// sort, or rank.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Short name used in logs (e.g. `"json"`).
    fn name(&self) -> &'static str;

    /// Persists one finished record.
    ///
    /// The caller never cancels this call. The backend decides against
    /// `deadline` up to its commit point and returns
    /// [`StoreError::Timeout`] only if nothing was written; once the commit
    /// has started it runs to completion and reports its real outcome.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the record could not be durably written.
    async fn insert(&self, report: &ParkingReport, deadline: Deadline) -> Result<(), StoreError>;

    /// Returns every record whose status is `active`, in backend order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the records could not be read.
    async fn scan_active(&self) -> Result<Vec<ParkingReport>, StoreError>;
}

/// The report store: validates drafts and bounds every backend call.
#[derive(Clone)]
pub struct ReportStore {
    backend: Arc<dyn StoreBackend>,
    timeout: Duration,
}

impl ReportStore {
    /// Wraps a backend with the [`DEFAULT_TIMEOUT`].
    #[must_use]
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the per-operation timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Name of the underlying backend.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Validates a draft, stamps it, and persists it.
    ///
    /// The draft is validated before any write. On success the stored record
    /// carries a fresh v4 UUID, the current UTC time, and status `active`.
    /// A [`StoreError::Timeout`] means nothing was written.
    ///
    /// # Errors
    ///
    /// Returns [`AppendError::Validation`] for a bad draft and
    /// [`AppendError::Storage`] if the backend failed or timed out.
    pub async fn append(&self, draft: &ReportDraft) -> Result<ParkingReport, AppendError> {
        let new_report = draft.validate()?;
        let report = ParkingReport::new(
            new_report,
            uuid::Uuid::new_v4().to_string(),
            chrono::Utc::now(),
        );

        self.backend
            .insert(&report, Deadline::after(self.timeout))
            .await?;

        log::info!(
            "Stored report {} ({} spot(s)) in {} store",
            report.id,
            report.spot_count,
            self.backend.name()
        );

        Ok(report)
    }

    /// Returns a snapshot of every active record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend failed or timed out.
    pub async fn scan_active(&self) -> Result<Vec<ParkingReport>, StoreError> {
        Deadline::after(self.timeout)
            .run("scan", self.backend.scan_active())
            .await
    }
}
