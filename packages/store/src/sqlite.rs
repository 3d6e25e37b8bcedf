//! Document-table backend backed by `SQLite`.
//!
//! Each report is stored whole as its JSON document, keyed by id, with the
//! `status` and `reported_at` fields copied into columns so the active scan
//! can filter without decoding every row. A single `INSERT` per append
//! keeps writes atomic per record.

use std::path::Path;

use async_trait::async_trait;
use moosicbox_json_utils::database::ToValue as _;
use parking_report_models::{ParkingReport, ReportStatus};
use switchy_database::{Database, DatabaseValue};
use switchy_database_connection::init_sqlite_rusqlite;

use crate::{Deadline, StoreBackend, StoreError};

/// Default location of the `SQLite` database.
pub const DEFAULT_PATH: &str = "data/parking.db";

/// `SQLite` document-table backend.
pub struct SqliteBackend {
    db: Box<dyn Database>,
}

impl SqliteBackend {
    /// Opens (or creates) the database at `path` and ensures the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the directory, the connection, or the
    /// schema cannot be created.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let db =
            init_sqlite_rusqlite(Some(path)).map_err(|e| StoreError::Database(e.to_string()))?;

        ensure_schema(db.as_ref()).await?;

        log::debug!("Opened SQLite report store at {}", path.display());

        Ok(Self { db })
    }
}

async fn ensure_schema(db: &dyn Database) -> Result<(), StoreError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS parking_reports (
            id          TEXT PRIMARY KEY,
            status      TEXT NOT NULL,
            reported_at TEXT NOT NULL,
            document    TEXT NOT NULL
        )",
    )
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_parking_reports_status
         ON parking_reports (status)",
    )
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(())
}

#[async_trait]
impl StoreBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn insert(&self, report: &ParkingReport, deadline: Deadline) -> Result<(), StoreError> {
        let document = serde_json::to_string(report)?;

        // The INSERT is the commit; it is awaited to completion once issued.
        deadline.check("append")?;

        self.db
            .exec_raw_params(
                "INSERT INTO parking_reports (id, status, reported_at, document)
                 VALUES ($1, $2, $3, $4)",
                &[
                    DatabaseValue::String(report.id.clone()),
                    DatabaseValue::String(report.status.to_string()),
                    DatabaseValue::String(report.reported_at.to_rfc3339()),
                    DatabaseValue::String(document),
                ],
            )
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn scan_active(&self) -> Result<Vec<ParkingReport>, StoreError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT document FROM parking_reports WHERE status = $1",
                &[DatabaseValue::String(ReportStatus::Active.to_string())],
            )
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut reports = Vec::with_capacity(rows.len());
        for row in &rows {
            let document: String = row
                .to_value("document")
                .map_err(|e| StoreError::Database(e.to_string()))?;
            reports.push(serde_json::from_str(&document)?);
        }

        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use parking_report_models::ReportDraft;

    use super::*;
    use crate::ReportStore;

    fn fresh() -> Deadline {
        Deadline::after(crate::DEFAULT_TIMEOUT)
    }

    fn temp_db(label: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("parking_sqlite_{label}_{}", uuid::Uuid::new_v4()))
            .join("parking.db")
    }

    #[tokio::test]
    async fn append_then_scan_round_trips_documents() {
        let path = temp_db("roundtrip");
        let backend = SqliteBackend::open(&path).await.unwrap();
        let store = ReportStore::new(Arc::new(backend));

        let draft: ReportDraft = serde_json::from_value(serde_json::json!({
            "location_kind": "current",
            "spot_count": 2,
            "address": "Union Square",
            "coordinates": { "lat": 37.788, "lng": -122.4075 },
        }))
        .unwrap();

        let stored = store.append(&draft).await.unwrap();
        let active = store.scan_active().await.unwrap();

        assert_eq!(active, vec![stored]);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn duplicate_id_is_a_storage_error() {
        let path = temp_db("duplicate");
        let backend = SqliteBackend::open(&path).await.unwrap();

        let report: ParkingReport = serde_json::from_value(serde_json::json!({
            "id": "fixed-id",
            "location_kind": "other",
            "spot_count": 1,
            "address": "Castro St",
            "coordinates": { "lat": 37.76, "lng": -122.435 },
            "reported_at": "2024-06-01T10:00:00Z",
            "status": "active",
        }))
        .unwrap();

        backend.insert(&report, fresh()).await.unwrap();
        assert!(matches!(
            backend.insert(&report, fresh()).await,
            Err(StoreError::Database(_))
        ));
        assert_eq!(backend.scan_active().await.unwrap().len(), 1);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn taken_rows_are_not_scanned() {
        let path = temp_db("taken");
        let backend = SqliteBackend::open(&path).await.unwrap();

        let mut report: ParkingReport = serde_json::from_value(serde_json::json!({
            "id": "taken-1",
            "location_kind": "other",
            "spot_count": 1,
            "address": "Valencia St",
            "coordinates": { "lat": 37.76, "lng": -122.42 },
            "reported_at": "2024-06-01T10:00:00Z",
            "status": "taken",
        }))
        .unwrap();
        backend.insert(&report, fresh()).await.unwrap();

        report.id = "active-1".to_string();
        report.status = ReportStatus::Active;
        backend.insert(&report, fresh()).await.unwrap();

        let active = backend.scan_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "active-1");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    fn draft(lat: f64) -> ReportDraft {
        serde_json::from_value(serde_json::json!({
            "location_kind": "other",
            "spot_count": 1,
            "address": "Market St",
            "coordinates": { "lat": lat, "lng": -122.41 },
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn expired_deadline_inserts_no_row() {
        let path = temp_db("expired");
        let backend = Arc::new(SqliteBackend::open(&path).await.unwrap());
        let store = ReportStore::new(backend.clone());
        let stored = store.append(&draft(37.77)).await.unwrap();

        let mut late = stored.clone();
        late.id = "late-1".to_string();
        let err = backend
            .insert(&late, Deadline::after(Duration::ZERO))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Timeout { .. }));
        assert_eq!(backend.scan_active().await.unwrap(), vec![stored]);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn scans_during_appends_see_only_whole_rows() {
        let path = temp_db("concurrent");
        let backend = Arc::new(SqliteBackend::open(&path).await.unwrap());
        let store = ReportStore::new(backend.clone());

        let reader = {
            let backend = backend.clone();
            tokio::spawn(async move {
                let mut seen = 0;
                let mut scans = 0_u32;
                while seen < 40 {
                    let count = backend.scan_active().await.unwrap().len();
                    assert!(count >= seen, "scan went from {seen} to {count} rows");
                    seen = count;
                    scans += 1;
                    tokio::task::yield_now().await;
                }
                scans
            })
        };

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let store = store.clone();
                tokio::spawn(async move {
                    for i in 0..10 {
                        store
                            .append(&draft(37.0 + f64::from(w * 10 + i) / 1000.0))
                            .await
                            .unwrap();
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.await.unwrap();
        }
        assert!(reader.await.unwrap() > 0);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
