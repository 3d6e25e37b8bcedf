//! Process-local backend. Nothing survives a restart.

use async_trait::async_trait;
use parking_report_models::ParkingReport;
use tokio::sync::RwLock;

use crate::{Deadline, StoreBackend, StoreError};

/// Keeps every record in a vector behind a read/write lock.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    reports: RwLock<Vec<ParkingReport>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-loaded with records, kept as given.
    #[must_use]
    pub fn with_reports(reports: Vec<ParkingReport>) -> Self {
        Self {
            reports: RwLock::new(reports),
        }
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, report: &ParkingReport, deadline: Deadline) -> Result<(), StoreError> {
        let mut reports = deadline
            .run("append", async { Ok(self.reports.write().await) })
            .await?;
        reports.push(report.clone());
        Ok(())
    }

    async fn scan_active(&self) -> Result<Vec<ParkingReport>, StoreError> {
        Ok(self
            .reports
            .read()
            .await
            .iter()
            .filter(|r| r.is_active())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use parking_report_models::{Coordinates, LocationKind, ReportStatus};

    use super::*;

    fn report(id: &str, status: ReportStatus) -> ParkingReport {
        ParkingReport {
            id: id.to_string(),
            location_kind: LocationKind::Other,
            spot_count: 1,
            address: "1 Main St".to_string(),
            coordinates: Coordinates { lat: 10.0, lng: 10.0 },
            reported_at: Utc::now(),
            status,
        }
    }

    #[tokio::test]
    async fn scan_skips_taken_records() {
        let backend = MemoryBackend::with_reports(vec![
            report("a", ReportStatus::Active),
            report("b", ReportStatus::Taken),
            report("c", ReportStatus::Active),
        ]);

        let ids: Vec<String> = backend
            .scan_active()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();

        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn contended_lock_past_deadline_inserts_nothing() {
        let backend = MemoryBackend::new();
        let blocker = backend.reports.read().await;

        let err = backend
            .insert(
                &report("late", ReportStatus::Active),
                Deadline::after(std::time::Duration::from_millis(10)),
            )
            .await
            .unwrap_err();
        drop(blocker);

        assert!(matches!(err, StoreError::Timeout { .. }));
        assert!(backend.scan_active().await.unwrap().is_empty());
    }
}
