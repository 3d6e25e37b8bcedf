//! Flat-file backend: one JSON array holding every report.
//!
//! Each append reads the whole file, pushes the new record, and rewrites
//! the file. The rewrite goes to a sibling temporary file that is synced
//! and then renamed over the previous file, so a concurrent reader sees either
//! the old array or the new one and a failed write leaves the old file in
//! place.
//!
//! The write, sync, and rename run as one blocking task that holds the
//! writer lock until it finishes. The deadline is checked right before the
//! rename; past that point the append completes even if its caller has
//! gone away.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_report_models::ParkingReport;
use tokio::sync::Mutex;

use crate::{Deadline, StoreBackend, StoreError};

/// Default location of the record log.
pub const DEFAULT_PATH: &str = "data/available_parking.json";

/// Record-log backend over a single JSON file.
#[derive(Debug)]
pub struct JsonLogBackend {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process. Owned
    /// guards travel into the commit task.
    write_lock: Arc<Mutex<()>>,
}

impl JsonLogBackend {
    /// Creates a backend for the file at `path`. The file is created on the
    /// first append; until then the store is empty.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Path of the record log.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<ParkingReport>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Writes `contents` to `tmp`, syncs it, and renames it over `path` unless
/// the deadline has passed by then.
fn commit(path: &Path, tmp: &Path, contents: &[u8], deadline: Deadline) -> Result<(), StoreError> {
    let result = write_and_rename(path, tmp, contents, deadline);

    if result.is_err() {
        let _ = std::fs::remove_file(tmp);
    }

    result
}

fn write_and_rename(
    path: &Path,
    tmp: &Path,
    contents: &[u8],
    deadline: Deadline,
) -> Result<(), StoreError> {
    let mut file = std::fs::File::create(tmp)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    deadline.check("append")?;
    std::fs::rename(tmp, path)?;

    Ok(())
}

#[async_trait]
impl StoreBackend for JsonLogBackend {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn insert(&self, report: &ParkingReport, deadline: Deadline) -> Result<(), StoreError> {
        let guard = deadline
            .run("append", async {
                Ok(Arc::clone(&self.write_lock).lock_owned().await)
            })
            .await?;

        let mut reports = deadline.run("append", self.read_all()).await?;
        reports.push(report.clone());
        let contents = serde_json::to_vec_pretty(&reports)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let parent = parent.to_path_buf();
            deadline
                .run("append", async { Ok(tokio::fs::create_dir_all(parent).await?) })
                .await?;
        }

        deadline.check("append")?;

        let path = self.path.clone();
        let tmp = self.temp_path();
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            commit(&path, &tmp, &contents, deadline)
        })
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;

        log::debug!(
            "Rewrote {} with {} record(s)",
            self.path.display(),
            reports.len()
        );

        Ok(())
    }

    async fn scan_active(&self) -> Result<Vec<ParkingReport>, StoreError> {
        let mut reports = self.read_all().await?;
        reports.retain(ParkingReport::is_active);
        Ok(reports)
    }
}
