use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::report::{AnalysisReport, ReportSummary};

#[cfg(feature = "runtime")]
use crate::db::DbPool;
#[cfg(feature = "runtime")]
use sqlx::{types::Json, Row};

/// Write-once storage for finished reports, keyed by run id.
#[derive(Debug, Clone)]
pub struct ReportStore {
    inner: ReportStoreKind,
}

#[derive(Debug, Clone)]
enum ReportStoreKind {
    Filesystem(PathBuf),
    Memory(Arc<RwLock<BTreeMap<Uuid, AnalysisReport>>>),
    #[cfg(feature = "runtime")]
    Postgres(DbPool),
}

impl ReportStore {
    /// One pretty-printed `<run_id>.json` per report under `dir`.
    pub fn filesystem(dir: impl Into<PathBuf>) -> Self {
        ReportStore {
            inner: ReportStoreKind::Filesystem(dir.into()),
        }
    }

    pub fn memory() -> Self {
        ReportStore {
            inner: ReportStoreKind::Memory(Arc::new(RwLock::new(BTreeMap::new()))),
        }
    }

    #[cfg(feature = "runtime")]
    pub fn postgres(pool: DbPool) -> Self {
        ReportStore {
            inner: ReportStoreKind::Postgres(pool),
        }
    }

    pub fn describe(&self) -> String {
        match &self.inner {
            ReportStoreKind::Filesystem(dir) => format!("files:{}", dir.display()),
            ReportStoreKind::Memory(_) => "memory".to_string(),
            #[cfg(feature = "runtime")]
            ReportStoreKind::Postgres(_) => "postgres".to_string(),
        }
    }

    /// Persists `report`. A second save of the same run id is rejected.
    pub async fn save(&self, report: &AnalysisReport) -> Result<(), PersistenceError> {
        match &self.inner {
            ReportStoreKind::Filesystem(dir) => save_file(dir, report).await?,
            ReportStoreKind::Memory(reports) => {
                let mut reports = reports.write().await;
                if reports.contains_key(&report.run_id) {
                    return Err(PersistenceError::AlreadyPersisted(report.run_id));
                }
                reports.insert(report.run_id, report.clone());
            }
            #[cfg(feature = "runtime")]
            ReportStoreKind::Postgres(pool) => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO analysis_reports (run_id, created_at, status, schema_version, report)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (run_id) DO NOTHING
                    "#,
                )
                .bind(report.run_id)
                .bind(report.created_at)
                .bind(report.status.as_str())
                .bind(report.schema_version as i32)
                .bind(Json(report))
                .execute(pool)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(PersistenceError::AlreadyPersisted(report.run_id));
                }
            }
        }
        info!(run_id = %report.run_id, status = %report.status, store = %self.describe(), "report persisted");
        Ok(())
    }

    pub async fn fetch(&self, run_id: Uuid) -> Result<Option<AnalysisReport>, PersistenceError> {
        match &self.inner {
            ReportStoreKind::Filesystem(dir) => {
                let path = report_path(dir, run_id);
                match tokio::fs::read(&path).await {
                    Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
                    Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
                    Err(source) => Err(PersistenceError::Io { path, source }),
                }
            }
            ReportStoreKind::Memory(reports) => Ok(reports.read().await.get(&run_id).cloned()),
            #[cfg(feature = "runtime")]
            ReportStoreKind::Postgres(pool) => {
                let row = sqlx::query("SELECT report FROM analysis_reports WHERE run_id = $1")
                    .bind(run_id)
                    .fetch_optional(pool)
                    .await?;
                match row {
                    Some(row) => {
                        let Json(report): Json<AnalysisReport> = row.try_get("report")?;
                        Ok(Some(report))
                    }
                    None => Ok(None),
                }
            }
        }
    }

    /// Summaries of every stored report, newest first.
    pub async fn list(&self) -> Result<Vec<ReportSummary>, PersistenceError> {
        let mut summaries = match &self.inner {
            ReportStoreKind::Filesystem(dir) => list_files(dir).await?,
            ReportStoreKind::Memory(reports) => reports
                .read()
                .await
                .values()
                .map(AnalysisReport::summary)
                .collect(),
            #[cfg(feature = "runtime")]
            ReportStoreKind::Postgres(pool) => {
                let rows = sqlx::query(
                    "SELECT report FROM analysis_reports ORDER BY created_at DESC, run_id",
                )
                .fetch_all(pool)
                .await?;
                rows.iter()
                    .map(|row| -> Result<ReportSummary, PersistenceError> {
                        let Json(report): Json<AnalysisReport> = row.try_get("report")?;
                        Ok(report.summary())
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        summaries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.run_id.cmp(&b.run_id))
        });
        Ok(summaries)
    }
}

fn report_path(dir: &Path, run_id: Uuid) -> PathBuf {
    dir.join(format!("{run_id}.json"))
}

async fn save_file(dir: &Path, report: &AnalysisReport) -> Result<(), PersistenceError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| PersistenceError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    let path = report_path(dir, report.run_id);
    let body = serde_json::to_vec_pretty(report)?;

    // Staged next to the target so a failed write never leaves a partial report.
    let staging_dir = dir.to_path_buf();
    let target = path.clone();
    let written = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let mut staged = NamedTempFile::new_in(&staging_dir)?;
        staged.write_all(&body)?;
        staged.as_file().sync_all()?;
        staged
            .persist_noclobber(&target)
            .map(|_| ())
            .map_err(|err| err.error)
    })
    .await
    .map_err(|err| PersistenceError::Io {
        path: path.clone(),
        source: std::io::Error::other(err),
    })?;

    match written {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            Err(PersistenceError::AlreadyPersisted(report.run_id))
        }
        Err(source) => Err(PersistenceError::Io { path, source }),
    }
}

async fn list_files(dir: &Path) -> Result<Vec<ReportSummary>, PersistenceError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(PersistenceError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut summaries = Vec::new();
    loop {
        let entry = entries
            .next_entry()
            .await
            .map_err(|source| PersistenceError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        let Some(entry) = entry else { break };
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| PersistenceError::Io {
                path: path.clone(),
                source,
            })?;
        match serde_json::from_slice::<AnalysisReport>(&bytes) {
            Ok(report) => summaries.push(report.summary()),
            Err(err) => debug!(path = %path.display(), error = %err, "skipping unreadable report file"),
        }
    }
    Ok(summaries)
}
