use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::records::{RawArticle, RawRecord, RawReview, RecordKind};

#[cfg(feature = "runtime")]
use crate::db::DbPool;
#[cfg(feature = "runtime")]
use sqlx::Row;

/// Read-only access to the crawler's raw records.
#[derive(Debug, Clone)]
pub struct RecordStore {
    inner: RecordStoreKind,
}

#[derive(Debug, Clone)]
enum RecordStoreKind {
    CsvDir(PathBuf),
    Memory(Arc<Vec<RawRecord>>),
    #[cfg(feature = "runtime")]
    Postgres(DbPool),
}

impl RecordStore {
    /// CSV exports in `dir`, matched as `<table>*.csv` and read in file-name order.
    pub fn csv_dir(dir: impl Into<PathBuf>) -> Self {
        RecordStore {
            inner: RecordStoreKind::CsvDir(dir.into()),
        }
    }

    pub fn memory(records: Vec<RawRecord>) -> Self {
        RecordStore {
            inner: RecordStoreKind::Memory(Arc::new(records)),
        }
    }

    #[cfg(feature = "runtime")]
    pub fn postgres(pool: DbPool) -> Self {
        RecordStore {
            inner: RecordStoreKind::Postgres(pool),
        }
    }

    pub fn describe(&self) -> String {
        match &self.inner {
            RecordStoreKind::CsvDir(dir) => format!("csv:{}", dir.display()),
            RecordStoreKind::Memory(records) => format!("memory:{}", records.len()),
            #[cfg(feature = "runtime")]
            RecordStoreKind::Postgres(_) => "postgres".to_string(),
        }
    }

    /// All raw rows of `kind`, in the store's read order.
    pub async fn fetch(&self, kind: RecordKind) -> Result<Vec<RawRecord>, StoreError> {
        match &self.inner {
            RecordStoreKind::CsvDir(dir) => read_csv_dir(dir, kind),
            RecordStoreKind::Memory(records) => Ok(records
                .iter()
                .filter(|record| record.kind() == kind)
                .cloned()
                .collect()),
            #[cfg(feature = "runtime")]
            RecordStoreKind::Postgres(pool) => fetch_postgres(pool, kind).await,
        }
    }
}

pub fn export_pattern(dir: &Path, kind: RecordKind) -> String {
    dir.join(format!("{}*.csv", kind.table_name()))
        .to_string_lossy()
        .into_owned()
}

fn read_csv_dir(dir: &Path, kind: RecordKind) -> Result<Vec<RawRecord>, StoreError> {
    let pattern = export_pattern(dir, kind);
    let mut paths = glob::glob(&pattern)?.collect::<Result<Vec<_>, _>>()?;
    paths.sort();

    if paths.is_empty() {
        warn!(pattern = %pattern, "no export files matched");
    }

    let mut records = Vec::new();
    for path in paths {
        let before = records.len();
        match kind {
            RecordKind::Article => {
                records.extend(read_csv::<RawArticle>(&path)?.into_iter().map(RawRecord::Article))
            }
            RecordKind::Review => {
                records.extend(read_csv::<RawReview>(&path)?.into_iter().map(RawRecord::Review))
            }
        }
        debug!(path = %path.display(), rows = records.len() - before, "read export file");
    }
    Ok(records)
}

/// Empty cells come back as `None`, matching how the crawler exports nulls.
fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| StoreError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| StoreError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(feature = "runtime")]
async fn fetch_postgres(pool: &DbPool, kind: RecordKind) -> Result<Vec<RawRecord>, StoreError> {
    match kind {
        RecordKind::Article => {
            let rows = sqlx::query(
                r#"
                    SELECT link, title, author, publication_date, source, content
                    FROM article_news
                    ORDER BY id
                "#,
            )
            .fetch_all(pool)
            .await?;

            rows.into_iter()
                .map(|row| -> Result<RawRecord, StoreError> {
                    Ok(RawRecord::Article(RawArticle {
                        url: row.try_get("link")?,
                        title: row.try_get("title")?,
                        author: row.try_get("author")?,
                        publication_date: row.try_get("publication_date")?,
                        source: row.try_get("source")?,
                        content: row.try_get("content")?,
                    }))
                })
                .collect()
        }
        RecordKind::Review => {
            let rows = sqlx::query(
                r#"
                    SELECT link, title, author, publication_date, source, verdict, rating, price
                    FROM car_reviews
                    ORDER BY id
                "#,
            )
            .fetch_all(pool)
            .await?;

            rows.into_iter()
                .map(|row| -> Result<RawRecord, StoreError> {
                    Ok(RawRecord::Review(RawReview {
                        url: row.try_get("link")?,
                        title: row.try_get("title")?,
                        author: row.try_get("author")?,
                        publication_date: row.try_get("publication_date")?,
                        source: row.try_get("source")?,
                        verdict: row.try_get("verdict")?,
                        rating: row.try_get("rating")?,
                        price: row.try_get("price")?,
                    }))
                })
                .collect()
        }
    }
}
