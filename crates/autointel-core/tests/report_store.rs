mod common;

use anyhow::Result;
use autointel_core::error::PersistenceError;
use autointel_core::records::RecordKind;
use autointel_core::{Orchestrator, RecordStore, ReportStore, RunRequest, RunStatus};
use common::{test_settings, varied_reviews};

async fn persisted_run(reports: ReportStore) -> Result<autointel_core::AnalysisReport> {
    let orchestrator = Orchestrator::new(
        RecordStore::memory(varied_reviews(20)),
        reports,
        test_settings(),
    );
    let outcome = orchestrator
        .run(RunRequest::for_kind(RecordKind::Review))
        .await;
    assert!(outcome.persisted());
    Ok(outcome.report)
}

#[tokio::test]
async fn filesystem_store_round_trips_reports() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = ReportStore::filesystem(dir.path().join("reports"));
    let report = persisted_run(store.clone()).await?;

    let path = dir.path().join("reports").join(format!("{}.json", report.run_id));
    let raw = std::fs::read_to_string(&path)?;
    let json: serde_json::Value = serde_json::from_str(&raw)?;
    assert_eq!(json["schema_version"], 1);
    assert!(json["status"].is_string());
    assert!(json["warnings"].is_array());

    let fetched = store.fetch(report.run_id).await?.expect("stored report");
    assert_eq!(fetched, report);
    Ok(())
}

#[tokio::test]
async fn reports_are_write_once() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = ReportStore::filesystem(dir.path());
    let report = persisted_run(store.clone()).await?;

    let path = dir.path().join(format!("{}.json", report.run_id));
    let original = std::fs::read(&path)?;

    let mut rewritten = report.clone();
    rewritten.warnings.push("late edit".to_string());
    let err = store.save(&rewritten).await.unwrap_err();
    assert!(matches!(err, PersistenceError::AlreadyPersisted(id) if id == report.run_id));
    assert_eq!(std::fs::read(&path)?, original);

    // The rejected write leaves no staged file behind.
    let names: Vec<_> = std::fs::read_dir(dir.path())?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<std::io::Result<_>>()?;
    assert_eq!(names, vec![std::ffi::OsString::from(format!("{}.json", report.run_id))]);

    let memory = ReportStore::memory();
    let report = persisted_run(memory.clone()).await?;
    assert!(matches!(
        memory.save(&report).await,
        Err(PersistenceError::AlreadyPersisted(_))
    ));
    Ok(())
}

#[tokio::test]
async fn listing_is_newest_first() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = ReportStore::filesystem(dir.path());
    let first = persisted_run(store.clone()).await?;
    let second = persisted_run(store.clone()).await?;
    std::fs::write(dir.path().join("notes.txt"), "not a report")?;

    let listed = store.list().await?;
    assert_eq!(listed.len(), 2);
    assert!(listed[0].created_at >= listed[1].created_at);
    let ids: Vec<_> = listed.iter().map(|s| s.run_id).collect();
    assert!(ids.contains(&first.run_id) && ids.contains(&second.run_id));
    assert!(listed.iter().all(|s| s.status == RunStatus::Success));
    Ok(())
}

#[tokio::test]
async fn unknown_runs_are_absent() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = ReportStore::filesystem(dir.path().join("never-created"));
    assert!(store.fetch(uuid::Uuid::new_v4()).await?.is_none());
    assert!(store.list().await?.is_empty());
    assert!(ReportStore::memory().list().await?.is_empty());
    Ok(())
}
