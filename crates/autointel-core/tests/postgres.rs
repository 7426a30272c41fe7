#![cfg(feature = "runtime")]

mod common;

use std::env;

use anyhow::Result;
use autointel_core::db;
use autointel_core::error::PersistenceError;
use autointel_core::records::RecordKind;
use autointel_core::{Orchestrator, RecordStore, ReportStore, RunRequest};
use common::{test_settings, varied_reviews};

#[tokio::test]
async fn postgres_report_store_round_trip() -> Result<()> {
    let database_url = match env::var("AUTOINTEL_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping postgres report store test because AUTOINTEL_TEST_DATABASE_URL is not set"
            );
            return Ok(());
        }
    };

    let pool = db::connect(&database_url).await?;
    db::run_migrations(&pool).await?;

    let reports = ReportStore::postgres(pool.clone());
    let orchestrator = Orchestrator::new(
        RecordStore::memory(varied_reviews(20)),
        reports.clone(),
        test_settings(),
    );
    let outcome = orchestrator
        .run(RunRequest::for_kind(RecordKind::Review))
        .await;
    assert!(outcome.persisted());

    let fetched = reports
        .fetch(outcome.report.run_id)
        .await?
        .expect("report row");
    assert_eq!(fetched, outcome.report);
    assert!(matches!(
        reports.save(&outcome.report).await,
        Err(PersistenceError::AlreadyPersisted(_))
    ));
    assert!(reports
        .list()
        .await?
        .iter()
        .any(|s| s.run_id == outcome.report.run_id));
    Ok(())
}

#[tokio::test]
async fn postgres_record_store_reads_crawler_tables() -> Result<()> {
    let database_url = match env::var("AUTOINTEL_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping postgres record store test because AUTOINTEL_TEST_DATABASE_URL is not set"
            );
            return Ok(());
        }
    };

    let pool = db::connect(&database_url).await?;
    db::run_migrations(&pool).await?;

    let link = format!("https://reviews.example/{}", uuid::Uuid::new_v4());
    sqlx::query(
        "INSERT INTO car_reviews (link, title, author, publication_date, source, verdict, rating, price)
         VALUES ($1, 'Test', NULL, '2024-01-01', 'Mag', 'Great car', '4.5', '$39,000')",
    )
    .bind(&link)
    .execute(&pool)
    .await?;

    let rows = RecordStore::postgres(pool).fetch(RecordKind::Review).await?;
    let row = rows
        .iter()
        .find(|r| r.url() == Some(link.as_str()))
        .expect("inserted review");
    assert_eq!(row.body(), Some("Great car"));
    assert_eq!(row.author(), None);
    Ok(())
}
