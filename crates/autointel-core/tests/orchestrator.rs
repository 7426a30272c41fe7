mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use autointel_core::records::{RawRecord, RawReview, RecordKind};
use autointel_core::stats::Granularity;
use autointel_core::{
    trigger, Orchestrator, Persistence, PipelineState, RecordStore, ReportStore, RunControl,
    RunRequest, RunStatus,
};
use autointel_text::{EntityCategory, SentimentClass};
use common::{article, test_settings, varied_reviews};

fn orchestrator(rows: Vec<RawRecord>, reports: ReportStore) -> Orchestrator {
    Orchestrator::new(RecordStore::memory(rows), reports, test_settings())
}

fn states(transitions: &[autointel_core::report::Transition]) -> Vec<PipelineState> {
    transitions.iter().map(|t| t.state).collect()
}

fn set_date(row: &mut RawRecord, date: &str) {
    if let RawRecord::Review(raw) = row {
        raw.publication_date = Some(date.to_string());
    }
}

#[tokio::test]
async fn clean_reviews_finish_successfully() -> Result<()> {
    let orchestrator = orchestrator(varied_reviews(60), ReportStore::memory());
    let outcome = orchestrator.run(RunRequest::for_kind(RecordKind::Review)).await;
    let report = &outcome.report;

    assert_eq!(report.warnings, Vec::<String>::new());
    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(outcome.label(), "success");
    assert_eq!(outcome.persistence, Persistence::Stored);
    assert_eq!(report.schema_version, 1);
    assert_eq!(report.final_state, PipelineState::Persisted);
    assert_eq!(
        states(&report.transitions),
        vec![
            PipelineState::Init,
            PipelineState::Loading,
            PipelineState::Gating,
            PipelineState::Extracting,
            PipelineState::Correlating,
            PipelineState::Aggregating,
            PipelineState::Persisted,
        ]
    );
    assert_eq!(report.features.len(), 60);
    assert_eq!(report.correlations.len(), 4);
    assert!(report.correlation("review", "price", "rating").is_some());
    assert_eq!(report.datasets[0].records, 60);
    assert_eq!(report.datasets[0].sources, 2);
    assert_eq!(report.temporal[0].buckets.len(), 3);
    assert!(report.cross_kind.is_none());
    assert!(report.insights.key_findings.iter().any(|f| f.contains("price and rating")));

    let stored = orchestrator
        .report_store()
        .fetch(report.run_id)
        .await?
        .expect("persisted report");
    assert_eq!(&stored, report);
    Ok(())
}

#[tokio::test]
async fn repaired_dates_still_succeed() -> Result<()> {
    let mut rows = varied_reviews(100);
    for row in rows.iter_mut().step_by(7).take(15) {
        set_date(row, "February 10, 2024");
    }
    let outcome = orchestrator(rows, ReportStore::memory())
        .run(RunRequest::for_kind(RecordKind::Review))
        .await;

    let quality = outcome.report.quality_for(RecordKind::Review).unwrap();
    assert_eq!(quality.recovered, 15);
    assert_eq!(quality.completeness, 1.0);
    assert_eq!(outcome.report.status, RunStatus::Success);
    assert_eq!(
        &states(&outcome.report.transitions)[..5],
        &[
            PipelineState::Init,
            PipelineState::Loading,
            PipelineState::Gating,
            PipelineState::Repairing,
            PipelineState::Gating,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn unrepairable_completeness_is_partial() -> Result<()> {
    let mut rows = varied_reviews(100);
    for row in rows.iter_mut().step_by(7).take(15) {
        set_date(row, "sometime last spring");
    }
    let outcome = orchestrator(rows, ReportStore::memory())
        .run(RunRequest::for_kind(RecordKind::Review))
        .await;

    let report = &outcome.report;
    assert_eq!(report.status, RunStatus::Partial);
    assert_eq!(report.final_state, PipelineState::Partial);
    assert_eq!(
        report.warnings,
        vec!["quality: review completeness 0.85 below 0.90 after 3 repair attempts".to_string()]
    );
    let repairs = report
        .transitions
        .iter()
        .filter(|t| t.state == PipelineState::Repairing)
        .count();
    assert_eq!(repairs, 3);
    assert_eq!(report.features.len(), 85);
    assert!(outcome.persisted());
    Ok(())
}

#[tokio::test]
async fn failing_gate_aborts_and_keeps_an_audit_report() -> Result<()> {
    let mut rows = varied_reviews(10);
    for row in rows.iter_mut().take(5) {
        set_date(row, "never");
    }
    let orchestrator = orchestrator(rows, ReportStore::memory());
    let outcome = orchestrator.run(RunRequest::all()).await;

    assert_eq!(outcome.label(), "aborted");
    assert_eq!(outcome.report.status, RunStatus::Aborted);
    assert_eq!(
        outcome.report.abort_reason.as_deref(),
        Some("article: no records loaded")
    );
    assert!(outcome.report.features.is_empty());

    let stored = orchestrator
        .report_store()
        .fetch(outcome.report.run_id)
        .await?
        .expect("audit report");
    assert_eq!(stored.status, RunStatus::Aborted);
    assert_eq!(stored.final_state, PipelineState::Aborted);
    Ok(())
}

#[tokio::test]
async fn low_completeness_aborts_with_reason() {
    let mut rows = varied_reviews(10);
    for row in rows.iter_mut().take(5) {
        set_date(row, "never");
    }
    let outcome = orchestrator(rows, ReportStore::memory())
        .run(RunRequest::for_kind(RecordKind::Review))
        .await;
    assert_eq!(
        outcome.report.abort_reason.as_deref(),
        Some("review: completeness 0.50 below 0.70")
    );
    assert_eq!(outcome.report.quality.len(), 1);
    let last = outcome.report.transitions.last().unwrap();
    assert_eq!(last.state, PipelineState::Aborted);
}

#[tokio::test]
async fn unwritable_report_dir_is_failed_to_persist() -> Result<()> {
    let blocker = tempfile::NamedTempFile::new()?;
    let reports = ReportStore::filesystem(blocker.path().join("reports"));
    let outcome = orchestrator(varied_reviews(30), reports)
        .run(RunRequest::for_kind(RecordKind::Review))
        .await;

    assert_eq!(outcome.label(), "failed-to-persist");
    assert!(matches!(outcome.persistence, Persistence::Failed(_)));
    assert_eq!(outcome.report.final_state, PipelineState::Aggregating);
    assert_eq!(
        outcome.report.transitions.last().map(|t| t.state),
        Some(PipelineState::Aggregating)
    );
    assert_eq!(outcome.report.features.len(), 30);
    Ok(())
}

#[tokio::test]
async fn cancelled_runs_abort_at_the_next_transition() {
    let orchestrator = orchestrator(varied_reviews(10), ReportStore::memory());
    let control = orchestrator.control();
    control.cancel();
    let outcome = orchestrator
        .run_with_control(RunRequest::all(), control)
        .await;

    assert_eq!(outcome.report.status, RunStatus::Aborted);
    assert_eq!(outcome.report.abort_reason.as_deref(), Some("cancelled"));
    assert_eq!(
        states(&outcome.report.transitions),
        vec![PipelineState::Init, PipelineState::Loading, PipelineState::Aborted]
    );
}

#[tokio::test]
async fn expired_deadline_aborts_with_timeout() {
    let orchestrator = orchestrator(varied_reviews(10), ReportStore::memory());
    let control = RunControl::new(Some(Duration::ZERO));
    let outcome = orchestrator
        .run_with_control(RunRequest::all(), control)
        .await;
    assert_eq!(
        outcome.report.abort_reason.as_deref(),
        Some("timed out after 0s")
    );
}

#[tokio::test]
async fn single_review_extracts_entities_and_sentiment() {
    let rows = vec![RawRecord::Review(RawReview {
        url: Some("https://reviews.example/tesla".into()),
        title: Some("Model 3 verdict".into()),
        author: None,
        publication_date: Some("2024-06-01".into()),
        source: Some("Car Magazine".into()),
        verdict: Some("Tesla Model 3 review is excellent, great value".into()),
        rating: Some("4.8".into()),
        price: Some("$42,990".into()),
    })];
    let outcome = orchestrator(rows, ReportStore::memory())
        .run(RunRequest::for_kind(RecordKind::Review))
        .await;

    let features = &outcome.report.features[0];
    let has = |category: EntityCategory, name: &str| {
        features
            .entities
            .iter()
            .any(|e| e.category == category && e.entity == name)
    };
    assert!(has(EntityCategory::Brand, "Tesla"));
    assert!(has(EntityCategory::Model, "Model 3"));
    assert_eq!(features.sentiment_class, Some(SentimentClass::Positive));

    assert_eq!(outcome.report.status, RunStatus::Partial);
    assert!(outcome
        .report
        .warnings
        .iter()
        .any(|w| w.starts_with("statistics: insufficient data: price-rating")));
}

#[tokio::test]
async fn both_kinds_flag_untokenizable_articles() -> Result<()> {
    let mut rows = varied_reviews(31);
    for i in 0..12 {
        let month = i % 3 + 1;
        rows.push(article(
            &format!("https://news.example/{i}"),
            &format!("2024-{month:02}-0{}", i % 9 + 1),
            "Tesla expands the Gigafactory in Austin as sales rise.",
        ));
    }
    rows.push(article("https://news.example/blank", "2024-01-20", "!!! ???"));

    let outcome = orchestrator(rows, ReportStore::memory())
        .run(RunRequest {
            kinds: Vec::new(),
            granularity: Some(Granularity::Month),
        })
        .await;
    let report = &outcome.report;

    assert_eq!(report.corpus.len(), 2);
    assert!(report
        .warnings
        .contains(&"features: 1 article records flagged (no word tokens: 1)".to_string()));
    let articles = report.corpus_for(RecordKind::Article).unwrap();
    assert_eq!(articles.flagged_records, 1);
    assert!(report.cross_kind.is_some());
    assert_eq!(report.features.len(), 44);
    Ok(())
}

#[tokio::test]
async fn triggered_runs_expose_their_id_immediately() -> Result<()> {
    let orchestrator = Arc::new(orchestrator(varied_reviews(20), ReportStore::memory()));
    let handle = trigger(Arc::clone(&orchestrator), RunRequest::for_kind(RecordKind::Review));
    let run_id = handle.run_id();

    let outcome = handle.wait().await?;
    assert_eq!(outcome.report.run_id, run_id);
    assert!(orchestrator.report_store().fetch(run_id).await?.is_some());
    Ok(())
}
