use std::time::Duration;

use anyhow::Result;
use autointel::{router, AppState};
use autointel_core::records::{RawRecord, RawReview};
use autointel_core::{Orchestrator, RecordStore, ReportStore, Settings};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

const VERDICTS: [&str; 4] = [
    "Excellent car with great value and a superb ride.",
    "Terrible handling and poor build quality.",
    "A decent family hatchback, nothing more.",
    "Good engine but the cabin feels cheap and noisy!",
];

fn reviews(count: usize) -> Vec<RawRecord> {
    (0..count)
        .map(|i| {
            let rating = 1.0 + (i % 9) as f64 * 0.5;
            let price = 15_000 + (i % 7) * 11_000 + i * 37;
            let verdict = format!(
                "{} {}",
                VERDICTS[i % VERDICTS.len()],
                "Tested on city roads. ".repeat(i % 5)
            );
            RawRecord::Review(RawReview {
                url: Some(format!("https://reviews.example/{i}")),
                title: Some(format!("Road test {i}")),
                author: Some("Staff".to_string()),
                publication_date: Some(format!("2024-{:02}-{:02}", i % 3 + 1, i % 27 + 1)),
                source: Some(if i % 2 == 0 { "Car Magazine" } else { "Auto Express" }.to_string()),
                verdict: Some(verdict),
                rating: Some(format!("{rating:.1}")),
                price: Some(format!("${price}")),
            })
        })
        .collect()
}

fn app() -> Router {
    let settings = Settings {
        workers: 2,
        ..Settings::default()
    };
    let orchestrator = Orchestrator::new(
        RecordStore::memory(reviews(60)),
        ReportStore::memory(),
        settings,
    );
    router(AppState::new(orchestrator))
}

async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    Ok((status, value))
}

fn get(uri: &str) -> Result<Request<Body>> {
    Ok(Request::builder().uri(uri).body(Body::empty())?)
}

fn post_runs(body: &str) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri("/runs")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))?)
}

#[tokio::test]
async fn health_reports_ok() -> Result<()> {
    let app = app();
    let (status, body) = send(&app, get("/health")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn triggered_run_is_retrievable_and_listed() -> Result<()> {
    let app = app();
    let (status, body) = send(&app, post_runs(r#"{"kinds":["review"]}"#)?).await?;
    assert_eq!(status, StatusCode::ACCEPTED);
    let run_id = body["run_id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("response carries no run_id: {body}"))?;

    let mut report = Value::Null;
    for _ in 0..200 {
        let (status, body) = send(&app, get(&format!("/runs/{run_id}"))?).await?;
        match status {
            StatusCode::OK => {
                report = body;
                break;
            }
            StatusCode::ACCEPTED => {
                assert_eq!(body["status"], "running");
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
            other => panic!("unexpected status {other}: {body}"),
        }
    }
    assert_eq!(report["run_id"], run_id.as_str());
    assert_eq!(report["schema_version"], 1);
    assert_eq!(report["status"], "success");

    let (status, listed) = send(&app, get("/runs")?).await?;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = listed
        .as_array()
        .map(|runs| runs.iter().filter_map(|r| r["run_id"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec![run_id.as_str()]);
    Ok(())
}

#[tokio::test]
async fn unknown_run_is_not_found() -> Result<()> {
    let app = app();
    let (status, _) = send(&app, get(&format!("/runs/{}", uuid::Uuid::new_v4()))?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_run_request_is_rejected() -> Result<()> {
    let app = app();
    let (status, body) = send(&app, post_runs(r#"{"kinds":["brochure"]}"#)?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body
        .as_str()
        .is_some_and(|text| text.starts_with("invalid run request")));

    let (_, listed) = send(&app, get("/runs")?).await?;
    assert_eq!(listed, Value::Array(Vec::new()));
    Ok(())
}
