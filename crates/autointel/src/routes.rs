use std::sync::Arc;

use autointel_core::{AnalysisReport, ReportSummary, RunRequest};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::state::{AppState, RunProgress};

#[derive(Debug, Serialize)]
pub struct RunAccepted {
    pub run_id: Uuid,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// An empty body runs every record kind at the configured granularity.
pub async fn create_run(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<RunAccepted>), (StatusCode, String)> {
    let request: RunRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RunRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| (StatusCode::BAD_REQUEST, format!("invalid run request: {err}")))?
    };
    let run_id = app_state.start(request).await;
    tracing::info!(run_id = %run_id, "run accepted");
    Ok((StatusCode::ACCEPTED, Json(RunAccepted { run_id })))
}

pub async fn get_run(
    State(app_state): State<Arc<AppState>>,
    Path(run_id): Path<Uuid>,
) -> Result<Response, StatusCode> {
    if let Some(report) = fetch_report(&app_state, run_id).await? {
        return Ok(Json(report).into_response());
    }

    match app_state.progress(run_id).await {
        RunProgress::Running => Ok((
            StatusCode::ACCEPTED,
            Json(json!({ "run_id": run_id, "status": "running" })),
        )
            .into_response()),
        RunProgress::Finished(outcome) if outcome.persisted() => {
            Ok(Json(outcome.report).into_response())
        }
        RunProgress::Finished(outcome) => Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "run_id": run_id,
                "status": outcome.label(),
                "report": outcome.report,
            })),
        )
            .into_response()),
        RunProgress::Unknown => Err(StatusCode::NOT_FOUND),
    }
}

pub async fn list_runs(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<ReportSummary>>, StatusCode> {
    app_state
        .orchestrator()
        .report_store()
        .list()
        .await
        .map(Json)
        .map_err(|err| {
            tracing::error!("listing reports failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

async fn fetch_report(
    app_state: &AppState,
    run_id: Uuid,
) -> Result<Option<AnalysisReport>, StatusCode> {
    app_state
        .orchestrator()
        .report_store()
        .fetch(run_id)
        .await
        .map_err(|err| {
            tracing::error!("fetching report {run_id} failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
