//! Sequences load, gate, extraction and statistics for one run, and persists
//! the resulting report exactly once.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::features::{
    extract_all, resolve_vocabulary, summarize, CorpusSummary, FeatureExtractor, FeatureSet,
};
use crate::frame::build_frame;
use crate::insights::{digest, InsightInputs, Insights};
use crate::loader;
use crate::quality_gate::{self, GateOutcome, GateStep, QualityReport};
use crate::records::RecordKind;
use crate::report::{
    AnalysisReport, DatasetSummary, PipelineState, RunRequest, RunStatus, Transition,
    SCHEMA_VERSION,
};
use crate::report_store::ReportStore;
use crate::settings::{AnalysisThresholds, Settings};
use crate::stats::{
    analyze_slice, volume_correlation, CorrelationResult, GroupComparison, TemporalSeries, Trend,
};
use crate::store::RecordStore;

/// Cooperative cancellation and deadline for one run. Clones share the flag.
#[derive(Debug, Clone)]
pub struct RunControl {
    run_id: Uuid,
    cancelled: Arc<AtomicBool>,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

impl RunControl {
    pub fn new(timeout: Option<Duration>) -> Self {
        RunControl {
            run_id: Uuid::new_v4(),
            cancelled: Arc::new(AtomicBool::new(false)),
            timeout,
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Checked at every state transition.
    fn checkpoint(&self) -> Result<(), String> {
        if self.is_cancelled() {
            return Err("cancelled".to_string());
        }
        match (self.deadline, self.timeout) {
            (Some(deadline), Some(timeout)) if Instant::now() >= deadline => {
                Err(format!("timed out after {}s", timeout.as_secs()))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    Stored,
    Failed(String),
}

/// What a caller gets back from a run, whether or not it was persisted.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: AnalysisReport,
    pub persistence: Persistence,
}

impl RunOutcome {
    pub fn persisted(&self) -> bool {
        self.persistence == Persistence::Stored
    }

    pub fn label(&self) -> &'static str {
        match (&self.report.status, &self.persistence) {
            (RunStatus::Aborted, _) => "aborted",
            (_, Persistence::Failed(_)) => "failed-to-persist",
            (status, Persistence::Stored) => status.as_str(),
        }
    }
}

/// Everything collected so far; turned into the report exactly once.
struct Draft {
    run_id: Uuid,
    created_at: chrono::DateTime<Utc>,
    request: RunRequest,
    transitions: Vec<Transition>,
    warnings: Vec<String>,
    quality: Vec<QualityReport>,
    datasets: Vec<DatasetSummary>,
    features: Vec<FeatureSet>,
    corpus: Vec<CorpusSummary>,
    correlations: Vec<CorrelationResult>,
    groups: Vec<GroupComparison>,
    temporal: Vec<TemporalSeries>,
    trends: Vec<Trend>,
    cross_kind: Option<CorrelationResult>,
    insights: Insights,
}

impl Draft {
    fn new(run_id: Uuid, request: RunRequest) -> Self {
        Draft {
            run_id,
            created_at: Utc::now(),
            request,
            transitions: Vec::new(),
            warnings: Vec::new(),
            quality: Vec::new(),
            datasets: Vec::new(),
            features: Vec::new(),
            corpus: Vec::new(),
            correlations: Vec::new(),
            groups: Vec::new(),
            temporal: Vec::new(),
            trends: Vec::new(),
            cross_kind: None,
            insights: Insights::default(),
        }
    }

    fn enter(&mut self, state: PipelineState, note: Option<String>) {
        debug!(
            run_id = %self.run_id,
            state = ?state,
            note = note.as_deref(),
            "pipeline transition"
        );
        self.transitions.push(Transition {
            state,
            at: Utc::now(),
            note,
        });
    }

    fn warn(&mut self, stage: &str, message: impl AsRef<str>) {
        self.warnings.push(format!("{stage}: {}", message.as_ref()));
    }

    fn into_report(
        self,
        status: RunStatus,
        final_state: PipelineState,
        abort_reason: Option<String>,
    ) -> AnalysisReport {
        AnalysisReport {
            schema_version: SCHEMA_VERSION,
            run_id: self.run_id,
            created_at: self.created_at,
            request: self.request,
            status,
            final_state,
            transitions: self.transitions,
            quality: self.quality,
            datasets: self.datasets,
            features: self.features,
            corpus: self.corpus,
            correlations: self.correlations,
            groups: self.groups,
            temporal: self.temporal,
            trends: self.trends,
            cross_kind: self.cross_kind,
            insights: self.insights,
            warnings: self.warnings,
            abort_reason,
        }
    }
}

pub struct Orchestrator {
    records: RecordStore,
    reports: ReportStore,
    settings: Settings,
    thresholds: AnalysisThresholds,
}

impl Orchestrator {
    pub fn new(records: RecordStore, reports: ReportStore, settings: Settings) -> Self {
        Orchestrator {
            records,
            reports,
            settings,
            thresholds: AnalysisThresholds::STANDARD,
        }
    }

    pub fn report_store(&self) -> &ReportStore {
        &self.reports
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// A fresh control carrying the configured run timeout.
    pub fn control(&self) -> RunControl {
        RunControl::new(self.settings.run_timeout_secs.map(Duration::from_secs))
    }

    pub async fn run(&self, request: RunRequest) -> RunOutcome {
        self.run_with_control(request, self.control()).await
    }

    pub async fn run_with_control(&self, request: RunRequest, control: RunControl) -> RunOutcome {
        let mut draft = Draft::new(control.run_id(), request);
        info!(
            run_id = %draft.run_id,
            records = %self.records.describe(),
            reports = %self.reports.describe(),
            "analysis run started"
        );
        draft.enter(PipelineState::Init, None);

        match self.execute(&mut draft, &control).await {
            Ok(()) => self.finish(draft).await,
            Err(reason) => self.abort(draft, reason).await,
        }
    }

    async fn execute(&self, draft: &mut Draft, control: &RunControl) -> Result<(), String> {
        let kinds = draft.request.resolved_kinds();

        draft.enter(PipelineState::Loading, None);
        control.checkpoint()?;
        let mut loaded = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let outcome = loader::load(&self.records, kind, &self.thresholds)
                .await
                .map_err(|err| format!("{kind}: record store read failed: {err}"))?;
            loaded.push(outcome);
        }

        let mut gated: Vec<GateOutcome> = Vec::with_capacity(loaded.len());
        for outcome in loaded {
            let kind = outcome.kind;
            let result = quality_gate::run(outcome, &self.thresholds, |step| {
                match step {
                    GateStep::Gating => draft.enter(PipelineState::Gating, Some(kind.to_string())),
                    GateStep::Repairing { attempt } => draft.enter(
                        PipelineState::Repairing,
                        Some(format!("{kind} attempt {attempt}")),
                    ),
                }
                control.checkpoint()
            })?;
            if let Some(warning) = &result.report.warning {
                draft.warn("quality", warning);
            }
            draft.quality.push(result.report.clone());
            if result.aborted() {
                return Err(result
                    .report
                    .abort_reason
                    .clone()
                    .unwrap_or_else(|| format!("{kind}: quality gate aborted")));
            }
            gated.push(result);
        }

        draft.enter(PipelineState::Extracting, None);
        control.checkpoint()?;
        let resolved = resolve_vocabulary(self.settings.vocabulary_path.as_deref());
        for warning in &resolved.warnings {
            draft.warn("features", warning);
        }
        let extractor = Arc::new(FeatureExtractor::new(
            resolved.vocabulary,
            self.thresholds.sentiment,
        ));

        let mut per_kind: Vec<(RecordKind, Vec<FeatureSet>)> = Vec::with_capacity(gated.len());
        for outcome in &gated {
            let kind = outcome.report.kind;
            let features =
                extract_all(Arc::clone(&extractor), &outcome.records, self.settings.workers)
                    .await
                    .map_err(|err| format!("{kind}: {err}"))?;

            let mut flagged: BTreeMap<&str, usize> = BTreeMap::new();
            for feature in &features {
                if let Some(warning) = &feature.warning {
                    *flagged.entry(warning.as_str()).or_insert(0) += 1;
                }
            }
            if !flagged.is_empty() {
                let total: usize = flagged.values().sum();
                let detail = flagged
                    .iter()
                    .map(|(reason, count)| format!("{reason}: {count}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                draft.warn("features", format!("{total} {kind} records flagged ({detail})"));
            }

            draft.corpus.push(summarize(
                kind,
                &features,
                self.settings.top_k,
                self.settings.unclassified_min_count,
            ));
            per_kind.push((kind, features));
        }

        draft.enter(PipelineState::Correlating, None);
        control.checkpoint()?;
        let granularity = draft.request.granularity.unwrap_or(self.settings.granularity);
        for (outcome, (kind, features)) in gated.iter().zip(&per_kind) {
            let analysis = build_frame(&outcome.records, features)
                .and_then(|frame| {
                    analyze_slice(
                        &frame,
                        *kind,
                        granularity,
                        self.settings.min_bucket_samples,
                        &self.thresholds,
                    )
                })
                .map_err(|err| format!("{kind}: analysis frame failed: {err}"))?;
            for warning in &analysis.warnings {
                draft.warn("statistics", warning);
            }
            draft.correlations.extend(analysis.correlations);
            draft.groups.extend(analysis.groups);
            draft.temporal.push(analysis.temporal);
            draft.trends.extend(analysis.trends);
        }

        let cross_kind = {
            let series_of =
                |kind: RecordKind| draft.temporal.iter().find(|s| s.slice == kind.as_str());
            match (series_of(RecordKind::Article), series_of(RecordKind::Review)) {
                (Some(articles), Some(reviews)) => {
                    Some(volume_correlation(articles, reviews, &self.thresholds))
                }
                _ => None,
            }
        };
        match cross_kind {
            Some(Ok(result)) => draft.cross_kind = Some(result),
            Some(Err(warning)) => draft.warn("statistics", warning),
            None => {}
        }

        draft.enter(PipelineState::Aggregating, None);
        control.checkpoint()?;
        draft.datasets = gated
            .iter()
            .map(|outcome| DatasetSummary::from_records(outcome.report.kind, &outcome.records))
            .collect();
        draft.insights = digest(
            &InsightInputs {
                corpus: &draft.corpus,
                correlations: &draft.correlations,
                groups: &draft.groups,
                trends: &draft.trends,
            },
            &self.thresholds,
        );
        draft.features = per_kind
            .into_iter()
            .flat_map(|(_, features)| features)
            .collect();
        Ok(())
    }

    async fn finish(&self, mut draft: Draft) -> RunOutcome {
        let (status, final_state) = if draft.warnings.is_empty() {
            (RunStatus::Success, PipelineState::Persisted)
        } else {
            (RunStatus::Partial, PipelineState::Partial)
        };
        draft.enter(final_state, None);
        let mut report = draft.into_report(status, final_state, None);

        match self.reports.save(&report).await {
            Ok(()) => {
                info!(
                    run_id = %report.run_id,
                    status = %status,
                    warnings = report.warnings.len(),
                    "analysis run finished"
                );
                RunOutcome {
                    report,
                    persistence: Persistence::Stored,
                }
            }
            Err(err) => {
                error!(run_id = %report.run_id, error = %err, "failed to persist report");
                report.transitions.pop();
                report.final_state = PipelineState::Aggregating;
                RunOutcome {
                    report,
                    persistence: Persistence::Failed(err.to_string()),
                }
            }
        }
    }

    async fn abort(&self, mut draft: Draft, reason: String) -> RunOutcome {
        warn!(run_id = %draft.run_id, reason = %reason, "analysis run aborted");
        draft.enter(PipelineState::Aborted, Some(reason.clone()));
        draft.features.clear();
        let report = draft.into_report(RunStatus::Aborted, PipelineState::Aborted, Some(reason));

        let persistence = match self.reports.save(&report).await {
            Ok(()) => Persistence::Stored,
            Err(err) => {
                error!(
                    run_id = %report.run_id,
                    error = %err,
                    "failed to persist aborted run audit report"
                );
                Persistence::Failed(err.to_string())
            }
        };
        RunOutcome {
            report,
            persistence,
        }
    }
}

/// A run spawned onto the runtime. The run id is known before it finishes.
pub struct RunHandle {
    run_id: Uuid,
    control: RunControl,
    task: JoinHandle<RunOutcome>,
}

impl RunHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn wait(self) -> Result<RunOutcome, PipelineError> {
        self.task
            .await
            .map_err(|err| PipelineError::Worker(err.to_string()))
    }
}

pub fn trigger(orchestrator: Arc<Orchestrator>, request: RunRequest) -> RunHandle {
    let control = orchestrator.control();
    let task_control = control.clone();
    let task = tokio::spawn(async move {
        orchestrator
            .run_with_control(request, task_control)
            .await
    });
    RunHandle {
        run_id: control.run_id(),
        control,
        task,
    }
}
