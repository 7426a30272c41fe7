use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::{CorpusSummary, FeatureSet};
use crate::insights::Insights;
use crate::quality_gate::QualityReport;
use crate::records::{CleanedRecord, RecordKind};
use crate::stats::{CorrelationResult, GroupComparison, Granularity, TemporalSeries, Trend};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Partial,
    Aborted,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Init,
    Loading,
    Gating,
    Repairing,
    Extracting,
    Correlating,
    Aggregating,
    Persisted,
    Partial,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: PipelineState,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// What a run analyzes. An empty kind list means both kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub kinds: Vec<RecordKind>,
    #[serde(default)]
    pub granularity: Option<Granularity>,
}

impl RunRequest {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_kind(kind: RecordKind) -> Self {
        Self {
            kinds: vec![kind],
            granularity: None,
        }
    }

    /// Requested kinds, deduplicated, in canonical order.
    pub fn resolved_kinds(&self) -> Vec<RecordKind> {
        if self.kinds.is_empty() {
            return RecordKind::ALL.to_vec();
        }
        RecordKind::ALL
            .into_iter()
            .filter(|kind| self.kinds.contains(kind))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub kind: RecordKind,
    pub records: usize,
    pub sources: usize,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
    pub mean_text_length: Option<f64>,
    pub with_rating: usize,
    pub with_price: usize,
}

impl DatasetSummary {
    pub fn from_records(kind: RecordKind, records: &[CleanedRecord]) -> Self {
        let mut sources: Vec<&str> = records.iter().map(|r| r.source.as_str()).collect();
        sources.sort_unstable();
        sources.dedup();
        let total_length: usize = records.iter().map(CleanedRecord::text_length).sum();

        DatasetSummary {
            kind,
            records: records.len(),
            sources: sources.len(),
            earliest: records.iter().map(|r| r.published).min(),
            latest: records.iter().map(|r| r.published).max(),
            mean_text_length: (!records.is_empty())
                .then(|| total_length as f64 / records.len() as f64),
            with_rating: records.iter().filter(|r| r.rating().is_some()).count(),
            with_price: records.iter().filter(|r| r.price().is_some()).count(),
        }
    }
}

/// The aggregate root of one run. Built once, persisted once, never edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub schema_version: u32,
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub request: RunRequest,
    pub status: RunStatus,
    pub final_state: PipelineState,
    pub transitions: Vec<Transition>,
    pub quality: Vec<QualityReport>,
    pub datasets: Vec<DatasetSummary>,
    pub features: Vec<FeatureSet>,
    pub corpus: Vec<CorpusSummary>,
    pub correlations: Vec<CorrelationResult>,
    pub groups: Vec<GroupComparison>,
    pub temporal: Vec<TemporalSeries>,
    pub trends: Vec<Trend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_kind: Option<CorrelationResult>,
    pub insights: Insights,
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
}

impl AnalysisReport {
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            run_id: self.run_id,
            created_at: self.created_at,
            status: self.status,
        }
    }

    pub fn correlation(&self, slice: &str, a: &str, b: &str) -> Option<&CorrelationResult> {
        self.correlations
            .iter()
            .find(|c| c.slice == slice && c.variable_a == a && c.variable_b == b)
    }

    pub fn quality_for(&self, kind: RecordKind) -> Option<&QualityReport> {
        self.quality.iter().find(|q| q.kind == kind)
    }

    pub fn corpus_for(&self, kind: RecordKind) -> Option<&CorpusSummary> {
        self.corpus.iter().find(|c| c.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: RunStatus,
}
