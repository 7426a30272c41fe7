use std::collections::{BTreeMap, HashSet};
use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::loader::{self, Discard, DiscardReason, LoadOutcome, Normalization};
use crate::records::{CleanedRecord, RecordKind};
use crate::settings::AnalysisThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    Proceed,
    Repair,
    Abort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityVerdict {
    pub completeness: f64,
    pub validity: f64,
    pub decision: GateDecision,
    pub kept: usize,
    pub discarded: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Scores a batch. Completeness counts rows, so it does not depend on row order.
pub fn evaluate(
    records: &[CleanedRecord],
    discards: &[Discard],
    thresholds: &AnalysisThresholds,
) -> QualityVerdict {
    let kept = records.len();
    let discarded = discards.len();
    let total = kept + discarded;

    if total == 0 {
        return QualityVerdict {
            completeness: 0.0,
            validity: 0.0,
            decision: GateDecision::Abort,
            kept,
            discarded,
            reason: Some("no records loaded".to_string()),
        };
    }

    let completeness = kept as f64 / total as f64;
    let valid = records
        .iter()
        .filter(|r| !r.body.is_empty() && !r.title.is_empty())
        .count();
    let validity = if kept == 0 {
        0.0
    } else {
        valid as f64 / kept as f64
    };

    let mut failing = Vec::new();
    for (name, value) in [("completeness", completeness), ("validity", validity)] {
        if value < thresholds.abort_below {
            failing.push(format!(
                "{name} {value:.2} below {:.2}",
                thresholds.abort_below
            ));
        }
    }

    let decision = if !failing.is_empty() {
        GateDecision::Abort
    } else if completeness >= thresholds.proceed_at && validity >= thresholds.proceed_at {
        GateDecision::Proceed
    } else {
        GateDecision::Repair
    };

    QualityVerdict {
        completeness,
        validity,
        decision,
        kept,
        discarded,
        reason: (!failing.is_empty()).then(|| failing.join(", ")),
    }
}

/// Per-kind gate summary carried into the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub kind: RecordKind,
    pub completeness: f64,
    pub validity: f64,
    pub decision: GateDecision,
    pub kept: usize,
    pub discarded: usize,
    pub discards_by_reason: BTreeMap<DiscardReason, usize>,
    pub repair_attempts: u8,
    pub recovered: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStep {
    Gating,
    Repairing { attempt: u8 },
}

#[derive(Debug, Clone)]
pub struct GateOutcome {
    pub records: Vec<CleanedRecord>,
    pub discards: Vec<Discard>,
    pub report: QualityReport,
}

impl GateOutcome {
    pub fn aborted(&self) -> bool {
        self.report.decision == GateDecision::Abort
    }
}

enum GateState {
    Evaluate,
    Repair(u8),
    Done(QualityVerdict),
}

/// Runs the gate to a final decision. `on_step` is told before every evaluation
/// and every repair pass; an error from it stops the loop.
pub fn run<E, F>(
    outcome: LoadOutcome,
    thresholds: &AnalysisThresholds,
    mut on_step: F,
) -> Result<GateOutcome, E>
where
    F: FnMut(GateStep) -> Result<(), E>,
{
    let LoadOutcome {
        kind,
        mut records,
        mut discards,
    } = outcome;
    let mut attempts = 0u8;
    let mut recovered = 0usize;

    let mut state = GateState::Evaluate;
    let verdict = loop {
        state = match state {
            GateState::Evaluate => {
                on_step(GateStep::Gating)?;
                let verdict = evaluate(&records, &discards, thresholds);
                info!(
                    kind = %kind,
                    completeness = verdict.completeness,
                    validity = verdict.validity,
                    decision = ?verdict.decision,
                    attempt = attempts,
                    "quality gate evaluated"
                );
                match verdict.decision {
                    GateDecision::Repair if attempts < thresholds.max_repair_attempts => {
                        GateState::Repair(attempts + 1)
                    }
                    _ => GateState::Done(verdict),
                }
            }
            GateState::Repair(attempt) => {
                on_step(GateStep::Repairing { attempt })?;
                attempts = attempt;
                let gained = repair_pass(&mut records, &mut discards, attempt, thresholds);
                recovered += gained;
                info!(kind = %kind, attempt, recovered = gained, "repair pass finished");
                GateState::Evaluate
            }
            GateState::Done(verdict) => break verdict,
        };
    };

    let warning = (verdict.decision == GateDecision::Repair).then(|| {
        let mut shortfalls = Vec::new();
        for (name, value) in [
            ("completeness", verdict.completeness),
            ("validity", verdict.validity),
        ] {
            if value < thresholds.proceed_at {
                shortfalls.push(format!(
                    "{kind} {name} {value:.2} below {:.2} after {attempts} repair attempts",
                    thresholds.proceed_at
                ));
            }
        }
        shortfalls.join("; ")
    });
    if let Some(message) = &warning {
        warn!(kind = %kind, "{message}");
    }

    let mut discards_by_reason = BTreeMap::new();
    for discard in &discards {
        *discards_by_reason.entry(discard.reason).or_insert(0) += 1;
    }

    let report = QualityReport {
        kind,
        completeness: verdict.completeness,
        validity: verdict.validity,
        decision: verdict.decision,
        kept: verdict.kept,
        discarded: verdict.discarded,
        discards_by_reason,
        repair_attempts: attempts,
        recovered,
        warning,
        abort_reason: verdict
            .reason
            .clone()
            .map(|reason| format!("{kind}: {reason}")),
    };

    Ok(GateOutcome {
        records,
        discards,
        report,
    })
}

/// Runs the gate without observing its steps.
pub fn run_unobserved(outcome: LoadOutcome, thresholds: &AnalysisThresholds) -> GateOutcome {
    match run(outcome, thresholds, |_| Ok::<(), Infallible>(())) {
        Ok(outcome) => outcome,
        Err(never) => match never {},
    }
}

/// Re-normalizes previously discarded rows at relaxed level `attempt`.
/// Duplicate-id discards are never retried. Returns the number of rows recovered.
fn repair_pass(
    records: &mut Vec<CleanedRecord>,
    discards: &mut Vec<Discard>,
    attempt: u8,
    thresholds: &AnalysisThresholds,
) -> usize {
    let mut kept_ids: HashSet<String> = records.iter().map(|r| r.id.clone()).collect();
    let mut recovered = 0;
    let mut remaining = Vec::with_capacity(discards.len());

    for discard in discards.drain(..) {
        if discard.reason == DiscardReason::DuplicateId {
            remaining.push(discard);
            continue;
        }
        match loader::normalize_record(
            &discard.raw,
            discard.position,
            Normalization::Relaxed(attempt),
            thresholds,
        ) {
            Ok(record) if kept_ids.contains(&record.id) => {
                remaining.push(loader::duplicate(record.position, record.id, discard.raw));
            }
            Ok(record) => {
                kept_ids.insert(record.id.clone());
                records.push(record);
                recovered += 1;
            }
            Err(err) => remaining.push(Discard {
                reason: err.reason,
                detail: err.detail,
                ..discard
            }),
        }
    }

    records.sort_by_key(|r| r.position);
    remaining.sort_by_key(|d| d.position);
    *discards = remaining;
    recovered
}
