pub mod correlation;
pub mod groups;
pub mod temporal;

use polars::prelude::{DataFrame, PolarsResult};

use crate::frame::{GroupField, Variable};
use crate::records::RecordKind;
use crate::settings::AnalysisThresholds;

pub use correlation::{correlate, CorrelationResult, Strength};
pub use groups::{compare_groups, GroupComparison, GroupStats};
pub use temporal::{bucketize, trends, volume_correlation, Granularity, TemporalSeries, Trend};

const REVIEW_PAIRS: &[(Variable, Variable)] = &[
    (Variable::Price, Variable::Rating),
    (Variable::SentimentScore, Variable::Rating),
    (Variable::TextLength, Variable::SentimentScore),
    (Variable::SentimentScore, Variable::Price),
];

const ARTICLE_PAIRS: &[(Variable, Variable)] = &[(Variable::TextLength, Variable::SentimentScore)];

const REVIEW_GROUPS: &[(GroupField, Variable)] = &[
    (GroupField::Source, Variable::Rating),
    (GroupField::Source, Variable::SentimentScore),
    (GroupField::PriceTier, Variable::Rating),
    (GroupField::PriceTier, Variable::SentimentScore),
];

const ARTICLE_GROUPS: &[(GroupField, Variable)] = &[(GroupField::Source, Variable::SentimentScore)];

pub fn pairs_for(kind: RecordKind) -> &'static [(Variable, Variable)] {
    match kind {
        RecordKind::Article => ARTICLE_PAIRS,
        RecordKind::Review => REVIEW_PAIRS,
    }
}

pub fn groups_for(kind: RecordKind) -> &'static [(GroupField, Variable)] {
    match kind {
        RecordKind::Article => ARTICLE_GROUPS,
        RecordKind::Review => REVIEW_GROUPS,
    }
}

/// Everything the statistics stage derives for one record kind.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceAnalysis {
    pub correlations: Vec<CorrelationResult>,
    pub groups: Vec<GroupComparison>,
    pub temporal: TemporalSeries,
    pub trends: Vec<Trend>,
    pub warnings: Vec<String>,
}

/// Pure function of its inputs: the same frame always yields the same analysis.
pub fn analyze_slice(
    frame: &DataFrame,
    kind: RecordKind,
    granularity: Granularity,
    min_bucket_samples: usize,
    thresholds: &AnalysisThresholds,
) -> PolarsResult<SliceAnalysis> {
    let slice = kind.as_str();
    let (correlations, warnings) = correlate(frame, slice, pairs_for(kind), thresholds)?;

    let groups = groups_for(kind)
        .iter()
        .map(|(field, target)| compare_groups(frame, slice, *field, *target))
        .collect::<PolarsResult<Vec<_>>>()?;

    let temporal = bucketize(frame, slice, granularity, min_bucket_samples)?;
    let trends = trends(&temporal, thresholds);

    Ok(SliceAnalysis {
        correlations,
        groups,
        temporal,
        trends,
        warnings,
    })
}
