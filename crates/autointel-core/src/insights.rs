use autointel_text::EntityCategory;
use serde::{Deserialize, Serialize};

use crate::features::CorpusSummary;
use crate::frame::{GroupField, Variable};
use crate::records::RecordKind;
use crate::settings::AnalysisThresholds;
use crate::stats::temporal::TrendDirection;
use crate::stats::{CorrelationResult, GroupComparison, Trend};

const TOP_BRANDS: usize = 5;

/// Plain-language digest of the run's results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub key_findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub trends: Vec<String>,
}

pub struct InsightInputs<'a> {
    pub corpus: &'a [CorpusSummary],
    pub correlations: &'a [CorrelationResult],
    pub groups: &'a [GroupComparison],
    pub trends: &'a [Trend],
}

pub fn digest(inputs: &InsightInputs<'_>, thresholds: &AnalysisThresholds) -> Insights {
    let mut insights = Insights::default();

    for summary in inputs.corpus {
        let Some(mean) = summary.mean_sentiment else {
            continue;
        };
        let subject = match summary.kind {
            RecordKind::Article => "automotive news articles",
            RecordKind::Review => "car reviews",
        };
        let finding = if mean > thresholds.insight_sentiment_margin {
            format!("Overall positive sentiment in {subject} ({mean:.2})")
        } else if mean < -thresholds.insight_sentiment_margin {
            format!("Overall negative sentiment in {subject} ({mean:.2})")
        } else {
            format!("Neutral sentiment in {subject} ({mean:.2})")
        };
        insights.key_findings.push(finding);
    }

    let brands: Vec<&str> = inputs
        .corpus
        .iter()
        .find(|c| c.kind == RecordKind::Review)
        .or_else(|| inputs.corpus.first())
        .map(|c| c.top_entities(EntityCategory::Brand, TOP_BRANDS))
        .unwrap_or_default();
    if !brands.is_empty() {
        insights
            .key_findings
            .push(format!("Most mentioned car brands: {}", brands.join(", ")));
    }

    if let Some(correlation) = inputs.correlations.iter().find(|c| {
        c.slice == RecordKind::Review.as_str()
            && c.variable_a == Variable::Price.label()
            && c.variable_b == Variable::Rating.label()
    }) {
        let r = correlation.coefficient;
        let finding = if r.abs() > thresholds.insight_correlation_margin {
            let direction = if r > 0.0 { "positive" } else { "negative" };
            format!("Strong {direction} correlation between price and rating (r = {r:.2})")
        } else {
            format!("Weak correlation between price and rating (r = {r:.2})")
        };
        insights.key_findings.push(finding);
    }

    if let Some(best) = find_group(inputs.groups, GroupField::Source).and_then(GroupComparison::best) {
        insights.key_findings.push(format!(
            "Highest average rating from: {} ({:.2})",
            best.group, best.mean
        ));
    }

    if let Some(best) =
        find_group(inputs.groups, GroupField::PriceTier).and_then(GroupComparison::best)
    {
        insights.recommendations.push(format!(
            "Focus on {} category for best ratings",
            best.group
        ));
    }

    if let Some(trend) = inputs.trends.iter().find(|t| {
        t.slice == RecordKind::Review.as_str() && t.series == Variable::Rating
    }) {
        match trend.direction {
            TrendDirection::Rising => insights.trends.push("Upward trend in ratings over time".into()),
            TrendDirection::Falling => {
                insights.trends.push("Downward trend in ratings over time".into())
            }
            TrendDirection::Flat => {}
        }
    }

    insights
}

fn find_group(groups: &[GroupComparison], field: GroupField) -> Option<&GroupComparison> {
    groups.iter().find(|g| {
        g.slice == RecordKind::Review.as_str() && g.group_by == field && g.target == Variable::Rating
    })
}
