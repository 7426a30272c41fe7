use autointel_text::{EntityCategory, EntityCount, NgramCorpus, NgramCount, SentimentClass};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::features::FeatureSet;
use crate::records::RecordKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDistribution {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl ClassDistribution {
    fn add(&mut self, class: SentimentClass) {
        match class {
            SentimentClass::Positive => self.positive += 1,
            SentimentClass::Neutral => self.neutral += 1,
            SentimentClass::Negative => self.negative += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub kind: RecordKind,
    pub records: usize,
    pub flagged_records: usize,
    pub top_bigrams: Vec<NgramCount>,
    pub top_trigrams: Vec<NgramCount>,
    /// Vocabulary entities by descending frequency, ties in first-seen order.
    pub entities: Vec<EntityCount>,
    /// Capitalized sequences recurring at least the configured number of times.
    pub recurring_unclassified: Vec<EntityCount>,
    pub mean_sentiment: Option<f64>,
    pub class_distribution: ClassDistribution,
}

impl CorpusSummary {
    pub fn top_entities(&self, category: EntityCategory, limit: usize) -> Vec<&str> {
        self.entities
            .iter()
            .filter(|e| e.category == category)
            .take(limit)
            .map(|e| e.entity.as_str())
            .collect()
    }
}

/// Aggregates per-record features of one kind. `features` must be in load order.
pub fn summarize(
    kind: RecordKind,
    features: &[FeatureSet],
    top_k: usize,
    unclassified_min_count: usize,
) -> CorpusSummary {
    let mut bigrams = NgramCorpus::new();
    let mut trigrams = NgramCorpus::new();
    let mut entities: IndexMap<(EntityCategory, String), usize> = IndexMap::new();
    let mut unclassified: IndexMap<String, usize> = IndexMap::new();
    let mut distribution = ClassDistribution::default();
    let mut score_total = 0.0;
    let mut scored = 0usize;
    let mut flagged = 0usize;

    for feature in features.iter().filter(|f| f.kind == kind) {
        bigrams.merge(&feature.bigrams);
        trigrams.merge(&feature.trigrams);
        for entity in &feature.entities {
            *entities
                .entry((entity.category, entity.entity.clone()))
                .or_insert(0) += entity.count;
        }
        for entity in &feature.unclassified {
            *unclassified.entry(entity.entity.clone()).or_insert(0) += entity.count;
        }
        if feature.warning.is_some() {
            flagged += 1;
            continue;
        }
        if let (Some(score), Some(class)) = (feature.sentiment_score, feature.sentiment_class) {
            distribution.add(class);
            score_total += score;
            scored += 1;
        }
    }

    let mut entities: Vec<EntityCount> = entities
        .into_iter()
        .map(|((category, entity), count)| EntityCount {
            entity,
            category,
            count,
        })
        .collect();
    entities.sort_by(|a, b| b.count.cmp(&a.count));

    let mut recurring_unclassified: Vec<EntityCount> = unclassified
        .into_iter()
        .filter(|(_, count)| *count >= unclassified_min_count)
        .map(|(entity, count)| EntityCount {
            entity,
            category: EntityCategory::Unclassified,
            count,
        })
        .collect();
    recurring_unclassified.sort_by(|a, b| b.count.cmp(&a.count));

    CorpusSummary {
        kind,
        records: features.iter().filter(|f| f.kind == kind).count(),
        flagged_records: flagged,
        top_bigrams: bigrams.top(top_k),
        top_trigrams: trigrams.top(top_k),
        entities,
        recurring_unclassified,
        mean_sentiment: (scored > 0).then(|| score_total / scored as f64),
        class_distribution: distribution,
    }
}
