//! Per-record NLP features and their corpus-level fan-in.
//!
//! Extraction never fails: a body that cannot be analyzed yields an empty
//! [`FeatureSet`] carrying a warning flag instead.

pub mod corpus;
pub mod pool;

use std::path::Path;

use autointel_text::{
    count_ngrams, is_stop_word, rank_ngrams, tokenize, EntityCount, EntityMatcher, NgramCount,
    SentimentClass, SentimentScorer, SentimentThresholds, Vocabulary,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::records::{CleanedRecord, RecordKind};

pub use corpus::{summarize, ClassDistribution, CorpusSummary};
pub use pool::extract_all;

pub const NO_WORD_TOKENS: &str = "no word tokens";
pub const UNDECODABLE_TEXT: &str = "undecodable text";

const MIN_NGRAM_TOKEN_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub record_id: String,
    pub kind: RecordKind,
    #[serde(skip)]
    pub position: usize,
    /// Stop-word filtered tokens used for n-grams.
    pub tokens: Vec<String>,
    pub bigrams: Vec<NgramCount>,
    pub trigrams: Vec<NgramCount>,
    pub entities: Vec<EntityCount>,
    #[serde(skip)]
    pub unclassified: Vec<EntityCount>,
    pub sentence_scores: Vec<f64>,
    /// Absent for flagged records.
    pub sentiment_score: Option<f64>,
    pub sentiment_class: Option<SentimentClass>,
    pub source_digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl FeatureSet {
    fn empty(record: &CleanedRecord, warning: &str) -> Self {
        FeatureSet {
            record_id: record.id.clone(),
            kind: record.kind,
            position: record.position,
            tokens: Vec::new(),
            bigrams: Vec::new(),
            trigrams: Vec::new(),
            entities: Vec::new(),
            unclassified: Vec::new(),
            sentence_scores: Vec::new(),
            sentiment_score: None,
            sentiment_class: None,
            source_digest: record.content_digest(),
            warning: Some(warning.to_string()),
        }
    }

    /// True when `record` no longer matches the content these features came from.
    pub fn is_stale_for(&self, record: &CleanedRecord) -> bool {
        self.record_id != record.id || self.source_digest != record.content_digest()
    }
}

/// Vocabulary resolved for one run, with any recoverable problems found on the way.
#[derive(Debug, Clone)]
pub struct ResolvedVocabulary {
    pub vocabulary: Vocabulary,
    pub warnings: Vec<String>,
}

/// Loads the vocabulary file when one is configured. An unreadable or invalid
/// file falls back to the built-in lists; empty categories are reported.
pub fn resolve_vocabulary(path: Option<&Path>) -> ResolvedVocabulary {
    let mut warnings = Vec::new();
    let vocabulary = match path {
        None => Vocabulary::builtin(),
        Some(path) => match Vocabulary::load(path) {
            Ok(vocabulary) => vocabulary,
            Err(err) => {
                warn!(error = %err, "falling back to built-in vocabulary");
                warnings.push(format!("{err}; using built-in vocabulary"));
                Vocabulary::builtin()
            }
        },
    };
    for category in vocabulary.missing_categories() {
        warnings.push(format!("vocabulary category '{category}' is empty"));
    }
    ResolvedVocabulary {
        vocabulary,
        warnings,
    }
}

#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    matcher: EntityMatcher,
    scorer: SentimentScorer,
    thresholds: SentimentThresholds,
}

impl FeatureExtractor {
    pub fn new(vocabulary: Vocabulary, thresholds: SentimentThresholds) -> Self {
        Self {
            matcher: EntityMatcher::new(vocabulary),
            scorer: SentimentScorer::new(),
            thresholds,
        }
    }

    /// Features of one record; no state is shared between records.
    pub fn extract(&self, record: &CleanedRecord) -> FeatureSet {
        if record.body.contains('\0') || record.body.contains('\u{FFFD}') {
            return FeatureSet::empty(record, UNDECODABLE_TEXT);
        }

        let tokenized = tokenize(&record.body);
        if tokenized.is_empty() {
            return FeatureSet::empty(record, NO_WORD_TOKENS);
        }

        let tokens: Vec<String> = tokenized
            .tokens
            .iter()
            .map(|t| t.norm.as_str())
            .filter(|norm| !is_stop_word(norm) && norm.chars().count() >= MIN_NGRAM_TOKEN_CHARS)
            .map(str::to_string)
            .collect();
        let bigrams = rank_ngrams(&count_ngrams(&tokens, 2), None);
        let trigrams = rank_ngrams(&count_ngrams(&tokens, 3), None);

        let scan = self.matcher.scan(&tokenized.tokens);

        let sentence_scores: Vec<f64> = tokenized
            .sentences
            .iter()
            .map(|sentence| self.scorer.sentence_score(sentence))
            .collect();
        let sentiment_score = self
            .scorer
            .mean_score(&tokenized.sentences)
            .unwrap_or(0.0);

        FeatureSet {
            record_id: record.id.clone(),
            kind: record.kind,
            position: record.position,
            tokens,
            bigrams,
            trigrams,
            entities: scan.entities,
            unclassified: scan.unclassified,
            sentence_scores,
            sentiment_score: Some(sentiment_score),
            sentiment_class: Some(self.thresholds.classify(sentiment_score)),
            source_digest: record.content_digest(),
            warning: None,
        }
    }
}
