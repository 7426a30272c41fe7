mod common;

use std::sync::Arc;

use anyhow::Result;
use autointel_core::features::{
    extract_all, resolve_vocabulary, summarize, FeatureExtractor, NO_WORD_TOKENS, UNDECODABLE_TEXT,
};
use autointel_core::loader;
use autointel_core::records::{RawRecord, RecordKind};
use autointel_core::settings::AnalysisThresholds;
use autointel_text::{EntityCategory, Vocabulary};
use common::article;

const T: AnalysisThresholds = AnalysisThresholds::STANDARD;

fn extractor() -> FeatureExtractor {
    FeatureExtractor::new(Vocabulary::builtin(), T.sentiment)
}

fn articles(bodies: &[&str]) -> Vec<autointel_core::CleanedRecord> {
    let rows: Vec<RawRecord> = bodies
        .iter()
        .enumerate()
        .map(|(i, body)| article(&format!("https://a/{i}"), "2024-01-01", body))
        .collect();
    loader::normalize_batch(RecordKind::Article, rows, &T).records
}

#[test]
fn unusable_bodies_yield_flagged_empty_features() {
    let records = articles(&["... !!!", "Broken \u{FFFD} text"]);
    let extractor = extractor();

    let empty = extractor.extract(&records[0]);
    assert_eq!(empty.warning.as_deref(), Some(NO_WORD_TOKENS));
    assert!(empty.tokens.is_empty());
    assert_eq!(empty.sentiment_score, None);
    assert_eq!(empty.sentiment_class, None);
    let persisted = serde_json::to_value(&empty).unwrap();
    assert!(persisted["sentiment_score"].is_null());
    assert!(persisted["sentiment_class"].is_null());

    let garbled = extractor.extract(&records[1]);
    assert_eq!(garbled.warning.as_deref(), Some(UNDECODABLE_TEXT));
}

#[test]
fn features_track_the_content_they_came_from() {
    let mut records = articles(&["Ford recalls the Mustang over brake faults."]);
    let features = extractor().extract(&records[0]);
    assert!(!features.is_stale_for(&records[0]));
    assert!(features.warning.is_none());
    assert!(features.tokens.iter().all(|t| t.chars().count() >= 3));

    records[0].body.push_str(" Owners are angry.");
    assert!(features.is_stale_for(&records[0]));
}

#[tokio::test]
async fn pooled_extraction_matches_sequential_order() -> Result<()> {
    let bodies: Vec<String> = (0..25)
        .map(|i| format!("Toyota sales rose {i} percent in Japan, a great result."))
        .collect();
    let refs: Vec<&str> = bodies.iter().map(String::as_str).collect();
    let records = articles(&refs);
    let extractor = Arc::new(extractor());

    let pooled = extract_all(Arc::clone(&extractor), &records, 4).await?;
    let sequential: Vec<_> = records.iter().map(|r| extractor.extract(r)).collect();
    assert_eq!(pooled, sequential);
    assert!(extract_all(extractor, &[], 4).await?.is_empty());
    Ok(())
}

#[test]
fn corpus_summary_excludes_flagged_records_from_sentiment() {
    let records = articles(&[
        "BMW delivers an excellent, great drive in Munich.",
        "BMW service was terrible and slow.",
        "!!!",
        "Elon Musk visited Berlin. Elon Musk praised the staff. Elon Musk left.",
    ]);
    let extractor = extractor();
    let features: Vec<_> = records.iter().map(|r| extractor.extract(r)).collect();

    let summary = summarize(RecordKind::Article, &features, 10, 3);
    assert_eq!(summary.records, 4);
    assert_eq!(summary.flagged_records, 1);
    let distribution = summary.class_distribution;
    assert_eq!(
        distribution.positive + distribution.neutral + distribution.negative,
        3
    );
    assert!(summary.mean_sentiment.is_some());
    assert_eq!(summary.top_entities(EntityCategory::Brand, 5), vec!["BMW"]);
    assert_eq!(summary.recurring_unclassified[0].entity, "Elon Musk");
    assert_eq!(summary.recurring_unclassified[0].count, 3);
}

#[test]
fn unreadable_vocabulary_falls_back_to_builtin() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("vocabulary.toml");
    let resolved = resolve_vocabulary(Some(&missing));
    assert_eq!(resolved.warnings.len(), 1);
    assert!(resolved.warnings[0].ends_with("using built-in vocabulary"));
    assert!(!resolved.vocabulary.is_empty());

    assert!(resolve_vocabulary(None).warnings.is_empty());
    Ok(())
}
