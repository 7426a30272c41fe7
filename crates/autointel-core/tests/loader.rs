mod common;

use anyhow::Result;
use autointel_core::loader::{self, parse_date, parse_price, parse_rating, DiscardReason, Normalization};
use autointel_core::records::{PriceTier, RatingTier, RawRecord, RawReview, RecordKind};
use autointel_core::settings::AnalysisThresholds;
use autointel_core::store::RecordStore;
use chrono::NaiveDate;
use common::{article, review};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn strict_dates_accept_iso_and_short_month_forms() {
    assert_eq!(parse_date("2024-03-05", Normalization::Strict), Some(date(2024, 3, 5)));
    assert_eq!(parse_date("05 Mar 2024", Normalization::Strict), Some(date(2024, 3, 5)));
    assert_eq!(
        parse_date("2024-03-05T10:15:00Z", Normalization::Strict),
        Some(date(2024, 3, 5))
    );
    assert_eq!(parse_date("March 5, 2024", Normalization::Strict), None);
}

#[test]
fn relaxed_levels_widen_date_parsing() {
    assert_eq!(
        parse_date("March 5, 2024", Normalization::Relaxed(1)),
        Some(date(2024, 3, 5))
    );
    assert_eq!(parse_date("Published on 5th March 2024", Normalization::Relaxed(1)), None);
    assert_eq!(
        parse_date("Published on 5th March 2024", Normalization::Relaxed(2)),
        Some(date(2024, 3, 5))
    );
    assert_eq!(
        parse_date("Road test (updated 12/04/2024)", Normalization::Relaxed(3)),
        Some(date(2024, 4, 12))
    );
    assert_eq!(parse_date("sometime last spring", Normalization::Relaxed(3)), None);
}

#[test]
fn ratings_must_be_within_scale() {
    let max = AnalysisThresholds::STANDARD.rating_max;
    assert_eq!(parse_rating("4.5", Normalization::Strict, max).unwrap(), 4.5);
    assert_eq!(parse_rating("0", Normalization::Strict, max).unwrap(), 0.0);

    let err = parse_rating("7", Normalization::Strict, max).unwrap_err();
    assert_eq!(err.reason, DiscardReason::OutOfRangeNumeric);
    assert!(parse_rating("4 stars", Normalization::Strict, max).is_err());
    assert_eq!(parse_rating("4 stars", Normalization::Relaxed(2), max).unwrap(), 4.0);
    assert_eq!(parse_rating("8/10", Normalization::Relaxed(2), max).unwrap(), 4.0);
}

#[test]
fn prices_are_normalized_to_positive_integers() {
    assert_eq!(parse_price("$45,990").unwrap(), 45_990);
    assert_eq!(parse_price("£32,500.99").unwrap(), 32_500);
    assert_eq!(
        parse_price("POA").unwrap_err().reason,
        DiscardReason::OutOfRangeNumeric
    );
    assert!(parse_price("0").is_err());
}

#[test]
fn tiers_follow_fixed_thresholds() {
    let t = AnalysisThresholds::STANDARD;
    assert_eq!(t.price_tier(20_000), PriceTier::Budget);
    assert_eq!(t.price_tier(20_001), PriceTier::MidRange);
    assert_eq!(t.price_tier(80_000), PriceTier::Luxury);
    assert_eq!(t.price_tier(80_001), PriceTier::UltraLuxury);
    assert_eq!(t.rating_tier(0.0), RatingTier::Poor);
    assert_eq!(t.rating_tier(3.5), RatingTier::Average);
    assert_eq!(t.rating_tier(4.6), RatingTier::Excellent);
}

#[test]
fn batch_discards_are_counted_with_reasons() {
    let rows = vec![
        review("https://r/1", "2024-01-10", Some("4.0"), Some("$30,000")),
        review("https://r/2", "not a date", Some("4.0"), None),
        review("https://r/3", "2024-01-11", Some("9.5"), None),
        review("https://r/1", "2024-01-12", Some("3.0"), None),
        RawRecord::Review(RawReview {
            url: Some("https://r/5".into()),
            ..RawReview::default()
        }),
        review("  ", "2024-01-13", None, None),
        review("https://r/7", "2024-01-14", None, None),
    ];

    let outcome = loader::normalize_batch(RecordKind::Review, rows, &AnalysisThresholds::STANDARD);
    let kept: Vec<&str> = outcome.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(kept, vec!["https://r/1", "https://r/7"]);

    let reasons: Vec<(usize, DiscardReason)> = outcome
        .discards
        .iter()
        .map(|d| (d.position, d.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (1, DiscardReason::UnparseableDate),
            (2, DiscardReason::OutOfRangeNumeric),
            (3, DiscardReason::DuplicateId),
            (4, DiscardReason::MissingRequiredField),
            (5, DiscardReason::MissingRequiredField),
        ]
    );

    let first = &outcome.records[0];
    let fields = first.review.as_ref().unwrap();
    assert_eq!(fields.price, Some(30_000));
    assert_eq!(fields.price_tier, Some(PriceTier::MidRange));
    assert_eq!(fields.rating_tier, Some(RatingTier::Good));
    assert_eq!(outcome.records[1].rating(), None);
    assert_eq!(outcome.records[1].price(), None);
}

#[test]
fn blank_text_fields_are_kept_but_absent_ones_are_missing() {
    let mut blank = article("https://a/1", "2024-02-01", "   ");
    if let RawRecord::Article(raw) = &mut blank {
        raw.author = Some("  ".into());
    }
    let mut absent = article("https://a/2", "2024-02-01", "Body");
    if let RawRecord::Article(raw) = &mut absent {
        raw.content = None;
    }

    let outcome = loader::normalize_batch(
        RecordKind::Article,
        vec![blank, absent],
        &AnalysisThresholds::STANDARD,
    );
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].body, "");
    assert_eq!(outcome.records[0].author, None);
    assert_eq!(outcome.discards[0].reason, DiscardReason::MissingRequiredField);
    assert!(outcome.discards[0].detail.contains("content"));
}

#[test]
fn batch_ignores_rows_of_the_other_kind() {
    let rows = vec![
        article("https://a/1", "2024-02-01", "Body text"),
        review("https://r/1", "2024-02-01", None, None),
    ];
    let outcome = loader::normalize_batch(RecordKind::Article, rows, &AnalysisThresholds::STANDARD);
    assert_eq!(outcome.records.len(), 1);
    assert!(outcome.discards.is_empty());
}

#[tokio::test]
async fn csv_exports_are_read_in_file_name_order() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("car_reviews_2.csv"),
        "link,title,author,date,source,verdict,rating,price\n\
         https://r/2,Second,,2024-01-02,Mag,Fine car,4.0,\n",
    )?;
    std::fs::write(
        dir.path().join("car_reviews_1.csv"),
        "link,title,author,date,source,verdict,rating,price\n\
         https://r/1,First,Ann,2024-01-01,Mag,Great car,5,\"$41,000\"\n",
    )?;
    std::fs::write(
        dir.path().join("article_news.csv"),
        "link,title,author,date,source,content\nhttps://a/1,News,,2024-01-01,Wire,Text\n",
    )?;

    let store = RecordStore::csv_dir(dir.path());
    let outcome = loader::load(&store, RecordKind::Review, &AnalysisThresholds::STANDARD).await?;

    let ids: Vec<&str> = outcome.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["https://r/1", "https://r/2"]);
    assert_eq!(outcome.records[0].price(), Some(41_000));
    assert_eq!(outcome.records[1].author, None);
    assert_eq!(outcome.records[1].price(), None);
    Ok(())
}

#[tokio::test]
async fn missing_export_directory_yields_no_rows() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = RecordStore::csv_dir(dir.path().join("absent"));
    let outcome = loader::load(&store, RecordKind::Article, &AnalysisThresholds::STANDARD).await?;
    assert!(outcome.records.is_empty());
    assert!(outcome.discards.is_empty());
    Ok(())
}
