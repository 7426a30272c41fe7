use std::collections::HashMap;

use polars::prelude::{DataFrame, NamedFrom, PolarsResult, Series};
use serde::{Deserialize, Serialize};

use crate::features::FeatureSet;
use crate::records::CleanedRecord;

pub const ID: &str = "id";
pub const SOURCE: &str = "source";
pub const PUBLISHED: &str = "published";
pub const TEXT_LENGTH: &str = "text_length";
pub const SENTIMENT_SCORE: &str = "sentiment_score";
pub const RATING: &str = "rating";
pub const PRICE: &str = "price";
pub const PRICE_TIER: &str = "price_tier";
pub const RATING_TIER: &str = "rating_tier";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Numeric analysis variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variable {
    Price,
    Rating,
    SentimentScore,
    TextLength,
}

impl Variable {
    pub fn column(&self) -> &'static str {
        match self {
            Variable::Price => PRICE,
            Variable::Rating => RATING,
            Variable::SentimentScore => SENTIMENT_SCORE,
            Variable::TextLength => TEXT_LENGTH,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Variable::Price => "price",
            Variable::Rating => "rating",
            Variable::SentimentScore => "sentiment-score",
            Variable::TextLength => "text-length",
        }
    }
}

/// Categorical fields records can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupField {
    Source,
    PriceTier,
    RatingTier,
}

impl GroupField {
    pub fn column(&self) -> &'static str {
        match self {
            GroupField::Source => SOURCE,
            GroupField::PriceTier => PRICE_TIER,
            GroupField::RatingTier => RATING_TIER,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GroupField::Source => "source",
            GroupField::PriceTier => "price-tier",
            GroupField::RatingTier => "rating-tier",
        }
    }
}

/// One row per kept record. Records whose features were flagged get a null
/// sentiment score.
pub fn build_frame(records: &[CleanedRecord], features: &[FeatureSet]) -> PolarsResult<DataFrame> {
    let by_id: HashMap<&str, &FeatureSet> = features
        .iter()
        .map(|f| (f.record_id.as_str(), f))
        .collect();

    let len = records.len();
    let mut ids = Vec::with_capacity(len);
    let mut sources = Vec::with_capacity(len);
    let mut published = Vec::with_capacity(len);
    let mut text_length = Vec::with_capacity(len);
    let mut sentiment = Vec::with_capacity(len);
    let mut rating = Vec::with_capacity(len);
    let mut price = Vec::with_capacity(len);
    let mut price_tier = Vec::with_capacity(len);
    let mut rating_tier = Vec::with_capacity(len);

    for record in records {
        ids.push(record.id.as_str());
        sources.push(record.source.as_str());
        published.push(record.published.format(DATE_FORMAT).to_string());
        text_length.push(record.text_length() as f64);
        sentiment.push(
            by_id
                .get(record.id.as_str())
                .filter(|f| f.warning.is_none())
                .and_then(|f| f.sentiment_score),
        );
        rating.push(record.rating());
        price.push(record.price().map(|p| p as f64));
        let review = record.review.as_ref();
        price_tier.push(review.and_then(|r| r.price_tier).map(|t| t.as_str()));
        rating_tier.push(review.and_then(|r| r.rating_tier).map(|t| t.as_str()));
    }

    DataFrame::new(vec![
        Series::new(ID.into(), ids).into(),
        Series::new(SOURCE.into(), sources).into(),
        Series::new(PUBLISHED.into(), published).into(),
        Series::new(TEXT_LENGTH.into(), text_length).into(),
        Series::new(SENTIMENT_SCORE.into(), sentiment).into(),
        Series::new(RATING.into(), rating).into(),
        Series::new(PRICE.into(), price).into(),
        Series::new(PRICE_TIER.into(), price_tier).into(),
        Series::new(RATING_TIER.into(), rating_tier).into(),
    ])
}

pub fn numeric_column(frame: &DataFrame, variable: Variable) -> PolarsResult<Vec<Option<f64>>> {
    Ok(frame
        .column(variable.column())?
        .f64()?
        .into_iter()
        .collect())
}
