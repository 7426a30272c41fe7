use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::frame::{Variable, DATE_FORMAT, PUBLISHED, RATING, SENTIMENT_SCORE};
use crate::settings::AnalysisThresholds;
use crate::stats::correlation::{correlate_values, p_value, pearson, CorrelationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Quarter => "quarter",
            Granularity::Year => "year",
        }
    }

    /// Bucket label; labels of one granularity sort chronologically as strings.
    pub fn bucket_key(&self, date: NaiveDate) -> String {
        match self {
            Granularity::Day => date.format("%Y-%m-%d").to_string(),
            Granularity::Week => {
                let week = date.iso_week();
                format!("{:04}-W{:02}", week.year(), week.week())
            }
            Granularity::Month => format!("{:04}-{:02}", date.year(), date.month()),
            Granularity::Quarter => format!("{:04}-Q{}", date.year(), (date.month() - 1) / 3 + 1),
            Granularity::Year => format!("{:04}", date.year()),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            "month" | "monthly" => Ok(Granularity::Month),
            "quarter" | "quarterly" => Ok(Granularity::Quarter),
            "year" | "yearly" => Ok(Granularity::Year),
            other => Err(format!("unknown granularity '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalBucket {
    pub bucket: String,
    pub count: usize,
    pub mean_sentiment: Option<f64>,
    pub mean_rating: Option<f64>,
    /// Fewer records than the configured minimum; reported, not dropped.
    pub low_confidence: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalSeries {
    pub slice: String,
    pub granularity: Granularity,
    pub buckets: Vec<TemporalBucket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub slice: String,
    pub series: Variable,
    pub slope: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub buckets: usize,
    pub direction: TrendDirection,
}

const BUCKET: &str = "bucket";
const COUNT: &str = "count";
const MEAN_SENTIMENT: &str = "mean_sentiment";
const MEAN_RATING: &str = "mean_rating";

/// Buckets rows by publication date and averages sentiment and rating per bucket.
pub fn bucketize(
    frame: &DataFrame,
    slice: &str,
    granularity: Granularity,
    min_samples: usize,
) -> PolarsResult<TemporalSeries> {
    let keys: Vec<Option<String>> = frame
        .column(PUBLISHED)?
        .str()?
        .into_iter()
        .map(|date| {
            date.and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok())
                .map(|d| granularity.bucket_key(d))
        })
        .collect();
    let mut keyed = frame.clone();
    keyed.with_column(Series::new(BUCKET.into(), keys))?;

    let summary = keyed
        .lazy()
        .filter(col(BUCKET).is_not_null())
        .group_by([col(BUCKET)])
        .agg([
            len().cast(DataType::UInt64).alias(COUNT),
            col(SENTIMENT_SCORE).mean().alias(MEAN_SENTIMENT),
            col(RATING).mean().alias(MEAN_RATING),
        ])
        .sort([BUCKET], SortMultipleOptions::default())
        .collect()?;

    let labels = summary.column(BUCKET)?.str()?;
    let counts = summary.column(COUNT)?.u64()?;
    let sentiment = summary.column(MEAN_SENTIMENT)?.f64()?;
    let rating = summary.column(MEAN_RATING)?.f64()?;

    let buckets = labels
        .into_iter()
        .zip(counts)
        .zip(sentiment)
        .zip(rating)
        .filter_map(|(((label, count), mean_sentiment), mean_rating)| {
            let count = count? as usize;
            Some(TemporalBucket {
                bucket: label?.to_string(),
                count,
                mean_sentiment,
                mean_rating,
                low_confidence: count < min_samples,
            })
        })
        .collect();

    Ok(TemporalSeries {
        slice: slice.to_string(),
        granularity,
        buckets,
    })
}

/// Least-squares trend of bucket means over bucket index for sentiment and rating.
/// Series with fewer than the minimum number of buckets are left out.
pub fn trends(series: &TemporalSeries, thresholds: &AnalysisThresholds) -> Vec<Trend> {
    let mut trends = Vec::new();
    for variable in [Variable::SentimentScore, Variable::Rating] {
        let points: Vec<(f64, f64)> = series
            .buckets
            .iter()
            .enumerate()
            .filter_map(|(idx, bucket)| {
                let value = match variable {
                    Variable::Rating => bucket.mean_rating,
                    _ => bucket.mean_sentiment,
                };
                value.map(|v| (idx as f64, v))
            })
            .collect();
        if points.len() < thresholds.min_trend_buckets {
            continue;
        }
        trends.push(fit_trend(&series.slice, variable, &points));
    }
    trends
}

fn fit_trend(slice: &str, series: Variable, points: &[(f64, f64)]) -> Trend {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let sxy: f64 = points.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };

    let xs: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
    let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
    let (r_squared, p) = match pearson(&xs, &ys) {
        Some(r) => (r * r, p_value(r, points.len())),
        None => (0.0, 1.0),
    };

    let direction = if slope.abs() <= 1e-9 {
        TrendDirection::Flat
    } else if slope > 0.0 {
        TrendDirection::Rising
    } else {
        TrendDirection::Falling
    };

    Trend {
        slice: slice.to_string(),
        series,
        slope,
        r_squared,
        p_value: p,
        buckets: points.len(),
        direction,
    }
}

pub const CROSS_KIND_SLICE: &str = "cross-kind";

/// Correlates article and review volume over the union of their buckets;
/// a bucket missing from one series counts as zero there.
pub fn volume_correlation(
    articles: &TemporalSeries,
    reviews: &TemporalSeries,
    thresholds: &AnalysisThresholds,
) -> Result<CorrelationResult, String> {
    let mut volumes: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for bucket in &articles.buckets {
        volumes.entry(bucket.bucket.as_str()).or_default().0 = bucket.count as f64;
    }
    for bucket in &reviews.buckets {
        volumes.entry(bucket.bucket.as_str()).or_default().1 = bucket.count as f64;
    }

    let (left, right): (Vec<Option<f64>>, Vec<Option<f64>>) = volumes
        .values()
        .map(|(a, r)| (Some(*a), Some(*r)))
        .unzip();
    correlate_values(
        CROSS_KIND_SLICE,
        "article-volume",
        "review-volume",
        &left,
        &right,
        thresholds,
    )
}
