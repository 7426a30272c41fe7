use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Article,
    Review,
}

impl RecordKind {
    pub const ALL: [RecordKind; 2] = [RecordKind::Article, RecordKind::Review];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Article => "article",
            RecordKind::Review => "review",
        }
    }

    /// Table name used by the crawler, also the CSV export file prefix.
    pub fn table_name(&self) -> &'static str {
        match self {
            RecordKind::Article => "article_news",
            RecordKind::Review => "car_reviews",
        }
    }

    pub fn body_field(&self) -> &'static str {
        match self {
            RecordKind::Article => "content",
            RecordKind::Review => "verdict",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown record kind '{0}' (expected article or review)")]
pub struct UnknownKind(pub String);

impl FromStr for RecordKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "article" | "articles" | "news" | "article_news" => Ok(RecordKind::Article),
            "review" | "reviews" | "car_reviews" => Ok(RecordKind::Review),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// News article row as exported by the crawler. Every attribute is untyped text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    #[serde(alias = "link")]
    pub url: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    #[serde(alias = "date")]
    pub publication_date: Option<String>,
    pub source: Option<String>,
    pub content: Option<String>,
}

/// Car review row as exported by the crawler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReview {
    #[serde(alias = "link")]
    pub url: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    #[serde(alias = "date")]
    pub publication_date: Option<String>,
    pub source: Option<String>,
    pub verdict: Option<String>,
    pub rating: Option<String>,
    pub price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawRecord {
    Article(RawArticle),
    Review(RawReview),
}

impl RawRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            RawRecord::Article(_) => RecordKind::Article,
            RawRecord::Review(_) => RecordKind::Review,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            RawRecord::Article(a) => a.url.as_deref(),
            RawRecord::Review(r) => r.url.as_deref(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            RawRecord::Article(a) => a.title.as_deref(),
            RawRecord::Review(r) => r.title.as_deref(),
        }
    }

    pub fn author(&self) -> Option<&str> {
        match self {
            RawRecord::Article(a) => a.author.as_deref(),
            RawRecord::Review(r) => r.author.as_deref(),
        }
    }

    pub fn publication_date(&self) -> Option<&str> {
        match self {
            RawRecord::Article(a) => a.publication_date.as_deref(),
            RawRecord::Review(r) => r.publication_date.as_deref(),
        }
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            RawRecord::Article(a) => a.source.as_deref(),
            RawRecord::Review(r) => r.source.as_deref(),
        }
    }

    /// Free-text body: article content or review verdict.
    pub fn body(&self) -> Option<&str> {
        match self {
            RawRecord::Article(a) => a.content.as_deref(),
            RawRecord::Review(r) => r.verdict.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceTier {
    Budget,
    MidRange,
    Premium,
    Luxury,
    UltraLuxury,
}

impl PriceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Budget => "budget",
            PriceTier::MidRange => "mid-range",
            PriceTier::Premium => "premium",
            PriceTier::Luxury => "luxury",
            PriceTier::UltraLuxury => "ultra-luxury",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RatingTier {
    Poor,
    Average,
    Good,
    Excellent,
}

impl RatingTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingTier::Poor => "poor",
            RatingTier::Average => "average",
            RatingTier::Good => "good",
            RatingTier::Excellent => "excellent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewFields {
    pub rating: Option<f64>,
    pub price: Option<u64>,
    pub rating_tier: Option<RatingTier>,
    pub price_tier: Option<PriceTier>,
}

/// A record that passed normalization. Text fields are trimmed; `position` is
/// the row's index in the store's read order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub id: String,
    pub kind: RecordKind,
    pub position: usize,
    pub title: String,
    pub author: Option<String>,
    pub published: NaiveDate,
    pub source: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewFields>,
}

impl CleanedRecord {
    pub fn rating(&self) -> Option<f64> {
        self.review.as_ref().and_then(|r| r.rating)
    }

    pub fn price(&self) -> Option<u64> {
        self.review.as_ref().and_then(|r| r.price)
    }

    pub fn text_length(&self) -> usize {
        self.body.chars().count()
    }

    /// Stable digest over the normalized content features are computed from.
    pub fn content_digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for part in [
            self.id.as_str(),
            self.title.as_str(),
            self.source.as_str(),
            self.body.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update(&[0x1f]);
        }
        hasher.update(self.published.to_string().as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}
