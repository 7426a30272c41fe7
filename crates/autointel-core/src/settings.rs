use std::path::{Path, PathBuf};

use autointel_text::SentimentThresholds;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::records::{PriceTier, RatingTier};
use crate::stats::temporal::Granularity;

/// Fixed analysis constants. Passed by reference to every stage and never
/// loaded from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalysisThresholds {
    /// Completeness and validity at or above this proceed.
    pub proceed_at: f64,
    /// Completeness or validity below this aborts the run.
    pub abort_below: f64,
    pub max_repair_attempts: u8,
    pub sentiment: SentimentThresholds,
    pub strength: StrengthBands,
    pub min_paired_observations: usize,
    pub min_trend_buckets: usize,
    pub significance_level: f64,
    /// |mean sentiment| above this is reported as an overall lean.
    pub insight_sentiment_margin: f64,
    /// |r| above this is reported as a notable price/rating relationship.
    pub insight_correlation_margin: f64,
    /// Inclusive upper bounds; prices above the last bound are ultra-luxury.
    pub price_tiers: [(u64, PriceTier); 4],
    /// Inclusive upper bounds on a 0-5 rating.
    pub rating_tiers: [(f64, RatingTier); 4],
    pub rating_max: f64,
}

/// Lower bounds of the |r| strength bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrengthBands {
    pub weak: f64,
    pub moderate: f64,
    pub strong: f64,
    pub very_strong: f64,
}

impl AnalysisThresholds {
    pub const STANDARD: AnalysisThresholds = AnalysisThresholds {
        proceed_at: 0.90,
        abort_below: 0.70,
        max_repair_attempts: 3,
        sentiment: SentimentThresholds::STANDARD,
        strength: StrengthBands {
            weak: 0.1,
            moderate: 0.3,
            strong: 0.5,
            very_strong: 0.7,
        },
        min_paired_observations: 3,
        min_trend_buckets: 3,
        significance_level: 0.05,
        insight_sentiment_margin: 0.1,
        insight_correlation_margin: 0.3,
        price_tiers: [
            (20_000, PriceTier::Budget),
            (40_000, PriceTier::MidRange),
            (60_000, PriceTier::Premium),
            (80_000, PriceTier::Luxury),
        ],
        rating_tiers: [
            (2.5, RatingTier::Poor),
            (3.5, RatingTier::Average),
            (4.5, RatingTier::Good),
            (5.0, RatingTier::Excellent),
        ],
        rating_max: 5.0,
    };

    pub fn price_tier(&self, price: u64) -> PriceTier {
        self.price_tiers
            .iter()
            .find(|(bound, _)| price <= *bound)
            .map(|(_, tier)| *tier)
            .unwrap_or(PriceTier::UltraLuxury)
    }

    pub fn rating_tier(&self, rating: f64) -> RatingTier {
        self.rating_tiers
            .iter()
            .find(|(bound, _)| rating <= *bound)
            .map(|(_, tier)| *tier)
            .unwrap_or(RatingTier::Excellent)
    }
}

impl Default for AnalysisThresholds {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Run tunables, loaded from an optional TOML file and `AUTOINTEL_*` overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub top_k: usize,
    pub unclassified_min_count: usize,
    pub granularity: Granularity,
    pub min_bucket_samples: usize,
    pub workers: usize,
    pub run_timeout_secs: Option<u64>,
    pub vocabulary_path: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub report_dir: PathBuf,
    pub database_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            top_k: 20,
            unclassified_min_count: 3,
            granularity: Granularity::Month,
            min_bucket_samples: 5,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            run_timeout_secs: None,
            vocabulary_path: None,
            data_dir: PathBuf::from("project_data"),
            report_dir: PathBuf::from("reports"),
            database_url: None,
        }
    }
}

impl Settings {
    /// Reads `path` (when given), then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| SettingsError::Format {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `AUTOINTEL_*` overrides using `lookup` to resolve variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("AUTOINTEL_TOP_K") {
            self.top_k = parse_env("AUTOINTEL_TOP_K", value)?;
        }
        if let Some(value) = lookup("AUTOINTEL_UNCLASSIFIED_MIN_COUNT") {
            self.unclassified_min_count = parse_env("AUTOINTEL_UNCLASSIFIED_MIN_COUNT", value)?;
        }
        if let Some(value) = lookup("AUTOINTEL_GRANULARITY") {
            self.granularity = parse_env("AUTOINTEL_GRANULARITY", value)?;
        }
        if let Some(value) = lookup("AUTOINTEL_MIN_BUCKET_SAMPLES") {
            self.min_bucket_samples = parse_env("AUTOINTEL_MIN_BUCKET_SAMPLES", value)?;
        }
        if let Some(value) = lookup("AUTOINTEL_WORKERS") {
            self.workers = parse_env("AUTOINTEL_WORKERS", value)?;
        }
        if let Some(value) = lookup("AUTOINTEL_RUN_TIMEOUT_SECS") {
            self.run_timeout_secs = Some(parse_env("AUTOINTEL_RUN_TIMEOUT_SECS", value)?);
        }
        if let Some(value) = lookup("AUTOINTEL_VOCABULARY_PATH") {
            self.vocabulary_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("AUTOINTEL_DATA_DIR") {
            self.data_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("AUTOINTEL_REPORT_DIR") {
            self.report_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("DATABASE_URL").or_else(|| lookup("AUTOINTEL_DATABASE_URL")) {
            self.database_url = Some(value);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.top_k == 0 {
            return Err(SettingsError::Invalid("top_k must be at least 1".into()));
        }
        if self.workers == 0 {
            return Err(SettingsError::Invalid("workers must be at least 1".into()));
        }
        if self.run_timeout_secs == Some(0) {
            return Err(SettingsError::Invalid(
                "run_timeout_secs must be positive when set".into(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidEnv { var, value })
}
