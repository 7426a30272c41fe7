use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::error::StoreError;
use crate::records::{CleanedRecord, RawRecord, RecordKind, ReviewFields};
use crate::settings::AnalysisThresholds;
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscardReason {
    MissingRequiredField,
    UnparseableDate,
    OutOfRangeNumeric,
    DuplicateId,
}

impl DiscardReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscardReason::MissingRequiredField => "missing-required-field",
            DiscardReason::UnparseableDate => "unparseable-date",
            DiscardReason::OutOfRangeNumeric => "out-of-range-numeric",
            DiscardReason::DuplicateId => "duplicate-id",
        }
    }
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single row could not be normalized.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{reason}: {detail}")]
pub struct ValidationError {
    pub reason: DiscardReason,
    pub detail: String,
}

impl ValidationError {
    fn new(reason: DiscardReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }

    fn missing(field: &str) -> Self {
        Self::new(
            DiscardReason::MissingRequiredField,
            format!("{field} is missing"),
        )
    }
}

/// A row excluded from the run, kept with its raw form so a repair pass can retry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discard {
    pub position: usize,
    pub id: Option<String>,
    pub reason: DiscardReason,
    pub detail: String,
    pub raw: RawRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    Strict,
    /// Progressively more lenient parsing, levels 1 through 3.
    Relaxed(u8),
}

impl Normalization {
    fn level(&self) -> u8 {
        match self {
            Normalization::Strict => 0,
            Normalization::Relaxed(level) => *level,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub kind: RecordKind,
    pub records: Vec<CleanedRecord>,
    pub discards: Vec<Discard>,
}

/// Reads every raw row of `kind` and normalizes it strictly.
pub async fn load(
    store: &RecordStore,
    kind: RecordKind,
    thresholds: &AnalysisThresholds,
) -> Result<LoadOutcome, StoreError> {
    let raw = store.fetch(kind).await?;
    let outcome = normalize_batch(kind, raw, thresholds);
    info!(
        kind = %kind,
        store = %store.describe(),
        kept = outcome.records.len(),
        discarded = outcome.discards.len(),
        "loaded records"
    );
    Ok(outcome)
}

/// Normalizes rows in read order. An id belongs to the first row carrying it,
/// even when that row is itself discarded and left for repair.
pub fn normalize_batch(
    kind: RecordKind,
    raw: Vec<RawRecord>,
    thresholds: &AnalysisThresholds,
) -> LoadOutcome {
    let mut records = Vec::with_capacity(raw.len());
    let mut discards = Vec::new();
    let mut claimed: HashSet<String> = HashSet::new();

    for (position, row) in raw.into_iter().enumerate() {
        if row.kind() != kind {
            continue;
        }
        let id = clean_id(&row);
        if let Some(id) = &id {
            if !claimed.insert(id.clone()) {
                discards.push(duplicate(position, id.clone(), row));
                continue;
            }
        }
        match normalize_record(&row, position, Normalization::Strict, thresholds) {
            Ok(record) => records.push(record),
            Err(err) => discards.push(Discard {
                position,
                id,
                reason: err.reason,
                detail: err.detail,
                raw: row,
            }),
        }
    }

    LoadOutcome {
        kind,
        records,
        discards,
    }
}

pub(crate) fn duplicate(position: usize, id: String, raw: RawRecord) -> Discard {
    Discard {
        position,
        detail: format!("id {id} already claimed by an earlier row"),
        id: Some(id),
        reason: DiscardReason::DuplicateId,
        raw,
    }
}

fn clean_id(row: &RawRecord) -> Option<String> {
    row.url()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

pub fn normalize_record(
    row: &RawRecord,
    position: usize,
    mode: Normalization,
    thresholds: &AnalysisThresholds,
) -> Result<CleanedRecord, ValidationError> {
    let id = clean_id(row).ok_or_else(|| ValidationError::missing("url"))?;
    let title = required(row.title(), "title")?;
    let body = required(row.body(), row.kind().body_field())?;
    let source = required(row.source(), "source")?;
    let date_text = row
        .publication_date()
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ValidationError::missing("publication_date"))?;
    let published = parse_date(date_text, mode).ok_or_else(|| {
        ValidationError::new(
            DiscardReason::UnparseableDate,
            format!("publication_date '{}' matches no accepted format", date_text.trim()),
        )
    })?;
    let author = row
        .author()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);

    let review = match row {
        RawRecord::Article(_) => None,
        RawRecord::Review(raw) => {
            let rating = present(raw.rating.as_deref())
                .map(|text| parse_rating(text, mode, thresholds.rating_max))
                .transpose()?;
            let price = present(raw.price.as_deref()).map(parse_price).transpose()?;
            Some(ReviewFields {
                rating,
                price,
                rating_tier: rating.map(|r| thresholds.rating_tier(r)),
                price_tier: price.map(|p| thresholds.price_tier(p)),
            })
        }
    };

    Ok(CleanedRecord {
        id,
        kind: row.kind(),
        position,
        title,
        author,
        published,
        source,
        body,
        review,
    })
}

/// Absent is missing; a present but blank value is kept for the validity check.
fn required(value: Option<&str>, field: &str) -> Result<String, ValidationError> {
    value
        .map(|v| v.trim().to_string())
        .ok_or_else(|| ValidationError::missing(field))
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy)]
enum DateFormat {
    Date(&'static str),
    DateTime(&'static str),
    Rfc3339,
    Rfc2822,
}

impl DateFormat {
    fn parse(&self, text: &str) -> Option<NaiveDate> {
        match self {
            DateFormat::Date(fmt) => NaiveDate::parse_from_str(text, fmt).ok(),
            DateFormat::DateTime(fmt) => NaiveDateTime::parse_from_str(text, fmt)
                .ok()
                .map(|dt| dt.date()),
            DateFormat::Rfc3339 => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive()),
            DateFormat::Rfc2822 => DateTime::parse_from_rfc2822(text)
                .ok()
                .map(|dt| dt.date_naive()),
        }
    }
}

const STRICT_DATE_FORMATS: &[DateFormat] = &[
    DateFormat::Date("%Y-%m-%d"),
    DateFormat::Date("%d %b %Y"),
    DateFormat::Rfc3339,
    DateFormat::DateTime("%Y-%m-%d %H:%M:%S"),
    DateFormat::DateTime("%Y-%m-%dT%H:%M:%S"),
];

const EXTENDED_DATE_FORMATS: &[DateFormat] = &[
    DateFormat::Date("%d %B %Y"),
    DateFormat::Date("%B %d, %Y"),
    DateFormat::Date("%b %d, %Y"),
    DateFormat::Date("%B %d %Y"),
    DateFormat::Date("%d/%m/%Y"),
    DateFormat::Date("%Y/%m/%d"),
    DateFormat::Date("%d.%m.%Y"),
    DateFormat::Date("%m-%d-%Y"),
    DateFormat::Rfc2822,
];

const DATE_LABELS: &[&str] = &[
    "published on", "published:", "published", "updated on", "updated:", "updated",
    "posted on", "posted:", "posted", "date:", "on",
];

const ZONE_WORDS: &[&str] = &["utc", "gmt", "bst", "cet", "cest", "est", "edt", "pst", "pdt", "am", "pm"];

/// First matching format wins; relaxed levels widen the format set and clean the text.
pub fn parse_date(text: &str, mode: Normalization) -> Option<NaiveDate> {
    let text = text.trim();
    let level = mode.level();

    if let Some(date) = match_formats(text, level) {
        return Some(date);
    }
    if level >= 2 {
        let cleaned = clean_date_text(text);
        if let Some(date) = match_formats(&cleaned, level) {
            return Some(date);
        }
        if level >= 3 {
            return scan_for_date(&cleaned, level);
        }
    }
    None
}

fn match_formats(text: &str, level: u8) -> Option<NaiveDate> {
    let extended: &[DateFormat] = if level >= 1 { EXTENDED_DATE_FORMATS } else { &[] };
    STRICT_DATE_FORMATS
        .iter()
        .chain(extended)
        .find_map(|format| format.parse(text))
}

/// Drops leading labels, ordinal suffixes and trailing time or zone fragments.
fn clean_date_text(text: &str) -> String {
    let mut rest = text.trim();
    let lowered = rest.to_ascii_lowercase();
    if let Some(label) = DATE_LABELS.iter().find(|label| {
        lowered.starts_with(*label)
            && lowered[label.len()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric())
    }) {
        rest = rest[label.len()..].trim_start_matches(|c: char| c == ':' || c.is_whitespace());
    }

    let mut words = Vec::new();
    for word in rest.split_whitespace() {
        let bare = word.trim_matches(|c: char| c == ',' || c == '|' || c == '-');
        let lower = bare.to_ascii_lowercase();
        if !words.is_empty() && (bare.contains(':') || ZONE_WORDS.contains(&lower.as_str()) || lower == "at")
        {
            break;
        }
        words.push(strip_ordinal(word));
    }
    words.join(" ").trim_end_matches([',', '|', '-']).trim().to_string()
}

fn strip_ordinal(word: &str) -> String {
    let (core, trailing) = match word.strip_suffix(',') {
        Some(core) => (core, ","),
        None => (word, ""),
    };
    let lower = core.to_ascii_lowercase();
    for suffix in ["st", "nd", "rd", "th"] {
        if let Some(number) = lower.strip_suffix(suffix) {
            if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
                return format!("{}{}", &core[..number.len()], trailing);
            }
        }
    }
    word.to_string()
}

/// Tries every window of one to four words, longest first, left to right.
fn scan_for_date(text: &str, level: u8) -> Option<NaiveDate> {
    let words: Vec<&str> = text
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| matches!(c, '(' | ')' | '[' | ']' | ';' | '|')))
        .filter(|w| !w.is_empty())
        .collect();
    for width in (1..=words.len().min(4)).rev() {
        for window in words.windows(width) {
            let candidate = window.join(" ");
            let candidate = candidate.trim_end_matches(['.', ',']);
            if let Some(date) = match_formats(candidate, level) {
                return Some(date);
            }
        }
    }
    None
}

/// Strict mode needs the whole text to be a number; lenient parsing (level 2+)
/// takes the first number and rescales `x/10` or `x out of 10`.
pub fn parse_rating(text: &str, mode: Normalization, max: f64) -> Result<f64, ValidationError> {
    let out_of_range = || {
        ValidationError::new(
            DiscardReason::OutOfRangeNumeric,
            format!("rating '{text}' is not a number in [0, {max}]"),
        )
    };

    let value = match text.trim().parse::<f64>() {
        Ok(value) => value,
        Err(_) if mode.level() >= 2 => lenient_rating(text).ok_or_else(out_of_range)?,
        Err(_) => return Err(out_of_range()),
    };

    if value.is_finite() && (0.0..=max).contains(&value) {
        Ok(value)
    } else {
        Err(out_of_range())
    }
}

fn lenient_rating(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let tail = &text[start..];
    let mut end = tail
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(tail.len());
    let number = tail[..end].trim_end_matches('.');
    end = number.len();
    let value: f64 = number.parse().ok()?;

    let rest = tail[end..].trim_start().to_ascii_lowercase();
    let scale = if rest.starts_with("/10") || rest.starts_with("/ 10") || rest.starts_with("out of 10") {
        2.0
    } else {
        1.0
    };
    Some(value / scale)
}

/// Keeps digits and separators, treats `,` as a thousands separator and drops any fraction.
pub fn parse_price(text: &str) -> Result<u64, ValidationError> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(
            DiscardReason::OutOfRangeNumeric,
            format!("price '{text}' contains no digits"),
        ));
    }

    let integral: String = kept
        .split('.')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    match integral.parse::<u64>() {
        Ok(price) if price > 0 => Ok(price),
        _ => Err(ValidationError::new(
            DiscardReason::OutOfRangeNumeric,
            format!("price '{text}' is not a positive integer"),
        )),
    }
}
