use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lexicon::{booster, is_negation, valence};

const NORMALIZATION_ALPHA: f64 = 15.0;
const NEGATION_SCALAR: f64 = -0.74;
const CAPS_INCREMENT: f64 = 0.733;
const EXCLAMATION_INCREMENT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const QUESTION_INCREMENT: f64 = 0.18;
const MAX_QUESTION_AMPLIFIER: f64 = 0.96;
const BUT_BEFORE_WEIGHT: f64 = 0.5;
const BUT_AFTER_WEIGHT: f64 = 1.5;
const LOOKBACK: usize = 3;
const LOOKBACK_DECAY: [f64; LOOKBACK] = [1.0, 0.95, 0.9];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentClass {
    Positive,
    Neutral,
    Negative,
}

impl SentimentClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentClass::Positive => "positive",
            SentimentClass::Neutral => "neutral",
            SentimentClass::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive class boundaries on the compound score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentThresholds {
    pub positive: f64,
    pub negative: f64,
}

impl SentimentThresholds {
    pub const STANDARD: SentimentThresholds = SentimentThresholds {
        positive: 0.05,
        negative: -0.05,
    };

    pub fn classify(&self, score: f64) -> SentimentClass {
        if score >= self.positive {
            SentimentClass::Positive
        } else if score <= self.negative {
            SentimentClass::Negative
        } else {
            SentimentClass::Neutral
        }
    }
}

impl Default for SentimentThresholds {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Lexicon and rule based compound polarity scorer.
///
/// Works on raw sentence text: casing, punctuation and stop words all carry
/// signal here (emphasis, negation, contrast).
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentScorer;

impl SentimentScorer {
    pub fn new() -> Self {
        Self
    }

    /// Compound score of one sentence, in [-1, 1].
    pub fn sentence_score(&self, sentence: &str) -> f64 {
        let words: Vec<&str> = sentence
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '\u{2019}'))
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return 0.0;
        }

        let lowered: Vec<String> = words
            .iter()
            .map(|w| w.replace('\u{2019}', "'").to_lowercase())
            .collect();
        let caps_words = words.iter().filter(|w| is_all_caps(w)).count();
        let caps_differential = caps_words > 0 && caps_words < words.len();

        let mut valences = Vec::with_capacity(words.len());
        for (idx, lower) in lowered.iter().enumerate() {
            if booster(lower).is_some() {
                valences.push(0.0);
                continue;
            }
            let Some(base) = valence(lower) else {
                valences.push(0.0);
                continue;
            };

            let mut value = base;
            if caps_differential && is_all_caps(words[idx]) {
                value += CAPS_INCREMENT.copysign(base);
            }

            for distance in 1..=LOOKBACK.min(idx) {
                let prev = idx - distance;
                if let Some(scalar) = booster(&lowered[prev]) {
                    let mut scalar = if value < 0.0 { -scalar } else { scalar };
                    if caps_differential && is_all_caps(words[prev]) {
                        scalar += CAPS_INCREMENT.copysign(value);
                    }
                    value += scalar * LOOKBACK_DECAY[distance - 1];
                }
            }

            let negated = (1..=LOOKBACK.min(idx)).any(|distance| is_negation(&lowered[idx - distance]));
            if negated {
                value *= NEGATION_SCALAR;
            }

            valences.push(value);
        }

        if let Some(but_idx) = lowered.iter().position(|w| w == "but") {
            for (idx, value) in valences.iter_mut().enumerate() {
                if idx < but_idx {
                    *value *= BUT_BEFORE_WEIGHT;
                } else if idx > but_idx {
                    *value *= BUT_AFTER_WEIGHT;
                }
            }
        }

        let mut sum: f64 = valences.iter().sum();
        if sum == 0.0 {
            return 0.0;
        }

        let amplifier = punctuation_amplifier(sentence);
        sum += amplifier.copysign(sum);

        normalize(sum)
    }

    /// Mean sentence score, or `None` when there are no sentences to score.
    pub fn mean_score<S: AsRef<str>>(&self, sentences: &[S]) -> Option<f64> {
        if sentences.is_empty() {
            return None;
        }
        let total: f64 = sentences
            .iter()
            .map(|s| self.sentence_score(s.as_ref()))
            .sum();
        Some((total / sentences.len() as f64).clamp(-1.0, 1.0))
    }
}

fn is_all_caps(word: &str) -> bool {
    word.chars().any(char::is_alphabetic) && !word.chars().any(char::is_lowercase)
}

fn punctuation_amplifier(sentence: &str) -> f64 {
    let exclamations = sentence.matches('!').count().min(MAX_EXCLAMATIONS);
    let questions = sentence.matches('?').count();
    let question_amp = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * QUESTION_INCREMENT,
        _ => MAX_QUESTION_AMPLIFIER,
    };
    exclamations as f64 * EXCLAMATION_INCREMENT + question_amp
}

fn normalize(sum: f64) -> f64 {
    (sum / (sum * sum + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
}
