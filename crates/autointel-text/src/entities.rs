use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::stopwords::is_stop_word;
use crate::tokenize::Token;
use crate::vocabulary::{EntityCategory, Vocabulary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCount {
    pub entity: String,
    pub category: EntityCategory,
    pub count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct EntityScan {
    /// Vocabulary matches, in first-seen order.
    pub entities: Vec<EntityCount>,
    /// Capitalized sequences without a vocabulary match, in first-seen order.
    pub unclassified: Vec<EntityCount>,
}

/// Longest-match-first vocabulary matcher with a capitalized-sequence fallback.
///
/// Vocabulary matches are resolved first and consume their span, so the
/// capitalized heuristic never sees a token that belongs to a curated phrase.
/// Stop words never start a match and never join an unclassified sequence.
#[derive(Debug, Clone)]
pub struct EntityMatcher {
    vocabulary: Vocabulary,
}

impl EntityMatcher {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn scan(&self, tokens: &[Token]) -> EntityScan {
        let mut matched: IndexMap<(EntityCategory, String), usize> = IndexMap::new();
        let mut unclassified: IndexMap<String, usize> = IndexMap::new();

        let mut idx = 0;
        while idx < tokens.len() {
            let token = &tokens[idx];
            if is_stop_word(&token.norm) {
                idx += 1;
                continue;
            }

            if let Some((span, category, display)) = self.longest_match(tokens, idx) {
                *matched.entry((category, display)).or_insert(0) += 1;
                idx += span;
                continue;
            }

            if is_capitalized(token) {
                let start = idx;
                let mut end = idx + 1;
                while end < tokens.len()
                    && tokens[end].sentence == token.sentence
                    && is_capitalized(&tokens[end])
                    && !is_stop_word(&tokens[end].norm)
                    && self.longest_match(tokens, end).is_none()
                {
                    end += 1;
                }

                let sequence = &tokens[start..end];
                // A lone capitalized word opening a sentence is ordinary prose.
                if !(sequence.len() == 1 && sequence[0].starts_sentence) {
                    let text = sequence
                        .iter()
                        .map(|t| t.surface.as_str())
                        .collect::<Vec<_>>()
                        .join(" ");
                    *unclassified.entry(text).or_insert(0) += 1;
                }
                idx = end;
                continue;
            }

            idx += 1;
        }

        EntityScan {
            entities: matched
                .into_iter()
                .map(|((category, entity), count)| EntityCount {
                    entity,
                    category,
                    count,
                })
                .collect(),
            unclassified: unclassified
                .into_iter()
                .map(|(entity, count)| EntityCount {
                    entity,
                    category: EntityCategory::Unclassified,
                    count,
                })
                .collect(),
        }
    }

    fn longest_match(&self, tokens: &[Token], start: usize) -> Option<(usize, EntityCategory, String)> {
        let first = &tokens[start];
        self.vocabulary.candidates(&first.norm).find_map(|entry| {
            let span = entry.tokens.len();
            let window = tokens.get(start..start + span)?;
            let same_sentence = window.iter().all(|t| t.sentence == first.sentence);
            let equal = window
                .iter()
                .zip(entry.tokens.iter())
                .all(|(token, expected)| &token.norm == expected);
            (same_sentence && equal).then(|| (span, entry.category, entry.display.clone()))
        })
    }
}

fn is_capitalized(token: &Token) -> bool {
    let mut chars = token.surface.chars();
    match chars.next() {
        Some(first) => first.is_uppercase(),
        None => false,
    }
}
