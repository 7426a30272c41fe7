use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NgramCount {
    pub ngram: String,
    pub count: usize,
}

/// Counts overlapping windows of size `n`, keyed by the space-joined window.
/// Iteration order of the returned map is first-seen order.
pub fn count_ngrams<S: AsRef<str>>(tokens: &[S], n: usize) -> IndexMap<String, usize> {
    let mut counts = IndexMap::new();
    if n == 0 || tokens.len() < n {
        return counts;
    }

    for window in tokens.windows(n) {
        let key = window
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(" ");
        *counts.entry(key).or_insert(0) += 1;
    }

    counts
}

/// Orders by descending count; the sort is stable so ties keep first-seen order.
pub fn rank_ngrams(counts: &IndexMap<String, usize>, top_k: Option<usize>) -> Vec<NgramCount> {
    let mut ranked: Vec<NgramCount> = counts
        .iter()
        .map(|(ngram, count)| NgramCount {
            ngram: ngram.clone(),
            count: *count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    if let Some(limit) = top_k {
        ranked.truncate(limit);
    }
    ranked
}

/// Corpus-wide accumulator. Records must be merged in a deterministic order for
/// the first-seen tie break to be reproducible.
#[derive(Debug, Clone, Default)]
pub struct NgramCorpus {
    counts: IndexMap<String, usize>,
}

impl NgramCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, record_counts: &[NgramCount]) {
        for entry in record_counts {
            *self.counts.entry(entry.ngram.clone()).or_insert(0) += entry.count;
        }
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn top(&self, top_k: usize) -> Vec<NgramCount> {
        rank_ngrams(&self.counts, Some(top_k))
    }
}
