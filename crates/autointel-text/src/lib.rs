pub mod entities;
pub mod errors;
pub mod lexicon;
pub mod ngrams;
pub mod sentiment;
pub mod stopwords;
pub mod tokenize;
pub mod vocabulary;

pub use entities::{EntityCount, EntityMatcher, EntityScan};
pub use errors::TextError;
pub use ngrams::{count_ngrams, rank_ngrams, NgramCorpus, NgramCount};
pub use sentiment::{SentimentClass, SentimentScorer, SentimentThresholds};
pub use stopwords::is_stop_word;
pub use tokenize::{split_sentences, tokenize, Token, TokenizedText};
pub use vocabulary::{EntityCategory, Vocabulary, VocabularyFile};
