use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextError {
    #[error("vocabulary file {path} could not be read: {source}")]
    VocabularyIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("vocabulary file {path} is not valid TOML: {source}")]
    VocabularyFormat {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("vocabulary entry '{entry}' in {category} has no matchable tokens")]
    EmptyEntry { category: &'static str, entry: String },

    #[error("vocabulary entry '{entry}' in {category} starts with a stop word")]
    StopWordEntry { category: &'static str, entry: String },
}
