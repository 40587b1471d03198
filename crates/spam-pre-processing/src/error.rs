use std::path::PathBuf;

use crate::artifact::ArtifactError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The vectorizer has no vocabulary yet.
    #[error("vectorizer is not fitted: fit it or load a fitted artifact before transforming")]
    NotFitted,

    /// Fitting produced no n-grams at all.
    #[error("empty vocabulary: the corpus only contains stopwords or filtered n-grams")]
    EmptyVocabulary,

    #[error("invalid vectorizer parameters: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("failed to access artifact at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
