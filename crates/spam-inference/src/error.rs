use std::path::PathBuf;

use spam_pre_processing::ArtifactError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The message is empty or whitespace only. Callers should ask for input again.
    #[error("please enter a message: input is empty or whitespace only")]
    EmptyInput,

    /// The feature vector and the classifier disagree on dimensionality.
    #[error("dimension mismatch: classifier expects {expected} features but got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("invalid classifier: {0}")]
    InvalidModel(String),

    #[error(transparent)]
    PreProcessing(#[from] spam_pre_processing::Error),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("failed to access classifier artifact at {}: {source}", path.display())]
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

    /// True when the vectorizer side of the pipeline was never fitted.
    #[must_use]
    pub fn is_not_fitted(&self) -> bool {
        matches!(self, Self::PreProcessing(spam_pre_processing::Error::NotFitted))
    }
}
