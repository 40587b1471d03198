//! Text pre-processing for the spam classifier.
//!
//! [`Normalizer`] turns raw messages into lowercase, letter-only, stopword-free,
//! lemmatized text. [`TfidfVectorizer`] maps normalized text onto a fixed TF-IDF
//! feature space learned from a training corpus. Both the fitted vectorizer and
//! the downstream classifier persist through the [`artifact`] envelope.

pub mod artifact;
mod error;
pub mod pre_processor;

pub use artifact::{ArtifactError, ArtifactKind};
pub use error::{Error, Result};
pub use pre_processor::{
    clean_text, Lemmatizer, Normalizer, StopWords, TfidfVectorizer, VectorizerParams, Vocabulary,
    DEFAULT_MAX_FEATURES, DEFAULT_MAX_NGRAM, DEFAULT_MIN_NGRAM,
};
