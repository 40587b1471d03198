mod normalizer;
mod vectorizer;

pub use normalizer::{clean_text, Lemmatizer, Normalizer, StopWords};
pub use vectorizer::{
    CountVectorizer, TfidfVectorizer, VectorizerParams, Vocabulary, DEFAULT_MAX_FEATURES,
    DEFAULT_MAX_NGRAM, DEFAULT_MIN_NGRAM,
};
