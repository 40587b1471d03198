mod count_vectorizer;
mod ngrams;
mod params;
mod persistence;
mod tfidf_vectorizer;
mod tokenizer;
mod vocabulary;

pub use count_vectorizer::CountVectorizer;
pub use params::{
    VectorizerParams, DEFAULT_MAX_FEATURES, DEFAULT_MAX_NGRAM, DEFAULT_MIN_NGRAM,
};
pub use tfidf_vectorizer::TfidfVectorizer;
pub(crate) use tokenizer::should_use_parallel;
pub use vocabulary::Vocabulary;
