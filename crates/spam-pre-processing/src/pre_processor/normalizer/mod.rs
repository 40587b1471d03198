//! Deterministic text normalization applied to every message before vectorization.
//!
//! Order matters, each step feeds the next:
//! 1. lowercase
//! 2. strip URL-like runs (`http…`, `www…`)
//! 3. replace anything that is not an ASCII letter or whitespace with a space
//! 4. collapse whitespace and trim
//! 5. drop stopwords
//! 6. lemmatize
//!
//! The output only contains lowercase ASCII letters separated by single spaces,
//! and normalizing it again returns it unchanged.

mod lemmatizer;
mod stopwords;

use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use tracing::debug;

pub use lemmatizer::Lemmatizer;
pub use stopwords::StopWords;

use super::vectorizer::should_use_parallel;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+|www\S+").expect("URL pattern is valid"));
static NON_LETTER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z\s]+").expect("non-letter pattern is valid"));

/// Non-empty, non-comment lines of an embedded word list.
fn word_list(contents: &str) -> impl Iterator<Item = &str> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Steps 1-4: lowercase, strip URLs and non-letters, collapse whitespace.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let without_urls = URL_PATTERN.replace_all(&lowered, "");
    let letters_only = NON_LETTER_PATTERN.replace_all(&without_urls, " ");
    letters_only.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Clone, Debug)]
pub struct Normalizer {
    stopwords: StopWords,
    lemmatizer: Lemmatizer,
}

impl Normalizer {
    /// Lemmatizer base forms that are also stopwords are pruned so the
    /// pipeline stays idempotent.
    #[must_use]
    pub fn new(stopwords: StopWords, lemmatizer: Lemmatizer) -> Self {
        let lemmatizer = lemmatizer.without_stopwords(&stopwords);
        debug!(
            num_stopwords = stopwords.len(),
            num_lemmas = lemmatizer.len(),
            "Created normalizer"
        );
        Self {
            stopwords,
            lemmatizer,
        }
    }

    /// English stopwords and lemmatizer tables.
    #[must_use]
    pub fn english() -> Self {
        Self::new(StopWords::english(), Lemmatizer::english())
    }

    /// Normalize a single message. Never fails; empty or symbol-only input yields `""`.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        let cleaned = clean_text(raw);
        cleaned
            .split(' ')
            .filter(|token| !token.is_empty() && !self.stopwords.contains(token))
            .map(|token| self.lemmatizer.lemmatize(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Normalize many messages, in parallel for large workloads. Output order matches input order.
    pub fn normalize_batch<T: AsRef<str> + Sync>(&self, raws: &[T]) -> Vec<String> {
        if should_use_parallel(raws) {
            debug!(num_texts = raws.len(), "Normalizing texts in parallel");
            raws.par_iter()
                .map(|raw| self.normalize(raw.as_ref()))
                .collect()
        } else {
            raws.iter().map(|raw| self.normalize(raw.as_ref())).collect()
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::english()
    }
}
