use rayon::prelude::*;
use tracing::debug;

/// Minimum number of texts to consider parallelization
const MIN_TEXTS_FOR_PARALLEL: usize = 100;

/// Minimum total character count to consider parallelization
const MIN_CHARS_FOR_PARALLEL: usize = 10_000;

/// Determine if parallel processing should be used based on workload characteristics.
///
/// Parallelization is beneficial when:
/// - There are many texts (>= 100), OR
/// - The total character count is large (>= 10,000 chars)
#[inline]
pub(crate) fn should_use_parallel<T: AsRef<str>>(texts: &[T]) -> bool {
    let num_texts = texts.len();

    if num_texts >= MIN_TEXTS_FOR_PARALLEL {
        return true;
    }

    // Estimate from the first 20 texts rather than walking all of them
    let total_chars: usize = if num_texts > 20 {
        let sample_chars: usize = texts.iter().take(20).map(|s| s.as_ref().len()).sum();
        (sample_chars * num_texts) / 20
    } else {
        texts.iter().map(|s| s.as_ref().len()).sum()
    };

    total_chars >= MIN_CHARS_FOR_PARALLEL
}

/// Split normalized text on whitespace, dropping tokens shorter than `min_token_len` characters.
pub fn tokenize(text: &str, min_token_len: usize) -> Vec<&str> {
    text.split_whitespace()
        .filter(|token| min_token_len <= 1 || token.chars().count() >= min_token_len)
        .collect()
}

pub fn tokenize_batch<T: AsRef<str> + Sync>(texts: &[T], min_token_len: usize) -> Vec<Vec<&str>> {
    if should_use_parallel(texts) {
        debug!(num_texts = texts.len(), "Using parallel tokenization");
        texts
            .par_iter()
            .map(|text| tokenize(text.as_ref(), min_token_len))
            .collect()
    } else {
        debug!(num_texts = texts.len(), "Using sequential tokenization");
        texts
            .iter()
            .map(|text| tokenize(text.as_ref(), min_token_len))
            .collect()
    }
}
