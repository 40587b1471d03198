use std::ops::RangeInclusive;

use ahash::HashMap;
use dashmap::DashMap;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;

/// Occurrences of one n-gram inside a single document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NgramCount {
    pub count: usize,
    /// Position of the first occurrence in generation order (all unigrams, then all bigrams, ...).
    pub first_pos: usize,
}

/// Corpus-wide statistics for one n-gram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NgramStats {
    pub term_freq: usize,
    pub doc_freq: usize,
    /// `(document index, position)` of the first occurrence in the corpus.
    pub first_seen: (usize, usize),
}

pub type DocumentNgrams = HashMap<String, NgramCount>;

/// All contiguous n-grams of `tokens` for every size in `sizes`, joined with single spaces.
pub fn ngrams<'a>(
    tokens: &'a [&'a str],
    sizes: RangeInclusive<usize>,
) -> impl Iterator<Item = String> + 'a {
    sizes.flat_map(move |n| tokens.windows(n).map(|window| window.join(" ")))
}

pub fn count_ngrams(tokens: &[&str], sizes: RangeInclusive<usize>) -> DocumentNgrams {
    let mut counts = DocumentNgrams::default();
    for (pos, ngram) in ngrams(tokens, sizes).enumerate() {
        counts
            .entry(ngram)
            .and_modify(|c| c.count += 1)
            .or_insert(NgramCount {
                count: 1,
                first_pos: pos,
            });
    }
    counts
}

fn progress_bar_setup(len: usize, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("progress template is valid")
            .progress_chars("#>-"),
    );
    pb.set_message(message);
    pb
}

/// Merge per-document n-gram counts into corpus statistics.
pub fn build_vocabulary(
    documents: &[DocumentNgrams],
) -> DashMap<String, NgramStats, ahash::RandomState> {
    let vocab = DashMap::with_hasher(ahash::RandomState::default());
    let pb = progress_bar_setup(documents.len(), "Building vocabulary");

    documents
        .par_iter()
        .enumerate()
        .progress_with(pb.clone())
        .for_each(|(doc_idx, ngrams)| {
            for (ngram, count) in ngrams {
                let seen = (doc_idx, count.first_pos);
                vocab
                    .entry(ngram.clone())
                    .and_modify(|stats: &mut NgramStats| {
                        stats.term_freq += count.count;
                        stats.doc_freq += 1;
                        stats.first_seen = stats.first_seen.min(seen);
                    })
                    .or_insert(NgramStats {
                        term_freq: count.count,
                        doc_freq: 1,
                        first_seen: seen,
                    });
            }
        });
    pb.finish_and_clear();
    vocab
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unigrams_then_bigrams() {
        let tokens = ["free", "prize", "now"];
        let grams = ngrams(&tokens, 1..=2).collect::<Vec<_>>();
        assert_eq!(
            grams,
            vec!["free", "prize", "now", "free prize", "prize now"]
        );
    }

    #[test]
    fn test_short_documents() {
        let tokens = ["solo"];
        assert_eq!(ngrams(&tokens, 1..=2).collect::<Vec<_>>(), vec!["solo"]);
        assert_eq!(ngrams(&[], 1..=2).count(), 0);
    }

    #[test]
    fn test_count_ngrams() {
        let tokens = ["call", "now", "call", "now"];
        let counts = count_ngrams(&tokens, 1..=2);
        assert_eq!(counts["call"], NgramCount { count: 2, first_pos: 0 });
        assert_eq!(counts["now"], NgramCount { count: 2, first_pos: 1 });
        assert_eq!(counts["call now"], NgramCount { count: 2, first_pos: 4 });
        assert_eq!(counts["now call"], NgramCount { count: 1, first_pos: 5 });
        assert_eq!(counts.len(), 4);
    }

    #[test]
    fn test_build_vocabulary_statistics() {
        let docs = [vec!["free", "prize"], vec!["prize", "prize"], vec!["hello"]]
            .iter()
            .map(|tokens| count_ngrams(tokens, 1..=2))
            .collect::<Vec<_>>();
        let vocab = build_vocabulary(&docs);

        let prize = *vocab.get("prize").expect("prize is in the corpus");
        assert_eq!(prize.term_freq, 3);
        assert_eq!(prize.doc_freq, 2);
        assert_eq!(prize.first_seen, (0, 1));

        let bigram = *vocab.get("prize prize").expect("bigram is in the corpus");
        assert_eq!(bigram.term_freq, 1);
        assert_eq!(bigram.first_seen, (1, 2));

        // free, prize, hello, "free prize", "prize prize"
        assert_eq!(vocab.len(), 5);
    }
}
