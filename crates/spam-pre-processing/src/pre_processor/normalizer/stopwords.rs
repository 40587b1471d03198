use ahash::HashSet;

use super::word_list;

static ENGLISH_STOPWORDS: &str = include_str!("../../../data/stopwords_en.txt");

/// An immutable set of tokens dropped before lemmatization.
#[derive(Clone, Debug, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// The embedded English list (articles, pronouns, prepositions, auxiliaries
    /// and the contraction fragments left behind once apostrophes are stripped).
    #[must_use]
    pub fn english() -> Self {
        Self::from_words(word_list(ENGLISH_STOPWORDS))
    }

    /// Build a set from arbitrary words. Entries are lowercased so they match normalized tokens.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|word| word.as_ref().trim().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
