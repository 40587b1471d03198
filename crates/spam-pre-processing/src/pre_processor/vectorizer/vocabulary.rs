use ahash::HashMap;

/// Immutable n-gram → feature index mapping. Indices follow the lexicographic order of the terms.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build from terms that are already strictly increasing (sorted, unique, non-empty).
    pub(crate) fn from_sorted_terms(terms: Vec<String>) -> Result<Self, String> {
        if let Some(pos) = terms.iter().position(String::is_empty) {
            return Err(format!("vocabulary term {pos} is empty"));
        }
        if let Some(pos) = terms.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(format!(
                "vocabulary terms are not strictly increasing at index {}: {:?} >= {:?}",
                pos + 1,
                terms[pos],
                terms[pos + 1]
            ));
        }
        Ok(Self::from_fitted_terms(terms))
    }

    /// Terms produced by fitting are unique and sorted by construction.
    pub(crate) fn from_fitted_terms(terms: Vec<String>) -> Self {
        debug_assert!(terms.windows(2).all(|pair| pair[0] < pair[1]));
        let index = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();
        Self { terms, index }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, ngram: &str) -> Option<usize> {
        self.index.get(ngram).copied()
    }

    #[must_use]
    pub fn term(&self, idx: usize) -> Option<&str> {
        self.terms.get(idx).map(String::as_str)
    }

    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// `(term, index)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.as_str(), idx))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
