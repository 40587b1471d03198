use std::ops::RangeInclusive;

use crate::error::{Error, Result};

pub const DEFAULT_MAX_FEATURES: usize = 5000;
pub const DEFAULT_MIN_NGRAM: usize = 1;
pub const DEFAULT_MAX_NGRAM: usize = 2;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, bincode::Encode, bincode::Decode)]
pub struct VectorizerParams {
    /// Inclusive `(min_n, max_n)` n-gram sizes.
    ngram_range: (usize, usize),
    /// Keep only the most frequent n-grams. `None` keeps everything that passes the df filters.
    max_features: Option<usize>,
    /// Minimum document frequency for filtering vocabulary.
    /// - If `min_df` is in (0.0, 1.0), it's a proportion of documents
    /// - If `min_df` >= 1.0, it's an absolute document count
    min_df: f64,
    /// Maximum document frequency for filtering vocabulary.
    /// - If `max_df` is in (0.0, 1.0], it's a proportion of documents
    /// - If `max_df` > 1.0, it's an absolute document count
    max_df: f64,
    /// Apply sublinear tf scaling: replace term frequency `tf` with `1 + ln(tf)`.
    sublinear_tf: bool,
    /// Tokens with fewer characters are ignored when forming n-grams.
    min_token_len: usize,
}

impl VectorizerParams {
    #[must_use]
    pub fn with_ngram_range(mut self, ngram_range: impl Into<RangeInclusive<usize>>) -> Self {
        let range = ngram_range.into();
        self.ngram_range = (*range.start(), *range.end());
        self
    }

    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    #[must_use]
    pub fn with_min_df(mut self, min_df: f64) -> Self {
        self.min_df = min_df;
        self
    }

    #[must_use]
    pub fn with_max_df(mut self, max_df: f64) -> Self {
        self.max_df = max_df;
        self
    }

    #[must_use]
    pub fn with_sublinear_tf(mut self, sublinear_tf: bool) -> Self {
        self.sublinear_tf = sublinear_tf;
        self
    }

    #[must_use]
    pub fn with_min_token_len(mut self, min_token_len: usize) -> Self {
        self.min_token_len = min_token_len;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(Error::InvalidParams(format!(
                "ngram_range must satisfy 1 <= min <= max, got ({min_n}, {max_n})"
            )));
        }
        if self.max_features == Some(0) {
            return Err(Error::InvalidParams(
                "max_features must be positive".to_string(),
            ));
        }
        if !(self.min_df.is_finite() && self.min_df > 0.0) {
            return Err(Error::InvalidParams(format!(
                "min_df must be positive \
                 (proportion in (0.0, 1.0) or absolute count >= 1.0), got {}",
                self.min_df
            )));
        }
        if !(self.max_df.is_finite() && self.max_df > 0.0) {
            return Err(Error::InvalidParams(format!(
                "max_df must be positive \
                 (proportion in (0.0, 1.0] or absolute count > 1.0), got {}",
                self.max_df
            )));
        }
        if self.min_token_len == 0 {
            return Err(Error::InvalidParams(
                "min_token_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve `min_df`/`max_df` into absolute document-count bounds for a corpus of `n_docs`.
    pub(crate) fn document_count_bounds(&self, n_docs: usize) -> Result<(f64, f64)> {
        let n_docs = n_docs as f64;
        let min_count = if self.min_df < 1.0 {
            self.min_df * n_docs
        } else {
            self.min_df
        };
        let max_count = if self.max_df <= 1.0 {
            self.max_df * n_docs
        } else {
            self.max_df
        };
        if max_count < min_count {
            return Err(Error::InvalidParams(format!(
                "max_df corresponds to fewer documents ({max_count}) than min_df ({min_count})"
            )));
        }
        Ok((min_count, max_count))
    }

    #[must_use]
    pub fn ngram_range(&self) -> (usize, usize) {
        self.ngram_range
    }

    #[must_use]
    pub fn ngram_sizes(&self) -> RangeInclusive<usize> {
        self.ngram_range.0..=self.ngram_range.1
    }

    #[must_use]
    pub fn max_features(&self) -> Option<usize> {
        self.max_features
    }

    #[must_use]
    pub fn min_df(&self) -> f64 {
        self.min_df
    }

    #[must_use]
    pub fn max_df(&self) -> f64 {
        self.max_df
    }

    #[must_use]
    pub fn sublinear_tf(&self) -> bool {
        self.sublinear_tf
    }

    #[must_use]
    pub fn min_token_len(&self) -> usize {
        self.min_token_len
    }
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            ngram_range: (DEFAULT_MIN_NGRAM, DEFAULT_MAX_NGRAM),
            max_features: Some(DEFAULT_MAX_FEATURES),
            min_df: 1.0,
            max_df: 1.0,
            sublinear_tf: false,
            min_token_len: 1,
        }
    }
}
