use rayon::prelude::*;
use sprs::{CsMat, CsVec};
use tracing::debug;

use super::{
    count_vectorizer::{csr_from_rows, CountVectorizer, SparseRow},
    params::VectorizerParams,
    tokenizer::should_use_parallel,
    vocabulary::Vocabulary,
};
use crate::error::{Error, Result};

#[derive(Clone, Debug)]
enum State {
    Unfitted(VectorizerParams),
    Fitted {
        count_vectorizer: CountVectorizer,
        idf: Vec<f64>,
    },
}

/// TF-IDF over word n-grams of normalized text.
///
/// Rows are `count × idf`, L2-normalized, with
/// `idf = ln((1 + n_docs) / (1 + df)) + 1`.
#[derive(Clone, Debug)]
pub struct TfidfVectorizer {
    state: State,
}

impl TfidfVectorizer {
    /// An unfitted vectorizer. Transforming with it fails with [`Error::NotFitted`].
    #[must_use]
    pub fn new(params: VectorizerParams) -> Self {
        Self {
            state: State::Unfitted(params),
        }
    }

    pub fn fit<T: AsRef<str> + Sync>(
        texts: &[T],
        count_vectorizer_params: VectorizerParams,
    ) -> Result<Self> {
        Self::fit_counts(texts, count_vectorizer_params).map(|(vectorizer, _)| vectorizer)
    }

    pub fn fit_transform<T: AsRef<str> + Sync>(
        texts: &[T],
        count_vectorizer_params: VectorizerParams,
    ) -> Result<(Self, CsMat<f64>)> {
        let (vectorizer, tf_matrix) = Self::fit_counts(texts, count_vectorizer_params)?;
        let (count_vectorizer, idf) = vectorizer.fitted()?;
        let rows = tf_matrix.outer_iterator().map(|row| {
            let mut data = row.data().to_vec();
            weight_row(count_vectorizer.params(), idf, row.indices(), &mut data);
            (row.indices().to_vec(), data)
        });
        let tfidf_matrix = csr_from_rows(count_vectorizer.num_features(), rows);
        Ok((vectorizer, tfidf_matrix))
    }

    /// Fit and return the raw count matrix the IDF was computed from.
    fn fit_counts<T: AsRef<str> + Sync>(
        texts: &[T],
        count_vectorizer_params: VectorizerParams,
    ) -> Result<(Self, CsMat<f64>)> {
        debug!(num_texts = texts.len(), "Fitting TfidfVectorizer");
        let (count_vectorizer, tf_matrix) =
            CountVectorizer::fit_transform(texts, count_vectorizer_params)?;
        debug!("Calculating IDF values");

        let n_docs = texts.len() as f64;
        let mut df = vec![0usize; count_vectorizer.num_features()];
        for row_vec in tf_matrix.outer_iterator() {
            for (col_idx, _val) in row_vec.iter() {
                df[col_idx] += 1;
            }
        }
        let idf = df
            .iter()
            .map(|&doc_freq| ((n_docs + 1.0) / (doc_freq as f64 + 1.0)).ln() + 1.0)
            .collect();
        debug!("IDF calculation complete");

        Ok((Self::from_parts(count_vectorizer, idf), tf_matrix))
    }

    pub(crate) fn from_parts(count_vectorizer: CountVectorizer, idf: Vec<f64>) -> Self {
        debug_assert_eq!(count_vectorizer.num_features(), idf.len());
        Self {
            state: State::Fitted {
                count_vectorizer,
                idf,
            },
        }
    }

    pub(crate) fn fitted(&self) -> Result<(&CountVectorizer, &[f64])> {
        match &self.state {
            State::Fitted {
                count_vectorizer,
                idf,
            } => Ok((count_vectorizer, idf)),
            State::Unfitted(_) => Err(Error::NotFitted),
        }
    }

    /// One normalized text as a `num_features`-dimensional TF-IDF vector.
    ///
    /// Out-of-vocabulary n-grams contribute nothing; a text with no known
    /// n-gram maps to the all-zero vector.
    pub fn transform(&self, text: &str) -> Result<CsVec<f64>> {
        let (count_vectorizer, idf) = self.fitted()?;
        let (indices, data) = tfidf_row(count_vectorizer, idf, text);
        Ok(CsVec::new(count_vectorizer.num_features(), indices, data))
    }

    /// Many texts as a CSR matrix, one row per text.
    /// Each row equals [`Self::transform`] of that text.
    pub fn transform_batch<T: AsRef<str> + Sync>(&self, texts: &[T]) -> Result<CsMat<f64>> {
        let (count_vectorizer, idf) = self.fitted()?;
        debug!(
            num_texts = texts.len(),
            "Transforming texts using TfidfVectorizer"
        );
        let rows: Vec<SparseRow> = if should_use_parallel(texts) {
            texts
                .par_iter()
                .map(|text| tfidf_row(count_vectorizer, idf, text.as_ref()))
                .collect()
        } else {
            texts
                .iter()
                .map(|text| tfidf_row(count_vectorizer, idf, text.as_ref()))
                .collect()
        };
        Ok(csr_from_rows(count_vectorizer.num_features(), rows))
    }

    #[must_use]
    pub fn is_fitted(&self) -> bool {
        matches!(self.state, State::Fitted { .. })
    }

    #[must_use]
    pub fn params(&self) -> &VectorizerParams {
        match &self.state {
            State::Unfitted(params) => params,
            State::Fitted {
                count_vectorizer, ..
            } => count_vectorizer.params(),
        }
    }

    /// Vocabulary size, `0` before fitting.
    #[must_use]
    pub fn num_features(&self) -> usize {
        self.vocabulary().map_or(0, Vocabulary::len)
    }

    #[must_use]
    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.fitted()
            .ok()
            .map(|(count_vectorizer, _)| count_vectorizer.vocabulary())
    }

    #[must_use]
    pub fn idf(&self) -> Option<&[f64]> {
        self.fitted().ok().map(|(_, idf)| idf)
    }
}

fn tfidf_row(count_vectorizer: &CountVectorizer, idf: &[f64], text: &str) -> SparseRow {
    let (indices, mut data) = count_vectorizer.count_row(text);
    weight_row(count_vectorizer.params(), idf, &indices, &mut data);
    (indices, data)
}

/// Apply tf scaling and IDF to raw counts, then L2-normalize. An all-zero row stays all-zero.
fn weight_row(params: &VectorizerParams, idf: &[f64], indices: &[usize], data: &mut [f64]) {
    for (val, &col_idx) in data.iter_mut().zip(indices) {
        if params.sublinear_tf() {
            *val = 1.0 + val.ln();
        }
        *val *= idf[col_idx];
    }
    let norm = data.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for val in data.iter_mut() {
            *val /= norm;
        }
    }
}
