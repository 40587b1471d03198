use std::cmp::Reverse;

use rayon::prelude::*;
use sprs::CsMat;
use tracing::debug;

use super::{
    ngrams::{self, DocumentNgrams, NgramStats},
    params::VectorizerParams,
    tokenizer::{self, should_use_parallel},
    vocabulary::Vocabulary,
};
use crate::error::{Error, Result};

/// Sparse row as parallel `(indices, values)` vectors, indices ascending.
pub(crate) type SparseRow = (Vec<usize>, Vec<f64>);

#[derive(Clone, Debug)]
pub struct CountVectorizer {
    params: VectorizerParams,
    vocabulary: Vocabulary,
}

impl CountVectorizer {
    pub fn fit<T: AsRef<str> + Sync>(texts: &[T], params: VectorizerParams) -> Result<Self> {
        debug!(num_texts = texts.len(), "Fitting CountVectorizer");
        params.validate()?;
        let documents = count_documents(texts, &params);
        Self::fit_from_ngrams(&documents, params)
    }

    pub(crate) fn from_parts(params: VectorizerParams, vocabulary: Vocabulary) -> Self {
        Self { params, vocabulary }
    }

    /// Build the vocabulary from per-document n-gram counts.
    ///
    /// N-grams outside the `min_df`/`max_df` bounds are dropped first. If more than
    /// `max_features` remain, the most frequent are kept: corpus frequency descending,
    /// then document frequency descending, then first-seen order. Retained n-grams are
    /// indexed in lexicographic order.
    fn fit_from_ngrams(documents: &[DocumentNgrams], params: VectorizerParams) -> Result<Self> {
        if documents.is_empty() {
            return Err(Error::EmptyVocabulary);
        }
        let (min_count, max_count) = params.document_count_bounds(documents.len())?;

        debug!("Building vocabulary from n-gram counts");
        let vocab_df = ngrams::build_vocabulary(documents);
        let vocab_size = vocab_df.len();

        debug!(
            min_df = params.min_df(),
            max_df = params.max_df(),
            "Applying document frequency filtering"
        );
        let mut candidates = vocab_df
            .into_iter()
            .filter(|(_, stats)| {
                let df = stats.doc_freq as f64;
                df >= min_count && df <= max_count
            })
            .collect::<Vec<(String, NgramStats)>>();
        debug!(
            original_size = vocab_size,
            filtered_size = candidates.len(),
            "Vocabulary filtered by document frequency"
        );

        if let Some(max_features) = params.max_features() {
            if candidates.len() > max_features {
                candidates.sort_unstable_by_key(|(_, stats)| {
                    (
                        Reverse(stats.term_freq),
                        Reverse(stats.doc_freq),
                        stats.first_seen,
                    )
                });
                candidates.truncate(max_features);
                debug!(max_features, "Vocabulary truncated to the most frequent n-grams");
            }
        }

        if candidates.is_empty() {
            return Err(Error::EmptyVocabulary);
        }

        let mut sorted_terms = candidates
            .into_iter()
            .map(|(term, _)| term)
            .collect::<Vec<_>>();
        sorted_terms.sort_unstable();
        let vocabulary = Vocabulary::from_fitted_terms(sorted_terms);

        debug!(vocab_size = vocabulary.len(), "CountVectorizer fitting complete");
        Ok(Self { params, vocabulary })
    }

    /// Raw n-gram counts of one text, restricted to the vocabulary.
    pub(crate) fn count_row(&self, text: &str) -> SparseRow {
        let tokens = tokenizer::tokenize(text, self.params.min_token_len());
        let document = ngrams::count_ngrams(&tokens, self.params.ngram_sizes());
        self.row_from_ngrams(&document)
    }

    fn row_from_ngrams(&self, document: &DocumentNgrams) -> SparseRow {
        let mut entries = document
            .iter()
            .filter_map(|(ngram, count)| {
                self.vocabulary
                    .get(ngram)
                    .map(|col_idx| (col_idx, count.count as f64))
            })
            .collect::<Vec<_>>();
        entries.sort_unstable_by_key(|(col_idx, _)| *col_idx);
        entries.into_iter().unzip()
    }

    pub fn transform<T: AsRef<str> + Sync>(&self, texts: &[T]) -> CsMat<f64> {
        debug!(
            num_texts = texts.len(),
            "Transforming texts using CountVectorizer"
        );
        let documents = count_documents(texts, &self.params);
        self.transform_from_ngrams(&documents)
    }

    fn transform_from_ngrams(&self, documents: &[DocumentNgrams]) -> CsMat<f64> {
        let rows = documents.iter().map(|document| self.row_from_ngrams(document));
        let matrix = csr_from_rows(self.num_features(), rows);
        debug!(non_zero_entries = matrix.nnz(), "Text transformation complete");
        matrix
    }

    /// Tokenizes and counts n-grams once, then reuses the counts for both
    /// vocabulary building and transformation.
    pub fn fit_transform<T: AsRef<str> + Sync>(
        texts: &[T],
        params: VectorizerParams,
    ) -> Result<(Self, CsMat<f64>)> {
        debug!(
            num_texts = texts.len(),
            "fit_transform: tokenizing and counting n-grams once"
        );
        params.validate()?;
        let documents = count_documents(texts, &params);
        let vectorizer = Self::fit_from_ngrams(&documents, params)?;
        let counts = vectorizer.transform_from_ngrams(&documents);
        Ok((vectorizer, counts))
    }

    #[must_use]
    pub fn num_features(&self) -> usize {
        self.vocabulary.len()
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    #[must_use]
    pub fn params(&self) -> &VectorizerParams {
        &self.params
    }
}

fn count_documents<T: AsRef<str> + Sync>(
    texts: &[T],
    params: &VectorizerParams,
) -> Vec<DocumentNgrams> {
    let tokenized = tokenizer::tokenize_batch(texts, params.min_token_len());
    if should_use_parallel(texts) {
        tokenized
            .par_iter()
            .map(|tokens| ngrams::count_ngrams(tokens, params.ngram_sizes()))
            .collect()
    } else {
        tokenized
            .iter()
            .map(|tokens| ngrams::count_ngrams(tokens, params.ngram_sizes()))
            .collect()
    }
}

/// Assemble a CSR matrix with `num_cols` columns, one row per item.
pub(crate) fn csr_from_rows(
    num_cols: usize,
    rows: impl IntoIterator<Item = SparseRow>,
) -> CsMat<f64> {
    let mut indptr = vec![0];
    let mut indices = Vec::new();
    let mut data = Vec::new();
    for (row_indices, row_data) in rows {
        indices.extend(row_indices);
        data.extend(row_data);
        indptr.push(indices.len());
    }
    CsMat::new((indptr.len() - 1, num_cols), indptr, indices, data)
}
