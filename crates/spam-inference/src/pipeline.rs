use core::fmt;

use spam_pre_processing::{Normalizer, TfidfVectorizer};
use tracing::debug;

use crate::{
    error::{Error, Result},
    model::Classifier,
};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Ham,
    Spam,
}

impl Label {
    #[must_use]
    pub fn is_spam(&self) -> bool {
        matches!(self, Self::Spam)
    }

    /// The other class of the binary problem.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Ham => Self::Spam,
            Self::Spam => Self::Ham,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ham => "ham",
            Self::Spam => "spam",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for one message: the predicted label and the raw decision score.
///
/// The score is a signed distance to the decision boundary, not a probability.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Classification {
    label: Label,
    score: f64,
}

impl Classification {
    #[must_use]
    pub fn label(&self) -> Label {
        self.label
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn is_spam(&self) -> bool {
        self.label.is_spam()
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (score {:.2})", self.label, self.score)
    }
}

pub(crate) fn ensure_not_empty(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(())
}

pub(crate) fn classify<C: Classifier>(
    normalizer: &Normalizer,
    vectorizer: &TfidfVectorizer,
    classifier: &C,
    text: &str,
) -> Result<Classification> {
    ensure_not_empty(text)?;
    let normalized = normalizer.normalize(text);
    let features = vectorizer.transform(&normalized)?;
    let score = classifier.decision_function(features.view())?;
    let label = classifier.label_for(score);
    debug!(
        num_tokens = normalized.split_whitespace().count(),
        nnz = features.nnz(),
        score,
        %label,
        "Classified message"
    );
    Ok(Classification { label, score })
}

pub(crate) fn classify_batch<C: Classifier, T: AsRef<str> + Sync>(
    normalizer: &Normalizer,
    vectorizer: &TfidfVectorizer,
    classifier: &C,
    texts: &[T],
) -> Result<Vec<Classification>> {
    texts
        .iter()
        .try_for_each(|text| ensure_not_empty(text.as_ref()))?;
    let normalized = normalizer.normalize_batch(texts);
    let features = vectorizer.transform_batch(&normalized)?;
    let scores = classifier.decision_function_batch(&features)?;
    debug!(num_texts = texts.len(), "Classified batch");
    Ok(scores
        .into_iter()
        .map(|score| Classification {
            label: classifier.label_for(score),
            score,
        })
        .collect())
}
