use std::{fs, path::Path};

use tracing::info;

use super::{
    count_vectorizer::CountVectorizer, params::VectorizerParams, tfidf_vectorizer::TfidfVectorizer,
    vocabulary::Vocabulary,
};
use crate::{
    artifact::{self, ArtifactError, ArtifactKind},
    error::{Error, Result},
};

/// Everything that crosses the training/serving boundary. Terms are stored in index order.
#[derive(Debug, bincode::Encode, bincode::Decode)]
struct VectorizerState {
    params: VectorizerParams,
    terms: Vec<String>,
    idf: Vec<f64>,
}

impl VectorizerState {
    fn into_vectorizer(self) -> Result<TfidfVectorizer, ArtifactError> {
        let invalid = |reason: String| ArtifactError::invalid(ArtifactKind::Vectorizer, reason);

        self.params
            .validate()
            .map_err(|err| invalid(err.to_string()))?;
        if self.terms.is_empty() {
            return Err(invalid("vocabulary is empty".to_string()));
        }
        if self.terms.len() != self.idf.len() {
            return Err(invalid(format!(
                "{} vocabulary terms but {} idf weights",
                self.terms.len(),
                self.idf.len()
            )));
        }
        if let Some(pos) = self.idf.iter().position(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(invalid(format!(
                "idf weight {pos} is not a positive finite number: {}",
                self.idf[pos]
            )));
        }
        let vocabulary = Vocabulary::from_sorted_terms(self.terms).map_err(invalid)?;
        let count_vectorizer = CountVectorizer::from_parts(self.params, vocabulary);
        Ok(TfidfVectorizer::from_parts(count_vectorizer, self.idf))
    }
}

impl TfidfVectorizer {
    /// Serialize the fitted state into a versioned artifact.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let (count_vectorizer, idf) = self.fitted()?;
        let state = VectorizerState {
            params: count_vectorizer.params().clone(),
            terms: count_vectorizer.vocabulary().terms().to_vec(),
            idf: idf.to_vec(),
        };
        Ok(artifact::encode(ArtifactKind::Vectorizer, &state)?)
    }

    /// Rebuild a fitted vectorizer from [`Self::to_bytes`] output, rejecting
    /// corrupt or incompatible artifacts.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let state: VectorizerState = artifact::decode(ArtifactKind::Vectorizer, bytes)?;
        Ok(state.into_vectorizer()?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        fs::write(path, &bytes).map_err(|err| Error::io(path, err))?;
        info!(
            path = %path.display(),
            num_features = self.num_features(),
            num_bytes = bytes.len(),
            "Saved vectorizer"
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|err| Error::io(path, err))?;
        let vectorizer = Self::from_bytes(&bytes)?;
        info!(
            path = %path.display(),
            num_features = vectorizer.num_features(),
            "Loaded vectorizer"
        );
        Ok(vectorizer)
    }
}
