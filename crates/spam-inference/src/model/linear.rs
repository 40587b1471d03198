use std::{fs, path::Path};

use spam_pre_processing::{
    artifact::{self, ArtifactKind},
    ArtifactError,
};
use sprs::CsVecView;
use tracing::info;

use super::{check_dimension, Classifier};
use crate::{
    error::{Error, Result},
    pipeline::Label,
};

/// `score = bias + Σ wᵢ·xᵢ`, with non-negative scores mapped to `positive_label`.
#[derive(Clone, Debug, PartialEq, bincode::Encode, bincode::Decode)]
pub struct LinearClassifier {
    weights: Vec<f64>,
    bias: f64,
    positive_label: Label,
}

impl LinearClassifier {
    pub fn new(weights: Vec<f64>, bias: f64, positive_label: Label) -> Result<Self> {
        let classifier = Self {
            weights,
            bias,
            positive_label,
        };
        classifier.validate().map_err(Error::InvalidModel)?;
        Ok(classifier)
    }

    fn validate(&self) -> Result<(), String> {
        if self.weights.is_empty() {
            return Err("weight vector is empty".to_string());
        }
        if let Some(pos) = self.weights.iter().position(|w| !w.is_finite()) {
            return Err(format!("weight {pos} is not finite: {}", self.weights[pos]));
        }
        if !self.bias.is_finite() {
            return Err(format!("bias is not finite: {}", self.bias));
        }
        Ok(())
    }

    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[must_use]
    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(artifact::encode(ArtifactKind::Classifier, self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let classifier: Self = artifact::decode(ArtifactKind::Classifier, bytes)?;
        classifier
            .validate()
            .map_err(|reason| ArtifactError::invalid(ArtifactKind::Classifier, reason))?;
        Ok(classifier)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes()?).map_err(|err| Error::io(path, err))?;
        info!(path = %path.display(), num_features = self.weights.len(), "Saved classifier");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|err| Error::io(path, err))?;
        let classifier = Self::from_bytes(&bytes)?;
        info!(
            path = %path.display(),
            num_features = classifier.num_features(),
            positive_label = %classifier.positive_label,
            "Loaded classifier"
        );
        Ok(classifier)
    }
}

impl Classifier for LinearClassifier {
    fn num_features(&self) -> usize {
        self.weights.len()
    }

    fn positive_label(&self) -> Label {
        self.positive_label
    }

    fn decision_function(&self, features: CsVecView<'_, f64>) -> Result<f64> {
        check_dimension(self.weights.len(), features.dim())?;
        // indices are ascending, so the summation order is fixed
        let dot = features
            .iter()
            .fold(0.0, |acc, (idx, &x)| acc + self.weights[idx] * x);
        Ok(self.bias + dot)
    }
}
