mod linear;

pub use linear::LinearClassifier;
use sprs::{CsMat, CsVecView};

use crate::{
    error::{Error, Result},
    pipeline::Label,
};

/// A pre-trained binary classifier over TF-IDF feature vectors.
///
/// Implementations are immutable after construction; every method is a pure
/// function of the model parameters and its input.
pub trait Classifier: Send + Sync {
    /// Dimensionality of the feature space the model was trained on.
    fn num_features(&self) -> usize;

    /// Label assigned to non-negative scores. Part of the trained model.
    fn positive_label(&self) -> Label;

    /// Signed distance of `features` from the decision boundary.
    fn decision_function(&self, features: CsVecView<'_, f64>) -> Result<f64>;

    /// Decision scores for every row of `features`, in row order.
    fn decision_function_batch(&self, features: &CsMat<f64>) -> Result<Vec<f64>> {
        check_dimension(self.num_features(), features.cols())?;
        features
            .outer_iterator()
            .map(|row| self.decision_function(row))
            .collect()
    }

    #[inline]
    fn label_for(&self, score: f64) -> Label {
        if score >= 0.0 {
            self.positive_label()
        } else {
            self.positive_label().opposite()
        }
    }

    fn predict(&self, features: CsVecView<'_, f64>) -> Result<Label> {
        self.decision_function(features)
            .map(|score| self.label_for(score))
    }

    fn score(&self, features: CsVecView<'_, f64>) -> Result<f64> {
        self.decision_function(features)
    }
}

pub(crate) fn check_dimension(expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::DimensionMismatch { expected, found })
    }
}
