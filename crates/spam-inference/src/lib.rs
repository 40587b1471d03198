//! # spam-inference
//!
//! Classifies SMS and email messages as spam or ham.
//!
//! A [`SpamDetector`] composes the text [`Normalizer`], a fitted
//! [`TfidfVectorizer`] and a pre-trained [`Classifier`] into one call:
//!
//! ```no_run
//! use spam_inference::SpamDetector;
//!
//! let detector = SpamDetector::from_files("tfidf_vectorizer.bin", "classifier.bin")?;
//! let verdict = detector.classify("Congratulations! You won a free ticket.")?;
//! println!("{} {:.2}", verdict.label(), verdict.score());
//! # Ok::<(), spam_inference::Error>(())
//! ```
//!
//! Empty or whitespace-only messages are rejected with [`Error::EmptyInput`]
//! rather than classified.

mod error;
mod model;
mod pipeline;

use std::path::Path;

pub use error::{Error, Result};
pub use model::{Classifier, LinearClassifier};
pub use pipeline::{Classification, Label};
pub use spam_pre_processing::{Normalizer, TfidfVectorizer};
use tracing::info;

/// Normalizer, vectorizer and classifier bound together.
///
/// All state is immutable once built, so a detector can be shared across
/// threads behind an `Arc` without locking.
#[derive(Debug, Clone)]
pub struct SpamDetector<C = LinearClassifier> {
    normalizer: Normalizer,
    vectorizer: TfidfVectorizer,
    classifier: C,
}

impl<C: Classifier> SpamDetector<C> {
    /// Fails with `NotFitted` for an unfitted vectorizer and with
    /// [`Error::DimensionMismatch`] when the two artifacts disagree on the feature space.
    pub fn new(normalizer: Normalizer, vectorizer: TfidfVectorizer, classifier: C) -> Result<Self> {
        if !vectorizer.is_fitted() {
            return Err(spam_pre_processing::Error::NotFitted.into());
        }
        if vectorizer.num_features() != classifier.num_features() {
            return Err(Error::DimensionMismatch {
                expected: classifier.num_features(),
                found: vectorizer.num_features(),
            });
        }
        info!(
            num_features = vectorizer.num_features(),
            positive_label = %classifier.positive_label(),
            "Spam detector ready"
        );
        Ok(Self {
            normalizer,
            vectorizer,
            classifier,
        })
    }

    /// Classify one raw message.
    pub fn classify(&self, text: impl AsRef<str>) -> Result<Classification> {
        pipeline::classify(
            &self.normalizer,
            &self.vectorizer,
            &self.classifier,
            text.as_ref(),
        )
    }

    /// Classify many raw messages. Results are in input order.
    ///
    /// The batch is all-or-nothing: a single empty message fails it with
    /// [`Error::EmptyInput`] before any message is processed.
    pub fn classify_batch<T: AsRef<str> + Sync>(&self, texts: &[T]) -> Result<Vec<Classification>> {
        pipeline::classify_batch(&self.normalizer, &self.vectorizer, &self.classifier, texts)
    }

    #[must_use]
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    #[must_use]
    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    #[must_use]
    pub fn classifier(&self) -> &C {
        &self.classifier
    }
}

impl SpamDetector<LinearClassifier> {
    /// Build from serialized artifacts with the default English normalizer.
    pub fn from_bytes(vectorizer_bytes: &[u8], classifier_bytes: &[u8]) -> Result<Self> {
        let vectorizer = TfidfVectorizer::from_bytes(vectorizer_bytes)?;
        let classifier = LinearClassifier::from_bytes(classifier_bytes)?;
        Self::new(Normalizer::english(), vectorizer, classifier)
    }

    pub fn from_files(
        vectorizer_path: impl AsRef<Path>,
        classifier_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let vectorizer = TfidfVectorizer::load(vectorizer_path)?;
        let classifier = LinearClassifier::load(classifier_path)?;
        Self::new(Normalizer::english(), vectorizer, classifier)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use spam_pre_processing::VectorizerParams;

    use super::*;

    const SPAM: &[&str] = &[
        "Congratulations! You won a free ticket. Reply with your bank details to claim.",
        "URGENT! Call now to claim your prize",
        "Win cash now!!! Free entry to our weekly competition",
    ];
    const HAM: &[&str] = &[
        "Let's meet for lunch tomorrow at noon.",
        "Are we still on for lunch later?",
        "I'll be home later, call me when you leave",
    ];
    const SPAM_WORDS: &[&str] = &["free", "win", "claim", "prize", "cash", "urgent", "ticket"];
    const HAM_WORDS: &[&str] = &["lunch", "meet", "tomorrow", "noon", "later", "home"];

    /// One unit of weight per spam keyword in a feature, minus one per ham keyword.
    fn keyword_weights(vectorizer: &TfidfVectorizer) -> Vec<f64> {
        let vocabulary = vectorizer.vocabulary().expect("vectorizer is fitted");
        vocabulary
            .terms()
            .iter()
            .map(|term| {
                term.split(' ')
                    .map(|word| {
                        if SPAM_WORDS.contains(&word) {
                            1.0
                        } else if HAM_WORDS.contains(&word) {
                            -1.0
                        } else {
                            0.0
                        }
                    })
                    .sum::<f64>()
            })
            .collect()
    }

    fn detector() -> SpamDetector {
        let normalizer = Normalizer::english();
        let corpus = normalizer.normalize_batch(&[SPAM, HAM].concat());
        let vectorizer =
            TfidfVectorizer::fit(&corpus, VectorizerParams::default()).expect("fit should succeed");
        let weights = keyword_weights(&vectorizer);
        let classifier =
            LinearClassifier::new(weights, 0.0, Label::Spam).expect("weights are valid");
        SpamDetector::new(normalizer, vectorizer, classifier).expect("artifacts are compatible")
    }

    #[test]
    fn test_classify_training_messages() {
        let detector = detector();
        for text in SPAM {
            let verdict = detector.classify(text).expect("classification should succeed");
            assert_eq!(verdict.label(), Label::Spam, "{text:?}");
            assert!(verdict.score() > 0.0);
        }
        for text in HAM {
            let verdict = detector.classify(text).expect("classification should succeed");
            assert_eq!(verdict.label(), Label::Ham, "{text:?}");
            assert!(verdict.score() < 0.0);
        }
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let detector = detector();
        for text in ["", "   ", "\t\n"] {
            assert!(matches!(detector.classify(text), Err(Error::EmptyInput)));
        }
    }

    #[test]
    fn test_out_of_vocabulary_message_scores_bias() {
        let detector = detector();
        // stopwords and symbols only: normalizes to nothing, so only the bias remains
        let verdict = detector
            .classify("and the of ?!")
            .expect("classification should succeed");
        assert_eq!(verdict.score(), 0.0);
        assert_eq!(verdict.label(), Label::Spam);
    }

    #[test]
    fn test_deterministic() {
        let detector = detector();
        let text = "Free prize waiting, call now to claim";
        let first = detector.classify(text).expect("classification should succeed");
        for _ in 0..10 {
            let again = detector.classify(text).expect("classification should succeed");
            assert_eq!(again.label(), first.label());
            assert_eq!(again.score().to_bits(), first.score().to_bits());
        }
    }

    #[test]
    fn test_batch_matches_single() {
        let detector = detector();
        let texts = [SPAM, HAM, &["nothing to see here"][..]].concat();
        let verdicts = detector
            .classify_batch(&texts)
            .expect("classification should succeed");
        assert_eq!(verdicts.len(), texts.len());
        for (text, verdict) in texts.iter().zip(&verdicts) {
            let single = detector.classify(text).expect("classification should succeed");
            assert_eq!(verdict.label(), single.label());
            assert_eq!(verdict.score().to_bits(), single.score().to_bits());
        }
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let detector = detector();
        let texts = ["free prize", "  ", "lunch tomorrow"];
        assert!(matches!(
            detector.classify_batch(&texts),
            Err(Error::EmptyInput)
        ));
        let empty: [&str; 0] = [];
        assert!(detector
            .classify_batch(&empty)
            .expect("empty batch is fine")
            .is_empty());
    }

    #[test]
    fn test_rejects_mismatched_artifacts() {
        let normalizer = Normalizer::english();
        let vectorizer =
            TfidfVectorizer::fit(&["free prize", "lunch later"], VectorizerParams::default())
                .expect("fit should succeed");
        let classifier =
            LinearClassifier::new(vec![1.0; 2], 0.0, Label::Spam).expect("weights are valid");
        assert!(matches!(
            SpamDetector::new(normalizer.clone(), vectorizer, classifier.clone()),
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 6
            })
        ));

        let unfitted = TfidfVectorizer::new(VectorizerParams::default());
        let err = SpamDetector::new(normalizer, unfitted, classifier)
            .expect_err("unfitted vectorizer must fail");
        assert!(err.is_not_fitted());
    }

    #[test]
    fn test_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SpamDetector>();

        let detector = Arc::new(detector());
        let handles = (0..4)
            .map(|_| {
                let detector = Arc::clone(&detector);
                std::thread::spawn(move || {
                    detector
                        .classify("Win cash now")
                        .expect("classification should succeed")
                })
            })
            .collect::<Vec<_>>();
        let expected = detector.classify("Win cash now").expect("classification should succeed");
        for handle in handles {
            let verdict = handle.join().expect("thread should not panic");
            assert_eq!(verdict.score().to_bits(), expected.score().to_bits());
        }
    }
}
