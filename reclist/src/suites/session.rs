//! Behavioral tests for session-based next-item recommendation.

use crate::annotation::{RecList, TestError, TestResult};
use crate::metrics::{accuracy, accuracy_per_slice, hit_rate_at_k};
use serde_json::Value;
use similarity::SimilarityModel;
use std::collections::BTreeMap;

pub const DEFAULT_HIT_RATE_K: usize = 10;

/// Per-example slicing information, aligned with the targets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionMetadata {
    pub categories: Vec<String>,
    pub countries: Vec<String>,
}

/// A session recommender evaluated on held-out next items.
///
/// `predictions[i]` is the model's ranked list for example `i`; its first
/// entry is the top-1 prediction compared against `targets[i]`.
pub struct SessionRecList {
    model_name: String,
    targets: Vec<String>,
    predictions: Vec<Vec<String>>,
    metadata: SessionMetadata,
    similarity_model: Option<Box<dyn SimilarityModel>>,
    hit_rate_k: usize,
}

impl SessionRecList {
    pub fn new(
        model_name: impl Into<String>,
        targets: Vec<String>,
        predictions: Vec<Vec<String>>,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            targets,
            predictions,
            metadata: SessionMetadata::default(),
            similarity_model: None,
            hit_rate_k: DEFAULT_HIT_RATE_K,
        }
    }

    pub fn with_metadata(mut self, metadata: SessionMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_similarity_model(mut self, model: Box<dyn SimilarityModel>) -> Self {
        self.similarity_model = Some(model);
        self
    }

    pub fn with_hit_rate_k(mut self, k: usize) -> Self {
        self.hit_rate_k = k;
        self
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn predictions(&self) -> &[Vec<String>] {
        &self.predictions
    }

    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    /// Top-1 predictions; an empty ranking predicts nothing.
    fn top_predictions(&self) -> Vec<&str> {
        self.predictions
            .iter()
            .map(|ranking| ranking.first().map(String::as_str).unwrap_or(""))
            .collect()
    }

    fn target_refs(&self) -> Vec<&str> {
        self.targets.iter().map(String::as_str).collect()
    }

    fn sliced(&self, slices: &[String], what: &str) -> TestResult<BTreeMap<String, f64>> {
        if slices.is_empty() {
            return Err(TestError::MissingInput(format!("{} metadata", what)));
        }
        Ok(accuracy_per_slice(
            &self.target_refs(),
            &self.top_predictions(),
            slices,
        )?)
    }
}

crate::rec_tests! {
    impl SessionRecList {
        /// Similarity between target and top-1 prediction for every miss.
        ///
        /// A model that misses with a close substitute is less wrong than one
        /// that misses with an unrelated item.
        #[rec_test(test_type = "LessWrong", display = Bins)]
        pub fn less_wrong(&self) -> TestResult<Vec<f64>> {
            let model = self
                .similarity_model
                .as_ref()
                .ok_or_else(|| TestError::MissingInput("similarity model".to_string()))?;

            let mut scores = Vec::new();
            for (target, ranking) in self.targets.iter().zip(&self.predictions) {
                match ranking.first() {
                    Some(prediction) if prediction != target => {
                        scores.push(model.similarity_gradient(
                            &Value::String(target.clone()),
                            &Value::String(prediction.clone()),
                        )?);
                    }
                    _ => {}
                }
            }
            Ok(scores)
        }

        /// Compute the accuracy by slice
        #[rec_test(test_type = "SlicedAccuracy", display = Bars)]
        pub fn sliced_accuracy(&self) -> TestResult<BTreeMap<String, f64>> {
            self.sliced(&self.metadata.categories, "category")
        }

        /// Compute the accuracy
        #[rec_test(test_type = "Accuracy", display = Scalar)]
        pub fn accuracy(&self) -> TestResult<f64> {
            Ok(accuracy(&self.target_refs(), &self.top_predictions())?)
        }

        /// Compute the accuracy by country
        #[rec_test(test_type = "AccuracyByCountry", display = Bars)]
        pub fn accuracy_by_country(&self) -> TestResult<BTreeMap<String, f64>> {
            self.sliced(&self.metadata.countries, "country")
        }

        /// Fraction of targets within the top k recommendations
        #[rec_test(test_type = "HitRate", display = Scalar)]
        pub fn hit_rate(&self) -> TestResult<f64> {
            Ok(hit_rate_at_k(&self.targets, &self.predictions, self.hit_rate_k)?)
        }
    }
}

impl RecList for SessionRecList {
    fn model_name(&self) -> String {
        self.model_name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::RecTests;
    use crate::metrics::MetricError;
    use similarity::SkipGramSimilarity;
    use std::collections::HashMap;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn suite() -> SessionRecList {
        SessionRecList::new(
            "TopPopModel",
            strings(&["cap", "sock", "hat", "scarf"]),
            vec![
                strings(&["cap", "hat"]),
                strings(&["hat", "sock"]),
                strings(&["cap", "scarf"]),
                vec![],
            ],
        )
        .with_metadata(SessionMetadata {
            categories: strings(&["head", "feet", "head", "neck"]),
            countries: strings(&["US", "US", "CA", "FR"]),
        })
        .with_hit_rate_k(2)
    }

    fn embeddings() -> SkipGramSimilarity {
        let mut vectors = HashMap::new();
        vectors.insert("cap".to_string(), vec![1.0, 0.0]);
        vectors.insert("hat".to_string(), vec![1.0, 0.0]);
        vectors.insert("sock".to_string(), vec![0.0, 1.0]);
        vectors.insert("scarf".to_string(), vec![0.5, 0.5]);
        SkipGramSimilarity::new(vectors)
    }

    #[test]
    fn test_declared_tests() {
        let tests = SessionRecList::rec_tests();
        let names: Vec<&str> = tests.iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "less_wrong",
                "sliced_accuracy",
                "accuracy",
                "accuracy_by_country",
                "hit_rate"
            ]
        );
        assert_eq!(tests[2].descriptor().description, "Compute the accuracy");
    }

    #[test]
    fn test_accuracy_uses_top_prediction() {
        assert_eq!(suite().accuracy().unwrap(), 0.25);
    }

    #[test]
    fn test_sliced_accuracies() {
        let suite = suite();
        let by_category = suite.sliced_accuracy().unwrap();
        assert_eq!(by_category["head"], 0.5);
        assert_eq!(by_category["feet"], 0.0);
        assert_eq!(by_category["neck"], 0.0);

        let by_country = suite.accuracy_by_country().unwrap();
        assert_eq!(by_country["US"], 0.5);
        assert_eq!(by_country["CA"], 0.0);
    }

    #[test]
    fn test_hit_rate() {
        assert_eq!(suite().hit_rate().unwrap(), 0.5);
        assert!(matches!(
            suite().with_hit_rate_k(0).hit_rate(),
            Err(TestError::Metric(MetricError::InvalidK { k: 0 }))
        ));
    }

    #[test]
    fn test_less_wrong() {
        let suite = suite().with_similarity_model(Box::new(embeddings()));
        let scores = suite.less_wrong().unwrap();

        // misses: sock -> hat, hat -> cap; the empty ranking is skipped
        assert_eq!(scores.len(), 2);
        assert!(scores[0].abs() < 1e-9);
        assert!((scores[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_inputs() {
        assert!(matches!(
            suite().less_wrong(),
            Err(TestError::MissingInput(_))
        ));

        let bare = SessionRecList::new("M", strings(&["a"]), vec![strings(&["a"])]);
        assert!(matches!(
            bare.accuracy_by_country(),
            Err(TestError::MissingInput(_))
        ));
        assert_eq!(bare.accuracy().unwrap(), 1.0);
    }
}
