use crate::oracle::{SimilarityError, SimilarityModel, SimilarityResult};
use crate::record::record_key;
use serde_json::Value;
use std::collections::HashMap;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.5;

/// Similarity in a learned item-embedding space.
///
/// Scores are the cosine similarity between the two items' vectors; the
/// binary judgement thresholds that score.
pub struct SkipGramSimilarity {
    embeddings: HashMap<String, Vec<f32>>,
    similarity_threshold: f64,
}

impl SkipGramSimilarity {
    pub fn new(embeddings: HashMap<String, Vec<f32>>) -> Self {
        Self {
            embeddings,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, similarity_threshold: f64) -> Self {
        self.similarity_threshold = similarity_threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.similarity_threshold
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    fn lookup(&self, record: &Value) -> SimilarityResult<&[f32]> {
        let key = record_key(record).ok_or_else(|| SimilarityError::UnknownItem {
            key: record.to_string(),
        })?;

        self.embeddings
            .get(&key)
            .map(|v| v.as_slice())
            .ok_or(SimilarityError::UnknownItem { key })
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

impl SimilarityModel for SkipGramSimilarity {
    fn similarity_binary(&self, query: &Value, target: &Value) -> SimilarityResult<bool> {
        let score = self.similarity_gradient(query, target)?;
        Ok(score > self.similarity_threshold)
    }

    fn similarity_gradient(&self, query: &Value, target: &Value) -> SimilarityResult<f64> {
        let query_vec = self.lookup(query)?;
        let target_vec = self.lookup(target)?;

        if query_vec.len() != target_vec.len() {
            return Err(SimilarityError::InvalidConfig {
                message: format!(
                    "embedding dimensions differ: {} vs {}",
                    query_vec.len(),
                    target_vec.len()
                ),
            });
        }

        Ok(cosine(query_vec, target_vec))
    }

    fn model_name(&self) -> &'static str {
        "skipgram"
    }
}
