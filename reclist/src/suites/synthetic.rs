//! Seeded synthetic sessions for demos and smoke tests.

use super::session::{SessionMetadata, SessionRecList};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

pub const CATEGORIES: [&str; 3] = ["cat", "dog", "capybara"];
pub const COUNTRIES: [&str; 3] = ["US", "CA", "FR"];

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub examples: usize,
    pub catalog_size: usize,
    pub ranking_len: usize,
    pub embedding_dim: usize,
    /// Probability that the target appears somewhere in the ranking
    pub recall: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            examples: 1000,
            catalog_size: 200,
            ranking_len: 10,
            embedding_dim: 16,
            recall: 0.4,
            seed: 42,
        }
    }
}

impl SyntheticConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_examples(mut self, examples: usize) -> Self {
        self.examples = examples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.examples == 0 {
            return Err("Number of examples must be greater than 0".to_string());
        }
        if self.catalog_size < 2 {
            return Err("Catalog needs at least two items".to_string());
        }
        if self.ranking_len == 0 || self.ranking_len > self.catalog_size {
            return Err(format!(
                "Ranking length must be between 1 and the catalog size ({})",
                self.catalog_size
            ));
        }
        if self.embedding_dim == 0 {
            return Err("Embedding dimension must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.recall) {
            return Err("Recall must be between 0.0 and 1.0".to_string());
        }
        Ok(())
    }
}

/// A generated dataset: targets, model rankings, slicing metadata and item
/// embeddings.
#[derive(Debug, Clone)]
pub struct SyntheticSessions {
    pub targets: Vec<String>,
    pub predictions: Vec<Vec<String>>,
    pub metadata: SessionMetadata,
    pub embeddings: HashMap<String, Vec<f32>>,
}

fn item_id(index: usize) -> String {
    format!("item_{}", index)
}

impl SyntheticSessions {
    pub fn generate(config: &SyntheticConfig) -> Result<Self, String> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);

        // items of a category cluster around the category's centroid
        let centroids: Vec<Vec<f32>> = CATEGORIES
            .iter()
            .map(|_| random_vector(&mut rng, config.embedding_dim))
            .collect();
        let item_category: Vec<usize> = (0..config.catalog_size)
            .map(|_| rng.gen_range(0..CATEGORIES.len()))
            .collect();
        let embeddings: HashMap<String, Vec<f32>> = item_category
            .iter()
            .enumerate()
            .map(|(item, category)| {
                let noise = random_vector(&mut rng, config.embedding_dim);
                let vector = centroids[*category]
                    .iter()
                    .zip(noise)
                    .map(|(c, n)| c + 0.3 * n)
                    .collect();
                (item_id(item), vector)
            })
            .collect();

        let catalog: Vec<usize> = (0..config.catalog_size).collect();
        let mut targets = Vec::with_capacity(config.examples);
        let mut predictions = Vec::with_capacity(config.examples);
        let mut metadata = SessionMetadata::default();

        for _ in 0..config.examples {
            let target = rng.gen_range(0..config.catalog_size);
            let mut ranking: Vec<usize> = catalog
                .choose_multiple(&mut rng, config.ranking_len + 1)
                .copied()
                .filter(|item| *item != target)
                .take(config.ranking_len)
                .collect();
            if rng.gen_bool(config.recall) {
                let position = rng.gen_range(0..ranking.len());
                ranking[position] = target;
            }

            targets.push(item_id(target));
            predictions.push(ranking.into_iter().map(item_id).collect());
            metadata
                .categories
                .push(CATEGORIES[item_category[target]].to_string());
            metadata.countries.push(
                COUNTRIES
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or(COUNTRIES[0])
                    .to_string(),
            );
        }

        Ok(Self {
            targets,
            predictions,
            metadata,
            embeddings,
        })
    }

    /// Bind the generated data to a session suite.
    pub fn into_suite(
        self,
        model_name: impl Into<String>,
    ) -> (SessionRecList, HashMap<String, Vec<f32>>) {
        let suite = SessionRecList::new(model_name, self.targets, self.predictions)
            .with_metadata(self.metadata);
        (suite, self.embeddings)
    }
}

fn random_vector(rng: &mut StdRng, dim: usize) -> Vec<f32> {
    (0..dim).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}
