//! Deterministic, offline embedder.
//!
//! Words (minus stop words) are hashed into buckets together with their
//! character trigrams and the vector is L2-normalised. Texts sharing
//! vocabulary land close together, which is enough for local development and
//! tests without a model endpoint.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;

use super::Embedder;
use crate::errors::AppError;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to",
        "of", "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have",
        "has", "had", "it", "its", "their", "they", "them", "what", "how", "why",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, token: &str, seed: u64) -> usize {
        let h = token
            .bytes()
            .fold(seed, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        (h % self.dimensions as u64) as usize
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        let mut freq: BTreeMap<&str, u32> = BTreeMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2 && !STOP_WORDS.contains(*w))
        {
            *freq.entry(word).or_insert(0) += 1;
        }

        for (word, count) in &freq {
            let weight = *count as f32;
            embedding[self.bucket(word, 7)] += weight;

            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(&trigram, 37)] += weight.sqrt() * 0.5;
            }
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in embedding.iter_mut() {
                *x /= norm;
            }
        }
        embedding
    }
}

#[async_trait::async_trait]
impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        "hashing-trigram-v1"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        Ok(self.embed_text(text))
    }
}
