//! Dense-embedding scorer.
//!
//! Models plug in through [`Embedder`]. The built-in [`HashingEmbedder`]
//! needs no model file: it hashes lowercased words and word-bounded
//! character trigrams into a fixed number of buckets, which is enough to
//! tolerate reordering and small spelling differences.

use rayon::prelude::*;

use crate::error::MatchError;
use crate::matrix::{cosine, SimilarityMatrix, SimilarityScorer};
use crate::tfidf::char_wb_ngrams;

/// Maps texts to fixed-length dense vectors.
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// One vector per input text, all of the same length.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MatchError>;
}

// ---------------------------------------------------------------------------
// Built-in feature-hashing embedder
// ---------------------------------------------------------------------------

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }

    fn bucket(&self, feature: &str) -> usize {
        let hash = blake3::hash(feature.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&hash.as_bytes()[..8]);
        (u64::from_le_bytes(head) % self.dimensions as u64) as usize
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];
        for word in text.to_lowercase().split_whitespace() {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric());
            if !word.is_empty() {
                v[self.bucket(&format!("w:{word}"))] += WORD_WEIGHT;
            }
        }
        for gram in char_wb_ngrams(text, 3, 3) {
            v[self.bucket(&format!("c:{gram}"))] += TRIGRAM_WEIGHT;
        }
        v
    }
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MatchError> {
        Ok(texts.par_iter().map(|t| self.embed_one(t)).collect())
    }
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

pub struct EmbeddingScorer<E: Embedder> {
    embedder: E,
    sentinel: f64,
}

impl<E: Embedder> EmbeddingScorer<E> {
    pub fn new(embedder: E, sentinel: f64) -> Self {
        Self { embedder, sentinel }
    }
}

impl<E: Embedder> SimilarityScorer for EmbeddingScorer<E> {
    fn name(&self) -> &str {
        "embedding"
    }

    fn score_matrix(&self, left: &[String], right: &[String]) -> Result<SimilarityMatrix, MatchError> {
        let left_emb = self.embedder.embed(left)?;
        let right_emb = self.embedder.embed(right)?;
        check_embeddings(self.embedder.name(), &left_emb, left.len(), &right_emb, right.len())?;

        let rows: Vec<Vec<f64>> = left_emb
            .par_iter()
            .map(|a| right_emb.iter().map(|b| cosine(a, b)).collect())
            .collect();
        SimilarityMatrix::from_rows(rows, right.len(), self.sentinel)
    }
}

/// Embedders are external code; verify counts and dimensions agree.
pub(crate) fn check_embeddings(
    name: &str,
    left: &[Vec<f32>],
    n: usize,
    right: &[Vec<f32>],
    m: usize,
) -> Result<(), MatchError> {
    if left.len() != n || right.len() != m {
        return Err(MatchError::Scorer(format!(
            "embedder '{name}' returned {}+{} vectors for {n}+{m} texts",
            left.len(),
            right.len()
        )));
    }
    let dim = left.first().or(right.first()).map(Vec::len);
    if let Some(dim) = dim {
        if left.iter().chain(right).any(|v| v.len() != dim) {
            return Err(MatchError::Scorer(format!("embedder '{name}' returned mixed dimensions")));
        }
    }
    Ok(())
}
