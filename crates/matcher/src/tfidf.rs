//! Character n-gram TF-IDF with cosine similarity.
//!
//! N-grams are taken inside word boundaries: each whitespace-separated word is
//! padded with one space on both sides, so "caminata" and "caminar" share
//! " ca", "cam", "amin", ... but nothing leaks across words. The vocabulary is
//! fitted on the distinct texts of both sides together.

use std::collections::{BTreeSet, HashMap, HashSet};

use rayon::prelude::*;

use crate::config::TfidfConfig;
use crate::error::MatchError;
use crate::matrix::{SimilarityMatrix, SimilarityScorer};

pub struct TfidfScorer {
    ngram_min: usize,
    ngram_max: usize,
    sentinel: f64,
}

impl TfidfScorer {
    pub fn new(config: &TfidfConfig, sentinel: f64) -> Self {
        Self { ngram_min: config.ngram_min, ngram_max: config.ngram_max, sentinel }
    }
}

impl SimilarityScorer for TfidfScorer {
    fn name(&self) -> &str {
        "tfidf"
    }

    fn score_matrix(&self, left: &[String], right: &[String]) -> Result<SimilarityMatrix, MatchError> {
        let mut seen = HashSet::new();
        let corpus: Vec<&str> = left
            .iter()
            .chain(right)
            .map(String::as_str)
            .filter(|t| seen.insert(*t))
            .collect();

        let vectorizer = Vectorizer::fit(&corpus, self.ngram_min, self.ngram_max);
        let left_vecs: Vec<SparseVec> = left.par_iter().map(|t| vectorizer.transform(t)).collect();
        let right_vecs: Vec<SparseVec> = right.par_iter().map(|t| vectorizer.transform(t)).collect();

        let rows: Vec<Vec<f64>> = left_vecs
            .par_iter()
            .map(|lv| right_vecs.iter().map(|rv| sparse_dot(lv, rv)).collect())
            .collect();

        log::debug!(
            "tfidf: vocabulary {} n-grams over {} distinct texts",
            vectorizer.vocab.len(),
            corpus.len()
        );
        SimilarityMatrix::from_rows(rows, right.len(), self.sentinel)
    }
}

// ---------------------------------------------------------------------------
// N-grams
// ---------------------------------------------------------------------------

/// Word-boundary character n-grams of a lowercased text, `min..=max` long.
pub fn char_wb_ngrams(text: &str, min: usize, max: usize) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut out = Vec::new();

    for word in lowered.split_whitespace() {
        let padded: Vec<char> = std::iter::once(' ').chain(word.chars()).chain(std::iter::once(' ')).collect();
        let len = padded.len();
        for n in min..=max {
            if len <= n {
                // The whole padded word is the only gram; larger n repeat it.
                out.push(padded.iter().collect());
                break;
            }
            for start in 0..=(len - n) {
                out.push(padded[start..start + n].iter().collect());
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Vectorizer
// ---------------------------------------------------------------------------

/// Sparse vector as (term index, weight), sorted by index.
type SparseVec = Vec<(usize, f64)>;

struct Vectorizer {
    vocab: HashMap<String, usize>,
    idf: Vec<f64>,
    min: usize,
    max: usize,
}

impl Vectorizer {
    /// Smoothed IDF: ln((1 + N) / (1 + df)) + 1.
    fn fit(corpus: &[&str], min: usize, max: usize) -> Self {
        let mut vocab: HashMap<String, usize> = HashMap::new();
        let mut df: Vec<usize> = Vec::new();

        for doc in corpus {
            let unique: BTreeSet<String> = char_wb_ngrams(doc, min, max).into_iter().collect();
            for gram in unique {
                let next = vocab.len();
                let idx = *vocab.entry(gram).or_insert(next);
                if idx == df.len() {
                    df.push(0);
                }
                df[idx] += 1;
            }
        }

        let n = corpus.len() as f64;
        let idf = df.iter().map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0).collect();
        Self { vocab, idf, min, max }
    }

    /// Raw counts × IDF, L2-normalized. Unknown n-grams are ignored.
    fn transform(&self, text: &str) -> SparseVec {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for gram in char_wb_ngrams(text, self.min, self.max) {
            if let Some(&idx) = self.vocab.get(&gram) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut vec: SparseVec = counts.into_iter().map(|(i, c)| (i, c * self.idf[i])).collect();
        vec.sort_unstable_by_key(|&(i, _)| i);

        let norm = vec.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in vec.iter_mut() {
                *w /= norm;
            }
        }
        vec
    }
}

fn sparse_dot(a: &SparseVec, b: &SparseVec) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}
