//! Two-stage candidate funnel.
//!
//! Stage 1 ([`CandidateGenerator`]) narrows each query to a bounded list of
//! corpus indices. Stage 2 ([`PairScorer`]) scores only those pairs. Every
//! other cell of the matrix holds the sentinel, as does any cell whose stage-2
//! call failed. Stage-2 calls are O(n·K) instead of O(n·m).

use rayon::prelude::*;

use crate::config::Activation;
use crate::embedding::{check_embeddings, Embedder};
use crate::error::MatchError;
use crate::matrix::{cosine, SimilarityMatrix, SimilarityScorer};
use crate::text::words;

// ---------------------------------------------------------------------------
// Stage seams
// ---------------------------------------------------------------------------

pub trait CandidateGenerator: Send + Sync {
    /// For each query, up to `top_k` corpus indices, best first.
    fn candidates(
        &self,
        queries: &[String],
        corpus: &[String],
        top_k: usize,
    ) -> Result<Vec<Vec<usize>>, MatchError>;
}

pub trait PairScorer: Send + Sync {
    fn name(&self) -> &str;

    fn score(&self, query: &str, candidate: &str) -> Result<f64, MatchError>;

    /// Score one query against several candidates. Results line up with
    /// `candidates`; a failed entry does not affect its neighbours.
    fn score_batch(&self, query: &str, candidates: &[&str]) -> Vec<Result<f64, MatchError>> {
        candidates.iter().map(|c| self.score(query, c)).collect()
    }
}

// ---------------------------------------------------------------------------
// Stage 1: embedding top-K
// ---------------------------------------------------------------------------

pub struct EmbeddingCandidates<E: Embedder> {
    embedder: E,
}

impl<E: Embedder> EmbeddingCandidates<E> {
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }
}

impl<E: Embedder> CandidateGenerator for EmbeddingCandidates<E> {
    fn candidates(
        &self,
        queries: &[String],
        corpus: &[String],
        top_k: usize,
    ) -> Result<Vec<Vec<usize>>, MatchError> {
        let q = self.embedder.embed(queries)?;
        let c = self.embedder.embed(corpus)?;
        check_embeddings(self.embedder.name(), &q, queries.len(), &c, corpus.len())?;

        Ok(q.par_iter()
            .map(|qv| {
                let scores: Vec<f64> = c.iter().map(|cv| cosine(qv, cv)).collect();
                top_k_indices(&scores, top_k)
            })
            .collect())
    }
}

/// Indices of the `k` highest scores; ties keep input order.
pub fn top_k_indices(scores: &[f64], k: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..scores.len()).collect();
    idx.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
    idx.truncate(k);
    idx
}

// ---------------------------------------------------------------------------
// Stage 2: lexical re-ranker
// ---------------------------------------------------------------------------

/// Blend of Jaro-Winkler and normalized Levenshtein over token-sorted text,
/// in [0, 1]. Word order does not matter; an empty side scores 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalReranker;

impl LexicalReranker {
    fn token_sort(text: &str) -> String {
        let mut tokens = words(text);
        tokens.sort();
        tokens.join(" ")
    }
}

impl PairScorer for LexicalReranker {
    fn name(&self) -> &str {
        "lexical"
    }

    fn score(&self, query: &str, candidate: &str) -> Result<f64, MatchError> {
        let a = Self::token_sort(query);
        let b = Self::token_sort(candidate);
        if a.is_empty() || b.is_empty() {
            return Ok(0.0);
        }
        Ok(0.5 * strsim::jaro_winkler(&a, &b) + 0.5 * strsim::normalized_levenshtein(&a, &b))
    }
}

// ---------------------------------------------------------------------------
// Funnel scorer
// ---------------------------------------------------------------------------

pub struct FunnelScorer<G: CandidateGenerator, P: PairScorer> {
    generator: G,
    reranker: P,
    top_k: usize,
    activation: Activation,
    sentinel: f64,
}

impl<G: CandidateGenerator, P: PairScorer> FunnelScorer<G, P> {
    pub fn new(generator: G, reranker: P, top_k: usize, activation: Activation, sentinel: f64) -> Self {
        Self { generator, reranker, top_k, activation, sentinel }
    }
}

impl<G: CandidateGenerator, P: PairScorer> SimilarityScorer for FunnelScorer<G, P> {
    fn name(&self) -> &str {
        "funnel"
    }

    fn score_matrix(&self, left: &[String], right: &[String]) -> Result<SimilarityMatrix, MatchError> {
        let m = right.len();
        if left.is_empty() || m == 0 {
            return SimilarityMatrix::from_rows(vec![Vec::new(); left.len()], m, self.sentinel);
        }

        let hits = self.generator.candidates(left, right, self.top_k)?;
        if hits.len() != left.len() {
            return Err(MatchError::Scorer(format!(
                "candidate generator returned {} lists for {} queries",
                hits.len(),
                left.len()
            )));
        }

        let scored: Vec<(Vec<f64>, usize)> = hits
            .par_iter()
            .enumerate()
            .map(|(i, cands)| self.score_row(i, &left[i], cands, right))
            .collect();

        let failed: usize = scored.iter().map(|(_, f)| f).sum();
        let rows = scored.into_iter().map(|(row, _)| row).collect();
        if failed > 0 {
            log::warn!("funnel: {failed} pair(s) failed to score and hold the sentinel");
        }
        Ok(SimilarityMatrix::from_rows(rows, m, self.sentinel)?.with_failed_cells(failed))
    }
}

impl<G: CandidateGenerator, P: PairScorer> FunnelScorer<G, P> {
    /// One matrix row: sentinel everywhere except scored candidates.
    fn score_row(&self, row: usize, query: &str, cands: &[usize], right: &[String]) -> (Vec<f64>, usize) {
        let mut out = vec![self.sentinel; right.len()];
        let valid: Vec<usize> = cands
            .iter()
            .copied()
            .filter(|&j| {
                let ok = j < right.len();
                if !ok {
                    log::warn!("funnel: row {row}: candidate index {j} out of range, skipped");
                }
                ok
            })
            .take(self.top_k)
            .collect();

        let texts: Vec<&str> = valid.iter().map(|&j| right[j].as_str()).collect();
        let results = self.reranker.score_batch(query, &texts);

        let mut failed = valid.len().saturating_sub(results.len());
        for (&j, result) in valid.iter().zip(results) {
            match result {
                Ok(raw) if raw.is_finite() => out[j] = self.activation.apply(raw),
                Ok(raw) => {
                    log::warn!("funnel: row {row}, col {j}: {} returned {raw}", self.reranker.name());
                    failed += 1;
                }
                Err(e) => {
                    log::warn!("funnel: row {row}, col {j}: {e}");
                    failed += 1;
                }
            }
        }
        (out, failed)
    }
}
