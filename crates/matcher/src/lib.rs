//! `tourmatch-matcher`: optimal one-to-one fuzzy matcher for activity catalogs.
//!
//! Pure engine crate: receives CSV text and config, returns scored pairs.
//! No CLI or file IO dependencies.

pub mod assignment;
pub mod config;
pub mod dedupe;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod export;
pub mod funnel;
pub mod matrix;
pub mod model;
pub mod summary;
pub mod text;
pub mod tfidf;

pub use config::MatchConfig;
pub use engine::{run, run_with_scorer};
pub use error::MatchError;
pub use matrix::{SimilarityMatrix, SimilarityScorer};
pub use model::{ActivityRecord, MatchInput, MatchResult, MatchedPair};
