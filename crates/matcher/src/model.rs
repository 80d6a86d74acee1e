use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single activity listing from either catalog.
///
/// Text fields are never absent: missing or malformed cells load as "".
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivityRecord {
    pub source_id: String,
    pub destination: String,
    pub activity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: String,
    pub currency: String,
    /// Original CSV cells; position i belongs to header i.
    #[serde(skip)]
    pub raw_fields: Vec<String>,
}

impl ActivityRecord {
    pub fn new(destination: &str, activity: &str) -> Self {
        Self {
            destination: destination.into(),
            activity: activity.into(),
            ..Self::default()
        }
    }
}

/// Pre-loaded records for both sides.
#[derive(Debug, Clone, Default)]
pub struct MatchInput {
    pub left: Vec<ActivityRecord>,
    pub right: Vec<ActivityRecord>,
    /// Original CSV headers per side, used for output columns.
    pub left_headers: Vec<String>,
    pub right_headers: Vec<String>,
    /// Rows removed by deduplication before matching.
    pub left_duplicates: usize,
    pub right_duplicates: usize,
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// One accepted (A-index, B-index, score) triple from the solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assignment {
    pub left: usize,
    pub right: usize,
    pub score: f64,
}

/// Solver output before records are attached.
#[derive(Debug, Clone, Default)]
pub struct AssignmentOutput {
    /// Accepted pairs, sorted by descending score.
    pub pairs: Vec<Assignment>,
    /// Solver pairs discarded because their score was below the threshold.
    pub below_threshold: usize,
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MatchedPair {
    pub left_index: usize,
    pub right_index: usize,
    pub score: f64,
    pub left: ActivityRecord,
    pub right: ActivityRecord,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchSummary {
    pub left_records: usize,
    pub right_records: usize,
    pub left_duplicates: usize,
    pub right_duplicates: usize,
    /// min(n, m): the number of pairs the solver produces before thresholding.
    pub candidate_pairs: usize,
    pub matched: usize,
    pub below_threshold: usize,
    pub left_unmatched: usize,
    pub right_unmatched: usize,
    /// Matrix cells whose scoring failed and hold the sentinel.
    pub failed_cells: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchMeta {
    pub config_name: String,
    pub scorer: String,
    pub threshold: f64,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub meta: MatchMeta,
    pub summary: MatchSummary,
    pub pairs: Vec<MatchedPair>,
    #[serde(skip)]
    pub left_label: String,
    #[serde(skip)]
    pub right_label: String,
    #[serde(skip)]
    pub left_headers: Vec<String>,
    #[serde(skip)]
    pub right_headers: Vec<String>,
}

impl MatchMeta {
    pub fn new(config_name: &str, scorer: &str, threshold: f64) -> Self {
        Self {
            config_name: config_name.to_string(),
            scorer: scorer.to_string(),
            threshold,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
