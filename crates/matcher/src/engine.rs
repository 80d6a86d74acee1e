use std::collections::HashSet;

use crate::assignment;
use crate::config::{MatchConfig, ScorerConfig, ScorerKind, SourceConfig, LEFT, RIGHT};
use crate::dedupe::dedupe_records;
use crate::embedding::{EmbeddingScorer, HashingEmbedder};
use crate::error::MatchError;
use crate::funnel::{EmbeddingCandidates, FunnelScorer, LexicalReranker};
use crate::matrix::{SimilarityMatrix, SimilarityScorer};
use crate::model::{ActivityRecord, MatchInput, MatchMeta, MatchResult, MatchedPair};
use crate::summary::compute_summary;
use crate::text::{record_texts, Side};
use crate::tfidf::TfidfScorer;

/// Run matching per config with the configured built-in scorer.
pub fn run(config: &MatchConfig, input: &MatchInput) -> Result<MatchResult, MatchError> {
    let scorer = build_scorer(&config.scorer);
    run_with_scorer(config, input, scorer.as_ref())
}

/// Run matching with a caller-supplied scorer (e.g. a model-backed one).
pub fn run_with_scorer(
    config: &MatchConfig,
    input: &MatchInput,
    scorer: &dyn SimilarityScorer,
) -> Result<MatchResult, MatchError> {
    let (n, m) = (input.left.len(), input.right.len());
    log::info!("matching {n} x {m} records with scorer '{}'", scorer.name());

    let matrix = if n == 0 || m == 0 {
        SimilarityMatrix::from_rows(vec![Vec::new(); n], 0, config.scorer.sentinel)?
    } else {
        let left_texts = record_texts(&input.left, &config.text, Side::Query);
        let right_texts = record_texts(&input.right, &config.text, Side::Passage);
        let matrix = scorer.score_matrix(&left_texts, &right_texts)?;
        if matrix.rows() != n || matrix.cols() != m {
            return Err(MatchError::Scorer(format!(
                "scorer '{}' returned a {}x{} matrix for {n}x{m} records",
                scorer.name(),
                matrix.rows(),
                matrix.cols()
            )));
        }
        matrix
    };

    let output = assignment::solve(&matrix, config.threshold);
    let summary = compute_summary(
        n,
        m,
        (input.left_duplicates, input.right_duplicates),
        &output,
        matrix.failed_cells(),
    );
    log::info!(
        "{} matched, {} below threshold {}",
        summary.matched,
        summary.below_threshold,
        config.threshold
    );

    let pairs = output
        .pairs
        .iter()
        .map(|a| MatchedPair {
            left_index: a.left,
            right_index: a.right,
            score: a.score,
            left: input.left[a.left].clone(),
            right: input.right[a.right].clone(),
        })
        .collect();

    Ok(MatchResult {
        meta: MatchMeta::new(&config.name, scorer.name(), config.threshold),
        summary,
        pairs,
        left_label: config.label(LEFT),
        right_label: config.label(RIGHT),
        left_headers: input.left_headers.clone(),
        right_headers: input.right_headers.clone(),
    })
}

/// The built-in scorer selected by `kind`.
pub fn build_scorer(sc: &ScorerConfig) -> Box<dyn SimilarityScorer> {
    match sc.kind {
        ScorerKind::Tfidf => Box::new(TfidfScorer::new(&sc.tfidf, sc.sentinel)),
        ScorerKind::Embedding => Box::new(EmbeddingScorer::new(
            HashingEmbedder::new(sc.embedding.dimensions),
            sc.sentinel,
        )),
        ScorerKind::Funnel => Box::new(FunnelScorer::new(
            EmbeddingCandidates::new(HashingEmbedder::new(sc.embedding.dimensions)),
            LexicalReranker,
            sc.funnel.top_k,
            sc.funnel.activation,
            sc.sentinel,
        )),
    }
}

/// Load both sides from CSV text and apply per-source deduplication.
pub fn build_input(config: &MatchConfig, left_csv: &str, right_csv: &str) -> Result<MatchInput, MatchError> {
    let (left, left_headers, left_duplicates) = load_side(config, LEFT, left_csv)?;
    let (right, right_headers, right_duplicates) = load_side(config, RIGHT, right_csv)?;
    Ok(MatchInput { left, right, left_headers, right_headers, left_duplicates, right_duplicates })
}

fn load_side(
    config: &MatchConfig,
    key: &str,
    csv_data: &str,
) -> Result<(Vec<ActivityRecord>, Vec<String>, usize), MatchError> {
    let source = config.source(key)?;
    let (records, headers) = load_csv_records(key, csv_data, source)?;
    if !source.dedupe {
        return Ok((records, headers, 0));
    }

    let before = records.len();
    let (records, _) = dedupe_records(records, HashSet::new());
    let dropped = before - records.len();
    if dropped > 0 {
        log::info!("source '{key}': dropped {dropped} duplicate record(s)");
    }
    Ok((records, headers, dropped))
}

/// Load CSV rows into ActivityRecords, applying the column mapping.
///
/// Returns the records and the CSV header. Short rows and empty cells load as
/// empty strings; `source_id` falls back to the 0-based row index.
pub fn load_csv_records(
    source_name: &str,
    csv_data: &str,
    source_config: &SourceConfig,
) -> Result<(Vec<ActivityRecord>, Vec<String>), MatchError> {
    let csv_err = |e: csv::Error| MatchError::Csv { source: source_name.into(), message: e.to_string() };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let col = &source_config.columns;

    let idx = |name: &str| -> Result<usize, MatchError> {
        headers.iter().position(|h| h == name).ok_or_else(|| MatchError::MissingColumn {
            source: source_name.into(),
            column: name.into(),
        })
    };
    let opt_idx = |name: &Option<String>| -> Result<Option<usize>, MatchError> {
        name.as_deref().map(&idx).transpose()
    };

    let destination_idx = idx(&col.destination)?;
    let activity_idx = idx(&col.activity)?;
    let description_idx = opt_idx(&col.description)?;
    let price_idx = opt_idx(&col.price)?;
    let currency_idx = opt_idx(&col.currency)?;
    let source_id_idx = opt_idx(&col.source_id)?;

    let mut records = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let field = |i: usize| record.get(i).unwrap_or("").to_string();
        let opt_field = |i: Option<usize>| i.map(field).unwrap_or_default();

        let raw_fields = (0..headers.len()).map(field).collect();

        records.push(ActivityRecord {
            source_id: source_id_idx.map(field).unwrap_or_else(|| row.to_string()),
            destination: field(destination_idx),
            activity: field(activity_idx),
            description: description_idx.map(field),
            price: opt_field(price_idx),
            currency: opt_field(currency_idx),
            raw_fields,
        });
    }

    log::debug!("source '{source_name}': loaded {} record(s)", records.len());
    Ok((records, headers))
}
