use std::path::PathBuf;

use tourmatch_matcher::config::{ScorerKind, LEFT, RIGHT};
use tourmatch_matcher::engine::{build_input, run};
use tourmatch_matcher::export::to_csv;
use tourmatch_matcher::{MatchConfig, MatchResult};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_config() -> MatchConfig {
    let toml = std::fs::read_to_string(fixtures_dir().join("colombia.match.toml")).unwrap();
    MatchConfig::from_toml(&toml).unwrap()
}

fn load_and_run(config: &MatchConfig) -> MatchResult {
    let dir = fixtures_dir();
    let read = |key: &str| {
        let path = dir.join(&config.source(key).unwrap().file);
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
    };
    let input = build_input(config, &read(LEFT), &read(RIGHT)).unwrap();
    run(config, &input).unwrap()
}

/// (left source_id, right url) for every accepted pair.
fn matched_ids(result: &MatchResult) -> Vec<(String, String)> {
    let url_col = result.right_headers.iter().position(|h| h == "url").unwrap();
    result
        .pairs
        .iter()
        .map(|p| (p.left.source_id.clone(), p.right.raw_fields[url_col].clone()))
        .collect()
}

fn has_pair(result: &MatchResult, left_id: &str, right_url: &str) -> bool {
    matched_ids(result).iter().any(|(l, r)| l == left_id && r == right_url)
}

// -------------------------------------------------------------------------
// TF-IDF
// -------------------------------------------------------------------------

#[test]
fn tfidf_matches_same_activity_across_catalogs() {
    let result = load_and_run(&load_config());

    assert_eq!(result.meta.config_name, "Triviantes vs Civitatis");
    assert_eq!(result.meta.scorer, "tfidf");
    assert_eq!(result.summary.left_records, 5);
    assert_eq!(result.summary.left_duplicates, 1);
    assert_eq!(result.summary.right_records, 5);
    assert_eq!(result.summary.candidate_pairs, 5);
    assert_eq!(result.summary.failed_cells, 0);

    assert!(has_pair(&result, "t1", "https://civitatis.example/c2"), "{:?}", matched_ids(&result));
    assert!(has_pair(&result, "t2", "https://civitatis.example/c4"), "{:?}", matched_ids(&result));
    assert!(has_pair(&result, "t3", "https://civitatis.example/c1"), "{:?}", matched_ids(&result));
    assert!(has_pair(&result, "t4", "https://civitatis.example/c3"), "{:?}", matched_ids(&result));

    assert_eq!(
        result.summary.matched + result.summary.below_threshold,
        result.summary.candidate_pairs
    );
    for p in &result.pairs {
        assert!(p.score >= 0.3);
    }
}

#[test]
fn duplicate_listing_is_dropped_before_matching() {
    let result = load_and_run(&load_config());
    assert!(result.pairs.iter().all(|p| p.left.source_id != "t5"));
}

#[test]
fn raised_threshold_only_removes_pairs() {
    let base = load_and_run(&load_config());
    let mut strict = load_config();
    strict.threshold = 0.95;
    let result = load_and_run(&strict);

    assert!(result.pairs.len() <= base.pairs.len());
    assert!(result.pairs.iter().all(|p| p.score >= 0.95));
    assert_eq!(result.summary.matched + result.summary.below_threshold, 5);
}

// -------------------------------------------------------------------------
// Other scorers
// -------------------------------------------------------------------------

#[test]
fn embedding_and_funnel_agree_on_clear_matches() {
    for kind in [ScorerKind::Embedding, ScorerKind::Funnel] {
        let mut config = load_config();
        config.scorer.kind = kind;
        config.threshold = 0.0;
        let result = load_and_run(&config);

        assert_eq!(result.meta.scorer, kind.to_string());
        assert!(has_pair(&result, "t1", "https://civitatis.example/c2"), "{kind}: {:?}", matched_ids(&result));
        assert!(has_pair(&result, "t3", "https://civitatis.example/c1"), "{kind}: {:?}", matched_ids(&result));
    }
}

#[test]
fn funnel_with_top_one_keeps_other_cells_unscored() {
    let mut config = load_config();
    config.scorer.kind = ScorerKind::Funnel;
    config.scorer.funnel.top_k = 1;
    let result = load_and_run(&config);

    // Every accepted pair came through stage 1, so no score is the sentinel.
    assert!(result.pairs.iter().all(|p| p.score > config.scorer.sentinel));
    assert!(result.pairs.len() <= 5);
}

// -------------------------------------------------------------------------
// Export
// -------------------------------------------------------------------------

#[test]
fn export_carries_both_sides_original_columns() {
    let result = load_and_run(&load_config());
    let csv = to_csv(&result).unwrap();
    let mut lines = csv.lines();

    let header = lines.next().unwrap();
    assert_eq!(
        header,
        "rank,score,triviantes_index,triviantes_id,triviantes_destino,triviantes_actividad,\
         triviantes_descripcion,triviantes_precio_real,triviantes_moneda,triviantes_url,\
         civitatis_index,civitatis_destino,civitatis_actividad,civitatis_precio,\
         civitatis_viajeros,civitatis_url"
    );

    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), result.pairs.len());
    assert!(rows[0].starts_with("1,"));

    // Scores have 4 decimals and descend.
    let scores: Vec<f64> = rows
        .iter()
        .map(|r| {
            let s = r.split(',').nth(1).unwrap();
            assert_eq!(s.split('.').nth(1).unwrap().len(), 4, "{s}");
            s.parse().unwrap()
        })
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn json_result_shape() {
    let result = load_and_run(&load_config());
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["meta"]["scorer"], "tfidf");
    assert_eq!(json["summary"]["left_duplicates"], 1);
    assert!(json["pairs"].as_array().unwrap().len() >= 4);
    assert!(json["pairs"][0]["left"]["destination"].is_string());
    assert!(json.get("left_label").is_none());
}
