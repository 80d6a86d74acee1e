//! `tourmatch run|validate|score`: config-driven catalog matching.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use tourmatch_matcher::config::{ScorerConfig, ScorerKind, TextConfig, LEFT, RIGHT};
use tourmatch_matcher::engine::{build_input, build_scorer};
use tourmatch_matcher::export::{format_score, to_csv};
use tourmatch_matcher::text::{finish_text, Side};
use tourmatch_matcher::{MatchConfig, MatchError};

use crate::exit_codes::{EXIT_MATCH_INVALID_CONFIG, EXIT_MATCH_RUNTIME, EXIT_MATCH_UNMATCHED};
use crate::CliError;

#[derive(Subcommand)]
pub enum MatchCommands {
    /// Match two catalogs from a TOML config file
    #[command(after_help = "\
Examples:
  tourmatch run colombia.match.toml
  tourmatch run colombia.match.toml --output cruce.csv
  tourmatch run colombia.match.toml --json > cruce.json
  tourmatch run colombia.match.toml --scorer funnel --threshold 0.5 -v")]
    Run {
        /// Path to the .match.toml config file
        config: PathBuf,

        /// Write the matched-pairs CSV here (overrides [output].file)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Print the JSON result to stdout instead of the CSV
        #[arg(long)]
        json: bool,

        /// Write the JSON result to a file (overrides [output].json)
        #[arg(long)]
        json_output: Option<PathBuf>,

        /// Acceptance threshold (overrides the config)
        #[arg(long)]
        threshold: Option<f64>,

        /// Scorer: tfidf, embedding or funnel (overrides [scorer].kind)
        #[arg(long)]
        scorer: Option<String>,

        /// Exit with code 5 when any left record stays unmatched
        #[arg(long)]
        fail_on_unmatched: bool,
    },

    /// Validate a match config without running
    #[command(after_help = "\
Examples:
  tourmatch validate colombia.match.toml")]
    Validate {
        /// Path to the .match.toml config file
        config: PathBuf,
    },

    /// Score one pair of texts with a built-in scorer
    #[command(after_help = "\
Examples:
  tourmatch score \"Bogotá | Museo del Oro\" \"Bogotá | Museo del Oro: visita guiada\"
  tourmatch score \"City tour\" \"Walking tour of the city\" --scorer embedding
  tourmatch score \"Tour Comuna 13\" \"Graffiti tour\" --config colombia.match.toml")]
    Score {
        /// Left-side text
        left: String,

        /// Right-side text
        right: String,

        /// Scorer: tfidf, embedding or funnel
        #[arg(long)]
        scorer: Option<String>,

        /// Take scorer settings from this config
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub fn cmd_match(cmd: MatchCommands) -> Result<(), CliError> {
    match cmd {
        MatchCommands::Run { config, output, json, json_output, threshold, scorer, fail_on_unmatched } => {
            cmd_match_run(config, output, json, json_output, threshold, scorer, fail_on_unmatched)
        }
        MatchCommands::Validate { config } => cmd_match_validate(config),
        MatchCommands::Score { left, right, scorer, config } => cmd_match_score(left, right, scorer, config),
    }
}

fn match_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

/// Map an engine error onto the exit code registry.
fn engine_err(e: MatchError) -> CliError {
    match e {
        MatchError::MissingColumn { .. } => match_err(EXIT_MATCH_INVALID_CONFIG, e.to_string())
            .with_hint("check [sources.<side>.columns] against the CSV header"),
        MatchError::ConfigParse(_) | MatchError::ConfigValidation(_) => {
            match_err(EXIT_MATCH_INVALID_CONFIG, e.to_string())
        }
        MatchError::Csv { .. } | MatchError::Scorer(_) => {
            match_err(EXIT_MATCH_RUNTIME, e.to_string())
        }
    }
}

fn parse_scorer(value: &str) -> Result<ScorerKind, CliError> {
    value.parse().map_err(|e: MatchError| CliError::args(e.to_string()))
}

fn load_config(config_path: &Path) -> Result<MatchConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| match_err(EXIT_MATCH_RUNTIME, format!("cannot read config: {e}")))?;
    MatchConfig::from_toml(&config_str).map_err(engine_err)
}

fn cmd_match_run(
    config_path: PathBuf,
    output_file: Option<PathBuf>,
    json_stdout: bool,
    json_file: Option<PathBuf>,
    threshold: Option<f64>,
    scorer: Option<String>,
    fail_on_unmatched: bool,
) -> Result<(), CliError> {
    let mut config = load_config(&config_path)?;

    // Command-line overrides are validated like the file itself
    if let Some(kind) = scorer.as_deref() {
        config.scorer.kind = parse_scorer(kind)?;
    }
    if let Some(t) = threshold {
        config.threshold = t;
    }
    config.validate().map_err(engine_err)?;

    // Resolve file paths relative to config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let read_source = |key: &str| -> Result<String, CliError> {
        let source = config.source(key).map_err(engine_err)?;
        let csv_path = base_dir.join(&source.file);
        std::fs::read_to_string(&csv_path)
            .map_err(|e| match_err(EXIT_MATCH_RUNTIME, format!("cannot read {}: {e}", csv_path.display())))
    };
    let left_csv = read_source(LEFT)?;
    let right_csv = read_source(RIGHT)?;

    let input = build_input(&config, &left_csv, &right_csv).map_err(engine_err)?;
    let result = tourmatch_matcher::run(&config, &input).map_err(engine_err)?;

    // CSV: flag, then config, then stdout unless stdout carries JSON
    let csv_path = output_file.or_else(|| config.output.file.as_ref().map(|f| base_dir.join(f)));
    let csv = to_csv(&result).map_err(engine_err)?;
    match csv_path {
        Some(path) => {
            std::fs::write(&path, &csv)
                .map_err(|e| match_err(EXIT_MATCH_RUNTIME, format!("cannot write {}: {e}", path.display())))?;
            eprintln!("wrote {}", path.display());
        }
        None if !json_stdout => print!("{csv}"),
        None => {}
    }

    let json_path = json_file.or_else(|| config.output.json.as_ref().map(|f| base_dir.join(f)));
    if json_stdout || json_path.is_some() {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        if let Some(ref path) = json_path {
            std::fs::write(path, &json_str)
                .map_err(|e| match_err(EXIT_MATCH_RUNTIME, format!("cannot write {}: {e}", path.display())))?;
            eprintln!("wrote {}", path.display());
        }
        if json_stdout {
            println!("{json_str}");
        }
    }

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "{}: {} x {} records, scorer {}, threshold {}",
        result.meta.config_name, s.left_records, s.right_records, result.meta.scorer, result.meta.threshold,
    );
    if s.left_duplicates + s.right_duplicates > 0 {
        eprintln!(
            "dropped duplicates: {} {}, {} {}",
            s.left_duplicates, result.left_label, s.right_duplicates, result.right_label,
        );
    }
    eprintln!(
        "{} matched, {} below threshold, {} left unmatched, {} right unmatched",
        s.matched, s.below_threshold, s.left_unmatched, s.right_unmatched,
    );
    if let Some(mean) = s.mean_score {
        eprintln!("mean score {}", format_score(mean));
    }
    if s.failed_cells > 0 {
        eprintln!("warning: {} pair(s) could not be scored", s.failed_cells);
    }

    if fail_on_unmatched && s.left_unmatched > 0 {
        return Err(match_err(
            EXIT_MATCH_UNMATCHED,
            format!("{} {} record(s) unmatched (--fail-on-unmatched)", s.left_unmatched, result.left_label),
        ));
    }

    Ok(())
}

fn cmd_match_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "valid: '{}' matching {} against {} with scorer {}, threshold {}",
        config.name,
        config.label(LEFT),
        config.label(RIGHT),
        config.scorer.kind,
        config.threshold,
    );
    Ok(())
}

fn cmd_match_score(
    left: String,
    right: String,
    scorer: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<(), CliError> {
    let (mut scorer_config, text_config) = match config_path {
        Some(path) => {
            let config = load_config(&path)?;
            (config.scorer, config.text)
        }
        None => (ScorerConfig::default(), TextConfig::default()),
    };
    if let Some(kind) = scorer.as_deref() {
        scorer_config.kind = parse_scorer(kind)?;
    }

    // Same text treatment as `run` applies to records
    let left = finish_text(left, &text_config, Side::Query);
    let right = finish_text(right, &text_config, Side::Passage);

    let matrix = build_scorer(&scorer_config)
        .score_matrix(&[left], &[right])
        .map_err(engine_err)?;
    if matrix.failed_cells() > 0 {
        return Err(match_err(EXIT_MATCH_RUNTIME, "pair could not be scored"));
    }

    println!("{}", format_score(matrix.get(0, 0)));
    Ok(())
}
