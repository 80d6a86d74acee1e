//! Textual representation of records, as fed to the scorers.

use unicode_normalization::UnicodeNormalization;

use crate::config::TextConfig;
use crate::model::ActivityRecord;

/// Which side of the match a text is built for. Selects the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Query,
    Passage,
}

/// Build the scorer input for one record: "DEST<sep>ACTIVITY", optionally
/// followed by ". <label>DESCRIPTION", with the side's prefix in front.
pub fn record_text(record: &ActivityRecord, config: &TextConfig, side: Side) -> String {
    let destination = record.destination.trim();
    let activity = record.activity.trim();

    let mut text = match (destination.is_empty(), activity.is_empty()) {
        (false, false) => format!("{destination}{}{activity}", config.separator),
        (false, true) => destination.to_string(),
        (true, _) => activity.to_string(),
    };

    if config.include_description {
        if let Some(desc) = record.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            if text.is_empty() {
                text = format!("{}{desc}", config.description_label);
            } else {
                text = format!("{text}. {}{desc}", config.description_label);
            }
        }
    }

    finish_text(text, config, side)
}

/// Apply accent stripping and the side's prefix to already-built text.
pub fn finish_text(text: String, config: &TextConfig, side: Side) -> String {
    let text = if config.strip_accents { strip_accents(&text) } else { text };

    let prefix = match side {
        Side::Query => &config.query_prefix,
        Side::Passage => &config.passage_prefix,
    };
    if prefix.is_empty() {
        text
    } else {
        format!("{prefix}{text}")
    }
}

pub fn record_texts(records: &[ActivityRecord], config: &TextConfig, side: Side) -> Vec<String> {
    records.iter().map(|r| record_text(r, config, side)).collect()
}

/// Decompose to NFD and drop combining marks: "Caminata en Guatapé" -> "Caminata en Guatape".
pub fn strip_accents(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect()
}

/// Split on whitespace after lowercasing. Shared by the lexical scorers.
pub fn words(input: &str) -> Vec<String> {
    input.to_lowercase().split_whitespace().map(str::to_string).collect()
}
