//! CSV rendering of a match result.
//!
//! Columns: `rank`, `score`, then per side `<label>_index` followed by every
//! original column of that side prefixed `<label>_`. Rows follow the result's
//! pair order (descending score). Scores are rounded to 4 decimals.

use crate::error::MatchError;
use crate::model::{ActivityRecord, MatchResult};

/// Columns used when a side was built in code without CSV headers.
const STRUCTURED_COLUMNS: [&str; 6] = ["source_id", "destination", "activity", "description", "price", "currency"];

pub fn to_csv(result: &MatchResult) -> Result<String, MatchError> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    let err = |e: csv::Error| MatchError::Csv { source: "output".into(), message: e.to_string() };

    let left_cols = columns(&result.left_headers);
    let right_cols = columns(&result.right_headers);

    let mut header = vec!["rank".to_string(), "score".to_string()];
    header.push(format!("{}_index", result.left_label));
    header.extend(left_cols.iter().map(|c| format!("{}_{c}", result.left_label)));
    header.push(format!("{}_index", result.right_label));
    header.extend(right_cols.iter().map(|c| format!("{}_{c}", result.right_label)));
    writer.write_record(&header).map_err(err)?;

    for (rank, pair) in result.pairs.iter().enumerate() {
        let mut row = vec![(rank + 1).to_string(), format_score(pair.score)];
        row.push(pair.left_index.to_string());
        row.extend(values(&pair.left, &result.left_headers));
        row.push(pair.right_index.to_string());
        row.extend(values(&pair.right, &result.right_headers));
        writer.write_record(&row).map_err(err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| MatchError::Csv { source: "output".into(), message: e.to_string() })?;
    String::from_utf8(bytes).map_err(|e| MatchError::Csv { source: "output".into(), message: e.to_string() })
}

pub fn format_score(score: f64) -> String {
    format!("{score:.4}")
}

fn columns(headers: &[String]) -> Vec<String> {
    if headers.is_empty() {
        STRUCTURED_COLUMNS.iter().map(|c| c.to_string()).collect()
    } else {
        headers.to_vec()
    }
}

fn values(record: &ActivityRecord, headers: &[String]) -> Vec<String> {
    if headers.is_empty() {
        return vec![
            record.source_id.clone(),
            record.destination.clone(),
            record.activity.clone(),
            record.description.clone().unwrap_or_default(),
            record.price.clone(),
            record.currency.clone(),
        ];
    }
    (0..headers.len())
        .map(|i| record.raw_fields.get(i).cloned().unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchMeta, MatchSummary, MatchedPair};

    fn result(pairs: Vec<MatchedPair>, headers: Vec<String>) -> MatchResult {
        MatchResult {
            meta: MatchMeta::new("t", "tfidf", 0.3),
            summary: MatchSummary::default(),
            pairs,
            left_label: "triviantes".into(),
            right_label: "civitatis".into(),
            left_headers: headers.clone(),
            right_headers: headers,
        }
    }

    fn record(dest: &str, act: &str, url: &str) -> ActivityRecord {
        ActivityRecord {
            raw_fields: vec![dest.into(), act.into(), url.into()],
            ..ActivityRecord::new(dest, act)
        }
    }

    #[test]
    fn header_and_rows_carry_original_columns() {
        let headers = vec!["destino".to_string(), "actividad".into(), "url".into()];
        let pair = MatchedPair {
            left_index: 3,
            right_index: 0,
            score: 0.876_543,
            left: record("Medellín", "Comuna 13", "https://a/1"),
            right: record("Medellín", "Graffiti tour, Comuna 13", "https://b/9"),
        };
        let csv = to_csv(&result(vec![pair], headers)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "rank,score,triviantes_index,triviantes_destino,triviantes_actividad,triviantes_url,\
             civitatis_index,civitatis_destino,civitatis_actividad,civitatis_url"
        );
        assert_eq!(
            lines[1],
            "1,0.8765,3,Medellín,Comuna 13,https://a/1,0,Medellín,\"Graffiti tour, Comuna 13\",https://b/9"
        );
    }

    #[test]
    fn repeated_header_keeps_each_cell() {
        let headers = vec!["destino".to_string(), "actividad".into(), "url".into(), "url".into()];
        let mut left = record("Bogota", "Museo", "u1");
        left.raw_fields.push("u2".into());
        let mut right = record("Bogota", "Museo del Oro", "v1");
        right.raw_fields.push("v2".into());
        let pair = MatchedPair { left_index: 0, right_index: 0, score: 1.0, left, right };

        let csv = to_csv(&result(vec![pair], headers)).unwrap();
        assert_eq!(csv.lines().nth(1).unwrap(), "1,1.0000,0,Bogota,Museo,u1,u2,0,Bogota,Museo del Oro,v1,v2");
    }

    #[test]
    fn short_raw_fields_pad_with_empty_cells() {
        let headers = vec!["destino".to_string(), "actividad".into(), "url".into(), "notas".into()];
        let pair = MatchedPair {
            left_index: 0,
            right_index: 0,
            score: 0.5,
            left: record("Cali", "Salsa", "u"),
            right: record("Cali", "Clase de salsa", "v"),
        };
        let csv = to_csv(&result(vec![pair], headers)).unwrap();
        assert_eq!(csv.lines().nth(1).unwrap(), "1,0.5000,0,Cali,Salsa,u,,0,Cali,Clase de salsa,v,");
    }

    #[test]
    fn structured_columns_without_headers() {
        let pair = MatchedPair {
            left_index: 0,
            right_index: 1,
            score: 1.0,
            left: ActivityRecord::new("Bogotá", "Museo del Oro"),
            right: ActivityRecord::new("Bogotá", "Museo del Oro"),
        };
        let csv = to_csv(&result(vec![pair], Vec::new())).unwrap();
        assert!(csv.starts_with("rank,score,triviantes_index,triviantes_source_id,triviantes_destination"));
        assert!(csv.lines().nth(1).unwrap().starts_with("1,1.0000,0,,Bogotá,Museo del Oro"));
    }

    #[test]
    fn empty_result_is_header_only() {
        let csv = to_csv(&result(Vec::new(), vec!["destino".into()])).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
