//! Record input and report output.
//!
//! Input is either a JSON array or JSON lines of `{"name"?: str, "id"?: str}`,
//! where `id` is a DrugBank or ChEMBL identifier. Output is one pretty-printed
//! JSON document.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use chemxref_common::entities::{DrugRecord, RecordId};
use chemxref_resolver::BatchReport;
use chemxref_similarity::{MissingPolicy, RecordSimilarity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Deserialize)]
struct InputRow {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

impl InputRow {
    /// Rows without a usable id stay in the batch as unidentified records.
    fn into_record(self, row: usize) -> DrugRecord {
        let name = self.name.filter(|n| !n.trim().is_empty());
        match self.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            Some(raw) => DrugRecord::from_identifier(raw, name.clone()).unwrap_or_else(|e| {
                warn!(row, error = %e, "Unrecognised identifier, record kept without ids");
                DrugRecord::unidentified(name)
            }),
            None => {
                warn!(row, "Missing identifier, record kept without ids");
                DrugRecord::unidentified(name)
            }
        }
    }
}

pub fn read_records(path: &Path) -> anyhow::Result<Vec<DrugRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_records(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Only malformed JSON is an error. Every well-formed row yields exactly
/// one record, in input order.
pub fn parse_records(content: &str) -> anyhow::Result<Vec<DrugRecord>> {
    if content.trim_start().starts_with('[') {
        let rows: Vec<InputRow> = serde_json::from_str(content)?;
        return Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| row.into_record(i + 1))
            .collect());
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let row: InputRow =
                serde_json::from_str(line).with_context(|| format!("line {}", i + 1))?;
            Ok(row.into_record(i + 1))
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct SimilaritySection {
    pub policy: MissingPolicy,
    pub record_ids: Vec<RecordId>,
    pub dropped: Vec<RecordId>,
    pub matrix: Vec<Vec<f64>>,
}

impl SimilaritySection {
    pub fn new(policy: MissingPolicy, result: RecordSimilarity) -> Self {
        Self {
            policy,
            matrix: result.matrix.to_rows(),
            record_ids: result.record_ids,
            dropped: result.dropped,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub batch: BatchReport,
    pub records: Vec<DrugRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<SimilaritySection>,
}

/// Write to `path`, or stdout when `None`.
pub fn write_report(report: &Report, path: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    match path {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("writing {}", path.display()))?,
        None => {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{json}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_array() {
        let records = parse_records(
            r#"[{"name": "Aspirin", "id": "DB00945"}, {"id": "chembl1431"}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name.as_deref(), Some("Aspirin"));
        assert_eq!(records[0].identifier_pair(), (Some("DB00945"), None));
        assert_eq!(records[1].identifier_pair(), (None, Some("CHEMBL1431")));
        assert_ne!(records[0].id, records[1].id);
    }

    #[test]
    fn test_json_lines_skips_blank() {
        let records = parse_records("{\"id\": \"DB00945\"}\n\n{\"id\": \"CHEMBL25\", \"name\": \"\"}\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, None);
    }

    #[test]
    fn test_malformed_json_reports_line() {
        let err = parse_records("{\"id\": \"DB1\"}\n{\"id\": ").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_unusable_ids_keep_their_row() {
        let records = parse_records(
            r#"[{"id": "DB00945"}, {"id": "2244", "name": "Aspirin"}, {"name": "Metformin"}, {"id": "CHEMBL25"}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].identifier_pair(), (Some("DB00945"), None));
        assert_eq!(records[1].identifier_pair(), (None, None));
        assert_eq!(records[1].name.as_deref(), Some("Aspirin"));
        assert_eq!(records[2].identifier_pair(), (None, None));
        assert_eq!(records[3].identifier_pair(), (None, Some("CHEMBL25")));

        let lines = parse_records("{\"id\": \"CID2244\"}\n{\"id\": \"DB1\"}\n").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].identifier_pair(), (None, None));
    }

    #[test]
    fn test_duplicates_are_kept_in_order() {
        let records = parse_records("[{\"id\": \"DB1\"}, {\"id\": \"DB1\"}]").unwrap();
        assert_eq!(records.len(), 2);
        assert_ne!(records[0].id, records[1].id);
    }
}
