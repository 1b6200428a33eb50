//! Renders a checked schema as a metadata-block TSV document.
//!
//! Output is canonical rather than source-shaped: blocks appear in the
//! fixed metadataBlock, datasetField, controlledVocabulary order, each
//! with the full column set for its kind, with a single blank line
//! between sections. Cells for absent keys are emitted empty so every
//! row has the same width as its header.

use thiserror::Error;

use crate::finding::Outcome;
use crate::model::{BlockKind, Schema};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmitError {
    /// The check outcome still carries effective errors; emitting a
    /// TSV from a broken schema would only propagate the breakage.
    #[error("refusing to emit TSV: {0} error finding(s) present")]
    ErrorFindingsPresent(usize),
}

/// Serializes the schema into TSV text, refusing when the outcome
/// contains error-severity findings.
pub fn emit(schema: &Schema, outcome: &Outcome) -> Result<String, EmitError> {
    let errors = outcome.error_count();
    if errors > 0 {
        return Err(EmitError::ErrorFindingsPresent(errors));
    }

    let mut out = String::new();
    for kind in BlockKind::ALL {
        let Some(block) = schema.block(kind) else {
            continue;
        };
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(kind.marker());
        for column in kind.columns() {
            out.push('\t');
            out.push_str(column);
        }
        out.push('\n');
        for record in &block.records {
            for column in kind.columns() {
                out.push('\t');
                if let Some(scalar) = record.scalar(column) {
                    out.push_str(scalar.cell());
                }
            }
            out.push('\n');
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, Location, Node, Record, Scalar};
    use crate::severity::{Severity, SeverityConfig};

    fn record(pairs: &[(&str, Scalar)]) -> Record {
        Record {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Node::scalar(v.clone(), None)))
                .collect(),
            location: Some(Location::at(1, 1)),
            from_mapping: true,
        }
    }

    fn schema_with_block(kind: BlockKind, records: Vec<Record>) -> Schema {
        Schema {
            blocks: vec![Block {
                kind,
                location: None,
                is_list: true,
                records,
            }],
            keywords: vec![(kind.keyword().to_string(), None)],
        }
    }

    #[test]
    fn test_emit_writes_marker_header_and_padded_row() {
        let schema = schema_with_block(
            BlockKind::MetadataBlock,
            vec![record(&[
                ("name", Scalar::Str("demo".into())),
                ("displayName", Scalar::Str("Demo Block".into())),
            ])],
        );
        let tsv = emit(&schema, &Outcome::default()).unwrap();
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(
            lines[0],
            "#metadataBlock\tname\tdataverseAlias\tdisplayName\tblockURI"
        );
        // dataverseAlias and blockURI are absent, so their cells are empty.
        assert_eq!(lines[1], "\tdemo\t\tDemo Block\t");
    }

    #[test]
    fn test_emit_canonicalizes_scalar_forms() {
        let schema = schema_with_block(
            BlockKind::ControlledVocabulary,
            vec![record(&[
                ("DatasetField", Scalar::Quoted("depth".into())),
                ("Value", Scalar::Boolean(true)),
                ("identifier", Scalar::Empty),
            ])],
        );
        let tsv = emit(&schema, &Outcome::default()).unwrap();
        assert_eq!(tsv.lines().nth(1).unwrap(), "\tdepth\tTRUE\t\t");
    }

    #[test]
    fn test_emit_separates_blocks_with_one_blank_line() {
        let schema = Schema {
            blocks: vec![
                // Source order is controlledVocabulary first; output
                // order is still fixed.
                Block {
                    kind: BlockKind::ControlledVocabulary,
                    location: None,
                    is_list: true,
                    records: vec![record(&[
                        ("DatasetField", Scalar::Str("depth".into())),
                        ("Value", Scalar::Str("deep".into())),
                    ])],
                },
                Block {
                    kind: BlockKind::MetadataBlock,
                    location: None,
                    is_list: true,
                    records: vec![record(&[("name", Scalar::Str("demo".into()))])],
                },
            ],
            keywords: vec![],
        };
        let tsv = emit(&schema, &Outcome::default()).unwrap();
        let lines: Vec<&str> = tsv.split('\n').collect();
        assert!(lines[0].starts_with("#metadataBlock"));
        assert_eq!(lines[2], "");
        assert!(lines[3].starts_with("#controlledVocabulary"));
    }

    #[test]
    fn test_emit_refuses_on_error_findings() {
        let finding = crate::finding::Finding::new(
            "block_is_list",
            "b002",
            Severity::Error,
            "Block 'metadataBlock' is not a list of entries.",
        );
        let outcome = Outcome::resolve(vec![finding], &SeverityConfig::default());
        let schema = schema_with_block(BlockKind::MetadataBlock, vec![]);
        assert_eq!(
            emit(&schema, &outcome),
            Err(EmitError::ErrorFindingsPresent(1))
        );
    }

    #[test]
    fn test_emit_allows_warnings() {
        let finding = crate::finding::Finding::new(
            "no_trailing_spaces",
            "e004",
            Severity::Warning,
            "trailing whitespace",
        );
        let outcome = Outcome::resolve(vec![finding], &SeverityConfig::default());
        let schema = schema_with_block(BlockKind::MetadataBlock, vec![]);
        assert!(emit(&schema, &outcome).is_ok());
    }
}
