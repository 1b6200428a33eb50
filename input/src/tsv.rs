//! Loader for metadata-block TSV documents.
//!
//! A `#`-prefixed line opens a block: its first cell names the block,
//! the remaining cells are column headers. Every following data row
//! belongs to the most recently opened block. Cells are addressed by
//! column name in findings, since a reflowed spreadsheet column is
//! easier to point at than a character offset.

use tracing::debug;

use mdblock_core::{Location, Node, Scalar};

use crate::InputError;

/// Parses TSV source into a document tree shaped like the YAML one:
/// a root mapping of block keywords to entry sequences.
pub fn load(source: &str) -> Result<Node, InputError> {
    let mut blocks: Vec<OpenBlock> = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(marker_line) = line.strip_prefix('#') {
            let mut cells = marker_line.split('\t');
            let keyword = cells.next().unwrap_or_default().trim().to_string();
            blocks.push(OpenBlock {
                keyword,
                line: line_no,
                headers: cells.map(|h| h.trim_matches(' ').to_string()).collect(),
                records: Vec::new(),
            });
            continue;
        }
        let Some(block) = blocks.last_mut() else {
            return Err(InputError::RowOutsideBlock(line_no));
        };
        block.push_row(line, line_no);
    }

    if blocks.is_empty() {
        return Err(InputError::MissingMarkers);
    }
    debug!(blocks = blocks.len(), "parsed TSV document");

    let fields = blocks.into_iter().map(OpenBlock::into_field).collect();
    Ok(Node::mapping(fields, Some(Location::at(1, 1))))
}

struct OpenBlock {
    keyword: String,
    line: usize,
    headers: Vec<String>,
    records: Vec<Node>,
}

impl OpenBlock {
    fn push_row(&mut self, line: &str, line_no: usize) {
        // The cell before the first tab sits under the marker column
        // and carries no data.
        let cells: Vec<&str> = line.split('\t').skip(1).collect();
        let fields = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let cell = cells.get(i).copied().unwrap_or_default();
                (
                    header.clone(),
                    Node::scalar(resolve_cell(cell), Some(Location::column(header))),
                )
            })
            .collect();
        self.records
            .push(Node::mapping(fields, Some(Location::at(line_no, 1))));
    }

    fn into_field(self) -> (String, Node) {
        let location = Some(Location::at(self.line, 1));
        (self.keyword, Node::sequence(self.records, location))
    }
}

fn resolve_cell(cell: &str) -> Scalar {
    match cell {
        "" => Scalar::Empty,
        "TRUE" => Scalar::Boolean(true),
        "FALSE" => Scalar::Boolean(false),
        _ => Scalar::Str(cell.to_string()),
    }
}
