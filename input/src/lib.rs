//! Input front-ends for metadata-block documents.
//!
//! Two loaders produce the same [`Node`](mdblock_core::Node) tree: the
//! YAML loader tracks line/column positions and scalar quoting, the
//! TSV loader tags cells with their column name. Everything downstream
//! of the tree is format-agnostic.

use std::path::Path;

use thiserror::Error;
use yaml_rust2::scanner::ScanError;

use mdblock_core::{Finding, Severity};

mod tsv;
mod yaml;

pub use tsv::load as load_tsv;
pub use yaml::load as load_yaml;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] ScanError),
    #[error("no block marker found; expected a line starting with '#'")]
    MissingMarkers,
    #[error("line {0}: data row appears before any block marker")]
    RowOutsideBlock(usize),
}

/// The document format a loader expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Yaml,
    Tsv,
}

/// Guesses the input format from the file extension.
///
/// The guess never fails hard: an unknown extension yields no kind and
/// an error-severity finding, and a `.csv` extension is accepted as
/// TSV with a warning, so format complaints flow through the same
/// reporting pipeline as lint findings.
pub fn guess_input_kind(path: &Path) -> (Option<InputKind>, Vec<Finding>) {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("yml") | Some("yaml") => (Some(InputKind::Yaml), Vec::new()),
        Some("tsv") => (Some(InputKind::Tsv), Vec::new()),
        Some("csv") => (
            Some(InputKind::Tsv),
            vec![Finding::new(
                "input_format",
                "i001",
                Severity::Warning,
                format!(
                    "File extension '.csv' suggests comma-separated data; \
                     '{}' will be read as tab-separated.",
                    path.display()
                ),
            )],
        ),
        _ => (
            None,
            vec![Finding::new(
                "input_format",
                "i001",
                Severity::Error,
                format!(
                    "Cannot determine the format of '{}'. \
                     Supported extensions are .yml, .yaml, and .tsv.",
                    path.display()
                ),
            )],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_known_extensions() {
        let (kind, findings) = guess_input_kind(Path::new("block.yml"));
        assert_eq!(kind, Some(InputKind::Yaml));
        assert!(findings.is_empty());

        let (kind, _) = guess_input_kind(Path::new("block.YAML"));
        assert_eq!(kind, Some(InputKind::Yaml));

        let (kind, findings) = guess_input_kind(Path::new("block.tsv"));
        assert_eq!(kind, Some(InputKind::Tsv));
        assert!(findings.is_empty());
    }

    #[test]
    fn test_guess_csv_warns_but_loads_as_tsv() {
        let (kind, findings) = guess_input_kind(Path::new("block.csv"));
        assert_eq!(kind, Some(InputKind::Tsv));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_guess_unknown_extension_is_an_error() {
        let (kind, findings) = guess_input_kind(Path::new("block.json"));
        assert_eq!(kind, None);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
    }
}
