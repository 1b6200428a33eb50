//! Schema normalization: raw document tree to [`Schema`].
//!
//! The normalizer never rejects a document. Malformed fragments become
//! placeholder blocks or records so that a single validation pass can
//! report every structural problem; the corresponding findings are
//! produced later by the rule engine, not here.

use tracing::debug;

use crate::model::{Block, BlockKind, Node, Record, Schema, Value};

/// Normalizes a parsed document tree into the three canonical block
/// collections, preserving declaration order and locations.
///
/// Unknown top-level keys are retained in [`Schema::keywords`] for the
/// keyword-validity rule. When a known keyword appears more than once,
/// the first occurrence becomes the block and the duplicates stay
/// visible to the uniqueness rule.
pub fn normalize(document: Node) -> Schema {
    let mut schema = Schema::default();

    let Value::Mapping(pairs) = document.value else {
        // Scalar or sequence roots yield an empty skeleton; the missing
        // keywords are reported by k001.
        debug!("document root is not a mapping, producing empty schema");
        return schema;
    };

    for (keyword, node) in pairs {
        schema.keywords.push((keyword.clone(), node.location.clone()));
        let Some(kind) = BlockKind::from_keyword(&keyword) else {
            debug!(keyword, "retaining unknown top-level keyword");
            continue;
        };
        if schema.block(kind).is_some() {
            debug!(keyword, "duplicate block keyword, keeping first occurrence");
            continue;
        }
        schema.blocks.push(normalize_block(kind, node));
    }

    debug!(
        blocks = schema.blocks.len(),
        keywords = schema.keywords.len(),
        "normalized schema"
    );
    schema
}

fn normalize_block(kind: BlockKind, node: Node) -> Block {
    let location = node.location;
    match node.value {
        Value::Sequence(entries) => Block {
            kind,
            location,
            is_list: true,
            records: entries.into_iter().map(normalize_record).collect(),
        },
        // Scalar or mapping block values are flagged by b002; an empty
        // record list keeps the entry-level rules quiet.
        _ => Block {
            kind,
            location,
            is_list: false,
            records: Vec::new(),
        },
    }
}

fn normalize_record(entry: Node) -> Record {
    let location = entry.location;
    match entry.value {
        Value::Mapping(fields) => Record {
            fields,
            location,
            from_mapping: true,
        },
        _ => Record {
            fields: Vec::new(),
            location,
            from_mapping: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, Scalar};

    fn scalar(text: &str) -> Node {
        Node::scalar(Scalar::Str(text.to_string()), None)
    }

    #[test]
    fn test_normalize_scalar_root_is_empty_skeleton() {
        let schema = normalize(scalar("not a schema"));
        assert!(schema.blocks.is_empty());
        assert!(schema.keywords.is_empty());
    }

    #[test]
    fn test_normalize_preserves_declaration_order_and_unknowns() {
        let document = Node::mapping(
            vec![
                (
                    "datasetField".to_string(),
                    Node::sequence(vec![], Some(Location::at(1, 1))),
                ),
                ("metadataBlok".to_string(), Node::sequence(vec![], None)),
            ],
            None,
        );
        let schema = normalize(document);
        assert_eq!(schema.blocks.len(), 1);
        assert_eq!(schema.blocks[0].kind, BlockKind::DatasetField);
        assert_eq!(
            schema.keywords,
            vec![
                ("datasetField".to_string(), Some(Location::at(1, 1))),
                ("metadataBlok".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_normalize_non_list_block() {
        let document = Node::mapping(
            vec![("metadataBlock".to_string(), scalar("oops"))],
            None,
        );
        let schema = normalize(document);
        let block = schema.block(BlockKind::MetadataBlock).unwrap();
        assert!(!block.is_list);
        assert!(block.records.is_empty());
    }

    #[test]
    fn test_normalize_keeps_placeholder_for_non_mapping_entry() {
        let document = Node::mapping(
            vec![(
                "datasetField".to_string(),
                Node::sequence(
                    vec![
                        Node::mapping(
                            vec![("name".to_string(), scalar("title"))],
                            Some(Location::at(2, 3)),
                        ),
                        scalar("just a string"),
                    ],
                    None,
                ),
            )],
            None,
        );
        let schema = normalize(document);
        let block = schema.block(BlockKind::DatasetField).unwrap();
        assert_eq!(block.records.len(), 2);
        assert!(block.records[0].from_mapping);
        assert!(!block.records[1].from_mapping);
    }

    #[test]
    fn test_normalize_duplicate_keyword_keeps_first_block() {
        let document = Node::mapping(
            vec![
                (
                    "metadataBlock".to_string(),
                    Node::sequence(
                        vec![Node::mapping(
                            vec![("name".to_string(), scalar("first"))],
                            None,
                        )],
                        None,
                    ),
                ),
                ("metadataBlock".to_string(), Node::sequence(vec![], None)),
            ],
            None,
        );
        let schema = normalize(document);
        assert_eq!(schema.blocks.len(), 1);
        assert_eq!(schema.records(BlockKind::MetadataBlock).len(), 1);
        assert_eq!(schema.keywords.len(), 2);
    }
}
