//! Event-driven YAML loader.
//!
//! Built on the pull parser rather than the document API so that
//! every node keeps its source position and scalars keep their quoting
//! style. Quoted scalars are preserved verbatim; plain scalars resolve
//! empty/null and boolean forms the way YAML 1.1 readers do.

use tracing::debug;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use mdblock_core::{Location, Node, Scalar};

use crate::InputError;

/// Parses YAML source into a located document tree.
pub fn load(source: &str) -> Result<Node, InputError> {
    let mut builder = TreeBuilder::default();
    let mut parser = Parser::new_from_str(source);
    parser.load(&mut builder, false)?;
    if builder.root.is_none() {
        debug!("YAML document has no content");
    }
    Ok(builder
        .root
        .unwrap_or_else(|| Node::scalar(Scalar::Empty, None)))
}

enum Frame {
    Sequence {
        items: Vec<Node>,
        location: Option<Location>,
    },
    Mapping {
        fields: Vec<(String, Node)>,
        pending_key: Option<String>,
        location: Option<Location>,
    },
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    root: Option<Node>,
}

impl TreeBuilder {
    fn expects_key(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Frame::Mapping {
                pending_key: None,
                ..
            })
        )
    }

    fn finish_node(&mut self, node: Node) {
        match self.stack.last_mut() {
            None => self.root = Some(node),
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping {
                fields,
                pending_key,
                ..
            }) => match pending_key.take() {
                Some(key) => fields.push((key, node)),
                // A collection in key position; the dedicated rules
                // report the structural damage, so an empty key keeps
                // the tree well-formed.
                None => *pending_key = Some(String::new()),
            },
        }
    }
}

fn location(marker: Marker) -> Option<Location> {
    Some(Location::at(marker.line(), marker.col() + 1))
}

fn resolve_plain(raw: String) -> Scalar {
    if raw.is_empty() || raw == "~" || raw.eq_ignore_ascii_case("null") {
        return Scalar::Empty;
    }
    if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("yes") {
        return Scalar::Boolean(true);
    }
    if raw.eq_ignore_ascii_case("false") || raw.eq_ignore_ascii_case("no") {
        return Scalar::Boolean(false);
    }
    Scalar::Str(raw)
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, event: Event, marker: Marker) {
        match event {
            Event::Scalar(raw, style, _, _) => {
                if self.expects_key() {
                    if let Some(Frame::Mapping { pending_key, .. }) = self.stack.last_mut() {
                        *pending_key = Some(raw);
                    }
                    return;
                }
                let scalar = match style {
                    TScalarStyle::Plain => resolve_plain(raw),
                    _ => Scalar::Quoted(raw),
                };
                self.finish_node(Node::scalar(scalar, location(marker)));
            }
            // Anchors and aliases carry no value of their own here.
            Event::Alias(_) => {
                self.finish_node(Node::scalar(Scalar::Empty, location(marker)));
            }
            Event::SequenceStart(_, _) => self.stack.push(Frame::Sequence {
                items: Vec::new(),
                location: location(marker),
            }),
            Event::SequenceEnd => {
                if let Some(Frame::Sequence { items, location }) = self.stack.pop() {
                    self.finish_node(Node::sequence(items, location));
                }
            }
            Event::MappingStart(_, _) => self.stack.push(Frame::Mapping {
                fields: Vec::new(),
                pending_key: None,
                location: location(marker),
            }),
            Event::MappingEnd => {
                if let Some(Frame::Mapping {
                    fields, location, ..
                }) = self.stack.pop()
                {
                    self.finish_node(Node::mapping(fields, location));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdblock_core::Value;

    fn root_fields(source: &str) -> Vec<(String, Node)> {
        match load(source).unwrap().value {
            Value::Mapping(fields) => fields,
            other => panic!("expected mapping root, got {other:?}"),
        }
    }

    #[test]
    fn test_load_tracks_line_and_column() {
        let fields = root_fields("metadataBlock:\n- name: demo\n");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "metadataBlock");
        let Value::Sequence(entries) = &fields[0].1.value else {
            panic!("block is not a sequence");
        };
        let Value::Mapping(record) = &entries[0].value else {
            panic!("entry is not a mapping");
        };
        let (key, node) = &record[0];
        assert_eq!(key, "name");
        assert_eq!(node.location, Some(Location::at(2, 9)));
    }

    #[test]
    fn test_load_distinguishes_quoting() {
        let fields = root_fields("a: 'TRUE'\nb: TRUE\nc: \"no\"\n");
        let scalar = |i: usize| match &fields[i].1.value {
            Value::Scalar(s) => s.clone(),
            other => panic!("expected scalar, got {other:?}"),
        };
        assert_eq!(scalar(0), Scalar::Quoted("TRUE".into()));
        assert_eq!(scalar(1), Scalar::Boolean(true));
        assert_eq!(scalar(2), Scalar::Quoted("no".into()));
    }

    #[test]
    fn test_load_resolves_empty_forms() {
        let fields = root_fields("a:\nb: ~\nc: null\nd: ''\n");
        for (i, expected) in [
            Scalar::Empty,
            Scalar::Empty,
            Scalar::Empty,
            Scalar::Quoted(String::new()),
        ]
        .into_iter()
        .enumerate()
        {
            let Value::Scalar(s) = &fields[i].1.value else {
                panic!("expected scalar");
            };
            assert_eq!(*s, expected, "field {}", fields[i].0);
        }
    }

    #[test]
    fn test_load_keeps_duplicate_keys() {
        let fields = root_fields("datasetField: []\ndatasetField: []\n");
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_load_empty_document() {
        let node = load("").unwrap();
        assert_eq!(node.value, Value::Scalar(Scalar::Empty));
    }

    #[test]
    fn test_load_reports_syntax_errors() {
        assert!(matches!(
            load("a: [unclosed\n"),
            Err(InputError::Yaml(_))
        ));
    }
}
