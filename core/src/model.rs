//! Document model for metadata-block schemas.
//!
//! This module defines the location-tagged tree produced by the input
//! loaders ([`Node`], [`Value`], [`Scalar`]) and the normalized form the
//! rule engine and emitter operate on ([`Schema`], [`Block`], [`Record`]).
//! Locations are best-effort: YAML-derived nodes carry line/column
//! positions, TSV-derived cells carry only their column name, and
//! synthetic values carry nothing.

use std::fmt;

use serde::Serialize;

/// The three top-level sections of a metadata block, in the canonical
/// order expected by the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BlockKind {
    MetadataBlock,
    DatasetField,
    ControlledVocabulary,
}

impl BlockKind {
    /// All kinds in canonical output order.
    pub const ALL: [BlockKind; 3] = [
        BlockKind::MetadataBlock,
        BlockKind::DatasetField,
        BlockKind::ControlledVocabulary,
    ];

    /// The top-level keyword naming this block in a YAML schema.
    pub fn keyword(self) -> &'static str {
        match self {
            BlockKind::MetadataBlock => "metadataBlock",
            BlockKind::DatasetField => "datasetField",
            BlockKind::ControlledVocabulary => "controlledVocabulary",
        }
    }

    /// The `#`-prefixed section marker used in the TSV layout.
    pub fn marker(self) -> &'static str {
        match self {
            BlockKind::MetadataBlock => "#metadataBlock",
            BlockKind::DatasetField => "#datasetField",
            BlockKind::ControlledVocabulary => "#controlledVocabulary",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<BlockKind> {
        BlockKind::ALL.into_iter().find(|k| k.keyword() == keyword)
    }

    pub fn from_marker(marker: &str) -> Option<BlockKind> {
        BlockKind::ALL.into_iter().find(|k| k.marker() == marker)
    }

    /// The fixed column set for this kind, in emission order. These are
    /// also the only keys a record of this kind may carry.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            BlockKind::MetadataBlock => &["name", "dataverseAlias", "displayName", "blockURI"],
            BlockKind::DatasetField => &[
                "name",
                "title",
                "description",
                "watermark",
                "fieldType",
                "displayOrder",
                "displayFormat",
                "advancedSearchField",
                "allowControlledVocabulary",
                "allowmultiples",
                "facetable",
                "displayoncreate",
                "required",
                "parent",
                "metadatablock_id",
                "termURI",
            ],
            BlockKind::ControlledVocabulary => {
                &["DatasetField", "Value", "identifier", "displayOrder"]
            }
        }
    }

    /// The subset of [`columns`](BlockKind::columns) that every record of
    /// this kind must declare.
    pub fn required_keys(self) -> &'static [&'static str] {
        match self {
            BlockKind::MetadataBlock => &["name", "displayName"],
            BlockKind::DatasetField => &[
                "name",
                "title",
                "description",
                "fieldType",
                "displayOrder",
                "advancedSearchField",
                "allowControlledVocabulary",
                "allowmultiples",
                "facetable",
                "displayoncreate",
                "required",
                "metadatablock_id",
            ],
            BlockKind::ControlledVocabulary => &["DatasetField", "Value"],
        }
    }

    /// The key whose value identifies a record for duplicate detection
    /// and human-readable messages.
    pub fn identifying_key(self) -> &'static str {
        match self {
            BlockKind::MetadataBlock | BlockKind::DatasetField => "name",
            BlockKind::ControlledVocabulary => "DatasetField",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A 1-based line/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
}

/// Best-effort source location of a node.
///
/// YAML nodes carry a [`LineCol`]; TSV cells carry only their column
/// name, since raw positions are uninformative in wide rows. The `Ord`
/// impl sorts positional locations before column-named ones, which is
/// the ordering the rule engine uses for findings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    LineCol(LineCol),
    Column(String),
}

impl Location {
    pub fn at(line: usize, column: usize) -> Location {
        Location::LineCol(LineCol { line, column })
    }

    pub fn column(name: impl Into<String>) -> Location {
        Location::Column(name.into())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::LineCol(lc) => write!(f, "line {} column {}", lc.line, lc.column),
            Location::Column(name) => write!(f, "column '{name}'"),
        }
    }
}

/// A scalar value with its parse-time kind.
///
/// Quoting is captured here so that the emitter never canonicalizes a
/// value the author explicitly quoted: plain `true` becomes `TRUE` in
/// the output, quoted `'true'` is emitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scalar {
    /// Plain, unquoted scalar.
    Str(String),
    /// Quoted or block scalar, exempt from canonicalization.
    Quoted(String),
    /// Plain truthy scalar (`true`/`false`/`yes`/`no`, case-insensitive).
    Boolean(bool),
    /// Missing, `~`, or `null` value.
    Empty,
}

impl Scalar {
    /// Text content, for scalars that have one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) | Scalar::Quoted(s) => Some(s),
            Scalar::Boolean(_) | Scalar::Empty => None,
        }
    }

    /// The normalized cell representation used in TSV output.
    pub fn cell(&self) -> &str {
        match self {
            Scalar::Str(s) | Scalar::Quoted(s) => s,
            Scalar::Boolean(true) => "TRUE",
            Scalar::Boolean(false) => "FALSE",
            Scalar::Empty => "",
        }
    }
}

/// A parsed value: scalar, ordered sequence, or ordered mapping.
///
/// Mappings preserve declaration order and keep duplicate keys; the
/// rule engine reports duplicates rather than the parser dropping them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Sequence(Vec<Node>),
    Mapping(Vec<(String, Node)>),
}

/// A [`Value`] together with its optional source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub value: Value,
    pub location: Option<Location>,
}

impl Node {
    pub fn scalar(scalar: Scalar, location: Option<Location>) -> Node {
        Node {
            value: Value::Scalar(scalar),
            location,
        }
    }

    pub fn sequence(items: Vec<Node>, location: Option<Location>) -> Node {
        Node {
            value: Value::Sequence(items),
            location,
        }
    }

    pub fn mapping(fields: Vec<(String, Node)>, location: Option<Location>) -> Node {
        Node {
            value: Value::Mapping(fields),
            location,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.value {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(String, Node)]> {
        match &self.value {
            Value::Mapping(fields) => Some(fields),
            _ => None,
        }
    }
}

/// One entry (row) of a block: an ordered field map plus its location.
///
/// `from_mapping` is false for placeholder records synthesized from
/// sequence entries that were not mappings; those are flagged by the
/// `block_is_list` rule and skipped by the entry-level rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub fields: Vec<(String, Node)>,
    pub location: Option<Location>,
    pub from_mapping: bool,
}

impl Record {
    /// Looks up a field by exact key. Returns the first occurrence when
    /// the source carried duplicate keys.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn scalar(&self, key: &str) -> Option<&Scalar> {
        self.get(key).and_then(Node::as_scalar)
    }

    /// Text of a scalar field; `None` for booleans, empties, absent
    /// keys, and nested structures.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.scalar(key).and_then(Scalar::as_text)
    }

    /// Human-readable identifier for messages, based on the block
    /// kind's identifying key.
    pub fn display_name(&self, kind: BlockKind) -> String {
        match self.text(kind.identifying_key()) {
            Some(name) => name.to_string(),
            None => "<unnamed entry>".to_string(),
        }
    }
}

/// One of the three top-level sections after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub location: Option<Location>,
    /// Whether the source value for this block was a sequence.
    pub is_list: bool,
    pub records: Vec<Record>,
}

/// A normalized schema: the declared blocks plus every top-level
/// keyword occurrence in declaration order (known, unknown, and
/// duplicate keywords alike, for the keyword-level rules).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub blocks: Vec<Block>,
    pub keywords: Vec<(String, Option<Location>)>,
}

impl Schema {
    pub fn block(&self, kind: BlockKind) -> Option<&Block> {
        self.blocks.iter().find(|b| b.kind == kind)
    }

    /// Records of a block, or an empty slice when the block is absent.
    pub fn records(&self, kind: BlockKind) -> &[Record] {
        self.block(kind).map(|b| b.records.as_slice()).unwrap_or(&[])
    }
}
