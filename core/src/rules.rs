//! The lint rule catalog and engine.
//!
//! Rules are a flat catalog of plain records pairing metadata with a
//! pure check function; no rule mutates the schema. The engine runs
//! every enabled rule in registration order and sorts the concatenated
//! findings into a deterministic order: located findings first (by
//! position, then column name), unlocated findings last, ties broken
//! by rule code.
//!
//! Code prefixes mirror rule scope: `b` block-level, `k` top-level
//! keyword, `e` entry-level.

use std::cmp::Ordering;

use tracing::debug;

use crate::finding::Finding;
use crate::model::{BlockKind, Location, Record, Schema, Value};
use crate::severity::{Severity, SeverityConfig};
use crate::suggest;

/// Immutable descriptor of a single lint rule.
pub struct Rule {
    pub name: &'static str,
    pub code: &'static str,
    pub default_severity: Severity,
    pub check: fn(&Rule, &Schema) -> Vec<Finding>,
}

impl Rule {
    /// Starts a finding carrying this rule's identity and declared
    /// severity.
    pub fn finding(&self, message: impl Into<String>) -> Finding {
        Finding::new(self.name, self.code, self.default_severity, message)
    }
}

static CATALOG: [Rule; 11] = [
    Rule {
        name: "unique_names",
        code: "b001",
        default_severity: Severity::Error,
        check: unique_names,
    },
    Rule {
        name: "block_is_list",
        code: "b002",
        default_severity: Severity::Error,
        check: block_is_list,
    },
    Rule {
        name: "unique_title",
        code: "b003",
        default_severity: Severity::Error,
        check: unique_title,
    },
    Rule {
        name: "keywords_valid",
        code: "k001",
        default_severity: Severity::Error,
        check: keywords_valid,
    },
    Rule {
        name: "keywords_unique",
        code: "k002",
        default_severity: Severity::Error,
        check: keywords_unique,
    },
    Rule {
        name: "keys_valid",
        code: "e001",
        default_severity: Severity::Error,
        check: keys_valid,
    },
    Rule {
        name: "required_keys_present",
        code: "e002",
        default_severity: Severity::Error,
        check: required_keys_present,
    },
    Rule {
        name: "no_substructures",
        code: "e003",
        default_severity: Severity::Error,
        check: no_substructures,
    },
    // Demoted to a warning: the consuming platform trims trailing
    // whitespace itself these days, so the lint warns without blocking
    // conversion.
    Rule {
        name: "no_trailing_spaces",
        code: "e004",
        default_severity: Severity::Warning,
        check: no_trailing_spaces,
    },
    Rule {
        name: "compound_field_consistency",
        code: "e005",
        default_severity: Severity::Error,
        check: compound_field_consistency,
    },
    Rule {
        name: "compound_field_well_formed",
        code: "e006",
        default_severity: Severity::Error,
        check: compound_field_well_formed,
    },
];

/// The full rule catalog in registration order.
pub fn catalog() -> &'static [Rule] {
    &CATALOG
}

/// Finds a rule by name or short code, case-insensitively.
pub fn lookup(reference: &str) -> Option<&'static Rule> {
    CATALOG
        .iter()
        .find(|r| r.name.eq_ignore_ascii_case(reference) || r.code.eq_ignore_ascii_case(reference))
}

/// Runs every non-skipped rule against the schema and returns the
/// sorted findings.
pub fn check_schema(schema: &Schema, config: &SeverityConfig) -> Vec<Finding> {
    let mut findings = Vec::new();
    for rule in &CATALOG {
        if config.is_skipped(rule.code) {
            debug!(rule = rule.name, "lint skipped by configuration");
            continue;
        }
        let produced = (rule.check)(rule, schema);
        debug!(rule = rule.name, findings = produced.len(), "lint finished");
        findings.extend(produced);
    }
    sort_findings(&mut findings);
    findings
}

fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| match (&a.location, &b.location) {
        (Some(x), Some(y)) => x.cmp(y).then_with(|| a.code.cmp(b.code)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.code.cmp(b.code),
    });
}

fn location_list(locations: &[Option<Location>]) -> String {
    locations
        .iter()
        .map(|loc| match loc {
            Some(loc) => loc.to_string(),
            None => "unknown location".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// True for datasetField records acting as compound parents. Dataverse
/// marks those with `fieldType: none`.
fn is_compound_parent(record: &Record) -> bool {
    record
        .text("fieldType")
        .map(|t| t.eq_ignore_ascii_case("none"))
        .unwrap_or(false)
}

/// The record's declared parent reference, if it declares a non-empty
/// one.
fn parent_of(record: &Record) -> Option<&str> {
    record
        .text("parent")
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

/// b001: the identifying key must be unique within its block.
fn unique_names(rule: &Rule, schema: &Schema) -> Vec<Finding> {
    let mut findings = Vec::new();
    for kind in [BlockKind::DatasetField, BlockKind::ControlledVocabulary] {
        let key = kind.identifying_key();
        let mut groups: Vec<(&str, Vec<Option<Location>>)> = Vec::new();
        for record in schema.records(kind) {
            if !record.from_mapping {
                continue;
            }
            let Some(value) = record.text(key) else {
                continue;
            };
            match groups.iter_mut().find(|(v, _)| *v == value) {
                Some((_, locations)) => locations.push(record.location.clone()),
                None => groups.push((value, vec![record.location.clone()])),
            }
        }
        for (value, locations) in groups {
            if locations.len() > 1 {
                findings.push(
                    rule.finding(format!(
                        "{key} '{value}' occurs {} times in block '{kind}' ({}). \
                         Values of '{key}' have to be unique.",
                        locations.len(),
                        location_list(&locations),
                    ))
                    .at(locations[0].clone()),
                );
            }
        }
    }
    findings
}

/// b002: every block value must be a sequence of mappings.
fn block_is_list(rule: &Rule, schema: &Schema) -> Vec<Finding> {
    let mut findings = Vec::new();
    for block in &schema.blocks {
        if !block.is_list {
            findings.push(
                rule.finding(format!("Block '{}' is not a list of entries.", block.kind))
                    .at(block.location.clone()),
            );
            continue;
        }
        for (index, record) in block.records.iter().enumerate() {
            if !record.from_mapping {
                findings.push(
                    rule.finding(format!(
                        "Entry {} in block '{}' is not a mapping of keys to values.",
                        index + 1,
                        block.kind
                    ))
                    .at(record.location.clone()),
                );
            }
        }
    }
    findings
}

/// b003: titles must be unique across datasetField records, except
/// within one compound-field group.
fn unique_title(rule: &Rule, schema: &Schema) -> Vec<Finding> {
    struct Group<'a> {
        title: &'a str,
        parents: Vec<Option<&'a str>>,
        locations: Vec<Option<Location>>,
    }

    let mut groups: Vec<Group<'_>> = Vec::new();
    for record in schema.records(BlockKind::DatasetField) {
        if !record.from_mapping {
            continue;
        }
        let Some(title) = record.text("title") else {
            continue;
        };
        let parent = parent_of(record);
        match groups.iter_mut().find(|g| g.title == title) {
            Some(group) => {
                group.parents.push(parent);
                group.locations.push(record.location.clone());
            }
            None => groups.push(Group {
                title,
                parents: vec![parent],
                locations: vec![record.location.clone()],
            }),
        }
    }

    let mut findings = Vec::new();
    for group in groups {
        if group.locations.len() < 2 {
            continue;
        }
        // Duplicate titles are fine when all carriers sit in the same
        // compound-field group.
        let shared_parent =
            group.parents[0].is_some() && group.parents.iter().all(|p| *p == group.parents[0]);
        if shared_parent {
            continue;
        }
        findings.push(
            rule.finding(format!(
                "Title '{}' occurs {} times in block 'datasetField' ({}). \
                 Titles have to be unique unless the fields share a compound parent.",
                group.title,
                group.locations.len(),
                location_list(&group.locations),
            ))
            .at(group.locations[0].clone()),
        );
    }
    findings
}

/// k001: the three block keywords must be present and correctly
/// spelled; typos get a nearest-match suggestion.
fn keywords_valid(rule: &Rule, schema: &Schema) -> Vec<Finding> {
    let valid: Vec<&str> = BlockKind::ALL.iter().map(|k| k.keyword()).collect();
    let mut findings = Vec::new();

    for (keyword, location) in &schema.keywords {
        if BlockKind::from_keyword(keyword).is_some() {
            continue;
        }
        let mut finding = rule
            .finding(format!("Invalid keyword '{keyword}'."))
            .at(location.clone());
        finding = match suggest::nearest(keyword, valid.iter().copied()) {
            Some(best) => finding.suggest(format!("did you mean '{best}'?")),
            None => finding.suggest(format!("valid keywords are: {}", valid.join(", "))),
        };
        findings.push(finding);
    }

    for kind in BlockKind::ALL {
        if schema.block(kind).is_none() {
            findings.push(rule.finding(format!(
                "Missing required keyword '{}'.",
                kind.keyword()
            )));
        }
    }
    findings
}

/// k002: each top-level keyword occurs at most once.
fn keywords_unique(rule: &Rule, schema: &Schema) -> Vec<Finding> {
    let mut groups: Vec<(&str, Vec<Option<Location>>)> = Vec::new();
    for (keyword, location) in &schema.keywords {
        match groups.iter_mut().find(|(k, _)| *k == keyword) {
            Some((_, locations)) => locations.push(location.clone()),
            None => groups.push((keyword, vec![location.clone()])),
        }
    }

    let mut findings = Vec::new();
    for (keyword, locations) in groups {
        if locations.len() > 1 {
            findings.push(
                rule.finding(format!(
                    "Top-level keyword '{keyword}' occurs {} times ({}). \
                     Keywords may only be declared once.",
                    locations.len(),
                    location_list(&locations),
                ))
                .at(locations[0].clone()),
            );
        }
    }
    findings
}

/// e001: all keys of a record must come from the known key set for its
/// block kind.
fn keys_valid(rule: &Rule, schema: &Schema) -> Vec<Finding> {
    let mut findings = Vec::new();
    for block in &schema.blocks {
        let allowed = block.kind.columns();
        for record in &block.records {
            if !record.from_mapping {
                continue;
            }
            for (key, node) in &record.fields {
                if allowed.contains(&key.as_str()) {
                    continue;
                }
                let name = record.display_name(block.kind);
                let mut finding = rule
                    .finding(format!(
                        "Invalid key '{key}' for '{name}' in block '{}'.",
                        block.kind
                    ))
                    .at(node.location.clone());
                if let Some(best) = suggest::nearest(key, allowed.iter().copied()) {
                    finding = finding.suggest(format!("did you mean '{best}'?"));
                }
                findings.push(finding);
            }
        }
    }
    findings
}

/// e002: all required keys for the block kind must be present. A key
/// that is present but empty does not trigger this rule.
fn required_keys_present(rule: &Rule, schema: &Schema) -> Vec<Finding> {
    let mut findings = Vec::new();
    for block in &schema.blocks {
        for record in &block.records {
            if !record.from_mapping {
                continue;
            }
            let missing: Vec<&str> = block
                .kind
                .required_keys()
                .iter()
                .copied()
                .filter(|key| record.get(key).is_none())
                .collect();
            if missing.is_empty() {
                continue;
            }
            let name = record.display_name(block.kind);
            findings.push(
                rule.finding(format!(
                    "Missing keys '{}' for '{name}' in block '{}'.",
                    missing.join("', '"),
                    block.kind
                ))
                .at(record.location.clone()),
            );
        }
    }
    findings
}

/// e003: record values must be scalars; nested mappings and sequences
/// are rejected. The sanctioned compound-field nesting is expressed
/// through flat `parent` references, so it never trips this rule.
fn no_substructures(rule: &Rule, schema: &Schema) -> Vec<Finding> {
    let mut findings = Vec::new();
    for block in &schema.blocks {
        for record in &block.records {
            if !record.from_mapping {
                continue;
            }
            for (key, node) in &record.fields {
                let shape = match &node.value {
                    Value::Scalar(_) => continue,
                    Value::Sequence(_) => "sequence",
                    Value::Mapping(_) => "mapping",
                };
                let name = record.display_name(block.kind);
                findings.push(
                    rule.finding(format!(
                        "Key '{key}' of '{name}' in block '{}' holds a nested {shape}. \
                         Only scalar values are allowed here.",
                        block.kind
                    ))
                    .at(node.location.clone()),
                );
            }
        }
    }
    findings
}

/// e004: scalar string values must not end in whitespace.
fn no_trailing_spaces(rule: &Rule, schema: &Schema) -> Vec<Finding> {
    let mut findings = Vec::new();
    for block in &schema.blocks {
        for record in &block.records {
            if !record.from_mapping {
                continue;
            }
            for (key, node) in &record.fields {
                let Some(text) = node.as_scalar().and_then(|s| s.as_text()) else {
                    continue;
                };
                let trimmed = text.trim_end();
                if trimmed.len() == text.len() {
                    continue;
                }
                findings.push(
                    rule.finding(format!(
                        "The value '{text}' of key '{key}' in block '{}' has trailing whitespace.",
                        block.kind
                    ))
                    .suggest(format!("trim to '{trimmed}'"))
                    .at(node.location.clone()),
                );
            }
        }
    }
    findings
}

/// e005: a field declaring a parent must reference an existing
/// datasetField that is itself a compound field.
fn compound_field_consistency(rule: &Rule, schema: &Schema) -> Vec<Finding> {
    let fields = schema.records(BlockKind::DatasetField);
    let mut findings = Vec::new();
    for record in fields {
        if !record.from_mapping {
            continue;
        }
        let Some(parent) = parent_of(record) else {
            continue;
        };
        let name = record.display_name(BlockKind::DatasetField);
        let location = record
            .get("parent")
            .and_then(|n| n.location.clone())
            .or_else(|| record.location.clone());
        match fields
            .iter()
            .find(|r| r.from_mapping && r.text("name") == Some(parent))
        {
            None => findings.push(
                rule.finding(format!(
                    "Field '{name}' references parent '{parent}', \
                     which is not declared in block 'datasetField'."
                ))
                .at(location),
            ),
            Some(declared) if !is_compound_parent(declared) => findings.push(
                rule.finding(format!(
                    "Field '{name}' references parent '{parent}', \
                     which is not a compound field (its fieldType is not 'none')."
                ))
                .at(location),
            ),
            Some(_) => {}
        }
    }
    findings
}

/// e006: every compound parent must have at least one child and must
/// not itself declare a parent; one level of nesting is the limit.
fn compound_field_well_formed(rule: &Rule, schema: &Schema) -> Vec<Finding> {
    let fields = schema.records(BlockKind::DatasetField);
    let mut findings = Vec::new();
    for record in fields {
        if !record.from_mapping || !is_compound_parent(record) {
            continue;
        }
        let Some(name) = record.text("name") else {
            continue;
        };
        if parent_of(record).is_some() {
            let location = record
                .get("parent")
                .and_then(|n| n.location.clone())
                .or_else(|| record.location.clone());
            findings.push(
                rule.finding(format!(
                    "Compound field '{name}' must not declare a parent of its own. \
                     Only one level of nesting is supported."
                ))
                .at(location),
            );
        }
        let has_children = fields
            .iter()
            .any(|r| r.from_mapping && parent_of(r) == Some(name));
        if !has_children {
            findings.push(
                rule.finding(format!("Compound field '{name}' declares no child fields."))
                    .at(record.location.clone()),
            );
        }
    }
    findings
}
