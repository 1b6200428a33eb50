//! Core model, lint rules, and TSV emission for Dataverse metadata
//! blocks.
//!
//! This crate defines the source-independent document model and
//! everything that operates on it:
//!
//! - [`Schema`] — a normalized metadata-block document: up to three
//!   [`Block`]s ([`BlockKind`]) holding [`Record`]s of located,
//!   quoting-aware [`Scalar`] values.
//! - [`normalize`] — folds a parsed [`Node`] tree into a [`Schema`].
//! - [`check_schema`] — runs the lint rule catalog and returns
//!   [`Finding`]s sorted by position.
//! - [`Outcome`] — findings with their effective severities applied,
//!   plus the overall pass/warn/fail state.
//! - [`emit`] — renders a clean schema as canonical TSV, refusing when
//!   error findings remain.
//!
//! Severity overrides come in through [`Overrides`] and resolve to a
//! [`SeverityConfig`]; conflicting or unknown rule references fail
//! with a [`ConfigError`] before any checking starts.
//!
//! # Example
//!
//! ```
//! use mdblock_core::*;
//!
//! let schema = Schema::default();
//! let config = SeverityConfig::resolve(&Overrides::default()).unwrap();
//! let findings = check_schema(&schema, &config);
//!
//! // An empty document is missing all three block keywords.
//! assert_eq!(findings.len(), 3);
//! let outcome = Outcome::resolve(findings, &config);
//! assert_eq!(outcome.state(), OutcomeState::Fail);
//! ```

mod emit;
mod finding;
mod model;
mod normalize;
mod rules;
mod severity;
mod suggest;

pub use emit::{EmitError, emit};
pub use finding::{EffectiveFinding, Finding, Outcome, OutcomeState};
pub use model::*;
pub use normalize::normalize;
pub use rules::{Rule, catalog, check_schema, lookup};
pub use severity::{ConfigError, Overrides, Severity, SeverityConfig};
