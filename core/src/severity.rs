//! Severity levels and per-run override resolution.
//!
//! Users can skip rules, demote them to warnings, or promote them to
//! errors, referencing a rule by name or short code (case-insensitive).
//! Resolution happens once, before any document is read; unknown
//! references and warn/error conflicts are configuration errors, never
//! findings.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::rules;

/// Severity of a finding. `Error` orders above `Warning` so the worst
/// severity of a run can be taken with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("WARNING"),
            Severity::Error => f.write_str("ERROR"),
        }
    }
}

/// Raw user-supplied override lists, as collected by the CLI.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Rules removed from the run entirely.
    pub skip: Vec<String>,
    /// Rules forced to warning severity.
    pub warn: Vec<String>,
    /// Rules forced to error severity.
    pub error: Vec<String>,
}

/// Configuration errors detected while resolving overrides.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An override referenced a rule that does not exist.
    #[error("unknown rule name or code '{0}'")]
    UnknownRule(String),
    /// The same rule was listed in both the warn and error sets.
    #[error("rule '{0}' is listed in both the warn and error overrides")]
    ConflictingOverride(String),
}

/// Resolved effective-severity configuration for one run.
#[derive(Debug, Clone, Default)]
pub struct SeverityConfig {
    skipped: HashSet<&'static str>,
    forced: HashMap<&'static str, Severity>,
}

impl SeverityConfig {
    /// Resolves user overrides against the rule catalog.
    ///
    /// `skip` takes precedence over `warn` and `error` for the same
    /// rule. Referencing a rule in both `warn` and `error` — by any
    /// mix of name and code — is a [`ConfigError::ConflictingOverride`].
    pub fn resolve(overrides: &Overrides) -> Result<SeverityConfig, ConfigError> {
        let mut config = SeverityConfig::default();

        for reference in &overrides.skip {
            let rule = Self::lookup(reference)?;
            config.skipped.insert(rule.code);
        }

        let mut warned: HashSet<&'static str> = HashSet::new();
        for reference in &overrides.warn {
            let rule = Self::lookup(reference)?;
            warned.insert(rule.code);
            if !config.skipped.contains(rule.code) {
                config.forced.insert(rule.code, Severity::Warning);
            }
        }

        for reference in &overrides.error {
            let rule = Self::lookup(reference)?;
            if warned.contains(rule.code) {
                return Err(ConfigError::ConflictingOverride(rule.name.to_string()));
            }
            if !config.skipped.contains(rule.code) {
                config.forced.insert(rule.code, Severity::Error);
            }
        }

        Ok(config)
    }

    fn lookup(reference: &str) -> Result<&'static rules::Rule, ConfigError> {
        rules::lookup(reference).ok_or_else(|| ConfigError::UnknownRule(reference.to_string()))
    }

    pub fn is_skipped(&self, code: &str) -> bool {
        self.skipped.contains(code)
    }

    /// Effective severity of a finding emitted by the rule with the
    /// given code, given its declared severity.
    pub fn effective(&self, code: &str, declared: Severity) -> Severity {
        self.forced.get(code).copied().unwrap_or(declared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(skip: &[&str], warn: &[&str], error: &[&str]) -> Overrides {
        Overrides {
            skip: skip.iter().map(|s| s.to_string()).collect(),
            warn: warn.iter().map(|s| s.to_string()).collect(),
            error: error.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_resolve_empty_overrides() {
        let config = SeverityConfig::resolve(&Overrides::default()).unwrap();
        assert!(!config.is_skipped("e004"));
        assert_eq!(config.effective("e004", Severity::Warning), Severity::Warning);
    }

    #[test]
    fn test_resolve_accepts_name_and_code_case_insensitively() {
        let config =
            SeverityConfig::resolve(&overrides(&["No_Trailing_Spaces"], &[], &["B001"])).unwrap();
        assert!(config.is_skipped("e004"));
        assert_eq!(config.effective("b001", Severity::Warning), Severity::Error);
    }

    #[test]
    fn test_resolve_rejects_unknown_rule() {
        let err = SeverityConfig::resolve(&overrides(&["e999"], &[], &[])).unwrap_err();
        assert_eq!(err, ConfigError::UnknownRule("e999".to_string()));
    }

    #[test]
    fn test_resolve_rejects_warn_error_conflict_across_aliases() {
        // The same rule referenced by code in one set and name in the other.
        let err =
            SeverityConfig::resolve(&overrides(&[], &["e004"], &["no_trailing_spaces"]))
                .unwrap_err();
        assert_eq!(
            err,
            ConfigError::ConflictingOverride("no_trailing_spaces".to_string())
        );
    }

    #[test]
    fn test_skip_takes_precedence_over_warn() {
        let config = SeverityConfig::resolve(&overrides(&["b001"], &["b001"], &[])).unwrap();
        assert!(config.is_skipped("b001"));
        assert_eq!(config.effective("b001", Severity::Error), Severity::Error);
    }

    #[test]
    fn test_warn_demotes_error_rule() {
        let config = SeverityConfig::resolve(&overrides(&[], &["unique_names"], &[])).unwrap();
        assert_eq!(config.effective("b001", Severity::Error), Severity::Warning);
    }
}
