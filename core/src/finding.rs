//! Findings, effective-severity resolution, and run outcomes.
//!
//! Findings are plain data: rule checks create them, the severity
//! resolver reclassifies them, and nothing in the core ever throws one.
//! The [`Outcome`] is computed once at the end of a validation run and
//! drives both reporting and whether emission may proceed.

use std::fmt;

use serde::Serialize;

use crate::model::Location;
use crate::severity::{Severity, SeverityConfig};

/// A single reported issue with its declared (pre-override) severity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub rule: &'static str,
    pub code: &'static str,
    /// Severity declared by the rule, before user overrides.
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Finding {
    pub fn new(
        rule: &'static str,
        code: &'static str,
        severity: Severity,
        message: impl Into<String>,
    ) -> Finding {
        Finding {
            rule,
            code,
            severity,
            message: message.into(),
            suggestion: None,
            location: None,
        }
    }

    /// Attaches a best-effort location.
    pub fn at(mut self, location: Option<Location>) -> Finding {
        self.location = location;
        self
    }

    /// Attaches a suggested fix.
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Finding {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// A finding paired with its effective severity for the current run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveFinding {
    #[serde(flatten)]
    pub finding: Finding,
    /// Severity after applying the run's overrides.
    pub effective: Severity,
}

impl fmt::Display for EffectiveFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.effective)?;
        if let Some(location) = &self.finding.location {
            write!(f, "{location} ")?;
        }
        write!(
            f,
            "{} ({}): {}",
            self.finding.rule, self.finding.code, self.finding.message
        )?;
        if let Some(suggestion) = &self.finding.suggestion {
            write!(f, "\n    suggestion: {suggestion}")?;
        }
        Ok(())
    }
}

/// Terminal state of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeState {
    Pass,
    PassWithWarnings,
    Fail,
}

impl fmt::Display for OutcomeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeState::Pass => f.write_str("PASS"),
            OutcomeState::PassWithWarnings => f.write_str("PASS_WITH_WARNINGS"),
            OutcomeState::Fail => f.write_str("FAIL"),
        }
    }
}

/// All findings of a run with effective severities applied, in the
/// rule engine's deterministic order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Outcome {
    pub findings: Vec<EffectiveFinding>,
}

impl Outcome {
    /// Applies the run's severity overrides to a list of findings.
    ///
    /// Skipped rules never produced findings in the first place, so
    /// only warn/error promotion is applied here.
    pub fn resolve(findings: Vec<Finding>, config: &SeverityConfig) -> Outcome {
        let findings = findings
            .into_iter()
            .map(|finding| {
                let effective = config.effective(finding.code, finding.severity);
                EffectiveFinding { finding, effective }
            })
            .collect();
        Outcome { findings }
    }

    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.effective == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.effective == Severity::Warning)
            .count()
    }

    pub fn state(&self) -> OutcomeState {
        if self.error_count() > 0 {
            OutcomeState::Fail
        } else if self.warning_count() > 0 {
            OutcomeState::PassWithWarnings
        } else {
            OutcomeState::Pass
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Overrides;

    fn warning_finding() -> Finding {
        Finding::new(
            "no_trailing_spaces",
            "e004",
            Severity::Warning,
            "The value 'x ' has trailing whitespace.",
        )
    }

    #[test]
    fn test_outcome_state_partitions() {
        let config = SeverityConfig::default();
        let outcome = Outcome::resolve(vec![], &config);
        assert_eq!(outcome.state(), OutcomeState::Pass);

        let outcome = Outcome::resolve(vec![warning_finding()], &config);
        assert_eq!(outcome.state(), OutcomeState::PassWithWarnings);
        assert_eq!(outcome.warning_count(), 1);

        let error = Finding::new("unique_names", "b001", Severity::Error, "dup");
        let outcome = Outcome::resolve(vec![error], &config);
        assert_eq!(outcome.state(), OutcomeState::Fail);
    }

    #[test]
    fn test_resolve_applies_error_promotion() {
        let overrides = Overrides {
            error: vec!["e004".to_string()],
            ..Overrides::default()
        };
        let config = SeverityConfig::resolve(&overrides).unwrap();
        let outcome = Outcome::resolve(vec![warning_finding()], &config);
        assert_eq!(outcome.state(), OutcomeState::Fail);
        // Declared severity stays untouched.
        assert_eq!(outcome.findings[0].finding.severity, Severity::Warning);
        assert_eq!(outcome.findings[0].effective, Severity::Error);
    }

    #[test]
    fn test_display_renders_location_and_suggestion() {
        let finding = warning_finding()
            .at(Some(Location::at(3, 5)))
            .suggest("trim to 'x'");
        let rendered = EffectiveFinding {
            finding,
            effective: Severity::Warning,
        }
        .to_string();
        assert!(rendered.starts_with("[WARNING] line 3 column 5 no_trailing_spaces (e004):"));
        assert!(rendered.contains("suggestion: trim to 'x'"));
    }

    #[test]
    fn test_display_omits_unknown_location() {
        let rendered = EffectiveFinding {
            finding: warning_finding(),
            effective: Severity::Warning,
        }
        .to_string();
        assert!(rendered.starts_with("[WARNING] no_trailing_spaces (e004):"));
    }

    #[test]
    fn test_finding_serializes_with_effective_severity() {
        let outcome = Outcome::resolve(vec![warning_finding()], &SeverityConfig::default());
        let json = serde_json::to_value(&outcome).unwrap();
        let entry = &json["findings"][0];
        assert_eq!(entry["code"], "e004");
        assert_eq!(entry["severity"], "warning");
        assert_eq!(entry["effective"], "warning");
    }
}
