//! Result of one validation run

use serde::Serialize;

use crate::context::Phase;
use crate::diagnostic::{Diagnostic, Severity};
use crate::tree::NodeId;

/// Validity verdict plus every diagnostic in recording order
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub valid: bool,
    pub node_count: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Diagnostic counts per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub warnings: usize,
    pub errors: usize,
    pub fatal: usize,
}

impl Report {
    pub fn new(node_count: usize, diagnostics: Vec<Diagnostic>) -> Self {
        let valid = !diagnostics.iter().any(Diagnostic::is_fatal);
        Self {
            valid,
            node_count,
            diagnostics,
        }
    }

    /// No fatal diagnostic in either phase
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.severity == severity)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Error)
    }

    pub fn fatal(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Fatal)
    }

    /// Warnings and errors: defects that did not abort anything
    pub fn recoverable(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_fatal())
    }

    pub fn in_phase(&self, phase: Phase) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.phase == phase)
    }

    pub fn for_node(&self, node: NodeId) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.node == node)
    }

    /// Stable codes of all diagnostics, e.g. for test assertions
    pub fn codes(&self) -> Vec<&'static str> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for diagnostic in &self.diagnostics {
            match diagnostic.severity {
                Severity::Warning => summary.warnings += 1,
                Severity::Error => summary.errors += 1,
                Severity::Fatal => summary.fatal += 1,
            }
        }
        summary
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let summary = self.summary();
        writeln!(
            f,
            "{} ({} nodes): {} fatal, {} errors, {} warnings",
            if self.valid { "valid" } else { "invalid" },
            self.node_count,
            summary.fatal,
            summary.errors,
            summary.warnings
        )?;
        for diagnostic in &self.diagnostics {
            writeln!(f, "  {}", diagnostic)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;
    use pretty_assertions::assert_eq;

    fn diag(node: usize, phase: Phase, severity: Severity, kind: DiagnosticKind) -> Diagnostic {
        Diagnostic::new(NodeId(node), format!("binding/#{node}"), phase, severity, kind)
    }

    fn sample() -> Report {
        Report::new(
            4,
            vec![
                diag(1, Phase::Prevalidate, Severity::Error, DiagnosticKind::MissingProperty),
                diag(2, Phase::Prevalidate, Severity::Fatal, DiagnosticKind::MissingClass),
                diag(3, Phase::Validate, Severity::Warning, DiagnosticKind::EmptyStructure),
            ],
        )
    }

    #[test]
    fn fatal_makes_report_invalid() {
        let report = sample();
        assert!(!report.is_valid());
        assert_eq!(
            report.summary(),
            Summary {
                warnings: 1,
                errors: 1,
                fatal: 1
            }
        );
        assert_eq!(report.recoverable().count(), 2);
        assert!(report.has_warnings());
        assert!(report.has_errors());
    }

    #[test]
    fn errors_alone_keep_report_valid() {
        let report = Report::new(
            2,
            vec![diag(1, Phase::Validate, Severity::Error, DiagnosticKind::MixedContent)],
        );
        assert!(report.is_valid());
        assert_eq!(report.codes(), vec!["BIND-034"]);
    }

    #[test]
    fn filters_by_phase_and_node() {
        let report = sample();
        assert_eq!(report.in_phase(Phase::Prevalidate).count(), 2);
        assert_eq!(report.in_phase(Phase::Validate).count(), 1);
        assert_eq!(report.for_node(NodeId(2)).count(), 1);
        assert_eq!(report.for_node(NodeId(0)).count(), 0);
    }

    #[test]
    fn serializes_to_json() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["valid"], serde_json::json!(false));
        assert_eq!(value["node_count"], serde_json::json!(4));
        assert_eq!(value["diagnostics"][1]["code"], serde_json::json!("BIND-019"));
        assert_eq!(value["diagnostics"][1]["severity"], serde_json::json!("fatal"));
    }

    #[test]
    fn contract_violation_json_has_one_message() {
        let report = Report::new(
            1,
            vec![diag(
                0,
                Phase::Validate,
                Severity::Fatal,
                DiagnosticKind::ContractViolation {
                    detail: "inner".to_string(),
                },
            )],
        );
        let json = report.to_json().unwrap();
        assert_eq!(json.matches("\"message\"").count(), 1);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let diagnostic = &value["diagnostics"][0];
        assert_eq!(diagnostic["code"], serde_json::json!("BIND-090"));
        assert_eq!(diagnostic["kind"], serde_json::json!("contract_violation"));
        assert_eq!(diagnostic["detail"], serde_json::json!("inner"));
        assert_eq!(
            diagnostic["message"],
            serde_json::json!("[BIND-090] Contract violation: inner")
        );
    }

    #[test]
    fn display_lists_diagnostics() {
        let text = sample().to_string();
        assert!(text.starts_with("invalid (4 nodes): 1 fatal, 1 errors, 1 warnings"));
        assert_eq!(text.lines().count(), 4);
    }
}
