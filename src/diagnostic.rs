//! Diagnostic types
//!
//! Structured findings for both validation phases, designed for
//! helpful messages with suggestions. Each kind carries a stable
//! `BIND-0xx` code so tooling can match on it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::Phase;
use crate::error::FixSuggestion;
use crate::tree::NodeId;

/// Severity of a diagnostic
///
/// `Warning` and `Error` are recoverable: traversal continues and the run can
/// still be valid. `Fatal` aborts the affected node (and in phase 1, its subtree)
/// and makes the run invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub fn is_fatal(self) -> bool {
        matches!(self, Severity::Fatal)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Fatal => write!(f, "fatal"),
        }
    }
}

/// What is wrong with a component
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    // ─────────────────────────────────────────────────────────────
    // Phase 1: local configuration (BIND-010 to BIND-029)
    // ─────────────────────────────────────────────────────────────
    #[error("[BIND-010] Invalid {attribute} '{value}' (expected one of: {})", .allowed.join(", "))]
    InvalidOption {
        attribute: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },

    #[error("[BIND-011] Type '{type_name}' cannot be resolved")]
    UnresolvedType { type_name: String },

    #[error("[BIND-012] Malformed type name '{type_name}'")]
    MalformedTypeName { type_name: String },

    #[error("[BIND-013] '{name}' is not a valid XML name")]
    InvalidName { name: String },

    #[error("[BIND-014] A value with style '{style}' requires a name")]
    MissingName { style: String },

    #[error("[BIND-015] A value with style '{style}' cannot have a name (found '{name}')")]
    UnexpectedName { name: String, style: String },

    #[error("[BIND-016] Type '{type_name}' is not a simple value type")]
    NonSimpleValueType { type_name: String },

    #[error("[BIND-017] Value has neither a property nor a constant")]
    MissingProperty,

    #[error("[BIND-018] Type '{type_name}' is not a collection type")]
    NotACollection { type_name: String },

    #[error("[BIND-019] Mapping does not declare a class")]
    MissingClass,

    #[error("[BIND-020] Structure with a property needs a type or a map-as reference")]
    MissingType,

    #[error("[BIND-021] Concrete mapping for '{class}' has no element name")]
    UnnamedConcreteMapping { class: String },

    // ─────────────────────────────────────────────────────────────
    // Phase 2: cross-references (BIND-030 to BIND-049)
    // ─────────────────────────────────────────────────────────────
    #[error("[BIND-030] Name '{name}' is already used in namespace {}", .namespace.as_deref().map(|ns| format!("'{ns}'")).unwrap_or_else(|| "(none)".to_string()))]
    NameCollision {
        name: String,
        namespace: Option<String>,
    },

    #[error("[BIND-031] No mapping named '{reference}'")]
    UnknownMapping { reference: String },

    #[error("[BIND-032] Type '{found}' is not assignable to '{expected}'")]
    IncompatibleType { expected: String, found: String },

    #[error("[BIND-033] Item of type '{found}' does not fit collection item type '{item_type}'")]
    IncompatibleItemType { item_type: String, found: String },

    #[error("[BIND-034] Text content cannot be mixed with element content")]
    MixedContent,

    #[error("[BIND-035] Identifier definition has no owning object")]
    IdentWithoutOwner,

    #[error("[BIND-036] Identifier reference to '{type_name}' has no mapping")]
    UnmappedReference { type_name: String },

    #[error("[BIND-037] Implicit component has no containing object")]
    ImplicitWithoutOwner,

    #[error("[BIND-038] Structure has no content")]
    EmptyStructure,

    #[error("[BIND-039] Mapping extends itself: {chain}")]
    CyclicExtends { chain: String },

    // ─────────────────────────────────────────────────────────────
    // Driver (BIND-090 to BIND-099)
    // ─────────────────────────────────────────────────────────────
    #[error("[BIND-090] Contract violation: {detail}")]
    ContractViolation { detail: String },

    #[error("[BIND-091] Scope stack depth {found} after visit, expected {expected}")]
    ScopeImbalance { expected: usize, found: usize },
}

impl DiagnosticKind {
    /// Stable code, e.g. `BIND-030`
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::InvalidOption { .. } => "BIND-010",
            DiagnosticKind::UnresolvedType { .. } => "BIND-011",
            DiagnosticKind::MalformedTypeName { .. } => "BIND-012",
            DiagnosticKind::InvalidName { .. } => "BIND-013",
            DiagnosticKind::MissingName { .. } => "BIND-014",
            DiagnosticKind::UnexpectedName { .. } => "BIND-015",
            DiagnosticKind::NonSimpleValueType { .. } => "BIND-016",
            DiagnosticKind::MissingProperty => "BIND-017",
            DiagnosticKind::NotACollection { .. } => "BIND-018",
            DiagnosticKind::MissingClass => "BIND-019",
            DiagnosticKind::MissingType => "BIND-020",
            DiagnosticKind::UnnamedConcreteMapping { .. } => "BIND-021",
            DiagnosticKind::NameCollision { .. } => "BIND-030",
            DiagnosticKind::UnknownMapping { .. } => "BIND-031",
            DiagnosticKind::IncompatibleType { .. } => "BIND-032",
            DiagnosticKind::IncompatibleItemType { .. } => "BIND-033",
            DiagnosticKind::MixedContent => "BIND-034",
            DiagnosticKind::IdentWithoutOwner => "BIND-035",
            DiagnosticKind::UnmappedReference { .. } => "BIND-036",
            DiagnosticKind::ImplicitWithoutOwner => "BIND-037",
            DiagnosticKind::EmptyStructure => "BIND-038",
            DiagnosticKind::CyclicExtends { .. } => "BIND-039",
            DiagnosticKind::ContractViolation { .. } => "BIND-090",
            DiagnosticKind::ScopeImbalance { .. } => "BIND-091",
        }
    }
}

impl FixSuggestion for DiagnosticKind {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            DiagnosticKind::InvalidOption { .. } => Some("Use one of the listed values"),
            DiagnosticKind::UnresolvedType { .. } => {
                Some("Check the fully qualified class name and the type registry")
            }
            DiagnosticKind::MalformedTypeName { .. } => {
                Some("Use a dotted identifier such as com.example.Order")
            }
            DiagnosticKind::InvalidName { .. } => {
                Some("Names start with a letter or underscore and contain no ':' or spaces")
            }
            DiagnosticKind::MissingName { .. } => Some("Add a name or use style: text"),
            DiagnosticKind::UnexpectedName { .. } => Some("Remove the name or use style: element"),
            DiagnosticKind::NonSimpleValueType { .. } => {
                Some("Bind object types with a structure or mapping instead of a value")
            }
            DiagnosticKind::MissingProperty => Some("Add a property or a constant"),
            DiagnosticKind::NotACollection { .. } => {
                Some("Declare a collection or array type for the collection")
            }
            DiagnosticKind::MissingClass => Some("Every mapping needs a class"),
            DiagnosticKind::MissingType => Some("Add type: or map-as: to the structure"),
            DiagnosticKind::UnnamedConcreteMapping { .. } => {
                Some("Give the mapping a name or mark it abstract")
            }
            DiagnosticKind::NameCollision { .. } => {
                Some("Rename one of the components or give it a different namespace")
            }
            DiagnosticKind::UnknownMapping { .. } => Some("Declare the referenced mapping"),
            DiagnosticKind::IncompatibleType { .. } => {
                Some("Reference a mapping whose class extends the declared type")
            }
            DiagnosticKind::IncompatibleItemType { .. } => {
                Some("Use an item type the collection accepts")
            }
            DiagnosticKind::MixedContent => {
                Some("Move text values into their own structure or drop the child elements")
            }
            DiagnosticKind::IdentWithoutOwner => {
                Some("Place identifier definitions inside a mapping or typed structure")
            }
            DiagnosticKind::UnmappedReference { .. } => {
                Some("Add a mapping for the referenced type")
            }
            DiagnosticKind::ImplicitWithoutOwner => {
                Some("Add a property or nest the component in a typed container")
            }
            DiagnosticKind::EmptyStructure => Some("Add children or a map-as reference"),
            DiagnosticKind::CyclicExtends { .. } => {
                Some("Extend a different mapping or drop the extends reference")
            }
            DiagnosticKind::ContractViolation { .. } | DiagnosticKind::ScopeImbalance { .. } => {
                None
            }
        }
    }
}

/// A diagnostic attributed to one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub node: NodeId,
    /// Human-readable location, e.g. `binding/mapping[order]/value[id]`
    pub path: String,
    pub phase: Phase,
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(
        node: NodeId,
        path: impl Into<String>,
        phase: Phase,
        severity: Severity,
        kind: DiagnosticKind,
    ) -> Self {
        Self {
            node,
            path: path.into(),
            phase,
            severity,
            code: kind.code(),
            message: kind.to_string(),
            kind,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity.is_fatal()
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.kind.fix_suggestion()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {} ({}): {}", self.severity, self.path, self.phase, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_display() {
        assert_eq!(format!("{}", Severity::Warning), "warning");
        assert_eq!(format!("{}", Severity::Fatal), "fatal");
    }

    #[test]
    fn only_fatal_is_fatal() {
        assert!(Severity::Fatal.is_fatal());
        assert!(!Severity::Error.is_fatal());
        assert!(!Severity::Warning.is_fatal());
    }

    #[test]
    fn invalid_option_lists_allowed_values() {
        let kind = DiagnosticKind::InvalidOption {
            attribute: "style",
            value: "blob".to_string(),
            allowed: &["attribute", "element"],
        };
        let msg = kind.to_string();
        assert!(msg.starts_with("[BIND-010]"));
        assert!(msg.contains("'blob'"));
        assert!(msg.contains("attribute, element"));
    }

    #[test]
    fn name_collision_without_namespace() {
        let kind = DiagnosticKind::NameCollision {
            name: "id".to_string(),
            namespace: None,
        };
        assert!(kind.to_string().contains("(none)"));
        assert_eq!(kind.code(), "BIND-030");

        let kind = DiagnosticKind::NameCollision {
            name: "id".to_string(),
            namespace: Some("urn:a".to_string()),
        };
        assert!(kind.to_string().contains("'urn:a'"));
    }

    #[test]
    fn diagnostic_carries_code_and_message() {
        let diag = Diagnostic::new(
            NodeId(3),
            "binding/mapping[order]",
            Phase::Validate,
            Severity::Error,
            DiagnosticKind::UnknownMapping {
                reference: "customer".to_string(),
            },
        );
        assert_eq!(diag.code, "BIND-031");
        assert!(diag.message.contains("customer"));
        assert!(!diag.is_fatal());
        assert_eq!(diag.suggestion(), Some("Declare the referenced mapping"));
        assert!(diag.to_string().starts_with("error at binding/mapping[order]"));
    }

    #[test]
    fn diagnostic_serializes_flat() {
        let diag = Diagnostic::new(
            NodeId(1),
            "binding",
            Phase::Prevalidate,
            Severity::Fatal,
            DiagnosticKind::MissingClass,
        );
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["code"], "BIND-019");
        assert_eq!(json["severity"], "fatal");
        assert_eq!(json["phase"], "prevalidate");
        assert_eq!(json["kind"], "missing_class");
    }
}
