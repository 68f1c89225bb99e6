//! Error types with fix suggestions
//!
//! `BindError` covers caller bugs and setup failures. Defects in a binding
//! definition are never errors: they are recorded as diagnostics in the
//! [`Report`](crate::report::Report).

use thiserror::Error;

use crate::context::Phase;
use crate::tree::NodeId;

pub type Result<T> = std::result::Result<T, BindError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    // ─────────────────────────────────────────────────────────────
    // Contract violations (programming errors)
    // ─────────────────────────────────────────────────────────────
    #[error("BIND-001: '{field}' read before {phase} completed")]
    Unresolved { field: &'static str, phase: Phase },

    #[error("BIND-002: operation '{operation}' is not supported on a read-only sequence")]
    UnsupportedOperation { operation: &'static str },

    #[error("BIND-003: node {node} does not exist in this tree")]
    UnknownNode { node: NodeId },

    #[error("BIND-004: node {node} is borrowed by a running hook")]
    NodeBusy { node: NodeId },

    #[error("BIND-005: tree already has a root component")]
    RootExists,

    #[error("BIND-006: index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    // ─────────────────────────────────────────────────────────────
    // Setup errors (config, fixtures); diagnostics never use BIND-08x
    // ─────────────────────────────────────────────────────────────
    #[error("BIND-080: invalid configuration: {reason}")]
    Config { reason: String },

    #[error("BIND-081: invalid definition fixture: {reason}")]
    Definition { reason: String },

    #[error("BIND-082: invalid type registry: {reason}")]
    TypeRegistry { reason: String },
}

impl FixSuggestion for BindError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BindError::Unresolved { .. } => {
                Some("Only read phase-scoped state after the owning phase has run")
            }
            BindError::UnsupportedOperation { .. } => {
                Some("Allocate a Vec instead of mutating the shared empty list")
            }
            BindError::UnknownNode { .. } => Some("Use node ids returned by this tree's builder"),
            BindError::NodeBusy { .. } => {
                Some("Read the running node through `self`, not through the tree view")
            }
            BindError::RootExists => Some("Attach further components with BindingTree::add_child"),
            BindError::IndexOutOfBounds { .. } => Some("Insert at an index no larger than len()"),
            BindError::Config { .. } => Some("Check the TOML keys and severity names"),
            BindError::Definition { .. } => Some("Check the YAML `kind:` tags and field names"),
            BindError::TypeRegistry { .. } => {
                Some("Check type names and that every supertype is declared")
            }
        }
    }
}
