//! Validation context
//!
//! One `ValidationContext` exists per validation run. It carries:
//! - the diagnostic sink (both phases, in recording order)
//! - the fatal short-circuit for the node currently being visited
//! - the ambient scope stack (namespace in effect, enclosing type)
//!
//! Components read the scope but cannot change it: push and pop are
//! crate-private and only the driver calls them around a descent.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ValidationConfig;
use crate::diagnostic::{Diagnostic, DiagnosticKind, Severity};
use crate::tree::{BindingTree, NodeId};
use crate::types::{TypeInfo, TypeResolver};

/// Validation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Phase 1: each component checks its own configuration
    Prevalidate,
    /// Phase 2: each component checks its relationships to the tree
    Validate,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Prevalidate => write!(f, "prevalidate"),
            Phase::Validate => write!(f, "validate"),
        }
    }
}

/// Ambient state inherited by the children of one node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScopeFrame {
    /// Namespace in effect; `Some("")` is an explicit "no namespace"
    pub namespace: Option<String>,
    /// Object the children operate on
    pub enclosing_type: Option<TypeInfo>,
}

#[derive(Debug)]
struct Visit {
    node: NodeId,
    fatal: bool,
}

/// Traversal-scoped state shared by every hook of one run
pub struct ValidationContext<'a> {
    resolver: &'a dyn TypeResolver,
    config: &'a ValidationConfig,
    // Paths are only built for nodes that get a diagnostic
    tree: &'a BindingTree,
    phase: Phase,
    visit: Option<Visit>,
    diagnostics: Vec<Diagnostic>,
    scope: Vec<ScopeFrame>,
}

impl<'a> ValidationContext<'a> {
    pub(crate) fn new(
        resolver: &'a dyn TypeResolver,
        config: &'a ValidationConfig,
        tree: &'a BindingTree,
    ) -> Self {
        Self {
            resolver,
            config,
            tree,
            phase: Phase::Prevalidate,
            visit: None,
            diagnostics: Vec::new(),
            scope: Vec::new(),
        }
    }

    /// Type lookups for `prevalidate`, assignability checks for `validate`
    pub fn resolver(&self) -> &dyn TypeResolver {
        self.resolver
    }

    pub fn config(&self) -> &ValidationConfig {
        self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Node whose hook is running, if any
    pub fn current_node(&self) -> Option<NodeId> {
        self.visit.as_ref().map(|v| v.node)
    }

    // ─────────────────────────────────────────────────────────────
    // Diagnostics
    // ─────────────────────────────────────────────────────────────

    /// Record a diagnostic against the node currently being visited
    pub fn report(&mut self, severity: Severity, kind: DiagnosticKind) {
        let (node, path) = match self.visit.as_mut() {
            Some(visit) => {
                if severity.is_fatal() {
                    visit.fatal = true;
                }
                (visit.node, self.tree.path(visit.node))
            }
            // Driver-level diagnostics outside any hook are attributed to the root
            None => (NodeId::ROOT, String::from("<driver>")),
        };

        if severity.is_fatal() {
            warn!(node = %node, path = %path, code = kind.code(), "fatal diagnostic");
        } else {
            debug!(node = %node, path = %path, code = kind.code(), %severity, "diagnostic");
        }

        self.diagnostics
            .push(Diagnostic::new(node, path, self.phase, severity, kind));
    }

    pub fn warning(&mut self, kind: DiagnosticKind) {
        self.report(Severity::Warning, kind);
    }

    pub fn error(&mut self, kind: DiagnosticKind) {
        self.report(Severity::Error, kind);
    }

    pub fn fatal(&mut self, kind: DiagnosticKind) {
        self.report(Severity::Fatal, kind);
    }

    /// Whether the running hook has recorded a fatal diagnostic
    pub fn is_aborting(&self) -> bool {
        self.visit.as_ref().is_some_and(|v| v.fatal)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_fatal(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_fatal)
    }

    // ─────────────────────────────────────────────────────────────
    // Ambient scope
    // ─────────────────────────────────────────────────────────────

    /// Namespace inherited from the ancestors of the running node
    pub fn current_namespace(&self) -> Option<&str> {
        self.scope.last().and_then(|f| f.namespace.as_deref())
    }

    /// Object type inherited from the ancestors of the running node
    pub fn enclosing_type(&self) -> Option<&TypeInfo> {
        self.scope.last().and_then(|f| f.enclosing_type.as_ref())
    }

    /// Number of ancestors with a pushed frame; 0 for the root
    pub fn depth(&self) -> usize {
        self.scope.len()
    }

    /// Build the frame a node's children inherit
    pub(crate) fn child_frame(&self, uri: Option<&str>, own_type: Option<&TypeInfo>) -> ScopeFrame {
        ScopeFrame {
            namespace: uri.or(self.current_namespace()).map(str::to_string),
            enclosing_type: own_type.or(self.enclosing_type()).cloned(),
        }
    }

    pub(crate) fn push_scope(&mut self, frame: ScopeFrame) {
        self.scope.push(frame);
    }

    pub(crate) fn pop_scope(&mut self) -> Option<ScopeFrame> {
        self.scope.pop()
    }

    // ─────────────────────────────────────────────────────────────
    // Driver bookkeeping
    // ─────────────────────────────────────────────────────────────

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn enter(&mut self, node: NodeId) {
        self.visit = Some(Visit { node, fatal: false });
    }

    /// Finish a visit; returns true if the hook recorded a fatal diagnostic
    pub(crate) fn leave(&mut self) -> bool {
        self.visit.take().is_some_and(|v| v.fatal)
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{BindingComponent, MappingComponent, ValueComponent};
    use crate::types::StaticTypeResolver;

    /// `binding` > `mapping[order]` > `value[id]`, ids 0 to 2
    fn with_ctx(f: impl FnOnce(&mut ValidationContext<'_>)) {
        let resolver = StaticTypeResolver::new();
        let config = ValidationConfig::default();
        let mut tree = BindingTree::with_root(BindingComponent::new());
        let order = tree
            .add_child(NodeId::ROOT, MappingComponent::new("com.example.Order").named("order"))
            .unwrap();
        tree.add_child(order, ValueComponent::attribute("id")).unwrap();

        let mut ctx = ValidationContext::new(&resolver, &config, &tree);
        f(&mut ctx);
    }

    #[test]
    fn report_is_attributed_to_running_node() {
        with_ctx(|ctx| {
            ctx.enter(NodeId(2));
            ctx.error(DiagnosticKind::MissingProperty);
            assert!(!ctx.is_aborting());
            assert!(!ctx.leave());

            let diag = &ctx.diagnostics()[0];
            assert_eq!(diag.node, NodeId(2));
            assert_eq!(diag.path, "binding/mapping[order]/value[id]");
            assert_eq!(diag.phase, Phase::Prevalidate);
        });
    }

    #[test]
    fn report_outside_a_visit_goes_to_the_driver() {
        with_ctx(|ctx| {
            ctx.fatal(DiagnosticKind::ScopeImbalance {
                expected: 0,
                found: 1,
            });
            let diag = &ctx.diagnostics()[0];
            assert_eq!(diag.node, NodeId::ROOT);
            assert_eq!(diag.path, "<driver>");
        });
    }

    #[test]
    fn fatal_marks_the_visit() {
        with_ctx(|ctx| {
            ctx.enter(NodeId(0));
            ctx.fatal(DiagnosticKind::MissingClass);
            assert!(ctx.is_aborting());
            assert!(ctx.leave());
            assert!(ctx.has_fatal());
            assert_eq!(ctx.diagnostics()[0].path, "binding");

            // The flag does not leak into the next visit
            ctx.enter(NodeId(1));
            assert!(!ctx.is_aborting());
            assert!(!ctx.leave());
        });
    }

    #[test]
    fn scope_frames_inherit_namespace_and_type() {
        with_ctx(|ctx| {
            assert_eq!(ctx.depth(), 0);
            assert_eq!(ctx.current_namespace(), None);

            let order = TypeInfo::complex("com.example.Order");
            let frame = ctx.child_frame(Some("urn:orders"), Some(&order));
            ctx.push_scope(frame);
            assert_eq!(ctx.current_namespace(), Some("urn:orders"));
            assert_eq!(ctx.enclosing_type(), Some(&order));

            // No uri, no type: both inherited
            let frame = ctx.child_frame(None, None);
            ctx.push_scope(frame);
            assert_eq!(ctx.depth(), 2);
            assert_eq!(ctx.current_namespace(), Some("urn:orders"));
            assert_eq!(ctx.enclosing_type(), Some(&order));

            // Explicit empty namespace overrides the inherited one
            let frame = ctx.child_frame(Some(""), None);
            ctx.push_scope(frame);
            assert_eq!(ctx.current_namespace(), Some(""));

            ctx.pop_scope();
            ctx.pop_scope();
            ctx.pop_scope();
            assert_eq!(ctx.depth(), 0);
            assert!(ctx.pop_scope().is_none());
        });
    }

    #[test]
    fn phase_is_stamped_on_diagnostics() {
        with_ctx(|ctx| {
            ctx.set_phase(Phase::Validate);
            ctx.enter(NodeId(0));
            ctx.warning(DiagnosticKind::EmptyStructure);
            ctx.leave();
            assert_eq!(ctx.diagnostics()[0].phase, Phase::Validate);
            assert_eq!(ctx.diagnostics()[0].severity, Severity::Warning);
        });
    }
}
