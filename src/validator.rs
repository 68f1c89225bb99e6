//! Validation driver
//!
//! Runs the two phases over a [`BindingTree`]:
//!
//! 1. `prevalidate` on every reachable component, pre-order. A fatal
//!    diagnostic aborts the component and its subtree; siblings continue.
//! 2. Once phase 1 has finished everywhere, `validate` on every component
//!    that was not aborted, post-order, with the ambient scope of its
//!    ancestors pushed on the context.
//!
//! Hooks never see a half-run phase: everything a component resolved in
//! phase 1 is visible to every `validate` call.

use std::path::Path;

use anyhow::Context;
use tracing::{debug, info, info_span, warn};

use crate::config::ValidationConfig;
use crate::context::{Phase, ValidationContext};
use crate::diagnostic::DiagnosticKind;
use crate::report::Report;
use crate::tree::{BindingTree, NodeId, TreeView};
use crate::types::TypeResolver;

/// The phase 2 walk was stopped by a driver-level fatal
struct WalkHalted;

/// Two-phase validator for binding trees
pub struct Validator<'r> {
    resolver: &'r dyn TypeResolver,
    config: ValidationConfig,
}

impl<'r> Validator<'r> {
    /// Validator with the default configuration
    pub fn new(resolver: &'r dyn TypeResolver) -> Self {
        Self::with_config(resolver, ValidationConfig::default())
    }

    pub fn with_config(resolver: &'r dyn TypeResolver, config: ValidationConfig) -> Self {
        Self { resolver, config }
    }

    /// Load the configuration from a TOML file
    pub fn from_config_file(resolver: &'r dyn TypeResolver, path: &Path) -> anyhow::Result<Self> {
        let config = ValidationConfig::from_file(path)
            .with_context(|| format!("Failed to load validation config from {:?}", path))?;
        Ok(Self::with_config(resolver, config))
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate `tree`, marking it validated when no fatal diagnostic was recorded
    pub fn run(&self, tree: &mut BindingTree) -> Report {
        let span = info_span!("validate_binding", nodes = tree.len());
        let _enter = span.enter();

        let Some(root) = tree.root() else {
            debug!("empty binding tree");
            tree.set_validated(true);
            return Report::new(0, Vec::new());
        };

        let mut ctx = ValidationContext::new(self.resolver, &self.config, tree);
        let mut aborted = vec![false; tree.len()];

        {
            let _phase = info_span!("phase", phase = %Phase::Prevalidate).entered();
            ctx.set_phase(Phase::Prevalidate);
            self.prevalidate_all(tree, root, &mut ctx, &mut aborted);
        }

        // Barrier: phase 2 starts only once every reachable node has prevalidated
        {
            let _phase = info_span!("phase", phase = %Phase::Validate).entered();
            ctx.set_phase(Phase::Validate);
            let skipped = aborted.clone();
            let halted = !aborted[root.index()]
                && self
                    .validate_subtree(tree, root, 0, &mut ctx, &skipped, &mut aborted)
                    .is_err();
            if halted {
                warn!("validation walk halted");
            }
        }

        let report = Report::new(tree.len(), ctx.into_diagnostics());
        tree.set_validated(report.is_valid());
        info!(
            valid = report.is_valid(),
            diagnostics = report.diagnostics.len(),
            "validation finished"
        );
        report
    }

    fn prevalidate_all(
        &self,
        tree: &BindingTree,
        root: NodeId,
        ctx: &mut ValidationContext<'_>,
        aborted: &mut [bool],
    ) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            debug!(node = %id, kind = ?tree.kind(id), "prevalidate");
            ctx.enter(id);
            let outcome = tree.component_mut(id).and_then(|mut component| {
                let result = component.prevalidate(ctx);
                if result.is_ok() && !ctx.is_aborting() {
                    component.base_mut().finish(Phase::Prevalidate);
                }
                result
            });
            if let Err(err) = outcome {
                ctx.fatal(DiagnosticKind::ContractViolation {
                    detail: err.to_string(),
                });
            }

            if ctx.leave() {
                warn!(node = %id, path = %tree.path(id), "aborting subtree");
                mark_subtree(tree, id, aborted);
                continue;
            }

            // Reversed so the first child in visiting order is popped first
            let order = self.config.traversal.arrange(tree.children(id));
            stack.extend(order.into_iter().rev());
        }
    }

    /// Validate the subtree at `id`, which has `level` ancestors
    fn validate_subtree(
        &self,
        tree: &BindingTree,
        id: NodeId,
        level: usize,
        ctx: &mut ValidationContext<'_>,
        skipped: &[bool],
        aborted: &mut [bool],
    ) -> std::result::Result<(), WalkHalted> {
        // The frames in effect must be exactly those of the ancestors
        if ctx.depth() != level {
            let kind = DiagnosticKind::ScopeImbalance {
                expected: level,
                found: ctx.depth(),
            };
            record_fatal(id, ctx, aborted, kind);
            return Err(WalkHalted);
        }

        let frame = match tree.component(id) {
            Ok(component) => {
                let own_type = component.scope_type().ok().flatten();
                ctx.child_frame(component.uri(), own_type)
            }
            Err(err) => {
                let kind = DiagnosticKind::ContractViolation {
                    detail: err.to_string(),
                };
                record_fatal(id, ctx, aborted, kind);
                return Ok(());
            }
        };

        ctx.push_scope(frame);
        let mut descent = Ok(());
        for child in self.config.traversal.arrange(tree.children(id)) {
            if !aborted[child.index()] {
                descent = self.validate_subtree(tree, child, level + 1, ctx, skipped, aborted);
                if descent.is_err() {
                    break;
                }
            }
        }
        ctx.pop_scope();
        descent?;

        debug!(node = %id, kind = ?tree.kind(id), "validate");
        ctx.enter(id);
        let outcome = tree.component_mut(id).and_then(|mut component| {
            let view = TreeView::new(tree, skipped, &*aborted, id);
            let result = component.validate(ctx, &view);
            if result.is_ok() && !ctx.is_aborting() {
                component.base_mut().finish(Phase::Validate);
            }
            result
        });
        if let Err(err) = outcome {
            ctx.fatal(DiagnosticKind::ContractViolation {
                detail: err.to_string(),
            });
        }
        if ctx.leave() {
            warn!(node = %id, path = %tree.path(id), "component aborted");
            aborted[id.index()] = true;
        }
        Ok(())
    }

}

/// Record a driver-level fatal against `id` outside any hook
fn record_fatal(
    id: NodeId,
    ctx: &mut ValidationContext<'_>,
    aborted: &mut [bool],
    kind: DiagnosticKind,
) {
    ctx.enter(id);
    ctx.fatal(kind);
    ctx.leave();
    aborted[id.index()] = true;
}

fn mark_subtree(tree: &BindingTree, id: NodeId, aborted: &mut [bool]) {
    let mut pending = vec![id];
    while let Some(node) = pending.pop() {
        aborted[node.index()] = true;
        pending.extend_from_slice(tree.children(node));
    }
}

/// Validate `tree` with the default configuration
pub fn run_validation(tree: &mut BindingTree, resolver: &dyn TypeResolver) -> Report {
    Validator::new(resolver).run(tree)
}

/// Validate, turning a fatal outcome into an error
///
/// For callers that only proceed with a validated tree, such as code
/// generation.
pub fn ensure_valid(tree: &mut BindingTree, resolver: &dyn TypeResolver) -> anyhow::Result<Report> {
    let report = run_validation(tree, resolver);
    if !report.is_valid() {
        let first = report
            .fatal()
            .next()
            .map(ToString::to_string)
            .unwrap_or_default();
        anyhow::bail!(
            "Binding definition is invalid ({} fatal): {}",
            report.summary().fatal,
            first
        );
    }
    Ok(report)
}
