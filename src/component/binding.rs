use crate::context::ValidationContext;
use crate::error::Result;
use crate::tree::TreeView;

use super::content::{aggregate, check_element_scope};
use super::{Component, ComponentBase, ComponentKind};

/// Root of a binding definition
///
/// Has no local configuration, so it keeps the default `prevalidate`.
#[derive(Debug, Clone, Default)]
pub struct BindingComponent {
    base: ComponentBase,
}

impl BindingComponent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespace every mapping inherits unless it declares its own
    pub fn in_namespace(mut self, uri: impl Into<String>) -> Self {
        self.base.uri = Some(uri.into());
        self
    }
}

impl Component for BindingComponent {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Binding
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn validate(&mut self, ctx: &mut ValidationContext<'_>, tree: &TreeView<'_>) -> Result<()> {
        self.base.settle_namespace(ctx);

        // Global mapping names share one symbol space
        check_element_scope(ctx, tree, tree.children())?;

        let children = aggregate(tree, tree.children())?;
        self.base.resolve_contribution(false, children.content);
        Ok(())
    }
}
