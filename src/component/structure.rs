use crate::context::ValidationContext;
use crate::diagnostic::DiagnosticKind;
use crate::error::Result;
use crate::tree::TreeView;

use super::base::{base_builders, check_name, resolve_declared};
use super::content::{aggregate, check_element_scope};
use super::{Component, ComponentBase, ComponentKind};

/// Nested object, written inline or through a referenced mapping
#[derive(Debug, Clone, Default)]
pub struct StructureComponent {
    base: ComponentBase,
    pub property: Option<String>,
    pub declared_type: Option<String>,
    /// Name (or class) of the mapping used for the object
    pub map_as: Option<String>,
}

impl StructureComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn typed(mut self, type_name: impl Into<String>) -> Self {
        self.declared_type = Some(type_name.into());
        self
    }

    pub fn map_as(mut self, reference: impl Into<String>) -> Self {
        self.map_as = Some(reference.into());
        self
    }

    fn check_reference(
        &self,
        ctx: &mut ValidationContext<'_>,
        tree: &TreeView<'_>,
        reference: &str,
    ) -> Result<()> {
        let Some(target) = tree.find_mapping(reference) else {
            ctx.error(DiagnosticKind::UnknownMapping {
                reference: reference.to_string(),
            });
            return Ok(());
        };
        // An aborted mapping already carries its own fatal diagnostic
        let Some(mapping) = tree.prevalidated(target) else {
            return Ok(());
        };
        let Some(mapped) = mapping.value_type()?.cloned() else {
            return Ok(());
        };

        let resolver = ctx.resolver();
        let mismatch = match self.base.value_type()? {
            // The mapping must produce something the property can hold
            Some(declared) => (!resolver.is_assignable(&mapped, declared))
                .then(|| (declared.name.clone(), mapped.name.clone())),
            // An implicit structure hands the containing object to the mapping
            None if self.base.is_implicit()? => ctx
                .enclosing_type()
                .filter(|owner| !resolver.is_assignable(owner, &mapped))
                .map(|owner| (mapped.name.clone(), owner.name.clone())),
            None => None,
        };
        if let Some((expected, found)) = mismatch {
            ctx.error(DiagnosticKind::IncompatibleType { expected, found });
        }
        Ok(())
    }
}

base_builders!(StructureComponent);

impl Component for StructureComponent {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Structure
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn type_name(&self) -> Option<&str> {
        self.declared_type.as_deref()
    }

    fn prevalidate(&mut self, ctx: &mut ValidationContext<'_>) -> Result<()> {
        if let Some(name) = self.base.name.clone() {
            check_name(ctx, &name);
        }

        let implicit = self.property.is_none();
        let value_type = match self.declared_type.clone() {
            Some(type_name) => resolve_declared(ctx, &type_name),
            None => {
                if !implicit && self.map_as.is_none() {
                    ctx.error(DiagnosticKind::MissingType);
                }
                None
            }
        };
        if ctx.is_aborting() {
            return Ok(());
        }

        self.base.resolve_type(value_type, implicit);
        Ok(())
    }

    fn validate(&mut self, ctx: &mut ValidationContext<'_>, tree: &TreeView<'_>) -> Result<()> {
        self.base.settle_namespace(ctx);

        if self.base.is_implicit()? && ctx.enclosing_type().is_none() {
            ctx.error(DiagnosticKind::ImplicitWithoutOwner);
        }

        if let Some(reference) = self.map_as.clone() {
            self.check_reference(ctx, tree, &reference)?;
        } else if tree.children().is_empty() {
            ctx.warning(DiagnosticKind::EmptyStructure);
        }

        let named = self.base.name.is_some();
        if named {
            check_element_scope(ctx, tree, tree.children())?;
        }

        let children = aggregate(tree, tree.children())?;
        if named {
            self.base.resolve_contribution(false, true);
        } else {
            self.base.resolve_contribution(
                children.attribute,
                children.content || self.map_as.is_some(),
            );
        }
        Ok(())
    }
}
