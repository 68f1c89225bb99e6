use tracing::debug;

use crate::context::{Phase, ValidationContext};
use crate::diagnostic::DiagnosticKind;
use crate::error::Result;
use crate::tree::TreeView;
use crate::types::{TypeInfo, OBJECT_TYPE};

use super::base::{base_builders, check_name, resolve_declared};
use super::content::{aggregate, check_element_scope};
use super::{Component, ComponentBase, ComponentKind, PhaseCell};

/// Repeated items of one item type
#[derive(Debug, Clone, Default)]
pub struct CollectionComponent {
    base: ComponentBase,
    pub property: Option<String>,
    pub declared_type: Option<String>,
    /// Declared item type; `Object` when absent
    pub item_type: Option<String>,

    resolved_item: PhaseCell<Option<TypeInfo>>,
}

impl CollectionComponent {
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

    pub fn item_type(mut self, type_name: impl Into<String>) -> Self {
        self.item_type = Some(type_name.into());
        self
    }

    /// Resolved item type, available after prevalidation
    pub fn resolved_item_type(&self) -> Result<Option<&TypeInfo>> {
        self.resolved_item
            .get("item_type", Phase::Prevalidate)
            .map(Option::as_ref)
    }
}

base_builders!(CollectionComponent);

impl Component for CollectionComponent {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Collection
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

    /// Children operate on the items, not on the collection
    fn scope_type(&self) -> Result<Option<&TypeInfo>> {
        self.resolved_item_type()
    }

    fn prevalidate(&mut self, ctx: &mut ValidationContext<'_>) -> Result<()> {
        if let Some(name) = self.base.name.clone() {
            check_name(ctx, &name);
        }

        let value_type = match self.declared_type.clone() {
            Some(type_name) => {
                let resolved = resolve_declared(ctx, &type_name);
                if let Some(ty) = resolved.as_ref().filter(|ty| !ty.is_collection()) {
                    ctx.error(DiagnosticKind::NotACollection {
                        type_name: ty.name.clone(),
                    });
                }
                resolved
            }
            None => None,
        };

        let item_name = self
            .item_type
            .clone()
            .unwrap_or_else(|| OBJECT_TYPE.to_string());
        let item = resolve_declared(ctx, &item_name);
        if ctx.is_aborting() {
            return Ok(());
        }

        debug!(item_type = %item_name, "collection prevalidated");
        self.resolved_item.resolve(item);
        self.base.resolve_type(value_type, self.property.is_none());
        Ok(())
    }

    fn validate(&mut self, ctx: &mut ValidationContext<'_>, tree: &TreeView<'_>) -> Result<()> {
        self.base.settle_namespace(ctx);

        if self.base.is_implicit()? && ctx.enclosing_type().is_none() {
            ctx.error(DiagnosticKind::ImplicitWithoutOwner);
        }

        if let Some(item) = self.resolved_item_type()?.cloned() {
            let mut misfits = Vec::new();
            for &child in tree.children() {
                let Some(component) = tree.get(child) else {
                    continue;
                };
                if let Some(found) = component.value_type()? {
                    if !ctx.resolver().is_assignable(found, &item) {
                        misfits.push(found.name.clone());
                    }
                }
            }
            for found in misfits {
                ctx.error(DiagnosticKind::IncompatibleItemType {
                    item_type: item.name.clone(),
                    found,
                });
            }
        }

        let named = self.base.name.is_some();
        if named {
            check_element_scope(ctx, tree, tree.children())?;
        }

        let children = aggregate(tree, tree.children())?;
        self.base.resolve_contribution(false, named || children.content);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_type_is_unresolved_before_prevalidation() {
        let collection = CollectionComponent::new()
            .named("lines")
            .property("lines")
            .typed("List")
            .item_type("com.example.Line");
        assert!(collection.resolved_item_type().is_err());
        assert!(collection.scope_type().is_err());
        assert_eq!(collection.type_name(), Some("List"));
    }
}
