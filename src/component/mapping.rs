use rustc_hash::FxHashSet;
use tracing::debug;

use crate::context::ValidationContext;
use crate::diagnostic::DiagnosticKind;
use crate::error::Result;
use crate::tree::TreeView;

use super::base::{base_builders, check_name, resolve_declared};
use super::content::{aggregate, check_element_scope};
use super::{Component, ComponentBase, ComponentKind};

/// Definition of how one class maps to an element
#[derive(Debug, Clone, Default)]
pub struct MappingComponent {
    base: ComponentBase,
    pub class: Option<String>,
    pub is_abstract: bool,
    /// Name (or class) of the mapping this one extends
    pub extends: Option<String>,
}

impl MappingComponent {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
            ..Self::default()
        }
    }

    /// A mapping without a class, only reachable from definitions
    pub fn unclassed() -> Self {
        Self::default()
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn extends(mut self, reference: impl Into<String>) -> Self {
        self.extends = Some(reference.into());
        self
    }

    /// The `extends` chain as written, if following it leads back here
    fn extends_cycle(&self, tree: &TreeView<'_>, reference: &str) -> Option<String> {
        let own = self
            .base
            .name
            .as_deref()
            .or(self.class.as_deref())
            .unwrap_or("?");
        let mut chain = vec![own.to_string()];
        let mut seen = FxHashSet::default();
        seen.insert(tree.current());

        let mut next = Some(reference);
        while let Some(reference) = next {
            chain.push(reference.to_string());
            let target = tree.find_mapping(reference)?;
            if target == tree.current() {
                return Some(chain.join(" -> "));
            }
            // A loop further up the chain is reported by its own members
            if !seen.insert(target) {
                return None;
            }
            next = tree.extends_of(target);
        }
        None
    }

    fn check_extends(
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
        let Some(base_mapping) = tree.prevalidated(target) else {
            return Ok(());
        };
        let (Some(own), Some(parent)) = (self.base.value_type()?, base_mapping.value_type()?) else {
            return Ok(());
        };
        if !ctx.resolver().is_assignable(own, parent) {
            ctx.error(DiagnosticKind::IncompatibleType {
                expected: parent.name.clone(),
                found: own.name.clone(),
            });
        }
        Ok(())
    }
}

base_builders!(MappingComponent);

impl Component for MappingComponent {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Mapping
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn type_name(&self) -> Option<&str> {
        self.class.as_deref()
    }

    fn extended_mapping(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    fn prevalidate(&mut self, ctx: &mut ValidationContext<'_>) -> Result<()> {
        let Some(class) = self.class.clone() else {
            ctx.fatal(DiagnosticKind::MissingClass);
            return Ok(());
        };

        match self.base.name.clone() {
            Some(name) => check_name(ctx, &name),
            None if !self.is_abstract => ctx.warning(DiagnosticKind::UnnamedConcreteMapping {
                class: class.clone(),
            }),
            None => {}
        }

        let value_type = resolve_declared(ctx, &class);
        if ctx.is_aborting() {
            return Ok(());
        }

        debug!(class = %class, "mapping prevalidated");
        self.base.resolve_type(value_type, false);
        Ok(())
    }

    fn validate(&mut self, ctx: &mut ValidationContext<'_>, tree: &TreeView<'_>) -> Result<()> {
        self.base.settle_namespace(ctx);

        if let Some(reference) = self.extends.clone() {
            match self.extends_cycle(tree, &reference) {
                Some(chain) => ctx.error(DiagnosticKind::CyclicExtends { chain }),
                None => self.check_extends(ctx, tree, &reference)?,
            }
        }

        check_element_scope(ctx, tree, tree.children())?;

        let children = aggregate(tree, tree.children())?;
        if self.base.name.is_some() {
            self.base.resolve_contribution(false, true);
        } else {
            self.base
                .resolve_contribution(children.attribute, children.content);
        }
        Ok(())
    }
}
