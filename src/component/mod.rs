//! Binding components
//!
//! Every node of a binding definition implements [`Component`]: nine
//! side-effect-free queries plus the two validation hooks. The hooks
//! default to no-ops; concrete kinds override the ones they need.
//!
//! | Kind | Role |
//! |------|------|
//! | [`BindingComponent`] | Root; owns the global mappings |
//! | [`MappingComponent`] | Named definition of how a class maps to an element |
//! | [`StructureComponent`] | Nested object, inline or by reference to a mapping |
//! | [`CollectionComponent`] | Repeated items of one item type |
//! | [`ValueComponent`] | Simple value as attribute, element or text |

use std::fmt;

use serde::Serialize;

use crate::context::ValidationContext;
use crate::error::Result;
use crate::tree::TreeView;
use crate::types::TypeInfo;

mod base;
mod binding;
mod collection;
mod content;
mod mapping;
mod structure;
mod value;

pub use base::{ComponentBase, PhaseCell};
pub use binding::BindingComponent;
pub use collection::CollectionComponent;
pub use mapping::MappingComponent;
pub use structure::StructureComponent;
pub use value::{Ident, ValueComponent, ValueStyle};

/// Closed set of component kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Binding,
    Mapping,
    Structure,
    Collection,
    Value,
}

impl ComponentKind {
    /// Kinds whose children are flattened into the parent when unnamed
    pub fn is_container(self) -> bool {
        matches!(self, ComponentKind::Structure | ComponentKind::Collection)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Binding => write!(f, "binding"),
            ComponentKind::Mapping => write!(f, "mapping"),
            ComponentKind::Structure => write!(f, "structure"),
            ComponentKind::Collection => write!(f, "collection"),
            ComponentKind::Value => write!(f, "value"),
        }
    }
}

/// Capability contract shared by every node of a binding definition
///
/// Phase-scoped queries return [`BindError::Unresolved`](crate::BindError::Unresolved)
/// when read before their phase has run for this node:
/// `value_type` and `is_implicit` after `prevalidate`, `has_attribute` and
/// `has_content` after `validate`.
///
/// When a hook returns without settling its phase-scoped state, the driver
/// settles it to "no own type", "not implicit" and "contributes nothing".
pub trait Component: fmt::Debug {
    fn kind(&self) -> ComponentKind;

    fn base(&self) -> &ComponentBase;

    fn base_mut(&mut self) -> &mut ComponentBase;

    /// Whether absence is legal in the container
    fn is_optional(&self) -> bool {
        self.base().optional
    }

    /// Contributes an attribute to the containing element
    fn has_attribute(&self) -> Result<bool> {
        self.base().has_attribute()
    }

    /// Contributes child content to the containing element
    fn has_content(&self) -> Result<bool> {
        self.base().has_content()
    }

    fn has_name(&self) -> bool {
        self.name().is_some()
    }

    fn name(&self) -> Option<&str> {
        self.base().name.as_deref()
    }

    /// Declared namespace; `None` when not set, `Some("")` for "no namespace"
    fn uri(&self) -> Option<&str> {
        self.base().uri.as_deref()
    }

    /// Resolved type; `Ok(None)` when the component has no type of its own
    fn value_type(&self) -> Result<Option<&TypeInfo>> {
        self.base().value_type()
    }

    /// Operates on the containing object rather than a value of its own
    fn is_implicit(&self) -> Result<bool> {
        self.base().is_implicit()
    }

    /// Declared type name as written, before resolution
    fn type_name(&self) -> Option<&str> {
        None
    }

    /// Mapping this one extends, by name or class
    fn extended_mapping(&self) -> Option<&str> {
        None
    }

    /// Type of the object the children operate on
    fn scope_type(&self) -> Result<Option<&TypeInfo>> {
        self.value_type()
    }

    /// Contributes character data rather than elements
    fn is_text(&self) -> bool {
        false
    }

    /// Phase 1: check this node's own configuration
    fn prevalidate(&mut self, _ctx: &mut ValidationContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Phase 2: check this node against the rest of the tree
    fn validate(&mut self, _ctx: &mut ValidationContext<'_>, _tree: &TreeView<'_>) -> Result<()> {
        Ok(())
    }
}
