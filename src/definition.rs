//! YAML definition fixture
//!
//! A serde-tagged rendering of a component tree, used by tests and tooling
//! to describe binding definitions without building them in code:
//!
//! ```yaml
//! kind: binding
//! children:
//!   - kind: mapping
//!     name: order
//!     class: com.example.Order
//!     children:
//!       - kind: value
//!         style: attribute
//!         name: id
//!         property: id
//! ```
//!
//! Enumerated options (`style`, `ident`) stay raw strings here; they are
//! checked during prevalidation like any other definition input.

use serde::Deserialize;

use crate::component::{
    BindingComponent, CollectionComponent, Component, MappingComponent, StructureComponent,
    ValueComponent,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ComponentDef {
    Binding {
        #[serde(default)]
        ns: Option<String>,
        #[serde(default)]
        children: Vec<ComponentDef>,
    },
    Mapping {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        ns: Option<String>,
        #[serde(default)]
        class: Option<String>,
        #[serde(default, rename = "abstract")]
        is_abstract: bool,
        #[serde(default)]
        extends: Option<String>,
        #[serde(default)]
        children: Vec<ComponentDef>,
    },
    Structure {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        ns: Option<String>,
        #[serde(default)]
        optional: bool,
        #[serde(default)]
        property: Option<String>,
        #[serde(default, rename = "type")]
        type_name: Option<String>,
        #[serde(default, rename = "map-as")]
        map_as: Option<String>,
        #[serde(default)]
        children: Vec<ComponentDef>,
    },
    Collection {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        ns: Option<String>,
        #[serde(default)]
        optional: bool,
        #[serde(default)]
        property: Option<String>,
        #[serde(default, rename = "type")]
        type_name: Option<String>,
        #[serde(default, rename = "item-type")]
        item_type: Option<String>,
        #[serde(default)]
        children: Vec<ComponentDef>,
    },
    Value {
        #[serde(default)]
        style: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        ns: Option<String>,
        #[serde(default)]
        optional: bool,
        #[serde(default)]
        property: Option<String>,
        #[serde(default)]
        constant: Option<String>,
        #[serde(default, rename = "type")]
        type_name: Option<String>,
        #[serde(default)]
        ident: Option<String>,
    },
}

/// Apply the identity fields every kind shares
fn identity<C>(mut component: C, name: Option<String>, ns: Option<String>, optional: bool) -> C
where
    C: Component,
{
    let base = component.base_mut();
    base.name = name;
    base.uri = ns;
    base.optional = optional;
    component
}

fn boxed(component: impl Component + 'static) -> Box<dyn Component> {
    Box::new(component)
}

impl ComponentDef {
    /// Build the component and hand back its child definitions
    pub fn into_parts(self) -> (Box<dyn Component>, Vec<ComponentDef>) {
        match self {
            ComponentDef::Binding { ns, children } => {
                let mut root = BindingComponent::new();
                if let Some(ns) = ns {
                    root = root.in_namespace(ns);
                }
                (boxed(root), children)
            }
            ComponentDef::Mapping {
                name,
                ns,
                class,
                is_abstract,
                extends,
                children,
            } => {
                let mut mapping = MappingComponent::unclassed();
                mapping.class = class;
                mapping.is_abstract = is_abstract;
                mapping.extends = extends;
                (boxed(identity(mapping, name, ns, false)), children)
            }
            ComponentDef::Structure {
                name,
                ns,
                optional,
                property,
                type_name,
                map_as,
                children,
            } => {
                let mut structure = StructureComponent::new();
                structure.property = property;
                structure.declared_type = type_name;
                structure.map_as = map_as;
                (boxed(identity(structure, name, ns, optional)), children)
            }
            ComponentDef::Collection {
                name,
                ns,
                optional,
                property,
                type_name,
                item_type,
                children,
            } => {
                let mut collection = CollectionComponent::new();
                collection.property = property;
                collection.declared_type = type_name;
                collection.item_type = item_type;
                (boxed(identity(collection, name, ns, optional)), children)
            }
            ComponentDef::Value {
                style,
                name,
                ns,
                optional,
                property,
                constant,
                type_name,
                ident,
            } => {
                let mut value = ValueComponent::new();
                value.style = style;
                value.property = property;
                value.constant = constant;
                value.declared_type = type_name;
                value.ident = ident;
                (boxed(identity(value, name, ns, optional)), Vec::new())
            }
        }
    }
}
