//! Simple values: attributes, child elements and text

use serde::Serialize;
use tracing::debug;

use crate::context::ValidationContext;
use crate::diagnostic::DiagnosticKind;
use crate::error::Result;
use crate::tree::TreeView;
use crate::types::TypeInfo;

use super::base::{base_builders, check_name, parse_option, resolve_declared, OptionValue};
use super::{Component, ComponentBase, ComponentKind};

/// Where a value is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueStyle {
    Attribute,
    Element,
    Text,
    Cdata,
}

impl OptionValue for ValueStyle {
    const ALLOWED: &'static [&'static str] = &["attribute", "element", "text", "cdata"];

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "attribute" => Some(ValueStyle::Attribute),
            "element" => Some(ValueStyle::Element),
            "text" => Some(ValueStyle::Text),
            "cdata" => Some(ValueStyle::Cdata),
            _ => None,
        }
    }
}

impl ValueStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueStyle::Attribute => "attribute",
            ValueStyle::Element => "element",
            ValueStyle::Text => "text",
            ValueStyle::Cdata => "cdata",
        }
    }

    fn needs_name(self) -> bool {
        matches!(self, ValueStyle::Attribute | ValueStyle::Element)
    }
}

/// Object identity role of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ident {
    #[default]
    None,
    /// The value identifies its owning object
    Def,
    /// The value refers to an object by its identifier
    Ref,
}

impl OptionValue for Ident {
    const ALLOWED: &'static [&'static str] = &["none", "def", "ref"];

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "none" => Some(Ident::None),
            "def" => Some(Ident::Def),
            "ref" => Some(Ident::Ref),
            _ => None,
        }
    }
}

const DEFAULT_VALUE_TYPE: &str = "String";

#[derive(Debug, Clone)]
pub struct ValueComponent {
    base: ComponentBase,
    /// Raw style option; `element` when absent
    pub style: Option<String>,
    pub property: Option<String>,
    pub constant: Option<String>,
    /// Declared type name; `String` when absent
    pub declared_type: Option<String>,
    /// Raw ident option; `none` when absent
    pub ident: Option<String>,

    resolved_style: Option<ValueStyle>,
    resolved_ident: Ident,
}

impl ValueComponent {
    fn with_style(style: Option<&str>, name: Option<String>) -> Self {
        let mut base = ComponentBase::new();
        base.name = name;
        Self {
            base,
            style: style.map(str::to_string),
            property: None,
            constant: None,
            declared_type: None,
            ident: None,
            resolved_style: None,
            resolved_ident: Ident::None,
        }
    }

    /// A value with no style set (defaults to element)
    pub fn new() -> Self {
        Self::with_style(None, None)
    }

    pub fn attribute(name: impl Into<String>) -> Self {
        Self::with_style(Some("attribute"), Some(name.into()))
    }

    pub fn element(name: impl Into<String>) -> Self {
        Self::with_style(Some("element"), Some(name.into()))
    }

    pub fn text() -> Self {
        Self::with_style(Some("text"), None)
    }

    /// Set the raw style option
    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn constant(mut self, constant: impl Into<String>) -> Self {
        self.constant = Some(constant.into());
        self
    }

    pub fn typed(mut self, type_name: impl Into<String>) -> Self {
        self.declared_type = Some(type_name.into());
        self
    }

    /// Set the raw ident option
    pub fn ident(mut self, ident: impl Into<String>) -> Self {
        self.ident = Some(ident.into());
        self
    }

    /// Style after prevalidation (an invalid option counts as element)
    pub fn resolved_style(&self) -> Option<ValueStyle> {
        self.resolved_style
    }

    pub fn resolved_ident(&self) -> Ident {
        self.resolved_ident
    }
}

impl Default for ValueComponent {
    fn default() -> Self {
        Self::new()
    }
}

base_builders!(ValueComponent);

impl Component for ValueComponent {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Value
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn type_name(&self) -> Option<&str> {
        Some(self.declared_type.as_deref().unwrap_or(DEFAULT_VALUE_TYPE))
    }

    fn is_text(&self) -> bool {
        let style = match self.resolved_style {
            Some(style) => Some(style),
            None => self.style.as_deref().and_then(ValueStyle::parse),
        };
        matches!(style, Some(ValueStyle::Text | ValueStyle::Cdata))
    }

    fn prevalidate(&mut self, ctx: &mut ValidationContext<'_>) -> Result<()> {
        let style = match self.style.clone() {
            Some(raw) => parse_option::<ValueStyle>(ctx, "style", &raw).unwrap_or(ValueStyle::Element),
            None => ValueStyle::Element,
        };
        self.resolved_style = Some(style);

        if let Some(raw) = self.ident.clone() {
            self.resolved_ident = parse_option::<Ident>(ctx, "ident", &raw).unwrap_or_default();
        }

        match (style.needs_name(), self.base.name.clone()) {
            (true, None) => ctx.error(DiagnosticKind::MissingName {
                style: style.as_str().to_string(),
            }),
            (false, Some(name)) => ctx.error(DiagnosticKind::UnexpectedName {
                name,
                style: style.as_str().to_string(),
            }),
            (true, Some(name)) => check_name(ctx, &name),
            (false, None) => {}
        }

        if self.property.is_none() && self.constant.is_none() {
            ctx.error(DiagnosticKind::MissingProperty);
        }

        let type_name = self
            .declared_type
            .clone()
            .unwrap_or_else(|| DEFAULT_VALUE_TYPE.to_string());
        let value_type = resolve_declared(ctx, &type_name);
        if ctx.is_aborting() {
            return Ok(());
        }

        if let Some(ty) = &value_type {
            // Identifier references hold the referenced object itself
            if !ty.is_simple() && self.resolved_ident != Ident::Ref {
                ctx.error(DiagnosticKind::NonSimpleValueType {
                    type_name: ty.name.clone(),
                });
            }
        }

        debug!(style = style.as_str(), value_type = %type_name, "value prevalidated");
        self.base.resolve_type(value_type, false);
        Ok(())
    }

    fn validate(&mut self, ctx: &mut ValidationContext<'_>, tree: &TreeView<'_>) -> Result<()> {
        self.base.settle_namespace(ctx);

        match self.resolved_ident {
            Ident::Def if ctx.enclosing_type().is_none() => {
                ctx.error(DiagnosticKind::IdentWithoutOwner);
            }
            Ident::Ref => {
                let target: Option<TypeInfo> = self.base.value_type()?.cloned();
                if let Some(target) = target {
                    if tree.find_mapping_for_type(&target, ctx.resolver()).is_none() {
                        ctx.error(DiagnosticKind::UnmappedReference {
                            type_name: target.name,
                        });
                    }
                }
            }
            _ => {}
        }

        let attribute = self.resolved_style == Some(ValueStyle::Attribute);
        self.base.resolve_contribution(attribute, !attribute);
        Ok(())
    }
}
