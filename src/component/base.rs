//! Shared component state
//!
//! `ComponentBase` holds what every kind has in common: declared identity
//! (name, namespace, optionality) and the phase-scoped results the hooks
//! compute. Concrete kinds embed one and expose it through
//! [`Component::base`](super::Component::base), which gives them the default
//! query implementations for free.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::{Phase, ValidationContext};
use crate::diagnostic::DiagnosticKind;
use crate::error::{BindError, Result};
use crate::types::{is_well_formed_type_name, TypeInfo};

/// A value that only exists once a validation phase has produced it
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseCell<T> {
    Unresolved,
    Resolved(T),
}

impl<T> Default for PhaseCell<T> {
    fn default() -> Self {
        PhaseCell::Unresolved
    }
}

impl<T> PhaseCell<T> {
    pub fn resolve(&mut self, value: T) {
        *self = PhaseCell::Resolved(value);
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, PhaseCell::Resolved(_))
    }

    /// Read the value, failing if `phase` has not produced it yet
    pub fn get(&self, field: &'static str, phase: Phase) -> Result<&T> {
        match self {
            PhaseCell::Resolved(value) => Ok(value),
            PhaseCell::Unresolved => Err(BindError::Unresolved { field, phase }),
        }
    }

    fn resolve_if_unset(&mut self, value: T) {
        if !self.is_resolved() {
            self.resolve(value);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComponentBase {
    pub name: Option<String>,
    pub uri: Option<String>,
    pub optional: bool,

    // Phase 1
    value_type: PhaseCell<Option<TypeInfo>>,
    implicit: PhaseCell<bool>,

    // Phase 2
    has_attribute: PhaseCell<bool>,
    has_content: PhaseCell<bool>,
    namespace: PhaseCell<Option<String>>,
}

impl ComponentBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn value_type(&self) -> Result<Option<&TypeInfo>> {
        self.value_type
            .get("value_type", Phase::Prevalidate)
            .map(Option::as_ref)
    }

    pub fn is_implicit(&self) -> Result<bool> {
        self.implicit.get("implicit", Phase::Prevalidate).copied()
    }

    pub fn has_attribute(&self) -> Result<bool> {
        self.has_attribute
            .get("has_attribute", Phase::Validate)
            .copied()
    }

    pub fn has_content(&self) -> Result<bool> {
        self.has_content.get("has_content", Phase::Validate).copied()
    }

    /// Namespace in effect for this component: its own or the inherited one
    pub fn effective_namespace(&self) -> Result<Option<&str>> {
        self.namespace
            .get("namespace", Phase::Validate)
            .map(Option::as_deref)
    }

    pub fn is_prevalidated(&self) -> bool {
        self.value_type.is_resolved() && self.implicit.is_resolved()
    }

    /// Record the phase 1 outcome
    pub fn resolve_type(&mut self, value_type: Option<TypeInfo>, implicit: bool) {
        self.value_type.resolve(value_type);
        self.implicit.resolve(implicit);
    }

    /// Record what this component adds to its containing element
    pub fn resolve_contribution(&mut self, attribute: bool, content: bool) {
        self.has_attribute.resolve(attribute);
        self.has_content.resolve(content);
    }

    /// Settle the effective namespace from the ambient scope
    pub fn settle_namespace(&mut self, ctx: &ValidationContext<'_>) {
        let namespace = self
            .uri
            .as_deref()
            .or(ctx.current_namespace())
            .map(str::to_string);
        self.namespace.resolve(namespace);
    }

    /// Defaults for state a hook left unresolved
    pub(crate) fn finish(&mut self, phase: Phase) {
        match phase {
            Phase::Prevalidate => {
                self.value_type.resolve_if_unset(None);
                self.implicit.resolve_if_unset(false);
            }
            Phase::Validate => {
                self.has_attribute.resolve_if_unset(false);
                self.has_content.resolve_if_unset(false);
                let namespace = self.uri.clone();
                self.namespace.resolve_if_unset(namespace);
            }
        }
    }
}

/// Enumerated option given as raw text in a definition
pub(crate) trait OptionValue: Sized + Copy {
    const ALLOWED: &'static [&'static str];

    fn parse(raw: &str) -> Option<Self>;
}

/// Parse an enumerated option, reporting values outside the legal set
pub(crate) fn parse_option<T: OptionValue>(
    ctx: &mut ValidationContext<'_>,
    attribute: &'static str,
    raw: &str,
) -> Option<T> {
    let parsed = T::parse(raw);
    if parsed.is_none() {
        ctx.error(DiagnosticKind::InvalidOption {
            attribute,
            value: raw.to_string(),
            allowed: T::ALLOWED,
        });
    }
    parsed
}

/// XML non-colonized name (ASCII subset)
static NC_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9._-]*$").expect("valid NCName regex"));

pub(crate) fn check_name(ctx: &mut ValidationContext<'_>, name: &str) {
    if ctx.config().check_names && !NC_NAME_RE.is_match(name) {
        ctx.error(DiagnosticKind::InvalidName {
            name: name.to_string(),
        });
    }
}

/// Resolve a declared type name
///
/// A malformed name is fatal; an unknown one is reported with the
/// configured severity. Either way the result is `None`.
pub(crate) fn resolve_declared(ctx: &mut ValidationContext<'_>, type_name: &str) -> Option<TypeInfo> {
    if !is_well_formed_type_name(type_name) {
        ctx.fatal(DiagnosticKind::MalformedTypeName {
            type_name: type_name.to_string(),
        });
        return None;
    }

    let resolved = ctx.resolver().resolve(type_name);
    if resolved.is_none() {
        let severity = ctx.config().unresolved_type;
        ctx.report(
            severity,
            DiagnosticKind::UnresolvedType {
                type_name: type_name.to_string(),
            },
        );
    }
    resolved
}

/// Fluent setters for the declared identity every kind shares
macro_rules! base_builders {
    ($ty:ty) => {
        impl $ty {
            pub fn named(mut self, name: impl Into<String>) -> Self {
                self.base.name = Some(name.into());
                self
            }

            pub fn in_namespace(mut self, uri: impl Into<String>) -> Self {
                self.base.uri = Some(uri.into());
                self
            }

            pub fn optional(mut self) -> Self {
                self.base.optional = true;
                self
            }
        }
    };
}

pub(crate) use base_builders;
