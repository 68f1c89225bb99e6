//! Checks over the content of an element scope
//!
//! An element scope is a named container (or the root). Unnamed
//! containers do not open a scope: their children are written inline,
//! so they are flattened into the nearest enclosing scope.

use rustc_hash::FxHashSet;

use crate::context::ValidationContext;
use crate::diagnostic::DiagnosticKind;
use crate::error::Result;
use crate::tree::{NodeId, TreeView};

/// What a set of children adds to the enclosing element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Contribution {
    pub attribute: bool,
    pub content: bool,
}

/// Combined contribution of the usable children
pub(crate) fn aggregate(tree: &TreeView<'_>, children: &[NodeId]) -> Result<Contribution> {
    let mut total = Contribution::default();
    for &child in children {
        let Some(component) = tree.get(child) else {
            continue;
        };
        total.attribute |= component.has_attribute()?;
        total.content |= component.has_content()?;
    }
    Ok(total)
}

#[derive(Debug)]
struct Member {
    name: Option<String>,
    namespace: Option<String>,
    attribute: bool,
    content: bool,
    text: bool,
}

fn collect_members(tree: &TreeView<'_>, children: &[NodeId], out: &mut Vec<Member>) -> Result<()> {
    for &child in children {
        let Some(component) = tree.get(child) else {
            continue;
        };
        let nested = tree.children_of(child);
        if component.name().is_none() && component.kind().is_container() && !nested.is_empty() {
            collect_members(tree, nested, out)?;
            continue;
        }
        out.push(Member {
            name: component.name().map(str::to_string),
            namespace: component
                .base()
                .effective_namespace()?
                .filter(|ns| !ns.is_empty())
                .map(str::to_string),
            attribute: component.has_attribute()?,
            content: component.has_content()?,
            text: component.is_text(),
        });
    }
    Ok(())
}

/// Name uniqueness and content model of one element scope
pub(crate) fn check_element_scope(
    ctx: &mut ValidationContext<'_>,
    tree: &TreeView<'_>,
    children: &[NodeId],
) -> Result<()> {
    let mut members = Vec::new();
    collect_members(tree, children, &mut members)?;

    // Attributes and elements live in separate symbol spaces
    let mut seen: FxHashSet<(bool, Option<&str>, &str)> = FxHashSet::default();
    let mut collisions = Vec::new();
    for member in &members {
        let Some(name) = member.name.as_deref() else {
            continue;
        };
        if !seen.insert((member.attribute, member.namespace.as_deref(), name)) {
            collisions.push(DiagnosticKind::NameCollision {
                name: name.to_string(),
                namespace: member.namespace.clone(),
            });
        }
    }
    let severity = ctx.config().name_collision;
    for kind in collisions {
        ctx.report(severity, kind);
    }

    let has_text = members.iter().any(|m| m.text);
    let has_elements = members.iter().any(|m| !m.text && !m.attribute && m.content);
    if has_text && has_elements {
        ctx.error(DiagnosticKind::MixedContent);
    }

    Ok(())
}
