//! Binding definition tree
//!
//! The tree owns every component in an arena. Parents know their children
//! by [`NodeId`]; nothing holds a reference to another node. Cross-references
//! between components (a structure using a mapping, a mapping extending
//! another) are resolved by name through [`TreeView`] at validation time.
//!
//! Components sit in `RefCell`s so the driver can run one node's hook
//! mutably while the hook reads the rest of the tree through a view.

use std::cell::{Ref, RefCell, RefMut};
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::component::{Component, ComponentKind};
use crate::definition::ComponentDef;
use crate::error::{BindError, Result};
use crate::sequence::empty_list;
use crate::types::{TypeInfo, TypeResolver};

/// Index of a component in its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Slot {
    component: RefCell<Box<dyn Component>>,
    parent: Option<NodeId>,
    // Index among the parent's children
    position: usize,
    children: Vec<NodeId>,
    // Declared identity, readable while the component itself is borrowed
    kind: ComponentKind,
    name: Option<String>,
    type_name: Option<String>,
    extends: Option<String>,
}

/// Tree of binding components
#[derive(Default)]
pub struct BindingTree {
    slots: Vec<Slot>,
    validated: bool,
}

impl BindingTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree whose root is `component`
    pub fn with_root(component: impl Component + 'static) -> Self {
        let mut tree = Self::new();
        tree.push_slot(None, Box::new(component));
        tree
    }

    pub fn set_root(&mut self, component: impl Component + 'static) -> Result<NodeId> {
        self.set_root_boxed(Box::new(component))
    }

    pub fn set_root_boxed(&mut self, component: Box<dyn Component>) -> Result<NodeId> {
        if !self.slots.is_empty() {
            return Err(BindError::RootExists);
        }
        Ok(self.push_slot(None, component))
    }

    /// Attach `component` as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeId, component: impl Component + 'static) -> Result<NodeId> {
        self.add_child_boxed(parent, Box::new(component))
    }

    pub fn add_child_boxed(&mut self, parent: NodeId, component: Box<dyn Component>) -> Result<NodeId> {
        if parent.0 >= self.slots.len() {
            return Err(BindError::UnknownNode { node: parent });
        }
        let position = self.slots[parent.0].children.len();
        let id = self.push_slot(Some(parent), component);
        self.slots[id.0].position = position;
        self.slots[parent.0].children.push(id);
        Ok(id)
    }

    fn push_slot(&mut self, parent: Option<NodeId>, component: Box<dyn Component>) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            kind: component.kind(),
            name: component.name().map(str::to_string),
            type_name: component.type_name().map(str::to_string),
            extends: component.extended_mapping().map(str::to_string),
            component: RefCell::new(component),
            parent,
            position: 0,
            children: Vec::new(),
        });
        self.validated = false;
        id
    }

    /// Build a tree from a definition fixture
    pub fn from_definition(root: ComponentDef) -> Result<Self> {
        let mut tree = Self::new();
        let (component, children) = root.into_parts();
        let root_id = tree.set_root_boxed(component)?;

        let mut pending = vec![(root_id, children)];
        while let Some((parent, defs)) = pending.pop() {
            for def in defs {
                let (component, children) = def.into_parts();
                let id = tree.add_child_boxed(parent, component)?;
                if !children.is_empty() {
                    pending.push((id, children));
                }
            }
        }
        Ok(tree)
    }

    /// Parse a YAML definition fixture
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let root: ComponentDef = serde_yaml::from_str(yaml).map_err(|e| BindError::Definition {
            reason: e.to_string(),
        })?;
        Self::from_definition(root)
    }

    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read binding definition from {:?}", path))?;
        Self::from_yaml(&yaml)
            .with_context(|| format!("Failed to parse binding definition {:?}", path))
    }

    pub fn root(&self) -> Option<NodeId> {
        if self.slots.is_empty() {
            None
        } else {
            Some(NodeId::ROOT)
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.slots.len()
    }

    /// All ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.slots.len()).map(NodeId)
    }

    /// Children in declaration order; leaves and unknown ids share the empty list
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.slots.get(id.0) {
            Some(slot) if !slot.children.is_empty() => &slot.children,
            _ => empty_list::<NodeId>().as_slice(),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots.get(id.0).and_then(|s| s.parent)
    }

    pub fn kind(&self, id: NodeId) -> Option<ComponentKind> {
        self.slots.get(id.0).map(|s| s.kind)
    }

    pub fn component(&self, id: NodeId) -> Result<Ref<'_, dyn Component>> {
        let slot = self.slot(id)?;
        let component = slot
            .component
            .try_borrow()
            .map_err(|_| BindError::NodeBusy { node: id })?;
        Ok(Ref::map(component, |c| &**c))
    }

    pub(crate) fn component_mut(&self, id: NodeId) -> Result<RefMut<'_, Box<dyn Component>>> {
        self.slot(id)?
            .component
            .try_borrow_mut()
            .map_err(|_| BindError::NodeBusy { node: id })
    }

    fn slot(&self, id: NodeId) -> Result<&Slot> {
        self.slots.get(id.0).ok_or(BindError::UnknownNode { node: id })
    }

    /// Location for diagnostics, e.g. `binding/mapping[order]/value[#2]`
    ///
    /// Linear in the depth of `id`; the driver only builds it for nodes that
    /// get a diagnostic.
    pub fn path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let Some(slot) = self.slots.get(node.0) else {
                break;
            };
            let segment = match (&slot.name, slot.parent) {
                (Some(name), _) => format!("{}[{}]", slot.kind, name),
                (None, Some(_)) => format!("{}[#{}]", slot.kind, slot.position),
                (None, None) => slot.kind.to_string(),
            };
            segments.push(segment);
            current = slot.parent;
        }
        segments.reverse();
        segments.join("/")
    }

    /// True once a run finished without fatal diagnostics
    ///
    /// Code generation must only consume a validated tree.
    pub fn is_validated(&self) -> bool {
        self.validated
    }

    pub(crate) fn set_validated(&mut self, validated: bool) {
        self.validated = validated;
    }
}

impl std::fmt::Debug for BindingTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingTree")
            .field("nodes", &self.slots.len())
            .field("validated", &self.validated)
            .finish()
    }
}

/// Read-only view of the tree handed to `validate`
///
/// The node being validated is not visible through the view (use `self`),
/// and neither are nodes aborted by a fatal diagnostic.
pub struct TreeView<'t> {
    tree: &'t BindingTree,
    // Aborted in phase 1
    skipped: &'t [bool],
    // Aborted in either phase
    aborted: &'t [bool],
    current: NodeId,
}

impl<'t> TreeView<'t> {
    pub(crate) fn new(
        tree: &'t BindingTree,
        skipped: &'t [bool],
        aborted: &'t [bool],
        current: NodeId,
    ) -> Self {
        Self {
            tree,
            skipped,
            aborted,
            current,
        }
    }

    /// The node whose hook is running
    pub fn current(&self) -> NodeId {
        self.current
    }

    /// Children of the running node
    pub fn children(&self) -> &'t [NodeId] {
        self.tree.children(self.current)
    }

    pub fn children_of(&self, id: NodeId) -> &'t [NodeId] {
        self.tree.children(id)
    }

    pub fn is_aborted(&self, id: NodeId) -> bool {
        self.aborted.get(id.0).copied().unwrap_or(false)
    }

    pub fn kind(&self, id: NodeId) -> Option<ComponentKind> {
        self.tree.kind(id)
    }

    /// A usable component, `None` if aborted, running or unknown
    pub fn get(&self, id: NodeId) -> Option<Ref<'t, dyn Component>> {
        if id == self.current || self.is_aborted(id) {
            return None;
        }
        self.tree.component(id).ok()
    }

    /// A component whose phase 1 state can be read
    ///
    /// Unlike [`get`](Self::get) this ignores aborts from phase 2, so
    /// cross-references see the same targets whatever the visiting order.
    pub fn prevalidated(&self, id: NodeId) -> Option<Ref<'t, dyn Component>> {
        let skipped = self.skipped.get(id.0).copied().unwrap_or(false);
        if id == self.current || skipped {
            return None;
        }
        self.tree.component(id).ok()
    }

    pub fn path(&self, id: NodeId) -> String {
        self.tree.path(id)
    }

    /// Ids of every mapping in the tree
    pub fn mappings(&self) -> impl Iterator<Item = NodeId> + 't {
        let tree = self.tree;
        tree.ids()
            .filter(move |id| tree.kind(*id) == Some(ComponentKind::Mapping))
    }

    /// Mapping referenced by `reference`: its element name, or else its class
    pub fn find_mapping(&self, reference: &str) -> Option<NodeId> {
        let slots = &self.tree.slots;
        self.mappings()
            .find(|id| slots[id.0].name.as_deref() == Some(reference))
            .or_else(|| {
                self.mappings()
                    .find(|id| slots[id.0].type_name.as_deref() == Some(reference))
            })
    }

    /// Declared `extends` reference of a node, readable for the running node too
    pub fn extends_of(&self, id: NodeId) -> Option<&'t str> {
        self.tree.slots.get(id.0)?.extends.as_deref()
    }

    /// First usable mapping whose class can stand in for `target`
    pub fn find_mapping_for_type(
        &self,
        target: &TypeInfo,
        resolver: &dyn TypeResolver,
    ) -> Option<NodeId> {
        self.mappings().find(|id| {
            self.prevalidated(*id)
                .and_then(|m| m.value_type().ok().flatten().cloned())
                .is_some_and(|mapped| resolver.is_assignable(&mapped, target))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{
        BindingComponent, MappingComponent, StructureComponent, ValueComponent,
    };

    fn sample() -> (BindingTree, NodeId, NodeId, NodeId) {
        let mut tree = BindingTree::with_root(BindingComponent::new());
        let root = tree.root().unwrap();
        let mapping = tree
            .add_child(root, MappingComponent::new("com.example.Order").named("order"))
            .unwrap();
        let id = tree
            .add_child(mapping, ValueComponent::attribute("id").property("id"))
            .unwrap();
        let text = tree
            .add_child(mapping, ValueComponent::text().property("note"))
            .unwrap();
        (tree, mapping, id, text)
    }

    #[test]
    fn builds_parent_child_edges() {
        let (tree, mapping, id, text) = sample();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.children(NodeId::ROOT), &[mapping]);
        assert_eq!(tree.children(mapping), &[id, text]);
        assert_eq!(tree.parent(id), Some(mapping));
        assert_eq!(tree.parent(NodeId::ROOT), None);
        assert!(tree.children(id).is_empty());
        assert!(tree.children(NodeId(99)).is_empty());
    }

    #[test]
    fn second_root_is_rejected() {
        let (mut tree, ..) = sample();
        let err = tree.set_root(BindingComponent::new()).unwrap_err();
        assert_eq!(err, BindError::RootExists);
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut tree = BindingTree::new();
        let err = tree
            .add_child(NodeId(3), StructureComponent::new())
            .unwrap_err();
        assert_eq!(err, BindError::UnknownNode { node: NodeId(3) });
    }

    #[test]
    fn paths_use_names_or_positions() {
        let (tree, mapping, id, text) = sample();
        assert_eq!(tree.path(NodeId::ROOT), "binding");
        assert_eq!(tree.path(mapping), "binding/mapping[order]");
        assert_eq!(tree.path(id), "binding/mapping[order]/value[id]");
        assert_eq!(tree.path(text), "binding/mapping[order]/value[#1]");
    }

    #[test]
    fn positions_are_recorded_per_parent() {
        let mut tree = BindingTree::with_root(BindingComponent::new());
        let wide = tree.add_child(NodeId::ROOT, StructureComponent::new()).unwrap();
        let last = (0..200)
            .map(|_| tree.add_child(wide, ValueComponent::text()).unwrap())
            .last()
            .unwrap();
        let sibling = tree.add_child(NodeId::ROOT, StructureComponent::new()).unwrap();

        assert_eq!(tree.path(last), "binding/structure[#0]/value[#199]");
        assert_eq!(tree.path(sibling), "binding/structure[#1]");
    }

    #[test]
    fn busy_component_is_reported() {
        let (tree, mapping, ..) = sample();
        let _held = tree.component_mut(mapping).unwrap();
        assert_eq!(
            tree.component(mapping).err(),
            Some(BindError::NodeBusy { node: mapping })
        );
    }

    #[test]
    fn view_hides_current_and_aborted_nodes() {
        let (tree, mapping, id, text) = sample();
        let skipped = vec![false; 4];
        let aborted = vec![false, false, false, true];
        let view = TreeView::new(&tree, &skipped, &aborted, id);

        assert!(view.get(id).is_none());
        assert!(view.get(text).is_none());
        assert!(view.prevalidated(text).is_some());
        assert!(view.get(mapping).is_some());
        assert_eq!(view.find_mapping("order"), Some(mapping));
        assert_eq!(view.find_mapping("com.example.Order"), Some(mapping));
        assert_eq!(view.find_mapping("invoice"), None);
    }

    #[test]
    fn mutation_clears_validated_flag() {
        let (mut tree, mapping, ..) = sample();
        tree.set_validated(true);
        tree.add_child(mapping, ValueComponent::element("total").property("total"))
            .unwrap();
        assert!(!tree.is_validated());
    }
}
