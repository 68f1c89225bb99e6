//! bindcheck - two-phase semantic validation of XML data-binding definitions
//!
//! A binding definition is a tree of components (mappings, structures,
//! collections, values) describing how objects map to XML. Before code
//! generation may use it, the tree is validated in two phases:
//!
//! 1. **prevalidate**: each component checks its own configuration and
//!    resolves its declared types.
//! 2. **validate**: each component checks itself against the rest of the
//!    tree (names, references, content model), with the namespace and
//!    enclosing type of its ancestors in scope.
//!
//! ```
//! use bindcheck::{
//!     run_validation, BindingComponent, BindingTree, MappingComponent, StaticTypeResolver,
//!     TypeKind, ValueComponent,
//! };
//!
//! let resolver = StaticTypeResolver::new().with_type("com.example.Order", TypeKind::Complex, &[]);
//! let mut tree = BindingTree::with_root(BindingComponent::new());
//! let order = tree
//!     .add_child(tree.root().unwrap(), MappingComponent::new("com.example.Order").named("order"))
//!     .unwrap();
//! tree.add_child(order, ValueComponent::attribute("id").property("id")).unwrap();
//!
//! let report = run_validation(&mut tree, &resolver);
//! assert!(report.is_valid());
//! assert!(tree.is_validated());
//! ```

pub mod component;
pub mod config;
pub mod context;
pub mod definition;
pub mod diagnostic;
pub mod error;
pub mod report;
pub mod sequence;
pub mod tree;
pub mod types;
pub mod validator;

pub use component::{
    BindingComponent, CollectionComponent, Component, ComponentBase, ComponentKind, Ident,
    MappingComponent, PhaseCell, StructureComponent, ValueComponent, ValueStyle,
};
pub use config::{TraversalOrder, ValidationConfig};
pub use context::{Phase, ScopeFrame, ValidationContext};
pub use definition::ComponentDef;
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use error::{BindError, FixSuggestion, Result};
pub use report::{Report, Summary};
pub use sequence::{empty_list, EmptyList, Sequence};
pub use tree::{BindingTree, NodeId, TreeView};
pub use types::{StaticTypeResolver, TypeInfo, TypeKind, TypeResolver, OBJECT_TYPE};
pub use validator::{ensure_valid, run_validation, Validator};
