//! Type resolution
//!
//! Class metadata lives outside the validator. Components see it only
//! through the [`TypeResolver`] trait: name lookup during `prevalidate`
//! and assignability queries during `validate`.
//!
//! [`StaticTypeResolver`] is an in-memory registry, filled from code or
//! from a YAML fixture, used by tests and tooling.

use std::path::Path;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{BindError, Result};

/// Dotted identifier with an optional array suffix, e.g. `com.example.Order[]`
static TYPE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][\w$]*(\.[A-Za-z_$][\w$]*)*(\[\])*$").expect("valid type name regex")
});

/// Whether `name` is syntactically a type name at all
pub fn is_well_formed_type_name(name: &str) -> bool {
    TYPE_NAME_RE.is_match(name)
}

/// Broad classification of a resolved type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// Built-in scalar (`int`, `boolean`, ...)
    Primitive,
    /// Object type with a text form (`String`, dates, enums)
    Simple,
    /// Object type with its own structure
    Complex,
    /// Array or collection class
    Collection,
}

/// Resolved value-type information
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeInfo {
    pub name: String,
    pub kind: TypeKind,
}

impl TypeInfo {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn primitive(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Primitive)
    }

    pub fn simple(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Simple)
    }

    pub fn complex(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Complex)
    }

    pub fn collection(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Collection)
    }

    /// Can be written as attribute or text content
    pub fn is_simple(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive | TypeKind::Simple)
    }

    pub fn is_collection(&self) -> bool {
        self.kind == TypeKind::Collection
    }
}

impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Lookup of declared type names
pub trait TypeResolver {
    /// Resolve a declared name, `None` if unknown
    fn resolve(&self, name: &str) -> Option<TypeInfo>;

    /// Whether a value of `from` can be stored where `to` is expected
    fn is_assignable(&self, from: &TypeInfo, to: &TypeInfo) -> bool;
}

/// Root of every non-primitive type
pub const OBJECT_TYPE: &str = "Object";

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double",
];

const SIMPLE_TYPES: &[&str] = &["String", "Decimal", "Date", "DateTime", "Uri"];

const COLLECTION_TYPES: &[&str] = &["List", "Set", "Collection"];

#[derive(Debug, Clone)]
struct TypeEntry {
    kind: TypeKind,
    supertypes: Vec<String>,
}

/// In-memory type registry
#[derive(Debug, Clone)]
pub struct StaticTypeResolver {
    types: FxHashMap<String, TypeEntry>,
}

/// One declared type in a YAML registry
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeDecl {
    name: String,
    kind: TypeKind,
    #[serde(default)]
    extends: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeRegistryDoc {
    types: Vec<TypeDecl>,
}

impl StaticTypeResolver {
    /// Registry with the built-in primitive, simple and collection types
    pub fn new() -> Self {
        let mut types = FxHashMap::default();
        types.insert(
            OBJECT_TYPE.to_string(),
            TypeEntry {
                kind: TypeKind::Complex,
                supertypes: Vec::new(),
            },
        );
        for name in PRIMITIVES {
            types.insert(
                name.to_string(),
                TypeEntry {
                    kind: TypeKind::Primitive,
                    supertypes: Vec::new(),
                },
            );
        }
        for name in SIMPLE_TYPES {
            types.insert(
                name.to_string(),
                TypeEntry {
                    kind: TypeKind::Simple,
                    supertypes: Vec::new(),
                },
            );
        }
        for name in COLLECTION_TYPES {
            types.insert(
                name.to_string(),
                TypeEntry {
                    kind: TypeKind::Collection,
                    supertypes: vec!["Collection".to_string()],
                },
            );
        }
        Self { types }
    }

    /// Register a type (builder style)
    pub fn with_type(mut self, name: &str, kind: TypeKind, supertypes: &[&str]) -> Self {
        self.types.insert(
            name.to_string(),
            TypeEntry {
                kind,
                supertypes: supertypes.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    /// Register a type, checking the name and that supertypes are known
    pub fn register(&mut self, name: &str, kind: TypeKind, supertypes: Vec<String>) -> Result<()> {
        if !is_well_formed_type_name(name) {
            return Err(BindError::TypeRegistry {
                reason: format!("malformed type name '{name}'"),
            });
        }
        if let Some(missing) = supertypes.iter().find(|s| !self.types.contains_key(s.as_str())) {
            return Err(BindError::TypeRegistry {
                reason: format!("'{name}' extends undeclared type '{missing}'"),
            });
        }
        self.types
            .insert(name.to_string(), TypeEntry { kind, supertypes });
        Ok(())
    }

    /// Load extra types from a YAML document with a `types:` list
    ///
    /// Types are registered in order, so a supertype must be listed before
    /// the types extending it.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let doc: TypeRegistryDoc = serde_yaml::from_str(yaml).map_err(|e| BindError::TypeRegistry {
            reason: e.to_string(),
        })?;

        let mut resolver = Self::new();
        for decl in doc.types {
            resolver.register(&decl.name, decl.kind, decl.extends)?;
        }
        Ok(resolver)
    }

    /// Load a YAML registry from disk
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read type registry from {:?}", path))?;
        Self::from_yaml(&yaml).with_context(|| format!("Failed to parse type registry {:?}", path))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Whether `name` reaches `target` through declared supertypes
    fn extends(&self, name: &str, target: &str) -> bool {
        let mut seen = FxHashSet::default();
        let mut pending = vec![name];
        while let Some(current) = pending.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(entry) = self.types.get(current) {
                pending.extend(entry.supertypes.iter().map(String::as_str));
            }
        }
        false
    }
}

impl Default for StaticTypeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeResolver for StaticTypeResolver {
    fn resolve(&self, name: &str) -> Option<TypeInfo> {
        if let Some(component) = name.strip_suffix("[]") {
            // Arrays of any resolvable type
            return self
                .resolve(component)
                .map(|_| TypeInfo::collection(name));
        }
        self.types
            .get(name)
            .map(|entry| TypeInfo::new(name, entry.kind))
    }

    fn is_assignable(&self, from: &TypeInfo, to: &TypeInfo) -> bool {
        if from.name == to.name {
            return true;
        }
        if from.kind == TypeKind::Primitive || to.kind == TypeKind::Primitive {
            return false;
        }
        to.name == OBJECT_TYPE || self.extends(&from.name, &to.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_names() {
        assert!(is_well_formed_type_name("int"));
        assert!(is_well_formed_type_name("com.example.Order"));
        assert!(is_well_formed_type_name("Outer$Inner"));
        assert!(is_well_formed_type_name("String[]"));
        assert!(!is_well_formed_type_name(""));
        assert!(!is_well_formed_type_name("com..Order"));
        assert!(!is_well_formed_type_name("com.example.Order "));
        assert!(!is_well_formed_type_name("1Order"));
        assert!(!is_well_formed_type_name("List<String>"));
    }

    #[test]
    fn builtins_resolve() {
        let resolver = StaticTypeResolver::new();
        assert_eq!(resolver.resolve("int"), Some(TypeInfo::primitive("int")));
        assert_eq!(resolver.resolve("String"), Some(TypeInfo::simple("String")));
        assert_eq!(resolver.resolve("List"), Some(TypeInfo::collection("List")));
        assert_eq!(resolver.resolve("com.example.Missing"), None);
    }

    #[test]
    fn arrays_resolve_when_component_does() {
        let resolver = StaticTypeResolver::new();
        assert_eq!(resolver.resolve("int[]"), Some(TypeInfo::collection("int[]")));
        assert_eq!(resolver.resolve("Nope[]"), None);
    }

    #[test]
    fn assignability_follows_supertypes() {
        let resolver = StaticTypeResolver::new()
            .with_type("com.example.Party", TypeKind::Complex, &[])
            .with_type("com.example.Customer", TypeKind::Complex, &["com.example.Party"])
            .with_type("com.example.Vip", TypeKind::Complex, &["com.example.Customer"]);

        let party = TypeInfo::complex("com.example.Party");
        let vip = TypeInfo::complex("com.example.Vip");
        let object = TypeInfo::complex(OBJECT_TYPE);

        assert!(resolver.is_assignable(&vip, &party));
        assert!(!resolver.is_assignable(&party, &vip));
        assert!(resolver.is_assignable(&party, &object));
        assert!(!resolver.is_assignable(&TypeInfo::primitive("int"), &object));
        assert!(resolver.is_assignable(&TypeInfo::primitive("int"), &TypeInfo::primitive("int")));
    }

    #[test]
    fn cyclic_supertypes_terminate() {
        let resolver = StaticTypeResolver::new()
            .with_type("A", TypeKind::Complex, &["B"])
            .with_type("B", TypeKind::Complex, &["A"]);
        assert!(!resolver.is_assignable(&TypeInfo::complex("A"), &TypeInfo::complex("C")));
    }

    #[test]
    fn registry_from_yaml() {
        let resolver = StaticTypeResolver::from_yaml(
            r#"
types:
  - name: com.example.Party
    kind: complex
  - name: com.example.Customer
    kind: complex
    extends: [com.example.Party]
  - name: com.example.Status
    kind: simple
"#,
        )
        .unwrap();

        assert!(resolver.contains("com.example.Customer"));
        assert_eq!(
            resolver.resolve("com.example.Status"),
            Some(TypeInfo::simple("com.example.Status"))
        );
        assert!(resolver.is_assignable(
            &TypeInfo::complex("com.example.Customer"),
            &TypeInfo::complex("com.example.Party"),
        ));
    }

    #[test]
    fn registry_rejects_undeclared_supertype() {
        let err = StaticTypeResolver::from_yaml(
            r#"
types:
  - name: com.example.Customer
    kind: complex
    extends: [com.example.Party]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, BindError::TypeRegistry { .. }));
        assert!(err.to_string().contains("com.example.Party"));
    }

    #[test]
    fn registry_rejects_malformed_name() {
        let mut resolver = StaticTypeResolver::new();
        let err = resolver
            .register("not a type", TypeKind::Complex, Vec::new())
            .unwrap_err();
        assert!(matches!(err, BindError::TypeRegistry { .. }));
    }
}
