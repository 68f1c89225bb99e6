//! Loading definitions, type registries and configuration from disk

use std::io::Write;

use bindcheck::{
    empty_list, run_validation, BindError, BindingTree, ComponentKind, EmptyList, NodeId,
    Sequence, StaticTypeResolver, TraversalOrder, Validator,
};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

const TYPES_YAML: &str = r#"
types:
  - name: com.example.Party
    kind: complex
  - name: com.example.Customer
    kind: complex
    extends: [com.example.Party]
  - name: com.example.Order
    kind: complex
  - name: com.example.Line
    kind: complex
"#;

const ORDER_BINDING: &str = r#"
kind: binding
ns: "urn:shop"
children:
  - kind: mapping
    name: customer
    class: com.example.Customer
    children:
      - kind: value
        style: attribute
        name: id
        property: id
        ident: def
  - kind: mapping
    name: order
    class: com.example.Order
    children:
      - kind: value
        style: attribute
        name: id
        property: id
      - kind: value
        style: attribute
        name: buyer
        property: buyer
        type: com.example.Customer
        ident: ref
      - kind: structure
        name: shipTo
        property: shipTo
        type: com.example.Party
        map-as: customer
      - kind: collection
        name: lines
        property: lines
        type: List
        item-type: com.example.Line
        children:
          - kind: structure
            name: line
            type: com.example.Line
            children:
              - kind: value
                name: sku
                property: sku
              - kind: value
                name: qty
                property: qty
                type: int
"#;

fn temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_valid_binding_from_files() {
    let types = temp_file(TYPES_YAML);
    let binding = temp_file(ORDER_BINDING);

    let resolver = StaticTypeResolver::from_yaml_file(types.path()).unwrap();
    let mut tree = BindingTree::from_yaml_file(binding.path()).unwrap();
    assert_eq!(tree.len(), 11);
    assert_eq!(tree.kind(NodeId::ROOT), Some(ComponentKind::Binding));

    let report = run_validation(&mut tree, &resolver);

    assert_eq!(report.codes(), Vec::<&str>::new());
    assert!(tree.is_validated());
    assert_eq!(report.node_count, 11);
}

#[test]
fn test_broken_binding_reports_by_path() {
    let resolver = StaticTypeResolver::from_yaml(TYPES_YAML).unwrap();
    let mut tree = BindingTree::from_yaml(
        r#"
kind: binding
children:
  - kind: mapping
    name: order
    class: com.example.Order
    children:
      - kind: value
        style: attrib
        name: id
        property: id
      - kind: structure
        name: buyer
        property: buyer
        map-as: client
"#,
    )
    .unwrap();

    let report = run_validation(&mut tree, &resolver);

    let located: Vec<(&str, &str)> = report
        .diagnostics
        .iter()
        .map(|d| (d.code, d.path.as_str()))
        .collect();
    assert_eq!(
        located,
        vec![
            ("BIND-010", "binding/mapping[order]/value[id]"),
            ("BIND-031", "binding/mapping[order]/structure[buyer]"),
        ]
    );
    assert!(report.is_valid());
}

#[test]
fn test_malformed_definition_is_rejected() {
    let err = BindingTree::from_yaml("kind: binding\nchildren: 3\n").unwrap_err();
    assert!(matches!(err, BindError::Definition { .. }));

    let file = temp_file("kind: [");
    let err = BindingTree::from_yaml_file(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse binding definition"));
}

#[test]
fn test_registry_rejects_unknown_supertype() {
    let err = StaticTypeResolver::from_yaml(
        "types:\n  - name: com.example.Vip\n    kind: complex\n    extends: [com.example.Nobody]\n",
    )
    .unwrap_err();
    assert!(matches!(err, BindError::TypeRegistry { .. }));
}

#[test]
fn test_validator_config_from_file() {
    let resolver = StaticTypeResolver::from_yaml(TYPES_YAML).unwrap();
    let config = temp_file("traversal = \"reverse\"\nunresolved_type = \"fatal\"\n");

    let validator = Validator::from_config_file(&resolver, config.path()).unwrap();
    assert_eq!(validator.config().traversal, TraversalOrder::Reverse);

    let mut tree = BindingTree::from_yaml(
        "kind: binding\nchildren:\n  - kind: mapping\n    name: invoice\n    class: com.example.Invoice\n",
    )
    .unwrap();
    let report = validator.run(&mut tree);
    assert!(!report.is_valid());
    assert_eq!(report.codes(), vec!["BIND-011"]);
}

#[test]
fn test_unknown_config_key_is_rejected() {
    let resolver = StaticTypeResolver::new();
    let config = temp_file("strict = true\n");
    let err = Validator::from_config_file(&resolver, config.path())
        .err()
        .unwrap();
    assert!(format!("{:#}", err).contains("strict"));
}

#[test]
fn test_leaf_children_are_the_shared_empty_list() {
    let mut tree = BindingTree::from_yaml("kind: value\nstyle: text\nproperty: note\n").unwrap();
    let children = tree.children(NodeId::ROOT);
    assert!(children.is_empty());
    assert_eq!(children, EmptyList::<NodeId>::SHARED.as_slice());

    let report = run_validation(&mut tree, &StaticTypeResolver::new());
    assert!(report.is_valid());
}

#[test]
fn test_empty_list_mutators_fail_and_readers_succeed() {
    let mut list: EmptyList<NodeId> = empty_list();
    assert_eq!(Sequence::len(&list), 0);
    assert!(Sequence::is_empty(&list));
    assert_eq!(Sequence::get(&list, 0), None);
    assert_eq!(list.iter().count(), 0);

    assert_eq!(
        list.push(NodeId(1)),
        Err(BindError::UnsupportedOperation { operation: "push" })
    );
    assert!(list.insert(0, NodeId(1)).is_err());
    assert!(list.remove(0).is_err());
    assert!(list.remove_item(&NodeId(1)).is_err());
    assert!(list.clear().is_err());
    assert!(list.extend_from(vec![NodeId(2)]).is_err());
    assert!(list.reserve(4).is_err());
    assert_eq!(Sequence::len(&list), 0);
}
