mod common;

use std::sync::Arc;

use common::{demo_set, init_tracing, rec, record};
use protoschema::{register_builtin, ErrorKind, SchemaRegistry, SourceKind, Value};

#[test]
fn same_type_resolves_to_same_adapter() {
    let registry = SchemaRegistry::from_bytes(&demo_set()).unwrap();
    let a = registry.resolve("demo.Point").unwrap();
    let b = registry.resolve("demo.Point").unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let clone = registry.clone();
    let c = clone.resolve("demo.Point").unwrap();
    assert!(Arc::ptr_eq(&a, &c));
    assert_eq!(registry.cached_len(), 1);
}

#[test]
fn descriptor_lookup_shares_the_name_cache() {
    let registry = SchemaRegistry::from_bytes(&demo_set()).unwrap();
    let by_name = registry.resolve("demo.Point").unwrap();
    let descriptor = registry.source().resolve_type("demo.Point").unwrap();
    let by_descriptor = registry.adapter_for(&descriptor);
    assert!(Arc::ptr_eq(&by_name, &by_descriptor));
}

#[test]
fn separate_registries_do_not_share_adapters() {
    let blob = demo_set();
    let first = SchemaRegistry::from_bytes(&blob).unwrap();
    let second = SchemaRegistry::from_bytes(&blob).unwrap();
    let a = first.resolve("demo.Point").unwrap();
    let b = second.resolve("demo.Point").unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn unknown_type_is_absent() {
    let registry = SchemaRegistry::from_bytes(&demo_set()).unwrap();
    assert!(registry.resolve("demo.Nope").is_none());
    assert!(registry.resolve("").is_none());
    assert!(registry.resolve("Point").is_none());
    assert_eq!(registry.cached_len(), 0);
}

#[test]
fn malformed_descriptor_set_is_rejected() {
    init_tracing();
    let err = SchemaRegistry::from_bytes(&[0xff, 0xff, 0xff]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDescriptor);
    assert!(err.to_string().starts_with("Malformed descriptor"));
}

#[test]
fn dangling_type_reference_is_rejected() {
    use common::{encode_set, file, message, typed};
    use prost_types::field_descriptor_proto::Type;

    let broken = file(
        "broken.proto",
        "broken",
        "proto2",
        vec![message(
            "Holder",
            vec![typed("missing", 1, Type::Message, ".broken.Missing")],
        )],
        vec![],
    );
    let err = SchemaRegistry::from_bytes(&encode_set(vec![broken])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDescriptor);
}

#[test]
fn empty_blob_is_an_empty_schema() {
    let registry = SchemaRegistry::from_bytes(&[]).unwrap();
    assert_eq!(registry.source().kind(), SourceKind::Bytes);
    assert!(registry.resolve("demo.Point").is_none());
}

#[test]
fn message_names_cover_nested_types() {
    let registry = SchemaRegistry::from_bytes(&demo_set()).unwrap();
    let names: Vec<_> = registry.source().message_names().collect();
    for expected in ["demo.Point", "demo.Shape", "demo.Shape.TagsEntry", "plain.Plain"] {
        assert!(names.iter().any(|n| n == expected), "{expected} missing from {names:?}");
    }
}

#[test]
fn nested_adapters_are_built_lazily() {
    let registry = SchemaRegistry::from_bytes(&demo_set()).unwrap();
    let shape = registry.resolve("demo.Shape").unwrap();
    assert_eq!(registry.cached_len(), 1);

    shape.encode(&rec([("label", Value::from("x"))])).unwrap();
    assert_eq!(registry.cached_len(), 1);

    shape
        .encode(&rec([("origin", rec([("x", Value::from(1))]))]))
        .unwrap();
    assert_eq!(registry.cached_len(), 2);
    let point = registry.resolve("demo.Point").unwrap();
    assert_eq!(registry.cached_len(), 2);
    assert_eq!(point.full_name(), "demo.Point");
}

#[test]
fn recursive_types_round_trip() {
    let registry = SchemaRegistry::from_bytes(&demo_set()).unwrap();
    let node = registry.resolve("demo.Node").unwrap();
    assert_eq!(registry.cached_len(), 1);

    let tree = record([
        ("name", Value::from("root")),
        (
            "children",
            Value::List(vec![
                rec([
                    ("name", Value::from("left")),
                    ("children", Value::List(vec![rec([("name", Value::from("leaf"))])])),
                ]),
                rec([("name", Value::from("right"))]),
            ]),
        ),
        ("parent", rec([("name", Value::from("up"))])),
    ]);

    let bytes = node.encode(&Value::Record(tree.clone())).unwrap();
    assert_eq!(node.decode(&bytes).unwrap(), tree);
    // every nested value is a Node: still one adapter
    assert_eq!(registry.cached_len(), 1);
}

#[test]
fn adapter_outlives_its_registry() {
    let shape = {
        let registry = SchemaRegistry::from_bytes(&demo_set()).unwrap();
        registry.resolve("demo.Shape").unwrap()
    };
    let input = record([("origin", rec([("x", Value::from(2)), ("y", Value::from(3))]))]);
    let bytes = shape.encode(&Value::Record(input.clone())).unwrap();
    assert_eq!(shape.decode(&bytes).unwrap(), input);
}

#[test]
fn concurrent_first_access_builds_one_adapter() {
    init_tracing();
    let registry = SchemaRegistry::from_bytes(&demo_set()).unwrap();
    let adapters: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| registry.resolve("demo.Shape").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for adapter in &adapters[1..] {
        assert!(Arc::ptr_eq(&adapters[0], adapter));
    }
    assert_eq!(registry.cached_len(), 1);
}

#[test]
fn builtin_registry_sees_registered_files() {
    use common::{encode_set, file, message, scalar};
    use prost_types::field_descriptor_proto::Type;

    let before = SchemaRegistry::builtin();
    assert_eq!(before.source().kind(), SourceKind::Builtin);
    assert!(before.resolve("builtin.Ping").is_none());

    let ping = file(
        "builtin_ping.proto",
        "builtin",
        "proto2",
        vec![message("Ping", vec![scalar("seq", 1, Type::Uint32)])],
        vec![],
    );
    register_builtin(&encode_set(vec![ping])).unwrap();

    let after = SchemaRegistry::builtin();
    let adapter = after.resolve("builtin.Ping").unwrap();
    let bytes = adapter.encode(&rec([("seq", Value::from(7u32))])).unwrap();
    assert_eq!(bytes, vec![0x08, 0x07]);
    assert_eq!(
        adapter.decode(&bytes).unwrap(),
        record([("seq", Value::UInt32(7))])
    );
}
