#![allow(dead_code)]

use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MessageOptions,
};

use protoschema::{Record, Value};

fn json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

pub fn scalar(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_owned()),
        json_name: Some(json_name(name)),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

pub fn typed(name: &str, number: i32, ty: Type, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_owned()),
        ..scalar(name, number, ty)
    }
}

pub fn repeated(field: FieldDescriptorProto) -> FieldDescriptorProto {
    FieldDescriptorProto {
        label: Some(Label::Repeated as i32),
        ..field
    }
}

pub fn required(field: FieldDescriptorProto) -> FieldDescriptorProto {
    FieldDescriptorProto {
        label: Some(Label::Required as i32),
        ..field
    }
}

pub fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_owned()),
        field: fields,
        ..Default::default()
    }
}

pub fn enumeration(name: &str, values: &[(&str, i32)]) -> EnumDescriptorProto {
    EnumDescriptorProto {
        name: Some(name.to_owned()),
        value: values
            .iter()
            .map(|(n, v)| EnumValueDescriptorProto {
                name: Some((*n).to_owned()),
                number: Some(*v),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

fn map_entry(name: &str, key: Type, value: Type) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_owned()),
        field: vec![scalar("key", 1, key), scalar("value", 2, value)],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn file(
    name: &str,
    package: &str,
    syntax: &str,
    messages: Vec<DescriptorProto>,
    enums: Vec<EnumDescriptorProto>,
) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.to_owned()),
        package: Some(package.to_owned()),
        message_type: messages,
        enum_type: enums,
        syntax: Some(syntax.to_owned()),
        ..Default::default()
    }
}

pub fn encode_set(files: Vec<FileDescriptorProto>) -> Vec<u8> {
    FileDescriptorSet { file: files }.encode_to_vec()
}

/// proto2 `demo` package used across the integration tests.
///
/// ```proto
/// enum Color { RED = 0; BLUE = 1; }
/// message Point { optional int32 x = 1; optional int32 y = 2; }
/// message Paint { optional Color color = 1; }
/// message Counter { optional int32 count = 1; repeated int32 values = 2; }
/// message Blob { optional bytes data = 1; optional string text = 2; }
/// message Node { optional string name = 1; repeated Node children = 2; optional Node parent = 3; }
/// message Shape {
///   optional string label = 1; repeated Point points = 2; optional Point origin = 3;
///   map<string, int32> tags = 4; repeated Color palette = 5; optional double weight = 6;
///   optional bool visible = 7; optional uint64 big = 8; optional sint64 delta = 9;
///   optional float ratio = 10; optional string display_name = 11;
/// }
/// message Req { required int32 id = 1; optional int32 n = 2; }
/// message ReqHolder { optional Req inner = 1; repeated Req many = 2; }
/// ```
pub fn demo_file() -> FileDescriptorProto {
    let point = message(
        "Point",
        vec![scalar("x", 1, Type::Int32), scalar("y", 2, Type::Int32)],
    );
    let paint = message(
        "Paint",
        vec![typed("color", 1, Type::Enum, ".demo.Color")],
    );
    let counter = message(
        "Counter",
        vec![
            scalar("count", 1, Type::Int32),
            repeated(scalar("values", 2, Type::Int32)),
        ],
    );
    let blob = message(
        "Blob",
        vec![scalar("data", 1, Type::Bytes), scalar("text", 2, Type::String)],
    );
    let node = message(
        "Node",
        vec![
            scalar("name", 1, Type::String),
            repeated(typed("children", 2, Type::Message, ".demo.Node")),
            typed("parent", 3, Type::Message, ".demo.Node"),
        ],
    );
    let mut shape = message(
        "Shape",
        vec![
            scalar("label", 1, Type::String),
            repeated(typed("points", 2, Type::Message, ".demo.Point")),
            typed("origin", 3, Type::Message, ".demo.Point"),
            repeated(typed("tags", 4, Type::Message, ".demo.Shape.TagsEntry")),
            repeated(typed("palette", 5, Type::Enum, ".demo.Color")),
            scalar("weight", 6, Type::Double),
            scalar("visible", 7, Type::Bool),
            scalar("big", 8, Type::Uint64),
            scalar("delta", 9, Type::Sint64),
            scalar("ratio", 10, Type::Float),
            scalar("display_name", 11, Type::String),
        ],
    );
    shape.nested_type = vec![map_entry("TagsEntry", Type::String, Type::Int32)];
    let req = message(
        "Req",
        vec![required(scalar("id", 1, Type::Int32)), scalar("n", 2, Type::Int32)],
    );
    let req_holder = message(
        "ReqHolder",
        vec![
            typed("inner", 1, Type::Message, ".demo.Req"),
            repeated(typed("many", 2, Type::Message, ".demo.Req")),
        ],
    );

    file(
        "demo.proto",
        "demo",
        "proto2",
        vec![point, paint, counter, blob, node, shape, req, req_holder],
        vec![enumeration("Color", &[("RED", 0), ("BLUE", 1)])],
    )
}

/// proto3 message with implicit presence: `message Plain { int32 n = 1; string s = 2; }`
pub fn plain_file() -> FileDescriptorProto {
    file(
        "plain.proto",
        "plain",
        "proto3",
        vec![message(
            "Plain",
            vec![scalar("n", 1, Type::Int32), scalar("s", 2, Type::String)],
        )],
        vec![],
    )
}

pub fn demo_set() -> Vec<u8> {
    encode_set(vec![demo_file(), plain_file()])
}

pub fn record<const N: usize>(entries: [(&str, Value); N]) -> Record {
    entries.into_iter().collect()
}

pub fn rec<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Record(record(entries))
}

/// Route library events to the test output; `RUST_LOG=debug` shows them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
