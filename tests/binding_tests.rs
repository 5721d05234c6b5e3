// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record and union binding tests.

mod common;

use common::{buffer, encode_tokens, field, string, Circle, Node, Person, Shape, Square};
use serde_json::json;
use structcodec::{
    Case, CodecConfig, CodecError, ErrorKind, Feature, RecordMetadata, Reflect, Resolver, Result,
    Slots, Token, TypeInfo, UnionMetadata, Value,
};

// ============================================================================
// Records
// ============================================================================

#[test]
fn test_encode_person_in_feature_order() {
    let resolver = Resolver::with_builtins();
    let codec = resolver.get::<Person>().unwrap();
    let tokens = encode_tokens(
        &codec,
        &Person {
            name: "Ann".to_string(),
            age: Some(30),
        },
    );
    assert_eq!(
        tokens,
        vec![
            Token::StructStart,
            field("name"),
            string("Ann"),
            field("age"),
            Token::Int(30),
            Token::StructEnd,
        ]
    );
}

#[test]
fn test_omittable_absent_feature_is_silent() {
    let resolver = Resolver::with_builtins();
    let codec = resolver.get::<Person>().unwrap();
    let tokens = buffer(vec![
        Token::StructStart,
        field("name"),
        string("Bo"),
        Token::StructEnd,
    ]);
    let mut source = tokens.source();
    let person = codec.decode(&mut source).unwrap();
    assert_eq!(
        person,
        Person {
            name: "Bo".to_string(),
            age: None,
        }
    );
    assert!(source.diagnostics().is_empty());
}

#[test]
fn test_explicit_null_decodes_to_absent() {
    let resolver = Resolver::with_builtins();
    let codec = resolver.get::<Person>().unwrap();
    let tokens = buffer(vec![
        Token::StructStart,
        field("age"),
        Token::Null,
        field("name"),
        string("Cy"),
        Token::StructEnd,
    ]);
    let person = codec.decode(&mut tokens.source()).unwrap();
    assert_eq!(person.age, None);
    assert_eq!(person.name, "Cy");
}

#[test]
fn test_unknown_field_is_reported_and_skipped() {
    let resolver = Resolver::with_builtins();
    let codec = resolver.get::<Person>().unwrap();
    let tokens = buffer(vec![
        Token::StructStart,
        field("name"),
        string("Di"),
        field("nickname"),
        Token::StructStart,
        field("short"),
        string("D"),
        Token::StructEnd,
        field("age"),
        Token::Int(41),
        Token::StructEnd,
    ]);
    let mut source = tokens.source();
    let person = codec.decode(&mut source).unwrap();
    assert_eq!(person.age, Some(41));
    assert!(source.is_exhausted());

    let diagnostics = source.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, ErrorKind::UnknownField);
    assert_eq!(diagnostics[0].path, "$.nickname");
}

#[test]
fn test_verify_violation_is_a_diagnostic() {
    let resolver = Resolver::with_builtins();
    let (person, diagnostics) = resolver
        .decode_value_lenient::<Person>(&Value::structure([
            ("name", Value::from("Ed")),
            ("age", Value::Int(-3)),
        ]))
        .unwrap();
    assert_eq!(person.age, Some(-3));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, ErrorKind::ValidationFailure);
    assert_eq!(diagnostics[0].message, "age must not be negative, got -3");
}

#[test]
fn test_strict_mode_turns_diagnostics_into_failure() {
    let resolver = Resolver::builder()
        .with_builtins()
        .config(CodecConfig::default().with_strict(true))
        .build();
    let doc = json!({"name": "Fay", "extra": true});
    let err = resolver.from_json::<Person>(&doc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    assert_eq!(err.path(), Some("$.extra"));

    let ok = resolver.from_json::<Person>(&json!({"name": "Fay"})).unwrap();
    assert_eq!(ok.name, "Fay");
}

#[test]
fn test_missing_required_feature_fails_with_path() {
    let resolver = Resolver::with_builtins();
    let err = resolver
        .from_json::<Vec<Person>>(&json!([{"name": "Gus"}, {"age": 3}]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    assert_eq!(err.path(), Some("$[1]"));
}

#[test]
fn test_json_round_trip() {
    let resolver = Resolver::with_builtins();
    let people = vec![
        Person {
            name: "Hal".to_string(),
            age: Some(7),
        },
        Person {
            name: "Ivy".to_string(),
            age: None,
        },
    ];
    let doc = resolver.to_json(&people).unwrap();
    assert_eq!(doc, json!([{"name": "Hal", "age": 7}, {"name": "Ivy"}]));
    let back: Vec<Person> = resolver.from_json(&doc).unwrap();
    assert_eq!(back, people);
}

// ============================================================================
// Unions
// ============================================================================

fn circle_with_case_at(position: usize) -> Vec<Token> {
    let mut body = vec![
        field("radius"),
        Token::Double(2.0),
        field("label"),
        string("c"),
    ];
    body.splice(position..position, [field("@case"), string("circle")]);
    let mut tokens = vec![Token::StructStart];
    tokens.extend(body);
    tokens.push(Token::StructEnd);
    tokens
}

#[test]
fn test_discriminator_position_does_not_matter() {
    let resolver = Resolver::with_builtins();
    let codec = resolver.get::<Shape>().unwrap();
    for position in [0, 2, 4] {
        let tokens = buffer(circle_with_case_at(position));
        let mut source = tokens.source();
        let shape = codec.decode(&mut source).unwrap();
        assert_eq!(shape, Shape::Circle(Circle { radius: 2.0 }));
        assert!(source.is_exhausted());
        // `label` is not a feature of Circle.
        let diagnostics = source.take_diagnostics();
        assert_eq!(diagnostics.len(), 1, "case at {position}");
        assert_eq!(diagnostics[0].path, "$.label");
    }
}

#[test]
fn test_union_encode_writes_case_first() {
    let resolver = Resolver::with_builtins();
    let codec = resolver.get::<Shape>().unwrap();
    let tokens = encode_tokens(&codec, &Shape::Square(Square { side: 1.5 }));
    assert_eq!(
        tokens,
        vec![
            Token::StructStart,
            field("@case"),
            string("square"),
            field("side"),
            Token::Double(1.5),
            Token::StructEnd,
        ]
    );
}

#[test]
fn test_unknown_case_is_unmatched() {
    let resolver = Resolver::with_builtins();
    let err = resolver
        .from_json::<Shape>(&json!({"@case": "triangle", "side": 1}))
        .unwrap_err();
    match err {
        CodecError::UnmatchedCase {
            path,
            detail,
            expected,
        } => {
            assert_eq!(path, "$");
            assert_eq!(detail, "unknown case 'triangle'");
            assert_eq!(expected, vec!["circle".to_string(), "square".to_string()]);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_missing_discriminator() {
    let resolver = Resolver::with_builtins();
    let err = resolver
        .from_json::<Vec<Shape>>(&json!([{"@case": "circle", "radius": 1.0}, {"radius": 1.0}]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingDiscriminator);
    assert_eq!(err.path(), Some("$[1]"));
    assert!(err.to_string().contains("'@case'"));
}

#[test]
fn test_configured_case_field() {
    let resolver = Resolver::builder()
        .with_builtins()
        .config(CodecConfig::default().with_case_field("kind"))
        .build();
    let doc = resolver
        .to_json(&Shape::Circle(Circle { radius: 3.0 }))
        .unwrap();
    assert_eq!(doc, json!({"kind": "circle", "radius": 3.0}));
    let back: Shape = resolver.from_json(&doc).unwrap();
    assert_eq!(back, Shape::Circle(Circle { radius: 3.0 }));
}

#[test]
fn test_union_diagnostics_keep_sequence_paths() {
    let resolver = Resolver::with_builtins();
    let (shapes, diagnostics) = resolver
        .from_json_lenient::<Vec<Shape>>(&json!([
            {"@case": "square", "side": 2.0},
            {"radius": 4.0, "@case": "circle", "color": "red"}
        ]))
        .unwrap();
    assert_eq!(
        shapes,
        vec![
            Shape::Square(Square { side: 2.0 }),
            Shape::Circle(Circle { radius: 4.0 })
        ]
    );
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].path, "$[1].color");
}

// ============================================================================
// Configured nesting limit
// ============================================================================

/// Record carrying an arbitrary dynamic payload.
#[derive(Debug, Clone, PartialEq)]
struct Blob {
    payload: Value,
}

impl Reflect for Blob {
    fn type_info() -> TypeInfo {
        TypeInfo::record::<Self>()
    }
}

impl RecordMetadata for Blob {
    fn features() -> Vec<Feature<Self>> {
        vec![Feature::required("payload", |b: &Blob| &b.payload)]
    }

    fn assemble(slots: &mut Slots) -> Result<Self> {
        Ok(Blob {
            payload: slots.take("payload")?,
        })
    }
}

/// Single-case union around a recursive record.
#[derive(Debug, Clone, PartialEq)]
enum Tree {
    Root(Node),
}

impl Reflect for Tree {
    fn type_info() -> TypeInfo {
        TypeInfo::union::<Self>()
    }
}

impl UnionMetadata for Tree {
    fn cases() -> Vec<Case<Self>> {
        vec![Case::new("root", Tree::Root, |t| match t {
            Tree::Root(node) => Some(node),
        })]
    }
}

fn resolver_with_depth(max_depth: usize) -> Resolver {
    Resolver::builder()
        .with_builtins()
        .config(CodecConfig {
            max_depth,
            ..CodecConfig::default()
        })
        .build()
}

/// Chain of `levels` nodes; every level opens a struct and an array.
fn node_chain(levels: usize) -> Node {
    let mut node = Node {
        label: "leaf".to_string(),
        children: Vec::new(),
    };
    for level in 1..levels {
        node = Node {
            label: format!("level{level}"),
            children: vec![node],
        };
    }
    node
}

fn nested_arrays(levels: usize) -> Value {
    let mut value = Value::Int(1);
    for _ in 0..levels {
        value = Value::Array(vec![value]);
    }
    value
}

#[test]
fn test_union_payload_follows_configured_depth() {
    let resolver = resolver_with_depth(1000);
    // 70 levels open 140 regions, beyond the default limit.
    let tree = Tree::Root(node_chain(70));

    let value = resolver.encode_value(&tree).unwrap();
    let back: Tree = resolver.decode_value(&value).unwrap();
    assert_eq!(back, tree);

    let doc = resolver.to_json(&tree).unwrap();
    let back: Tree = resolver.from_json(&doc).unwrap();
    assert_eq!(back, tree);
}

#[test]
fn test_union_payload_beyond_configured_depth_fails() {
    let value = Resolver::with_builtins()
        .encode_value(&Tree::Root(node_chain(15)))
        .unwrap();

    let err = resolver_with_depth(20)
        .decode_value::<Tree>(&value)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralViolation);
    assert!(err.to_string().contains("maximum nesting depth 20"));

    let shallow = Tree::Root(node_chain(5));
    let resolver = resolver_with_depth(20);
    let value = resolver.encode_value(&shallow).unwrap();
    assert_eq!(resolver.decode_value::<Tree>(&value).unwrap(), shallow);
}

#[test]
fn test_value_feature_follows_configured_depth() {
    let resolver = resolver_with_depth(1000);
    let blob = Blob {
        payload: nested_arrays(200),
    };

    let value = resolver.encode_value(&blob).unwrap();
    let back: Blob = resolver.decode_value(&value).unwrap();
    assert_eq!(back, blob);
}

#[test]
fn test_value_feature_beyond_configured_depth_fails() {
    let resolver = resolver_with_depth(50);
    let blob = Blob {
        payload: nested_arrays(60),
    };
    let err = resolver.encode_value(&blob).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralViolation);

    let value = Value::structure([("payload", nested_arrays(60))]);
    let err = resolver.decode_value::<Blob>(&value).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralViolation);
    assert!(err.to_string().contains("maximum nesting depth 50"));

    let shallow = Blob {
        payload: nested_arrays(40),
    };
    let value = resolver.encode_value(&shallow).unwrap();
    assert_eq!(resolver.decode_value::<Blob>(&value).unwrap(), shallow);
}

#[test]
fn test_json_integer_width_is_not_kept_for_dynamic_values() {
    let resolver = Resolver::with_builtins();
    let doc = resolver.to_json(&Value::Long(5)).unwrap();
    assert_eq!(doc, json!(5));
    assert_eq!(resolver.from_json::<Value>(&doc).unwrap(), Value::Int(5));
    assert_eq!(resolver.from_json::<i64>(&doc).unwrap(), 5);
}
