// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Resolver integration tests.
//!
//! Priority tiers, qualifiers, memoization, the unsupported sentinel and
//! recursive types, exercised through the public API.

mod common;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use common::{encode_tokens, field, string, Node, Person};
use structcodec::codec::{Codec, StringCodec};
use structcodec::{
    CodecError, CodecFactory, CodecRef, ErrorKind, Lookup, Qualifier, Reflect, Resolution,
    Resolver, Result, Sink, Source, Token, TypeInfo, TypedFactory, Value, BUILTIN_PRIORITY,
};

/// Uppercases strings on encode.
struct Shouting;

impl Codec<String> for Shouting {
    fn decode(&self, source: &mut dyn Source) -> Result<String> {
        source.take_string()
    }

    fn encode(&self, sink: &mut dyn Sink, value: &String) -> Result<()> {
        sink.put_string(&value.to_uppercase())
    }

    fn describe(&self) -> String {
        "shouting".to_string()
    }
}

/// Counts how often it is consulted and answers for `String` only.
struct Counting {
    name: &'static str,
    calls: Arc<AtomicUsize>,
}

impl CodecFactory for Counting {
    fn name(&self) -> &str {
        self.name
    }

    fn create(
        &self,
        _lookup: &mut Lookup<'_>,
        ty: &TypeInfo,
        _qualifier: &Qualifier,
    ) -> Result<Resolution> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if ty.is::<String>() {
            Ok(Resolution::supported(CodecRef::new(Shouting)))
        } else {
            Ok(Resolution::Unsupported)
        }
    }
}

// ============================================================================
// Tiers and qualifiers
// ============================================================================

#[test]
fn test_higher_priority_overrides_builtin() {
    let resolver = Resolver::builder()
        .with_builtins()
        .register(
            BUILTIN_PRIORITY + 1,
            Qualifier::NONE,
            TypedFactory::<String>::new("shout", CodecRef::new(Shouting)),
        )
        .build();

    let codec = resolver.get::<String>().unwrap();
    assert_eq!(codec.describe(), "shouting");

    // Records pick the override up for their string features.
    let person = resolver.get::<Person>().unwrap();
    let tokens = encode_tokens(
        &person,
        &Person {
            name: "ann".to_string(),
            age: None,
        },
    );
    assert_eq!(
        tokens,
        vec![
            Token::StructStart,
            field("name"),
            string("ANN"),
            Token::StructEnd,
        ]
    );
}

#[test]
fn test_same_tier_conflict_names_both_factories() {
    let resolver = Resolver::builder()
        .register(
            5,
            Qualifier::NONE,
            TypedFactory::<String>::new("first", CodecRef::new(StringCodec)),
        )
        .register(
            5,
            Qualifier::NONE,
            TypedFactory::<String>::new("second", CodecRef::new(Shouting)),
        )
        .build();

    match resolver.get::<String>().unwrap_err() {
        CodecError::AmbiguousResolution {
            priority,
            factories,
            ..
        } => {
            assert_eq!(priority, 5);
            assert_eq!(factories, vec!["first".to_string(), "second".to_string()]);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_lower_tier_is_not_consulted_after_a_hit() {
    let high_calls = Arc::new(AtomicUsize::new(0));
    let low_calls = Arc::new(AtomicUsize::new(0));
    let resolver = Resolver::builder()
        .register(
            1,
            Qualifier::NONE,
            Counting {
                name: "low",
                calls: low_calls.clone(),
            },
        )
        .register(
            9,
            Qualifier::NONE,
            Counting {
                name: "high",
                calls: high_calls.clone(),
            },
        )
        .build();

    resolver.get::<String>().unwrap();
    assert_eq!(high_calls.load(Ordering::SeqCst), 1);
    assert_eq!(low_calls.load(Ordering::SeqCst), 0);

    // A miss in the high tier falls through to the low one.
    assert!(!resolver.is_supported::<i32>(&Qualifier::NONE).unwrap());
    assert_eq!(high_calls.load(Ordering::SeqCst), 2);
    assert_eq!(low_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_qualified_lookup_uses_qualified_factories_only() {
    let loud = Qualifier::named("loud");
    let resolver = Resolver::builder()
        .with_builtins()
        .register(
            0,
            loud.clone(),
            TypedFactory::<String>::new("shout", CodecRef::new(Shouting)),
        )
        .build();

    assert_eq!(resolver.get::<String>().unwrap().describe(), "string");
    assert_eq!(
        resolver.get_qualified::<String>(&loud).unwrap().describe(),
        "shouting"
    );
    // No qualified factory for i32: the sentinel, not the builtin.
    assert!(!resolver.is_supported::<i32>(&loud).unwrap());
}

// ============================================================================
// Memoization and the sentinel
// ============================================================================

#[test]
fn test_lookups_are_memoized() {
    let calls = Arc::new(AtomicUsize::new(0));
    let resolver = Resolver::builder()
        .register(
            0,
            Qualifier::NONE,
            Counting {
                name: "counting",
                calls: calls.clone(),
            },
        )
        .build();

    let first = resolver.get::<String>().unwrap();
    let second = resolver.get::<String>().unwrap();
    assert!(first.ptr_eq(&second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unsupported_sentinel_fails_on_use() {
    let resolver = Resolver::with_builtins();

    #[derive(Debug)]
    struct Opaque;
    impl Reflect for Opaque {
        fn type_info() -> TypeInfo {
            TypeInfo::of::<Self>(structcodec::Shape::Opaque)
        }
    }

    let codec = resolver.get::<Opaque>().unwrap();
    let buffer = common::buffer(vec![Token::Null]);
    let err = codec.decode(&mut buffer.source()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvedType);
    assert!(err.to_string().contains("Opaque"));

    let mut sink = structcodec::backend::BufferSink::new();
    assert_eq!(
        codec.encode(&mut sink, &Opaque).unwrap_err().kind(),
        ErrorKind::UnresolvedType
    );
}

#[test]
fn test_nullable_variant_is_cached() {
    let resolver = Resolver::with_builtins();
    let plain = resolver.get::<Value>().unwrap();
    assert!(plain.supports_null());

    let codec: CodecRef<Option<String>> = resolver.get::<Option<String>>().unwrap();
    let a = codec.to_nullable();
    let b = resolver.get_nullable::<Option<String>>().unwrap();
    assert!(a.ptr_eq(&b));
}

#[test]
fn test_container_element_rebinding() {
    let resolver = Resolver::with_builtins();
    let list = resolver.get::<Vec<i32>>().unwrap();
    let container = list.as_container::<i32>().unwrap();
    assert_eq!(container.element().describe(), "i32");

    struct Negating;
    impl Codec<i32> for Negating {
        fn decode(&self, source: &mut dyn Source) -> Result<i32> {
            Ok(-source.take_int()?)
        }
        fn encode(&self, sink: &mut dyn Sink, value: &i32) -> Result<()> {
            sink.put_int(-*value)
        }
    }

    let negated = CodecRef::from_container(container.with_element(CodecRef::new(Negating)));
    assert_eq!(
        encode_tokens(&negated, &vec![1, 2]),
        vec![
            Token::ArrayStart,
            Token::Int(-1),
            Token::Int(-2),
            Token::ArrayEnd
        ]
    );
    // The original container is untouched.
    assert_eq!(
        encode_tokens(&list, &vec![1]),
        vec![Token::ArrayStart, Token::Int(1), Token::ArrayEnd]
    );
}

#[test]
fn test_optional_element_rebinding() {
    let resolver = Resolver::with_builtins();
    let optional = resolver.get::<Option<i32>>().unwrap();
    assert!(optional.supports_null());
    let container = optional.as_container::<i32>().unwrap();
    assert_eq!(container.element().describe(), "i32");

    struct Doubling;
    impl Codec<i32> for Doubling {
        fn decode(&self, source: &mut dyn Source) -> Result<i32> {
            Ok(source.take_int()? / 2)
        }
        fn encode(&self, sink: &mut dyn Sink, value: &i32) -> Result<()> {
            sink.put_int(*value * 2)
        }
    }

    let doubled = CodecRef::from_container(container.with_element(CodecRef::new(Doubling)))
        .to_nullable();
    assert_eq!(encode_tokens(&doubled, &Some(4)), vec![Token::Int(8)]);
    assert_eq!(encode_tokens(&doubled, &None), vec![Token::Null]);

    let buffer = common::buffer(vec![Token::Null]);
    assert_eq!(doubled.decode(&mut buffer.source()).unwrap(), None);
}

// ============================================================================
// Concurrency and recursion
// ============================================================================

#[test]
fn test_concurrent_lookups_agree() {
    let resolver = Resolver::with_builtins();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let resolver = resolver.clone();
            thread::spawn(move || resolver.get::<BTreeMap<String, Vec<Person>>>().unwrap())
        })
        .collect();

    let codecs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let reference = resolver.get::<BTreeMap<String, Vec<Person>>>().unwrap();
    for codec in &codecs {
        assert!(codec.ptr_eq(&reference));
    }
}

#[test]
fn test_recursive_type_round_trip() {
    let resolver = Resolver::with_builtins();
    let tree = Node {
        label: "root".to_string(),
        children: vec![
            Node {
                label: "a".to_string(),
                children: vec![Node {
                    label: "a1".to_string(),
                    children: Vec::new(),
                }],
            },
            Node {
                label: "b".to_string(),
                children: Vec::new(),
            },
        ],
    };

    let value = resolver.encode_value(&tree).unwrap();
    let children = value.field("children").and_then(Value::as_array).unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].field("label"), Some(&Value::from("a")));

    let back: Node = resolver.decode_value(&value).unwrap();
    assert_eq!(back, tree);
}
