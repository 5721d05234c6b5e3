// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Discriminated union binding.
//!
//! A union value is a struct whose reserved discriminator field (`@case` by
//! default) names the case. The discriminator may appear anywhere among the
//! fields, so decoding buffers every other field as tokens until it is
//! found, then replays the buffer into the case's record codec with paths
//! rooted at the union value.

use tracing::trace;

use crate::backend::buffer::BufferSink;
use crate::codec::{Codec, CodecRef};
use crate::core::{At, CodecError, Result};
use crate::protocol::{DynamicFields, Sink, Source};
use crate::resolve::{ErasedCodec, Lookup, Qualifier, Reflect};
use crate::transcode::copy_value;

use super::record::{RecordCodec, RecordMetadata};

/// Union metadata supplied per bindable sum type.
pub trait UnionMetadata: Reflect + Sized {
    /// Cases in declaration order. The first case whose projection matches
    /// an instance is used to encode it.
    fn cases() -> Vec<Case<Self>>;
}

/// One named variant of a union, carried by a record type.
pub struct Case<U> {
    name: String,
    port: Box<dyn CasePort<U>>,
}

impl<U: 'static> Case<U> {
    /// Case `name` whose payload is the record `C`.
    pub fn new<C: RecordMetadata>(
        name: impl Into<String>,
        wrap: fn(C) -> U,
        unwrap: fn(&U) -> Option<&C>,
    ) -> Self {
        Self {
            name: name.into(),
            port: Box::new(CaseFns { wrap, unwrap }),
        }
    }

    /// Case name written to the discriminator.
    pub fn name(&self) -> &str {
        &self.name
    }
}

trait CasePort<U>: Send + Sync {
    fn bind(&self, lookup: &mut Lookup<'_>, case_field: &str, name: &str)
        -> Result<Box<dyn BoundCase<U>>>;
}

trait BoundCase<U>: Send + Sync {
    fn decode(&self, source: &mut dyn Source) -> Result<U>;

    /// `None` when `value` is not this case.
    fn try_encode(&self, sink: &mut dyn Sink, value: &U) -> Option<Result<()>>;
}

struct CaseFns<U, C> {
    wrap: fn(C) -> U,
    unwrap: fn(&U) -> Option<&C>,
}

impl<U: 'static, C: RecordMetadata> CasePort<U> for CaseFns<U, C> {
    fn bind(
        &self,
        lookup: &mut Lookup<'_>,
        case_field: &str,
        name: &str,
    ) -> Result<Box<dyn BoundCase<U>>> {
        Ok(Box::new(CaseCodec {
            codec: RecordCodec::<C>::bind_case(lookup, case_field, name)?,
            wrap: self.wrap,
            unwrap: self.unwrap,
        }))
    }
}

struct CaseCodec<U, C: 'static> {
    codec: RecordCodec<C>,
    wrap: fn(C) -> U,
    unwrap: fn(&U) -> Option<&C>,
}

impl<U: 'static, C: RecordMetadata> BoundCase<U> for CaseCodec<U, C> {
    fn decode(&self, source: &mut dyn Source) -> Result<U> {
        self.codec.decode(source).map(self.wrap)
    }

    fn try_encode(&self, sink: &mut dyn Sink, value: &U) -> Option<Result<()>> {
        (self.unwrap)(value).map(|payload| self.codec.encode(sink, payload))
    }
}

struct NamedCase<U> {
    name: String,
    bound: Box<dyn BoundCase<U>>,
}

/// Codec for a [`UnionMetadata`] type.
pub struct UnionCodec<U> {
    case_field: String,
    cases: Vec<NamedCase<U>>,
    max_depth: usize,
}

impl<U: UnionMetadata> UnionCodec<U> {
    /// Bind every case of `U`.
    ///
    /// # Errors
    ///
    /// Two cases with the same name, or a case record declaring the
    /// discriminator field, are invariant violations.
    pub fn bind(lookup: &mut Lookup<'_>) -> Result<Self> {
        let config = lookup.config();
        let case_field = config.case_field.clone();
        let max_depth = config.max_depth;

        let declared = U::cases();
        let mut cases: Vec<NamedCase<U>> = Vec::with_capacity(declared.len());
        for case in declared {
            if cases.iter().any(|c| c.name == case.name) {
                return Err(CodecError::invariant_violation(format!(
                    "{} declares case '{}' twice",
                    std::any::type_name::<U>(),
                    case.name
                )));
            }
            let bound = case.port.bind(lookup, &case_field, &case.name)?;
            cases.push(NamedCase {
                name: case.name,
                bound,
            });
        }

        Ok(Self {
            case_field,
            cases,
            max_depth,
        })
    }

    /// Names of all cases.
    pub fn case_names(&self) -> Vec<String> {
        self.cases.iter().map(|c| c.name.clone()).collect()
    }

    fn find(&self, name: &str) -> Option<&NamedCase<U>> {
        self.cases.iter().find(|c| c.name == name)
    }
}

impl<U: UnionMetadata> Codec<U> for UnionCodec<U> {
    fn decode(&self, source: &mut dyn Source) -> Result<U> {
        let path = source.path();
        let fields = DynamicFields::new_ref();
        source.begin_struct(fields.clone())?;

        let mut buffer = BufferSink::with_max_depth(self.max_depth);
        buffer.begin_struct(fields.clone())?;

        let mut case: Option<String> = None;
        loop {
            match source.peek()? {
                At::Field => {
                    let index = source.take_field()?;
                    if fields.index_to_name(index) != self.case_field {
                        buffer.put_field(index)?;
                        copy_value(source, &mut buffer)?;
                        continue;
                    }
                    if case.is_some() {
                        return Err(source.unexpected(&format!(
                            "discriminator field '{}' appears twice",
                            self.case_field
                        )));
                    }
                    match source.peek()? {
                        At::String => case = Some(source.take_string()?),
                        other => {
                            return Err(CodecError::UnmatchedCase {
                                path,
                                detail: format!("discriminator must be a string, found {other}"),
                                expected: self.case_names(),
                            })
                        }
                    }
                }
                At::StructEnd => break,
                other => {
                    return Err(source.unexpected(&format!(
                        "expected a field or the end of the struct, found {other}"
                    )))
                }
            }
        }
        source.end_struct(&fields)?;
        buffer.end_struct(&fields)?;

        let name = case.ok_or_else(|| CodecError::MissingDiscriminator {
            path: path.clone(),
            field: self.case_field.clone(),
            expected: self.case_names(),
        })?;
        let selected = self.find(&name).ok_or_else(|| CodecError::UnmatchedCase {
            path: path.clone(),
            detail: format!("unknown case '{name}'"),
            expected: self.case_names(),
        })?;

        let buffer = buffer.finish()?;
        trace!(path = %path, case = %name, tokens = buffer.len(), "replaying union case");
        let mut replay = buffer.source_at(&path, self.max_depth);
        let value = selected.bound.decode(&mut replay)?;
        for diagnostic in replay.take_diagnostics() {
            source.report(diagnostic);
        }
        Ok(value)
    }

    fn encode(&self, sink: &mut dyn Sink, value: &U) -> Result<()> {
        for case in &self.cases {
            if let Some(result) = case.bound.try_encode(sink, value) {
                return result;
            }
        }
        Err(CodecError::UnmatchedCase {
            path: sink.path(),
            detail: format!(
                "cannot associate case for instance of {}",
                std::any::type_name::<U>()
            ),
            expected: self.case_names(),
        })
    }

    fn describe(&self) -> String {
        format!("union({})", self.case_names().join("|"))
    }
}

/// Resolver glue for union types.
pub(crate) fn bind_union<U: UnionMetadata>(
    lookup: &mut Lookup<'_>,
    _qualifier: &Qualifier,
) -> Result<ErasedCodec> {
    Ok(ErasedCodec::new(CodecRef::new(UnionCodec::<U>::bind(lookup)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::buffer::TokenBuffer;
    use crate::binding::record::Feature;
    use crate::binding::Slots;
    use crate::core::{ErrorKind, Token};
    use crate::resolve::{Resolver, TypeInfo};

    #[derive(Debug, Clone, PartialEq)]
    struct Text {
        body: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Count {
        n: i32,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Text(Text),
        Count(Count),
    }

    impl Reflect for Text {
        fn type_info() -> TypeInfo {
            TypeInfo::record::<Self>()
        }
    }

    impl RecordMetadata for Text {
        fn features() -> Vec<Feature<Self>> {
            vec![Feature::required("body", |t: &Text| &t.body)]
        }
        fn assemble(slots: &mut Slots) -> Result<Self> {
            Ok(Text {
                body: slots.take("body")?,
            })
        }
    }

    impl Reflect for Count {
        fn type_info() -> TypeInfo {
            TypeInfo::record::<Self>()
        }
    }

    impl RecordMetadata for Count {
        fn features() -> Vec<Feature<Self>> {
            vec![Feature::required("n", |c: &Count| &c.n)]
        }
        fn assemble(slots: &mut Slots) -> Result<Self> {
            Ok(Count { n: slots.take("n")? })
        }
    }

    impl Reflect for Event {
        fn type_info() -> TypeInfo {
            TypeInfo::union::<Self>()
        }
    }

    impl UnionMetadata for Event {
        fn cases() -> Vec<Case<Self>> {
            vec![
                Case::new("text", Event::Text, |e| match e {
                    Event::Text(t) => Some(t),
                    _ => None,
                }),
                Case::new("count", Event::Count, |e| match e {
                    Event::Count(c) => Some(c),
                    _ => None,
                }),
            ]
        }
    }

    fn field(name: &str) -> Token {
        Token::Field(name.to_string())
    }

    #[test]
    fn test_encode_writes_discriminator_first() {
        let resolver = Resolver::with_builtins();
        let codec = resolver.get::<Event>().unwrap();
        let mut sink = BufferSink::new();
        codec
            .encode(&mut sink, &Event::Count(Count { n: 4 }))
            .unwrap();
        assert_eq!(
            sink.finish().unwrap().tokens(),
            &[
                Token::StructStart,
                field("@case"),
                Token::String("count".to_string()),
                field("n"),
                Token::Int(4),
                Token::StructEnd,
            ]
        );
        assert_eq!(codec.describe(), "union(text|count)");
    }

    #[test]
    fn test_trailing_discriminator() {
        let resolver = Resolver::with_builtins();
        let codec = resolver.get::<Event>().unwrap();
        let buffer = TokenBuffer::from_tokens(vec![
            Token::StructStart,
            field("body"),
            Token::String("hi".to_string()),
            field("extra"),
            Token::ArrayStart,
            Token::Int(1),
            Token::ArrayEnd,
            field("@case"),
            Token::String("text".to_string()),
            Token::StructEnd,
        ]);
        let mut source = buffer.source();
        let event = codec.decode(&mut source).unwrap();
        assert_eq!(
            event,
            Event::Text(Text {
                body: "hi".to_string()
            })
        );
        assert!(source.is_exhausted());

        // The replay's unknown-field diagnostic reaches the outer source.
        let diagnostics = source.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, ErrorKind::UnknownField);
        assert_eq!(diagnostics[0].path, "$.extra");
    }

    #[test]
    fn test_bad_discriminators() {
        let resolver = Resolver::with_builtins();
        let codec = resolver.get::<Event>().unwrap();

        let numeric = TokenBuffer::from_tokens(vec![
            Token::StructStart,
            field("@case"),
            Token::Int(1),
            Token::StructEnd,
        ]);
        let err = codec.decode(&mut numeric.source()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmatchedCase);

        let twice = TokenBuffer::from_tokens(vec![
            Token::StructStart,
            field("@case"),
            Token::String("text".to_string()),
            field("@case"),
            Token::String("count".to_string()),
            Token::StructEnd,
        ]);
        let err = codec.decode(&mut twice.source()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralViolation);
        assert!(err.to_string().contains("appears twice"));
    }

    #[test]
    fn test_duplicate_case_names_rejected() {
        struct Twice;
        impl Reflect for Twice {
            fn type_info() -> TypeInfo {
                TypeInfo::union::<Self>()
            }
        }
        impl UnionMetadata for Twice {
            fn cases() -> Vec<Case<Self>> {
                vec![
                    Case::new("a", |_: Count| Twice, |_| None),
                    Case::new("a", |_: Text| Twice, |_| None),
                ]
            }
        }

        let resolver = Resolver::with_builtins();
        let err = resolver.get::<Twice>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }
}
