// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Generic transcoder.
//!
//! Structure-preserving copy from any [`Source`] to any [`Sink`]. Field
//! names are carried verbatim; each struct region gets a fresh
//! [`DynamicFields`] that both sides share, so the field index the source
//! allocates is the index the sink translates back into a name.

use tracing::trace;

use crate::core::{At, CodecError, Result};
use crate::protocol::{DynamicFields, Sink, Source};

/// Copy one complete value from `source` to `sink`.
///
/// # Errors
///
/// Fails with an invariant violation if the source is not positioned at the
/// start of a value, and propagates any protocol error from either side.
pub fn transcode(source: &mut dyn Source, sink: &mut dyn Sink) -> Result<()> {
    copy_value(source, sink)
}

/// Copy the value under the source cursor, recursing into containers.
pub fn copy_value(source: &mut dyn Source, sink: &mut dyn Sink) -> Result<()> {
    let at = source.peek()?;
    trace!(path = %source.path(), at = %at, "copy");
    match at {
        At::Null => {
            source.take_null()?;
            sink.put_null()
        }
        At::Int => sink.put_int(source.take_int()?),
        At::Long => sink.put_long(source.take_long()?),
        At::Double => sink.put_double(source.take_double()?),
        At::Boolean => sink.put_boolean(source.take_boolean()?),
        At::String => {
            let value = source.take_string()?;
            sink.put_string(&value)
        }
        At::ArrayStart => {
            source.begin_array()?;
            sink.begin_array()?;
            while source.peek()? != At::ArrayEnd {
                copy_value(source, sink)?;
            }
            source.end_array()?;
            sink.end_array()
        }
        At::StructStart => {
            let fields = DynamicFields::new_ref();
            source.begin_struct(fields.clone())?;
            sink.begin_struct(fields.clone())?;
            loop {
                match source.peek()? {
                    At::Field => {
                        let index = source.take_field()?;
                        sink.put_field(index)?;
                        copy_value(source, sink)?;
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
            sink.end_struct(&fields)
        }
        At::Field | At::StructEnd | At::ArrayEnd | At::Eof => {
            Err(CodecError::invariant_violation(format!(
                "transcoder asked to copy a value at {} but the source is at {at}",
                source.path()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::buffer::{BufferSink, TokenBuffer};
    use crate::core::{ErrorKind, Token};
    use crate::protocol::{same_index, FieldIndex, FieldIndexRef};

    fn tokens(list: Vec<Token>) -> TokenBuffer {
        TokenBuffer::from_tokens(list)
    }

    /// Records the field indexes each struct region is opened with and the
    /// field positions written into them.
    #[derive(Default)]
    struct RegionSink {
        open: Vec<FieldIndexRef>,
        regions: Vec<FieldIndexRef>,
        fields: Vec<usize>,
    }

    impl Sink for RegionSink {
        fn put_null(&mut self) -> Result<()> {
            Ok(())
        }
        fn put_int(&mut self, _value: i32) -> Result<()> {
            Ok(())
        }
        fn put_long(&mut self, _value: i64) -> Result<()> {
            Ok(())
        }
        fn put_double(&mut self, _value: f64) -> Result<()> {
            Ok(())
        }
        fn put_boolean(&mut self, _value: bool) -> Result<()> {
            Ok(())
        }
        fn put_string(&mut self, _value: &str) -> Result<()> {
            Ok(())
        }
        fn begin_array(&mut self) -> Result<()> {
            Ok(())
        }
        fn end_array(&mut self) -> Result<()> {
            Ok(())
        }
        fn begin_struct(&mut self, fields: FieldIndexRef) -> Result<()> {
            self.regions.push(fields.clone());
            self.open.push(fields);
            Ok(())
        }
        fn put_field(&mut self, index: usize) -> Result<()> {
            self.fields.push(index);
            Ok(())
        }
        fn end_struct(&mut self, fields: &FieldIndexRef) -> Result<()> {
            match self.open.pop() {
                Some(opened) if same_index(&opened, fields) => Ok(()),
                _ => Err(self.unexpected("end_struct with a foreign field index")),
            }
        }
        fn path(&self) -> String {
            "$".to_string()
        }
    }

    #[test]
    fn test_copy_nested() {
        let input = tokens(vec![
            Token::StructStart,
            Token::Field("items".to_string()),
            Token::ArrayStart,
            Token::Int(1),
            Token::StructStart,
            Token::Field("name".to_string()),
            Token::String("x".to_string()),
            Token::StructEnd,
            Token::Null,
            Token::ArrayEnd,
            Token::Field("ok".to_string()),
            Token::Boolean(true),
            Token::StructEnd,
        ]);
        let mut source = input.source();
        let mut sink = BufferSink::new();
        transcode(&mut source, &mut sink).unwrap();
        assert_eq!(sink.finish().unwrap(), input);
    }

    #[test]
    fn test_structural_tag_is_invariant_violation() {
        let input = tokens(vec![Token::StructEnd]);
        let mut source = input.source();
        let mut sink = BufferSink::new();
        let err = transcode(&mut source, &mut sink).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn test_empty_source_is_invariant_violation() {
        let input = tokens(vec![]);
        let mut source = input.source();
        let mut sink = BufferSink::new();
        let err = transcode(&mut source, &mut sink).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn test_repeated_field_names_keep_order() {
        let input = tokens(vec![
            Token::StructStart,
            Token::Field("a".to_string()),
            Token::Int(1),
            Token::Field("b".to_string()),
            Token::Int(2),
            Token::Field("a".to_string()),
            Token::Int(3),
            Token::StructEnd,
        ]);
        let mut source = input.source();
        let mut sink = BufferSink::new();
        transcode(&mut source, &mut sink).unwrap();
        assert_eq!(sink.finish().unwrap(), input);
    }

    #[test]
    fn test_each_struct_region_gets_its_own_index() {
        let input = tokens(vec![
            Token::StructStart,
            Token::Field("a".to_string()),
            Token::Int(1),
            Token::Field("inner".to_string()),
            Token::StructStart,
            Token::Field("b".to_string()),
            Token::Int(2),
            Token::StructEnd,
            Token::StructEnd,
        ]);
        let mut sink = RegionSink::default();
        transcode(&mut input.source(), &mut sink).unwrap();

        assert_eq!(sink.regions.len(), 2);
        assert!(!same_index(&sink.regions[0], &sink.regions[1]));
        // The inner region numbers its fields from zero.
        assert_eq!(sink.fields, vec![0, 1, 0]);
        assert_eq!(sink.regions[1].index_to_name(0), "b");
        assert!(sink.open.is_empty());
    }
}
