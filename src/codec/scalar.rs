// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Scalar codecs and the dynamic [`Value`] passthrough.

use crate::backend::value::{ValueSink, ValueSource};
use crate::core::{At, Result, Value, DEFAULT_MAX_DEPTH};
use crate::protocol::{Sink, Source};
use crate::transcode::copy_value;

use super::{Codec, NullAware};

/// `bool` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolCodec;

impl Codec<bool> for BoolCodec {
    fn decode(&self, source: &mut dyn Source) -> Result<bool> {
        source.take_boolean()
    }

    fn encode(&self, sink: &mut dyn Sink, value: &bool) -> Result<()> {
        sink.put_boolean(*value)
    }

    fn describe(&self) -> String {
        "bool".to_string()
    }
}

/// `i32` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntCodec;

impl Codec<i32> for IntCodec {
    fn decode(&self, source: &mut dyn Source) -> Result<i32> {
        source.take_int()
    }

    fn encode(&self, sink: &mut dyn Sink, value: &i32) -> Result<()> {
        sink.put_int(*value)
    }

    fn describe(&self) -> String {
        "i32".to_string()
    }
}

/// `i64` codec. Also reads `Int` tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongCodec;

impl Codec<i64> for LongCodec {
    fn decode(&self, source: &mut dyn Source) -> Result<i64> {
        match source.peek()? {
            At::Int => source.take_int().map(i64::from),
            _ => source.take_long(),
        }
    }

    fn encode(&self, sink: &mut dyn Sink, value: &i64) -> Result<()> {
        sink.put_long(*value)
    }

    fn describe(&self) -> String {
        "i64".to_string()
    }
}

/// `f64` codec. Also reads integral tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleCodec;

impl Codec<f64> for DoubleCodec {
    fn decode(&self, source: &mut dyn Source) -> Result<f64> {
        match source.peek()? {
            At::Int => source.take_int().map(f64::from),
            // Precision loss above 2^53 is accepted here.
            At::Long => source.take_long().map(|v| v as f64),
            _ => source.take_double(),
        }
    }

    fn encode(&self, sink: &mut dyn Sink, value: &f64) -> Result<()> {
        sink.put_double(*value)
    }

    fn describe(&self) -> String {
        "f64".to_string()
    }
}

/// `String` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Codec<String> for StringCodec {
    fn decode(&self, source: &mut dyn Source) -> Result<String> {
        source.take_string()
    }

    fn encode(&self, sink: &mut dyn Sink, value: &String) -> Result<()> {
        sink.put_string(value)
    }

    fn describe(&self) -> String {
        "string".to_string()
    }
}

/// Passthrough codec for the dynamic [`Value`] tree.
///
/// Copies whatever the source holds through the generic transcoder, so any
/// well-formed value (including `Null`) decodes. The intermediate tree is
/// limited to `max_depth` levels below the value itself.
#[derive(Debug, Clone, Copy)]
pub struct ValueCodec {
    max_depth: usize,
}

impl ValueCodec {
    /// Passthrough nesting at most `max_depth` levels.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Default for ValueCodec {
    fn default() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }
}

impl Codec<Value> for ValueCodec {
    fn decode(&self, source: &mut dyn Source) -> Result<Value> {
        let mut sink = ValueSink::with_max_depth(self.max_depth);
        copy_value(source, &mut sink)?;
        sink.finish()
    }

    fn encode(&self, sink: &mut dyn Sink, value: &Value) -> Result<()> {
        let mut source = ValueSource::with_max_depth(value, self.max_depth);
        copy_value(&mut source, sink)
    }

    fn null_aware(&self) -> Option<&dyn NullAware> {
        Some(self)
    }

    fn describe(&self) -> String {
        "value".to_string()
    }
}

impl NullAware for ValueCodec {
    fn supports_null(&self) -> bool {
        true
    }
}
