// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Sentinel codec for (type, qualifier) pairs no factory supports.
//!
//! Composition treats the sentinel like any other codec, so a container over
//! an unsupported element can still be built and inspected. The failure is
//! deferred until a value is actually decoded or encoded.

use std::marker::PhantomData;

use crate::core::{CodecError, Result};
use crate::protocol::{Sink, Source};

use super::Codec;

/// Codec whose every call fails with an unresolved-type error.
pub struct UnsupportedCodec<T> {
    type_name: &'static str,
    qualifier: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> UnsupportedCodec<T> {
    /// Create the sentinel for `T` under `qualifier`.
    pub fn new(qualifier: impl Into<String>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            qualifier: qualifier.into(),
            _marker: PhantomData,
        }
    }

    fn error(&self) -> CodecError {
        CodecError::unresolved(self.type_name, &self.qualifier)
    }
}

impl<T> Codec<T> for UnsupportedCodec<T> {
    fn decode(&self, _source: &mut dyn Source) -> Result<T> {
        Err(self.error())
    }

    fn encode(&self, _sink: &mut dyn Sink, _value: &T) -> Result<()> {
        Err(self.error())
    }

    fn describe(&self) -> String {
        format!("unsupported({} qualifier {})", self.type_name, self.qualifier)
    }
}
