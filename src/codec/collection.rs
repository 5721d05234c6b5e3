// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Container codecs: sequences, optionals, boxes and string-keyed maps.
//!
//! Every container here implements [`ContainerCodec`], so an element codec
//! can be swapped without rebuilding the container by hand.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::{At, CodecError, Result};
use crate::protocol::{DynamicFields, Sink, Source};

use super::{Codec, CodecRef, ContainerCodec};

// =============================================================================
// Sequence
// =============================================================================

/// `Vec<E>` as an array region.
pub struct VecCodec<E: 'static> {
    element: CodecRef<E>,
}

impl<E: 'static> VecCodec<E> {
    /// Create a sequence codec over `element`.
    pub fn new(element: CodecRef<E>) -> Self {
        Self { element }
    }
}

impl<E: 'static> Codec<Vec<E>> for VecCodec<E> {
    fn decode(&self, source: &mut dyn Source) -> Result<Vec<E>> {
        source.begin_array()?;
        let mut items = Vec::new();
        while source.peek()? != At::ArrayEnd {
            items.push(self.element.decode(source)?);
        }
        source.end_array()?;
        Ok(items)
    }

    fn encode(&self, sink: &mut dyn Sink, value: &Vec<E>) -> Result<()> {
        sink.begin_array()?;
        for item in value {
            self.element.encode(sink, item)?;
        }
        sink.end_array()
    }

    fn describe(&self) -> String {
        format!("vec({})", self.element.describe())
    }
}

impl<E: 'static> ContainerCodec<E, Vec<E>> for VecCodec<E> {
    fn element(&self) -> &CodecRef<E> {
        &self.element
    }

    fn with_element(&self, element: CodecRef<E>) -> Arc<dyn ContainerCodec<E, Vec<E>>> {
        Arc::new(VecCodec::new(element))
    }

    fn into_codec(self: Arc<Self>) -> Arc<dyn Codec<Vec<E>>> {
        self
    }
}

// =============================================================================
// Optional
// =============================================================================

/// Lifts an element codec into `Option<E>`.
///
/// Decoding always yields `Some`; the codec is not null-aware, so
/// `Null` handling comes from [`CodecRef::to_nullable`]. Encoding `None`
/// writes `Null`.
pub struct OptionCodec<E: 'static> {
    element: CodecRef<E>,
}

impl<E: 'static> OptionCodec<E> {
    /// Create an optional codec over `element`.
    pub fn new(element: CodecRef<E>) -> Self {
        Self { element }
    }
}

impl<E: 'static> Codec<Option<E>> for OptionCodec<E> {
    fn decode(&self, source: &mut dyn Source) -> Result<Option<E>> {
        self.element.decode(source).map(Some)
    }

    fn encode(&self, sink: &mut dyn Sink, value: &Option<E>) -> Result<()> {
        match value {
            Some(inner) => self.element.encode(sink, inner),
            None => sink.put_null(),
        }
    }

    fn describe(&self) -> String {
        format!("option({})", self.element.describe())
    }
}

impl<E: 'static> ContainerCodec<E, Option<E>> for OptionCodec<E> {
    fn element(&self) -> &CodecRef<E> {
        &self.element
    }

    fn with_element(&self, element: CodecRef<E>) -> Arc<dyn ContainerCodec<E, Option<E>>> {
        Arc::new(OptionCodec::new(element))
    }

    fn into_codec(self: Arc<Self>) -> Arc<dyn Codec<Option<E>>> {
        self
    }
}

// =============================================================================
// Box
// =============================================================================

/// `Box<E>`, transparent on the wire.
pub struct BoxCodec<E: 'static> {
    element: CodecRef<E>,
}

impl<E: 'static> BoxCodec<E> {
    /// Create a box codec over `element`.
    pub fn new(element: CodecRef<E>) -> Self {
        Self { element }
    }
}

impl<E: 'static> Codec<Box<E>> for BoxCodec<E> {
    fn decode(&self, source: &mut dyn Source) -> Result<Box<E>> {
        self.element.decode(source).map(Box::new)
    }

    fn encode(&self, sink: &mut dyn Sink, value: &Box<E>) -> Result<()> {
        self.element.encode(sink, value)
    }

    fn describe(&self) -> String {
        format!("box({})", self.element.describe())
    }
}

impl<E: 'static> ContainerCodec<E, Box<E>> for BoxCodec<E> {
    fn element(&self) -> &CodecRef<E> {
        &self.element
    }

    fn with_element(&self, element: CodecRef<E>) -> Arc<dyn ContainerCodec<E, Box<E>>> {
        Arc::new(BoxCodec::new(element))
    }

    fn into_codec(self: Arc<Self>) -> Arc<dyn Codec<Box<E>>> {
        self
    }
}

// =============================================================================
// String-keyed map
// =============================================================================

/// `BTreeMap<String, E>` as a struct region with a dynamic field index.
///
/// Each map gets its own [`DynamicFields`]; a repeated key keeps the last value.
pub struct MapCodec<E: 'static> {
    element: CodecRef<E>,
}

impl<E: 'static> MapCodec<E> {
    /// Create a map codec over `element`.
    pub fn new(element: CodecRef<E>) -> Self {
        Self { element }
    }
}

impl<E: 'static> Codec<BTreeMap<String, E>> for MapCodec<E> {
    fn decode(&self, source: &mut dyn Source) -> Result<BTreeMap<String, E>> {
        let fields = DynamicFields::new_ref();
        source.begin_struct(fields.clone())?;
        let mut map = BTreeMap::new();
        loop {
            match source.peek()? {
                At::Field => {
                    let index = source.take_field()?;
                    let key = fields.index_to_name(index);
                    let value = self.element.decode(source)?;
                    map.insert(key, value);
                }
                At::StructEnd => break,
                other => {
                    return Err(source.unexpected(&format!(
                        "expected a map key or the end of the map, found {other}"
                    )))
                }
            }
        }
        source.end_struct(&fields)?;
        Ok(map)
    }

    fn encode(&self, sink: &mut dyn Sink, value: &BTreeMap<String, E>) -> Result<()> {
        let fields = DynamicFields::new_ref();
        sink.begin_struct(fields.clone())?;
        for (key, item) in value {
            let index = fields.name_to_index(key).ok_or_else(|| {
                CodecError::invariant_violation(format!("dynamic index refused key '{key}'"))
            })?;
            sink.put_field(index)?;
            self.element.encode(sink, item)?;
        }
        sink.end_struct(&fields)
    }

    fn describe(&self) -> String {
        format!("map({})", self.element.describe())
    }
}

impl<E: 'static> ContainerCodec<E, BTreeMap<String, E>> for MapCodec<E> {
    fn element(&self) -> &CodecRef<E> {
        &self.element
    }

    fn with_element(
        &self,
        element: CodecRef<E>,
    ) -> Arc<dyn ContainerCodec<E, BTreeMap<String, E>>> {
        Arc::new(MapCodec::new(element))
    }

    fn into_codec(self: Arc<Self>) -> Arc<dyn Codec<BTreeMap<String, E>>> {
        self
    }
}
