// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Builtin factories.
//!
//! All of them register at [`BUILTIN_PRIORITY`] without a qualifier and
//! dispatch on the [`Shape`] of the requested type. Container element types
//! are always resolved unqualified.

use std::sync::Arc;

use crate::codec::{
    BoolCodec, CodecRef, DoubleCodec, IntCodec, LongCodec, StringCodec, ValueCodec,
};
use crate::core::Result;

use super::{
    CodecFactory, ErasedCodec, Lookup, Priority, Qualifier, Reflect, Resolution, ResolverBuilder,
    Shape, TypeInfo,
};

/// Priority of the builtin factories.
pub const BUILTIN_PRIORITY: Priority = 0;

pub(crate) fn register_builtins(builder: ResolverBuilder) -> ResolverBuilder {
    builder
        .register(BUILTIN_PRIORITY, Qualifier::NONE, ScalarFactory)
        .register(BUILTIN_PRIORITY, Qualifier::NONE, DynamicFactory)
        .register(BUILTIN_PRIORITY, Qualifier::NONE, ContainerFactory)
        .register(BUILTIN_PRIORITY, Qualifier::NONE, RecordFactory)
        .register(BUILTIN_PRIORITY, Qualifier::NONE, UnionFactory)
}

// =============================================================================
// Scalars
// =============================================================================

/// `bool`, `i32`, `i64`, `f64` and `String`.
pub struct ScalarFactory;

impl CodecFactory for ScalarFactory {
    fn name(&self) -> &str {
        "builtin.scalar"
    }

    fn create(
        &self,
        _lookup: &mut Lookup<'_>,
        ty: &TypeInfo,
        _qualifier: &Qualifier,
    ) -> Result<Resolution> {
        let resolution = match ty.shape() {
            Shape::Boolean => Resolution::supported(CodecRef::new(BoolCodec)),
            Shape::Int => Resolution::supported(CodecRef::new(IntCodec)),
            Shape::Long => Resolution::supported(CodecRef::new(LongCodec)),
            Shape::Double => Resolution::supported(CodecRef::new(DoubleCodec)),
            Shape::String => Resolution::supported(CodecRef::new(StringCodec)),
            _ => Resolution::Unsupported,
        };
        Ok(resolution)
    }
}

/// Dynamic [`Value`](crate::core::Value) passthrough.
pub struct DynamicFactory;

impl CodecFactory for DynamicFactory {
    fn name(&self) -> &str {
        "builtin.dynamic"
    }

    fn create(
        &self,
        lookup: &mut Lookup<'_>,
        ty: &TypeInfo,
        _qualifier: &Qualifier,
    ) -> Result<Resolution> {
        match ty.shape() {
            Shape::Dynamic => Ok(Resolution::supported(CodecRef::new(
                ValueCodec::with_max_depth(lookup.config().max_depth),
            ))),
            _ => Ok(Resolution::Unsupported),
        }
    }
}

// =============================================================================
// Containers
// =============================================================================

/// Sequences, optionals, boxes and string-keyed maps.
///
/// The container is built even when its element resolves to the
/// unsupported sentinel; the failure surfaces on first use.
pub struct ContainerFactory;

impl CodecFactory for ContainerFactory {
    fn name(&self) -> &str {
        "builtin.container"
    }

    fn create(
        &self,
        lookup: &mut Lookup<'_>,
        ty: &TypeInfo,
        _qualifier: &Qualifier,
    ) -> Result<Resolution> {
        let element = match ty.shape() {
            Shape::Sequence(element)
            | Shape::Optional(element)
            | Shape::Boxed(element)
            | Shape::Map(element) => *element,
            _ => return Ok(Resolution::Unsupported),
        };
        let element_codec = lookup.resolve(&element.info(), &Qualifier::NONE)?;
        Ok(Resolution::Supported(element.assemble(element_codec)?))
    }
}

// =============================================================================
// Records and unions
// =============================================================================

/// Types described by [`RecordMetadata`](crate::binding::RecordMetadata).
pub struct RecordFactory;

impl CodecFactory for RecordFactory {
    fn name(&self) -> &str {
        "builtin.record"
    }

    fn create(
        &self,
        lookup: &mut Lookup<'_>,
        ty: &TypeInfo,
        qualifier: &Qualifier,
    ) -> Result<Resolution> {
        match ty.shape() {
            Shape::Record(binder) => Ok(Resolution::Supported(binder.bind(lookup, qualifier)?)),
            _ => Ok(Resolution::Unsupported),
        }
    }
}

/// Types described by [`UnionMetadata`](crate::binding::UnionMetadata).
pub struct UnionFactory;

impl CodecFactory for UnionFactory {
    fn name(&self) -> &str {
        "builtin.union"
    }

    fn create(
        &self,
        lookup: &mut Lookup<'_>,
        ty: &TypeInfo,
        qualifier: &Qualifier,
    ) -> Result<Resolution> {
        match ty.shape() {
            Shape::Union(binder) => Ok(Resolution::Supported(binder.bind(lookup, qualifier)?)),
            _ => Ok(Resolution::Unsupported),
        }
    }
}

// =============================================================================
// Typed factory
// =============================================================================

type Build<T> = dyn for<'a, 'r> Fn(&'a mut Lookup<'r>) -> Result<CodecRef<T>> + Send + Sync;

/// Factory that supports exactly one type `T`.
///
/// Either hands out a fixed codec or builds one through a closure that may
/// resolve component types.
pub struct TypedFactory<T: 'static> {
    name: String,
    build: Arc<Build<T>>,
}

impl<T: 'static> Clone for TypedFactory<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            build: Arc::clone(&self.build),
        }
    }
}

impl<T: Reflect> TypedFactory<T> {
    /// Factory handing out `codec`.
    pub fn new(name: impl Into<String>, codec: CodecRef<T>) -> Self {
        Self::from_fn(name, move |_| Ok(codec.clone()))
    }

    /// Factory building its codec with `build`.
    pub fn from_fn<F>(name: impl Into<String>, build: F) -> Self
    where
        F: Fn(&mut Lookup<'_>) -> Result<CodecRef<T>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            build: Arc::new(build),
        }
    }
}

impl<T: Reflect> CodecFactory for TypedFactory<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn create(
        &self,
        lookup: &mut Lookup<'_>,
        ty: &TypeInfo,
        _qualifier: &Qualifier,
    ) -> Result<Resolution> {
        if !ty.is::<T>() {
            return Ok(Resolution::Unsupported);
        }
        Ok(Resolution::Supported(ErasedCodec::new((self.build)(lookup)?)))
    }
}
