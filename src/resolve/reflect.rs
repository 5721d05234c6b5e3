// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Runtime type descriptors consumed by the resolver.
//!
//! A [`TypeInfo`] is the resolver's view of a Rust type: its [`TypeId`],
//! a display name, a structural [`Shape`] the builtin factories dispatch
//! on, and monomorphic glue for building the typed unsupported sentinel and
//! deferred codecs without knowing `T` at the call site.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::binding::record::{bind_record, RecordMetadata};
use crate::binding::union::{bind_union, UnionMetadata};
use crate::codec::{
    BoxCodec, CodecRef, ContainerCodec, DeferredCodec, MapCodec, OptionCodec, UnsupportedCodec,
    VecCodec,
};
use crate::core::{Result, Value};

use super::{ErasedCodec, Lookup, Qualifier, ResolverInner};

/// Types the resolver can look up.
pub trait Reflect: Send + 'static {
    /// Descriptor of `Self`.
    fn type_info() -> TypeInfo;
}

/// Resolver-facing descriptor of one type.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    shape: Shape,
    unsupported: fn(&Qualifier) -> ErasedCodec,
    deferred: fn(Weak<ResolverInner>, &Qualifier) -> ErasedCodec,
}

impl TypeInfo {
    /// Descriptor of `T` with the given shape.
    pub fn of<T: Reflect>(shape: Shape) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            shape,
            unsupported: unsupported_glue::<T>,
            deferred: deferred_glue::<T>,
        }
    }

    /// Descriptor of a record type.
    pub fn record<T: RecordMetadata>() -> Self {
        Self::of::<T>(Shape::Record(Binder {
            bind: bind_record::<T>,
        }))
    }

    /// Descriptor of a union type.
    pub fn union<T: UnionMetadata>() -> Self {
        Self::of::<T>(Shape::Union(Binder {
            bind: bind_union::<T>,
        }))
    }

    /// Type identifier.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Structural shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Whether this describes `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    pub(crate) fn unsupported(&self, qualifier: &Qualifier) -> ErasedCodec {
        (self.unsupported)(qualifier)
    }

    pub(crate) fn deferred(
        &self,
        resolver: Weak<ResolverInner>,
        qualifier: &Qualifier,
    ) -> ErasedCodec {
        (self.deferred)(resolver, qualifier)
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .finish()
    }
}

fn unsupported_glue<T: Reflect>(qualifier: &Qualifier) -> ErasedCodec {
    ErasedCodec::new(CodecRef::new(UnsupportedCodec::<T>::new(
        qualifier.to_string(),
    )))
}

fn deferred_glue<T: Reflect>(resolver: Weak<ResolverInner>, qualifier: &Qualifier) -> ErasedCodec {
    ErasedCodec::new(CodecRef::new(DeferredCodec::<T>::new(
        resolver,
        qualifier.clone(),
    )))
}

// =============================================================================
// Shape
// =============================================================================

/// Structural category of a type.
#[derive(Clone, Copy)]
pub enum Shape {
    Boolean,
    Int,
    Long,
    Double,
    String,
    /// Dynamic [`Value`] tree
    Dynamic,
    Sequence(Element),
    Optional(Element),
    Boxed(Element),
    /// String-keyed map
    Map(Element),
    Record(Binder),
    Union(Binder),
    /// Only user factories can handle it
    Opaque,
}

impl Shape {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Boolean => "boolean",
            Shape::Int => "int",
            Shape::Long => "long",
            Shape::Double => "double",
            Shape::String => "string",
            Shape::Dynamic => "dynamic",
            Shape::Sequence(_) => "sequence",
            Shape::Optional(_) => "optional",
            Shape::Boxed(_) => "boxed",
            Shape::Map(_) => "map",
            Shape::Record(_) => "record",
            Shape::Union(_) => "union",
            Shape::Opaque => "opaque",
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Sequence(e) | Shape::Optional(e) | Shape::Boxed(e) | Shape::Map(e) => {
                write!(f, "{}<{}>", self.name(), e.info().name())
            }
            _ => f.write_str(self.name()),
        }
    }
}

/// Element type of a container shape plus the glue that wraps an element
/// codec into the container codec.
#[derive(Clone, Copy)]
pub struct Element {
    info: fn() -> TypeInfo,
    assemble: fn(ErasedCodec) -> Result<ErasedCodec>,
}

impl Element {
    /// Element of type `E`, assembled by `assemble`.
    pub fn new<E: Reflect>(assemble: fn(ErasedCodec) -> Result<ErasedCodec>) -> Self {
        Self {
            info: E::type_info,
            assemble,
        }
    }

    /// Descriptor of the element type.
    pub fn info(&self) -> TypeInfo {
        (self.info)()
    }

    /// Wrap a resolved element codec into the container codec.
    pub fn assemble(&self, element: ErasedCodec) -> Result<ErasedCodec> {
        (self.assemble)(element)
    }
}

/// Binds a record or union type against a lookup chain.
#[derive(Clone, Copy)]
pub struct Binder {
    bind: fn(&mut Lookup<'_>, &Qualifier) -> Result<ErasedCodec>,
}

impl Binder {
    /// Build the codec.
    pub fn bind(&self, lookup: &mut Lookup<'_>, qualifier: &Qualifier) -> Result<ErasedCodec> {
        (self.bind)(lookup, qualifier)
    }
}

// =============================================================================
// Builtin descriptors
// =============================================================================

macro_rules! reflect_scalar {
    ($($ty:ty => $shape:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn type_info() -> TypeInfo {
                    TypeInfo::of::<$ty>(Shape::$shape)
                }
            }
        )*
    };
}

reflect_scalar! {
    bool => Boolean,
    i32 => Int,
    i64 => Long,
    f64 => Double,
    String => String,
    Value => Dynamic,
}

impl<E: Reflect> Reflect for Vec<E> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Vec<E>>(Shape::Sequence(Element::new::<E>(assemble_vec::<E>)))
    }
}

impl<E: Reflect> Reflect for Option<E> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Option<E>>(Shape::Optional(Element::new::<E>(assemble_option::<E>)))
    }
}

impl<E: Reflect> Reflect for Box<E> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Box<E>>(Shape::Boxed(Element::new::<E>(assemble_box::<E>)))
    }
}

impl<E: Reflect> Reflect for BTreeMap<String, E> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<BTreeMap<String, E>>(Shape::Map(Element::new::<E>(assemble_map::<E>)))
    }
}

fn assemble_vec<E: Reflect>(element: ErasedCodec) -> Result<ErasedCodec> {
    let container: Arc<dyn ContainerCodec<E, Vec<E>>> =
        Arc::new(VecCodec::new(element.downcast::<E>()?));
    Ok(ErasedCodec::new(CodecRef::from_container(container)))
}

// Option values resolve to the null-tolerant wrapper around the lift.
fn assemble_option<E: Reflect>(element: ErasedCodec) -> Result<ErasedCodec> {
    let container: Arc<dyn ContainerCodec<E, Option<E>>> =
        Arc::new(OptionCodec::new(element.downcast::<E>()?));
    Ok(ErasedCodec::new(
        CodecRef::from_container(container).to_nullable(),
    ))
}

fn assemble_box<E: Reflect>(element: ErasedCodec) -> Result<ErasedCodec> {
    let container: Arc<dyn ContainerCodec<E, Box<E>>> =
        Arc::new(BoxCodec::new(element.downcast::<E>()?));
    Ok(ErasedCodec::new(CodecRef::from_container(container)))
}

fn assemble_map<E: Reflect>(element: ErasedCodec) -> Result<ErasedCodec> {
    let container: Arc<dyn ContainerCodec<E, BTreeMap<String, E>>> =
        Arc::new(MapCodec::new(element.downcast::<E>()?));
    Ok(ErasedCodec::new(CodecRef::from_container(container)))
}
