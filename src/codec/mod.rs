// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Codec abstraction.
//!
//! ## Architecture
//!
//! - **[`Codec<T>`]** - converts one logical type to and from the token protocol
//! - **[`NullAware`]** - capability of codecs that already understand `Null`
//! - **[`CodecRef<T>`]** - shared handle that caches the nullable variant
//! - **[`ContainerCodec<E, T>`]** - container whose element codec can be rebound
//!
//! Codecs are immutable once built and shared freely between traversals;
//! every piece of per-traversal state lives in the [`Source`]/[`Sink`].

pub mod collection;
pub mod deferred;
pub mod scalar;
pub mod unsupported;

use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::core::{At, Result, Value};
use crate::protocol::{Sink, Source};

pub use collection::{BoxCodec, MapCodec, OptionCodec, VecCodec};
pub use deferred::DeferredCodec;
pub use scalar::{BoolCodec, DoubleCodec, IntCodec, LongCodec, StringCodec, ValueCodec};
pub use unsupported::UnsupportedCodec;

// =============================================================================
// Codec traits
// =============================================================================

/// Value-to-token and token-to-value converter for one logical type.
pub trait Codec<T>: Send + Sync {
    /// Read one value from the source.
    fn decode(&self, source: &mut dyn Source) -> Result<T>;

    /// Write one value to the sink.
    fn encode(&self, sink: &mut dyn Sink, value: &T) -> Result<()>;

    /// Null-awareness capability, if the codec declares one.
    fn null_aware(&self) -> Option<&dyn NullAware> {
        None
    }

    /// Short description for logs and diagnostics.
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Declares that a codec handles `Null` tokens itself.
pub trait NullAware {
    /// Whether `Null` is accepted on decode and produced on encode.
    fn supports_null(&self) -> bool;
}

/// Types with an absent representation.
pub trait Nullable: Sized {
    /// The absent value.
    fn null() -> Self;

    /// Whether `self` is the absent value.
    fn is_null(&self) -> bool;
}

impl<X> Nullable for Option<X> {
    fn null() -> Self {
        None
    }

    fn is_null(&self) -> bool {
        self.is_none()
    }
}

impl Nullable for Value {
    fn null() -> Self {
        Value::Null
    }

    fn is_null(&self) -> bool {
        Value::is_null(self)
    }
}

/// Container codec whose element codec can be substituted.
pub trait ContainerCodec<E, T>: Codec<T> {
    /// Element codec in use.
    fn element(&self) -> &CodecRef<E>;

    /// Same container shape, using `element` for every element.
    fn with_element(&self, element: CodecRef<E>) -> Arc<dyn ContainerCodec<E, T>>;

    /// View as a plain codec.
    fn into_codec(self: Arc<Self>) -> Arc<dyn Codec<T>>;
}

// =============================================================================
// Shared handle
// =============================================================================

/// Shared, cheaply clonable handle to a codec.
///
/// The handle caches its nullable variant so that repeated
/// [`to_nullable`](CodecRef::to_nullable) calls return the same instance.
pub struct CodecRef<T: 'static> {
    cell: Arc<CodecCell<T>>,
}

struct CodecCell<T: 'static> {
    codec: Arc<dyn Codec<T>>,
    nullable: OnceLock<CodecRef<T>>,
    // Holds an `Arc<dyn ContainerCodec<E, T>>` when built from a container.
    container: Option<Arc<dyn Any + Send + Sync>>,
}

impl<T: 'static> Clone for CodecRef<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: 'static> fmt::Debug for CodecRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRef")
            .field("codec", &self.describe())
            .field("null_aware", &self.supports_null())
            .finish()
    }
}

impl<T: 'static> CodecRef<T> {
    /// Wrap a codec.
    pub fn new(codec: impl Codec<T> + 'static) -> Self {
        Self::from_arc(Arc::new(codec))
    }

    /// Wrap a shared codec.
    pub fn from_arc(codec: Arc<dyn Codec<T>>) -> Self {
        Self {
            cell: Arc::new(CodecCell {
                codec,
                nullable: OnceLock::new(),
                container: None,
            }),
        }
    }

    /// Wrap a container codec, keeping it reachable through
    /// [`as_container`](CodecRef::as_container).
    pub fn from_container<E: 'static>(container: Arc<dyn ContainerCodec<E, T>>) -> Self {
        let codec = Arc::clone(&container).into_codec();
        Self {
            cell: Arc::new(CodecCell {
                codec,
                nullable: OnceLock::new(),
                container: Some(Arc::new(container)),
            }),
        }
    }

    /// Container view with element type `E`, if this handle wraps one.
    pub fn as_container<E: 'static>(&self) -> Option<Arc<dyn ContainerCodec<E, T>>> {
        self.cell
            .container
            .as_ref()?
            .downcast_ref::<Arc<dyn ContainerCodec<E, T>>>()
            .cloned()
    }

    /// Decode one value.
    pub fn decode(&self, source: &mut dyn Source) -> Result<T> {
        self.cell.codec.decode(source)
    }

    /// Encode one value.
    pub fn encode(&self, sink: &mut dyn Sink, value: &T) -> Result<()> {
        self.cell.codec.encode(sink, value)
    }

    /// Description of the wrapped codec.
    pub fn describe(&self) -> String {
        self.cell.codec.describe()
    }

    /// Whether the wrapped codec declares and reports null support.
    pub fn supports_null(&self) -> bool {
        self.cell
            .codec
            .null_aware()
            .is_some_and(|aware| aware.supports_null())
    }

    /// Whether both handles refer to the same codec instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// Null-tolerant variant of this codec.
    ///
    /// Returns `self` when the codec already supports null; otherwise a
    /// wrapper built once per handle and returned on every later call. The
    /// wrapper keeps the container view of the wrapped handle.
    pub fn to_nullable(&self) -> CodecRef<T>
    where
        T: Nullable,
    {
        if self.supports_null() {
            return self.clone();
        }
        self.cell
            .nullable
            .get_or_init(|| CodecRef {
                cell: Arc::new(CodecCell {
                    codec: Arc::new(NullableCodec {
                        inner: Arc::clone(&self.cell.codec),
                    }),
                    nullable: OnceLock::new(),
                    container: self.cell.container.clone(),
                }),
            })
            .clone()
    }
}

/// Wrapper mapping `Null` to the absent value and back.
struct NullableCodec<T: 'static> {
    inner: Arc<dyn Codec<T>>,
}

impl<T: Nullable + 'static> Codec<T> for NullableCodec<T> {
    fn decode(&self, source: &mut dyn Source) -> Result<T> {
        if source.peek()? == At::Null {
            source.take_null()?;
            return Ok(T::null());
        }
        self.inner.decode(source)
    }

    fn encode(&self, sink: &mut dyn Sink, value: &T) -> Result<()> {
        if value.is_null() {
            return sink.put_null();
        }
        self.inner.encode(sink, value)
    }

    fn null_aware(&self) -> Option<&dyn NullAware> {
        Some(self)
    }

    fn describe(&self) -> String {
        format!("nullable({})", self.inner.describe())
    }
}

impl<T> NullAware for NullableCodec<T> {
    fn supports_null(&self) -> bool {
        true
    }
}
