// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Late-bound codec used to close recursive type graphs.
//!
//! When resolving `T` needs a codec for `T` again (a tree node holding a
//! `Vec` of nodes), the inner request gets a [`DeferredCodec`]. It holds a
//! weak handle to the resolver and looks the real codec up in the memo table
//! on every call, so no reference cycle is formed between memoized codecs.

use std::marker::PhantomData;
use std::sync::Weak;

use crate::core::{CodecError, Result};
use crate::protocol::{Sink, Source};
use crate::resolve::{Qualifier, Reflect, Resolver, ResolverInner};

use super::{Codec, CodecRef};

/// Codec that resolves `T` when first used rather than when built.
pub struct DeferredCodec<T> {
    resolver: Weak<ResolverInner>,
    qualifier: Qualifier,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect> DeferredCodec<T> {
    pub(crate) fn new(resolver: Weak<ResolverInner>, qualifier: Qualifier) -> Self {
        Self {
            resolver,
            qualifier,
            _marker: PhantomData,
        }
    }

    fn target(&self) -> Result<CodecRef<T>> {
        let inner = self.resolver.upgrade().ok_or_else(|| {
            CodecError::invariant_violation(format!(
                "resolver dropped before the deferred codec for {} was used",
                std::any::type_name::<T>()
            ))
        })?;
        Resolver::from_inner(inner).get_qualified::<T>(&self.qualifier)
    }
}

impl<T: Reflect> Codec<T> for DeferredCodec<T> {
    fn decode(&self, source: &mut dyn Source) -> Result<T> {
        self.target()?.decode(source)
    }

    fn encode(&self, sink: &mut dyn Sink, value: &T) -> Result<()> {
        self.target()?.encode(sink, value)
    }

    fn describe(&self) -> String {
        format!("deferred({})", std::any::type_name::<T>())
    }
}
