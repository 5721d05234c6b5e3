// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Priority- and qualifier-aware codec resolver.
//!
//! ## Resolution
//!
//! A lookup key is the pair (type, qualifier). Registered factories are
//! grouped into tiers by priority and walked from the highest tier down:
//!
//! 1. Every factory in the tier registered under the requested qualifier is
//!    asked for a codec.
//! 2. No answer moves on to the next tier. One answer wins and lower tiers are
//!    never consulted. Two or more answers fail with an ambiguity error that
//!    names every contender.
//! 3. When no tier answers, the unsupported sentinel for the key is produced.
//!
//! Outcomes (codec, sentinel or error) are memoized per resolver. Factories
//! resolve component types through the [`Lookup`] they are handed; a key that
//! is requested again while it is still being resolved on the same chain
//! yields a deferred codec, which is how recursive types terminate.
//!
//! ## Example
//!
//! ```ignore
//! let resolver = Resolver::builder().with_builtins().build();
//! let codec = resolver.get::<Vec<Option<i32>>>()?;
//! ```

pub mod builtin;
pub mod reflect;

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use tracing::{debug, trace};

use crate::backend::tree::{TreeBuild, TreeNode, TreeSink, TreeSource};
use crate::codec::{CodecRef, Nullable};
use crate::core::{CodecConfig, CodecError, Diagnostic, Result, Value};

pub use builtin::{TypedFactory, BUILTIN_PRIORITY};
pub use reflect::{Binder, Element, Reflect, Shape, TypeInfo};

/// Factory priority; higher wins.
pub type Priority = i32;

// =============================================================================
// Qualifier
// =============================================================================

/// Opaque tag selecting between several codecs for the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Qualifier(Option<Cow<'static, str>>);

impl Qualifier {
    /// The unqualified key.
    pub const NONE: Qualifier = Qualifier(None);

    /// A named qualifier.
    pub fn named(tag: impl Into<Cow<'static, str>>) -> Self {
        Qualifier(Some(tag.into()))
    }

    /// Tag, or `None` for the unqualified key.
    pub fn tag(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Whether this is the unqualified key.
    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag().unwrap_or("none"))
    }
}

// =============================================================================
// Type-erased codec handle
// =============================================================================

/// A [`CodecRef<T>`] with `T` erased, as stored in the memo table.
#[derive(Clone)]
pub struct ErasedCodec {
    type_id: TypeId,
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ErasedCodec {
    /// Erase a typed handle.
    pub fn new<T: 'static>(codec: CodecRef<T>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(codec),
        }
    }

    /// Type the codec handles.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the type the codec handles.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Recover the typed handle.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if the codec is for another type.
    pub fn downcast<T: 'static>(&self) -> Result<CodecRef<T>> {
        self.inner
            .downcast_ref::<CodecRef<T>>()
            .cloned()
            .ok_or_else(|| {
                CodecError::invariant_violation(format!(
                    "codec for {} used as a codec for {}",
                    self.type_name,
                    std::any::type_name::<T>()
                ))
            })
    }
}

impl fmt::Debug for ErasedCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedCodec")
            .field("type", &self.type_name)
            .finish()
    }
}

// =============================================================================
// Factories
// =============================================================================

/// Answer of a factory for one (type, qualifier) pair.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The factory produced a codec.
    Supported(ErasedCodec),
    /// The factory does not handle the pair.
    Unsupported,
}

impl Resolution {
    /// Wrap a typed codec.
    pub fn supported<T: 'static>(codec: CodecRef<T>) -> Self {
        Resolution::Supported(ErasedCodec::new(codec))
    }
}

/// Produces codecs for the (type, qualifier) pairs it understands.
pub trait CodecFactory: Send + Sync {
    /// Name used in logs and ambiguity errors.
    fn name(&self) -> &str;

    /// Build a codec for `ty` under `qualifier`, or report the pair as unsupported.
    ///
    /// Component types are resolved through `lookup`.
    fn create(
        &self,
        lookup: &mut Lookup<'_>,
        ty: &TypeInfo,
        qualifier: &Qualifier,
    ) -> Result<Resolution>;
}

struct Registration {
    priority: Priority,
    qualifier: Qualifier,
    factory: Arc<dyn CodecFactory>,
}

struct Tier {
    priority: Priority,
    entries: Vec<Registration>,
}

// =============================================================================
// Builder
// =============================================================================

/// Collects factory registrations; [`build`](ResolverBuilder::build) closes the set.
#[derive(Default)]
pub struct ResolverBuilder {
    registrations: Vec<Registration>,
    config: CodecConfig,
}

impl ResolverBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `(priority, qualifier)`.
    pub fn register(
        self,
        priority: Priority,
        qualifier: Qualifier,
        factory: impl CodecFactory + 'static,
    ) -> Self {
        self.register_arc(priority, qualifier, Arc::new(factory))
    }

    /// Register a shared factory under `(priority, qualifier)`.
    pub fn register_arc(
        mut self,
        priority: Priority,
        qualifier: Qualifier,
        factory: Arc<dyn CodecFactory>,
    ) -> Self {
        self.registrations.push(Registration {
            priority,
            qualifier,
            factory,
        });
        self
    }

    /// Register the builtin factories at [`BUILTIN_PRIORITY`].
    pub fn with_builtins(self) -> Self {
        builtin::register_builtins(self)
    }

    /// Use `config` for factories and convenience entry points.
    pub fn config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    /// Number of registrations so far.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Check if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Close the registration set.
    pub fn build(mut self) -> Resolver {
        // Stable: registration order is kept inside a tier.
        self.registrations.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut tiers: Vec<Tier> = Vec::new();
        for registration in self.registrations {
            match tiers.last_mut() {
                Some(tier) if tier.priority == registration.priority => {
                    tier.entries.push(registration)
                }
                _ => tiers.push(Tier {
                    priority: registration.priority,
                    entries: vec![registration],
                }),
            }
        }

        debug!(
            tiers = tiers.len(),
            factories = tiers.iter().map(|t| t.entries.len()).sum::<usize>(),
            "resolver built"
        );

        Resolver {
            inner: Arc::new(ResolverInner {
                tiers,
                memo: RwLock::new(HashMap::new()),
                config: self.config,
            }),
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

type MemoKey = (TypeId, Qualifier);

#[derive(Clone)]
struct Resolved {
    codec: ErasedCodec,
    supported: bool,
}

type Memo = std::result::Result<Resolved, CodecError>;

pub(crate) struct ResolverInner {
    tiers: Vec<Tier>,
    memo: RwLock<HashMap<MemoKey, Memo>>,
    config: CodecConfig,
}

/// Closed, memoizing codec registry. Cheap to clone and safe to share.
#[derive(Clone)]
pub struct Resolver {
    inner: Arc<ResolverInner>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("tiers", &self.inner.tiers.len())
            .field("memoized", &self.memo_len())
            .finish()
    }
}

impl Resolver {
    /// Start a registration set.
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::new()
    }

    /// Resolver with only the builtin factories and the default configuration.
    pub fn with_builtins() -> Self {
        Self::builder().with_builtins().build()
    }

    pub(crate) fn from_inner(inner: Arc<ResolverInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<ResolverInner> {
        Arc::downgrade(&self.inner)
    }

    /// Configuration in effect.
    pub fn config(&self) -> &CodecConfig {
        &self.inner.config
    }

    /// Unqualified codec for `T`.
    pub fn get<T: Reflect>(&self) -> Result<CodecRef<T>> {
        self.get_qualified::<T>(&Qualifier::NONE)
    }

    /// Codec for `T` under `qualifier`.
    ///
    /// Returns the unsupported sentinel, not an error, when no factory
    /// handles the pair.
    pub fn get_qualified<T: Reflect>(&self, qualifier: &Qualifier) -> Result<CodecRef<T>> {
        self.resolve(&T::type_info(), qualifier)?.downcast::<T>()
    }

    /// Null-tolerant unqualified codec for `T`.
    pub fn get_nullable<T: Reflect + Nullable>(&self) -> Result<CodecRef<T>> {
        Ok(self.get::<T>()?.to_nullable())
    }

    /// Type-erased resolution.
    pub fn resolve(&self, ty: &TypeInfo, qualifier: &Qualifier) -> Result<ErasedCodec> {
        Lookup::new(self).resolve(ty, qualifier)
    }

    /// Whether some factory handles `T` under `qualifier`.
    pub fn is_supported<T: Reflect>(&self, qualifier: &Qualifier) -> Result<bool> {
        Lookup::new(self)
            .resolve_entry(&T::type_info(), qualifier)
            .map(|resolved| resolved.supported)
    }

    /// Number of memoized keys.
    pub fn memo_len(&self) -> usize {
        self.inner.memo.read().map(|memo| memo.len()).unwrap_or(0)
    }

    fn memo_get(&self, key: &MemoKey) -> Result<Option<Memo>> {
        let memo = self.inner.memo.read().map_err(|e| {
            CodecError::invariant_violation(format!("resolver memo lock poisoned: {e}"))
        })?;
        Ok(memo.get(key).cloned())
    }

    /// Store an outcome unless another caller stored one first; returns the stored outcome.
    fn memo_store(&self, key: MemoKey, outcome: Memo) -> Memo {
        match self.inner.memo.write() {
            Ok(mut memo) => memo.entry(key).or_insert(outcome).clone(),
            Err(e) => Err(CodecError::invariant_violation(format!(
                "resolver memo lock poisoned: {e}"
            ))),
        }
    }

    // =========================================================================
    // Convenience entry points
    // =========================================================================

    /// Encode `value` into a dynamic [`Value`] tree.
    pub fn encode_value<T: Reflect>(&self, value: &T) -> Result<Value> {
        self.encode_tree(value)
    }

    /// Decode a `T` from a dynamic [`Value`] tree.
    ///
    /// In strict mode any reported diagnostic fails the decode.
    pub fn decode_value<T: Reflect>(&self, value: &Value) -> Result<T> {
        let (decoded, diagnostics) = self.decode_tree(value)?;
        self.enforce_strict(diagnostics)?;
        Ok(decoded)
    }

    /// Decode a `T` from a dynamic [`Value`] tree, returning the diagnostics.
    pub fn decode_value_lenient<T: Reflect>(&self, value: &Value) -> Result<(T, Vec<Diagnostic>)> {
        self.decode_tree(value)
    }

    /// Encode `value` into a `serde_json::Value`.
    pub fn to_json<T: Reflect>(&self, value: &T) -> Result<serde_json::Value> {
        self.encode_tree(value)
    }

    /// Decode a `T` from a `serde_json::Value`.
    ///
    /// In strict mode any reported diagnostic fails the decode.
    pub fn from_json<T: Reflect>(&self, json: &serde_json::Value) -> Result<T> {
        let (decoded, diagnostics) = self.decode_tree(json)?;
        self.enforce_strict(diagnostics)?;
        Ok(decoded)
    }

    /// Decode a `T` from a `serde_json::Value`, returning the diagnostics.
    pub fn from_json_lenient<T: Reflect>(
        &self,
        json: &serde_json::Value,
    ) -> Result<(T, Vec<Diagnostic>)> {
        self.decode_tree(json)
    }

    fn encode_tree<T: Reflect, N: TreeBuild>(&self, value: &T) -> Result<N> {
        let codec = self.get::<T>()?;
        let mut sink = TreeSink::<N>::with_max_depth(self.config().max_depth);
        codec.encode(&mut sink, value)?;
        sink.finish()
    }

    fn decode_tree<T: Reflect, N: TreeNode>(&self, root: &N) -> Result<(T, Vec<Diagnostic>)> {
        let codec = self.get::<T>()?;
        let mut source = TreeSource::with_max_depth(root, self.config().max_depth);
        let decoded = codec.decode(&mut source)?;
        Ok((decoded, source.take_diagnostics()))
    }

    fn enforce_strict(&self, diagnostics: Vec<Diagnostic>) -> Result<()> {
        if !self.config().strict || diagnostics.is_empty() {
            return Ok(());
        }
        let path = diagnostics[0].path.clone();
        Err(CodecError::validation(
            path,
            diagnostics.iter().map(ToString::to_string).collect(),
        ))
    }
}

// =============================================================================
// Lookup
// =============================================================================

/// One resolution chain.
///
/// Handed to factories so they can resolve component types reentrantly.
pub struct Lookup<'r> {
    resolver: &'r Resolver,
    pending: Vec<MemoKey>,
}

impl<'r> Lookup<'r> {
    pub(crate) fn new(resolver: &'r Resolver) -> Self {
        Self {
            resolver,
            pending: Vec::new(),
        }
    }

    /// Resolver this chain belongs to.
    pub fn resolver(&self) -> &'r Resolver {
        self.resolver
    }

    /// Configuration in effect.
    pub fn config(&self) -> &'r CodecConfig {
        &self.resolver.inner.config
    }

    /// Typed resolution of a component type.
    pub fn get<T: Reflect>(&mut self, qualifier: &Qualifier) -> Result<CodecRef<T>> {
        self.resolve(&T::type_info(), qualifier)?.downcast::<T>()
    }

    /// Type-erased resolution of a component type.
    pub fn resolve(&mut self, ty: &TypeInfo, qualifier: &Qualifier) -> Result<ErasedCodec> {
        self.resolve_entry(ty, qualifier).map(|resolved| resolved.codec)
    }

    fn resolve_entry(&mut self, ty: &TypeInfo, qualifier: &Qualifier) -> Result<Resolved> {
        let key = (ty.id(), qualifier.clone());
        if let Some(memo) = self.resolver.memo_get(&key)? {
            trace!(type_name = ty.name(), %qualifier, "memo hit");
            return memo;
        }

        if self.pending.contains(&key) {
            debug!(type_name = ty.name(), %qualifier, "recursive lookup, deferring");
            return Ok(Resolved {
                codec: ty.deferred(self.resolver.downgrade(), qualifier),
                supported: true,
            });
        }

        self.pending.push(key.clone());
        let outcome = self.walk(ty, qualifier);
        self.pending.pop();

        self.resolver.memo_store(key, outcome)
    }

    fn walk(&mut self, ty: &TypeInfo, qualifier: &Qualifier) -> Memo {
        let resolver = self.resolver;
        for tier in &resolver.inner.tiers {
            let mut found: Vec<(&str, ErasedCodec)> = Vec::new();
            for registration in tier
                .entries
                .iter()
                .filter(|registration| registration.qualifier == *qualifier)
            {
                match registration.factory.create(self, ty, qualifier)? {
                    Resolution::Supported(codec) => {
                        found.push((registration.factory.name(), codec))
                    }
                    Resolution::Unsupported => {}
                }
            }

            if found.len() > 1 {
                return Err(CodecError::AmbiguousResolution {
                    type_name: ty.name().to_string(),
                    qualifier: qualifier.to_string(),
                    priority: tier.priority,
                    factories: found.iter().map(|(name, _)| name.to_string()).collect(),
                });
            }

            if let Some((name, codec)) = found.pop() {
                if codec.type_id() != ty.id() {
                    return Err(CodecError::invariant_violation(format!(
                        "factory '{name}' produced a codec for {} when {} was requested",
                        codec.type_name(),
                        ty.name()
                    )));
                }
                debug!(
                    type_name = ty.name(),
                    %qualifier,
                    factory = name,
                    priority = tier.priority,
                    "codec resolved"
                );
                return Ok(Resolved {
                    codec,
                    supported: true,
                });
            }
        }

        debug!(type_name = ty.name(), %qualifier, "no factory, using unsupported sentinel");
        Ok(Resolved {
            codec: ty.unsupported(qualifier),
            supported: false,
        })
    }
}
