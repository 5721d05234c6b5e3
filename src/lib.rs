// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # structcodec
//!
//! Backend-agnostic structured-data codec framework.
//!
//! Values move between Rust types and concrete data formats through a small
//! token protocol. A backend exposes its native representation as a
//! [`Source`] (pull) and a [`Sink`] (push); a [`Codec<T>`] converts one
//! logical type to and from tokens without knowing which backend it talks to.
//!
//! ## Architecture
//!
//! - `core/` - errors, diagnostics, tokens, the dynamic [`Value`] and configuration
//! - `protocol/` - the [`Source`]/[`Sink`] traits, field indexes and the grammar cursor
//! - `codec/` - the [`Codec`] trait, nullable wrapping, scalar and container codecs
//! - `resolve/` - the priority- and qualifier-aware [`Resolver`]
//! - `binding/` - record and union binding of user types
//! - `backend/` - token buffers, [`Value`] trees and `serde_json` documents
//! - [`transcode`] - structure-preserving copy between any source and sink
//!
//! ## Example
//!
//! ```rust,ignore
//! use structcodec::{Feature, RecordMetadata, Reflect, Resolver, Result, Slots, TypeInfo};
//!
//! struct Person {
//!     name: String,
//!     age: Option<i32>,
//! }
//!
//! impl Reflect for Person {
//!     fn type_info() -> TypeInfo {
//!         TypeInfo::record::<Self>()
//!     }
//! }
//!
//! impl RecordMetadata for Person {
//!     fn features() -> Vec<Feature<Self>> {
//!         vec![
//!             Feature::required("name", |p: &Person| &p.name),
//!             Feature::nullable("age", |p: &Person| &p.age).omittable(),
//!         ]
//!     }
//!
//!     fn assemble(slots: &mut Slots) -> Result<Self> {
//!         Ok(Person { name: slots.take("name")?, age: slots.take("age")? })
//!     }
//! }
//!
//! let resolver = Resolver::with_builtins();
//! let json = resolver.to_json(&Person { name: "Ann".into(), age: None })?;
//! let back: Person = resolver.from_json(&json)?;
//! ```

// Core types
pub mod core;

pub use core::{At, CodecConfig, CodecError, Diagnostic, ErrorKind, Result, Token, Value};

// Token protocol
pub mod protocol;

pub use protocol::{
    DynamicFields, FieldIndex, FieldIndexRef, KnownFields, Sink, Source, UNKNOWN_FIELD,
};

// Codecs
pub mod codec;

pub use codec::{Codec, CodecRef, ContainerCodec, NullAware, Nullable};

// Resolution
pub mod resolve;

pub use resolve::{
    CodecFactory, Lookup, Priority, Qualifier, Reflect, Resolution, Resolver, ResolverBuilder,
    Shape, TypeInfo, TypedFactory, BUILTIN_PRIORITY,
};

// Struct and union binding
pub mod binding;

pub use binding::{Builder, Case, Feature, RecordMetadata, Slots, UnionMetadata};

// Backends
pub mod backend;

// Generic transcoder
pub mod transcode;

pub use transcode::transcode;
