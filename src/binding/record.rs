// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Struct binding.
//!
//! A record type describes itself as an ordered list of [`Feature`]s plus a
//! [`Builder`]. The [`RecordCodec`] built from that metadata maps each
//! feature to one field of a struct region, with field indices taken from
//! the declaration order.
//!
//! ## Example
//!
//! ```ignore
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
//! ```

use std::sync::Arc;

use crate::codec::{Codec, CodecRef, Nullable};
use crate::core::{At, CodecError, Diagnostic, Result};
use crate::protocol::{FieldIndexRef, KnownFields, Sink, Source};
use crate::resolve::{ErasedCodec, Lookup, Qualifier, Reflect};

use super::builder::{AnyValue, Builder, SlotBuilder, Slots};

// =============================================================================
// Metadata
// =============================================================================

/// Per-feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// The feature accepts `Null`
    pub nullable: bool,
    /// The value can be read from an instance and encoded
    pub readable: bool,
    /// A decoded value can be handed to the builder
    pub writable: bool,
    /// Absence on decode is not a violation; a null value is left out on encode
    pub omittable: bool,
    /// Never encoded
    pub ignored: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            nullable: false,
            readable: true,
            writable: true,
            omittable: false,
            ignored: false,
        }
    }
}

/// One named, typed member of a record.
pub struct Feature<T> {
    name: String,
    flags: FeatureFlags,
    qualifier: Qualifier,
    port: Box<dyn FeaturePort<T>>,
}

impl<T: 'static> Feature<T> {
    /// Non-nullable feature read through `get`.
    pub fn required<F: Reflect>(name: impl Into<String>, get: fn(&T) -> &F) -> Self {
        Self::with_port(
            name,
            FeatureFlags::default(),
            Port::<T, F> {
                get: Some(get),
                null: None,
            },
        )
    }

    /// Nullable feature read through `get`; its codec is the nullable variant.
    pub fn nullable<F: Reflect + Nullable>(name: impl Into<String>, get: fn(&T) -> &F) -> Self {
        Self::with_port(
            name,
            FeatureFlags {
                nullable: true,
                ..FeatureFlags::default()
            },
            Port::<T, F> {
                get: Some(get),
                null: Some(NullOps::of()),
            },
        )
    }

    /// Feature that is decoded but never read back from an instance.
    pub fn write_only<F: Reflect>(name: impl Into<String>) -> Self {
        Self::with_port(
            name,
            FeatureFlags {
                readable: false,
                ..FeatureFlags::default()
            },
            Port::<T, F> {
                get: None,
                null: None,
            },
        )
    }

    fn with_port(
        name: impl Into<String>,
        flags: FeatureFlags,
        port: impl FeaturePort<T> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            flags,
            qualifier: Qualifier::NONE,
            port: Box::new(port),
        }
    }

    /// Absence on decode is not reported; null values are left out on encode.
    pub fn omittable(mut self) -> Self {
        self.flags.omittable = true;
        self
    }

    /// Exclude from encoding.
    pub fn ignored(mut self) -> Self {
        self.flags.ignored = true;
        self
    }

    /// Skip on decode with an unknown-field diagnostic.
    pub fn read_only(mut self) -> Self {
        self.flags.writable = false;
        self
    }

    /// Resolve the feature codec under `qualifier`.
    pub fn qualified(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = qualifier;
        self
    }

    /// Feature name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Feature flags.
    pub fn flags(&self) -> FeatureFlags {
        self.flags
    }
}

/// Struct metadata supplied per bindable type.
pub trait RecordMetadata: Reflect + Sized {
    /// Features in field order.
    fn features() -> Vec<Feature<Self>>;

    /// Build a value from decoded slots.
    fn assemble(slots: &mut Slots) -> Result<Self>;

    /// Violations of decoded slots, checked before [`assemble`](Self::assemble).
    fn verify(_slots: &Slots) -> Vec<String> {
        Vec::new()
    }

    /// Builder for one decode.
    fn builder(names: Arc<[String]>) -> Box<dyn Builder<Self>> {
        SlotBuilder::new(names, Self::assemble, Self::verify).boxed()
    }
}

// =============================================================================
// Feature plumbing
// =============================================================================

trait FeaturePort<T>: Send + Sync {
    fn bind(
        &self,
        lookup: &mut Lookup<'_>,
        qualifier: &Qualifier,
        nullable: bool,
    ) -> Result<Box<dyn BoundFeature<T>>>;
}

trait BoundFeature<T>: Send + Sync {
    fn decode(&self, source: &mut dyn Source) -> Result<AnyValue>;

    fn encode(&self, sink: &mut dyn Sink, record: &T) -> Result<()>;

    fn is_null(&self, record: &T) -> bool;

    fn absent(&self) -> Option<AnyValue>;
}

struct NullOps<F: 'static> {
    null: fn() -> F,
    is_null: fn(&F) -> bool,
    wrap: fn(&CodecRef<F>) -> CodecRef<F>,
}

impl<F: 'static> Clone for NullOps<F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: 'static> Copy for NullOps<F> {}

impl<F: Nullable + 'static> NullOps<F> {
    fn of() -> Self {
        Self {
            null: F::null,
            is_null: F::is_null,
            wrap: CodecRef::<F>::to_nullable,
        }
    }
}

struct Port<T, F: 'static> {
    get: Option<fn(&T) -> &F>,
    null: Option<NullOps<F>>,
}

impl<T: 'static, F: Reflect> FeaturePort<T> for Port<T, F> {
    fn bind(
        &self,
        lookup: &mut Lookup<'_>,
        qualifier: &Qualifier,
        nullable: bool,
    ) -> Result<Box<dyn BoundFeature<T>>> {
        let codec = lookup.get::<F>(qualifier)?;
        let codec = match (nullable, self.null) {
            (true, Some(ops)) => (ops.wrap)(&codec),
            _ => codec,
        };
        Ok(Box::new(Bound {
            codec,
            get: self.get,
            null: self.null,
        }))
    }
}

struct Bound<T, F: 'static> {
    codec: CodecRef<F>,
    get: Option<fn(&T) -> &F>,
    null: Option<NullOps<F>>,
}

impl<T: 'static, F: Reflect> BoundFeature<T> for Bound<T, F> {
    fn decode(&self, source: &mut dyn Source) -> Result<AnyValue> {
        let value = self.codec.decode(source)?;
        Ok(Box::new(value))
    }

    fn encode(&self, sink: &mut dyn Sink, record: &T) -> Result<()> {
        let get = self.get.ok_or_else(|| {
            CodecError::invariant_violation("encode of a feature without a getter")
        })?;
        self.codec.encode(sink, get(record))
    }

    fn is_null(&self, record: &T) -> bool {
        match (self.get, self.null) {
            (Some(get), Some(ops)) => (ops.is_null)(get(record)),
            _ => false,
        }
    }

    fn absent(&self) -> Option<AnyValue> {
        self.null.map(|ops| Box::new((ops.null)()) as AnyValue)
    }
}

// =============================================================================
// Codec
// =============================================================================

struct BoundSlot<T> {
    name: String,
    flags: FeatureFlags,
    feature: Box<dyn BoundFeature<T>>,
}

/// Discriminator a union case writes ahead of its own fields.
struct CaseTag {
    index: usize,
    case: String,
}

/// Struct codec built from [`RecordMetadata`].
pub struct RecordCodec<T: 'static> {
    fields: FieldIndexRef,
    names: Arc<[String]>,
    slots: Vec<BoundSlot<T>>,
    tag: Option<CaseTag>,
}

impl<T: RecordMetadata> RecordCodec<T> {
    /// Bind the metadata of `T`, resolving one codec per feature.
    pub fn bind(lookup: &mut Lookup<'_>) -> Result<Self> {
        Self::bind_with_tag(lookup, None)
    }

    /// Bind as a union case: `case_field` carries `case` and is written first.
    pub(crate) fn bind_case(lookup: &mut Lookup<'_>, case_field: &str, case: &str) -> Result<Self> {
        Self::bind_with_tag(lookup, Some((case_field, case)))
    }

    fn bind_with_tag(lookup: &mut Lookup<'_>, tag: Option<(&str, &str)>) -> Result<Self> {
        let features = T::features();
        let names: Arc<[String]> = features.iter().map(|f| f.name.clone()).collect();

        let mut field_names: Vec<String> = names.to_vec();
        let tag = match tag {
            Some((case_field, case)) => {
                if names.iter().any(|n| n == case_field) {
                    return Err(CodecError::invariant_violation(format!(
                        "{} declares a field named '{case_field}', which is reserved for the case discriminator",
                        std::any::type_name::<T>()
                    )));
                }
                field_names.push(case_field.to_string());
                Some(CaseTag {
                    index: names.len(),
                    case: case.to_string(),
                })
            }
            None => None,
        };
        let fields = KnownFields::new_ref(field_names)?;

        let mut slots = Vec::with_capacity(features.len());
        for feature in features {
            let bound = feature
                .port
                .bind(lookup, &feature.qualifier, feature.flags.nullable)?;
            slots.push(BoundSlot {
                name: feature.name,
                flags: feature.flags,
                feature: bound,
            });
        }

        Ok(Self {
            fields,
            names,
            slots,
            tag,
        })
    }

    /// Field index shared by every traversal of this codec.
    pub fn fields(&self) -> &FieldIndexRef {
        &self.fields
    }

    fn is_tag(&self, index: usize) -> bool {
        self.tag.as_ref().is_some_and(|tag| tag.index == index)
    }
}

impl<T: RecordMetadata> Codec<T> for RecordCodec<T> {
    fn decode(&self, source: &mut dyn Source) -> Result<T> {
        let path = source.path();
        source.begin_struct(self.fields.clone())?;

        let mut builder = T::builder(self.names.clone());
        let mut seen = vec![false; self.slots.len()];
        loop {
            match source.peek()? {
                At::Field => {
                    let index = source.take_field()?;
                    if self.is_tag(index) {
                        source.skip()?;
                        continue;
                    }
                    match self.slots.get(index) {
                        Some(slot) if slot.flags.writable => {
                            let value = slot.feature.decode(source)?;
                            builder.set(index, value)?;
                            seen[index] = true;
                        }
                        Some(slot) => {
                            let at = source.path();
                            source.report(Diagnostic::unknown_field(
                                at,
                                format!("field '{}' is not writable", slot.name),
                            ));
                            source.skip()?;
                        }
                        None => {
                            let at = source.path();
                            source.report(Diagnostic::unknown_field(
                                at,
                                format!(
                                    "field is not known to {}",
                                    std::any::type_name::<T>()
                                ),
                            ));
                            source.skip()?;
                        }
                    }
                }
                At::StructEnd => break,
                other => {
                    return Err(source.unexpected(&format!(
                        "expected a field or the end of the struct, found {other}"
                    )))
                }
            }
        }
        source.end_struct(&self.fields)?;

        for (index, slot) in self.slots.iter().enumerate() {
            if seen[index] || !slot.flags.writable {
                continue;
            }
            if let Some(absent) = slot.feature.absent() {
                builder.set(index, absent)?;
            }
            if !slot.flags.omittable {
                source.report(Diagnostic::validation(
                    path.as_str(),
                    format!("missing field '{}'", slot.name),
                ));
            }
        }

        for violation in builder.verify() {
            source.report(Diagnostic::validation(path.as_str(), violation));
        }

        builder.build().map_err(|e| e.with_path(&path))
    }

    fn encode(&self, sink: &mut dyn Sink, value: &T) -> Result<()> {
        sink.begin_struct(self.fields.clone())?;
        if let Some(tag) = &self.tag {
            sink.put_field(tag.index)?;
            sink.put_string(&tag.case)?;
        }
        for (index, slot) in self.slots.iter().enumerate() {
            if !slot.flags.readable || slot.flags.ignored {
                continue;
            }
            if slot.flags.omittable && slot.feature.is_null(value) {
                continue;
            }
            sink.put_field(index)?;
            slot.feature.encode(sink, value)?;
        }
        sink.end_struct(&self.fields)
    }

    fn describe(&self) -> String {
        match &self.tag {
            Some(tag) => format!("record({} as {})", std::any::type_name::<T>(), tag.case),
            None => format!("record({})", std::any::type_name::<T>()),
        }
    }
}

/// Resolver glue for record types.
pub(crate) fn bind_record<T: RecordMetadata>(
    lookup: &mut Lookup<'_>,
    _qualifier: &Qualifier,
) -> Result<ErasedCodec> {
    Ok(ErasedCodec::new(CodecRef::new(RecordCodec::<T>::bind(lookup)?)))
}
