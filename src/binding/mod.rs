// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Binding of user types to struct regions.
//!
//! - [`record`] - product types: one field per [`Feature`]
//! - [`union`] - sum types selected by a string discriminator
//! - [`builder`] - incremental construction of decoded values

pub mod builder;
pub mod record;
pub mod union;

pub use builder::{AnyValue, Builder, SlotBuilder, Slots};
pub use record::{Feature, FeatureFlags, RecordCodec, RecordMetadata};
pub use union::{Case, UnionCodec, UnionMetadata};
