// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! In-crate token backends.
//!
//! - [`buffer`] - flat token recording and replay, used for lookahead
//! - [`tree`] - generic source and sink over document trees
//! - [`value`] - the dynamic [`Value`](crate::core::Value) tree
//! - [`json`] - `serde_json::Value` documents

pub mod buffer;
pub mod json;
pub mod tree;
pub mod value;

pub use buffer::{BufferSink, BufferSource, TokenBuffer};
pub use json::{JsonSink, JsonSource};
pub use tree::{NodeView, TreeBuild, TreeNode, TreeSink, TreeSource};
pub use value::{ValueSink, ValueSource};
