// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Backend over the dynamic [`Value`] tree.

use crate::core::{At, Result, Value};

use super::tree::{NodeView, TreeBuild, TreeNode, TreeSink, TreeSource};

/// Source over a borrowed [`Value`].
pub type ValueSource<'a> = TreeSource<'a, Value>;

/// Sink producing a [`Value`].
pub type ValueSink = TreeSink<Value>;

impl TreeNode for Value {
    const BACKEND: &'static str = "value";

    fn at(&self) -> At {
        Value::at(self)
    }

    fn view(&self) -> NodeView<'_, Self> {
        match self {
            Value::Null => NodeView::Null,
            Value::Boolean(v) => NodeView::Boolean(*v),
            Value::Int(v) => NodeView::Int(*v),
            Value::Long(v) => NodeView::Long(*v),
            Value::Double(v) => NodeView::Double(*v),
            Value::String(v) => NodeView::String(v),
            Value::Array(items) => NodeView::Array(items),
            Value::Struct(entries) => {
                NodeView::Struct(entries.iter().map(|(k, v)| (k.as_str(), v)).collect())
            }
        }
    }
}

impl TreeBuild for Value {
    fn null() -> Self {
        Value::Null
    }

    fn boolean(value: bool) -> Self {
        Value::Boolean(value)
    }

    fn int(value: i32) -> Self {
        Value::Int(value)
    }

    fn long(value: i64) -> Self {
        Value::Long(value)
    }

    fn double(value: f64) -> Result<Self> {
        Ok(Value::Double(value))
    }

    fn string(value: String) -> Self {
        Value::String(value)
    }

    fn array(items: Vec<Self>) -> Self {
        Value::Array(items)
    }

    fn structure(entries: Vec<(String, Self)>) -> Self {
        let mut merged: Vec<(String, Value)> = Vec::with_capacity(entries.len());
        for (name, value) in entries {
            match merged.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = value,
                None => merged.push((name, value)),
            }
        }
        Value::Struct(merged)
    }
}
