// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Backend over `serde_json::Value`.
//!
//! JSON has a single number type. On read, integral numbers that fit in
//! `i32` surface as `Int`, other `i64`-representable integers as `Long`, and
//! everything else as `Double`. On write, non-finite doubles are rejected.
//!
//! The width of an integer is not recorded in the document, so a dynamic
//! [`Value::Long`](crate::core::Value::Long) that fits in `i32` reads back as
//! `Value::Int`. Typed codecs are unaffected: `i64` accepts `Int` tokens.

use serde_json::{Map, Number, Value as Json};

use crate::core::{At, CodecError, Result};

use super::tree::{NodeView, TreeBuild, TreeNode, TreeSink, TreeSource};

/// Source over a borrowed JSON document.
pub type JsonSource<'a> = TreeSource<'a, Json>;

/// Sink producing a JSON document.
pub type JsonSink = TreeSink<Json>;

fn number_view<'a>(number: &Number) -> NodeView<'a, Json> {
    if let Some(v) = number.as_i64() {
        match i32::try_from(v) {
            Ok(int) => NodeView::Int(int),
            Err(_) => NodeView::Long(v),
        }
    } else {
        // u64 above i64::MAX, or a float.
        NodeView::Double(number.as_f64().unwrap_or(f64::NAN))
    }
}

impl TreeNode for Json {
    const BACKEND: &'static str = "json";

    fn at(&self) -> At {
        match self {
            Json::Null => At::Null,
            Json::Bool(_) => At::Boolean,
            Json::Number(n) => match number_view(n) {
                NodeView::Int(_) => At::Int,
                NodeView::Long(_) => At::Long,
                _ => At::Double,
            },
            Json::String(_) => At::String,
            Json::Array(_) => At::ArrayStart,
            Json::Object(_) => At::StructStart,
        }
    }

    fn view(&self) -> NodeView<'_, Self> {
        match self {
            Json::Null => NodeView::Null,
            Json::Bool(v) => NodeView::Boolean(*v),
            Json::Number(n) => number_view(n),
            Json::String(v) => NodeView::String(v),
            Json::Array(items) => NodeView::Array(items),
            Json::Object(map) => {
                NodeView::Struct(map.iter().map(|(k, v)| (k.as_str(), v)).collect())
            }
        }
    }
}

impl TreeBuild for Json {
    fn null() -> Self {
        Json::Null
    }

    fn boolean(value: bool) -> Self {
        Json::Bool(value)
    }

    fn int(value: i32) -> Self {
        Json::Number(value.into())
    }

    fn long(value: i64) -> Self {
        Json::Number(value.into())
    }

    fn double(value: f64) -> Result<Self> {
        Number::from_f64(value)
            .map(Json::Number)
            .ok_or_else(|| CodecError::backend("json", format!("cannot represent {value} in JSON")))
    }

    fn string(value: String) -> Self {
        Json::String(value)
    }

    fn array(items: Vec<Self>) -> Self {
        Json::Array(items)
    }

    fn structure(entries: Vec<(String, Self)>) -> Self {
        let mut map = Map::with_capacity(entries.len());
        for (name, value) in entries {
            map.insert(name, value);
        }
        Json::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::value::ValueSink;
    use crate::core::Value;
    use crate::protocol::Sink;
    use crate::transcode::transcode;
    use serde_json::json;

    #[test]
    fn test_number_classification() {
        assert_eq!(TreeNode::at(&json!(7)), At::Int);
        assert_eq!(TreeNode::at(&json!(5_000_000_000i64)), At::Long);
        assert_eq!(TreeNode::at(&json!(1.5)), At::Double);
        assert_eq!(TreeNode::at(&json!(u64::MAX)), At::Double);
    }

    #[test]
    fn test_json_to_value() {
        let doc = json!({"name": "Ann", "scores": [1, 2.5, null], "big": 5_000_000_000i64});
        let mut source = JsonSource::new(&doc);
        let mut sink = ValueSink::new();
        transcode(&mut source, &mut sink).unwrap();
        let value = sink.finish().unwrap();
        assert_eq!(value.field("name"), Some(&Value::from("Ann")));
        assert_eq!(
            value.field("scores"),
            Some(&Value::array([Value::Int(1), Value::Double(2.5), Value::Null]))
        );
        assert_eq!(value.field("big"), Some(&Value::Long(5_000_000_000)));
    }

    #[test]
    fn test_small_long_narrows_to_int() {
        let mut sink = JsonSink::new();
        sink.put_long(5).unwrap();
        let doc = sink.finish().unwrap();
        assert_eq!(doc, json!(5));

        let mut source = JsonSource::new(&doc);
        let mut sink = ValueSink::new();
        transcode(&mut source, &mut sink).unwrap();
        assert_eq!(sink.finish().unwrap(), Value::Int(5));
    }

    #[test]
    fn test_non_finite_double_rejected() {
        let mut sink = JsonSink::new();
        let err = sink.put_double(f64::INFINITY).unwrap_err();
        assert!(err.to_string().contains("cannot represent"));
    }
}
