//! Turns arbitrary `LogValue`s into plain JSON.
//!
//! Rules per shape:
//! - callables become their source text
//! - errors become `{name, message, stack}`
//! - arrays and records are walked once; a handle met again within the same
//!   call becomes `"[Circular]"`
//! - records keep only enumerable string-keyed properties
//! - primitives pass through; `Undefined` is dropped from records and is
//!   `null` anywhere else

use crate::value::{ErrorValue, Key, LogValue};
use serde_json::{Map, Value};
use std::collections::HashSet;

pub const CIRCULAR: &str = "[Circular]";

/// Never fails, never recurses into the same handle twice.
pub fn sanitize(value: &LogValue) -> Value {
    Sanitizer::default().visit(value).unwrap_or(Value::Null)
}

#[derive(Default)]
struct Sanitizer {
    seen: HashSet<usize>,
}

impl Sanitizer {
    /// `None` stands for `Undefined`.
    fn visit(&mut self, value: &LogValue) -> Option<Value> {
        let out = match value {
            LogValue::Undefined => return None,
            LogValue::Null => Value::Null,
            LogValue::Bool(b) => Value::Bool(*b),
            LogValue::Number(n) => Value::Number(n.clone()),
            LogValue::String(s) => Value::String(s.clone()),
            LogValue::Callable(c) => Value::String(c.source.clone()),
            LogValue::Error(e) => error_object(e),
            LogValue::Array(array) => {
                if !self.seen.insert(array.id()) {
                    return Some(Value::String(CIRCULAR.to_string()));
                }
                let items = array
                    .items()
                    .iter()
                    .map(|item| self.visit(item).unwrap_or(Value::Null))
                    .collect();
                Value::Array(items)
            }
            LogValue::Record(record) => {
                if !self.seen.insert(record.id()) {
                    return Some(Value::String(CIRCULAR.to_string()));
                }
                let mut map = Map::new();
                for prop in record.properties() {
                    let Key::Str(key) = prop.key else { continue };
                    if !prop.enumerable {
                        continue;
                    }
                    if let Some(v) = self.visit(&prop.value) {
                        map.insert(key, v);
                    }
                }
                Value::Object(map)
            }
        };
        Some(out)
    }
}

fn error_object(e: &ErrorValue) -> Value {
    let mut map = Map::new();
    map.insert("name".to_string(), Value::String(e.name.clone()));
    map.insert("message".to_string(), Value::String(e.message.clone()));
    map.insert("stack".to_string(), Value::String(e.stack.clone()));
    Value::Object(map)
}
