// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{cmp::Ordering, fmt::Display};

use bytes::Bytes;
use indexmap::IndexMap;

#[derive(Clone, Copy, Debug)]
pub enum ValNumber {
    I64(i64),
    F64(f64),
}

impl ValNumber {
    pub fn as_f64(&self) -> f64 {
        match self {
            ValNumber::I64(n) => *n as f64,
            ValNumber::F64(n) => *n,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ValNumber::I64(n) => Some(*n),
            ValNumber::F64(_) => None,
        }
    }
}

impl Display for ValNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValNumber::I64(n) => write!(f, "{n}"),
            ValNumber::F64(n) => write!(f, "{n}"),
        }
    }
}

impl From<i64> for ValNumber {
    fn from(value: i64) -> Self {
        ValNumber::I64(value)
    }
}

impl From<f64> for ValNumber {
    fn from(value: f64) -> Self {
        ValNumber::F64(value)
    }
}

/// Numbers of different representations compare by value (so `1` equals `1.0`).
impl PartialOrd for ValNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (ValNumber::I64(left), ValNumber::I64(right)) => left.partial_cmp(right),
            (left, right) => left.as_f64().partial_cmp(&right.as_f64()),
        }
    }
}

impl PartialEq for ValNumber {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

/// Represent a value that can be used in:
/// - arguments and variables
/// - record attribute values read from the store
/// - response payloads
#[derive(Clone, Debug, PartialEq)]
pub enum Val {
    Null,
    Bool(bool),
    Number(ValNumber),
    String(String),
    List(Vec<Val>),
    Object(IndexMap<String, Val>),
    Binary(Bytes),
}

impl Val {
    pub fn get(&self, key: &str) -> Option<&Val> {
        match self {
            Val::Object(o) => o.get(key),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Val::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Val::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Val::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Val::List(_))
    }

    /// The store uses both `null` and `false` to mark an unset value.
    pub fn is_unset(&self) -> bool {
        matches!(self, Val::Null | Val::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Null => "null",
            Val::Bool(_) => "Boolean",
            Val::Number(ValNumber::I64(_)) => "Int",
            Val::Number(ValNumber::F64(_)) => "Float",
            Val::String(_) => "String",
            Val::List(_) => "List",
            Val::Object(_) => "Object",
            Val::Binary(_) => "Binary",
        }
    }
}

impl PartialOrd for Val {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Val::Null, Val::Null) => Some(Ordering::Equal),
            (Val::Bool(left), Val::Bool(right)) => left.partial_cmp(right),
            (Val::Number(left), Val::Number(right)) => left.partial_cmp(right),
            (Val::String(left), Val::String(right)) => left.partial_cmp(right),
            _ => None,
        }
    }
}

impl Display for Val {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Val::Null => write!(f, "null"),
            Val::Bool(b) => write!(f, "{b}"),
            Val::Number(n) => write!(f, "{n}"),
            Val::String(s) => write!(f, "\"{s}\""),
            Val::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Val::Object(o) => {
                write!(f, "{{")?;
                for (i, (k, v)) in o.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Val::Binary(_) => write!(f, "Binary"),
        }
    }
}

impl From<bool> for Val {
    fn from(value: bool) -> Self {
        Val::Bool(value)
    }
}

impl From<i64> for Val {
    fn from(value: i64) -> Self {
        Val::Number(ValNumber::I64(value))
    }
}

impl From<f64> for Val {
    fn from(value: f64) -> Self {
        Val::Number(ValNumber::F64(value))
    }
}

impl From<&str> for Val {
    fn from(value: &str) -> Self {
        Val::String(value.to_string())
    }
}

impl From<String> for Val {
    fn from(value: String) -> Self {
        Val::String(value)
    }
}

impl<T: Into<Val>> From<Vec<T>> for Val {
    fn from(values: Vec<T>) -> Self {
        Val::List(values.into_iter().map(Into::into).collect())
    }
}

/// Binary payloads are emitted as text, since JSON has no byte strings.
impl From<Val> for serde_json::Value {
    fn from(value: Val) -> Self {
        match value {
            Val::Null => serde_json::Value::Null,
            Val::Bool(b) => serde_json::Value::Bool(b),
            Val::Number(ValNumber::I64(n)) => serde_json::Value::Number(n.into()),
            Val::Number(ValNumber::F64(n)) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Val::String(s) => serde_json::Value::String(s),
            Val::List(l) => serde_json::Value::Array(l.into_iter().map(Into::into).collect()),
            Val::Object(o) => {
                serde_json::Value::Object(o.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            Val::Binary(b) => serde_json::Value::String(String::from_utf8_lossy(&b).into_owned()),
        }
    }
}

impl From<serde_json::Value> for Val {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Val::Null,
            serde_json::Value::Bool(b) => Val::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Val::Number(ValNumber::I64(i)),
                None => n
                    .as_f64()
                    .map(|f| Val::Number(ValNumber::F64(f)))
                    .unwrap_or(Val::Null),
            },
            serde_json::Value::String(s) => Val::String(s),
            serde_json::Value::Array(l) => Val::List(l.into_iter().map(Into::into).collect()),
            serde_json::Value::Object(o) => {
                Val::Object(o.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_across_representations() {
        assert_eq!(ValNumber::from(1i64), ValNumber::from(1.0));
        assert_eq!(
            ValNumber::from(i64::MIN).partial_cmp(&ValNumber::from(f64::MAX)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn binary_is_emitted_as_text() {
        let json: serde_json::Value = Val::Binary(Bytes::from_static(b"hello")).into();
        assert_eq!(json, serde_json::json!("hello"));
    }

    #[test]
    fn json_object_keeps_key_order() {
        let json = serde_json::json!({"b": 1, "a": [true, null, 2.5]});
        let val = Val::from(json.clone());

        match &val {
            Val::Object(o) => assert_eq!(o.keys().collect::<Vec<_>>(), vec!["b", "a"]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(serde_json::Value::from(val), json);
    }

    #[test]
    fn unset_values() {
        assert!(Val::Null.is_unset());
        assert!(Val::Bool(false).is_unset());
        assert!(!Val::Bool(true).is_unset());
        assert!(!Val::from(0i64).is_unset());
    }
}
