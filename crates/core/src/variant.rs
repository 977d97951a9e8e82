// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The wire-visible universal value type.
//!
//! Integers and doubles are distinct variants and stay distinct through the
//! codec. Maps reject duplicate keys by construction (`BTreeMap`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A string-keyed mapping of variants.
pub type VariantMap = BTreeMap<String, Variant>;

/// Tagged union over the value universe of the scopes protocol.
///
/// Serialises as plain JSON: `Null` → `null`, `Int` → integer number,
/// `Double` → fractional number, and so on. Deserialisation relies on the
/// untagged variant order below; `Int` must precede `Double` so that whole
/// numbers come back as integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variant {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Array(Vec<Variant>),
    Map(VariantMap),
}

impl Variant {
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Variant::Bool(b) => Ok(*b),
            other => Err(type_error("bool", other)),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Variant::Int(i) => Ok(*i),
            other => Err(type_error("int", other)),
        }
    }

    pub fn as_double(&self) -> Result<f64> {
        match self {
            Variant::Double(d) => Ok(*d),
            Variant::Int(i) => Ok(*i as f64),
            other => Err(type_error("double", other)),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Variant::Str(s) => Ok(s),
            other => Err(type_error("string", other)),
        }
    }

    pub fn as_array(&self) -> Result<&[Variant]> {
        match self {
            Variant::Array(a) => Ok(a),
            other => Err(type_error("array", other)),
        }
    }

    pub fn as_map(&self) -> Result<&VariantMap> {
        match self {
            Variant::Map(m) => Ok(m),
            other => Err(type_error("map", other)),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Variant::Null)
    }

    /// Name of the held type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Variant::Null => "null",
            Variant::Bool(_) => "bool",
            Variant::Int(_) => "int",
            Variant::Double(_) => "double",
            Variant::Str(_) => "string",
            Variant::Array(_) => "array",
            Variant::Map(_) => "map",
        }
    }
}

fn type_error(wanted: &str, got: &Variant) -> Error {
    Error::LogicError(format!("variant does not hold a {} (actual: {})", wanted, got.type_name()))
}

impl From<bool> for Variant {
    fn from(b: bool) -> Self {
        Variant::Bool(b)
    }
}

impl From<i64> for Variant {
    fn from(i: i64) -> Self {
        Variant::Int(i)
    }
}

impl From<i32> for Variant {
    fn from(i: i32) -> Self {
        Variant::Int(i64::from(i))
    }
}

impl From<f64> for Variant {
    fn from(d: f64) -> Self {
        Variant::Double(d)
    }
}

impl From<&str> for Variant {
    fn from(s: &str) -> Self {
        Variant::Str(s.to_string())
    }
}

impl From<String> for Variant {
    fn from(s: String) -> Self {
        Variant::Str(s)
    }
}

impl From<Vec<Variant>> for Variant {
    fn from(a: Vec<Variant>) -> Self {
        Variant::Array(a)
    }
}

impl From<VariantMap> for Variant {
    fn from(m: VariantMap) -> Self {
        Variant::Map(m)
    }
}

/// Fetch a required string entry from a serialised map.
pub(crate) fn require_str(map: &VariantMap, key: &str) -> Result<String> {
    match map.get(key) {
        Some(Variant::Str(s)) => Ok(s.clone()),
        Some(other) => Err(Error::InvalidArgument(format!(
            "entry {:?} holds a {}, expected a string",
            key,
            other.type_name()
        ))),
        None => Err(Error::InvalidArgument(format!("missing entry {:?}", key))),
    }
}

/// Fetch an optional string entry from a serialised map.
pub(crate) fn optional_str(map: &VariantMap, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Variant::Str(s)) => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "variant_tests.rs"]
mod tests;
