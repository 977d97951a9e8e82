// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ID generation for queries and reply endpoints.

/// Generate a unique identity string with a type prefix.
///
/// The format is `{prefix}{nanoid}` with a 19-character random suffix,
/// e.g. `qry-V1StGXR8_Z5jdHi6B-m`.
pub fn unique_id(prefix: &str) -> String {
    format!("{}{}", prefix, nanoid::nanoid!(19))
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
