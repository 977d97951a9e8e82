// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canned queries: fully-described search requests, serialisable to a
//! `scope://` URI and back.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::{Error, Result};
use crate::variant::{Variant, VariantMap};

const SCHEME: &str = "scope://";

/// All parameters of a search request: target scope, query text, optional
/// department, and filter state. Carries optional opaque user data which
/// does not travel in the URI form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CannedQuery {
    scope_id: String,
    #[serde(default)]
    query_string: String,
    #[serde(default)]
    department_id: String,
    #[serde(default)]
    filter_state: VariantMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_data: Option<Variant>,
}

impl CannedQuery {
    /// Create a query for the given scope with an empty query string.
    pub fn new(scope_id: impl Into<String>) -> Self {
        Self {
            scope_id: scope_id.into(),
            query_string: String::new(),
            department_id: String::new(),
            filter_state: VariantMap::new(),
            user_data: None,
        }
    }

    /// Create a query with query string and department.
    pub fn with_query(
        scope_id: impl Into<String>,
        query_string: impl Into<String>,
        department_id: impl Into<String>,
    ) -> Self {
        Self {
            scope_id: scope_id.into(),
            query_string: query_string.into(),
            department_id: department_id.into(),
            filter_state: VariantMap::new(),
            user_data: None,
        }
    }

    pub fn scope_id(&self) -> &str {
        &self.scope_id
    }

    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    pub fn department_id(&self) -> &str {
        &self.department_id
    }

    pub fn filter_state(&self) -> &VariantMap {
        &self.filter_state
    }

    pub fn set_query_string(&mut self, query_string: impl Into<String>) {
        self.query_string = query_string.into();
    }

    pub fn set_department_id(&mut self, department_id: impl Into<String>) {
        self.department_id = department_id.into();
    }

    pub fn set_filter_state(&mut self, filter_state: VariantMap) {
        self.filter_state = filter_state;
    }

    /// Attach arbitrary data to this query. Not part of the URI form.
    pub fn set_user_data(&mut self, value: Variant) {
        self.user_data = Some(value);
    }

    pub fn has_user_data(&self) -> bool {
        self.user_data.is_some()
    }

    /// Data previously attached with [`set_user_data`](Self::set_user_data).
    pub fn user_data(&self) -> Result<&Variant> {
        self.user_data
            .as_ref()
            .ok_or_else(|| Error::LogicError("no user data set on this query".into()))
    }

    /// Serialise to a `scope://` URI.
    ///
    /// Empty department and filter state are omitted. The query component
    /// uses form encoding, so spaces become `+`.
    pub fn to_uri(&self) -> String {
        let mut pairs = form_urlencoded::Serializer::new(String::new());
        pairs.append_pair("q", &self.query_string);
        if !self.department_id.is_empty() {
            pairs.append_pair("dept", &self.department_id);
        }
        if !self.filter_state.is_empty() {
            // Filter state travels as its JSON rendering inside the URI.
            let state = serde_json::to_string(&self.filter_state).unwrap_or_default();
            pairs.append_pair("filters", &state);
        }
        format!("{}{}?{}", SCHEME, self.scope_id, pairs.finish())
    }

    /// Recreate a query from its `scope://` URI form.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix(SCHEME)
            .ok_or_else(|| Error::InvalidArgument(format!("invalid scope uri: {:?}", uri)))?;
        let (scope_id, params) = match rest.split_once('?') {
            Some((id, params)) => (id, params),
            None => (rest, ""),
        };
        if scope_id.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "invalid scope uri (empty scope id): {:?}",
                uri
            )));
        }

        let mut query = CannedQuery::new(scope_id);
        for (key, value) in form_urlencoded::parse(params.as_bytes()) {
            match key.as_ref() {
                "q" => query.query_string = value.into_owned(),
                "dept" => query.department_id = value.into_owned(),
                "filters" => {
                    query.filter_state = serde_json::from_str(&value).map_err(|e| {
                        Error::InvalidArgument(format!(
                            "invalid filter state in scope uri: {}",
                            e
                        ))
                    })?;
                }
                other => {
                    return Err(Error::InvalidArgument(format!(
                        "unknown parameter {:?} in scope uri: {:?}",
                        other, uri
                    )));
                }
            }
        }
        Ok(query)
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
