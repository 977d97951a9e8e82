// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Categorised results.

use std::sync::Arc;

use crate::category::Category;
use crate::error::{Error, Result};
use crate::variant::{optional_str, require_str, Variant, VariantMap};

/// A single search result, always attached to a previously registered
/// category.
#[derive(Debug, Clone)]
pub struct CategorisedResult {
    category: Arc<Category>,
    uri: String,
    title: String,
    icon: String,
    dnd_uri: String,
    attributes: VariantMap,
}

impl CategorisedResult {
    /// Create an empty result in the given category.
    pub fn new(category: Arc<Category>) -> Self {
        Self {
            category,
            uri: String::new(),
            title: String::new(),
            icon: String::new(),
            dnd_uri: String::new(),
            attributes: VariantMap::new(),
        }
    }

    pub fn category(&self) -> &Arc<Category> {
        &self.category
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn dnd_uri(&self) -> &str {
        &self.dnd_uri
    }

    pub fn attributes(&self) -> &VariantMap {
        &self.attributes
    }

    pub fn set_uri(&mut self, uri: impl Into<String>) {
        self.uri = uri.into();
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_icon(&mut self, icon: impl Into<String>) {
        self.icon = icon.into();
    }

    pub fn set_dnd_uri(&mut self, dnd_uri: impl Into<String>) {
        self.dnd_uri = dnd_uri.into();
    }

    /// Attach an arbitrary attribute; replaces any previous value for the key.
    pub fn insert_attribute(&mut self, key: impl Into<String>, value: Variant) {
        self.attributes.insert(key.into(), value);
    }

    /// Serialise into the `"result"` push payload. The category travels as
    /// its id only; the receiving side re-links it via its own registry.
    pub fn serialize(&self) -> VariantMap {
        let mut map = VariantMap::new();
        map.insert("uri".into(), Variant::from(self.uri.clone()));
        if !self.title.is_empty() {
            map.insert("title".into(), Variant::from(self.title.clone()));
        }
        if !self.icon.is_empty() {
            map.insert("icon".into(), Variant::from(self.icon.clone()));
        }
        if !self.dnd_uri.is_empty() {
            map.insert("dnd_uri".into(), Variant::from(self.dnd_uri.clone()));
        }
        if !self.attributes.is_empty() {
            map.insert("attrs".into(), Variant::Map(self.attributes.clone()));
        }
        map.insert("cat_id".into(), Variant::from(self.category.id().to_string()));
        map
    }

    /// Rebuild from a `"result"` push payload against the given category.
    ///
    /// The caller has already resolved `cat_id`; a payload whose id differs
    /// from the supplied category is rejected.
    pub fn deserialize(map: &VariantMap, category: Arc<Category>) -> Result<Self> {
        let cat_id = require_str(map, "cat_id")?;
        if cat_id != category.id() {
            return Err(Error::InvalidArgument(format!(
                "result category {:?} does not match {:?}",
                cat_id,
                category.id()
            )));
        }
        let attributes = match map.get("attrs") {
            Some(Variant::Map(m)) => m.clone(),
            _ => VariantMap::new(),
        };
        Ok(Self {
            category,
            uri: require_str(map, "uri")?,
            title: optional_str(map, "title").unwrap_or_default(),
            icon: optional_str(map, "icon").unwrap_or_default(),
            dnd_uri: optional_str(map, "dnd_uri").unwrap_or_default(),
            attributes,
        })
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
