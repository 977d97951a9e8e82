// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result categories: labelled buckets for results within one reply.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::variant::{optional_str, require_str, Variant, VariantMap};

/// Default renderer template applied when a scope does not supply one.
pub const DEFAULT_RENDERER: &str =
    r#"{"schema-version":1,"template":{"category-layout":"grid"},"components":{"title":"title","art":"art"}}"#;

/// A display template for the results of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryRenderer(String);

impl CategoryRenderer {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn template(&self) -> &str {
        &self.0
    }
}

impl Default for CategoryRenderer {
    fn default() -> Self {
        Self(DEFAULT_RENDERER.to_string())
    }
}

/// A labelled bucket for results. The id is unique within a single reply;
/// results reference their category by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    id: String,
    title: String,
    icon: String,
    renderer_template: CategoryRenderer,
}

impl Category {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        icon: impl Into<String>,
        renderer_template: CategoryRenderer,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            icon: icon.into(),
            renderer_template,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn renderer_template(&self) -> &CategoryRenderer {
        &self.renderer_template
    }

    /// Serialise into the `"category"` push payload.
    pub fn serialize(&self) -> VariantMap {
        let mut map = VariantMap::new();
        map.insert("id".into(), Variant::from(self.id.clone()));
        map.insert("title".into(), Variant::from(self.title.clone()));
        map.insert("icon".into(), Variant::from(self.icon.clone()));
        map.insert(
            "renderer_template".into(),
            Variant::from(self.renderer_template.template().to_string()),
        );
        map
    }

    /// Rebuild from a `"category"` push payload.
    pub fn deserialize(map: &VariantMap) -> Result<Self> {
        let id = require_str(map, "id")?;
        if id.is_empty() {
            return Err(Error::InvalidArgument("category with empty id".into()));
        }
        Ok(Self {
            id,
            title: optional_str(map, "title").unwrap_or_default(),
            icon: optional_str(map, "icon").unwrap_or_default(),
            renderer_template: optional_str(map, "renderer_template")
                .map(CategoryRenderer::new)
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
#[path = "category_tests.rs"]
mod tests;
