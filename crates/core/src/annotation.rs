// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Annotations: hyperlink blocks a scope can push alongside results.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::query::CannedQuery;

/// A single link inside an annotation. Activating it runs the canned query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub query: CannedQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationType {
    Link,
    GroupedLink,
    Card,
}

/// A block of one or more links, pushed via the `"annotation"` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    annotation_type: AnnotationType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    icon: String,
    links: Vec<Link>,
}

impl Annotation {
    pub fn new(annotation_type: AnnotationType) -> Self {
        Self { annotation_type, label: String::new(), icon: String::new(), links: Vec::new() }
    }

    pub fn annotation_type(&self) -> AnnotationType {
        self.annotation_type
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Set the label. Only meaningful for grouped links.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn set_icon(&mut self, icon: impl Into<String>) {
        self.icon = icon.into();
    }

    pub fn add_link(&mut self, label: impl Into<String>, query: CannedQuery) {
        self.links.push(Link { label: label.into(), query });
    }

    /// An annotation with no links is not pushable.
    pub fn validate(&self) -> Result<()> {
        if self.links.is_empty() {
            return Err(Error::InvalidArgument("annotation without links".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "annotation_tests.rs"]
mod tests;
