// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-reply table of result categories.
//!
//! Not thread-safe on its own; the owning reply object serialises access.

use std::collections::HashMap;
use std::sync::Arc;

use scopes_core::{Category, CategoryRenderer, Error, Result};

#[derive(Default)]
pub struct CategoryRegistry {
    categories: HashMap<String, Arc<Category>>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a category; its id must be unique on this reply.
    pub fn register(&mut self, category: Category) -> Result<Arc<Category>> {
        if self.categories.contains_key(category.id()) {
            return Err(Error::InvalidArgument(format!(
                "category {} already registered",
                category.id()
            )));
        }
        let category = Arc::new(category);
        self.categories.insert(category.id().to_string(), Arc::clone(&category));
        Ok(category)
    }

    /// Construct and insert in one step.
    pub fn register_with(
        &mut self,
        id: &str,
        title: &str,
        icon: &str,
        renderer_template: CategoryRenderer,
    ) -> Result<Arc<Category>> {
        self.register(Category::new(id, title, icon, renderer_template))
    }

    pub fn lookup(&self, id: &str) -> Option<Arc<Category>> {
        self.categories.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
#[path = "category_registry_tests.rs"]
mod tests;
