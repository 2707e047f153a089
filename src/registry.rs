//! Per-build registry of named component schemas.

use std::collections::BTreeMap;

use crate::schema::Schema;

/// Name → schema map built during one document build.
///
/// Entries are only removed when a placeholder turns out not to be an
/// independently addressable component (embedded types, schemas that ended
/// up inline).
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    schemas: BTreeMap<String, Schema>,
    insertions: usize,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Insert or replace the schema registered under `name`.
    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) {
        if self.schemas.insert(name.into(), schema).is_none() {
            self.insertions += 1;
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Schema> {
        self.schemas.remove(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Number of distinct entries ever inserted, removed ones included.
    pub fn insertions(&self) -> usize {
        self.insertions
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.schemas.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_schemas(self) -> BTreeMap<String, Schema> {
        self.schemas
    }
}
