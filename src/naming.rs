//! Component names derived from type origins.

use serde::{Deserialize, Serialize};

use crate::types::{Kind, TypeDef};

/// Characters that carry structure in a type path and cannot appear in a
/// component name.
const SEPARATORS: &[char] = &['/', '.', '[', ']', '*', ':', '<', '>', ',', ' '];

/// Naming policy, fixed for the duration of a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingPolicy {
    /// Prefix component names with the declaring module path.
    pub include_paths: bool,
    /// Module path prefixes that are never included, even when
    /// `include_paths` is set.
    pub strip_paths: Vec<String>,
}

impl NamingPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_paths(mut self, include: bool) -> Self {
        self.include_paths = include;
        self
    }

    pub fn strip_path(mut self, prefix: impl Into<String>) -> Self {
        self.strip_paths.push(prefix.into());
        self
    }

    /// Component name for a type declared as `name` in module `path`.
    pub fn name(&self, path: &str, name: &str) -> String {
        let stripped = self.strip_paths.iter().any(|p| path.starts_with(p.as_str()));
        if !self.include_paths || stripped || path.is_empty() {
            return normalize(name);
        }
        normalize(&format!("{path}/{name}"))
    }

    /// Component name for a described type.
    ///
    /// Maps are named after their key and value types; types without an
    /// origin get `AnonymousType{anonymous_index}`.
    pub fn name_of(&self, def: &TypeDef, anonymous_index: usize) -> String {
        if let Kind::Map { key, value } = &def.kind {
            let local = |def: TypeDef| def.origin.map(|o| o.name).unwrap_or_default();
            return normalize(&format!("map[{}]{}", local(key.get()), local(value.get())));
        }
        match &def.origin {
            Some(origin) if !origin.name.is_empty() => self.name(&origin.path, &origin.name),
            _ => format!("AnonymousType{anonymous_index}"),
        }
    }
}

/// Replace structural separators with underscores.
pub fn normalize(name: &str) -> String {
    name.chars()
        .map(|c| if SEPARATORS.contains(&c) { '_' } else { c })
        .collect()
}
