//! Registered constant values of named primitive types.

use std::collections::HashMap;

use serde_json::Value;

use crate::types::{Describe, Origin, TypeDef};

/// Constant value sets keyed by the declaring type's origin.
#[derive(Debug, Clone, Default)]
pub struct EnumRegistry {
    values: HashMap<Origin, Vec<Value>>,
}

impl EnumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the constants of the type declared at `origin`, replacing
    /// any earlier registration.
    pub fn register<I, V>(&mut self, origin: Origin, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.values
            .insert(origin, values.into_iter().map(Into::into).collect());
        self
    }

    /// Register the constants of a Rust type by its description's origin.
    ///
    /// Types without an origin cannot be looked up and are ignored.
    pub fn register_type<T, I, V>(&mut self, values: I) -> &mut Self
    where
        T: Describe + ?Sized,
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if let Some(origin) = T::describe().origin {
            self.register(origin, values);
        }
        self
    }

    /// The constants registered for a type, or `None` when it has none.
    pub fn values_of(&self, def: &TypeDef) -> Option<&[Value]> {
        let origin = def.origin.as_ref()?;
        self.values
            .get(origin)
            .filter(|values| !values.is_empty())
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::PrimitiveKind;
    use serde_json::json;

    struct Status;

    impl Describe for Status {
        fn describe() -> TypeDef {
            TypeDef::enumeration(Origin::new("orders", "Status"), PrimitiveKind::String)
        }
    }

    #[test]
    fn lookup_by_origin() {
        let mut enums = EnumRegistry::new();
        enums.register_type::<Status, _, _>(["open", "closed"]);

        let values = enums.values_of(&Status::describe()).unwrap();
        assert_eq!(values, &[json!("open"), json!("closed")]);
    }

    #[test]
    fn unregistered_type_has_no_values() {
        let enums = EnumRegistry::new();
        assert!(enums.values_of(&Status::describe()).is_none());
    }

    #[test]
    fn empty_registration_counts_as_missing() {
        let mut enums = EnumRegistry::new();
        enums.register(Origin::new("orders", "Status"), Vec::<Value>::new());
        assert!(enums.values_of(&Status::describe()).is_none());
    }

    #[test]
    fn anonymous_types_never_match() {
        let mut enums = EnumRegistry::new();
        enums.register(Origin::new("", ""), [1, 2]);
        let def = TypeDef::sequence(crate::types::TypeRef::of::<i32>());
        assert!(enums.values_of(&def).is_none());
    }
}
