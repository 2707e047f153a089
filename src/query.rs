//! Query-string flattening of struct inputs into bracket-notation parameters.
//!
//! A struct such as
//!
//! ```text
//! struct Search { name: String, tags: Vec<String>, address: Option<Address> }
//! struct Address { city: String }
//! ```
//!
//! flattens to `name` (required), `tags[0]`, `tags[1]`, `tags[2]`, `tags[]`
//! and `address[city]` (all optional). Sequences are approximated by three
//! positional slots plus one "any index" slot, whatever their runtime length.

use std::collections::BTreeMap;

use crate::enums::EnumRegistry;
use crate::error::FlattenError;
use crate::primitive::PrimitiveKind;
use crate::schema::{ModelOpt, Schema};
use crate::types::{Field, Kind, Origin, TypeDef};

/// Path suffixes emitted for every sequence level.
pub const SEQUENCE_SLOTS: [&str; 4] = ["[0]", "[1]", "[2]", "[]"];

/// One flattened query parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedParameter {
    /// Bracket-notation parameter name, e.g. `address[city]`.
    pub path: String,
    pub required: bool,
    pub kind: PrimitiveKind,
    /// Customizations for the parameter's schema (enum constants, formats).
    pub schema_opts: Vec<ModelOpt>,
}

/// Flatten a struct type into query parameters keyed by path.
///
/// # Errors
///
/// Returns `FlattenError::NotAStruct` if `def` is not a struct,
/// `FlattenError::UnflattenableKind` if a channel, function, interface or
/// unsafe pointer appears anywhere in it, and `FlattenError::EnumLookupFailed`
/// for an enum field without registered constants. Map fields are skipped.
pub fn flatten(
    def: &TypeDef,
    enums: &EnumRegistry,
) -> Result<BTreeMap<String, FlattenedParameter>, FlattenError> {
    let Kind::Struct(fields) = &def.kind else {
        return Err(FlattenError::NotAStruct {
            ty: def.display_name(),
        });
    };

    let mut flattener = Flattener {
        enums,
        active: def.origin.iter().cloned().collect(),
        result: BTreeMap::new(),
    };
    flattener.fields(fields, "", true)?;

    tracing::debug!(
        ty = %def.display_name(),
        parameters = flattener.result.len(),
        "flattened query parameters"
    );
    Ok(flattener.result)
}

struct Flattener<'a> {
    enums: &'a EnumRegistry,
    /// Named structs being expanded; a struct nested in itself is cut off.
    active: Vec<Origin>,
    result: BTreeMap<String, FlattenedParameter>,
}

impl Flattener<'_> {
    fn fields(&mut self, fields: &[Field], prefix: &str, required: bool) -> Result<(), FlattenError> {
        for field in fields.iter().filter(|f| f.visible) {
            let def = field.ty.get();

            if field.embedded {
                let (inner, optional) = match &def.kind {
                    Kind::Optional(inner) => (inner.get(), true),
                    _ => (def.clone(), false),
                };
                if let Kind::Struct(inner_fields) = &inner.kind {
                    self.nested(&inner, inner_fields, prefix, required && !optional)?;
                    continue;
                }
            }

            let name = field.serialized_name();
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}[{name}]")
            };
            self.value(&def, path, required)?;
        }
        Ok(())
    }

    fn value(&mut self, def: &TypeDef, path: String, required: bool) -> Result<(), FlattenError> {
        match &def.kind {
            Kind::Primitive(kind) => {
                self.leaf(path, required, *kind, Vec::new());
                Ok(())
            }
            Kind::Enum(kind) => {
                let values =
                    self.enums
                        .values_of(def)
                        .ok_or_else(|| FlattenError::EnumLookupFailed {
                            path: path.clone(),
                            ty: def.display_name(),
                        })?;
                let opts = vec![ModelOpt::EnumValues(values.to_vec())];
                self.leaf(path, required, *kind, opts);
                Ok(())
            }
            Kind::Known(schema) => {
                if let Some((kind, opts)) = known_leaf(schema) {
                    self.leaf(path, required, kind, opts);
                }
                Ok(())
            }
            // Unwrap one level; everything below an optional is optional.
            Kind::Optional(inner) => self.value(&inner.get(), path, false),
            Kind::Sequence(element) => {
                let element = element.get();
                for slot in SEQUENCE_SLOTS {
                    self.value(&element, format!("{path}{slot}"), false)?;
                }
                Ok(())
            }
            Kind::Struct(fields) => self.nested(def, fields, &path, required),
            Kind::Map { .. } => Ok(()),
            Kind::Opaque(kind) => Err(FlattenError::UnflattenableKind { path, kind: *kind }),
        }
    }

    fn nested(
        &mut self,
        def: &TypeDef,
        fields: &[Field],
        prefix: &str,
        required: bool,
    ) -> Result<(), FlattenError> {
        let Some(origin) = &def.origin else {
            return self.fields(fields, prefix, required);
        };
        if self.active.contains(origin) {
            tracing::debug!(ty = %origin, path = prefix, "skipping recursive struct");
            return Ok(());
        }
        self.active.push(origin.clone());
        let result = self.fields(fields, prefix, required);
        self.active.pop();
        result
    }

    fn leaf(&mut self, path: String, required: bool, kind: PrimitiveKind, schema_opts: Vec<ModelOpt>) {
        self.result.insert(
            path.clone(),
            FlattenedParameter {
                path,
                required,
                kind,
                schema_opts,
            },
        );
    }
}

/// Primitive kind and customizations of a known schema, if it is primitive.
fn known_leaf(schema: &Schema) -> Option<(PrimitiveKind, Vec<ModelOpt>)> {
    let kind = schema
        .schema_type
        .as_ref()
        .and_then(PrimitiveKind::from_schema_type)?;
    let mut opts = Vec::new();
    if let Some(format) = &schema.format {
        opts.push(ModelOpt::Format(format.clone()));
    }
    if !schema.enum_values.is_empty() {
        opts.push(ModelOpt::EnumValues(schema.enum_values.clone()));
    }
    Some((kind, opts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Describe, OpaqueKind, Origin, TypeRef};
    use serde_json::json;
    use std::collections::HashMap;

    struct Address;

    impl Describe for Address {
        fn describe() -> TypeDef {
            TypeDef::structure(
                Origin::new("m", "Address"),
                vec![Field::of::<String>("City"), Field::of::<Option<u32>>("Zip")],
            )
        }
    }

    fn keys(result: &BTreeMap<String, FlattenedParameter>) -> Vec<&str> {
        result.keys().map(String::as_str).collect()
    }

    #[test]
    fn primitive_fields_are_required() {
        let def = TypeDef::anonymous_struct(vec![
            Field::of::<String>("Name"),
            Field::of::<bool>("Active"),
        ]);
        let result = flatten(&def, &EnumRegistry::new()).unwrap();
        assert_eq!(keys(&result), vec!["Active", "Name"]);
        assert!(result.values().all(|p| p.required));
        assert_eq!(result["Active"].kind, PrimitiveKind::Boolean);
    }

    #[test]
    fn nested_struct_uses_brackets() {
        let def = TypeDef::anonymous_struct(vec![Field::of::<Address>("Home")]);
        let result = flatten(&def, &EnumRegistry::new()).unwrap();
        assert_eq!(keys(&result), vec!["Home[City]", "Home[Zip]"]);
        assert!(result["Home[City]"].required);
        assert!(!result["Home[Zip]"].required);
    }

    #[test]
    fn optional_struct_makes_descendants_optional() {
        let def = TypeDef::anonymous_struct(vec![Field::of::<Option<Address>>("Home")]);
        let result = flatten(&def, &EnumRegistry::new()).unwrap();
        assert!(!result["Home[City]"].required);
    }

    #[test]
    fn sequence_of_structs_expands_each_slot() {
        let def = TypeDef::anonymous_struct(vec![Field::of::<Vec<Address>>("Stops")]);
        let result = flatten(&def, &EnumRegistry::new()).unwrap();
        assert_eq!(result.len(), 8);
        for slot in SEQUENCE_SLOTS {
            let city = &result[&format!("Stops{slot}[City]")];
            assert!(!city.required);
        }
    }

    #[test]
    fn nested_sequences_expand_per_level() {
        let def = TypeDef::anonymous_struct(vec![Field::of::<Vec<Vec<i32>>>("Grid")]);
        let result = flatten(&def, &EnumRegistry::new()).unwrap();
        assert_eq!(result.len(), 16);
        assert!(result.contains_key("Grid[0][]"));
        assert!(result.contains_key("Grid[][2]"));
    }

    #[test]
    fn maps_are_skipped() {
        let def = TypeDef::anonymous_struct(vec![
            Field::of::<HashMap<String, String>>("Labels"),
            Field::of::<i64>("Page"),
        ]);
        let result = flatten(&def, &EnumRegistry::new()).unwrap();
        assert_eq!(keys(&result), vec!["Page"]);
    }

    #[test]
    fn opaque_fields_fail() {
        let def = TypeDef::anonymous_struct(vec![Field::new(
            "Callback",
            TypeRef::from_def(TypeDef::opaque(OpaqueKind::Function)),
        )]);
        let err = flatten(&def, &EnumRegistry::new()).unwrap_err();
        assert!(matches!(
            err,
            FlattenError::UnflattenableKind { ref path, kind: OpaqueKind::Function } if path == "Callback"
        ));
    }

    #[test]
    fn non_struct_root_fails() {
        let err = flatten(&TypeDef::of::<Vec<String>>(), &EnumRegistry::new()).unwrap_err();
        assert!(matches!(err, FlattenError::NotAStruct { .. }));
    }

    #[test]
    fn enum_leaf_carries_values() {
        let status = TypeDef::enumeration(Origin::new("m", "Status"), PrimitiveKind::String);
        let mut enums = EnumRegistry::new();
        enums.register(Origin::new("m", "Status"), ["open", "closed"]);

        let def = TypeDef::anonymous_struct(vec![Field::new("Status", TypeRef::from_def(status))]);
        let result = flatten(&def, &enums).unwrap();
        assert_eq!(
            result["Status"].schema_opts,
            vec![ModelOpt::EnumValues(vec![json!("open"), json!("closed")])]
        );

        let err = flatten(&def, &EnumRegistry::new()).unwrap_err();
        assert!(matches!(err, FlattenError::EnumLookupFailed { .. }));
    }

    #[test]
    fn embedded_struct_is_spliced() {
        let def = TypeDef::anonymous_struct(vec![
            Field::of::<Address>("Address").embedded(),
            Field::of::<String>("Name").rename("name"),
            Field::of::<String>("secret").hidden(),
        ]);
        let result = flatten(&def, &EnumRegistry::new()).unwrap();
        assert_eq!(keys(&result), vec!["City", "Zip", "name"]);
    }

    #[test]
    fn known_primitive_schema_is_a_leaf() {
        let when = TypeDef::known(
            Origin::new("time", "Timestamp"),
            Schema::string().with_format("date-time"),
        );
        let def = TypeDef::anonymous_struct(vec![Field::new("Since", TypeRef::from_def(when))]);
        let result = flatten(&def, &EnumRegistry::new()).unwrap();
        assert_eq!(result["Since"].kind, PrimitiveKind::String);
        assert_eq!(
            result["Since"].schema_opts,
            vec![ModelOpt::Format("date-time".into())]
        );
    }

    struct Category;

    impl Describe for Category {
        fn describe() -> TypeDef {
            TypeDef::structure(
                Origin::new("shop", "Category"),
                vec![
                    Field::of::<String>("Name"),
                    Field::of::<Option<Box<Category>>>("Parent"),
                ],
            )
        }
    }

    #[test]
    fn recursive_struct_is_cut_off() {
        let result = flatten(&TypeDef::of::<Category>(), &EnumRegistry::new()).unwrap();
        assert_eq!(keys(&result), vec!["Name"]);
    }
}
