//! Model resolution - turns type descriptions into schemas.
//!
//! Each named type is resolved at most once per build: the first resolution
//! registers its schema under the computed name and later ones return the
//! registered schema. Struct types reserve their name before their fields
//! are visited, so a field referring back to its own struct becomes a
//! reference instead of an endless descent.

use std::fmt;
use std::sync::Arc;

use crate::enums::EnumRegistry;
use crate::error::ResolveError;
use crate::naming::NamingPolicy;
use crate::registry::ModelRegistry;
use crate::schema::{apply_opts, AdditionalProperties, ModelOpt, Schema, SchemaRef, SchemaType};
use crate::types::{Describe, Field, Kind, TypeDef, TypeRef};

/// Global customization hook, run for every resolved type.
pub type TypeHook = Arc<dyn Fn(&TypeDef, &mut Schema) + Send + Sync>;

/// Static resolver configuration, set before any resolution.
#[derive(Clone, Default)]
pub struct ResolverConfig {
    pub naming: NamingPolicy,
    pub type_hook: Option<TypeHook>,
}

impl ResolverConfig {
    pub fn new(naming: NamingPolicy) -> Self {
        Self {
            naming,
            type_hook: None,
        }
    }

    pub fn type_hook(mut self, hook: impl Fn(&TypeDef, &mut Schema) + Send + Sync + 'static) -> Self {
        self.type_hook = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for ResolverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverConfig")
            .field("naming", &self.naming)
            .field("type_hook", &self.type_hook.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Result of resolving one type.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub name: String,
    pub schema: Schema,
}

impl Resolved {
    /// Whether the schema is registered and should be used by reference.
    pub fn is_referenced(&self) -> bool {
        self.schema.should_be_referenced()
    }

    /// The schema as it should appear where the type is used.
    pub fn to_ref(&self) -> SchemaRef {
        self.schema.reference_or_inline(&self.name)
    }
}

/// Recursive model resolver owning the registry of one document build.
#[derive(Debug)]
pub struct Resolver {
    config: ResolverConfig,
    enums: EnumRegistry,
    registry: ModelRegistry,
}

impl Resolver {
    pub fn new(config: ResolverConfig, enums: EnumRegistry) -> Self {
        Self {
            config,
            enums,
            registry: ModelRegistry::new(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn enums(&self) -> &EnumRegistry {
        &self.enums
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> ModelRegistry {
        self.registry
    }

    /// Resolve a Rust type.
    pub fn resolve_type<T: Describe + ?Sized>(
        &mut self,
        opts: &[ModelOpt],
    ) -> Result<Resolved, ResolveError> {
        self.resolve(&TypeDef::of::<T>(), opts)
    }

    /// Resolve a described type, registering it if it should be referenced.
    ///
    /// Options are applied after the type's hooks, in order. A type that is
    /// already registered is returned as registered; options do not apply to
    /// it again.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError` if a map has a non-string key, an enum has no
    /// registered constants, or any nested type fails to resolve.
    pub fn resolve(&mut self, def: &TypeDef, opts: &[ModelOpt]) -> Result<Resolved, ResolveError> {
        let name = self.config.naming.name_of(def, self.registry.insertions());
        if let Some(schema) = self.registry.get(&name) {
            tracing::debug!(name = %name, "model already registered");
            return Ok(Resolved {
                name,
                schema: schema.clone(),
            });
        }

        tracing::debug!(name = %name, kind = def.kind.label(), "resolving model");

        let mut schema = match &def.kind {
            Kind::Primitive(kind) => kind.schema(),
            Kind::Optional(inner) => return self.resolve_optional(inner, opts),
            Kind::Sequence(element) => self.resolve_sequence(element)?,
            Kind::Map { key, value } => self.resolve_map(def, key, value)?,
            Kind::Enum(kind) => {
                let values = self
                    .enums
                    .values_of(def)
                    .ok_or_else(|| ResolveError::EnumLookupFailed {
                        ty: def.display_name(),
                    })?;
                let mut schema = kind.schema();
                schema.enum_values = values.to_vec();
                schema
            }
            Kind::Known(schema) => (**schema).clone(),
            Kind::Opaque(_) => Schema {
                additional_properties: Some(AdditionalProperties::Allowed(true)),
                ..Schema::new(SchemaType::Object)
            },
            Kind::Struct(fields) => self.resolve_struct(&name, def, fields)?,
        };

        if let Some(hook) = &self.config.type_hook {
            hook(def, &mut schema);
        }
        if let Some(hook) = &def.hook {
            hook(&mut schema);
        }
        apply_opts(&mut schema, opts);

        if schema.should_be_referenced() {
            tracing::debug!(name = %name, "registered model");
            self.registry.insert(name.clone(), schema.clone());
        } else if matches!(def.kind, Kind::Struct(_)) {
            // Hooks turned the struct into something inline; drop its placeholder.
            self.registry.remove(&name);
        }

        Ok(Resolved { name, schema })
    }

    fn resolve_optional(
        &mut self,
        inner: &TypeRef,
        opts: &[ModelOpt],
    ) -> Result<Resolved, ResolveError> {
        let inner = inner.get();
        let mut opts = opts.to_vec();
        opts.push(ModelOpt::Nullable);
        self.resolve(&inner, &opts)
    }

    fn resolve_sequence(&mut self, element: &TypeRef) -> Result<Schema, ResolveError> {
        let element = element.get();
        let resolved = self
            .resolve(&element, &[])
            .map_err(|source| ResolveError::Element {
                element: element.display_name(),
                source: Box::new(source),
            })?;
        // Sequences can always be absent.
        Ok(Schema::array(resolved.to_ref()).with_nullable())
    }

    fn resolve_map(
        &mut self,
        def: &TypeDef,
        key: &TypeRef,
        value: &TypeRef,
    ) -> Result<Schema, ResolveError> {
        let key = key.get();
        let string_key = match &key.kind {
            Kind::Primitive(kind) | Kind::Enum(kind) => kind.is_string_like(),
            Kind::Known(schema) => schema.is_type(SchemaType::String),
            _ => false,
        };
        if !string_key {
            return Err(ResolveError::UnsupportedKeyType {
                ty: def.display_name(),
                key: key.display_name(),
            });
        }

        let value = value.get();
        let resolved = self
            .resolve(&value, &[])
            .map_err(|source| ResolveError::MapValue {
                value: value.display_name(),
                source: Box::new(source),
            })?;

        Ok(Schema {
            nullable: true,
            additional_properties: Some(AdditionalProperties::Schema(Box::new(resolved.to_ref()))),
            ..Schema::new(SchemaType::Object)
        })
    }

    fn resolve_struct(
        &mut self,
        name: &str,
        def: &TypeDef,
        fields: &[Field],
    ) -> Result<Schema, ResolveError> {
        self.registry.insert(name, Schema::object());

        let mut schema = Schema::object();
        schema.description = def.description.clone();

        if let Err(err) = self.resolve_fields(def, fields, &mut schema) {
            self.registry.remove(name);
            return Err(err);
        }
        Ok(schema)
    }

    fn resolve_fields(
        &mut self,
        owner: &TypeDef,
        fields: &[Field],
        schema: &mut Schema,
    ) -> Result<(), ResolveError> {
        for field in fields.iter().filter(|f| f.visible) {
            let field_name = field.serialized_name().to_string();
            let field_def = field.ty.get();

            let predicted = self
                .config
                .naming
                .name_of(&peel_optional(&field_def), self.registry.insertions());
            let already_registered = self.registry.contains(&predicted);

            let child = self
                .resolve(&field_def, &[])
                .map_err(|source| ResolveError::Field {
                    owner: owner.display_name(),
                    field: field_name.clone(),
                    source: Box::new(source),
                })?;

            let properties = schema.properties.get_or_insert_with(Default::default);

            if field.embedded {
                // Embedded types are never independently addressable, unless
                // something resolved along the way already points at them.
                if !already_registered && !self.has_consumers(&child) {
                    tracing::debug!(name = %child.name, "evicting embedded model");
                    self.registry.remove(&child.name);
                }
                if let Some(child_props) = &child.schema.properties {
                    properties.extend(child_props.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                for name in &child.schema.required {
                    if !schema.required.contains(name) {
                        schema.required.push(name.clone());
                    }
                }
                continue;
            }

            let mut property = child.to_ref();
            if let SchemaRef::Inline(inline) = &mut property {
                if field.description.is_some() {
                    inline.description = field.description.clone();
                }
                if field.deprecated {
                    inline.deprecated = true;
                }
            }
            properties.insert(field_name.clone(), property);

            if is_field_required(field, &field_def) && !schema.required.contains(&field_name) {
                schema.required.push(field_name);
            }
        }
        Ok(())
    }

    /// Whether a `$ref` to `child` exists in its own schema or in another
    /// registered schema.
    fn has_consumers(&self, child: &Resolved) -> bool {
        child.schema.references(&child.name)
            || self
                .registry
                .iter()
                .any(|(name, schema)| name != child.name.as_str() && schema.references(&child.name))
    }
}

/// A field is required unless it is optional or omitted when empty.
fn is_field_required(field: &Field, def: &TypeDef) -> bool {
    let optional = matches!(def.kind, Kind::Optional(_));
    !(optional || field.omit_empty)
}

fn peel_optional(def: &TypeDef) -> TypeDef {
    let mut def = def.clone();
    while let Kind::Optional(inner) = &def.kind {
        def = inner.get();
    }
    def
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::PrimitiveKind;
    use crate::types::{OpaqueKind, Origin};
    use serde_json::json;
    use std::collections::HashMap;

    fn resolver() -> Resolver {
        Resolver::new(ResolverConfig::default(), EnumRegistry::new())
    }

    struct Node;

    impl Describe for Node {
        fn describe() -> TypeDef {
            TypeDef::structure(
                Origin::new("graph", "Node"),
                vec![
                    Field::of::<String>("label"),
                    Field::of::<Option<Box<Node>>>("next"),
                    Field::of::<Vec<Node>>("children"),
                ],
            )
        }
    }

    struct Color;

    impl Describe for Color {
        fn describe() -> TypeDef {
            TypeDef::enumeration(Origin::new("paint", "Color"), PrimitiveKind::String)
        }
    }

    // === Primitive and wrapper kinds ===

    #[test]
    fn primitives_are_inline_and_unregistered() {
        let mut r = resolver();
        let resolved = r.resolve_type::<i64>(&[]).unwrap();
        assert_eq!(resolved.schema, Schema::integer());
        assert!(resolved.to_ref().as_inline().is_some());
        assert!(r.registry().is_empty());
    }

    #[test]
    fn optional_primitive_is_nullable_inline() {
        let mut r = resolver();
        let resolved = r.resolve_type::<Option<String>>(&[]).unwrap();
        assert!(resolved.schema.nullable);
        assert!(resolved.schema.is_type(SchemaType::String));
        assert!(r.registry().is_empty());
    }

    #[test]
    fn sequence_is_nullable_array() {
        let mut r = resolver();
        let resolved = r.resolve_type::<Vec<bool>>(&[]).unwrap();
        assert!(resolved.schema.nullable);
        assert!(resolved.schema.is_type(SchemaType::Array));
        assert_eq!(
            resolved.schema.items.as_deref(),
            Some(&SchemaRef::inline(Schema::boolean()))
        );
    }

    #[test]
    fn map_with_string_key() {
        let mut r = resolver();
        let resolved = r.resolve_type::<HashMap<String, f64>>(&[]).unwrap();
        assert!(resolved.schema.is_type(SchemaType::Object));
        assert!(!resolved.is_referenced());
        match &resolved.schema.additional_properties {
            Some(AdditionalProperties::Schema(value)) => {
                assert!(value.as_inline().unwrap().is_type(SchemaType::Number))
            }
            other => panic!("unexpected additionalProperties: {:?}", other),
        }
        assert!(r.registry().is_empty());
    }

    #[test]
    fn map_with_integer_key_fails() {
        let mut r = resolver();
        let result = r.resolve_type::<HashMap<i32, Node>>(&[]);
        assert!(matches!(
            result,
            Err(ResolveError::UnsupportedKeyType { ref key, .. }) if key == "i32"
        ));
        assert!(r.registry().is_empty());
    }

    #[test]
    fn opaque_is_free_form_object() {
        let mut r = resolver();
        let resolved = r
            .resolve(&TypeDef::opaque(OpaqueKind::Interface), &[])
            .unwrap();
        assert_eq!(
            resolved.schema.additional_properties,
            Some(AdditionalProperties::Allowed(true))
        );
        assert!(r.registry().is_empty());
    }

    // === Enums ===

    #[test]
    fn enum_values_from_registry() {
        let mut enums = EnumRegistry::new();
        enums.register_type::<Color, _, _>(["red", "green"]);
        let mut r = Resolver::new(ResolverConfig::default(), enums);

        let resolved = r.resolve_type::<Color>(&[]).unwrap();
        assert_eq!(resolved.name, "Color");
        assert_eq!(resolved.schema.enum_values, vec![json!("red"), json!("green")]);
        assert!(r.registry().contains("Color"));
    }

    #[test]
    fn enum_without_constants_fails() {
        let mut r = resolver();
        let result = r.resolve_type::<Color>(&[]);
        assert!(matches!(result, Err(ResolveError::EnumLookupFailed { .. })));
    }

    // === Structs ===

    #[test]
    fn self_reference_resolves_to_reference() {
        let mut r = resolver();
        let resolved = r.resolve_type::<Node>(&[]).unwrap();
        assert_eq!(resolved.name, "Node");

        let props = resolved.schema.properties.as_ref().unwrap();
        assert_eq!(props["next"], SchemaRef::component("Node"));
        let children = props["children"].as_inline().unwrap();
        assert_eq!(children.items.as_deref(), Some(&SchemaRef::component("Node")));
        assert_eq!(resolved.schema.required, vec!["label", "children"]);
        assert_eq!(r.registry().len(), 1);
    }

    #[test]
    fn cached_schema_is_returned_unchanged() {
        let mut r = resolver();
        let first = r.resolve_type::<Node>(&[]).unwrap();
        let second = r
            .resolve_type::<Node>(&[ModelOpt::description("ignored")])
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(r.registry().get("Node"), Some(&first.schema));
    }

    #[test]
    fn failed_struct_leaves_no_placeholder() {
        let def = TypeDef::structure(
            Origin::new("bad", "Holder"),
            vec![Field::of::<HashMap<u8, String>>("lookup")],
        );
        let mut r = resolver();
        let err = r.resolve(&def, &[]).unwrap_err();
        assert!(matches!(err, ResolveError::Field { ref field, .. } if field == "lookup"));
        assert!(matches!(
            err.root_cause(),
            ResolveError::UnsupportedKeyType { .. }
        ));
        assert!(r.registry().is_empty());
    }

    #[test]
    fn hooks_run_in_order() {
        let def = TypeDef::structure(Origin::new("m", "Thing"), vec![])
            .with_hook(|s| s.description = Some("model".into()));
        let config = ResolverConfig::default().type_hook(|_, s| {
            s.description = Some("global".into());
            s.deprecated = true;
        });
        let mut r = Resolver::new(config, EnumRegistry::new());

        let resolved = r.resolve(&def, &[]).unwrap();
        assert_eq!(resolved.schema.description.as_deref(), Some("model"));
        assert!(resolved.schema.deprecated);

        let def = TypeDef::structure(Origin::new("m", "Other"), vec![])
            .with_hook(|s| s.description = Some("model".into()));
        let resolved = r.resolve(&def, &[ModelOpt::description("caller")]).unwrap();
        assert_eq!(resolved.schema.description.as_deref(), Some("caller"));
    }

    #[test]
    fn struct_turned_inline_by_hook_is_unregistered() {
        let def = TypeDef::structure(Origin::new("files", "Upload"), vec![]).with_hook(|s| {
            *s = Schema::string().with_format("binary");
        });
        let mut r = resolver();
        let resolved = r.resolve(&def, &[]).unwrap();
        assert!(!resolved.is_referenced());
        assert!(r.registry().is_empty());
    }

    #[test]
    fn anonymous_structs_get_distinct_names() {
        let inner = || {
            TypeRef::from_def(TypeDef::anonymous_struct(vec![Field::of::<i32>("x")]))
        };
        let def = TypeDef::structure(
            Origin::new("m", "Outer"),
            vec![Field::new("a", inner()), Field::new("b", inner())],
        );
        let mut r = resolver();
        let resolved = r.resolve(&def, &[]).unwrap();
        let props = resolved.schema.properties.unwrap();
        assert_eq!(props["a"], SchemaRef::component("AnonymousType1"));
        assert_eq!(props["b"], SchemaRef::component("AnonymousType2"));
    }

    #[test]
    fn inline_fields_carry_docs() {
        let def = TypeDef::structure(
            Origin::new("m", "Account"),
            vec![Field::of::<String>("login").doc("Old login.\nDeprecated: use email")],
        );
        let mut r = resolver();
        let resolved = r.resolve(&def, &[]).unwrap();
        let login = resolved.schema.properties.as_ref().unwrap()["login"]
            .as_inline()
            .unwrap()
            .clone();
        assert!(login.deprecated);
        assert_eq!(
            login.description.as_deref(),
            Some("Old login.\nDeprecated: use email")
        );
    }
}
