//! Schema nodes as they appear in the generated document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix of every component reference produced by the resolver.
pub const COMPONENT_REF_PREFIX: &str = "#/components/schemas/";

/// JSON Schema type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

/// Reference to a registered component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    pub ref_path: String,
}

impl Reference {
    /// Reference to `#/components/schemas/{name}`.
    pub fn component(name: &str) -> Self {
        Self {
            ref_path: format!("{COMPONENT_REF_PREFIX}{name}"),
        }
    }

    /// The component name this reference points at, if it is a component reference.
    pub fn component_name(&self) -> Option<&str> {
        self.ref_path.strip_prefix(COMPONENT_REF_PREFIX)
    }
}

/// Either a named reference or an inline schema, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaRef {
    Ref(Reference),
    Inline(Box<Schema>),
}

impl SchemaRef {
    pub fn component(name: &str) -> Self {
        SchemaRef::Ref(Reference::component(name))
    }

    pub fn inline(schema: Schema) -> Self {
        SchemaRef::Inline(Box::new(schema))
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            SchemaRef::Ref(r) => Some(r),
            SchemaRef::Inline(_) => None,
        }
    }

    pub fn as_inline(&self) -> Option<&Schema> {
        match self {
            SchemaRef::Inline(s) => Some(s),
            SchemaRef::Ref(_) => None,
        }
    }

    /// Whether this is, or inlines, a `$ref` to the component `name`.
    pub fn references(&self, name: &str) -> bool {
        match self {
            SchemaRef::Ref(reference) => reference.component_name() == Some(name),
            SchemaRef::Inline(schema) => schema.references(name),
        }
    }
}

/// `additionalProperties`: a boolean switch or a value schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaRef>),
}

/// A resolved schema.
///
/// A struct schema's `required` only names keys of `properties`, and an
/// array schema always has `items`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaRef>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Schema {
    pub fn new(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }

    pub fn string() -> Self {
        Self::new(SchemaType::String)
    }

    pub fn integer() -> Self {
        Self::new(SchemaType::Integer)
    }

    pub fn number() -> Self {
        Self::new(SchemaType::Number)
    }

    pub fn boolean() -> Self {
        Self::new(SchemaType::Boolean)
    }

    /// Object schema with an empty property map.
    pub fn object() -> Self {
        Self {
            properties: Some(BTreeMap::new()),
            ..Self::new(SchemaType::Object)
        }
    }

    pub fn array(items: SchemaRef) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::new(SchemaType::Array)
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn is_type(&self, schema_type: SchemaType) -> bool {
        self.schema_type == Some(schema_type)
    }

    /// Whether this schema is registered as a component and referenced by name.
    ///
    /// Plain objects (no `additionalProperties`) and enumerations are
    /// referenced; primitives, arrays and maps are inlined.
    pub fn should_be_referenced(&self) -> bool {
        if self.is_type(SchemaType::Object) && self.additional_properties.is_none() {
            return true;
        }
        !self.enum_values.is_empty()
    }

    /// Whether this schema, or any schema inlined in it, holds a `$ref` to
    /// the component `name`.
    pub fn references(&self, name: &str) -> bool {
        let items = self.items.iter().map(|item| &**item);
        let properties = self.properties.iter().flat_map(|props| props.values());
        let additional = match &self.additional_properties {
            Some(AdditionalProperties::Schema(value)) => Some(&**value),
            _ => None,
        };
        items
            .chain(properties)
            .chain(additional)
            .any(|child| child.references(name))
    }

    /// Reference-or-inline decision for a schema resolved under `name`.
    pub fn reference_or_inline(&self, name: &str) -> SchemaRef {
        if self.should_be_referenced() {
            SchemaRef::component(name)
        } else {
            SchemaRef::inline(self.clone())
        }
    }
}

/// Caller-supplied customization applied after a schema is built.
///
/// Applied in order, so later options win on conflicting fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOpt {
    Nullable,
    Description(String),
    Deprecated,
    Format(String),
    /// Turn the schema into an enumeration of these values. The schema type
    /// follows the first value: string for strings, integer otherwise.
    EnumValues(Vec<Value>),
}

impl ModelOpt {
    pub fn description(desc: impl Into<String>) -> Self {
        ModelOpt::Description(desc.into())
    }

    pub fn enum_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        ModelOpt::EnumValues(values.into_iter().map(Into::into).collect())
    }

    pub fn apply(&self, schema: &mut Schema) {
        match self {
            ModelOpt::Nullable => schema.nullable = true,
            ModelOpt::Description(desc) => schema.description = Some(desc.clone()),
            ModelOpt::Deprecated => schema.deprecated = true,
            ModelOpt::Format(format) => schema.format = Some(format.clone()),
            ModelOpt::EnumValues(values) => {
                let Some(first) = values.first() else {
                    return;
                };
                schema.schema_type = Some(if first.is_string() {
                    SchemaType::String
                } else {
                    SchemaType::Integer
                });
                schema.enum_values = values.clone();
            }
        }
    }
}

/// Apply options in order.
pub fn apply_opts(schema: &mut Schema, opts: &[ModelOpt]) {
    for opt in opts {
        opt.apply(schema);
    }
}
