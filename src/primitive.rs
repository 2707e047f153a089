//! Primitive kinds and their schema nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{Schema, SchemaType};

/// The closed set of primitive kinds a model field can bottom out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    #[default]
    String,
    Boolean,
    Integer,
    Float64,
}

impl PrimitiveKind {
    /// Parse a primitive type name.
    ///
    /// Accepts the generic names (`string`, `boolean`, `integer`, `float64`)
    /// as well as Rust and Go spellings of the sized variants. Returns `None`
    /// for anything else (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" | "str" | "String" => Some(PrimitiveKind::String),
            "bool" | "boolean" => Some(PrimitiveKind::Boolean),
            "integer" | "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8"
            | "uint16" | "uint32" | "uint64" | "i8" | "i16" | "i32" | "i64" | "i128" | "isize"
            | "u8" | "u16" | "u32" | "u64" | "u128" | "usize" => Some(PrimitiveKind::Integer),
            "float64" | "float32" | "number" | "f32" | "f64" => Some(PrimitiveKind::Float64),
            _ => None,
        }
    }

    /// Returns the primitive kind matching a schema type, if any.
    pub fn from_schema_type(schema_type: &SchemaType) -> Option<Self> {
        match schema_type {
            SchemaType::String => Some(PrimitiveKind::String),
            SchemaType::Boolean => Some(PrimitiveKind::Boolean),
            SchemaType::Integer => Some(PrimitiveKind::Integer),
            SchemaType::Number => Some(PrimitiveKind::Float64),
            SchemaType::Array | SchemaType::Object => None,
        }
    }

    /// Whether values of this kind can key a JSON object.
    pub fn is_string_like(&self) -> bool {
        matches!(self, PrimitiveKind::String)
    }

    /// Build the schema node for this primitive.
    pub fn schema(&self) -> Schema {
        match self {
            PrimitiveKind::String => Schema::string(),
            PrimitiveKind::Boolean => Schema::boolean(),
            PrimitiveKind::Integer => Schema::integer(),
            PrimitiveKind::Float64 => Schema::number().with_format("double"),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Float64 => "float64",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_names() {
        assert_eq!(PrimitiveKind::parse("string"), Some(PrimitiveKind::String));
        assert_eq!(PrimitiveKind::parse("bool"), Some(PrimitiveKind::Boolean));
        assert_eq!(PrimitiveKind::parse("u16"), Some(PrimitiveKind::Integer));
        assert_eq!(PrimitiveKind::parse("int64"), Some(PrimitiveKind::Integer));
        assert_eq!(PrimitiveKind::parse("f32"), Some(PrimitiveKind::Float64));
    }

    #[test]
    fn parse_unknown_names() {
        assert_eq!(PrimitiveKind::parse("complex128"), None);
        assert_eq!(PrimitiveKind::parse(""), None);
        assert_eq!(PrimitiveKind::parse("Int"), None);
    }

    #[test]
    fn float_schema_is_double() {
        let schema = PrimitiveKind::Float64.schema();
        assert_eq!(schema.schema_type, Some(SchemaType::Number));
        assert_eq!(schema.format.as_deref(), Some("double"));
    }

    #[test]
    fn only_strings_key_maps() {
        assert!(PrimitiveKind::String.is_string_like());
        assert!(!PrimitiveKind::Integer.is_string_like());
    }
}
