//! Standard error bodies for 400, 404 and 422 responses.

use serde::{Deserialize, Serialize};

use crate::types::{Describe, Field, Origin, TypeDef};

const MODULE: &str = "modelspec::problem";

/// Generic error payload: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl Describe for ErrorBody {
    fn describe() -> TypeDef {
        error_body("ErrorBody")
    }
}

/// Body of a 404 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotFound(pub ErrorBody);

impl Describe for NotFound {
    fn describe() -> TypeDef {
        error_body("NotFound")
    }
}

/// Body of a 400 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadRequest(pub ErrorBody);

impl Describe for BadRequest {
    fn describe() -> TypeDef {
        error_body("BadRequest")
    }
}

fn error_body(name: &str) -> TypeDef {
    TypeDef::structure(
        Origin::new(MODULE, name),
        vec![Field::of::<String>("error").doc("Human readable error message.")],
    )
}

/// One failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Path of the offending field, e.g. `address.city`.
    pub field: String,
    /// Name of the violated rule, e.g. `required` or `email`.
    pub tag: String,
    pub message: String,
}

impl Describe for FieldViolation {
    fn describe() -> TypeDef {
        TypeDef::structure(
            Origin::new(MODULE, "FieldViolation"),
            vec![
                Field::of::<String>("field").doc("Path of the offending field."),
                Field::of::<String>("tag").doc("Name of the violated rule."),
                Field::of::<String>("message"),
            ],
        )
    }
}

/// Field-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorBody {
    pub message: String,
    pub errors: Vec<FieldViolation>,
}

impl Describe for ValidationErrorBody {
    fn describe() -> TypeDef {
        validation_error_body("ValidationErrorBody")
    }
}

/// Body of a 422 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnprocessableEntity(pub ValidationErrorBody);

impl Describe for UnprocessableEntity {
    fn describe() -> TypeDef {
        validation_error_body("UnprocessableEntity")
    }
}

fn validation_error_body(name: &str) -> TypeDef {
    TypeDef::structure(
        Origin::new(MODULE, name),
        vec![
            Field::of::<String>("message"),
            Field::of::<Vec<FieldViolation>>("errors"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::EnumRegistry;
    use crate::resolver::{Resolver, ResolverConfig};
    use crate::schema::SchemaRef;
    use serde_json::json;

    #[test]
    fn unprocessable_entity_references_violations() {
        let mut r = Resolver::new(ResolverConfig::default(), EnumRegistry::new());
        let resolved = r.resolve_type::<UnprocessableEntity>(&[]).unwrap();

        assert_eq!(resolved.name, "UnprocessableEntity");
        assert_eq!(resolved.schema.required, vec!["message", "errors"]);
        let errors = resolved.schema.properties.as_ref().unwrap()["errors"]
            .as_inline()
            .unwrap()
            .clone();
        assert_eq!(
            errors.items.as_deref(),
            Some(&SchemaRef::component("FieldViolation"))
        );
        assert!(r.registry().contains("FieldViolation"));
    }

    #[test]
    fn bodies_serialize_flat() {
        let body = UnprocessableEntity(ValidationErrorBody {
            message: "invalid".into(),
            errors: vec![FieldViolation {
                field: "email".into(),
                tag: "required".into(),
                message: "email is required".into(),
            }],
        });
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "message": "invalid",
                "errors": [{ "field": "email", "tag": "required", "message": "email is required" }]
            })
        );

        let body = NotFound(ErrorBody {
            error: "no such pet".into(),
        });
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({ "error": "no such pet" }));
    }
}
