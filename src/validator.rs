//! Final checks on an assembled document: every reference resolves, and the
//! document is structurally valid.

use std::collections::{BTreeSet, HashMap};

use serde_json::{json, Value};

use crate::document::{path_placeholders, Document, ParameterLocation};
use crate::error::BuildError;
use crate::schema::{AdditionalProperties, Schema, SchemaRef, SchemaType, COMPONENT_REF_PREFIX};

/// Run both passes.
pub fn validate_document(doc: &Document) -> Result<(), BuildError> {
    check_references(doc)?;
    check_structure(doc)
}

/// Check that every `$ref` in the document names a registered component.
///
/// # Errors
///
/// Returns `BuildError::ReferenceResolutionFailed` for the first reference
/// that is not of the form `#/components/schemas/<registered name>`.
pub fn check_references(doc: &Document) -> Result<(), BuildError> {
    let value = serde_json::to_value(doc).map_err(|e| BuildError::StructuralValidationFailed {
        location: String::new(),
        message: e.to_string(),
    })?;
    check_refs(&value, "", doc)
}

fn check_refs(value: &Value, path: &str, doc: &Document) -> Result<(), BuildError> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_val)) = map.get("$ref") {
                let registered = ref_val
                    .strip_prefix(COMPONENT_REF_PREFIX)
                    .is_some_and(|name| doc.components.schemas.contains_key(name));
                if !registered {
                    return Err(BuildError::ReferenceResolutionFailed {
                        reference: ref_val.clone(),
                        location: path.to_string(),
                    });
                }
            }
            for (key, val) in map {
                check_refs(val, &pointer(path, key), doc)?;
            }
            Ok(())
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                check_refs(item, &format!("{}/{}", path, i), doc)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Check the document's structure.
///
/// - `info.title` and `info.version` are non-empty;
/// - every schema's `required` names only its properties and every array
///   has `items`;
/// - every component compiles as a JSON Schema;
/// - every operation has a response, operation ids are unique, and the
///   declared path parameters are exactly the pattern's placeholders.
///
/// # Errors
///
/// Returns `BuildError::StructuralValidationFailed` for the first violation.
pub fn check_structure(doc: &Document) -> Result<(), BuildError> {
    if doc.info.title.trim().is_empty() {
        return Err(invalid("/info/title", "title must not be empty"));
    }
    if doc.info.version.trim().is_empty() {
        return Err(invalid("/info/version", "version must not be empty"));
    }

    let components = json!({ "schemas": &doc.components.schemas });
    for (name, schema) in &doc.components.schemas {
        let location = pointer("/components/schemas", name);
        check_schema(schema, &location)?;
        compile_schema(schema, &components, &location)?;
    }

    let mut operation_ids: HashMap<&str, String> = HashMap::new();
    for (pattern, method, op) in doc.operations() {
        let location = pointer(&pointer("/paths", pattern), method.key());

        if op.responses.is_empty() {
            return Err(invalid(&location, "operation has no responses"));
        }

        if let Some(id) = op.operation_id.as_deref() {
            if let Some(previous) = operation_ids.insert(id, location.clone()) {
                return Err(invalid(
                    &location,
                    format!("duplicate operation id \"{id}\" (also at {previous})"),
                ));
            }
        }

        let declared: BTreeSet<&str> = op
            .parameters_in(ParameterLocation::Path)
            .map(|p| p.name.as_str())
            .collect();
        let placeholders = path_placeholders(pattern);
        let expected: BTreeSet<&str> = placeholders.iter().map(String::as_str).collect();
        if declared != expected {
            return Err(invalid(
                &location,
                format!(
                    "path parameters {:?} do not match placeholders {:?}",
                    declared, expected
                ),
            ));
        }

        for (i, param) in op.parameters.iter().enumerate() {
            check_schema_ref(&param.schema, &format!("{location}/parameters/{i}/schema"))?;
        }
        if let Some(body) = &op.request_body {
            for (content_type, media) in &body.content {
                let media_location = pointer(&format!("{location}/requestBody/content"), content_type);
                check_schema_ref(&media.schema, &format!("{media_location}/schema"))?;
            }
        }
        for (status, response) in &op.responses {
            for (content_type, media) in &response.content {
                let media_location = pointer(
                    &format!("{location}/responses/{status}/content"),
                    content_type,
                );
                check_schema_ref(&media.schema, &format!("{media_location}/schema"))?;
            }
        }
    }

    Ok(())
}

fn check_schema_ref(schema: &SchemaRef, location: &str) -> Result<(), BuildError> {
    match schema {
        SchemaRef::Inline(schema) => check_schema(schema, location),
        SchemaRef::Ref(_) => Ok(()),
    }
}

/// Schema invariants, checked recursively through inline children.
fn check_schema(schema: &Schema, location: &str) -> Result<(), BuildError> {
    for name in &schema.required {
        let known = schema
            .properties
            .as_ref()
            .is_some_and(|props| props.contains_key(name));
        if !known {
            return Err(invalid(
                location,
                format!("required property \"{name}\" is not defined"),
            ));
        }
    }

    if schema.is_type(SchemaType::Array) && schema.items.is_none() {
        return Err(invalid(location, "array schema has no items"));
    }

    if let Some(items) = &schema.items {
        check_schema_ref(items, &format!("{location}/items"))?;
    }
    if let Some(props) = &schema.properties {
        for (name, prop) in props {
            check_schema_ref(prop, &pointer(&format!("{location}/properties"), name))?;
        }
    }
    if let Some(AdditionalProperties::Schema(value)) = &schema.additional_properties {
        check_schema_ref(value, &format!("{location}/additionalProperties"))?;
    }
    Ok(())
}

/// Compile one component as a JSON Schema, with the document's components
/// in scope so its references resolve.
fn compile_schema(schema: &Schema, components: &Value, location: &str) -> Result<(), BuildError> {
    let mut value = serde_json::to_value(schema).map_err(|e| invalid(location, e.to_string()))?;
    if let Value::Object(map) = &mut value {
        map.insert("components".to_string(), components.clone());
    }
    jsonschema::validator_for(&value)
        .map(|_| ())
        .map_err(|e| invalid(location, e.to_string()))
}

fn invalid(location: &str, message: impl Into<String>) -> BuildError {
    BuildError::StructuralValidationFailed {
        location: location.to_string(),
        message: message.into(),
    }
}

/// Append `key` to a JSON pointer, escaping `~` and `/`.
fn pointer(path: &str, key: &str) -> String {
    format!("{}/{}", path, key.replace('~', "~0").replace('/', "~1"))
}
