//! Model-to-OpenAPI schema generation.
//!
//! Describe your data model once and get an OpenAPI 3.0 document for the
//! request bodies, response bodies and query parameters of an HTTP API.
//!
//! # Example
//!
//! ```
//! use modelspec::{Api, Describe, Field, HttpMethod, Model, Origin, SchemaRef, TypeDef};
//!
//! struct Pet;
//!
//! impl Describe for Pet {
//!     fn describe() -> TypeDef {
//!         TypeDef::structure(
//!             Origin::new("pets", "Pet"),
//!             vec![
//!                 Field::of::<i64>("id"),
//!                 Field::of::<String>("name"),
//!                 Field::of::<Option<String>>("nickname"),
//!             ],
//!         )
//!     }
//! }
//!
//! let mut api = Api::new("Pet Store").version("1.0.0").with_standard_errors();
//! api.route(HttpMethod::Get, "/pets/{id}")
//!     .operation_id("getPet")
//!     .response(200, Model::of::<Pet>());
//!
//! let doc = api.build_document().unwrap();
//!
//! // Structs are registered once and used by reference
//! let pet = &doc.components.schemas["Pet"];
//! assert_eq!(pet.required, vec!["id", "name"]);
//! let op = doc.operation("/pets/{id}", HttpMethod::Get).unwrap();
//! assert_eq!(
//!     op.responses["200"].content["application/json"].schema,
//!     SchemaRef::component("Pet")
//! );
//! ```
//!
//! # Reference or inline
//!
//! | Resolved schema | Registered | Used as |
//! |-----------------|------------|---------|
//! | object without `additionalProperties` | yes | `$ref` |
//! | any schema with `enum` values | yes | `$ref` |
//! | primitive, array, map, free-form object | no | inline |
//!
//! # Query parameters
//!
//! [`flatten`] turns a struct into bracket-notation parameters:
//! `address[city]`, and `tags[0]`, `tags[1]`, `tags[2]`, `tags[]` for
//! sequences.

mod api;
mod assembler;
mod catalog;
mod document;
mod enums;
mod error;
mod naming;
mod primitive;
mod problem;
mod query;
mod registry;
mod resolver;
mod schema;
mod types;
mod validator;

pub use api::{Api, Model, ParamSpec, Params, Route, DEFAULT_VERSION};
pub use assembler::assemble;
pub use catalog::{Catalog, TypeExpr};
pub use document::{
    path_placeholders, Components, Document, HttpMethod, Info, MediaType, Operation, Parameter,
    ParameterLocation, PathItem, RequestBody, Response, JSON_CONTENT_TYPE, OPENAPI_VERSION,
};
pub use enums::EnumRegistry;
pub use error::{BuildError, CatalogError, FlattenError, ResolveError};
pub use naming::{normalize, NamingPolicy};
pub use primitive::PrimitiveKind;
pub use problem::{
    BadRequest, ErrorBody, FieldViolation, NotFound, UnprocessableEntity, ValidationErrorBody,
};
pub use query::{flatten, FlattenedParameter, SEQUENCE_SLOTS};
pub use registry::ModelRegistry;
pub use resolver::{Resolved, Resolver, ResolverConfig, TypeHook};
pub use schema::{
    apply_opts, AdditionalProperties, ModelOpt, Reference, Schema, SchemaRef, SchemaType,
    COMPONENT_REF_PREFIX,
};
pub use types::{
    is_marked_deprecated, Describe, Field, Kind, OpaqueKind, Origin, SchemaHook, TypeDef, TypeRef,
};
pub use validator::{check_references, check_structure, validate_document};
