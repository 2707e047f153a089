//! Error types for model resolution, query flattening and document builds.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::OpaqueKind;

/// Errors while resolving a type into a schema.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("maps must have a string key, but {ty} has key type {key}")]
    UnsupportedKeyType { ty: String, key: String },

    #[error("no enum constants registered for {ty}")]
    EnumLookupFailed { ty: String },

    #[error("error getting schema for type {owner}, field {field}: {source}")]
    Field {
        owner: String,
        field: String,
        #[source]
        source: Box<ResolveError>,
    },

    #[error("error getting schema of sequence element {element}: {source}")]
    Element {
        element: String,
        #[source]
        source: Box<ResolveError>,
    },

    #[error("error getting schema of map value {value}: {source}")]
    MapValue {
        value: String,
        #[source]
        source: Box<ResolveError>,
    },
}

impl ResolveError {
    /// The innermost error, with field/element context stripped.
    pub fn root_cause(&self) -> &ResolveError {
        match self {
            ResolveError::Field { source, .. }
            | ResolveError::Element { source, .. }
            | ResolveError::MapValue { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Errors while flattening a struct into query parameters.
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("only structs can be converted to query parameters, got {ty}")]
    NotAStruct { ty: String },

    #[error("{kind} type at {path} is not supported for flattening")]
    UnflattenableKind { path: String, kind: OpaqueKind },

    #[error("no enum constants registered for {ty} at {path}")]
    EnumLookupFailed { path: String, ty: String },
}

/// Errors while assembling a document.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{method} {pattern}: {source}")]
    Resolve {
        method: String,
        pattern: String,
        #[source]
        source: ResolveError,
    },

    #[error("failed to register model: {0}")]
    Model(#[from] ResolveError),

    #[error("{method} {pattern}: query parameters: {source}")]
    Flatten {
        method: String,
        pattern: String,
        #[source]
        source: FlattenError,
    },

    #[error("failed to resolve reference {reference} at {location}")]
    ReferenceResolutionFailed { reference: String, location: String },

    #[error("failed validation at {location}: {message}")]
    StructuralValidationFailed { location: String, message: String },
}

impl BuildError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while loading a catalog description.
#[derive(Debug, Error)]
pub enum CatalogError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid type expression \"{expr}\": {message}")]
    InvalidTypeExpr { expr: String, message: String },

    #[error("unknown primitive type \"{name}\"")]
    UnknownPrimitive { name: String },

    #[error("unknown type \"{name}\" referenced from {context}")]
    UnknownType { name: String, context: String },

    #[error("invalid route {route}: {message}")]
    InvalidRoute { route: String, message: String },
}

impl CatalogError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CatalogError::FileNotFound { .. } | CatalogError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}
