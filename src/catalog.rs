//! JSON catalogs: type, enum and route declarations for callers that cannot
//! implement [`Describe`](crate::Describe) themselves.
//!
//! ```json
//! {
//!   "title": "Pet Store",
//!   "version": "1.0.0",
//!   "enums": { "pets.Status": ["available", "sold"] },
//!   "types": {
//!     "pets.Status": { "enum": "string" },
//!     "pets.Pet": {
//!       "fields": [
//!         { "name": "id", "type": "i64" },
//!         { "name": "status", "type": "pets.Status" },
//!         { "name": "tags", "type": "[]string", "omit_empty": true }
//!       ]
//!     }
//!   },
//!   "routes": [
//!     { "method": "GET", "path": "/pets/{id}", "responses": { "200": "pets.Pet" } }
//!   ]
//! }
//! ```
//!
//! Type expressions: primitive names (`string`, `bool`, `i64`, `f64`, ...),
//! `any`, `chan`, `func`, `unsafe.Pointer`, `*T`, `[]T`, `map[K]V`, and
//! declared type names. The standard error bodies (`ErrorBody`, `NotFound`,
//! `BadRequest`, `ValidationErrorBody`, `UnprocessableEntity`,
//! `FieldViolation`) are always available.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::api::{Api, Model, ParamSpec, DEFAULT_VERSION};
use crate::document::HttpMethod;
use crate::enums::EnumRegistry;
use crate::error::CatalogError;
use crate::naming::NamingPolicy;
use crate::primitive::PrimitiveKind;
use crate::problem::{
    BadRequest, ErrorBody, FieldViolation, NotFound, UnprocessableEntity, ValidationErrorBody,
};
use crate::schema::{ModelOpt, Schema};
use crate::types::{Field, OpaqueKind, Origin, TypeDef, TypeRef};

/// Parsed type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Primitive { name: String, kind: PrimitiveKind },
    Opaque(OpaqueKind),
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Named(String),
}

impl TypeExpr {
    /// Parse a type expression. Named types are not checked here.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidTypeExpr` for malformed expressions.
    pub fn parse(expr: &str) -> Result<Self, CatalogError> {
        let s = expr.trim();
        let invalid = |message: &str| CatalogError::InvalidTypeExpr {
            expr: expr.to_string(),
            message: message.to_string(),
        };

        if s.is_empty() {
            return Err(invalid("empty type"));
        }
        if let Some(rest) = s.strip_prefix('*') {
            return Ok(TypeExpr::Pointer(Box::new(TypeExpr::parse(rest)?)));
        }
        if let Some(rest) = s.strip_prefix("[]") {
            return Ok(TypeExpr::Slice(Box::new(TypeExpr::parse(rest)?)));
        }
        if let Some(rest) = s.strip_prefix("map[") {
            let close = matching_bracket(rest).ok_or_else(|| invalid("unbalanced brackets"))?;
            let key = TypeExpr::parse(&rest[..close])?;
            let value = TypeExpr::parse(&rest[close + 1..])?;
            return Ok(TypeExpr::Map(Box::new(key), Box::new(value)));
        }

        match s {
            "any" | "interface{}" => return Ok(TypeExpr::Opaque(OpaqueKind::Interface)),
            "unsafe.Pointer" => return Ok(TypeExpr::Opaque(OpaqueKind::UnsafePointer)),
            _ => {}
        }
        if s == "chan" || s.starts_with("chan ") {
            return Ok(TypeExpr::Opaque(OpaqueKind::Channel));
        }
        if s == "func" || s.starts_with("func(") {
            return Ok(TypeExpr::Opaque(OpaqueKind::Function));
        }
        if let Some(kind) = PrimitiveKind::parse(s) {
            return Ok(TypeExpr::Primitive {
                name: s.to_string(),
                kind,
            });
        }

        let valid_name = s
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | ':' | '/' | '-'));
        if !valid_name {
            return Err(invalid("unexpected character"));
        }
        Ok(TypeExpr::Named(s.to_string()))
    }

    /// Every named type this expression mentions.
    fn names(&self) -> Vec<&str> {
        match self {
            TypeExpr::Primitive { .. } | TypeExpr::Opaque(_) => Vec::new(),
            TypeExpr::Pointer(inner) | TypeExpr::Slice(inner) => inner.names(),
            TypeExpr::Map(key, value) => {
                let mut names = key.names();
                names.extend(value.names());
                names
            }
            TypeExpr::Named(name) => vec![name.as_str()],
        }
    }
}

/// Index of the `]` closing a bracket already opened before `s`.
fn matching_bracket(s: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

// === Raw file format ===

#[derive(Debug, Deserialize)]
struct RawCatalog {
    title: String,
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    naming: NamingPolicy,
    #[serde(default)]
    standard_errors: bool,
    #[serde(default)]
    enums: BTreeMap<String, Vec<Value>>,
    #[serde(default)]
    types: BTreeMap<String, RawType>,
    #[serde(default)]
    routes: Vec<RawRoute>,
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

#[derive(Debug, Deserialize)]
struct RawType {
    description: Option<String>,
    fields: Option<Vec<RawField>>,
    #[serde(rename = "enum")]
    enum_kind: Option<String>,
    schema: Option<Schema>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    ty: Option<String>,
    /// Inline anonymous struct instead of a type expression.
    fields: Option<Vec<RawField>>,
    rename: Option<String>,
    #[serde(default)]
    omit_empty: bool,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    embedded: bool,
    doc: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawModel {
    Type(String),
    Detailed {
        #[serde(rename = "type")]
        ty: String,
        description: Option<String>,
        #[serde(default)]
        nullable: bool,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RawParam {
    #[serde(rename = "type")]
    ty: Option<String>,
    description: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    allow_empty: bool,
    pattern: Option<String>,
    #[serde(rename = "enum", default)]
    enum_values: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    method: String,
    path: String,
    operation_id: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    description: Option<String>,
    request: Option<RawModel>,
    #[serde(default)]
    request_content_types: Vec<String>,
    query: Option<String>,
    #[serde(default)]
    responses: BTreeMap<String, RawModel>,
    #[serde(default)]
    headers: BTreeMap<String, RawParam>,
    #[serde(default)]
    query_params: BTreeMap<String, RawParam>,
    #[serde(default)]
    path_params: BTreeMap<String, RawParam>,
}

// === Checked declarations ===

#[derive(Debug, Clone)]
enum FieldType {
    Expr(TypeExpr),
    Anonymous(Vec<FieldSpec>),
}

#[derive(Debug, Clone)]
struct FieldSpec {
    name: String,
    ty: FieldType,
    rename: Option<String>,
    omit_empty: bool,
    hidden: bool,
    embedded: bool,
    doc: Option<String>,
}

#[derive(Debug, Clone)]
enum Declared {
    Struct {
        description: Option<String>,
        fields: Vec<FieldSpec>,
    },
    Enum {
        description: Option<String>,
        kind: PrimitiveKind,
    },
    Known(Schema),
}

#[derive(Debug, Default)]
struct Declarations {
    types: BTreeMap<String, Declared>,
}

#[derive(Debug, Clone)]
struct ModelSpec {
    expr: TypeExpr,
    opts: Vec<ModelOpt>,
}

#[derive(Debug, Clone)]
struct RouteSpec {
    method: HttpMethod,
    path: String,
    operation_id: Option<String>,
    tags: Vec<String>,
    description: Option<String>,
    request: Option<ModelSpec>,
    request_content_types: Vec<String>,
    query: Option<TypeExpr>,
    responses: BTreeMap<u16, ModelSpec>,
    headers: BTreeMap<String, ParamSpec>,
    query_params: BTreeMap<String, ParamSpec>,
    path_params: BTreeMap<String, ParamSpec>,
}

const BUILTIN_TYPES: &[&str] = &[
    "ErrorBody",
    "NotFound",
    "BadRequest",
    "ValidationErrorBody",
    "UnprocessableEntity",
    "FieldViolation",
];

fn builtin(name: &str) -> Option<TypeDef> {
    let def = match name {
        "ErrorBody" => TypeDef::of::<ErrorBody>(),
        "NotFound" => TypeDef::of::<NotFound>(),
        "BadRequest" => TypeDef::of::<BadRequest>(),
        "ValidationErrorBody" => TypeDef::of::<ValidationErrorBody>(),
        "UnprocessableEntity" => TypeDef::of::<UnprocessableEntity>(),
        "FieldViolation" => TypeDef::of::<FieldViolation>(),
        _ => return None,
    };
    Some(def)
}

/// A loaded, checked catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub title: String,
    pub version: String,
    pub naming: NamingPolicy,
    pub standard_errors: bool,
    enums: EnumRegistry,
    decls: Arc<Declarations>,
    routes: Vec<RouteSpec>,
}

impl Catalog {
    /// Load a catalog from a file path.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::FileNotFound` if the file doesn't exist,
    /// `CatalogError::ReadError` if it cannot be read, and any error of
    /// [`Catalog::parse`].
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content)
    }

    /// Parse and check a catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidJson` if the content isn't a valid
    /// catalog, and `InvalidTypeExpr`, `UnknownPrimitive`, `UnknownType` or
    /// `InvalidRoute` for declarations that don't check.
    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog =
            serde_json::from_str(content).map_err(|source| CatalogError::InvalidJson { source })?;

        let mut types = BTreeMap::new();
        for (name, raw_type) in raw.types {
            let declared = declare_type(&name, raw_type)?;
            types.insert(name, declared);
        }
        let decls = Declarations { types };

        for (name, declared) in &decls.types {
            if let Declared::Struct { fields, .. } = declared {
                check_fields(&decls, fields, &format!("type {name}"))?;
            }
        }

        let mut enums = EnumRegistry::new();
        for (name, values) in raw.enums {
            enums.register(Origin::parse_qualified(&name), values);
        }

        let routes = raw
            .routes
            .into_iter()
            .map(|route| declare_route(&decls, route))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            types = decls.types.len(),
            enums = enums.len(),
            routes = routes.len(),
            "loaded catalog"
        );

        Ok(Self {
            title: raw.title,
            version: raw.version,
            naming: raw.naming,
            standard_errors: raw.standard_errors,
            enums,
            decls: Arc::new(decls),
            routes,
        })
    }

    pub fn enums(&self) -> &EnumRegistry {
        &self.enums
    }

    /// Declared type names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.decls.types.keys().map(String::as_str)
    }

    /// Description of a declared or built-in type.
    pub fn type_def(&self, name: &str) -> Option<TypeDef> {
        if self.decls.types.contains_key(name) {
            return Some(named_def(&self.decls, name));
        }
        builtin(name)
    }

    /// Description of an arbitrary type expression over this catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the expression is malformed or names an unknown type.
    pub fn resolve_expr(&self, expr: &str) -> Result<TypeDef, CatalogError> {
        let expr = TypeExpr::parse(expr)?;
        check_expr(&self.decls, &expr, "expression")?;
        Ok(type_ref(&self.decls, &expr).get())
    }

    /// Declare every route of the catalog on a new [`Api`].
    pub fn to_api(&self) -> Api {
        let mut api = Api::new(self.title.clone())
            .version(self.version.clone())
            .naming(self.naming.clone());
        if self.standard_errors {
            api = api.with_standard_errors();
        }
        *api.enums_mut() = self.enums.clone();

        for spec in &self.routes {
            let route = api.route(spec.method, &spec.path);
            if let Some(id) = &spec.operation_id {
                route.operation_id(id.clone());
            }
            if let Some(description) = &spec.description {
                route.description(description.clone());
            }
            route.tags(spec.tags.iter().cloned());
            if let Some(request) = &spec.request {
                route.request(self.model(request));
            }
            if !spec.request_content_types.is_empty() {
                route.request_content_types(spec.request_content_types.iter().cloned());
            }
            if let Some(query) = &spec.query {
                route.query(Model::new(type_ref(&self.decls, query)));
            }
            for (status, model) in &spec.responses {
                route.response(*status, self.model(model));
            }
            for (name, param) in &spec.headers {
                route.header_param(name.clone(), param.clone());
            }
            for (name, param) in &spec.query_params {
                route.query_param(name.clone(), param.clone());
            }
            for (name, param) in &spec.path_params {
                route.path_param(name.clone(), param.clone());
            }
        }
        api
    }

    fn model(&self, spec: &ModelSpec) -> Model {
        Model {
            ty: type_ref(&self.decls, &spec.expr),
            opts: spec.opts.clone(),
        }
    }
}

fn declare_type(name: &str, raw: RawType) -> Result<Declared, CatalogError> {
    let invalid = |message: &str| CatalogError::InvalidTypeExpr {
        expr: name.to_string(),
        message: message.to_string(),
    };

    match (raw.fields, raw.enum_kind, raw.schema) {
        (Some(fields), None, None) => Ok(Declared::Struct {
            description: raw.description,
            fields: declare_fields(fields)?,
        }),
        (None, Some(kind), None) => {
            let kind = PrimitiveKind::parse(&kind)
                .ok_or_else(|| CatalogError::UnknownPrimitive { name: kind.clone() })?;
            Ok(Declared::Enum {
                description: raw.description,
                kind,
            })
        }
        (None, None, Some(mut schema)) => {
            if schema.description.is_none() {
                schema.description = raw.description;
            }
            Ok(Declared::Known(schema))
        }
        (None, None, None) => Err(invalid("expected one of \"fields\", \"enum\" or \"schema\"")),
        _ => Err(invalid("only one of \"fields\", \"enum\" or \"schema\" may be given")),
    }
}

fn declare_fields(raw: Vec<RawField>) -> Result<Vec<FieldSpec>, CatalogError> {
    raw.into_iter()
        .map(|field| {
            let ty = match (field.ty, field.fields) {
                (Some(expr), None) => FieldType::Expr(TypeExpr::parse(&expr)?),
                (None, Some(fields)) => FieldType::Anonymous(declare_fields(fields)?),
                _ => {
                    return Err(CatalogError::InvalidTypeExpr {
                        expr: field.name,
                        message: "field needs exactly one of \"type\" or \"fields\"".into(),
                    })
                }
            };
            Ok(FieldSpec {
                name: field.name,
                ty,
                rename: field.rename,
                omit_empty: field.omit_empty,
                hidden: field.hidden,
                embedded: field.embedded,
                doc: field.doc,
            })
        })
        .collect()
}

fn check_fields(decls: &Declarations, fields: &[FieldSpec], context: &str) -> Result<(), CatalogError> {
    for field in fields {
        let context = format!("{context}, field {}", field.name);
        match &field.ty {
            FieldType::Expr(expr) => check_expr(decls, expr, &context)?,
            FieldType::Anonymous(fields) => check_fields(decls, fields, &context)?,
        }
    }
    Ok(())
}

/// Every name in `expr` must be declared or built in.
fn check_expr(decls: &Declarations, expr: &TypeExpr, context: &str) -> Result<(), CatalogError> {
    for name in expr.names() {
        if decls.types.contains_key(name) || BUILTIN_TYPES.contains(&name) {
            continue;
        }
        // A bare lowercase word is most likely a primitive we don't know.
        if !name.contains(|c| c == '.' || c == ':') && name.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(CatalogError::UnknownPrimitive {
                name: name.to_string(),
            });
        }
        return Err(CatalogError::UnknownType {
            name: name.to_string(),
            context: context.to_string(),
        });
    }
    Ok(())
}

fn declare_route(decls: &Declarations, raw: RawRoute) -> Result<RouteSpec, CatalogError> {
    let route_name = format!("{} {}", raw.method, raw.path);
    let invalid = |message: String| CatalogError::InvalidRoute {
        route: route_name.clone(),
        message,
    };
    let context = format!("route {route_name}");

    let method: HttpMethod = raw.method.parse().map_err(invalid)?;
    if !raw.path.starts_with('/') {
        return Err(invalid("path must start with '/'".to_string()));
    }

    let model = |raw: RawModel| -> Result<ModelSpec, CatalogError> {
        let (ty, description, nullable) = match raw {
            RawModel::Type(ty) => (ty, None, false),
            RawModel::Detailed {
                ty,
                description,
                nullable,
            } => (ty, description, nullable),
        };
        let expr = TypeExpr::parse(&ty)?;
        check_expr(decls, &expr, &context)?;
        let mut opts = Vec::new();
        if nullable {
            opts.push(ModelOpt::Nullable);
        }
        if let Some(description) = description {
            opts.push(ModelOpt::Description(description));
        }
        Ok(ModelSpec { expr, opts })
    };

    let request = raw.request.map(&model).transpose()?;

    let query = match raw.query {
        Some(expr) => {
            let expr = TypeExpr::parse(&expr)?;
            check_expr(decls, &expr, &context)?;
            Some(expr)
        }
        None => None,
    };

    let mut responses = BTreeMap::new();
    for (status, raw_model) in raw.responses {
        let code = status
            .parse::<u16>()
            .ok()
            .filter(|code| (100..=599).contains(code))
            .ok_or_else(|| invalid(format!("invalid status code \"{status}\"")))?;
        responses.insert(code, model(raw_model)?);
    }

    Ok(RouteSpec {
        method,
        path: raw.path,
        operation_id: raw.operation_id,
        tags: raw.tags,
        description: raw.description,
        request,
        request_content_types: raw.request_content_types,
        query,
        responses,
        headers: declare_params(raw.headers)?,
        query_params: declare_params(raw.query_params)?,
        path_params: declare_params(raw.path_params)?,
    })
}

fn declare_params(raw: BTreeMap<String, RawParam>) -> Result<BTreeMap<String, ParamSpec>, CatalogError> {
    raw.into_iter()
        .map(|(name, param)| {
            let kind = match param.ty.as_deref() {
                None => PrimitiveKind::String,
                Some(ty) => PrimitiveKind::parse(ty)
                    .ok_or_else(|| CatalogError::UnknownPrimitive { name: ty.to_string() })?,
            };
            let mut spec = ParamSpec {
                description: param.description,
                required: param.required,
                allow_empty: param.allow_empty,
                kind,
                pattern: param.pattern,
                schema_opts: Vec::new(),
            };
            if !param.enum_values.is_empty() {
                spec.schema_opts.push(ModelOpt::EnumValues(param.enum_values));
            }
            Ok((name, spec))
        })
        .collect()
}

// === Declarations → type descriptions ===

fn type_ref(decls: &Arc<Declarations>, expr: &TypeExpr) -> TypeRef {
    match expr {
        TypeExpr::Primitive { name, kind } => {
            TypeRef::from_def(TypeDef::primitive_named(name, *kind))
        }
        TypeExpr::Opaque(kind) => TypeRef::from_def(TypeDef::opaque(*kind)),
        TypeExpr::Pointer(inner) => TypeRef::from_def(TypeDef::optional(type_ref(decls, inner))),
        TypeExpr::Slice(inner) => TypeRef::from_def(TypeDef::sequence(type_ref(decls, inner))),
        TypeExpr::Map(key, value) => TypeRef::from_def(TypeDef::map(
            type_ref(decls, key),
            type_ref(decls, value),
        )),
        TypeExpr::Named(name) => {
            let decls = Arc::clone(decls);
            let name = name.clone();
            TypeRef::from_fn(move || match builtin(&name) {
                Some(def) if !decls.types.contains_key(&name) => def,
                _ => named_def(&decls, &name),
            })
        }
    }
}

fn named_def(decls: &Arc<Declarations>, name: &str) -> TypeDef {
    let origin = Origin::parse_qualified(name);
    match decls.types.get(name) {
        Some(Declared::Struct {
            description,
            fields,
        }) => {
            let mut def = TypeDef::structure(origin, build_fields(decls, fields));
            def.description = description.clone();
            def
        }
        Some(Declared::Enum { description, kind }) => {
            let mut def = TypeDef::enumeration(origin, *kind);
            def.description = description.clone();
            def
        }
        Some(Declared::Known(schema)) => TypeDef::known(origin, schema.clone()),
        None => {
            // Names are checked at load time.
            tracing::warn!(name = %name, "undeclared type in catalog");
            TypeDef::opaque(OpaqueKind::Interface)
        }
    }
}

fn build_fields(decls: &Arc<Declarations>, fields: &[FieldSpec]) -> Vec<Field> {
    fields
        .iter()
        .map(|spec| {
            let ty = match &spec.ty {
                FieldType::Expr(expr) => type_ref(decls, expr),
                FieldType::Anonymous(fields) => {
                    TypeRef::from_def(TypeDef::anonymous_struct(build_fields(decls, fields)))
                }
            };
            let mut field = Field::new(spec.name.clone(), ty);
            if let Some(rename) = &spec.rename {
                field = field.rename(rename.clone());
            }
            if spec.omit_empty {
                field = field.omit_empty();
            }
            if spec.hidden {
                field = field.hidden();
            }
            if spec.embedded {
                field = field.embedded();
            }
            if let Some(doc) = &spec.doc {
                field = field.doc(doc.clone());
            }
            field
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Kind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PETS: &str = r#"{
        "title": "Pets",
        "version": "2.0.0",
        "enums": { "pets.Status": ["available", "sold"] },
        "types": {
            "pets.Status": { "enum": "string" },
            "pets.Pet": {
                "description": "A pet",
                "fields": [
                    { "name": "id", "type": "i64" },
                    { "name": "status", "type": "pets.Status" },
                    { "name": "owner", "type": "*pets.Pet" },
                    { "name": "tags", "type": "[]string", "omit_empty": true }
                ]
            },
            "time.Time": { "schema": { "type": "string", "format": "date-time" } }
        },
        "routes": [
            {
                "method": "get",
                "path": "/pets/{id}",
                "operation_id": "getPet",
                "responses": { "200": "pets.Pet", "404": "NotFound" }
            }
        ]
    }"#;

    #[test]
    fn parse_type_expressions() {
        assert_eq!(
            TypeExpr::parse("*[]string").unwrap(),
            TypeExpr::Pointer(Box::new(TypeExpr::Slice(Box::new(TypeExpr::Primitive {
                name: "string".into(),
                kind: PrimitiveKind::String
            }))))
        );
        assert_eq!(
            TypeExpr::parse("map[string][]pets.Pet").unwrap(),
            TypeExpr::Map(
                Box::new(TypeExpr::Primitive {
                    name: "string".into(),
                    kind: PrimitiveKind::String
                }),
                Box::new(TypeExpr::Slice(Box::new(TypeExpr::Named("pets.Pet".into()))))
            )
        );
        assert_eq!(
            TypeExpr::parse("func(int) error").unwrap(),
            TypeExpr::Opaque(OpaqueKind::Function)
        );
        assert!(matches!(
            TypeExpr::parse("map[string"),
            Err(CatalogError::InvalidTypeExpr { .. })
        ));
        assert!(matches!(
            TypeExpr::parse("Pet<T>"),
            Err(CatalogError::InvalidTypeExpr { .. })
        ));
    }

    #[test]
    fn parse_catalog() {
        let catalog = Catalog::parse(PETS).unwrap();
        assert_eq!(catalog.title, "Pets");
        assert_eq!(catalog.version, "2.0.0");
        assert_eq!(
            catalog.type_names().collect::<Vec<_>>(),
            vec!["pets.Pet", "pets.Status", "time.Time"]
        );

        let pet = catalog.type_def("pets.Pet").unwrap();
        assert_eq!(pet.origin, Some(Origin::new("pets", "Pet")));
        assert_eq!(pet.description.as_deref(), Some("A pet"));
        match &pet.kind {
            Kind::Struct(fields) => {
                assert_eq!(fields.len(), 4);
                assert!(fields[3].omit_empty);
                assert!(matches!(fields[2].ty.get().kind, Kind::Optional(_)));
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn builtins_are_available() {
        let catalog = Catalog::parse(PETS).unwrap();
        let def = catalog.type_def("NotFound").unwrap();
        assert_eq!(def.origin.map(|o| o.name), Some("NotFound".to_string()));
    }

    #[test]
    fn unknown_type_is_reported_with_context() {
        let content = r#"{
            "title": "x",
            "types": { "a.A": { "fields": [ { "name": "b", "type": "b.B" } ] } }
        }"#;
        match Catalog::parse(content) {
            Err(CatalogError::UnknownType { name, context }) => {
                assert_eq!(name, "b.B");
                assert_eq!(context, "type a.A, field b");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn unknown_primitive_is_reported() {
        let content = r#"{
            "title": "x",
            "types": { "a.A": { "fields": [ { "name": "c", "type": "complex128" } ] } }
        }"#;
        assert!(matches!(
            Catalog::parse(content),
            Err(CatalogError::UnknownPrimitive { ref name }) if name == "complex128"
        ));
    }

    #[test]
    fn invalid_routes_are_rejected() {
        let content = r#"{ "title": "x", "routes": [ { "method": "FETCH", "path": "/a" } ] }"#;
        assert!(matches!(
            Catalog::parse(content),
            Err(CatalogError::InvalidRoute { .. })
        ));

        let content = r#"{ "title": "x", "routes": [ { "method": "GET", "path": "/a",
            "responses": { "abc": "string" } } ] }"#;
        assert!(matches!(
            Catalog::parse(content),
            Err(CatalogError::InvalidRoute { .. })
        ));
    }

    #[test]
    fn type_needs_exactly_one_body() {
        let content = r#"{ "title": "x", "types": { "a.A": { "enum": "string", "fields": [] } } }"#;
        assert!(matches!(
            Catalog::parse(content),
            Err(CatalogError::InvalidTypeExpr { .. })
        ));
    }

    #[test]
    fn load_file_not_found() {
        let result = Catalog::load(Path::new("/nonexistent/catalog.json"));
        assert!(matches!(result, Err(CatalogError::FileNotFound { .. })));
    }

    #[test]
    fn load_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let result = Catalog::load(file.path());
        assert!(matches!(result, Err(CatalogError::InvalidJson { .. })));
    }

    #[test]
    fn to_api_builds_document() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", PETS).unwrap();

        let catalog = Catalog::load(file.path()).unwrap();
        let doc = catalog.to_api().build_document().unwrap();

        assert_eq!(doc.info.version, "2.0.0");
        assert!(doc.components.schemas.contains_key("Pet"));
        assert!(doc.components.schemas.contains_key("Status"));
        assert!(doc.components.schemas.contains_key("NotFound"));
        let op = doc.operation("/pets/{id}", HttpMethod::Get).unwrap();
        assert_eq!(op.operation_id.as_deref(), Some("getPet"));
    }

    #[test]
    fn resolve_expr_over_catalog() {
        let catalog = Catalog::parse(PETS).unwrap();
        let def = catalog.resolve_expr("map[string]time.Time").unwrap();
        assert!(matches!(def.kind, Kind::Map { .. }));
        assert!(catalog.resolve_expr("map[string]nope.Nope").is_err());
    }
}
