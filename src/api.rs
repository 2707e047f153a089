//! Route and model declarations consumed by the document assembler.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::assembler;
use crate::document::{path_placeholders, Document, HttpMethod};
use crate::enums::EnumRegistry;
use crate::error::BuildError;
use crate::naming::NamingPolicy;
use crate::primitive::PrimitiveKind;
use crate::problem::{BadRequest, NotFound, UnprocessableEntity};
use crate::query::FlattenedParameter;
use crate::resolver::ResolverConfig;
use crate::schema::{ModelOpt, Schema};
use crate::types::{Describe, Origin, TypeDef, TypeRef};

/// Version used when none is declared.
pub const DEFAULT_VERSION: &str = "0.0.0";

/// A model type plus the options applied when it is resolved.
#[derive(Debug, Clone)]
pub struct Model {
    pub ty: TypeRef,
    pub opts: Vec<ModelOpt>,
}

impl Model {
    pub fn new(ty: TypeRef) -> Self {
        Self {
            ty,
            opts: Vec::new(),
        }
    }

    pub fn of<T: Describe + ?Sized>() -> Self {
        Self::new(TypeRef::of::<T>())
    }

    pub fn from_def(def: TypeDef) -> Self {
        Self::new(TypeRef::from_def(def))
    }

    pub fn opt(mut self, opt: ModelOpt) -> Self {
        self.opts.push(opt);
        self
    }

    pub fn description(self, description: impl Into<String>) -> Self {
        self.opt(ModelOpt::description(description))
    }

    pub fn nullable(self) -> Self {
        self.opt(ModelOpt::Nullable)
    }
}

/// One entry of a route's parameter table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamSpec {
    pub description: Option<String>,
    pub required: bool,
    /// Only meaningful for query parameters.
    pub allow_empty: bool,
    pub kind: PrimitiveKind,
    /// Regular expression the value must match.
    pub pattern: Option<String>,
    pub schema_opts: Vec<ModelOpt>,
}

impl ParamSpec {
    pub fn new(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn opt(mut self, opt: ModelOpt) -> Self {
        self.schema_opts.push(opt);
        self
    }

    /// The inline schema of a parameter declared with this spec.
    pub fn schema(&self) -> Schema {
        let mut schema = self.kind.schema();
        if let Some(pattern) = &self.pattern {
            schema.pattern = Some(pattern.clone());
        }
        crate::schema::apply_opts(&mut schema, &self.schema_opts);
        schema
    }
}

impl From<FlattenedParameter> for ParamSpec {
    fn from(param: FlattenedParameter) -> Self {
        Self {
            required: param.required,
            kind: param.kind,
            schema_opts: param.schema_opts,
            ..Self::default()
        }
    }
}

/// Parameter tables of a route, keyed by parameter name.
#[derive(Debug, Clone, Default)]
pub struct Params {
    pub header: BTreeMap<String, ParamSpec>,
    pub query: BTreeMap<String, ParamSpec>,
    pub path: BTreeMap<String, ParamSpec>,
}

/// One declared route.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: HttpMethod,
    pub pattern: String,
    pub operation_id: Option<String>,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub params: Params,
    pub request: Option<Model>,
    /// Content types of the request body; empty means `application/json`.
    pub request_content_types: Vec<String>,
    /// Struct model flattened into query parameters.
    pub query: Option<Model>,
    /// Status code → response model.
    pub responses: BTreeMap<u16, Model>,
}

impl Route {
    /// New route with every `{name}` placeholder declared as a required
    /// string path parameter.
    pub fn new(method: HttpMethod, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let path = path_placeholders(&pattern)
            .into_iter()
            .map(|name| (name, ParamSpec::new(PrimitiveKind::String).required()))
            .collect();
        Self {
            method,
            pattern,
            operation_id: None,
            tags: Vec::new(),
            description: None,
            params: Params {
                path,
                ..Params::default()
            },
            request: None,
            request_content_types: Vec::new(),
            query: None,
            responses: BTreeMap::new(),
        }
    }

    pub fn operation_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.operation_id = Some(id.into());
        self
    }

    pub fn tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn header_param(&mut self, name: impl Into<String>, spec: ParamSpec) -> &mut Self {
        self.params.header.insert(name.into(), spec);
        self
    }

    /// Declare a query parameter. Explicit entries override parameters of
    /// the same name produced by the query model.
    pub fn query_param(&mut self, name: impl Into<String>, spec: ParamSpec) -> &mut Self {
        self.params.query.insert(name.into(), spec);
        self
    }

    /// Declare or override a path parameter. Path parameters are always required.
    pub fn path_param(&mut self, name: impl Into<String>, spec: ParamSpec) -> &mut Self {
        self.params.path.insert(name.into(), spec.required());
        self
    }

    pub fn request(&mut self, model: Model) -> &mut Self {
        self.request = Some(model);
        self
    }

    pub fn request_content_types<I, S>(&mut self, types: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request_content_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn query(&mut self, model: Model) -> &mut Self {
        self.query = Some(model);
        self
    }

    pub fn response(&mut self, status: u16, model: Model) -> &mut Self {
        self.responses.insert(status, model);
        self
    }
}

/// An API under construction: configuration, enums, models and routes.
///
/// ```
/// use modelspec::{Api, HttpMethod, Model};
///
/// let mut api = Api::new("pets").version("1.0.0");
/// api.route(HttpMethod::Get, "/pets/{id}")
///     .operation_id("getPet")
///     .response(200, Model::of::<String>());
///
/// let doc = api.build_document().unwrap();
/// assert!(doc.operation("/pets/{id}", HttpMethod::Get).is_some());
/// ```
#[derive(Debug, Clone)]
pub struct Api {
    title: String,
    version: String,
    config: ResolverConfig,
    enums: EnumRegistry,
    models: Vec<Model>,
    routes: BTreeMap<String, BTreeMap<HttpMethod, Route>>,
}

impl Api {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: DEFAULT_VERSION.to_string(),
            config: ResolverConfig::default(),
            enums: EnumRegistry::new(),
            models: Vec::new(),
            routes: BTreeMap::new(),
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn naming(mut self, naming: NamingPolicy) -> Self {
        self.config.naming = naming;
        self
    }

    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Register the standard error bodies: `NotFound`, `BadRequest` and
    /// `UnprocessableEntity`.
    pub fn with_standard_errors(mut self) -> Self {
        self.register_model(Model::of::<NotFound>().description("Resource not found"));
        self.register_model(Model::of::<BadRequest>().description("Invalid input"));
        self.register_model(Model::of::<UnprocessableEntity>().description("Unprocessable entity"));
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn api_version(&self) -> &str {
        &self.version
    }

    pub fn resolver_config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn enums(&self) -> &EnumRegistry {
        &self.enums
    }

    pub fn enums_mut(&mut self) -> &mut EnumRegistry {
        &mut self.enums
    }

    pub fn register_enum<I, V>(&mut self, origin: Origin, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enums.register(origin, values);
        self
    }

    /// Register a model as a component even if no route uses it.
    pub fn register_model(&mut self, model: Model) -> &mut Self {
        self.models.push(model);
        self
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// The route for `method` and `pattern`, created on first use.
    pub fn route(&mut self, method: HttpMethod, pattern: &str) -> &mut Route {
        self.routes
            .entry(pattern.to_string())
            .or_default()
            .entry(method)
            .or_insert_with(|| Route::new(method, pattern))
    }

    /// Routes ordered by pattern, then method.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values().flat_map(BTreeMap::values)
    }

    /// Assemble and validate the OpenAPI document.
    ///
    /// # Errors
    ///
    /// Returns the first `BuildError` encountered; no partial document is
    /// produced.
    pub fn build_document(&self) -> Result<Document, BuildError> {
        assembler::assemble(self)
    }
}
