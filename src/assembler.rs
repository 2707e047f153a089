//! Document assembly: declared routes → operations → validated document.

use std::collections::BTreeMap;

use crate::api::{Api, Model, ParamSpec, Route};
use crate::document::{
    Document, MediaType, Operation, Parameter, ParameterLocation, RequestBody, Response,
    JSON_CONTENT_TYPE,
};
use crate::error::BuildError;
use crate::query;
use crate::resolver::{Resolved, Resolver};
use crate::schema::SchemaRef;
use crate::validator;

/// Build the document for `api`.
///
/// Registered models are resolved first, then every route in pattern and
/// method order. The registry becomes `components.schemas` and the
/// document is validated before it is returned.
///
/// # Errors
///
/// Stops at the first resolution, flattening or validation failure.
pub fn assemble(api: &Api) -> Result<Document, BuildError> {
    let mut resolver = Resolver::new(api.resolver_config().clone(), api.enums().clone());

    for model in api.models() {
        resolver.resolve(&model.ty.get(), &model.opts)?;
    }

    let mut doc = Document::new(api.title(), api.api_version());
    for route in api.routes() {
        let operation = build_operation(&mut resolver, route)?;
        doc.paths
            .entry(route.pattern.clone())
            .or_default()
            .set_operation(route.method, operation);
    }

    doc.components.schemas = resolver.into_registry().into_schemas();

    validator::check_references(&doc)?;
    validator::check_structure(&doc)?;

    tracing::info!(
        title = %doc.info.title,
        paths = doc.paths.len(),
        schemas = doc.components.schemas.len(),
        "built document"
    );
    Ok(doc)
}

fn build_operation(resolver: &mut Resolver, route: &Route) -> Result<Operation, BuildError> {
    tracing::debug!(method = %route.method, pattern = %route.pattern, "building operation");

    let mut parameters = Vec::new();
    for (name, spec) in &route.params.header {
        parameters.push(parameter(name, ParameterLocation::Header, spec));
    }
    for (name, spec) in &query_table(resolver, route)? {
        parameters.push(parameter(name, ParameterLocation::Query, spec));
    }
    for (name, spec) in &route.params.path {
        parameters.push(parameter(name, ParameterLocation::Path, spec));
    }

    let request_body = match &route.request {
        Some(model) => {
            let schema = resolve_model(resolver, route, model)?.to_ref();
            Some(request_body(&route.request_content_types, schema))
        }
        None => None,
    };

    let mut responses = BTreeMap::new();
    for (status, model) in &route.responses {
        let resolved = resolve_model(resolver, route, model)?;
        let response = Response {
            description: resolved.schema.description.clone().unwrap_or_default(),
            content: BTreeMap::from([(
                JSON_CONTENT_TYPE.to_string(),
                MediaType {
                    schema: resolved.to_ref(),
                },
            )]),
        };
        responses.insert(status.to_string(), response);
    }

    Ok(Operation {
        tags: route.tags.clone(),
        description: route.description.clone(),
        operation_id: route.operation_id.clone(),
        parameters,
        request_body,
        responses,
    })
}

/// The route's query parameters: the flattened query model overlaid with
/// the explicitly declared ones.
fn query_table(
    resolver: &Resolver,
    route: &Route,
) -> Result<BTreeMap<String, ParamSpec>, BuildError> {
    let mut table = BTreeMap::new();
    if let Some(model) = &route.query {
        let flattened =
            query::flatten(&model.ty.get(), resolver.enums()).map_err(|source| {
                BuildError::Flatten {
                    method: route.method.to_string(),
                    pattern: route.pattern.clone(),
                    source,
                }
            })?;
        table.extend(
            flattened
                .into_iter()
                .map(|(path, param)| (path, ParamSpec::from(param))),
        );
    }
    table.extend(
        route
            .params
            .query
            .iter()
            .map(|(name, spec)| (name.clone(), spec.clone())),
    );
    Ok(table)
}

fn parameter(name: &str, location: ParameterLocation, spec: &ParamSpec) -> Parameter {
    Parameter {
        name: name.to_string(),
        location,
        description: spec.description.clone(),
        required: spec.required || location == ParameterLocation::Path,
        allow_empty_value: spec.allow_empty && location == ParameterLocation::Query,
        schema: SchemaRef::inline(spec.schema()),
    }
}

fn request_body(content_types: &[String], schema: SchemaRef) -> RequestBody {
    let content = if content_types.is_empty() {
        BTreeMap::from([(JSON_CONTENT_TYPE.to_string(), MediaType { schema })])
    } else {
        content_types
            .iter()
            .map(|ct| {
                (
                    ct.clone(),
                    MediaType {
                        schema: schema.clone(),
                    },
                )
            })
            .collect()
    };
    RequestBody { content }
}

fn resolve_model(
    resolver: &mut Resolver,
    route: &Route,
    model: &Model,
) -> Result<Resolved, BuildError> {
    resolver
        .resolve(&model.ty.get(), &model.opts)
        .map_err(|source| BuildError::Resolve {
            method: route.method.to_string(),
            pattern: route.pattern.clone(),
            source,
        })
}
