//! Generic admin CRUD handlers
//!
//! One set of handlers serves every registered resource type: the `model`
//! path segment resolves to a descriptor whose criteria builder, params
//! builder, and formatter do the type-specific work.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use bson::Document;
use serde_json::Value;

use crate::api::common::{render, ListResponse, Pagination, RecordResponse};
use crate::api::middleware::{report, AppState, Authenticated};
use crate::auth::RequestContext;
use crate::criteria::ListParams;
use crate::error::{AdminError, Result};
use crate::registry::{Action, ResourceDescriptor, UpdateContext};

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/:model", get(list_records).post(create_record))
        .route(
            "/:model/:id",
            get(get_record).put(update_record).delete(delete_record),
        )
}

fn parse_body(bytes: &Bytes) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(|_| AdminError::validation("Malformed request body"))
}

async fn load(
    state: &AppState,
    ctx: &RequestContext,
    descriptor: &ResourceDescriptor,
    id: &str,
) -> Result<Document> {
    state
        .store
        .find(ctx, descriptor, id)
        .await?
        .ok_or(AdminError::NotFound)
}

fn record_response(descriptor: &ResourceDescriptor, record: &Document) -> RecordResponse {
    RecordResponse {
        kind: descriptor.token.to_string(),
        data: descriptor.formatter.format(record, true),
    }
}

/// List records of one resource type.
#[utoipa::path(
    get,
    path = "/admin/{model}",
    params(
        ("model" = String, Path, description = "Resource type token"),
        ("offset" = Option<u64>, Query, description = "Records to skip"),
        ("limit" = Option<i64>, Query, description = "Page size, default 10"),
        ("sort" = Option<String>, Query, description = "field or field:asc,other:desc"),
        ("term" = Option<String>, Query, description = "Substring search"),
        ("without_data" = Option<bool>, Query, description = "Pagination counts only"),
        ("format" = Option<String>, Query, description = "yaml for YAML output"),
    ),
    responses(
        (status = 200, description = "Records with pagination", body = ListResponse),
        (status = 400, description = "Unknown resource type", body = crate::error::ErrorEnvelope),
        (status = 403, description = "Unauthorized", body = crate::error::ErrorEnvelope),
    ),
    tag = "admin"
)]
pub async fn list_records(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(model): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    match list_inner(&state, &ctx, &model, &query).await {
        Ok(response) => response,
        Err(err) => report(&state, err),
    }
}

async fn list_inner(
    state: &AppState,
    ctx: &RequestContext,
    model: &str,
    query: &HashMap<String, String>,
) -> Result<Response> {
    let descriptor = state.registry.resolve(model)?;
    let params = ListParams::from_query(query);
    let filter = descriptor.criteria.build(&params);

    let total = state.store.count(ctx, &descriptor, filter.clone()).await?;
    let data = if params.without_data {
        Vec::new()
    } else {
        let records = state.store.query(ctx, &descriptor, filter, &params).await?;
        records
            .iter()
            .map(|record| descriptor.formatter.format(record, false))
            .collect()
    };

    // Count-only responses carry no page, so the offset resets to 0.
    let offset = if params.without_data { 0 } else { params.offset };
    let payload = ListResponse {
        kind: descriptor.token.to_string(),
        data,
        pagination: Pagination {
            offset,
            limit: params.limit,
            total,
        },
    };
    render(params.format.as_deref(), &payload)
}

/// Fetch one record by id.
#[utoipa::path(
    get,
    path = "/admin/{model}/{id}",
    params(
        ("model" = String, Path, description = "Resource type token"),
        ("id" = String, Path, description = "Record id"),
    ),
    responses(
        (status = 200, description = "The record", body = RecordResponse),
        (status = 404, description = "No such record", body = crate::error::ErrorEnvelope),
    ),
    tag = "admin"
)]
pub async fn get_record(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path((model, id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    match get_inner(&state, &ctx, &model, &id, &query).await {
        Ok(response) => response,
        Err(err) => report(&state, err),
    }
}

async fn get_inner(
    state: &AppState,
    ctx: &RequestContext,
    model: &str,
    id: &str,
    query: &HashMap<String, String>,
) -> Result<Response> {
    let descriptor = state.registry.resolve(model)?;
    let record = load(state, ctx, &descriptor, id).await?;
    render(
        query.get("format").map(String::as_str),
        &record_response(&descriptor, &record),
    )
}

/// Create a record from a `{data: {...}}` body.
#[utoipa::path(
    post,
    path = "/admin/{model}",
    params(("model" = String, Path, description = "Resource type token")),
    request_body = Object,
    responses(
        (status = 200, description = "The created record", body = RecordResponse),
        (status = 400, description = "Validation failure", body = crate::error::ErrorEnvelope),
    ),
    tag = "admin"
)]
pub async fn create_record(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(model): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    bytes: Bytes,
) -> Response {
    match create_inner(&state, &ctx, &model, &query, &bytes).await {
        Ok(response) => response,
        Err(err) => report(&state, err),
    }
}

async fn create_inner(
    state: &AppState,
    ctx: &RequestContext,
    model: &str,
    query: &HashMap<String, String>,
    bytes: &Bytes,
) -> Result<Response> {
    let descriptor = state.registry.resolve(model)?;
    let body = parse_body(bytes)?;
    let fields = descriptor.params.build(Action::Create, &body, None)?;
    let record = state.store.create(ctx, &descriptor, fields).await?;
    render(
        query.get("format").map(String::as_str),
        &record_response(&descriptor, &record),
    )
}

/// Update a record from a `{data: {...}}` body validated against the
/// resource's narrower update schema.
#[utoipa::path(
    put,
    path = "/admin/{model}/{id}",
    params(
        ("model" = String, Path, description = "Resource type token"),
        ("id" = String, Path, description = "Record id"),
    ),
    request_body = Object,
    responses(
        (status = 200, description = "The updated record", body = RecordResponse),
        (status = 400, description = "Validation failure", body = crate::error::ErrorEnvelope),
        (status = 404, description = "No such record", body = crate::error::ErrorEnvelope),
    ),
    tag = "admin"
)]
pub async fn update_record(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path((model, id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    bytes: Bytes,
) -> Response {
    match update_inner(&state, &ctx, &model, &id, &query, &bytes).await {
        Ok(response) => response,
        Err(err) => report(&state, err),
    }
}

async fn update_inner(
    state: &AppState,
    ctx: &RequestContext,
    model: &str,
    id: &str,
    query: &HashMap<String, String>,
    bytes: &Bytes,
) -> Result<Response> {
    let descriptor = state.registry.resolve(model)?;
    let existing = load(state, ctx, &descriptor, id).await?;
    let body = parse_body(bytes)?;
    let update_ctx = UpdateContext {
        id: id.to_string(),
        existing: existing.clone(),
    };
    let fields = descriptor
        .params
        .build(Action::Update, &body, Some(&update_ctx))?;
    let record = state.store.update(ctx, &descriptor, existing, fields).await?;
    render(
        query.get("format").map(String::as_str),
        &record_response(&descriptor, &record),
    )
}

/// Delete a record by id.
#[utoipa::path(
    delete,
    path = "/admin/{model}/{id}",
    params(
        ("model" = String, Path, description = "Resource type token"),
        ("id" = String, Path, description = "Record id"),
    ),
    responses(
        (status = 200, description = "The deleted record's id", body = RecordResponse),
        (status = 404, description = "No such record", body = crate::error::ErrorEnvelope),
    ),
    tag = "admin"
)]
pub async fn delete_record(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path((model, id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    match delete_inner(&state, &ctx, &model, &id, &query).await {
        Ok(response) => response,
        Err(err) => report(&state, err),
    }
}

async fn delete_inner(
    state: &AppState,
    ctx: &RequestContext,
    model: &str,
    id: &str,
    query: &HashMap<String, String>,
) -> Result<Response> {
    let descriptor = state.registry.resolve(model)?;
    load(state, ctx, &descriptor, id).await?;
    state.store.delete(ctx, &descriptor, id).await?;
    let payload = RecordResponse {
        kind: descriptor.token.to_string(),
        data: serde_json::json!({ "id": id }),
    };
    render(query.get("format").map(String::as_str), &payload)
}
