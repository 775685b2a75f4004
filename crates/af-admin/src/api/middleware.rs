//! API Middleware
//!
//! Shared application state, the authentication extractor, and error
//! reporting. Authentication accepts an `Authorization: <type> <token>`
//! header, a `token` query parameter, or a `tenant_id` query parameter
//! resolved to the tenant's owner; anything else is a 403.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};

use af_common::{Notification, Notifier};
use af_router::parse_query;

use crate::auth::{AuthStore, RequestContext};
use crate::error::AdminError;
use crate::registry::ResourceRegistry;
use crate::repository::RecordStore;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ResourceRegistry>,
    pub store: Arc<dyn RecordStore>,
    pub auth: Arc<dyn AuthStore>,
    pub notifier: Arc<dyn Notifier>,
}

/// Emit the error as a notification event and render its envelope. Every
/// failed request goes through here exactly once.
pub fn report(state: &AppState, error: AdminError) -> Response {
    state.notifier.notify(Notification::new(
        error.severity(),
        error.to_string(),
        "admin-api",
    ));
    error.into_response()
}

/// Extractor yielding the request's authenticated context.
pub struct Authenticated(pub RequestContext);

#[axum::async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_context(parts, state).await {
            Ok(ctx) => Ok(Authenticated(ctx)),
            Err(err) => Err(report(state, err)),
        }
    }
}

async fn resolve_context(
    parts: &Parts,
    state: &AppState,
) -> Result<RequestContext, AdminError> {
    let query = parse_query(parts.uri.query().unwrap_or_default());

    if let Some(header) = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some((token_type, token)) = header.split_once(' ') {
            if let Some(ctx) = state.auth.resolve_token(token_type.trim(), token.trim()).await? {
                return Ok(ctx);
            }
        }
        return Err(AdminError::Unauthorized);
    }

    if let Some(token) = query.get("token") {
        if let Some(ctx) = state.auth.resolve_token("Bearer", token).await? {
            return Ok(ctx);
        }
        return Err(AdminError::Unauthorized);
    }

    if let Some(tenant_id) = query.get("tenant_id") {
        if let Some(ctx) = state.auth.resolve_tenant(tenant_id).await? {
            return Ok(ctx);
        }
    }

    Err(AdminError::Unauthorized)
}
