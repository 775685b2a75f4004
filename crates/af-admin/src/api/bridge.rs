//! Bridge proxy entry point
//!
//! Routes a live inbound request to a registered bridging service by
//! matching the request path against each active service's declared listen
//! path, lowest priority first. Matching and parameter extraction are
//! implemented; the actual invocation of the target is intentionally not.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{Method, Uri},
    response::Response,
    routing::any,
    Router,
};
use bson::{doc, Document};
use tracing::debug;

use af_router::{PathTemplate, ServiceRequest};

use crate::api::middleware::{report, AppState};
use crate::criteria::ListParams;
use crate::error::{AdminError, Result};

pub fn bridge_router() -> Router<AppState> {
    Router::new()
        .route("/:app", any(invoke_root))
        .route("/:app/*path", any(invoke))
}

async fn invoke_root(
    State(state): State<AppState>,
    Path(app): Path<String>,
    method: Method,
    uri: Uri,
    bytes: Bytes,
) -> Response {
    match invoke_inner(&state, &app, "", &method, &uri, &bytes).await {
        Ok(response) => response,
        Err(err) => report(&state, err),
    }
}

async fn invoke(
    State(state): State<AppState>,
    Path((app, path)): Path<(String, String)>,
    method: Method,
    uri: Uri,
    bytes: Bytes,
) -> Response {
    match invoke_inner(&state, &app, &path, &method, &uri, &bytes).await {
        Ok(response) => response,
        Err(err) => report(&state, err),
    }
}

/// Fetch the application's active services ordered by ascending priority,
/// match the request against each declared listen path, and stop at the
/// first service whose path and method both match.
async fn invoke_inner(
    state: &AppState,
    app: &str,
    path: &str,
    method: &Method,
    uri: &Uri,
    bytes: &Bytes,
) -> Result<Response> {
    let apps = state.registry.resolve("bs_apps")?;
    let services = state.registry.resolve("bridging_services")?;
    let ctx = crate::auth::RequestContext::anonymous();

    let application = find_application(state, &ctx, &apps, app).await?;
    let app_id = application.get_str("_id").unwrap_or_default().to_string();

    let mut params = ListParams::default();
    params.sort = doc! { "priority": 1 };
    params.limit = i64::MAX;
    let filter = doc! { "application_id": &app_id, "active": true };
    let candidates = state.store.query(&ctx, &services, filter, &params).await?;

    for service in &candidates {
        let Some(request) = match_service(service, path, uri, bytes) else {
            continue;
        };
        if !method_matches(service, method) {
            continue;
        }
        debug!(
            app = %app_id,
            service = %service.get_str("_id").unwrap_or_default(),
            path_params = ?request.path_params,
            "matched bridging service"
        );
        return Err(AdminError::unimplemented(
            "Service invocation is not implemented",
        ));
    }

    Err(AdminError::NotFound)
}

async fn find_application(
    state: &AppState,
    ctx: &crate::auth::RequestContext,
    apps: &crate::registry::ResourceDescriptor,
    app: &str,
) -> Result<Document> {
    let mut params = ListParams::default();
    params.limit = 1;
    let found = state
        .store
        .query(ctx, apps, doc! { "listening_path": app }, &params)
        .await?;
    if let Some(application) = found.into_iter().next() {
        return Ok(application);
    }
    state
        .store
        .find(ctx, apps, app)
        .await?
        .ok_or(AdminError::NotFound)
}

fn match_service(
    service: &Document,
    path: &str,
    uri: &Uri,
    bytes: &Bytes,
) -> Option<ServiceRequest> {
    let listen_path = service
        .get_document("listen")
        .ok()
        .and_then(|l| l.get_str("path").ok())?;
    let template = PathTemplate::compile(listen_path).ok()?;
    ServiceRequest::extract(&template, path, uri.query().unwrap_or_default(), bytes)
}

fn method_matches(service: &Document, method: &Method) -> bool {
    service
        .get_document("listen")
        .ok()
        .and_then(|l| l.get_str("method").ok())
        .map(|m| m.eq_ignore_ascii_case(method.as_str()))
        .unwrap_or(false)
}
