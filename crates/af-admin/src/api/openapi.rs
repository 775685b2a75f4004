//! OpenAPI document for the admin surface.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::admin::list_records,
        crate::api::admin::get_record,
        crate::api::admin::create_record,
        crate::api::admin::update_record,
        crate::api::admin::delete_record,
    ),
    components(schemas(
        crate::error::ErrorEnvelope,
        crate::api::common::Pagination,
        crate::api::common::ListResponse,
        crate::api::common::RecordResponse,
    )),
    tags(
        (name = "admin", description = "Generic administrative CRUD over registered resource types")
    ),
    info(
        title = "APIForge Admin API",
        description = "Uniform REST surface over heterogeneous backend record types"
    )
)]
pub struct AdminApiDoc;
