//! Common API types and rendering

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::Result;

/// Pagination block carried by every list response.
#[derive(Debug, Serialize, ToSchema)]
pub struct Pagination {
    pub offset: u64,
    pub limit: i64,
    pub total: u64,
}

/// List response: the resource-type token, formatted records, pagination.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListResponse {
    #[serde(rename = "type")]
    pub kind: String,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Value>,
    pub pagination: Pagination,
}

/// Single-record response.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordResponse {
    #[serde(rename = "type")]
    pub kind: String,
    #[schema(value_type = Object)]
    pub data: Value,
}

/// Render a payload as JSON, or as YAML text when the request asked for
/// `format=yaml`. The payload is identical either way.
pub fn render<T: Serialize>(format: Option<&str>, payload: &T) -> Result<Response> {
    match format {
        Some("yaml") => {
            let body = serde_yaml::to_string(payload)?;
            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/yaml")],
                body,
            )
                .into_response())
        }
        _ => Ok(Json(payload).into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_response_shape() {
        let response = ListResponse {
            kind: "bridging_services".to_string(),
            data: vec![json!({"id": "1"})],
            pagination: Pagination {
                offset: 0,
                limit: 5,
                total: 12,
            },
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["type"], json!("bridging_services"));
        assert_eq!(value["pagination"], json!({"offset": 0, "limit": 5, "total": 12}));
    }

    #[test]
    fn test_render_yaml_content_type() {
        let response = render(Some("yaml"), &json!({"a": 1})).unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/yaml"
        );
    }

    #[test]
    fn test_render_default_is_json() {
        let response = render(None, &json!({"a": 1})).unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
