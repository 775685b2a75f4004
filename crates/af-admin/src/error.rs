//! Admin Error Types
//!
//! Every failure carries a numeric code and message as separate fields from
//! the point of raise; the HTTP status always equals the envelope code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use af_common::NotificationSeverity;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Invalid model")]
    InvalidModel,

    #[error("{message}")]
    Validation { message: String },

    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{message}")]
    Unimplemented { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bson::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AdminError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self::Unimplemented {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Numeric failure code; doubles as the HTTP status.
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidModel | Self::Validation { .. } | Self::Unimplemented { .. } => 400,
            Self::Unauthorized => 403,
            Self::NotFound => 404,
            _ => 500,
        }
    }

    pub fn severity(&self) -> NotificationSeverity {
        if self.code() >= 500 {
            NotificationSeverity::Error
        } else {
            NotificationSeverity::Warn
        }
    }
}

/// Uniform failure envelope rendered for every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub error: String,
    pub code: u16,
}

impl ErrorEnvelope {
    pub fn from_error(error: &AdminError) -> Self {
        Self {
            kind: "exception".to_string(),
            error: error.to_string(),
            code: error.code(),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope::from_error(&self);
        let status =
            StatusCode::from_u16(envelope.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(envelope)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;
