// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Gateway error type and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::auth::TrustError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("Device not found or inactive")]
    DeviceNotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::DeviceNotFound => StatusCode::NOT_FOUND,
            GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Unauthorized(_) => "unauthorized",
            GatewayError::DeviceNotFound => "device_not_found",
            GatewayError::Forbidden(_) => "forbidden",
            GatewayError::BadRequest(_) => "bad_request",
            GatewayError::UpstreamUnavailable(_) => "upstream_unavailable",
            GatewayError::Internal(_) => "internal_error",
        }
    }
}

impl From<TrustError> for GatewayError {
    fn from(e: TrustError) -> Self {
        match e {
            TrustError::DeviceNotFound => GatewayError::DeviceNotFound,
            TrustError::StoreUnavailable(msg) => GatewayError::UpstreamUnavailable(msg),
            TrustError::Signing(msg) => GatewayError::Internal(msg),
            other => GatewayError::Unauthorized(other.to_string()),
        }
    }
}

/// JSON error body returned to agents.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let message = match &self {
            GatewayError::Internal(detail) => {
                error!(error = %detail, "internal gateway error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: self.error_code().to_string(),
            message,
        };

        (self.status_code(), Json(body)).into_response()
    }
}
