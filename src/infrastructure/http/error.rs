//! HTTP Error Handling
//!
//! `ServiceError` 到状态码的唯一映射点。500 响应只带通用文案，
//! 真实原因只写入服务端日志。

use axum::{
    extract::rejection::BytesRejection,
    http::{header::WWW_AUTHENTICATE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::application::{GateError, ServiceError, ValidationErrors};
use crate::infrastructure::http::dto::{ErrorDetail, ValidationErrorBody};

/// 500 响应的固定文案
pub const INTERNAL_ERROR_DETAIL: &str =
    "The service encountered an error while processing the request.";

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    /// 422
    Validation(ValidationErrors),
    /// 404
    NotFound(String),
    /// 409
    NotReady(String),
    /// 401
    Unauthorized(String),
    /// 请求体读取失败（超出大小上限为 413）
    BadRequest(StatusCode, String),
    /// 500，内容只进日志
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                tracing::warn!(
                    schema = %errors.schema,
                    issues = errors.issues.len(),
                    "Request validation failed"
                );
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(ValidationErrorBody {
                        detail: errors.issues,
                    }),
                )
                    .into_response()
            }
            ApiError::NotFound(msg) => {
                tracing::debug!(error = %msg, "Task not found");
                (StatusCode::NOT_FOUND, Json(ErrorDetail::new(msg))).into_response()
            }
            ApiError::NotReady(msg) => {
                tracing::debug!(error = %msg, "Task not ready");
                (StatusCode::CONFLICT, Json(ErrorDetail::new(msg))).into_response()
            }
            ApiError::Unauthorized(msg) => {
                tracing::warn!(error = %msg, "Request rejected by gate");
                (
                    StatusCode::UNAUTHORIZED,
                    [(WWW_AUTHENTICATE, "Bearer")],
                    Json(ErrorDetail::new(msg)),
                )
                    .into_response()
            }
            ApiError::BadRequest(status, msg) => {
                tracing::warn!(status = status.as_u16(), error = %msg, "Bad request");
                (status, Json(ErrorDetail::new(msg))).into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorDetail::new(INTERNAL_ERROR_DETAIL)),
                )
                    .into_response()
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(errors) => ApiError::Validation(errors),
            ServiceError::NotFound(_) => ApiError::NotFound(e.to_string()),
            ServiceError::NotReady(_) => ApiError::NotReady(e.to_string()),
            ServiceError::WorkerFailure { .. }
            | ServiceError::OutputSchemaViolation { .. }
            | ServiceError::Transport(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        ApiError::BadRequest(rejection.status(), rejection.body_text())
    }
}

impl From<GateError> for ApiError {
    fn from(e: GateError) -> Self {
        ApiError::Unauthorized(e.to_string())
    }
}
