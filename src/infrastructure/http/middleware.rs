//! HTTP Middleware
//!
//! - `gate_middleware`: 调用 RequestGatePort，失败时直接返回 401
//! - `access_log_middleware`: 每个请求一条访问日志（含用户 ID）

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 请求范围内的用户标识，由 gate 写入响应扩展，供访问日志读取
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUser(pub String);

const ANONYMOUS: &str = "Anonymous";

/// 访问控制中间件
pub async fn gate_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = match state.gate.authorize(request.headers()) {
        Ok(principal) => principal,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let user = principal
        .as_ref()
        .map(|p| p.user_id.clone())
        .unwrap_or_else(|| ANONYMOUS.to_string());
    if let Some(principal) = principal {
        request.extensions_mut().insert(principal);
    }

    let mut response = next.run(request).await;
    response.extensions_mut().insert(RequestUser(user));
    response
}

/// 访问日志中间件
///
/// 4xx 记为 warn，5xx 记为 error，其余为 info
pub async fn access_log_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;
    let status = response.status();
    let user = response
        .extensions()
        .get::<RequestUser>()
        .map(|u| u.0.clone())
        .unwrap_or_else(|| ANONYMOUS.to_string());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            user = %user,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            user = %user,
            "HTTP client error"
        );
    } else {
        tracing::info!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            user = %user,
            "HTTP request"
        );
    }

    response
}
