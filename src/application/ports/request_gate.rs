//! Request Gate Port - 可插拔的访问控制

use http::HeaderMap;
use thiserror::Error;

/// 访问控制错误（HTTP 层统一映射为 401）
#[derive(Debug, Error)]
pub enum GateError {
    #[error("No authorization header in request.")]
    MissingAuthorization,

    #[error("No bearer token in authorization header.")]
    MissingBearerToken,

    #[error("Token validation failed. Error was: {0}")]
    Rejected(String),
}

/// 通过校验的调用方
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub roles: Vec<String>,
}

/// Request Gate Port
pub trait RequestGatePort: Send + Sync {
    /// `Ok(None)` 表示允许匿名访问
    fn authorize(&self, headers: &HeaderMap) -> Result<Option<Principal>, GateError>;
}
