//! Request Gate Adapters
//!
//! - `OpenGate`: 不做任何检查，所有请求匿名放行
//! - `StaticTokenGate`: 校验 `Authorization: Bearer <token>`，token 与用户/角色来自配置

use http::header::AUTHORIZATION;
use http::HeaderMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::ports::{GateError, Principal, RequestGatePort};
use crate::config::AuthConfig;

/// 根据配置选择 gate
pub fn build_gate(config: &AuthConfig) -> Arc<dyn RequestGatePort> {
    if config.enabled {
        Arc::new(StaticTokenGate::from_config(config))
    } else {
        Arc::new(OpenGate)
    }
}

/// 匿名放行
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

impl RequestGatePort for OpenGate {
    fn authorize(&self, _headers: &HeaderMap) -> Result<Option<Principal>, GateError> {
        Ok(None)
    }
}

/// 静态 Bearer token 校验
#[derive(Debug, Clone)]
pub struct StaticTokenGate {
    /// token -> principal
    tokens: HashMap<String, Principal>,
    /// 至少需要其中一个角色；为空表示不检查
    required_roles: Vec<String>,
}

impl StaticTokenGate {
    pub fn new(tokens: HashMap<String, Principal>, required_roles: Vec<String>) -> Self {
        Self {
            tokens,
            required_roles,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let tokens = config
            .tokens
            .iter()
            .map(|t| {
                (
                    t.token.clone(),
                    Principal {
                        user_id: t.user_id.clone(),
                        roles: t.roles.clone(),
                    },
                )
            })
            .collect();
        Self::new(tokens, config.required_roles.clone())
    }
}

impl RequestGatePort for StaticTokenGate {
    fn authorize(&self, headers: &HeaderMap) -> Result<Option<Principal>, GateError> {
        let header = headers
            .get(AUTHORIZATION)
            .ok_or(GateError::MissingAuthorization)?;
        let value = header.to_str().map_err(|_| GateError::MissingBearerToken)?;

        let token = match value.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
                token.trim()
            }
            _ => return Err(GateError::MissingBearerToken),
        };

        let principal = self
            .tokens
            .get(token)
            .ok_or_else(|| GateError::Rejected("Unknown token.".to_string()))?;

        if !self.required_roles.is_empty()
            && !principal
                .roles
                .iter()
                .any(|role| self.required_roles.contains(role))
        {
            return Err(GateError::Rejected(format!(
                "Token of {} lacks any of the required roles {:?}.",
                principal.user_id, self.required_roles
            )));
        }

        Ok(Some(principal.clone()))
    }
}
