//! Service Info Handlers

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::infrastructure::http::dto::{ErrorDetail, ServiceInfoDto};
use crate::infrastructure::http::state::AppState;

/// GET {root}/ - 服务描述，客户端用它检查连通性
pub async fn service_info(State(state): State<Arc<AppState>>) -> Json<ServiceInfoDto> {
    Json(ServiceInfoDto {
        title: state.info.title.clone(),
        description: state.info.description.clone(),
        version: state.info.version.clone(),
        kinds: state.kinds().to_vec(),
    })
}

/// 未匹配的路径
pub async fn not_found() -> (StatusCode, Json<ErrorDetail>) {
    (StatusCode::NOT_FOUND, Json(ErrorDetail::new("Not Found")))
}
