//! HTTP Routes
//!
//! API Endpoints（`{root}` 为服务的版本前缀，例如 `/v1`）:
//! - {root}/                                  GET   服务描述
//! - {root}/ping                              GET   健康检查
//! - {root}/{kind}/                           POST  提交任务
//! - {root}/{kind}/{task_id}/status/          GET   查询任务状态
//! - {root}/{kind}/{task_id}/result/          GET   读取任务结果
//!
//! `{kind}` 为 `request`，配置了拟合函数时还有 `fit-parameters`。
//! 任务端点经过访问控制，描述与健康检查端点不经过。

use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

use super::handlers;
use super::middleware::gate_middleware;
use super::state::AppState;
use crate::domain::TaskKind;

/// 创建所有路由
pub fn create_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let root = state.info.root_path.trim_end_matches('/').to_string();

    let mut router = info_routes(&root);
    for kind in state.kinds().to_vec() {
        router = router.merge(task_routes(&root, kind, state.clone()));
    }
    router.fallback(handlers::not_found)
}

/// 服务描述路由
fn info_routes(root: &str) -> Router<Arc<AppState>> {
    let mut router = Router::new()
        .route(&format!("{}/", root), get(handlers::service_info))
        .route(&format!("{}/ping", root), get(handlers::ping));
    if !root.is_empty() {
        router = router.route(root, get(handlers::service_info));
    }
    router
}

/// 单个 kind 的任务路由
fn task_routes(root: &str, kind: TaskKind, state: Arc<AppState>) -> Router<Arc<AppState>> {
    let base = format!("{}/{}", root, kind.as_str());
    Router::new()
        .route(&format!("{}/", base), post(handlers::submit_task))
        .route(&format!("{}/:task_id/status/", base), get(handlers::task_status))
        .route(&format!("{}/:task_id/result/", base), get(handlers::task_result))
        .route_layer(middleware::from_fn_with_state(state, gate_middleware))
        .layer(Extension(kind))
}
