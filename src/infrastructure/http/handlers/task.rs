//! Task Handlers
//!
//! 每个 kind 三个端点，kind 由路由层通过 `Extension` 注入

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use std::sync::Arc;

use crate::application::{ServiceError, SubmitTaskCommand, TaskResultQuery, TaskStatusQuery};
use crate::domain::{TaskId, TaskKind};
use crate::infrastructure::http::dto::{TaskIdDto, TaskStatusDto};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::{AppState, KindEndpoints};

fn endpoints(state: &AppState, kind: TaskKind) -> Result<&KindEndpoints, ApiError> {
    state
        .endpoints(kind)
        .ok_or_else(|| ApiError::Internal(format!("no endpoints registered for {}", kind)))
}

/// 格式不合法的 ID 与未知 ID 一样返回 404
fn parse_task_id(raw: &str) -> Result<TaskId, ApiError> {
    TaskId::parse(raw).ok_or_else(|| ServiceError::not_found(raw).into())
}

/// POST {root}/{kind}/
pub async fn submit_task(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TaskKind>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<TaskIdDto>), ApiError> {
    let cmd = SubmitTaskCommand {
        body: body?.to_vec(),
    };
    let result = endpoints(&state, kind)?.submit_handler.handle(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(TaskIdDto {
            task_id: result.task_id,
        }),
    ))
}

/// GET {root}/{kind}/{task_id}/status/
pub async fn task_status(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TaskKind>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskStatusDto>, ApiError> {
    let query = TaskStatusQuery {
        task_id: parse_task_id(&task_id)?,
    };
    let result = endpoints(&state, kind)?.status_handler.handle(query).await?;

    Ok(Json(TaskStatusDto {
        status: result.status,
        percent_complete: result.percent_complete,
        eta_seconds: result.eta_seconds,
    }))
}

/// GET {root}/{kind}/{task_id}/result/
///
/// 结果体已通过输出 schema 校验，原样返回
pub async fn task_result(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TaskKind>,
    Path(task_id): Path<String>,
) -> Result<Response, ApiError> {
    let query = TaskResultQuery {
        task_id: parse_task_id(&task_id)?,
    };
    let result = endpoints(&state, kind)?.result_handler.handle(query).await?;

    Ok(([(CONTENT_TYPE, "application/json")], result.body).into_response())
}
