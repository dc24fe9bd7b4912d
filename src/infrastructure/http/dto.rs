//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::ValidationIssue;
use crate::domain::{ClientStatus, TaskId, TaskKind};

/// 提交任务响应
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskIdDto {
    pub task_id: TaskId,
}

/// 任务状态响应，进度字段始终序列化（可能为 null）
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskStatusDto {
    pub status: ClientStatus,
    pub percent_complete: Option<f64>,
    pub eta_seconds: Option<f64>,
}

/// 通用错误响应 `{"detail": "..."}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// 422 响应 `{"detail": [issue, ...]}`
#[derive(Debug, Serialize)]
pub struct ValidationErrorBody {
    pub detail: Vec<ValidationIssue>,
}

/// 根路径返回的服务描述
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfoDto {
    pub title: String,
    pub description: String,
    pub version: String,
    pub kinds: Vec<TaskKind>,
}
