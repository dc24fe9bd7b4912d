//! 应用层错误定义
//!
//! 任务生命周期的错误分类，HTTP 层在一个边界函数里统一映射为状态码

use thiserror::Error;

use crate::application::ports::{QueueError, ValidationErrors};
use crate::domain::TaskId;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 输入不符合 schema，任务不会被创建
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    /// 未知或已过期的任务 ID
    #[error("Could not find task with ID: {0}")]
    NotFound(String),

    /// 任务存在但尚未结束
    #[error("Task is not ready yet. ID was: {0}")]
    NotReady(TaskId),

    /// 计算函数失败或队列标记为失败
    #[error("Task {task_id} failed: {reason}")]
    WorkerFailure { task_id: TaskId, reason: String },

    /// worker 产出了不符合输出 schema 的数据
    #[error("Task {task_id} produced output violating {schema}: {errors}")]
    OutputSchemaViolation {
        task_id: TaskId,
        schema: String,
        errors: ValidationErrors,
    },

    /// 队列不可达
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ServiceError {
    pub fn not_found(task_id: impl std::fmt::Display) -> Self {
        Self::NotFound(task_id.to_string())
    }

    pub fn worker_failure(task_id: TaskId, reason: impl Into<String>) -> Self {
        Self::WorkerFailure {
            task_id,
            reason: reason.into(),
        }
    }

    /// 是否属于只能返回通用 500 的错误
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::WorkerFailure { .. } | Self::OutputSchemaViolation { .. } | Self::Transport(_)
        )
    }
}

impl From<QueueError> for ServiceError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::NotFound(task_id) => Self::not_found(task_id),
            QueueError::ResultUnavailable(task_id) => {
                Self::worker_failure(task_id, "task returned no data")
            }
            other => Self::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_error_conversion() {
        let id = TaskId::new();
        assert!(matches!(
            ServiceError::from(QueueError::NotFound(id)),
            ServiceError::NotFound(_)
        ));
        assert!(ServiceError::from(QueueError::ResultUnavailable(id)).is_internal());
        assert!(matches!(
            ServiceError::from(QueueError::Unavailable("closed".into())),
            ServiceError::Transport(_)
        ));
    }

    #[test]
    fn test_client_errors_are_not_internal() {
        assert!(!ServiceError::NotReady(TaskId::new()).is_internal());
        assert!(!ServiceError::not_found("abc").is_internal());
    }
}
