//! Task Queue Port - 任务队列边界
//!
//! 定义两组接口，具体实现在 infrastructure/memory 层：
//! - `TaskQueuePort`: HTTP 控制器使用（入队、查询状态、读取结果）
//! - `TaskLedgerPort`: worker 使用（领取任务、记录执行结果）

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{NativeState, TaskId, TaskKind};

/// Task Queue 错误
#[derive(Debug, Error)]
pub enum QueueError {
    /// 队列不可达（传输层错误）
    #[error("Task queue unavailable: {0}")]
    Unavailable(String),

    #[error("Task not found: {0}")]
    NotFound(TaskId),

    /// 任务尚无结果可读
    #[error("No result stored for task: {0}")]
    ResultUnavailable(TaskId),

    #[error("Invalid state transition for task {task_id}: {from} -> {to}")]
    InvalidStateTransition {
        task_id: TaskId,
        from: &'static str,
        to: &'static str,
    },
}

/// Task Queue Port
///
/// 实现必须是线程安全的：多个 HTTP 请求会并发调用
#[async_trait]
pub trait TaskQueuePort: Send + Sync {
    /// 把已校验过的原始请求体放入指定 lane，返回新分配的任务 ID
    async fn enqueue(&self, lane: TaskKind, payload: Vec<u8>) -> Result<TaskId, QueueError>;

    /// 查询原生状态；未知 ID 返回 `NativeState::Pending` 而不是错误
    async fn native_state(&self, task_id: &TaskId) -> Result<NativeState, QueueError>;

    /// 读取原始结果，仅在任务成功后有意义
    async fn fetch_result(&self, task_id: &TaskId) -> Result<Vec<u8>, QueueError>;

    /// 失败详情，仅用于服务端日志，永远不会返回给客户端
    async fn failure_detail(&self, _task_id: &TaskId) -> Option<String> {
        None
    }
}

/// worker 领取到的任务
#[derive(Debug, Clone)]
pub struct ClaimedTask {
    pub task_id: TaskId,
    pub lane: TaskKind,
    pub payload: Vec<u8>,
    /// 包括本次在内的执行次数
    pub attempt: u32,
}

/// Task Ledger Port
///
/// worker 侧的状态迁移：received/retrying -> started -> succeeded | retrying | failed
pub trait TaskLedgerPort: Send + Sync {
    /// 领取任务并标记为 started；任务不存在或不可领取时返回 None
    fn claim(&self, task_id: &TaskId) -> Option<ClaimedTask>;

    /// 记录成功结果
    fn succeed(&self, task_id: &TaskId, output: Vec<u8>) -> Result<(), QueueError>;

    /// 标记为 retrying 并重新入队
    fn retry(&self, task_id: &TaskId, error: String) -> Result<(), QueueError>;

    /// 标记为最终失败，错误详情只保留在服务端
    fn fail(&self, task_id: &TaskId, error: String) -> Result<(), QueueError>;
}
