//! Task Commands - 任务生命周期相关命令

use crate::domain::{ClientStatus, TaskId};

/// 提交任务命令（原始请求体）
#[derive(Debug, Clone)]
pub struct SubmitTaskCommand {
    pub body: Vec<u8>,
}

/// 提交任务响应
#[derive(Debug, Clone)]
pub struct SubmitTaskResponse {
    pub task_id: TaskId,
}

/// 查询任务状态
#[derive(Debug, Clone)]
pub struct TaskStatusQuery {
    pub task_id: TaskId,
}

/// 任务状态响应
///
/// 队列不提供进度估计，percent_complete / eta_seconds 目前恒为 None
#[derive(Debug, Clone)]
pub struct TaskStatusResponse {
    pub status: ClientStatus,
    pub percent_complete: Option<f64>,
    pub eta_seconds: Option<f64>,
}

/// 读取任务结果
#[derive(Debug, Clone)]
pub struct TaskResultQuery {
    pub task_id: TaskId,
}

/// 任务结果响应（已通过输出 schema 校验的原始 JSON）
#[derive(Debug, Clone)]
pub struct TaskResultResponse {
    pub body: Vec<u8>,
}
