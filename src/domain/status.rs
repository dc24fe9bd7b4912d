//! Task State Mapper
//!
//! 纯函数：把队列原生状态映射为客户端状态，以及结果端点的访问决策。
//! 不依赖任何 HTTP 框架，状态码的选择在 HTTP 边界统一完成。

use thiserror::Error;

use super::task::{ClientStatus, NativeState};

/// 队列不认识该任务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("task is unknown to the queue")]
pub struct TaskNotFound;

/// 结果端点的访问决策
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultAccess {
    /// 未知 ID
    NotFound,
    /// 任务仍在排队或执行，应继续轮询状态端点
    NotReady,
    /// 执行失败，只向调用方暴露通用错误
    Failed,
    /// 可以读取结果（读取后仍需通过输出 schema 校验）
    Available,
}

/// 状态端点：原生状态 -> 客户端状态
///
/// 成功与失败都映射为 `ready`，失败只在读取结果时暴露
pub fn map_status(state: NativeState) -> Result<ClientStatus, TaskNotFound> {
    match state {
        NativeState::Pending => Err(TaskNotFound),
        NativeState::Received | NativeState::Retrying => Ok(ClientStatus::Queued),
        NativeState::Started => Ok(ClientStatus::Running),
        NativeState::Succeeded | NativeState::Failed => Ok(ClientStatus::Ready),
    }
}

/// 结果端点：原生状态 -> 访问决策
pub fn map_result_access(state: NativeState) -> ResultAccess {
    match state {
        NativeState::Pending => ResultAccess::NotFound,
        NativeState::Received | NativeState::Started | NativeState::Retrying => {
            ResultAccess::NotReady
        }
        NativeState::Failed => ResultAccess::Failed,
        NativeState::Succeeded => ResultAccess::Available,
    }
}
