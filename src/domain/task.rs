//! Task Context - Value Objects
//!
//! 任务标识、任务类别（kind / lane）以及两套状态词汇：
//! 队列原生状态 `NativeState` 与对客户端暴露的 `ClientStatus`

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 任务唯一标识（入队时由队列适配器分配）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// 解析客户端传入的 ID，格式不合法时返回 None
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 任务类别，同时决定端点前缀与队列 lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    Request,
    FitParameters,
}

impl TaskKind {
    pub const ALL: [TaskKind; 2] = [TaskKind::Request, TaskKind::FitParameters];

    /// URL 路径段，同时也是 lane 名称
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Request => "request",
            TaskKind::FitParameters => "fit-parameters",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "request" => Some(TaskKind::Request),
            "fit-parameters" => Some(TaskKind::FitParameters),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 队列原生状态
///
/// 与具体队列实现解耦；任何队列只要能给出这几个状态即可接入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeState {
    /// 队列不认识该 ID（从未提交、已过期或已清理）
    Pending,
    /// 已被队列接收，尚未被 worker 领取
    Received,
    /// worker 正在执行
    Started,
    /// 上一次执行失败，等待重新执行
    Retrying,
    /// 执行成功
    Succeeded,
    /// 执行失败（重试次数耗尽）
    Failed,
}

impl NativeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NativeState::Pending => "pending",
            NativeState::Received => "received",
            NativeState::Started => "started",
            NativeState::Retrying => "retrying",
            NativeState::Succeeded => "succeeded",
            NativeState::Failed => "failed",
        }
    }

    /// 终态之后不再发生任何迁移
    pub fn is_terminal(&self) -> bool {
        matches!(self, NativeState::Succeeded | NativeState::Failed)
    }
}

/// 对客户端暴露的三值状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Queued,
    Running,
    Ready,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Queued => "queued",
            ClientStatus::Running => "running",
            ClientStatus::Ready => "ready",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ClientStatus::Ready)
    }
}
