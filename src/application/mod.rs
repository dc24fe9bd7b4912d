//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TaskQueue、Schema、Payload、RequestGate）
//! - registry: 服务的 schema 与计算函数注册表
//! - commands: 任务生命周期命令及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod registry;

// Re-exports
pub use commands::{
    handlers::{SubmitTaskHandler, TaskResultHandler, TaskStatusHandler},
    SubmitTaskCommand, SubmitTaskResponse, TaskResultQuery, TaskResultResponse, TaskStatusQuery,
    TaskStatusResponse,
};

pub use error::ServiceError;

pub use ports::{
    ClaimedTask, GateError, LocItem, PayloadError, PayloadPort, Principal, QueueError,
    RequestGatePort, SchemaPort, TaskLedgerPort, TaskQueuePort, ValidationErrors, ValidationIssue,
};

pub use registry::{KindModels, PayloadTable, SerdeSchema, ServiceModels, ServiceRegistry, TypedPayload};
