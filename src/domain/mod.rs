//! Domain Layer - 领域层
//!
//! Task Context:
//! - 任务标识、类别与状态词汇
//! - 状态映射（原生状态 -> 客户端状态 / 结果访问决策）
//! - 输入 envelope

mod envelope;
mod status;
mod task;

pub use envelope::{FitParametersInput, ParameterizedRequestInput, RequestInput};
pub use status::{map_result_access, map_status, ResultAccess, TaskNotFound};
pub use task::{ClientStatus, NativeState, TaskId, TaskKind};
