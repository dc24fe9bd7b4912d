//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod payload;
mod request_gate;
mod schema;
mod task_queue;

pub use payload::{PayloadError, PayloadPort};
pub use request_gate::{GateError, Principal, RequestGatePort};
pub use schema::{LocItem, SchemaPort, ValidationErrors, ValidationIssue};
pub use task_queue::{ClaimedTask, QueueError, TaskLedgerPort, TaskQueuePort};
