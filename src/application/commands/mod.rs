//! 应用层 - 命令
//!
//! 任务生命周期的三个用例：提交、查询状态、读取结果

mod task_commands;

pub mod handlers;

pub use task_commands::*;
