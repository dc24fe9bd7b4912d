//! Worker Layer - Background Task Processing
//!
//! 实现 TaskWorker（执行计算函数）与 ResultReaper（清理过期结果）

mod reaper;
mod task_worker;

pub use reaper::{ResultReaper, ResultReaperConfig};
pub use task_worker::{TaskWorker, TaskWorkerConfig};
