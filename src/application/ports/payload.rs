//! Payload Port - 用户计算函数
//!
//! worker 对每个任务调用一次；输入输出都是 JSON 字节

use thiserror::Error;

/// Payload 执行错误
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Invalid output: {0}")]
    InvalidOutput(String),
}

/// Payload Port
///
/// 同步执行，worker 会把它放到阻塞线程池中运行
pub trait PayloadPort: Send + Sync {
    fn execute(&self, input: &[u8]) -> Result<Vec<u8>, PayloadError>;
}
