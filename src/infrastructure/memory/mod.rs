//! Memory Layer - In-Memory State Management
//!
//! 实现 TaskQueue，管理任务记录与待执行队列的内存状态

mod task_queue;

pub use task_queue::InMemoryTaskQueue;
