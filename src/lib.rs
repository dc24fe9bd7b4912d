//! Tasklane - 异步计算服务脚手架
//!
//! 把一个普通的计算函数包装成 HTTP 服务：提交任务、查询状态、读取结果。
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - 任务标识、类别、原生状态与客户端状态
//! - 状态映射（Task State Mapper）
//! - 输入 envelope
//!
//! 应用层 (application/):
//! - Ports: TaskQueue, Schema, Payload, RequestGate
//! - Registry: 每个 kind 的输入/输出 schema 与计算函数
//! - Commands: 提交 / 状态 / 结果
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: Service Endpoint Controller
//! - Memory: 内存任务队列
//! - Worker: TaskWorker 与 ResultReaper
//! - Adapters: RequestGate 实现
//!
//! 客户端 (client/): 队首轮询的服务客户端

pub mod application;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod demo;
pub mod domain;
pub mod infrastructure;

pub use bootstrap::{assemble, ComputeService};
pub use config::{load_config, AppConfig};
