//! HTTP Layer - Service Endpoint Controller
//!
//! 每个 kind 提供提交 / 状态 / 结果三个端点，挂载在服务的版本前缀下

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_routes;
pub use server::{build_router, HttpServer, ServerConfig};
pub use state::{AppState, KindEndpoints, ServiceInfo};
