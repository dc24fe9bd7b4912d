//! Client - 计算服务的 HTTP 客户端

mod service_client;

pub use service_client::{
    compute_full_url, ClientError, PollConfig, ServiceClient, ServiceClientConfig,
};
