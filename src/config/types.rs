//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 服务描述与 URL 前缀
    #[serde(default)]
    pub service: ServiceConfig,

    /// Worker 配置
    #[serde(default)]
    pub worker: WorkerConfig,

    /// GC（结果过期）配置
    #[serde(default)]
    pub gc: GcConfig,

    /// 访问控制配置
    #[serde(default)]
    pub auth: AuthConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 请求体最大字节数
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8800
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024 // 16 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 服务描述
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// 服务版本，必填
    #[serde(default = "default_version")]
    pub version: String,

    /// 所有端点的挂载前缀，为空时使用 `/{version_root}`
    #[serde(default)]
    pub root_path: Option<String>,

    /// 显式指定前缀最后一段，覆盖从版本推导的结果
    #[serde(default)]
    pub version_root_path: Option<String>,
}

fn default_title() -> String {
    "tasklane".to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: String::new(),
            version: default_version(),
            root_path: None,
            version_root_path: None,
        }
    }
}

impl ServiceConfig {
    /// URL 前缀的最后一段
    ///
    /// - `1.2.3` -> `v1`
    /// - `some_branch(ef9eb864)` -> `some_branch`
    /// - `main` -> `main`
    pub fn version_root(&self) -> String {
        if let Some(explicit) = self.version_root_path.as_deref().filter(|s| !s.is_empty()) {
            return explicit.to_string();
        }

        let version = self.version.as_str();
        let mut parts = version.split('.');
        if let (Some(major), Some(_)) = (parts.next(), parts.next()) {
            if !major.is_empty() && major.chars().all(|c| c.is_ascii_digit()) {
                return format!("v{}", major);
            }
        }

        // 开发版本：`{branch}({short_commit})`
        if version.ends_with(')') {
            if let Some((branch, _)) = version.split_once('(') {
                if !branch.is_empty() {
                    return branch.to_string();
                }
            }
        }

        version.to_string()
    }

    /// 校验并返回挂载前缀
    pub fn resolved_root_path(&self) -> Result<String, String> {
        let version_root = self.version_root();
        let root_path = match self.root_path.as_deref() {
            Some(path) if !path.is_empty() => path.to_string(),
            _ => format!("/{}", version_root),
        };

        if !root_path.starts_with('/') || root_path.ends_with('/') {
            return Err(format!(
                "root_path must have a leading and no trailing slash, got: {:?}",
                root_path
            ));
        }
        if root_path.rsplit('/').next() != Some(version_root.as_str()) {
            return Err(format!(
                "root_path must end with the version segment {:?}, got: {:?}",
                version_root, root_path
            ));
        }
        Ok(root_path)
    }
}

/// Worker 配置
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// 最大并发执行数
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// 失败后的最大重试次数
    #[serde(default)]
    pub max_task_retries: u32,

    /// 待执行队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_concurrency() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    1024
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_task_retries: 0,
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// GC（垃圾回收）配置
#[derive(Debug, Clone, Deserialize)]
pub struct GcConfig {
    /// 是否启用自动 GC
    #[serde(default = "default_gc_enabled")]
    pub enabled: bool,

    /// GC 间隔时间（秒）
    #[serde(default = "default_gc_interval")]
    pub interval_secs: u64,

    /// 终态任务保留时间（秒）
    #[serde(default = "default_result_ttl")]
    pub result_ttl_secs: u64,
}

fn default_gc_enabled() -> bool {
    true
}

fn default_gc_interval() -> u64 {
    60
}

fn default_result_ttl() -> u64 {
    86400 // 24 小时
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            enabled: default_gc_enabled(),
            interval_secs: default_gc_interval(),
            result_ttl_secs: default_result_ttl(),
        }
    }
}

/// 单个静态 token
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// 访问控制配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// 关闭时所有请求匿名放行
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub tokens: Vec<TokenConfig>,

    /// token 必须至少拥有其中一个角色；为空表示不检查
    #[serde(default)]
    pub required_roles: Vec<String>,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
