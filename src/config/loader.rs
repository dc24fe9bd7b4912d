//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（tasklane.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["tasklane", "tasklane.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `TASKLANE_`，层级分隔符 `__`）
/// 2. 配置文件（tasklane.toml 或 tasklane.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `TASKLANE_SERVER__PORT=8080`
/// - `TASKLANE_SERVICE__VERSION=1.2.3`
/// - `TASKLANE_SERVICE__ROOT_PATH=/test/v1`
/// - `TASKLANE_WORKER__CONCURRENCY=4`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8800)?
        .set_default("server.max_body_bytes", 16 * 1024 * 1024)?
        .set_default("service.title", "tasklane")?
        .set_default("service.version", env!("CARGO_PKG_VERSION"))?
        .set_default("worker.concurrency", 2)?
        .set_default("worker.max_task_retries", 0)?
        .set_default("worker.queue_capacity", 1024)?
        .set_default("gc.enabled", true)?
        .set_default("gc.interval_secs", 60)?
        .set_default("gc.result_ttl_secs", 86400)?
        .set_default("auth.enabled", false)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: TASKLANE_SERVICE__VERSION=1.2.3
    builder = builder.add_source(
        Environment::with_prefix("TASKLANE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.service.version.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Service needs a version, set service.version or TASKLANE_SERVICE__VERSION".to_string(),
        ));
    }

    config
        .service
        .resolved_root_path()
        .map_err(ConfigError::ValidationError)?;

    if config.worker.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "Worker concurrency cannot be 0".to_string(),
        ));
    }

    if config.worker.queue_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "Worker queue capacity cannot be 0".to_string(),
        ));
    }

    if config.gc.enabled && config.gc.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "GC interval cannot be 0 when GC is enabled".to_string(),
        ));
    }

    if config.auth.enabled && config.auth.tokens.is_empty() {
        return Err(ConfigError::ValidationError(
            "Auth is enabled but no tokens are configured".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Max Body Size: {} bytes", config.server.max_body_bytes);
    tracing::info!("Service: {} {}", config.service.title, config.service.version);
    match config.service.resolved_root_path() {
        Ok(root) => tracing::info!("Root Path: {}", root),
        Err(e) => tracing::warn!("Root Path: invalid ({})", e),
    }
    tracing::info!("Worker Concurrency: {}", config.worker.concurrency);
    tracing::info!("Worker Max Retries: {}", config.worker.max_task_retries);
    tracing::info!("Queue Capacity: {}", config.worker.queue_capacity);
    tracing::info!("GC Enabled: {}", config.gc.enabled);
    if config.gc.enabled {
        tracing::info!("GC Interval: {}s", config.gc.interval_secs);
        tracing::info!("Result TTL: {}s", config.gc.result_ttl_secs);
    }
    tracing::info!("Auth Enabled: {}", config.auth.enabled);
    if config.auth.enabled {
        tracing::info!("Auth Tokens: {}", config.auth.tokens.len());
        tracing::info!("Required Roles: {:?}", config.auth.required_roles);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
