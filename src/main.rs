//! Tasklane - 线性模型示例服务
//!
//! - request: `f = x * w`
//! - fit-parameters: 最小二乘拟合 `w`

use tasklane::config::{load_config, print_config, LogConfig};
use tasklane::{assemble, demo};

fn init_logging(config: &LogConfig) {
    let log_filter = format!(
        "{},tasklane={},tower_http=debug",
        config.level, config.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_logging(&config.log);

    tracing::info!("Tasklane - linear model demo service");
    print_config(&config);

    let service = assemble(&config, demo::registry())?;

    tracing::info!(root_path = %service.root_path, "Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    service
        .server
        .run_with_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl-c");
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
