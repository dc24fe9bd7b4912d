//! Bootstrap - 按配置组装完整服务
//!
//! 队列 -> Worker -> Reaper -> Gate -> HTTP Server。
//! 必须在 tokio 运行时内调用：worker 与 reaper 会被立即 spawn。

use std::sync::Arc;
use std::time::Duration;

use crate::application::{ServiceRegistry, TaskQueuePort};
use crate::config::{AppConfig, ConfigError};
use crate::infrastructure::adapters::build_gate;
use crate::infrastructure::http::{AppState, HttpServer, ServerConfig, ServiceInfo};
use crate::infrastructure::memory::InMemoryTaskQueue;
use crate::infrastructure::worker::{ResultReaper, ResultReaperConfig, TaskWorker, TaskWorkerConfig};

/// 组装好的服务
pub struct ComputeService {
    pub server: HttpServer,
    pub queue: Arc<InMemoryTaskQueue>,
    pub root_path: String,
}

/// 根据配置与服务定义组装服务，并启动后台 worker / reaper
pub fn assemble(config: &AppConfig, registry: ServiceRegistry) -> Result<ComputeService, ConfigError> {
    let root_path = config
        .service
        .resolved_root_path()
        .map_err(ConfigError::ValidationError)?;

    // 任务队列
    let (queue, task_rx) = InMemoryTaskQueue::channel(config.worker.queue_capacity);
    let queue = queue.arc();

    // Worker
    let worker = TaskWorker::new(
        TaskWorkerConfig {
            max_concurrent: config.worker.concurrency,
            max_task_retries: config.worker.max_task_retries,
        },
        task_rx,
        queue.clone(),
        registry.payloads.clone(),
    );
    tokio::spawn(worker.run());

    // 结果过期清理
    if config.gc.enabled {
        let reaper = ResultReaper::new(
            ResultReaperConfig {
                interval: Duration::from_secs(config.gc.interval_secs),
                result_ttl: Duration::from_secs(config.gc.result_ttl_secs),
            },
            queue.clone(),
        );
        tokio::spawn(reaper.run());
    }

    let info = ServiceInfo {
        title: config.service.title.clone(),
        description: config.service.description.clone(),
        version: config.service.version.clone(),
        root_path: root_path.clone(),
    };
    let task_queue: Arc<dyn TaskQueuePort> = queue.clone();
    let state = AppState::new(info, task_queue, &registry.models, build_gate(&config.auth));

    tracing::info!(
        root_path = %root_path,
        kinds = ?registry.models.kinds(),
        "Compute service assembled"
    );

    Ok(ComputeService {
        server: HttpServer::new(ServerConfig::from(&config.server), state),
        queue,
        root_path,
    })
}
