//! Result Reaper - 定期清理过期的终态任务

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use crate::infrastructure::memory::InMemoryTaskQueue;

/// Reaper 配置
#[derive(Debug, Clone)]
pub struct ResultReaperConfig {
    /// 扫描间隔
    pub interval: Duration,
    /// 终态任务的保留时长
    pub result_ttl: Duration,
}

/// 结果清理器
///
/// 被清理的任务 ID 之后读作 unknown（404）
pub struct ResultReaper {
    config: ResultReaperConfig,
    queue: Arc<InMemoryTaskQueue>,
}

impl ResultReaper {
    pub fn new(config: ResultReaperConfig, queue: Arc<InMemoryTaskQueue>) -> Self {
        Self { config, queue }
    }

    /// 执行一次清理，返回删除数量
    pub fn sweep(&self) -> usize {
        match chrono::Duration::from_std(self.config.result_ttl) {
            Ok(ttl) => self.queue.purge_expired(ttl),
            Err(_) => 0,
        }
    }

    /// 周期性清理，永不返回
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            result_ttl_secs = self.config.result_ttl.as_secs(),
            "ResultReaper started"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let purged = self.sweep();
            if purged > 0 {
                tracing::info!(purged = purged, remaining = self.queue.len(), "Reaped expired results");
            }
        }
    }
}
