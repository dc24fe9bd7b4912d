//! Task Worker - Background Payload Executor

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use crate::application::ports::{PayloadError, TaskLedgerPort};
use crate::application::registry::PayloadTable;
use crate::domain::TaskId;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct TaskWorkerConfig {
    /// 最大并发执行数
    pub max_concurrent: usize,
    /// 失败后的最大重试次数（0 表示不重试）
    pub max_task_retries: u32,
}

impl Default for TaskWorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            max_task_retries: 0,
        }
    }
}

/// 单次执行的结果
enum Attempt {
    Succeeded(Vec<u8>),
    /// 可以重试的失败（计算函数报错或 panic）
    Transient(String),
    /// 重试也不会成功的失败
    Permanent(String),
}

/// 任务 Worker
///
/// 从队列消费任务 ID，在阻塞线程池上执行计算函数
pub struct TaskWorker {
    config: TaskWorkerConfig,
    queue_receiver: mpsc::Receiver<TaskId>,
    ledger: Arc<dyn TaskLedgerPort>,
    payloads: PayloadTable,
}

impl TaskWorker {
    pub fn new(
        config: TaskWorkerConfig,
        queue_receiver: mpsc::Receiver<TaskId>,
        ledger: Arc<dyn TaskLedgerPort>,
        payloads: PayloadTable,
    ) -> Self {
        Self {
            config,
            queue_receiver,
            ledger,
            payloads,
        }
    }

    /// 启动 Worker，直到所有发送端关闭
    pub async fn run(mut self) {
        tracing::info!(
            max_concurrent = self.config.max_concurrent,
            max_task_retries = self.config.max_task_retries,
            "TaskWorker started"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));

        while let Some(task_id) = self.queue_receiver.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to acquire semaphore permit");
                    continue;
                }
            };

            let ledger = self.ledger.clone();
            let payloads = self.payloads.clone();
            let max_task_retries = self.config.max_task_retries;

            tokio::spawn(async move {
                let _permit = permit;
                Self::process_task(task_id, ledger, payloads, max_task_retries).await;
            });
        }

        tracing::info!("TaskWorker stopped");
    }

    /// 处理单个任务
    async fn process_task(
        task_id: TaskId,
        ledger: Arc<dyn TaskLedgerPort>,
        payloads: PayloadTable,
        max_task_retries: u32,
    ) {
        let Some(task) = ledger.claim(&task_id) else {
            return;
        };

        tracing::debug!(
            task_id = %task_id,
            lane = %task.lane,
            attempt = task.attempt,
            "Executing task"
        );

        let attempt = match payloads.get(task.lane) {
            Some(payload) => {
                let input = task.payload;
                match tokio::task::spawn_blocking(move || payload.execute(&input)).await {
                    Ok(Ok(output)) => Attempt::Succeeded(output),
                    Ok(Err(PayloadError::Execution(reason))) => Attempt::Transient(reason),
                    Ok(Err(e)) => Attempt::Permanent(e.to_string()),
                    Err(e) if e.is_panic() => Attempt::Transient(format!("payload panicked: {}", e)),
                    Err(e) => Attempt::Permanent(format!("payload cancelled: {}", e)),
                }
            }
            None => Attempt::Permanent(format!("no payload registered for lane {}", task.lane)),
        };

        let recorded = match attempt {
            Attempt::Succeeded(output) => {
                tracing::info!(
                    task_id = %task_id,
                    lane = %task.lane,
                    bytes = output.len(),
                    "Task completed"
                );
                ledger.succeed(&task_id, output)
            }
            Attempt::Transient(reason) if task.attempt <= max_task_retries => {
                tracing::warn!(
                    task_id = %task_id,
                    attempt = task.attempt,
                    error = %reason,
                    "Task attempt failed, retrying"
                );
                ledger.retry(&task_id, reason)
            }
            Attempt::Transient(reason) | Attempt::Permanent(reason) => {
                tracing::error!(
                    task_id = %task_id,
                    lane = %task.lane,
                    attempt = task.attempt,
                    error = %reason,
                    "Task failed"
                );
                ledger.fail(&task_id, reason)
            }
        };

        if let Err(e) = recorded {
            tracing::error!(task_id = %task_id, error = %e, "Failed to record task outcome");
        }
    }
}
