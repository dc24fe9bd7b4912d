//! In-Memory Task Queue Implementation
//!
//! 进程内的任务队列：DashMap 保存任务记录，mpsc 通道把任务 ID 交给 worker。
//! 同时实现 HTTP 侧的 `TaskQueuePort` 与 worker 侧的 `TaskLedgerPort`。

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::ports::{ClaimedTask, QueueError, TaskLedgerPort, TaskQueuePort};
use crate::domain::{NativeState, TaskId, TaskKind};

/// 单个任务的记录
#[derive(Debug, Clone)]
struct TaskRecord {
    lane: TaskKind,
    payload: Vec<u8>,
    state: NativeState,
    attempts: u32,
    result: Option<Vec<u8>>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    fn new(lane: TaskKind, payload: Vec<u8>) -> Self {
        Self {
            lane,
            payload,
            state: NativeState::Received,
            attempts: 0,
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn finish(&mut self, state: NativeState) {
        self.state = state;
        self.completed_at = Some(Utc::now());
    }
}

/// 内存任务队列
pub struct InMemoryTaskQueue {
    /// task_id -> TaskRecord
    tasks: DashMap<TaskId, TaskRecord>,
    /// 任务队列发送端
    queue_sender: mpsc::Sender<TaskId>,
}

impl InMemoryTaskQueue {
    pub fn new(queue_sender: mpsc::Sender<TaskId>) -> Self {
        Self {
            tasks: DashMap::new(),
            queue_sender,
        }
    }

    /// 创建队列与 worker 接收端
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TaskId>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 当前保存的任务数（含已结束的）
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 删除结束时间早于 `ttl` 之前的终态任务，返回删除数量
    pub fn purge_expired(&self, ttl: Duration) -> usize {
        let Some(cutoff) = Utc::now().checked_sub_signed(ttl) else {
            return 0;
        };
        let before = self.tasks.len();
        self.tasks.retain(|_, record| {
            !(record.state.is_terminal()
                && record.completed_at.map(|at| at <= cutoff).unwrap_or(false))
        });
        let purged = before.saturating_sub(self.tasks.len());
        if purged > 0 {
            tracing::debug!(purged = purged, "Expired tasks purged");
        }
        purged
    }

    fn transition(
        &self,
        task_id: &TaskId,
        allowed: &[NativeState],
        to: NativeState,
        apply: impl FnOnce(&mut TaskRecord),
    ) -> Result<(), QueueError> {
        let mut record = self
            .tasks
            .get_mut(task_id)
            .ok_or(QueueError::NotFound(*task_id))?;

        if !allowed.contains(&record.state) {
            return Err(QueueError::InvalidStateTransition {
                task_id: *task_id,
                from: record.state.as_str(),
                to: to.as_str(),
            });
        }

        let old_state = record.state;
        apply(&mut *record);

        tracing::debug!(
            task_id = %task_id,
            old_state = old_state.as_str(),
            new_state = record.state.as_str(),
            "Task state changed"
        );
        Ok(())
    }
}

#[async_trait]
impl TaskQueuePort for InMemoryTaskQueue {
    async fn enqueue(&self, lane: TaskKind, payload: Vec<u8>) -> Result<TaskId, QueueError> {
        let task_id = TaskId::new();
        self.tasks.insert(task_id, TaskRecord::new(lane, payload));

        // 发送失败时撤销记录，客户端不会拿到悬空的 ID
        if let Err(e) = self.queue_sender.try_send(task_id) {
            self.tasks.remove(&task_id);
            tracing::warn!(task_id = %task_id, error = %e, "Failed to enqueue task");
            return Err(QueueError::Unavailable(e.to_string()));
        }

        Ok(task_id)
    }

    async fn native_state(&self, task_id: &TaskId) -> Result<NativeState, QueueError> {
        Ok(self
            .tasks
            .get(task_id)
            .map(|record| record.state)
            .unwrap_or(NativeState::Pending))
    }

    async fn fetch_result(&self, task_id: &TaskId) -> Result<Vec<u8>, QueueError> {
        let record = self
            .tasks
            .get(task_id)
            .ok_or(QueueError::NotFound(*task_id))?;
        match (&record.state, &record.result) {
            (NativeState::Succeeded, Some(result)) => Ok(result.clone()),
            _ => Err(QueueError::ResultUnavailable(*task_id)),
        }
    }

    async fn failure_detail(&self, task_id: &TaskId) -> Option<String> {
        self.tasks.get(task_id).and_then(|record| record.error.clone())
    }
}

impl TaskLedgerPort for InMemoryTaskQueue {
    fn claim(&self, task_id: &TaskId) -> Option<ClaimedTask> {
        let mut record = self.tasks.get_mut(task_id)?;
        if !matches!(record.state, NativeState::Received | NativeState::Retrying) {
            tracing::warn!(
                task_id = %task_id,
                state = record.state.as_str(),
                "Task not claimable, skipping"
            );
            return None;
        }

        record.state = NativeState::Started;
        record.attempts += 1;

        Some(ClaimedTask {
            task_id: *task_id,
            lane: record.lane,
            payload: record.payload.clone(),
            attempt: record.attempts,
        })
    }

    fn succeed(&self, task_id: &TaskId, output: Vec<u8>) -> Result<(), QueueError> {
        self.transition(
            task_id,
            &[NativeState::Started],
            NativeState::Succeeded,
            |record| {
                record.result = Some(output);
                record.error = None;
                record.finish(NativeState::Succeeded);
            },
        )
    }

    fn retry(&self, task_id: &TaskId, error: String) -> Result<(), QueueError> {
        self.transition(
            task_id,
            &[NativeState::Started],
            NativeState::Retrying,
            |record| {
                record.state = NativeState::Retrying;
                record.error = Some(error);
            },
        )?;

        if let Err(e) = self.queue_sender.try_send(*task_id) {
            tracing::warn!(task_id = %task_id, error = %e, "Failed to requeue task");
            if let Some(mut record) = self.tasks.get_mut(task_id) {
                record.finish(NativeState::Failed);
            }
            return Err(QueueError::Unavailable(e.to_string()));
        }
        Ok(())
    }

    fn fail(&self, task_id: &TaskId, error: String) -> Result<(), QueueError> {
        self.transition(
            task_id,
            &[
                NativeState::Received,
                NativeState::Started,
                NativeState::Retrying,
            ],
            NativeState::Failed,
            |record| {
                record.error = Some(error);
                record.finish(NativeState::Failed);
            },
        )
    }
}

impl std::fmt::Debug for InMemoryTaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let oldest = self.tasks.iter().map(|entry| entry.created_at).min();
        f.debug_struct("InMemoryTaskQueue")
            .field("tasks", &self.tasks.len())
            .field("oldest", &oldest)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_task_lifecycle() {
        let (queue, mut rx) = InMemoryTaskQueue::channel(8);

        let task_id = queue
            .enqueue(TaskKind::Request, b"{}".to_vec())
            .await
            .unwrap();
        assert_eq!(rx.try_recv().unwrap(), task_id);
        assert_eq!(queue.native_state(&task_id).await.unwrap(), NativeState::Received);

        let claimed = queue.claim(&task_id).unwrap();
        assert_eq!(claimed.lane, TaskKind::Request);
        assert_eq!(claimed.payload, b"{}".to_vec());
        assert_eq!(claimed.attempt, 1);
        assert_eq!(queue.native_state(&task_id).await.unwrap(), NativeState::Started);

        // 运行中的任务不能被重复领取
        assert!(queue.claim(&task_id).is_none());

        queue.succeed(&task_id, b"[1]".to_vec()).unwrap();
        assert_eq!(queue.native_state(&task_id).await.unwrap(), NativeState::Succeeded);
        assert_eq!(queue.fetch_result(&task_id).await.unwrap(), b"[1]".to_vec());
    }

    #[tokio::test]
    async fn test_unknown_task_is_pending() {
        let (queue, _rx) = InMemoryTaskQueue::channel(1);
        let task_id = TaskId::new();
        assert_eq!(queue.native_state(&task_id).await.unwrap(), NativeState::Pending);
        assert!(matches!(
            queue.fetch_result(&task_id).await,
            Err(QueueError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_retry_requeues_and_counts_attempts() {
        let (queue, mut rx) = InMemoryTaskQueue::channel(8);
        let task_id = queue.enqueue(TaskKind::FitParameters, b"{}".to_vec()).await.unwrap();
        rx.try_recv().unwrap();

        queue.claim(&task_id).unwrap();
        queue.retry(&task_id, "flaky".to_string()).unwrap();
        assert_eq!(queue.native_state(&task_id).await.unwrap(), NativeState::Retrying);
        assert_eq!(rx.try_recv().unwrap(), task_id);

        let claimed = queue.claim(&task_id).unwrap();
        assert_eq!(claimed.attempt, 2);
    }

    #[tokio::test]
    async fn test_fail_keeps_detail_server_side() {
        let (queue, _rx) = InMemoryTaskQueue::channel(8);
        let task_id = queue.enqueue(TaskKind::Request, b"{}".to_vec()).await.unwrap();
        queue.claim(&task_id).unwrap();
        queue.fail(&task_id, "division by zero".to_string()).unwrap();

        assert_eq!(queue.native_state(&task_id).await.unwrap(), NativeState::Failed);
        assert_eq!(
            queue.failure_detail(&task_id).await.as_deref(),
            Some("division by zero")
        );
        assert!(matches!(
            queue.fetch_result(&task_id).await,
            Err(QueueError::ResultUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_succeed_requires_started() {
        let (queue, _rx) = InMemoryTaskQueue::channel(8);
        let task_id = queue.enqueue(TaskKind::Request, b"{}".to_vec()).await.unwrap();
        let err = queue.succeed(&task_id, b"{}".to_vec()).unwrap_err();
        assert!(matches!(err, QueueError::InvalidStateTransition { from: "received", .. }));
    }

    #[tokio::test]
    async fn test_full_queue_rejects_without_leaking_record() {
        let (queue, _rx) = InMemoryTaskQueue::channel(1);
        queue.enqueue(TaskKind::Request, b"{}".to_vec()).await.unwrap();

        let err = queue.enqueue(TaskKind::Request, b"{}".to_vec()).await.unwrap_err();
        assert!(matches!(err, QueueError::Unavailable(_)));
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_purge_expired_only_touches_terminal_tasks() {
        let (queue, _rx) = InMemoryTaskQueue::channel(8);
        let done = queue.enqueue(TaskKind::Request, b"{}".to_vec()).await.unwrap();
        let waiting = queue.enqueue(TaskKind::Request, b"{}".to_vec()).await.unwrap();
        queue.claim(&done).unwrap();
        queue.succeed(&done, b"{}".to_vec()).unwrap();

        assert_eq!(queue.purge_expired(Duration::hours(1)), 0);
        assert_eq!(queue.purge_expired(Duration::zero()), 1);

        assert_eq!(queue.native_state(&done).await.unwrap(), NativeState::Pending);
        assert_eq!(queue.native_state(&waiting).await.unwrap(), NativeState::Received);
    }
}
