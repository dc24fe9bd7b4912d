//! Task Handlers - 提交 / 状态 / 结果

use std::sync::Arc;

use crate::application::commands::task_commands::*;
use crate::application::error::ServiceError;
use crate::application::ports::TaskQueuePort;
use crate::application::registry::KindModels;
use crate::domain::{map_result_access, map_status, ResultAccess};

/// SubmitTask Handler - 校验输入后入队
pub struct SubmitTaskHandler {
    queue: Arc<dyn TaskQueuePort>,
    models: KindModels,
}

impl SubmitTaskHandler {
    pub fn new(queue: Arc<dyn TaskQueuePort>, models: KindModels) -> Self {
        Self { queue, models }
    }

    pub async fn handle(&self, cmd: SubmitTaskCommand) -> Result<SubmitTaskResponse, ServiceError> {
        if let Err(errors) = self.models.input.validate(&cmd.body) {
            tracing::debug!(
                kind = %self.models.kind,
                schema = %errors.schema,
                issues = errors.issues.len(),
                "Rejected task input"
            );
            return Err(ServiceError::Validation(errors));
        }

        // 原始字节原样入队，worker 侧再解析
        let task_id = self.queue.enqueue(self.models.kind, cmd.body).await?;

        tracing::info!(task_id = %task_id, kind = %self.models.kind, "Task submitted");
        Ok(SubmitTaskResponse { task_id })
    }
}

/// TaskStatus Handler - 查询客户端状态
pub struct TaskStatusHandler {
    queue: Arc<dyn TaskQueuePort>,
}

impl TaskStatusHandler {
    pub fn new(queue: Arc<dyn TaskQueuePort>) -> Self {
        Self { queue }
    }

    pub async fn handle(&self, query: TaskStatusQuery) -> Result<TaskStatusResponse, ServiceError> {
        let state = self.queue.native_state(&query.task_id).await?;
        let status = map_status(state).map_err(|_| ServiceError::not_found(query.task_id))?;

        tracing::debug!(
            task_id = %query.task_id,
            native = state.as_str(),
            status = status.as_str(),
            "Task status"
        );

        Ok(TaskStatusResponse {
            status,
            percent_complete: None,
            eta_seconds: None,
        })
    }
}

/// TaskResult Handler - 读取并校验结果
pub struct TaskResultHandler {
    queue: Arc<dyn TaskQueuePort>,
    models: KindModels,
}

impl TaskResultHandler {
    pub fn new(queue: Arc<dyn TaskQueuePort>, models: KindModels) -> Self {
        Self { queue, models }
    }

    pub async fn handle(&self, query: TaskResultQuery) -> Result<TaskResultResponse, ServiceError> {
        let task_id = query.task_id;
        let state = self.queue.native_state(&task_id).await?;

        match map_result_access(state) {
            ResultAccess::NotFound => Err(ServiceError::not_found(task_id)),
            ResultAccess::NotReady => Err(ServiceError::NotReady(task_id)),
            ResultAccess::Failed => {
                let reason = self
                    .queue
                    .failure_detail(&task_id)
                    .await
                    .unwrap_or_else(|| "unknown failure".to_string());
                tracing::debug!(task_id = %task_id, "Task failed, reporting worker failure");
                Err(ServiceError::worker_failure(task_id, reason))
            }
            ResultAccess::Available => {
                let body = self.queue.fetch_result(&task_id).await?;
                if let Err(errors) = self.models.output.validate(&body) {
                    tracing::debug!(
                        task_id = %task_id,
                        schema = %errors.schema,
                        "Task output failed schema validation"
                    );
                    return Err(ServiceError::OutputSchemaViolation {
                        task_id,
                        schema: errors.schema.clone(),
                        errors,
                    });
                }
                Ok(TaskResultResponse { body })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::QueueError;
    use crate::application::registry::SerdeSchema;
    use crate::domain::{ClientStatus, NativeState, RequestInput, TaskId, TaskKind};
    use async_trait::async_trait;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Args {
        x: f64,
    }

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Out {
        f: f64,
    }

    /// 记录调用、返回预设状态的假队列
    #[derive(Default)]
    struct RecordingQueue {
        enqueued: Mutex<Vec<(TaskKind, Vec<u8>)>>,
        state: Mutex<Option<NativeState>>,
        result: Mutex<Option<Vec<u8>>>,
    }

    impl RecordingQueue {
        fn with_state(state: NativeState) -> Self {
            let queue = Self::default();
            *queue.state.lock().unwrap() = Some(state);
            queue
        }

        fn with_result(self, body: &[u8]) -> Self {
            *self.result.lock().unwrap() = Some(body.to_vec());
            self
        }
    }

    #[async_trait]
    impl TaskQueuePort for RecordingQueue {
        async fn enqueue(&self, lane: TaskKind, payload: Vec<u8>) -> Result<TaskId, QueueError> {
            self.enqueued.lock().unwrap().push((lane, payload));
            Ok(TaskId::new())
        }

        async fn native_state(&self, _task_id: &TaskId) -> Result<NativeState, QueueError> {
            Ok(self.state.lock().unwrap().unwrap_or(NativeState::Pending))
        }

        async fn fetch_result(&self, task_id: &TaskId) -> Result<Vec<u8>, QueueError> {
            self.result
                .lock()
                .unwrap()
                .clone()
                .ok_or(QueueError::ResultUnavailable(*task_id))
        }

        async fn failure_detail(&self, _task_id: &TaskId) -> Option<String> {
            Some("secret stack trace".to_string())
        }
    }

    fn models() -> KindModels {
        KindModels::new(
            TaskKind::Request,
            Arc::new(SerdeSchema::<RequestInput<Args>>::new()),
            Arc::new(SerdeSchema::<Out>::new()),
        )
    }

    #[tokio::test]
    async fn test_submit_valid_input_enqueues_raw_bytes() {
        let queue = Arc::new(RecordingQueue::default());
        let handler = SubmitTaskHandler::new(queue.clone(), models());
        let body = br#"{"arguments":{"x":1.5}}"#.to_vec();

        handler
            .handle(SubmitTaskCommand { body: body.clone() })
            .await
            .unwrap();

        let enqueued = queue.enqueued.lock().unwrap();
        assert_eq!(enqueued.len(), 1);
        assert_eq!(enqueued[0].0, TaskKind::Request);
        assert_eq!(enqueued[0].1, body);
    }

    #[tokio::test]
    async fn test_submit_invalid_input_never_enqueues() {
        let queue = Arc::new(RecordingQueue::default());
        let handler = SubmitTaskHandler::new(queue.clone(), models());

        let err = handler
            .handle(SubmitTaskCommand {
                body: br#"{"arguments":{"x":"oops"}}"#.to_vec(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(queue.enqueued.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_of_unknown_task_is_not_found() {
        let handler = TaskStatusHandler::new(Arc::new(RecordingQueue::default()));
        let err = handler
            .handle(TaskStatusQuery {
                task_id: TaskId::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_status_of_failed_task_is_ready() {
        let handler = TaskStatusHandler::new(Arc::new(RecordingQueue::with_state(NativeState::Failed)));
        let response = handler
            .handle(TaskStatusQuery {
                task_id: TaskId::new(),
            })
            .await
            .unwrap();
        assert_eq!(response.status, ClientStatus::Ready);
        assert!(response.percent_complete.is_none());
        assert!(response.eta_seconds.is_none());
    }

    #[tokio::test]
    async fn test_result_not_ready_while_running() {
        let handler = TaskResultHandler::new(
            Arc::new(RecordingQueue::with_state(NativeState::Started)),
            models(),
        );
        let err = handler
            .handle(TaskResultQuery {
                task_id: TaskId::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotReady(_)));
    }

    #[tokio::test]
    async fn test_result_returns_validated_body() {
        let queue = RecordingQueue::with_state(NativeState::Succeeded).with_result(br#"{"f":3.0}"#);
        let handler = TaskResultHandler::new(Arc::new(queue), models());
        let response = handler
            .handle(TaskResultQuery {
                task_id: TaskId::new(),
            })
            .await
            .unwrap();
        assert_eq!(response.body, br#"{"f":3.0}"#.to_vec());
    }

    #[tokio::test]
    async fn test_result_violating_output_schema_is_internal() {
        let queue = RecordingQueue::with_state(NativeState::Succeeded).with_result(br#"{"g":3.0}"#);
        let handler = TaskResultHandler::new(Arc::new(queue), models());
        let err = handler
            .handle(TaskResultQuery {
                task_id: TaskId::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::OutputSchemaViolation { .. }));
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn test_result_of_failed_task_is_worker_failure() {
        let handler = TaskResultHandler::new(
            Arc::new(RecordingQueue::with_state(NativeState::Failed)),
            models(),
        );
        let err = handler
            .handle(TaskResultQuery {
                task_id: TaskId::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::WorkerFailure { ref reason, .. } if reason == "secret stack trace"));
    }

    /// 统计 ERROR 级别事件
    #[derive(Clone, Default)]
    struct ErrorCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for ErrorCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn test_failed_result_is_logged_once_at_the_boundary() {
        use crate::infrastructure::http::ApiError;
        use axum::response::IntoResponse;

        let counter = ErrorCounter::default();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(counter.clone()));

        let failed = TaskResultHandler::new(
            Arc::new(RecordingQueue::with_state(NativeState::Failed)),
            models(),
        );
        let violating = TaskResultHandler::new(
            Arc::new(RecordingQueue::with_state(NativeState::Succeeded).with_result(b"{}")),
            models(),
        );

        for handler in [failed, violating] {
            counter.0.store(0, Ordering::SeqCst);
            let err = handler
                .handle(TaskResultQuery {
                    task_id: TaskId::new(),
                })
                .await
                .unwrap_err();
            assert_eq!(counter.0.load(Ordering::SeqCst), 0);

            let _ = ApiError::from(err).into_response();
            assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        }
    }
}
