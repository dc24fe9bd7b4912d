//! Service Client - 提交任务并按提交顺序取回结果
//!
//! 使用方式：
//! 1. 创建客户端
//! 2. 提交一个或多个任务
//! 3. `wait_for_results` 阻塞到全部完成
//! 4. `fetch_results*` 一次性按提交顺序取回
//!
//! 等待采用队首轮询：只查询最早未完成的任务，就绪后再前进到下一个。
//! 只有“未就绪”的查询消耗重试预算。

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;

use crate::domain::{ClientStatus, TaskId, TaskKind};

/// 客户端错误
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {detail}")]
    UnexpectedStatus { status: u16, detail: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout while waiting for tasks to complete after {attempts} status checks")]
    PollTimeout { attempts: u32 },
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Transport(format!("Request timed out: {}", e))
        } else if e.is_connect() {
            ClientError::Transport(format!("Cannot connect to service: {}", e))
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

/// 客户端配置
#[derive(Debug, Clone)]
pub struct ServiceClientConfig {
    /// 服务 API 根地址，包含版本前缀，例如 `http://localhost:8800/v1`
    pub base_url: String,
    /// 端点类别，标准值为 `request` / `fit-parameters`
    pub endpoint: String,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
    /// 是否校验 TLS 证书
    pub verify_tls: bool,
    pub bearer_token: Option<String>,
    /// HTTP Basic 认证（用户名，密码）
    pub basic_auth: Option<(String, String)>,
}

impl Default for ServiceClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8800/v1".to_string(),
            endpoint: TaskKind::Request.as_str().to_string(),
            timeout_secs: 30,
            verify_tls: true,
            bearer_token: None,
            basic_auth: None,
        }
    }
}

impl ServiceClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((username.into(), password.into()));
        self
    }
}

/// 轮询配置，最长等待时间约为 `max_retries * retry_interval`
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub max_retries: u32,
    pub retry_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_retries: 300,
            retry_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TaskIdBody {
    task_id: TaskId,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: ClientStatus,
}

/// 计算服务客户端
///
/// 不支持并发调用：任务 ID 列表只在顺序使用下保持一致
pub struct ServiceClient {
    client: Client,
    config: ServiceClientConfig,
    /// 已提交、尚未取回结果的任务（提交顺序）
    task_ids: VecDeque<TaskId>,
    all_tasks_finished: bool,
}

impl ServiceClient {
    pub fn new(config: ServiceClientConfig) -> Result<Self, ClientError> {
        let standard = TaskKind::ALL
            .iter()
            .any(|kind| kind.as_str() == config.endpoint);
        if !standard {
            tracing::warn!(
                endpoint = %config.endpoint,
                "Client configured with a non-standard endpoint, expected `request` or `fit-parameters`"
            );
        }
        if !config.verify_tls {
            tracing::warn!(
                base_url = %config.base_url,
                "Client will make unverified HTTPS requests, certificate verification is strongly advised"
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self {
            client,
            config,
            task_ids: VecDeque::new(),
            all_tasks_finished: false,
        })
    }

    /// 已提交、尚未取回结果的任务 ID
    pub fn pending_task_ids(&self) -> Vec<TaskId> {
        self.task_ids.iter().copied().collect()
    }

    /// 访问服务根路径确认连通
    pub async fn check_connection(&self) -> Result<(), ClientError> {
        self.send(self.client.get(self.url("/"))).await?;
        Ok(())
    }

    /// 提交原始 JSON 输入
    pub async fn submit_json(&mut self, input: &serde_json::Value) -> Result<TaskId, ClientError> {
        let url = self.url(&format!("/{}/", self.config.endpoint));
        let response = self.send(self.client.post(url).json(input)).await?;
        let body: TaskIdBody = Self::parse(response).await?;

        tracing::debug!(task_id = %body.task_id, endpoint = %self.config.endpoint, "Task submitted");
        self.task_ids.push_back(body.task_id);
        self.all_tasks_finished = false;
        Ok(body.task_id)
    }

    /// 提交类型化输入
    pub async fn submit<T: Serialize>(&mut self, input: &T) -> Result<TaskId, ClientError> {
        let value =
            serde_json::to_value(input).map_err(|e| ClientError::InvalidInput(e.to_string()))?;
        self.submit_json(&value).await
    }

    /// 查询单个任务的状态
    pub async fn status(&self, task_id: &TaskId) -> Result<ClientStatus, ClientError> {
        let url = self.url(&format!("/{}/{}/status/", self.config.endpoint, task_id));
        let response = self.send(self.client.get(url)).await?;
        let body: StatusBody = Self::parse(response).await?;
        Ok(body.status)
    }

    /// 阻塞直到所有已提交任务都就绪
    pub async fn wait_for_results(&mut self, poll: &PollConfig) -> Result<(), ClientError> {
        if self.all_tasks_finished {
            return Ok(());
        }

        let mut attempts = 0u32;
        let mut index = 0usize;
        while let Some(task_id) = self.task_ids.get(index).copied() {
            if self.status(&task_id).await?.is_ready() {
                index += 1;
                continue;
            }

            attempts += 1;
            if attempts >= poll.max_retries {
                tracing::warn!(task_id = %task_id, attempts = attempts, "Gave up waiting for task");
                return Err(ClientError::PollTimeout { attempts });
            }
            tokio::time::sleep(poll.retry_interval).await;
        }

        self.all_tasks_finished = true;
        Ok(())
    }

    /// 按提交顺序取回全部结果（JSON）
    pub async fn fetch_results_json(
        &mut self,
        poll: &PollConfig,
    ) -> Result<Vec<serde_json::Value>, ClientError> {
        self.wait_for_results(poll).await?;

        let mut results = Vec::with_capacity(self.task_ids.len());
        while let Some(task_id) = self.task_ids.front().copied() {
            let url = self.url(&format!("/{}/{}/result/", self.config.endpoint, task_id));
            let response = self.send(self.client.get(url)).await?;
            results.push(Self::parse(response).await?);
            // 取回成功后才出队
            self.task_ids.pop_front();
        }
        Ok(results)
    }

    /// 按提交顺序取回全部结果并解析为 `T`
    pub async fn fetch_results<T: DeserializeOwned>(
        &mut self,
        poll: &PollConfig,
    ) -> Result<Vec<T>, ClientError> {
        self.fetch_results_json(poll)
            .await?
            .into_iter()
            .map(|value| {
                serde_json::from_value(value).map_err(|e| ClientError::InvalidResponse(e.to_string()))
            })
            .collect()
    }

    fn url(&self, relative: &str) -> String {
        compute_full_url(&self.config.base_url, relative)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let builder = match (&self.config.bearer_token, &self.config.basic_auth) {
            (Some(token), _) => builder.bearer_auth(token),
            (None, Some((username, password))) => builder.basic_auth(username, Some(password)),
            (None, None) => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response.text().await.unwrap_or_default();
        if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY) {
            tracing::error!(status = status.as_u16(), detail = %detail, "HTTP request returned error");
        }
        Err(ClientError::UnexpectedStatus {
            status: status.as_u16(),
            detail,
        })
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

/// 拼接 base URL 与相对路径，去掉两者之间重复的 `/`
pub fn compute_full_url(base_url: &str, relative_url: &str) -> String {
    if base_url.ends_with('/') && relative_url.starts_with('/') {
        format!("{}{}", base_url, &relative_url[1..])
    } else {
        format!("{}{}", base_url, relative_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// 预设每个任务在就绪前返回多少次 running
    #[derive(Default)]
    struct MockService {
        plan: Mutex<VecDeque<(TaskId, u32)>>,
        remaining: Mutex<HashMap<TaskId, u32>>,
        status_calls: Mutex<HashMap<TaskId, u32>>,
        order: Mutex<Vec<TaskId>>,
    }

    impl MockService {
        fn calls(&self, task_id: &TaskId) -> u32 {
            self.status_calls.lock().unwrap().get(task_id).copied().unwrap_or(0)
        }
    }

    async fn submit(State(mock): State<Arc<MockService>>) -> Json<serde_json::Value> {
        let (task_id, polls) = mock.plan.lock().unwrap().pop_front().unwrap();
        mock.remaining.lock().unwrap().insert(task_id, polls);
        mock.order.lock().unwrap().push(task_id);
        Json(json!({ "task_id": task_id }))
    }

    async fn status(
        State(mock): State<Arc<MockService>>,
        Path(task_id): Path<TaskId>,
    ) -> Json<serde_json::Value> {
        *mock.status_calls.lock().unwrap().entry(task_id).or_insert(0) += 1;
        let mut remaining = mock.remaining.lock().unwrap();
        let left = remaining.entry(task_id).or_insert(0);
        let status = if *left == 0 {
            "ready"
        } else {
            *left -= 1;
            "running"
        };
        Json(json!({ "status": status, "percent_complete": null, "eta_seconds": null }))
    }

    async fn result(
        State(mock): State<Arc<MockService>>,
        Path(task_id): Path<TaskId>,
    ) -> Json<serde_json::Value> {
        let position = mock
            .order
            .lock()
            .unwrap()
            .iter()
            .position(|id| *id == task_id)
            .unwrap();
        Json(json!({ "position": position }))
    }

    async fn spawn_mock(plan: Vec<u32>) -> (String, Arc<MockService>, Vec<TaskId>) {
        let ids: Vec<TaskId> = plan.iter().map(|_| TaskId::new()).collect();
        let mock = Arc::new(MockService::default());
        *mock.plan.lock().unwrap() = ids.iter().copied().zip(plan).collect();

        let app = Router::new()
            .route("/v1/request/", post(submit))
            .route("/v1/request/:task_id/status/", get(status))
            .route("/v1/request/:task_id/result/", get(result))
            .with_state(mock.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/v1/", addr), mock, ids)
    }

    fn fast_poll(max_retries: u32) -> PollConfig {
        PollConfig {
            max_retries,
            retry_interval: Duration::ZERO,
        }
    }

    #[test]
    fn test_compute_full_url_strips_duplicate_slash() {
        assert_eq!(
            compute_full_url("http://localhost:8800/v1/", "/request/"),
            "http://localhost:8800/v1/request/"
        );
        assert_eq!(
            compute_full_url("http://localhost:8800/v1", "/request/"),
            "http://localhost:8800/v1/request/"
        );
    }

    #[test]
    fn test_config_defaults() {
        let config = ServiceClientConfig::default();
        assert_eq!(config.endpoint, "request");
        assert!(config.verify_tls);

        let poll = PollConfig::default();
        assert_eq!(poll.max_retries, 300);
        assert_eq!(poll.retry_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_non_standard_endpoint_is_accepted() {
        let client = ServiceClient::new(ServiceClientConfig::default().with_endpoint("custom"));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_head_of_line_polling() {
        // 第一个任务两次 running 后就绪，第二个任务立即就绪
        let (base_url, mock, ids) = spawn_mock(vec![2, 0]).await;
        let mut client = ServiceClient::new(ServiceClientConfig::new(base_url)).unwrap();
        client.submit_json(&json!({"arguments": {}})).await.unwrap();
        client.submit_json(&json!({"arguments": {}})).await.unwrap();

        // 只有 running 消耗预算：2 次 running < 3
        client.wait_for_results(&fast_poll(3)).await.unwrap();

        assert_eq!(mock.calls(&ids[0]), 3);
        assert_eq!(mock.calls(&ids[1]), 1);
    }

    #[tokio::test]
    async fn test_ready_head_is_not_polled_again() {
        // 第一个任务立即就绪，第二个任务两次 running 后就绪
        let (base_url, mock, ids) = spawn_mock(vec![0, 2]).await;
        let mut client = ServiceClient::new(ServiceClientConfig::new(base_url)).unwrap();
        client.submit_json(&json!({"arguments": {}})).await.unwrap();
        client.submit_json(&json!({"arguments": {}})).await.unwrap();

        client.wait_for_results(&fast_poll(3)).await.unwrap();

        assert_eq!(mock.calls(&ids[0]), 1);
        assert_eq!(mock.calls(&ids[1]), 3);
    }

    #[tokio::test]
    async fn test_finished_wait_is_not_repeated() {
        let (base_url, mock, ids) = spawn_mock(vec![0]).await;
        let mut client = ServiceClient::new(ServiceClientConfig::new(base_url)).unwrap();
        client.submit_json(&json!({})).await.unwrap();

        client.wait_for_results(&fast_poll(1)).await.unwrap();
        client.wait_for_results(&fast_poll(1)).await.unwrap();
        assert_eq!(mock.calls(&ids[0]), 1);
    }

    #[tokio::test]
    async fn test_poll_timeout_after_budget() {
        let (base_url, mock, ids) = spawn_mock(vec![u32::MAX]).await;
        let mut client = ServiceClient::new(ServiceClientConfig::new(base_url)).unwrap();
        client.submit_json(&json!({})).await.unwrap();

        let err = client.wait_for_results(&fast_poll(1)).await.unwrap_err();
        assert!(matches!(err, ClientError::PollTimeout { attempts: 1 }));
        assert_eq!(mock.calls(&ids[0]), 1);
        assert_eq!(client.pending_task_ids(), ids);
    }

    #[tokio::test]
    async fn test_results_preserve_submission_order() {
        let (base_url, _mock, ids) = spawn_mock(vec![3, 0, 1]).await;
        let mut client = ServiceClient::new(ServiceClientConfig::new(base_url)).unwrap();
        for _ in 0..3 {
            client.submit_json(&json!({})).await.unwrap();
        }
        assert_eq!(client.pending_task_ids(), ids);

        #[derive(Deserialize)]
        struct Positioned {
            position: usize,
        }

        let results: Vec<Positioned> = client.fetch_results(&fast_poll(10)).await.unwrap();
        let positions: Vec<usize> = results.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert!(client.pending_task_ids().is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (base_url, _mock, _ids) = spawn_mock(vec![]).await;
        let client = ServiceClient::new(ServiceClientConfig::new(base_url)).unwrap();
        // 未注册的 ID 在 mock 中视为立即就绪
        let status = client.status(&TaskId::new()).await;
        assert!(matches!(status, Ok(ClientStatus::Ready)));

        let err = client.check_connection().await.unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedStatus { status: 404, .. }));
    }
}
