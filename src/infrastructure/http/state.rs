//! Application State
//!
//! 包含所有 Handler、服务描述与访问控制的应用状态

use std::sync::Arc;

use crate::application::{
    RequestGatePort, ServiceModels, SubmitTaskHandler, TaskQueuePort, TaskResultHandler,
    TaskStatusHandler,
};
use crate::domain::TaskKind;

/// 服务描述（根路径端点返回）
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub title: String,
    pub description: String,
    pub version: String,
    /// 所有端点的挂载前缀，例如 `/v1`
    pub root_path: String,
}

/// 单个 kind 的三个端点
pub struct KindEndpoints {
    pub submit_handler: SubmitTaskHandler,
    pub status_handler: TaskStatusHandler,
    pub result_handler: TaskResultHandler,
}

/// 应用状态
pub struct AppState {
    pub info: ServiceInfo,
    pub gate: Arc<dyn RequestGatePort>,
    kinds: Vec<TaskKind>,
    request: KindEndpoints,
    fit_parameters: Option<KindEndpoints>,
}

impl AppState {
    /// 创建应用状态
    ///
    /// 未配置 fit-parameters 时不会注册对应端点
    pub fn new(
        info: ServiceInfo,
        queue: Arc<dyn TaskQueuePort>,
        models: &ServiceModels,
        gate: Arc<dyn RequestGatePort>,
    ) -> Self {
        let endpoints = |kind_models: &crate::application::KindModels| KindEndpoints {
            submit_handler: SubmitTaskHandler::new(queue.clone(), kind_models.clone()),
            status_handler: TaskStatusHandler::new(queue.clone()),
            result_handler: TaskResultHandler::new(queue.clone(), kind_models.clone()),
        };

        Self {
            info,
            gate,
            kinds: models.kinds(),
            request: endpoints(models.request()),
            fit_parameters: models.fit_parameters().map(endpoints),
        }
    }

    /// 已注册的 kind
    pub fn kinds(&self) -> &[TaskKind] {
        &self.kinds
    }

    pub fn endpoints(&self, kind: TaskKind) -> Option<&KindEndpoints> {
        match kind {
            TaskKind::Request => Some(&self.request),
            TaskKind::FitParameters => self.fit_parameters.as_ref(),
        }
    }
}
