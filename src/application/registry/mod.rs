//! Schema / Model Registry
//!
//! 服务启动时根据用户提供的类型与函数一次性构建：
//! - `ServiceModels`: 每个 kind 的输入/输出 schema，供 HTTP 控制器使用
//! - `PayloadTable`: 每个 lane 的计算函数，供 worker 使用
//!
//! fit-parameters 是可选的；未配置时 request 输入为 `{arguments}`，
//! 配置后为 `{arguments, parameters}`，parameters 即 fit-parameters 的输出。

mod payload;
mod schema;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::application::ports::{PayloadPort, SchemaPort};
use crate::domain::{FitParametersInput, ParameterizedRequestInput, RequestInput, TaskKind};

pub use payload::TypedPayload;
pub use schema::SerdeSchema;

/// 单个 kind 的输入/输出 schema
#[derive(Clone)]
pub struct KindModels {
    pub kind: TaskKind,
    pub input: Arc<dyn SchemaPort>,
    pub output: Arc<dyn SchemaPort>,
}

impl KindModels {
    pub fn new(kind: TaskKind, input: Arc<dyn SchemaPort>, output: Arc<dyn SchemaPort>) -> Self {
        Self {
            kind,
            input,
            output,
        }
    }
}

impl std::fmt::Debug for KindModels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KindModels")
            .field("kind", &self.kind)
            .field("input", &self.input.name())
            .field("output", &self.output.name())
            .finish()
    }
}

/// 服务的全部 schema
#[derive(Debug, Clone)]
pub struct ServiceModels {
    request: KindModels,
    fit_parameters: Option<KindModels>,
}

impl ServiceModels {
    pub fn new(request: KindModels, fit_parameters: Option<KindModels>) -> Self {
        Self {
            request,
            fit_parameters,
        }
    }

    pub fn request(&self) -> &KindModels {
        &self.request
    }

    pub fn fit_parameters(&self) -> Option<&KindModels> {
        self.fit_parameters.as_ref()
    }

    pub fn get(&self, kind: TaskKind) -> Option<&KindModels> {
        match kind {
            TaskKind::Request => Some(&self.request),
            TaskKind::FitParameters => self.fit_parameters.as_ref(),
        }
    }

    /// 已配置的 kind（request 总在第一位）
    pub fn kinds(&self) -> Vec<TaskKind> {
        TaskKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_some())
            .collect()
    }
}

/// 每个 lane 的计算函数
#[derive(Clone)]
pub struct PayloadTable {
    request: Arc<dyn PayloadPort>,
    fit_parameters: Option<Arc<dyn PayloadPort>>,
}

impl PayloadTable {
    pub fn new(request: Arc<dyn PayloadPort>, fit_parameters: Option<Arc<dyn PayloadPort>>) -> Self {
        Self {
            request,
            fit_parameters,
        }
    }

    pub fn get(&self, lane: TaskKind) -> Option<Arc<dyn PayloadPort>> {
        match lane {
            TaskKind::Request => Some(self.request.clone()),
            TaskKind::FitParameters => self.fit_parameters.clone(),
        }
    }
}

/// 服务定义：schema + 计算函数
#[derive(Clone)]
pub struct ServiceRegistry {
    pub models: ServiceModels,
    pub payloads: PayloadTable,
}

impl ServiceRegistry {
    /// 只提供 request 端点的服务
    pub fn request_only<A, O, F>(handle_request: F) -> Self
    where
        A: DeserializeOwned + JsonSchema + 'static,
        O: Serialize + DeserializeOwned + JsonSchema + 'static,
        F: Fn(RequestInput<A>) -> anyhow::Result<O> + Send + Sync + 'static,
    {
        let request = KindModels::new(
            TaskKind::Request,
            Arc::new(SerdeSchema::<RequestInput<A>>::new()),
            Arc::new(SerdeSchema::<O>::new()),
        );
        Self {
            models: ServiceModels::new(request, None),
            payloads: PayloadTable::new(Arc::new(TypedPayload::new(handle_request)), None),
        }
    }

    /// 同时提供 request 与 fit-parameters 端点的服务
    ///
    /// - `A` / `P` / `O`: request 的 arguments、拟合参数与输出
    /// - `FA` / `Obs`: fit-parameters 的 arguments 与观测值，输出为 `P`
    pub fn with_fit_parameters<A, P, FA, Obs, O, F, G>(handle_request: F, fit_parameters: G) -> Self
    where
        A: DeserializeOwned + JsonSchema + 'static,
        P: Serialize + DeserializeOwned + JsonSchema + 'static,
        FA: DeserializeOwned + JsonSchema + 'static,
        Obs: DeserializeOwned + JsonSchema + 'static,
        O: Serialize + DeserializeOwned + JsonSchema + 'static,
        F: Fn(ParameterizedRequestInput<A, P>) -> anyhow::Result<O> + Send + Sync + 'static,
        G: Fn(FitParametersInput<FA, Obs>) -> anyhow::Result<P> + Send + Sync + 'static,
    {
        let request = KindModels::new(
            TaskKind::Request,
            Arc::new(SerdeSchema::<ParameterizedRequestInput<A, P>>::new()),
            Arc::new(SerdeSchema::<O>::new()),
        );
        let fit = KindModels::new(
            TaskKind::FitParameters,
            Arc::new(SerdeSchema::<FitParametersInput<FA, Obs>>::new()),
            Arc::new(SerdeSchema::<P>::new()),
        );
        Self {
            models: ServiceModels::new(request, Some(fit)),
            payloads: PayloadTable::new(
                Arc::new(TypedPayload::new(handle_request)),
                Some(Arc::new(TypedPayload::new(fit_parameters))),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct Args {
        x: f64,
    }

    #[derive(Serialize, Deserialize, JsonSchema)]
    struct Params {
        w: f64,
    }

    #[derive(Serialize, Deserialize, JsonSchema)]
    struct Out {
        f: f64,
    }

    #[derive(Deserialize, JsonSchema)]
    struct Obs {
        y: f64,
    }

    #[test]
    fn test_request_only_registers_single_kind() {
        let registry = ServiceRegistry::request_only(|input: RequestInput<Args>| {
            Ok(Out { f: input.arguments.x })
        });
        assert_eq!(registry.models.kinds(), vec![TaskKind::Request]);
        assert!(registry.models.fit_parameters().is_none());
        assert!(registry.payloads.get(TaskKind::FitParameters).is_none());

        let request = registry.models.request();
        assert!(request.input.validate(br#"{"arguments":{"x":1}}"#).is_ok());
        assert!(request.output.validate(br#"{"f":1.0}"#).is_ok());
        assert!(request.output.validate(br#"{"g":1.0}"#).is_err());
    }

    #[test]
    fn test_fit_parameters_compose_envelopes() {
        let registry = ServiceRegistry::with_fit_parameters(
            |input: ParameterizedRequestInput<Args, Params>| {
                Ok(Out {
                    f: input.arguments.x * input.parameters.w,
                })
            },
            |input: FitParametersInput<Args, Obs>| {
                Ok(Params {
                    w: input.observations.y / input.arguments.x,
                })
            },
        );
        assert_eq!(
            registry.models.kinds(),
            vec![TaskKind::Request, TaskKind::FitParameters]
        );

        let request = registry.models.request();
        assert!(request.input.validate(br#"{"arguments":{"x":1}}"#).is_err());
        assert!(request
            .input
            .validate(br#"{"arguments":{"x":1},"parameters":{"w":2}}"#)
            .is_ok());

        let fit = registry.models.get(TaskKind::FitParameters).unwrap();
        assert!(fit
            .input
            .validate(br#"{"arguments":{"x":2},"observations":{"y":4}}"#)
            .is_ok());
        assert!(fit.output.validate(br#"{"w":2.0}"#).is_ok());

        let payload = registry.payloads.get(TaskKind::FitParameters).unwrap();
        let out = payload
            .execute(br#"{"arguments":{"x":2},"observations":{"y":4}}"#)
            .unwrap();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&out).unwrap(),
            serde_json::json!({"w": 2.0})
        );
    }
}
