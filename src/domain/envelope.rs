//! Input Envelopes
//!
//! request 与 fit-parameters 两类任务的输入结构：
//! - request: `{arguments}`，若服务支持 fit-parameters 则为 `{arguments, parameters}`
//! - fit-parameters: `{arguments, observations}`

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 不带拟合参数的 request 输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RequestInput<A> {
    pub arguments: A,
}

/// 带拟合参数的 request 输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParameterizedRequestInput<A, P> {
    pub arguments: A,
    pub parameters: P,
}

/// fit-parameters 输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FitParametersInput<A, O> {
    pub arguments: A,
    pub observations: O,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Args {
        x: f64,
    }

    #[test]
    fn test_request_input_ignores_unknown_fields() {
        let input: RequestInput<Args> =
            serde_json::from_value(json!({"arguments": {"x": 1.0}, "extra": true})).unwrap();
        assert_eq!(input.arguments, Args { x: 1.0 });
    }

    #[test]
    fn test_parameters_required_when_configured() {
        let result: Result<ParameterizedRequestInput<Args, Args>, _> =
            serde_json::from_value(json!({"arguments": {"x": 1.0}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_fit_input_requires_observations() {
        let result: Result<FitParametersInput<Args, Args>, _> =
            serde_json::from_value(json!({"arguments": {"x": 1.0}}));
        assert!(result.is_err());

        let input: FitParametersInput<Args, Args> =
            serde_json::from_value(json!({"arguments": {"x": 1.0}, "observations": {"x": 2.0}}))
                .unwrap();
        assert_eq!(input.observations, Args { x: 2.0 });
    }
}
