//! Typed Payload - 用户计算函数的类型化包装
//!
//! 解析输入 -> 调用函数 -> 通过输出模型序列化

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

use crate::application::ports::{PayloadError, PayloadPort};

pub struct TypedPayload<I, O, F> {
    function: F,
    _io: PhantomData<fn(I) -> O>,
}

impl<I, O, F> TypedPayload<I, O, F>
where
    F: Fn(I) -> anyhow::Result<O>,
{
    pub fn new(function: F) -> Self {
        Self {
            function,
            _io: PhantomData,
        }
    }
}

impl<I, O, F> PayloadPort for TypedPayload<I, O, F>
where
    I: DeserializeOwned,
    O: Serialize,
    F: Fn(I) -> anyhow::Result<O> + Send + Sync,
{
    fn execute(&self, input: &[u8]) -> Result<Vec<u8>, PayloadError> {
        let input: I =
            serde_json::from_slice(input).map_err(|e| PayloadError::InvalidInput(e.to_string()))?;
        let output = (self.function)(input).map_err(|e| PayloadError::Execution(format!("{:#}", e)))?;
        serde_json::to_vec(&output).map_err(|e| PayloadError::InvalidOutput(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RequestInput;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Args {
        x: i64,
    }

    #[derive(Serialize)]
    struct Out {
        doubled: i64,
    }

    fn double(input: RequestInput<Args>) -> anyhow::Result<Out> {
        anyhow::ensure!(input.arguments.x >= 0, "negative input {}", input.arguments.x);
        Ok(Out {
            doubled: input.arguments.x * 2,
        })
    }

    #[test]
    fn test_execute_round_trip() {
        let payload = TypedPayload::new(double);
        let out = payload.execute(br#"{"arguments":{"x":21}}"#).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value, serde_json::json!({"doubled": 42}));
    }

    #[test]
    fn test_function_error_is_execution_error() {
        let payload = TypedPayload::new(double);
        let err = payload.execute(br#"{"arguments":{"x":-1}}"#).unwrap_err();
        assert!(matches!(err, PayloadError::Execution(ref msg) if msg.contains("negative")));
    }

    #[test]
    fn test_unparseable_input() {
        let payload = TypedPayload::new(double);
        let err = payload.execute(b"{}").unwrap_err();
        assert!(matches!(err, PayloadError::InvalidInput(_)));
    }
}
