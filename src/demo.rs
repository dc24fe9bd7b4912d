//! Demo Service - 一维线性模型 `f = x * w`
//!
//! - request: `{arguments: {x}, parameters: {w}}` -> `{f}`
//! - fit-parameters: `{arguments: {x}, observations: {y}}` -> `{w}`（最小二乘）

use anyhow::ensure;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::application::ServiceRegistry;
use crate::domain::{FitParametersInput, ParameterizedRequestInput};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Features {
    pub x: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Weight {
    pub w: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Targets {
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Prediction {
    pub f: Vec<f64>,
}

pub fn predict(input: ParameterizedRequestInput<Features, Weight>) -> anyhow::Result<Prediction> {
    let w = input.parameters.w;
    Ok(Prediction {
        f: input.arguments.x.iter().map(|x| x * w).collect(),
    })
}

pub fn fit(input: FitParametersInput<Features, Targets>) -> anyhow::Result<Weight> {
    let x = &input.arguments.x;
    let y = &input.observations.y;
    ensure!(
        x.len() == y.len(),
        "x and y must have the same length, got {} and {}",
        x.len(),
        y.len()
    );

    let sxx: f64 = x.iter().map(|v| v * v).sum();
    ensure!(sxx > 0.0, "x must contain at least one non-zero value");
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();

    Ok(Weight { w: sxy / sxx })
}

/// 线性模型服务定义
pub fn registry() -> ServiceRegistry {
    ServiceRegistry::with_fit_parameters(predict, fit)
}
