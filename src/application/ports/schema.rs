//! Schema Port - 载荷结构校验
//!
//! 校验失败的信息按 FastAPI 的格式组织：`{type, loc, msg, input, url}`

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// 错误位置的一个路径段（字段名或数组下标）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocItem {
    Key(String),
    Index(usize),
}

impl From<&str> for LocItem {
    fn from(key: &str) -> Self {
        LocItem::Key(key.to_string())
    }
}

impl From<usize> for LocItem {
    fn from(index: usize) -> Self {
        LocItem::Index(index)
    }
}

/// 单个字段的校验失败
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: String,
    pub loc: Vec<LocItem>,
    pub msg: String,
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url: Option<String>,
}

/// 校验失败，每个失败字段一条
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} validation error(s) for {schema}", .issues.len())]
pub struct ValidationErrors {
    pub schema: String,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    pub fn new(schema: impl Into<String>, issues: Vec<ValidationIssue>) -> Self {
        Self {
            schema: schema.into(),
            issues,
        }
    }
}

/// Schema Port
pub trait SchemaPort: Send + Sync {
    /// 模型名称（用于日志）
    fn name(&self) -> &str;

    /// 校验原始 JSON 字节
    fn validate(&self, raw: &[u8]) -> Result<(), ValidationErrors>;
}
