//! Serde Schema - 基于类型的结构校验
//!
//! 先按 `schemars` 生成的 JSON Schema 收集全部缺失/类型错误的字段，
//! 再用 `serde_path_to_error` 兜底定位 schema 表达不了的失败（取值范围、自定义反序列化）。

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use serde_path_to_error::Segment;
use std::marker::PhantomData;

use crate::application::ports::{LocItem, SchemaPort, ValidationErrors, ValidationIssue};

/// schema 嵌套上限（防止自引用的 `$ref` 死循环）
const MAX_DEPTH: usize = 128;

/// 以 Rust 类型 `T` 作为 schema 的校验器
pub struct SerdeSchema<T> {
    name: String,
    schema: Value,
    _model: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned + JsonSchema> SerdeSchema<T> {
    pub fn new() -> Self {
        let schema = schemars::schema_for!(T);
        Self {
            name: short_type_name(std::any::type_name::<T>()),
            schema: serde_json::to_value(&schema).unwrap_or(Value::Bool(true)),
            _model: PhantomData,
        }
    }
}

impl<T: DeserializeOwned + JsonSchema> Default for SerdeSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned + JsonSchema> SchemaPort for SerdeSchema<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, raw: &[u8]) -> Result<(), ValidationErrors> {
        let value: Value = serde_json::from_slice(raw).map_err(|e| {
            ValidationErrors::new(
                self.name.clone(),
                vec![ValidationIssue {
                    kind: "json_invalid".to_string(),
                    loc: Vec::new(),
                    msg: format!("Invalid JSON: {}", e),
                    input: Some(Value::String(String::from_utf8_lossy(raw).into_owned())),
                    url: None,
                }],
            )
        })?;

        let mut walker = SchemaWalker {
            defs: self.schema.get("$defs").and_then(Value::as_object),
            issues: Vec::new(),
        };
        walker.walk(&self.schema, &value, &mut Vec::new(), 0);
        if !walker.issues.is_empty() {
            return Err(ValidationErrors::new(self.name.clone(), walker.issues));
        }

        let parsed: Result<T, _> = serde_path_to_error::deserialize(&value);
        match parsed {
            Ok(_) => Ok(()),
            Err(err) => {
                let loc = err
                    .path()
                    .iter()
                    .filter_map(|segment| match segment {
                        Segment::Seq { index } => Some(LocItem::Index(*index)),
                        Segment::Map { key } => Some(LocItem::Key(key.clone())),
                        Segment::Enum { variant } => Some(LocItem::Key(variant.clone())),
                        _ => None,
                    })
                    .collect();
                let issue = issue_at(&value, loc, err.inner().to_string());
                Err(ValidationErrors::new(self.name.clone(), vec![issue]))
            }
        }
    }
}

/// 按 schema 遍历输入，每个失败字段记一条
struct SchemaWalker<'s> {
    defs: Option<&'s Map<String, Value>>,
    issues: Vec<ValidationIssue>,
}

impl<'s> SchemaWalker<'s> {
    fn walk(&mut self, schema: &'s Value, value: &Value, loc: &mut Vec<LocItem>, depth: usize) {
        if depth > MAX_DEPTH {
            return;
        }
        let Some(schema) = self.resolve(schema) else {
            return;
        };

        if let Some(expected) = schema.get("type") {
            if !type_matches(expected, value) {
                self.issues.push(ValidationIssue {
                    kind: "type_error".to_string(),
                    loc: loc.clone(),
                    msg: format!("Input should be a valid {}", type_noun(expected)),
                    input: Some(value.clone()),
                    url: None,
                });
                return;
            }
        }

        if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
            if !allowed.contains(value) {
                let choices: Vec<String> = allowed.iter().map(Value::to_string).collect();
                self.issues.push(ValidationIssue {
                    kind: "enum".to_string(),
                    loc: loc.clone(),
                    msg: format!("Input should be {}", choices.join(" or ")),
                    input: Some(value.clone()),
                    url: None,
                });
                return;
            }
        }

        // #[serde(flatten)] 生成 allOf，各部分作用于同一个值
        if let Some(parts) = schema.get("allOf").and_then(Value::as_array) {
            for part in parts {
                self.walk(part, value, loc, depth + 1);
            }
        }

        match value {
            Value::Object(fields) => self.walk_object(schema, fields, loc, depth),
            Value::Array(items) => {
                if let Some(item_schema) = schema.get("items").filter(|s| s.is_object()) {
                    for (index, item) in items.iter().enumerate() {
                        loc.push(LocItem::Index(index));
                        self.walk(item_schema, item, loc, depth + 1);
                        loc.pop();
                    }
                }
            }
            _ => {}
        }
    }

    fn walk_object(
        &mut self,
        schema: &'s Map<String, Value>,
        fields: &Map<String, Value>,
        loc: &mut Vec<LocItem>,
        depth: usize,
    ) {
        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect::<Vec<_>>())
            .unwrap_or_default();
        for name in required {
            if !fields.contains_key(name) {
                let mut at = loc.clone();
                at.push(LocItem::from(name));
                self.issues.push(ValidationIssue {
                    kind: "missing".to_string(),
                    loc: at,
                    msg: "Field required".to_string(),
                    input: Some(Value::Object(fields.clone())),
                    url: None,
                });
            }
        }

        let properties = schema.get("properties").and_then(Value::as_object);
        let extra = schema.get("additionalProperties").filter(|s| s.is_object());
        for (name, field) in fields {
            let field_schema = properties.and_then(|props| props.get(name)).or(extra);
            if let Some(field_schema) = field_schema {
                loc.push(LocItem::Key(name.clone()));
                self.walk(field_schema, field, loc, depth + 1);
                loc.pop();
            }
        }
    }

    /// 展开 `$ref`，布尔 schema 不做约束
    fn resolve(&self, schema: &'s Value) -> Option<&'s Map<String, Value>> {
        let object = schema.as_object()?;
        match object.get("$ref").and_then(Value::as_str) {
            Some(reference) => {
                let name = reference
                    .strip_prefix("#/$defs/")
                    .or_else(|| reference.strip_prefix("#/definitions/"))?;
                self.defs?.get(name)?.as_object()
            }
            None => Some(object),
        }
    }
}

fn type_matches(expected: &Value, value: &Value) -> bool {
    match expected {
        Value::String(name) => single_type_matches(name, value),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(|name| single_type_matches(name, value)),
        _ => true,
    }
}

fn single_type_matches(name: &str, value: &Value) -> bool {
    match name {
        "null" => value.is_null(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        _ => true,
    }
}

/// 错误信息里的类型名，沿用 pydantic 的叫法
fn type_noun(expected: &Value) -> String {
    let noun = |name: &str| match name {
        "array" => "list".to_string(),
        "object" => "dictionary".to_string(),
        "null" => "None".to_string(),
        other => other.to_string(),
    };
    match expected {
        Value::String(name) => noun(name),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .filter(|name| *name != "null")
            .map(noun)
            .collect::<Vec<_>>()
            .join(" or "),
        other => other.to_string(),
    }
}

/// 把 serde 的错误信息整理为 FastAPI 风格的条目
fn issue_at(root: &Value, mut loc: Vec<LocItem>, message: String) -> ValidationIssue {
    let input = lookup(root, &loc).cloned();

    if let Some(field) = missing_field(&message) {
        loc.push(LocItem::Key(field.to_string()));
        return ValidationIssue {
            kind: "missing".to_string(),
            loc,
            msg: "Field required".to_string(),
            input,
            url: None,
        };
    }

    let kind = if message.starts_with("invalid type") {
        "type_error"
    } else {
        "value_error"
    };
    ValidationIssue {
        kind: kind.to_string(),
        loc,
        msg: message,
        input,
        url: None,
    }
}

/// 解析 "missing field `x`"
fn missing_field(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
}

fn lookup<'a>(root: &'a Value, loc: &[LocItem]) -> Option<&'a Value> {
    loc.iter().try_fold(root, |value, item| match item {
        LocItem::Key(key) => value.get(key.as_str()),
        LocItem::Index(index) => value.get(*index),
    })
}

/// `a::b::Outer<c::Inner>` -> `Outer<Inner>`
fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut token = String::new();
    for ch in full.chars() {
        if matches!(ch, '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&') {
            if let Some(last) = token.rsplit("::").next() {
                out.push_str(last);
            }
            token.clear();
            out.push(ch);
        } else {
            token.push(ch);
        }
    }
    if let Some(last) = token.rsplit("::").next() {
        out.push_str(last);
    }
    out
}
