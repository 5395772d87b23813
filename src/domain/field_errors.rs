// ==========================================
// 字段级错误集合
// ==========================================
// 键: 字段名, 跨字段/组合键错误使用 "__all__"
// 同一实体的所有错误先聚合, 再一次性返回
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 非字段错误的键名
pub const NON_FIELD_ERRORS: &str = "__all__";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// 构造只含一条错误的集合
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// 合并另一组错误（同字段消息追加）
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 出错字段数
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregates_messages_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("rig", "rig campaign requires a rig");
        errors.add("field", "rig campaign must not set a field");
        errors.add("rig", "second");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("rig").unwrap().len(), 2);
        assert_eq!(
            errors.to_string(),
            "field: rig campaign must not set a field; rig: rig campaign requires a rig; rig: second"
        );
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let errors = FieldErrors::single(NON_FIELD_ERRORS, "duplicate");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({"__all__": ["duplicate"]}));
    }
}
