// ==========================================
// 钻井作业计划系统 - 审计日志查询
// ==========================================
// 审计日志只读: 由 crud 写入, 这里只提供列表查询字段
// 默认按时间倒序, 同一时刻按 id 倒序
// ==========================================

use crate::api::query::{Listable, NameIndex, SortKey};
use crate::domain::AuditLog;

impl Listable for AuditLog {
    const SEARCH_FIELDS: &'static [&'static str] = &["actor", "entity", "action"];
    const ORDERING_FIELDS: &'static [&'static str] = &["at", "id"];
    const DEFAULT_ORDERING: &'static [&'static str] = &["-at", "-id"];
    const FILTER_FIELDS: &'static [&'static str] = &["entity", "entity_id", "action", "actor"];

    fn search_value(&self, field: &str, _names: &NameIndex) -> Option<String> {
        match field {
            "actor" => self.actor.clone(),
            "entity" => Some(self.entity.to_string()),
            "action" => Some(self.action.to_string()),
            _ => None,
        }
    }

    fn sort_key(&self, field: &str, _names: &NameIndex) -> SortKey {
        match field {
            "at" => SortKey::DateTime(self.at),
            "id" => SortKey::Number(self.id as f64),
            _ => SortKey::Missing,
        }
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "entity" => Some(self.entity.to_string()),
            "entity_id" => Some(self.entity_id.to_string()),
            "action" => Some(self.action.to_string()),
            "actor" => self.actor.clone(),
            _ => None,
        }
    }
}
