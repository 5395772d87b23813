// ==========================================
// 钻井作业计划系统 - 审计日志领域模型
// ==========================================
// 只追加, 不更新不删除
// 每次成功的 create/update/delete 写入一条, 与业务写入同一事务
// ==========================================

use crate::domain::record::EntityKind;
use crate::domain::types::AuditAction;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ==========================================
// AuditEntry - 待写入的审计记录 (无自增 id)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor: Option<String>, // 操作人
    pub entity: EntityKind,
    pub entity_id: Uuid,
    pub action: AuditAction,
    pub before: Option<Value>, // 变更前快照 (create 为空)
    pub after: Option<Value>,  // 变更后快照 (delete 为空)
    pub at: NaiveDateTime,
}

// ==========================================
// AuditLog - 已持久化的审计记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: i64,
    pub actor: Option<String>,
    pub entity: EntityKind,
    pub entity_id: Uuid,
    pub action: AuditAction,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub at: NaiveDateTime,
}

impl AuditLog {
    pub fn from_entry(id: i64, entry: AuditEntry) -> Self {
        Self {
            id,
            actor: entry.actor,
            entity: entry.entity,
            entity_id: entry.entity_id,
            action: entry.action,
            before: entry.before,
            after: entry.after,
            at: entry.at,
        }
    }
}
