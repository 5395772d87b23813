// ==========================================
// 钻井作业计划系统 - 事务内写操作
// ==========================================
// 所有函数都在调用方打开的事务内执行, 失败由调用方回滚
// 每次实际写入追加一条审计日志 (与写入同事务)
// 删除按 EntityKind::dependents() 处理引用:
//   Restrict → Conflict, SetNull → 置空并记 update, Cascade → 递归删除
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::resource::Resource;
use crate::domain::types::now_timestamp;
use crate::domain::{AuditAction, AuditEntry, EntityKind, OnDelete, Record, NON_FIELD_ERRORS};
use crate::repository::StoreTx;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

/// upsert 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

// ==========================================
// 审计
// ==========================================

fn snapshot<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::InternalError(format!("审计快照序列化失败: {}", e)))
}

/// Record 序列化为 {"entity", "data"}, 快照只取 data
fn record_snapshot(record: &Record) -> ApiResult<Value> {
    let mut value = snapshot(record)?;
    Ok(value.get_mut("data").map(Value::take).unwrap_or(Value::Null))
}

fn audit(
    tx: &mut dyn StoreTx,
    actor: Option<&str>,
    entity: EntityKind,
    entity_id: Uuid,
    action: AuditAction,
    before: Option<Value>,
    after: Option<Value>,
) -> ApiResult<()> {
    tx.append_audit(&AuditEntry {
        actor: actor.map(str::to_string),
        entity,
        entity_id,
        action,
        before,
        after,
        at: now_timestamp(),
    })?;
    Ok(())
}

// ==========================================
// 创建
// ==========================================

/// 分配 id 与 created_at 后校验并写入
pub fn create_in<R: Resource>(
    tx: &mut dyn StoreTx,
    draft: R::Draft,
    actor: Option<&str>,
) -> ApiResult<R> {
    let entity = R::build(draft, Uuid::new_v4(), now_timestamp());
    insert_in(tx, entity, actor)
}

/// 按给定身份校验并写入
pub fn insert_in<R: Resource>(
    tx: &mut dyn StoreTx,
    entity: R,
    actor: Option<&str>,
) -> ApiResult<R> {
    entity.validate(tx)?;
    tx.insert(&entity.clone().into_record())?;
    let after = snapshot(&entity)?;
    audit(tx, actor, R::KIND, entity.id(), AuditAction::Create, None, Some(after))?;

    info!(entity = %R::KIND, id = %entity.id(), "记录已创建");
    Ok(entity)
}

// ==========================================
// 更新
// ==========================================

/// 部分更新: 缺省字段保持原值, 然后执行与创建相同的校验
pub fn update_in<R: Resource>(
    tx: &mut dyn StoreTx,
    id: Uuid,
    patch: R::Patch,
    actor: Option<&str>,
) -> ApiResult<R> {
    let current = tx
        .fetch::<R>(id)?
        .ok_or_else(|| ApiError::not_found(R::KIND, id))?;
    let mut updated = current.clone();
    updated.patch(patch);
    replace_in(tx, &current, updated, actor)
}

/// 以 updated 整体替换 current
///
/// # 规则
/// - id 与 created_at 沿用 current
/// - 内容无变化时不写入、不记审计 (重复提交幂等)
pub fn replace_in<R: Resource>(
    tx: &mut dyn StoreTx,
    current: &R,
    mut updated: R,
    actor: Option<&str>,
) -> ApiResult<R> {
    updated.set_identity(current.id(), current.created_at());
    if updated == *current {
        debug!(entity = %R::KIND, id = %current.id(), "内容未变化, 跳过写入");
        return Ok(updated);
    }

    updated.validate(tx)?;
    tx.update(&updated.clone().into_record())?;
    let before = snapshot(current)?;
    let after = snapshot(&updated)?;
    audit(
        tx,
        actor,
        R::KIND,
        updated.id(),
        AuditAction::Update,
        Some(before),
        Some(after),
    )?;

    info!(entity = %R::KIND, id = %updated.id(), "记录已更新");
    Ok(updated)
}

// ==========================================
// Upsert (批量导入)
// ==========================================

/// 插入或按 id / 业务主键更新
///
/// # 参数
/// - id: 显式 id; 为空时按 find_natural_match 查找已有记录
///
/// # 返回
/// - (实体, Created | Updated | Unchanged)
pub fn upsert_in<R: Resource>(
    tx: &mut dyn StoreTx,
    id: Option<Uuid>,
    draft: R::Draft,
    actor: Option<&str>,
) -> ApiResult<(R, UpsertOutcome)> {
    let candidate = R::build(draft, id.unwrap_or_else(Uuid::new_v4), now_timestamp());
    let existing = match id {
        Some(id) => tx.fetch::<R>(id)?,
        None => candidate.find_natural_match(tx)?,
    };

    match existing {
        Some(current) => {
            let updated = replace_in(tx, &current, candidate, actor)?;
            let outcome = if updated == current {
                UpsertOutcome::Unchanged
            } else {
                UpsertOutcome::Updated
            };
            Ok((updated, outcome))
        }
        None => Ok((insert_in(tx, candidate, actor)?, UpsertOutcome::Created)),
    }
}

// ==========================================
// 删除
// ==========================================

/// 删除目标记录并按引用策略处理依赖
pub fn delete_in<R: Resource>(tx: &mut dyn StoreTx, id: Uuid, actor: Option<&str>) -> ApiResult<()> {
    let record = tx
        .get(R::KIND, id)?
        .ok_or_else(|| ApiError::not_found(R::KIND, id))?;
    delete_cascading(tx, record, actor)
}

fn delete_cascading(tx: &mut dyn StoreTx, record: Record, actor: Option<&str>) -> ApiResult<()> {
    let kind = record.kind();
    let id = record.id();
    let dependents = kind.dependents();

    // 1. Restrict: 存在引用则整体拒绝
    for dependent in dependents
        .iter()
        .filter(|d| d.on_delete == OnDelete::Restrict)
    {
        let referencing = tx.list_by_ref(dependent.kind, dependent.column, id)?;
        if !referencing.is_empty() {
            return Err(ApiError::conflict(
                NON_FIELD_ERRORS,
                format!(
                    "cannot delete {}: referenced by {} {} record(s)",
                    kind,
                    referencing.len(),
                    dependent.kind
                ),
            ));
        }
    }

    // 2. SetNull / Cascade
    for dependent in dependents {
        match dependent.on_delete {
            OnDelete::Restrict => {}
            OnDelete::SetNull => {
                for mut child in tx.list_by_ref(dependent.kind, dependent.column, id)? {
                    let before = record_snapshot(&child)?;
                    if child.clear_reference(dependent.column) {
                        tx.update(&child)?;
                        let after = record_snapshot(&child)?;
                        audit(
                            tx,
                            actor,
                            child.kind(),
                            child.id(),
                            AuditAction::Update,
                            Some(before),
                            Some(after),
                        )?;
                    }
                }
            }
            OnDelete::Cascade => {
                for child in tx.list_by_ref(dependent.kind, dependent.column, id)? {
                    delete_cascading(tx, child, actor)?;
                }
            }
        }
    }

    // 3. 删除自身
    let before = record_snapshot(&record)?;
    if !tx.delete(kind, id)? {
        return Err(ApiError::not_found(kind, id));
    }
    audit(tx, actor, kind, id, AuditAction::Delete, Some(before), None)?;

    info!(entity = %kind, id = %id, "记录已删除");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Field, FieldDraft, Platform, PlatformDraft, PlatformStatus};
    use crate::repository::{MemoryStore, Store};

    fn field_draft(name: &str) -> FieldDraft {
        FieldDraft {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_upsert_by_natural_key_is_idempotent() {
        let store = MemoryStore::new();
        let (first, outcome) = store
            .transaction(|tx| upsert_in::<Field>(tx, None, field_draft("North"), Some("loader")))
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);

        let (second, outcome) = store
            .transaction(|tx| upsert_in::<Field>(tx, None, field_draft("North"), Some("loader")))
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Unchanged);
        assert_eq!(second, first);

        let audits = store.read(|tx| tx.list_audit()).unwrap();
        assert_eq!(audits.len(), 1);
    }

    #[test]
    fn test_cascade_writes_audit_for_children() {
        let store = MemoryStore::new();
        let field = store
            .transaction(|tx| create_in::<Field>(tx, field_draft("North"), None))
            .unwrap();
        store
            .transaction(|tx| {
                create_in::<Platform>(
                    tx,
                    PlatformDraft {
                        field_id: field.id,
                        name: "P-1".to_string(),
                        status: PlatformStatus::Operating,
                    },
                    None,
                )
            })
            .unwrap();

        store
            .transaction(|tx| delete_in::<Field>(tx, field.id, Some("ops")))
            .unwrap();

        let (platforms, audits) = store
            .read(|tx| -> ApiResult<_> {
                Ok((tx.fetch_all::<Platform>()?, tx.list_audit()?))
            })
            .unwrap();
        assert!(platforms.is_empty());
        let deletes: Vec<_> = audits
            .iter()
            .filter(|a| a.action == AuditAction::Delete)
            .map(|a| a.entity)
            .collect();
        assert_eq!(deletes, vec![EntityKind::Platform, EntityKind::Field]);
    }
}
