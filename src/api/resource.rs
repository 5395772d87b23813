// ==========================================
// 钻井作业计划系统 - 资源抽象
// ==========================================
// Resource: 可通过服务层增删改查的实体
// 校验分两类:
//   errors    → ApiError::Validation (字段/跨字段/引用存在性)
//   conflicts → ApiError::Conflict (唯一性/重叠)
// 两类同时存在时合并为 Validation, 一次返回全部问题
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::query::Listable;
use crate::domain::{Entity, FieldErrors};
use crate::repository::StoreTx;
use chrono::NaiveDateTime;
use uuid::Uuid;

// ==========================================
// Resource / Draft / Patch
// ==========================================
pub trait Resource: Entity + Listable {
    /// 创建入参
    type Draft: Send + 'static;
    /// 部分更新入参
    type Patch: Send + 'static;

    fn build(draft: Self::Draft, id: Uuid, created_at: NaiveDateTime) -> Self;

    fn patch(&mut self, patch: Self::Patch);

    /// 事务内完整校验 (字段规则 + 引用 + 唯一性)
    fn validate(&self, tx: &mut dyn StoreTx) -> ApiResult<()>;

    /// 按业务主键查找已有记录 (无 id 的导入行据此 upsert)
    fn find_natural_match(&self, tx: &mut dyn StoreTx) -> ApiResult<Option<Self>>;
}

/// 创建入参 → 目标实体
pub trait Draft: Sized + Send + 'static {
    type Target: Resource<Draft = Self>;
}

/// 部分更新入参 → 目标实体
pub trait Patch: Sized + Send + 'static {
    type Target: Resource<Patch = Self>;
}

// ==========================================
// 校验辅助
// ==========================================

pub fn object_missing(id: Uuid) -> String {
    format!("invalid pk \"{}\" - object does not exist", id)
}

pub fn already_exists(entity: &str, column: &str) -> String {
    format!("{} with this {} already exists", entity, column)
}

pub fn not_unique_together(columns: &[&str]) -> String {
    format!("the fields {} must make a unique set", columns.join(", "))
}

/// 必填引用: 不存在时记录到 key
pub fn require_ref<E: Entity>(
    tx: &mut dyn StoreTx,
    key: &str,
    id: Uuid,
    errors: &mut FieldErrors,
) -> ApiResult<Option<E>> {
    let found = tx.fetch::<E>(id)?;
    if found.is_none() {
        errors.add(key, object_missing(id));
    }
    Ok(found)
}

/// 可选引用: 为空时跳过
pub fn optional_ref<E: Entity>(
    tx: &mut dyn StoreTx,
    key: &str,
    id: Option<Uuid>,
    errors: &mut FieldErrors,
) -> ApiResult<Option<E>> {
    match id {
        Some(id) => require_ref(tx, key, id, errors),
        None => Ok(None),
    }
}

/// candidates 中除自身外是否存在满足 same_key 的记录
pub fn has_duplicate<E: Entity>(me: &E, candidates: &[E], same_key: impl Fn(&E) -> bool) -> bool {
    candidates
        .iter()
        .any(|other| other.id() != me.id() && same_key(other))
}

/// 汇总两类错误
pub fn finish(mut errors: FieldErrors, conflicts: FieldErrors) -> ApiResult<()> {
    if !errors.is_empty() {
        errors.merge(conflicts);
        return Err(ApiError::Validation(errors));
    }
    if !conflicts.is_empty() {
        return Err(ApiError::Conflict(conflicts));
    }
    Ok(())
}
