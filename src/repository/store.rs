// ==========================================
// 钻井作业计划系统 - 存储抽象
// ==========================================
// Store: 事务入口 (提交 / 试运行 / 只读)
// StoreTx: 事务内的记录读写, 业务层只依赖此接口
// 后端: MemoryStore (测试/嵌入) 与 SqliteStore (持久化)
// ==========================================

use crate::domain::{AuditEntry, AuditLog, Entity, EntityKind, Record};
use crate::repository::error::{RepositoryError, RepositoryResult};
use uuid::Uuid;

/// 事务结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    /// 闭包成功则提交
    ReadWrite,
    /// 完整执行后回滚
    DryRun,
    /// 只读, 结束时回滚
    ReadOnly,
}

// ==========================================
// StoreTx - 事务内操作
// ==========================================
// list / list_by_ref 按插入顺序返回
pub trait StoreTx {
    fn get(&mut self, kind: EntityKind, id: Uuid) -> RepositoryResult<Option<Record>>;

    fn list(&mut self, kind: EntityKind) -> RepositoryResult<Vec<Record>>;

    /// 按外键列筛选
    fn list_by_ref(
        &mut self,
        kind: EntityKind,
        column: &str,
        id: Uuid,
    ) -> RepositoryResult<Vec<Record>>;

    /// id 已存在时返回 UniqueConstraintViolation
    fn insert(&mut self, record: &Record) -> RepositoryResult<()>;

    /// 记录不存在时返回 NotFound
    fn update(&mut self, record: &Record) -> RepositoryResult<()>;

    /// 返回是否删除了记录; 不处理级联
    fn delete(&mut self, kind: EntityKind, id: Uuid) -> RepositoryResult<bool>;

    /// 追加审计记录, 返回自增 id
    fn append_audit(&mut self, entry: &AuditEntry) -> RepositoryResult<i64>;

    fn list_audit(&mut self) -> RepositoryResult<Vec<AuditLog>>;
}

// ===== 类型化读取 =====
impl<'a> dyn StoreTx + 'a {
    pub fn fetch<E: Entity>(&mut self, id: Uuid) -> RepositoryResult<Option<E>> {
        self.get(E::KIND, id)?.map(typed::<E>).transpose()
    }

    pub fn fetch_all<E: Entity>(&mut self) -> RepositoryResult<Vec<E>> {
        self.list(E::KIND)?.into_iter().map(typed::<E>).collect()
    }

    pub fn fetch_by_ref<E: Entity>(&mut self, column: &str, id: Uuid) -> RepositoryResult<Vec<E>> {
        self.list_by_ref(E::KIND, column, id)?
            .into_iter()
            .map(typed::<E>)
            .collect()
    }
}

fn typed<E: Entity>(record: Record) -> RepositoryResult<E> {
    let kind = record.kind();
    E::from_record(record).ok_or_else(|| {
        RepositoryError::InternalError(format!("记录类别不符: 期望 {}, 实际 {}", E::KIND, kind))
    })
}

// ==========================================
// Store - 事务入口
// ==========================================
pub trait Store: Send + Sync {
    /// 在一个事务中执行闭包, 结束方式由 mode 决定
    ///
    /// 闭包返回 Err 时一律回滚
    fn run<T, E, F>(&self, mode: TxMode, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
        E: From<RepositoryError>;

    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        self.run(TxMode::ReadWrite, f)
    }

    /// 执行相同的校验与写入, 最后丢弃
    fn dry_run<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        self.run(TxMode::DryRun, f)
    }

    fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        self.run(TxMode::ReadOnly, f)
    }
}
