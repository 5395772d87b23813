// ==========================================
// 钻井作业计划系统 - 内存存储后端
// ==========================================
// 一把互斥锁覆盖整个事务: 写事务在副本上执行, 成功提交时整体替换
// 只读事务直接读当前数据
// 每个实例独立, 不使用进程级全局状态
// ==========================================

use crate::domain::{AuditEntry, AuditLog, EntityKind, Record};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::store::{Store, StoreTx, TxMode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct MemoryData {
    tables: HashMap<EntityKind, Vec<Record>>, // 按插入顺序
    audit: Vec<AuditLog>,
    next_audit_id: i64,
}

/// 内存存储
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<MemoryData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn run<T, E, F>(&self, mode: TxMode, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut guard = match self.data.lock() {
            Ok(guard) => guard,
            Err(e) => return Err(RepositoryError::LockError(e.to_string()).into()),
        };

        // 只读事务不复制, 直接在当前数据上执行
        if mode == TxMode::ReadOnly {
            return f(&mut MemoryTx { data: &mut *guard });
        }

        let mut working = guard.clone();
        let result = f(&mut MemoryTx { data: &mut working });

        if result.is_ok() && mode == TxMode::ReadWrite {
            *guard = working;
        }
        result
    }
}

struct MemoryTx<'a> {
    data: &'a mut MemoryData,
}

impl MemoryTx<'_> {
    fn table(&mut self, kind: EntityKind) -> &mut Vec<Record> {
        self.data.tables.entry(kind).or_default()
    }
}

impl StoreTx for MemoryTx<'_> {
    fn get(&mut self, kind: EntityKind, id: Uuid) -> RepositoryResult<Option<Record>> {
        Ok(self.table(kind).iter().find(|r| r.id() == id).cloned())
    }

    fn list(&mut self, kind: EntityKind) -> RepositoryResult<Vec<Record>> {
        Ok(self.table(kind).clone())
    }

    fn list_by_ref(
        &mut self,
        kind: EntityKind,
        column: &str,
        id: Uuid,
    ) -> RepositoryResult<Vec<Record>> {
        Ok(self
            .table(kind)
            .iter()
            .filter(|r| r.reference(column) == Some(id))
            .cloned()
            .collect())
    }

    fn insert(&mut self, record: &Record) -> RepositoryResult<()> {
        let table = self.table(record.kind());
        if table.iter().any(|r| r.id() == record.id()) {
            return Err(RepositoryError::UniqueConstraintViolation(format!(
                "{}.id={}",
                record.kind(),
                record.id()
            )));
        }
        table.push(record.clone());
        Ok(())
    }

    fn update(&mut self, record: &Record) -> RepositoryResult<()> {
        let slot = self
            .table(record.kind())
            .iter_mut()
            .find(|r| r.id() == record.id())
            .ok_or_else(|| RepositoryError::NotFound {
                entity: record.kind().to_string(),
                id: record.id().to_string(),
            })?;
        *slot = record.clone();
        Ok(())
    }

    fn delete(&mut self, kind: EntityKind, id: Uuid) -> RepositoryResult<bool> {
        let table = self.table(kind);
        let before = table.len();
        table.retain(|r| r.id() != id);
        Ok(table.len() != before)
    }

    fn append_audit(&mut self, entry: &AuditEntry) -> RepositoryResult<i64> {
        self.data.next_audit_id += 1;
        let id = self.data.next_audit_id;
        self.data.audit.push(AuditLog::from_entry(id, entry.clone()));
        Ok(id)
    }

    fn list_audit(&mut self) -> RepositoryResult<Vec<AuditLog>> {
        Ok(self.data.audit.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::now_timestamp;
    use crate::domain::{Entity, Field};

    fn field(name: &str) -> Field {
        Field {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now_timestamp(),
        }
    }

    #[test]
    fn test_failed_transaction_leaves_no_state() {
        let store = MemoryStore::new();
        let north = field("North");

        let result: RepositoryResult<()> = store.transaction(|tx| {
            tx.insert(&north.clone().into_record())?;
            Err(RepositoryError::InternalError("abort".to_string()))
        });
        assert!(result.is_err());

        let rows = store
            .read(|tx| tx.fetch_all::<Field>())
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_dry_run_discards_writes() {
        let store = MemoryStore::new();
        let inserted: RepositoryResult<usize> = store.dry_run(|tx| {
            tx.insert(&field("North").into_record())?;
            Ok(tx.list(EntityKind::Field)?.len())
        });
        assert_eq!(inserted.unwrap(), 1);

        let count = store
            .read(|tx| tx.list(EntityKind::Field).map(|rows| rows.len()))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let store = MemoryStore::new();
        let north = field("North");
        let result: RepositoryResult<()> = store.transaction(|tx| {
            tx.insert(&north.clone().into_record())?;
            tx.insert(&north.clone().into_record())
        });
        assert!(matches!(
            result,
            Err(RepositoryError::UniqueConstraintViolation(_))
        ));
    }

    #[test]
    fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store
            .transaction(|tx| tx.insert(&field("North").into_record()))
            .unwrap();
        let rows = other.read(|tx| tx.fetch_all::<Field>()).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_read_sees_committed_state_and_is_isolated_from_dry_run() {
        let store = MemoryStore::new();
        store
            .transaction(|tx| tx.insert(&field("North").into_record()))
            .unwrap();
        let _: RepositoryResult<()> = store.dry_run(|tx| tx.insert(&field("South").into_record()));

        let names: Vec<String> = store
            .read(|tx| tx.fetch_all::<Field>())
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["North"]);
    }
}
