use super::rows::{self, columns, from_row, select_sql, to_values};
use super::schema::ensure_schema;
use crate::db::{open_in_memory_connection, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::domain::{AuditEntry, AuditLog, EntityKind, Record};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::store::{Store, StoreTx, TxMode};
use rusqlite::{params, params_from_iter, Connection, TransactionBehavior};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

// ==========================================
// SqliteStore - SQLite 存储
// ==========================================
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// 打开数据库文件并建表
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 内存数据库 (测试用)
    pub fn open_in_memory() -> RepositoryResult<Self> {
        let conn = open_in_memory_connection()
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建, 建表幂等; schema 版本不符只告警
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;

            match read_schema_version(&guard)? {
                Some(v) if v == CURRENT_SCHEMA_VERSION => {}
                other => warn!(
                    found = ?other,
                    expected = CURRENT_SCHEMA_VERSION,
                    "schema_version 与当前代码不一致"
                ),
            }
        }
        Ok(Self { conn })
    }

    /// 共享连接 (供 ConfigManager 复用)
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }
}

impl Store for SqliteStore {
    fn run<T, E, F>(&self, mode: TxMode, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut conn = match self.conn.lock() {
            Ok(guard) => guard,
            Err(e) => return Err(RepositoryError::LockError(e.to_string()).into()),
        };

        // 写事务先拿写锁, 避免"检查-写入"之间被其他连接插入
        let behavior = match mode {
            TxMode::ReadOnly => TransactionBehavior::Deferred,
            TxMode::ReadWrite | TxMode::DryRun => TransactionBehavior::Immediate,
        };
        let tx = conn
            .transaction_with_behavior(behavior)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let value = f(&mut SqliteTx { conn: &tx })?;

        match mode {
            TxMode::ReadWrite => tx
                .commit()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?,
            TxMode::DryRun | TxMode::ReadOnly => tx
                .rollback()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?,
        }
        Ok(value)
    }
}

// ==========================================
// SqliteTx - 事务内操作
// ==========================================
struct SqliteTx<'a> {
    conn: &'a Connection,
}

impl SqliteTx<'_> {
    fn query_records(
        &self,
        kind: EntityKind,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepositoryResult<Vec<Record>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params, |row| from_row(kind, row))?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

impl StoreTx for SqliteTx<'_> {
    fn get(&mut self, kind: EntityKind, id: Uuid) -> RepositoryResult<Option<Record>> {
        let sql = format!("{} WHERE id = ?1", select_sql(kind));
        let mut records = self.query_records(kind, &sql, params![id.to_string()])?;
        Ok(records.pop())
    }

    fn list(&mut self, kind: EntityKind) -> RepositoryResult<Vec<Record>> {
        let sql = format!("{} ORDER BY rowid", select_sql(kind));
        self.query_records(kind, &sql, params![])
    }

    fn list_by_ref(
        &mut self,
        kind: EntityKind,
        column: &str,
        id: Uuid,
    ) -> RepositoryResult<Vec<Record>> {
        // 列名只能来自实体定义, 不拼接外部输入
        if !kind.reference_columns().contains(&column) {
            return Err(RepositoryError::InternalError(format!(
                "{} 没有外键列 {}",
                kind, column
            )));
        }
        let sql = format!("{} WHERE {} = ?1 ORDER BY rowid", select_sql(kind), column);
        self.query_records(kind, &sql, params![id.to_string()])
    }

    fn insert(&mut self, record: &Record) -> RepositoryResult<()> {
        let kind = record.kind();
        let cols = columns(kind);
        let placeholders: Vec<String> = (1..=cols.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            kind.table_name(),
            cols.join(", "),
            placeholders.join(", ")
        );
        self.conn
            .execute(&sql, params_from_iter(to_values(record)))?;
        debug!(entity = %kind, id = %record.id(), "insert");
        Ok(())
    }

    fn update(&mut self, record: &Record) -> RepositoryResult<()> {
        let kind = record.kind();
        let cols = columns(kind);
        // 第 1 列是 id, 作为 WHERE 条件
        let assignments: Vec<String> = cols
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, c)| format!("{} = ?{}", c, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?1",
            kind.table_name(),
            assignments.join(", ")
        );
        let affected = self
            .conn
            .execute(&sql, params_from_iter(to_values(record)))?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: kind.to_string(),
                id: record.id().to_string(),
            });
        }
        debug!(entity = %kind, id = %record.id(), "update");
        Ok(())
    }

    fn delete(&mut self, kind: EntityKind, id: Uuid) -> RepositoryResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", kind.table_name());
        let affected = self.conn.execute(&sql, params![id.to_string()])?;
        debug!(entity = %kind, id = %id, affected, "delete");
        Ok(affected > 0)
    }

    fn append_audit(&mut self, entry: &AuditEntry) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO audit_log (
                actor, entity, entity_id, action, before_json, after_json, at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                entry.actor,
                entry.entity.as_str(),
                entry.entity_id.to_string(),
                entry.action.as_str(),
                entry.before.as_ref().map(|v| v.to_string()),
                entry.after.as_ref().map(|v| v.to_string()),
                entry.at.format(rows::DATETIME_FORMAT).to_string(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_audit(&mut self) -> RepositoryResult<Vec<AuditLog>> {
        let mut stmt = self.conn.prepare_cached(
            r#"
            SELECT id, actor, entity, entity_id, action, before_json, after_json, at
            FROM audit_log
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let entity: String = row.get(2)?;
            let entity_id: String = row.get(3)?;
            let action: String = row.get(4)?;
            let at: String = row.get(7)?;
            Ok(AuditLog {
                id: row.get(0)?,
                actor: row.get(1)?,
                entity: rows::parse_choice(2, &entity)?,
                entity_id: rows::parse_uuid(3, &entity_id)?,
                action: rows::parse_choice(4, &action)?,
                before: rows::parse_opt_json(5, row.get(5)?)?,
                after: rows::parse_opt_json(6, row.get(6)?)?,
                at: rows::parse_datetime(7, &at)?,
            })
        })?;
        let logs = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }
}
