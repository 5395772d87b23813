// ==========================================
// 钻井作业计划系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::settings::{ListSettings, LoaderSettings, Settings};
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 列表分页
    pub const LIST_DEFAULT_PAGE_SIZE: &str = "list.default_page_size";
    pub const LIST_MAX_PAGE_SIZE: &str = "list.max_page_size";

    // 批量导入
    pub const LOADER_ACTOR: &str = "loader.actor";
    pub const LOADER_DEFAULT_SCENARIO_NAME: &str = "loader.default_scenario_name";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 会对传入连接再次应用统一 PRAGMA (幂等), 并确保 config_kv 表存在
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
            crate::repository::sqlite_store::schema::ensure_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值 (存在则覆盖)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 读取并解析配置, 缺失或格式错误时取默认值
    fn get_parsed_or<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr,
    {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误, 使用默认值");
                Ok(default)
            }
        }
    }

    // ===== 分页配置 =====

    pub fn list_settings(&self) -> RepositoryResult<ListSettings> {
        let defaults = ListSettings::default();
        let max_page_size = self
            .get_parsed_or(config_keys::LIST_MAX_PAGE_SIZE, defaults.max_page_size)?
            .max(1);
        let default_page_size = self
            .get_parsed_or(config_keys::LIST_DEFAULT_PAGE_SIZE, defaults.default_page_size)?
            .clamp(1, max_page_size);
        Ok(ListSettings {
            default_page_size,
            max_page_size,
        })
    }

    // ===== 导入配置 =====

    pub fn loader_settings(&self) -> RepositoryResult<LoaderSettings> {
        let defaults = LoaderSettings::default();
        let actor = self
            .get_global_config_value(config_keys::LOADER_ACTOR)?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.actor);
        let default_scenario_name = self
            .get_global_config_value(config_keys::LOADER_DEFAULT_SCENARIO_NAME)?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.default_scenario_name);
        Ok(LoaderSettings {
            actor,
            default_scenario_name,
        })
    }

    /// 加载全部运行时设置
    pub fn load_settings(&self) -> RepositoryResult<Settings> {
        Ok(Settings {
            list: self.list_settings()?,
            loader: self.loader_settings()?,
        })
    }

    // ===== 快照 =====

    /// 获取 global 配置的快照 (JSON 对象, 键有序)
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(serde_json::to_string(&config_map)?)
    }

    /// 从快照恢复 global 配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 快照中的键覆盖现有值, 快照中没有的键保持不变
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> RepositoryResult<usize> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut count = 0;
        for (key, value) in &config_map {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
                params![GLOBAL_SCOPE, key, value],
            )?;
        }
        tx.commit()?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_connection;

    fn manager() -> ConfigManager {
        let conn = open_in_memory_connection().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_empty() {
        let settings = manager().load_settings().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.list.default_page_size, 50);
        assert_eq!(settings.list.max_page_size, 500);
        assert_eq!(settings.loader.actor, "loader");
    }

    #[test]
    fn test_overrides_and_clamping() {
        let cm = manager();
        cm.set_global_config_value(config_keys::LIST_MAX_PAGE_SIZE, "20").unwrap();
        cm.set_global_config_value(config_keys::LIST_DEFAULT_PAGE_SIZE, "100").unwrap();
        cm.set_global_config_value(config_keys::LOADER_ACTOR, "etl").unwrap();

        let settings = cm.load_settings().unwrap();
        assert_eq!(settings.list.max_page_size, 20);
        assert_eq!(settings.list.default_page_size, 20);
        assert_eq!(settings.loader.actor, "etl");
    }

    #[test]
    fn test_malformed_value_falls_back_to_default() {
        let cm = manager();
        cm.set_global_config_value(config_keys::LIST_DEFAULT_PAGE_SIZE, "fifty").unwrap();
        assert_eq!(cm.list_settings().unwrap().default_page_size, 50);
    }

    #[test]
    fn test_snapshot_restore() {
        let source = manager();
        source.set_global_config_value(config_keys::LOADER_ACTOR, "etl").unwrap();
        source
            .set_global_config_value(config_keys::LOADER_DEFAULT_SCENARIO_NAME, "Base")
            .unwrap();
        let snapshot = source.get_config_snapshot().unwrap();

        let target = manager();
        assert_eq!(target.restore_config_from_snapshot(&snapshot).unwrap(), 2);
        assert_eq!(
            target.loader_settings().unwrap(),
            LoaderSettings {
                actor: "etl".to_string(),
                default_scenario_name: "Base".to_string(),
            }
        );
    }
}
