// ==========================================
// 钻井作业计划系统 - 配置层
// ==========================================
// 职责: 运行时设置与数据库路径
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod settings;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use settings::{default_db_path, ListSettings, LoaderSettings, Settings, DB_PATH_ENV};
