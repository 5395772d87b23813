// ==========================================
// 钻井作业计划系统 - 导入层
// ==========================================
// 职责: 导出目录批量导入 (CSV / JSON)
// 约束: 整批一个事务, 支持试运行
// ==========================================

// 模块声明
pub mod bulk_loader;
pub mod error;
pub mod file_parser;
pub mod resolver;

// 重导出核心类型
pub use bulk_loader::{BulkLoader, DumpLoader, FileLoadSummary, LoadMode, LoadReport};
pub use error::{ImportError, ImportResult};
pub use file_parser::{parse_content, parse_csv, parse_json, DumpFile, DumpFormat, RawRow};
pub use resolver::{resolve, Resolution, Scope};
