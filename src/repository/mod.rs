// ==========================================
// 钻井作业计划系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供事务化的记录读写接口, 屏蔽存储细节
// 约束: 所有查询使用参数化, 防止 SQL 注入
// ==========================================

pub mod error;
pub mod memory_store;
pub mod sqlite_store;
pub mod store;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use memory_store::MemoryStore;
pub use sqlite_store::SqliteStore;
pub use store::{Store, StoreTx, TxMode};
