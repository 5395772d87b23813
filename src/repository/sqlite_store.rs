// ==========================================
// 钻井作业计划系统 - SQLite 存储后端
// ==========================================
// 连接: Arc<Mutex<Connection>>, 同一时刻只有一个事务
// 写事务: BEGIN IMMEDIATE, 校验与写入在同一把写锁内完成
// 红线: Repository 不做业务逻辑, 只做数据映射
// ==========================================

mod backend;
mod rows;
pub(crate) mod schema;


pub use backend::SqliteStore;
