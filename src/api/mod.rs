// ==========================================
// 钻井作业计划系统 - API 层
// ==========================================
// 职责: 校验 + 事务化写入 + 列表查询, 供 CLI 与批量导入调用
// ==========================================

pub mod assets;
pub mod audit;
pub mod campaign_api;
pub mod crud;
pub mod error;
pub mod planning;
pub mod query;
pub mod resource;

// 重导出核心类型
pub use campaign_api::CampaignApi;
pub use crud::UpsertOutcome;
pub use error::{ApiError, ApiResult};
pub use query::{ListQuery, Listable, NameIndex, Page, SortKey};
pub use resource::{Draft, Patch, Resource};
