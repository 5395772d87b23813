// ==========================================
// 钻井作业计划系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 作业计划数据与校验层 (实体 CRUD + 校验 + 查询 + 批量导入)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 校验规则与指标计算
pub mod engine;

// 导入层 - 导出目录批量导入
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AuditAction, CalcRunStatus, CampaignType, PlatformStatus, ProjectStatus, ProjectType,
    RigKind, RigStatus, ScenarioStatus, WellKind, WellType,
};

// 领域实体
pub use domain::{
    AuditLog, CalcRun, Campaign, CampaignProject, EntityKind, Field, FieldErrors,
    MaintenanceWindow, Platform, Project, Record, Rig, Scenario, Well,
};

// 存储
pub use repository::{MemoryStore, SqliteStore, Store};

// API
pub use api::{ApiError, ApiResult, CampaignApi, ListQuery, Page};

// 导入
pub use importer::{BulkLoader, DumpLoader, LoadMode, LoadReport};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "钻井作业计划系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
