// ==========================================
// 钻井作业计划系统 - 领域模型层
// ==========================================
// 职责: 定义实体、枚举、统一记录与字段错误
// 红线: 不含数据访问逻辑, 不含校验逻辑
// ==========================================

pub mod asset;
pub mod audit_log;
pub mod field_errors;
pub mod planning;
pub mod record;
pub mod types;

// 重导出核心类型
pub use asset::{
    Field, FieldDraft, FieldPatch, MaintenanceWindow, MaintenanceWindowDraft,
    MaintenanceWindowPatch, Platform, PlatformDraft, PlatformPatch, Rig, RigDraft, RigPatch,
    Well, WellDraft, WellPatch,
};
pub use audit_log::{AuditEntry, AuditLog};
pub use field_errors::{FieldErrors, NON_FIELD_ERRORS};
pub use planning::{
    CalcRun, CalcRunDraft, CalcRunPatch, Campaign, CampaignDraft, CampaignPatch,
    CampaignProject, CampaignProjectDraft, CampaignProjectPatch, Project, ProjectDraft,
    ProjectPatch, Scenario, ScenarioDraft, ScenarioPatch,
};
pub use record::{Dependent, Entity, EntityKind, OnDelete, Record};
pub use types::{
    AuditAction, CalcRunStatus, CampaignType, PlatformStatus, ProjectStatus, ProjectType,
    RigKind, RigStatus, ScenarioStatus, UnknownVariant, WellKind, WellType,
};
