// ==========================================
// 钻井作业计划系统 - 引擎层
// ==========================================
// 职责: 校验规则与指标计算
// 红线: Engine 不拼 SQL, 不访问存储
// ==========================================

pub mod calc;
pub mod validator;

// 重导出核心函数
pub use calc::{compute_costs, compute_duration, compute_npt_pct, estimate_eta};
pub use validator::{
    check_window_dates, find_overlap, intervals_overlap, validate_campaign_target,
    validate_maintenance_window, validate_project_dates, validate_well,
};
