// ==========================================
// 钻井作业计划系统 - 实体校验引擎
// ==========================================
// 职责: 字段与跨字段规则校验
// 输入: 待写入实体 (+ 同平台已有检修窗口)
// 输出: FieldErrors, 为空表示通过
// 红线: 纯函数, 不访问存储; 引用存在性/唯一性由服务层在事务内检查
// ==========================================

use crate::domain::{
    Campaign, CampaignType, FieldErrors, MaintenanceWindow, Project, Well, WellKind,
};
use chrono::NaiveDate;

// ===== 错误消息 =====
pub const MSG_NAME_REQUIRED: &str = "this field may not be blank";
pub const MSG_PLATFORM_REQUIRED: &str = "platform required for a platform well";
pub const MSG_PLATFORM_FORBIDDEN: &str = "exploration open location must not reference a platform";
pub const MSG_LAT_REQUIRED: &str = "lat required for an exploration open location";
pub const MSG_LON_REQUIRED: &str = "lon required for an exploration open location";
pub const MSG_WINDOW_END_BEFORE_START: &str = "end_date must be on or after start_date";
pub const MSG_WINDOW_OVERLAP: &str = "overlaps another maintenance window for this platform";
pub const MSG_PLANNED_END_BEFORE_START: &str = "planned_end must be on or after planned_start";
pub const MSG_DAY_RATE_NEGATIVE: &str = "day_rate must be a non-negative number";
pub const MSG_RIG_REQUIRED: &str = "rig campaign requires a rig";
pub const MSG_RIG_FORBIDDEN: &str = "field operations must not set a rig";
pub const MSG_FIELD_REQUIRED: &str = "field operations require a field";
pub const MSG_FIELD_FORBIDDEN: &str = "rig campaign must not set a field";

/// 名称去空白后不能为空
pub fn validate_name(name: &str, errors: &mut FieldErrors) {
    if name.trim().is_empty() {
        errors.add("name", MSG_NAME_REQUIRED);
    }
}

/// 日费必须为有限的非负数
pub fn validate_day_rate(day_rate: f64, errors: &mut FieldErrors) {
    if !day_rate.is_finite() || day_rate < 0.0 {
        errors.add("day_rate", MSG_DAY_RATE_NEGATIVE);
    }
}

/// 井位类别与平台/坐标一致性
///
/// # 规则
/// - platform_well → platform 必填
/// - exploration_open_location → platform 为空, lat/lon 各自必填
/// - 坐标不做范围校验
pub fn validate_well(well: &Well) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match well.kind {
        WellKind::PlatformWell => {
            if well.platform_id.is_none() {
                errors.add("platform", MSG_PLATFORM_REQUIRED);
            }
        }
        WellKind::ExplorationOpenLocation => {
            if well.platform_id.is_some() {
                errors.add("platform", MSG_PLATFORM_FORBIDDEN);
            }
            if well.lat.is_none() {
                errors.add("lat", MSG_LAT_REQUIRED);
            }
            if well.lon.is_none() {
                errors.add("lon", MSG_LON_REQUIRED);
            }
        }
    }
    errors
}

/// 检修窗口日期顺序
pub fn check_window_dates(start_date: NaiveDate, end_date: NaiveDate) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if end_date < start_date {
        errors.add("end_date", MSG_WINDOW_END_BEFORE_START);
    }
    errors
}

/// 闭区间相交: a.start <= b.end && a.end >= b.start
///
/// 端点相接 (同一天) 视为重叠
pub fn intervals_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// 在同平台已有窗口中查找与 candidate 重叠的一条
///
/// candidate 自身 (相同 id) 与其他平台的窗口不参与比较; O(n)
pub fn find_overlap<'a>(
    candidate: &MaintenanceWindow,
    existing: &'a [MaintenanceWindow],
) -> Option<&'a MaintenanceWindow> {
    existing.iter().find(|w| {
        w.id != candidate.id
            && w.platform_id == candidate.platform_id
            && intervals_overlap(w.start_date, w.end_date, candidate.start_date, candidate.end_date)
    })
}

/// 检修窗口完整校验: 日期顺序 + 重叠
pub fn validate_maintenance_window(
    window: &MaintenanceWindow,
    siblings: &[MaintenanceWindow],
) -> FieldErrors {
    let mut errors = check_window_dates(window.start_date, window.end_date);
    if errors.is_empty() && find_overlap(window, siblings).is_some() {
        errors.add("start_date", MSG_WINDOW_OVERLAP);
    }
    errors
}

/// 项目计划日期顺序
pub fn validate_project_dates(project: &Project) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if project.planned_end < project.planned_start {
        errors.add("planned_end", MSG_PLANNED_END_BEFORE_START);
    }
    errors
}

/// 作业批次类型与目标 (钻机/油田) 一致性, 所有违规一并返回
pub fn validate_campaign_target(campaign: &Campaign) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match campaign.campaign_type {
        CampaignType::RigCampaign => {
            if campaign.rig_id.is_none() {
                errors.add("rig", MSG_RIG_REQUIRED);
            }
            if campaign.field_id.is_some() {
                errors.add("field", MSG_FIELD_FORBIDDEN);
            }
        }
        CampaignType::FieldOperations => {
            if campaign.field_id.is_none() {
                errors.add("field", MSG_FIELD_REQUIRED);
            }
            if campaign.rig_id.is_some() {
                errors.add("rig", MSG_RIG_FORBIDDEN);
            }
        }
    }
    errors
}
