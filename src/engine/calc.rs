// ==========================================
// 钻井作业计划系统 - 指标计算引擎
// ==========================================
// 职责: 工期 / 非生产时间占比 / 费用 / 预计完工日期
// 纯函数, 无存储依赖
// 钻机利用率与整体指标汇总尚未提供
// ==========================================

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// 计算工期 (天)
///
/// # 规则
/// - planned_end < planned_start → 0
/// - 否则为两日期之差 (不含首日)
pub fn compute_duration(planned_start: NaiveDate, planned_end: NaiveDate) -> i64 {
    if planned_end < planned_start {
        return 0;
    }
    (planned_end - planned_start).num_days()
}

/// 计算非生产时间占比 (0.0 - 1.0)
///
/// # 规则
/// - duration_days <= 0 → 0.0
/// - 否则 npt_days / duration_days, 截断到 [0, 1]
pub fn compute_npt_pct(npt_days: f64, duration_days: f64) -> f64 {
    if duration_days <= 0.0 {
        return 0.0;
    }
    (npt_days / duration_days).clamp(0.0, 1.0)
}

/// 计算费用
///
/// # 参数
/// - `day_rate`: 钻机日费, 负值按 0 计
/// - `duration_days`: 工期, 负值按 0 计
/// - `extras`: 额外费用项 (名称 → 金额), 原样累加
pub fn compute_costs(
    day_rate: f64,
    duration_days: i64,
    extras: Option<&BTreeMap<String, f64>>,
) -> f64 {
    let base = duration_days.max(0) as f64 * day_rate.max(0.0);
    let extra_sum: f64 = extras.map(|m| m.values().sum()).unwrap_or(0.0);
    base + extra_sum
}

/// 预计完工日期: 计划结束日期的最大值, 无输入时为 None
pub fn estimate_eta<I>(planned_end_dates: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = NaiveDate>,
{
    planned_end_dates.into_iter().max()
}
