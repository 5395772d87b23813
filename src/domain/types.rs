// ==========================================
// 钻井作业计划系统 - 领域类型定义
// ==========================================
// 职责: 实体状态/类别枚举 + 字符串互转
// 存储格式: snake_case (与数据库/导入文件一致)
// ==========================================

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// 枚举取值非法
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("\"{value}\" is not a valid choice (expected one of: {choices})")]
pub struct UnknownVariant {
    pub type_name: &'static str,
    pub value: String,
    pub choices: String,
}

// 生成 Display / FromStr / as_str / ALL，保证数据库、JSON、导入文件三处口径一致
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::domain::types::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err($crate::domain::types::UnknownVariant {
                        type_name: stringify!($name),
                        value: s.to_string(),
                        choices: [$($text),+].join(", "),
                    }),
                }
            }
        }
    };
}

pub(crate) use string_enum;

// ==========================================
// 平台状态 (Platform Status)
// ==========================================
string_enum! {
    pub enum PlatformStatus {
        Operating => "operating",
        Maintenance => "maintenance",
        Shutdown => "shutdown",
    }
}

impl Default for PlatformStatus {
    fn default() -> Self {
        PlatformStatus::Operating
    }
}

// ==========================================
// 钻机类型 (Rig Kind)
// ==========================================
// mmwu: 模块化修井机, hwu: 液压修井机
string_enum! {
    pub enum RigKind {
        Jackup => "jackup",
        Mmwu => "mmwu",
        Hwu => "hwu",
        Other => "other",
    }
}

impl Default for RigKind {
    fn default() -> Self {
        RigKind::Jackup
    }
}

// ==========================================
// 钻机状态 (Rig Status)
// ==========================================
string_enum! {
    pub enum RigStatus {
        Active => "active",
        Standby => "standby",
        Maintenance => "maintenance",
    }
}

impl Default for RigStatus {
    fn default() -> Self {
        RigStatus::Active
    }
}

// ==========================================
// 井位类别 (Well Kind)
// ==========================================
// platform_well: 平台井 (必须挂平台)
// exploration_open_location: 探井开放井位 (不挂平台, 必须有坐标)
string_enum! {
    pub enum WellKind {
        PlatformWell => "platform_well",
        ExplorationOpenLocation => "exploration_open_location",
    }
}

impl Default for WellKind {
    fn default() -> Self {
        WellKind::PlatformWell
    }
}

// ==========================================
// 井型 (Well Type)
// ==========================================
string_enum! {
    pub enum WellType {
        Exploration => "exploration",
        Development => "development",
    }
}

impl Default for WellType {
    fn default() -> Self {
        WellType::Development
    }
}

// ==========================================
// 方案状态 (Scenario Status)
// ==========================================
string_enum! {
    pub enum ScenarioStatus {
        Draft => "draft",
        Approved => "approved",
        Archived => "archived",
    }
}

impl Default for ScenarioStatus {
    fn default() -> Self {
        ScenarioStatus::Draft
    }
}

// ==========================================
// 作业类型 (Project Type)
// ==========================================
string_enum! {
    pub enum ProjectType {
        Drilling => "drilling",
        Workover => "workover",
        PlugAndAbandon => "plug_and_abandon",
        Fracturing => "fracturing",
        PlatformService => "platform_service",
        Uwild => "uwild",
        RigOverhaul => "rig_overhaul",
        Other => "other",
    }
}

impl Default for ProjectType {
    fn default() -> Self {
        ProjectType::Other
    }
}

// ==========================================
// 作业状态 (Project Status)
// ==========================================
string_enum! {
    pub enum ProjectStatus {
        Planned => "planned",
        InProgress => "in_progress",
        Complete => "complete",
        OnHold => "on_hold",
        Canceled => "canceled",
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Planned
    }
}

// ==========================================
// 作业批次类型 (Campaign Type)
// ==========================================
// rig_campaign: 按钻机组织; field_operations: 按油田组织
string_enum! {
    pub enum CampaignType {
        RigCampaign => "rig_campaign",
        FieldOperations => "field_operations",
    }
}

impl Default for CampaignType {
    fn default() -> Self {
        CampaignType::RigCampaign
    }
}

// ==========================================
// 计算任务状态 (CalcRun Status)
// ==========================================
string_enum! {
    pub enum CalcRunStatus {
        Pending => "pending",
        Running => "running",
        Success => "success",
        Failed => "failed",
    }
}

impl Default for CalcRunStatus {
    fn default() -> Self {
        CalcRunStatus::Pending
    }
}

// ==========================================
// 审计动作 (Audit Action)
// ==========================================
string_enum! {
    pub enum AuditAction {
        Create => "create",
        Update => "update",
        Delete => "delete",
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 写入时刻（UTC，无时区）
pub fn now_timestamp() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// 部分更新中的可空字段: 缺省 = None, 显式 null = Some(None)
///
/// 搭配 `#[serde(default, deserialize_with = "deserialize_nullable")]` 使用
pub fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// JSON 字段默认值 `{}`
pub fn empty_json_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_accepts_case_and_whitespace() {
        assert_eq!(
            " Platform_Well ".parse::<WellKind>().unwrap(),
            WellKind::PlatformWell
        );
        assert_eq!("ON_HOLD".parse::<ProjectStatus>().unwrap(), ProjectStatus::OnHold);
    }

    #[test]
    fn test_from_str_rejects_unknown_value() {
        let err = "semisub".parse::<RigKind>().unwrap_err();
        assert_eq!(err.type_name, "RigKind");
        assert!(err.to_string().contains("jackup, mmwu, hwu, other"));
    }

    #[test]
    fn test_serde_uses_snake_case_text() {
        let json = serde_json::to_string(&ProjectType::PlugAndAbandon).unwrap();
        assert_eq!(json, "\"plug_and_abandon\"");

        let parsed: CampaignType = serde_json::from_str("\"field_operations\"").unwrap();
        assert_eq!(parsed, CampaignType::FieldOperations);
        assert_eq!(parsed.to_string(), "field_operations");
    }

    #[test]
    fn test_project_type_has_eight_values() {
        assert_eq!(ProjectType::ALL.len(), 8);
    }
}
