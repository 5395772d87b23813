// ==========================================
// 钻井作业计划系统 - 统一记录模型
// ==========================================
// Record: 所有实体的和类型, 存储层按 EntityKind 分表读写
// Entity: 具体实体与 Record 之间的转换
// 删除策略: EntityKind::dependents() 描述谁引用了我、删除时如何处理
// ==========================================

use crate::domain::asset::{Field, MaintenanceWindow, Platform, Rig, Well};
use crate::domain::planning::{CalcRun, Campaign, CampaignProject, Project, Scenario};
use crate::domain::types::string_enum;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==========================================
// EntityKind - 实体类别
// ==========================================
// 声明顺序即依赖顺序 (父在前), 批量导入按此顺序处理
string_enum! {
    pub enum EntityKind {
        Field => "field",
        Platform => "platform",
        Rig => "rig",
        Well => "well",
        MaintenanceWindow => "maintenance_window",
        Scenario => "scenario",
        Project => "project",
        Campaign => "campaign",
        CampaignProject => "campaign_project",
        CalcRun => "calc_run",
    }
}

/// 被引用记录删除时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade, // 连带删除
    SetNull, // 引用置空
    Restrict, // 存在引用则拒绝删除
}

/// 引用关系: `kind.column` 指向当前实体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependent {
    pub kind: EntityKind,
    pub column: &'static str,
    pub on_delete: OnDelete,
}

const fn dep(kind: EntityKind, column: &'static str, on_delete: OnDelete) -> Dependent {
    Dependent {
        kind,
        column,
        on_delete,
    }
}

// Restrict 排在最前, 先判定能否删除再做级联
const FIELD_DEPENDENTS: &[Dependent] = &[
    dep(EntityKind::Campaign, "field_id", OnDelete::Restrict),
    dep(EntityKind::Platform, "field_id", OnDelete::Cascade),
    dep(EntityKind::Well, "field_id", OnDelete::Cascade),
    dep(EntityKind::Project, "field_id", OnDelete::SetNull),
];
const PLATFORM_DEPENDENTS: &[Dependent] = &[
    dep(EntityKind::Well, "platform_id", OnDelete::Cascade),
    dep(EntityKind::MaintenanceWindow, "platform_id", OnDelete::Cascade),
    dep(EntityKind::Project, "platform_id", OnDelete::SetNull),
];
const RIG_DEPENDENTS: &[Dependent] = &[
    dep(EntityKind::Campaign, "rig_id", OnDelete::Restrict),
    dep(EntityKind::Project, "rig_id", OnDelete::SetNull),
];
const WELL_DEPENDENTS: &[Dependent] = &[dep(EntityKind::Project, "well_id", OnDelete::SetNull)];
const SCENARIO_DEPENDENTS: &[Dependent] = &[
    dep(EntityKind::Campaign, "scenario_id", OnDelete::Cascade),
    dep(EntityKind::CalcRun, "scenario_id", OnDelete::Cascade),
];
const CAMPAIGN_DEPENDENTS: &[Dependent] = &[dep(
    EntityKind::CampaignProject,
    "campaign_id",
    OnDelete::Cascade,
)];
const PROJECT_DEPENDENTS: &[Dependent] = &[dep(
    EntityKind::CampaignProject,
    "project_id",
    OnDelete::Cascade,
)];

impl EntityKind {
    /// SQLite 表名
    pub fn table_name(&self) -> &'static str {
        self.as_str()
    }

    /// 批量导入文件名 (不含扩展名)
    pub fn dump_stem(&self) -> &'static str {
        match self {
            EntityKind::Field => "fields",
            EntityKind::Platform => "platforms",
            EntityKind::Rig => "rigs",
            EntityKind::Well => "wells",
            EntityKind::MaintenanceWindow => "maintenance_windows",
            EntityKind::Scenario => "scenarios",
            EntityKind::Project => "projects",
            EntityKind::Campaign => "campaigns",
            EntityKind::CampaignProject => "campaign_projects",
            EntityKind::CalcRun => "calc_runs",
        }
    }

    /// 引用本实体的 (实体, 列, 删除策略)
    pub fn dependents(&self) -> &'static [Dependent] {
        match self {
            EntityKind::Field => FIELD_DEPENDENTS,
            EntityKind::Platform => PLATFORM_DEPENDENTS,
            EntityKind::Rig => RIG_DEPENDENTS,
            EntityKind::Well => WELL_DEPENDENTS,
            EntityKind::Scenario => SCENARIO_DEPENDENTS,
            EntityKind::Campaign => CAMPAIGN_DEPENDENTS,
            EntityKind::Project => PROJECT_DEPENDENTS,
            EntityKind::MaintenanceWindow | EntityKind::CampaignProject | EntityKind::CalcRun => {
                &[]
            }
        }
    }

    /// 本实体的外键列
    pub fn reference_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Field | EntityKind::Rig | EntityKind::Scenario => &[],
            EntityKind::Platform => &["field_id"],
            EntityKind::Well => &["field_id", "platform_id"],
            EntityKind::MaintenanceWindow => &["platform_id"],
            EntityKind::Project => &["field_id", "platform_id", "well_id", "rig_id"],
            EntityKind::Campaign => &["scenario_id", "rig_id", "field_id"],
            EntityKind::CampaignProject => &["campaign_id", "project_id"],
            EntityKind::CalcRun => &["scenario_id"],
        }
    }
}

// ==========================================
// Record - 统一记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", content = "data", rename_all = "snake_case")]
pub enum Record {
    Field(Field),
    Platform(Platform),
    Rig(Rig),
    Well(Well),
    MaintenanceWindow(MaintenanceWindow),
    Scenario(Scenario),
    Project(Project),
    Campaign(Campaign),
    CampaignProject(CampaignProject),
    CalcRun(CalcRun),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Field(_) => EntityKind::Field,
            Record::Platform(_) => EntityKind::Platform,
            Record::Rig(_) => EntityKind::Rig,
            Record::Well(_) => EntityKind::Well,
            Record::MaintenanceWindow(_) => EntityKind::MaintenanceWindow,
            Record::Scenario(_) => EntityKind::Scenario,
            Record::Project(_) => EntityKind::Project,
            Record::Campaign(_) => EntityKind::Campaign,
            Record::CampaignProject(_) => EntityKind::CampaignProject,
            Record::CalcRun(_) => EntityKind::CalcRun,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Record::Field(r) => r.id,
            Record::Platform(r) => r.id,
            Record::Rig(r) => r.id,
            Record::Well(r) => r.id,
            Record::MaintenanceWindow(r) => r.id,
            Record::Scenario(r) => r.id,
            Record::Project(r) => r.id,
            Record::Campaign(r) => r.id,
            Record::CampaignProject(r) => r.id,
            Record::CalcRun(r) => r.id,
        }
    }

    /// 有名称的实体返回名称
    pub fn name(&self) -> Option<&str> {
        match self {
            Record::Field(r) => Some(&r.name),
            Record::Platform(r) => Some(&r.name),
            Record::Rig(r) => Some(&r.name),
            Record::Well(r) => Some(&r.name),
            Record::Scenario(r) => Some(&r.name),
            Record::Project(r) => Some(&r.name),
            Record::Campaign(r) => Some(&r.name),
            Record::MaintenanceWindow(_) | Record::CampaignProject(_) | Record::CalcRun(_) => None,
        }
    }

    /// 读取外键列的值 (未知列或空值返回 None)
    pub fn reference(&self, column: &str) -> Option<Uuid> {
        match (self, column) {
            (Record::Platform(r), "field_id") => Some(r.field_id),
            (Record::Well(r), "field_id") => Some(r.field_id),
            (Record::Well(r), "platform_id") => r.platform_id,
            (Record::MaintenanceWindow(r), "platform_id") => Some(r.platform_id),
            (Record::Project(r), "field_id") => r.field_id,
            (Record::Project(r), "platform_id") => r.platform_id,
            (Record::Project(r), "well_id") => r.well_id,
            (Record::Project(r), "rig_id") => r.rig_id,
            (Record::Campaign(r), "scenario_id") => Some(r.scenario_id),
            (Record::Campaign(r), "rig_id") => r.rig_id,
            (Record::Campaign(r), "field_id") => r.field_id,
            (Record::CampaignProject(r), "campaign_id") => Some(r.campaign_id),
            (Record::CampaignProject(r), "project_id") => Some(r.project_id),
            (Record::CalcRun(r), "scenario_id") => Some(r.scenario_id),
            _ => None,
        }
    }

    /// 将可空外键置空; 列不可空或未知时返回 false
    pub fn clear_reference(&mut self, column: &str) -> bool {
        let slot = match (self, column) {
            (Record::Well(r), "platform_id") => &mut r.platform_id,
            (Record::Project(r), "field_id") => &mut r.field_id,
            (Record::Project(r), "platform_id") => &mut r.platform_id,
            (Record::Project(r), "well_id") => &mut r.well_id,
            (Record::Project(r), "rig_id") => &mut r.rig_id,
            (Record::Campaign(r), "rig_id") => &mut r.rig_id,
            (Record::Campaign(r), "field_id") => &mut r.field_id,
            _ => return false,
        };
        *slot = None;
        true
    }
}

// ==========================================
// Entity - 具体实体 <-> Record
// ==========================================
pub trait Entity:
    Clone + PartialEq + fmt::Debug + Serialize + Send + Sync + 'static
{
    const KIND: EntityKind;

    fn id(&self) -> Uuid;

    fn created_at(&self) -> NaiveDateTime;

    /// 覆盖 id 与 created_at (upsert 命中已有记录时沿用其身份)
    fn set_identity(&mut self, id: Uuid, created_at: NaiveDateTime);

    fn into_record(self) -> Record;

    /// 类别不符时返回 None
    fn from_record(record: Record) -> Option<Self>;
}

macro_rules! impl_entity {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl Entity for $ty {
                const KIND: EntityKind = EntityKind::$ty;

                fn id(&self) -> Uuid {
                    self.id
                }

                fn created_at(&self) -> NaiveDateTime {
                    self.created_at
                }

                fn set_identity(&mut self, id: Uuid, created_at: NaiveDateTime) {
                    self.id = id;
                    self.created_at = created_at;
                }

                fn into_record(self) -> Record {
                    Record::$ty(self)
                }

                fn from_record(record: Record) -> Option<Self> {
                    match record {
                        Record::$ty(inner) => Some(inner),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Record {
                fn from(value: $ty) -> Self {
                    Record::$ty(value)
                }
            }
        )+
    };
}

impl_entity!(
    Field,
    Platform,
    Rig,
    Well,
    MaintenanceWindow,
    Scenario,
    Project,
    Campaign,
    CampaignProject,
    CalcRun,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::planning::ProjectDraft;
    use crate::domain::types::now_timestamp;
    use chrono::NaiveDate;

    #[test]
    fn test_dependency_order_matches_declaration() {
        let stems: Vec<&str> = EntityKind::ALL.iter().map(|k| k.dump_stem()).collect();
        assert_eq!(
            stems,
            vec![
                "fields",
                "platforms",
                "rigs",
                "wells",
                "maintenance_windows",
                "scenarios",
                "projects",
                "campaigns",
                "campaign_projects",
                "calc_runs",
            ]
        );
    }

    #[test]
    fn test_every_dependent_column_is_a_reference_column() {
        for kind in EntityKind::ALL {
            for dependent in kind.dependents() {
                assert!(
                    dependent.kind.reference_columns().contains(&dependent.column),
                    "{}.{} 不是外键列",
                    dependent.kind,
                    dependent.column
                );
            }
        }
    }

    #[test]
    fn test_clear_reference_only_for_nullable_columns() {
        let rig_id = Uuid::new_v4();
        let mut draft = ProjectDraft::new(
            "P-1",
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        );
        draft.rig_id = Some(rig_id);
        let mut record =
            Project::from_draft(draft, Uuid::new_v4(), now_timestamp()).into_record();

        assert_eq!(record.reference("rig_id"), Some(rig_id));
        assert!(record.clear_reference("rig_id"));
        assert_eq!(record.reference("rig_id"), None);
        assert!(!record.clear_reference("name"));
    }

    #[test]
    fn test_from_record_rejects_other_kind() {
        let field = Field {
            id: Uuid::new_v4(),
            name: "North".to_string(),
            created_at: now_timestamp(),
        };
        let record = field.clone().into_record();
        assert_eq!(record.kind(), EntityKind::Field);
        assert_eq!(record.name(), Some("North"));
        assert!(Rig::from_record(record.clone()).is_none());
        assert_eq!(Field::from_record(record), Some(field));
    }
}
