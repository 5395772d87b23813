// ==========================================
// 钻井作业计划系统 - 计划领域模型
// ==========================================
// 实体: Scenario / Project / Campaign / CampaignProject / CalcRun
// ==========================================

use crate::domain::types::{
    deserialize_nullable, empty_json_object, CalcRunStatus, CampaignType, ProjectStatus,
    ProjectType, ScenarioStatus,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ==========================================
// Scenario - 计划方案
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: Uuid,
    pub name: String,
    pub status: ScenarioStatus,
    pub created_by: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDraft {
    pub name: String,
    #[serde(default)]
    pub status: ScenarioStatus,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScenarioPatch {
    pub name: Option<String>,
    pub status: Option<ScenarioStatus>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub created_by: Option<Option<String>>,
}

impl Scenario {
    pub fn from_draft(draft: ScenarioDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            status: draft.status,
            created_by: draft.created_by,
            created_at,
        }
    }

    pub fn apply_patch(&mut self, patch: ScenarioPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(created_by) = patch.created_by {
            self.created_by = created_by;
        }
    }
}

// ==========================================
// Project - 作业项目
// ==========================================
// 约束: planned_end >= planned_start
// dependencies / extras 为自由 JSON (默认 {})
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String, // 全局唯一
    pub project_type: ProjectType,

    // ===== 可选关联 =====
    pub field_id: Option<Uuid>,
    pub platform_id: Option<Uuid>,
    pub well_id: Option<Uuid>,
    pub rig_id: Option<Uuid>,

    pub status: ProjectStatus,

    // ===== 日期 =====
    pub planned_start: NaiveDate,
    pub planned_end: NaiveDate,
    pub actual_start: Option<NaiveDate>,
    pub actual_end: Option<NaiveDate>,

    pub dependencies: Value,
    pub extras: Value,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    #[serde(default)]
    pub project_type: ProjectType,
    #[serde(default)]
    pub field_id: Option<Uuid>,
    #[serde(default)]
    pub platform_id: Option<Uuid>,
    #[serde(default)]
    pub well_id: Option<Uuid>,
    #[serde(default)]
    pub rig_id: Option<Uuid>,
    #[serde(default)]
    pub status: ProjectStatus,
    pub planned_start: NaiveDate,
    pub planned_end: NaiveDate,
    #[serde(default)]
    pub actual_start: Option<NaiveDate>,
    #[serde(default)]
    pub actual_end: Option<NaiveDate>,
    #[serde(default = "empty_json_object")]
    pub dependencies: Value,
    #[serde(default = "empty_json_object")]
    pub extras: Value,
}

impl ProjectDraft {
    /// 只填必填项, 其余取默认值
    pub fn new(name: impl Into<String>, planned_start: NaiveDate, planned_end: NaiveDate) -> Self {
        Self {
            name: name.into(),
            project_type: ProjectType::default(),
            field_id: None,
            platform_id: None,
            well_id: None,
            rig_id: None,
            status: ProjectStatus::default(),
            planned_start,
            planned_end,
            actual_start: None,
            actual_end: None,
            dependencies: empty_json_object(),
            extras: empty_json_object(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub project_type: Option<ProjectType>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub field_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub platform_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub well_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub rig_id: Option<Option<Uuid>>,
    pub status: Option<ProjectStatus>,
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub actual_start: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub actual_end: Option<Option<NaiveDate>>,
    pub dependencies: Option<Value>,
    pub extras: Option<Value>,
}

impl Project {
    pub fn from_draft(draft: ProjectDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            project_type: draft.project_type,
            field_id: draft.field_id,
            platform_id: draft.platform_id,
            well_id: draft.well_id,
            rig_id: draft.rig_id,
            status: draft.status,
            planned_start: draft.planned_start,
            planned_end: draft.planned_end,
            actual_start: draft.actual_start,
            actual_end: draft.actual_end,
            dependencies: draft.dependencies,
            extras: draft.extras,
            created_at,
        }
    }

    pub fn apply_patch(&mut self, patch: ProjectPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(project_type) = patch.project_type {
            self.project_type = project_type;
        }
        if let Some(field_id) = patch.field_id {
            self.field_id = field_id;
        }
        if let Some(platform_id) = patch.platform_id {
            self.platform_id = platform_id;
        }
        if let Some(well_id) = patch.well_id {
            self.well_id = well_id;
        }
        if let Some(rig_id) = patch.rig_id {
            self.rig_id = rig_id;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(planned_start) = patch.planned_start {
            self.planned_start = planned_start;
        }
        if let Some(planned_end) = patch.planned_end {
            self.planned_end = planned_end;
        }
        if let Some(actual_start) = patch.actual_start {
            self.actual_start = actual_start;
        }
        if let Some(actual_end) = patch.actual_end {
            self.actual_end = actual_end;
        }
        if let Some(dependencies) = patch.dependencies {
            self.dependencies = dependencies;
        }
        if let Some(extras) = patch.extras {
            self.extras = extras;
        }
    }
}

// ==========================================
// Campaign - 作业批次
// ==========================================
// rig_campaign => rig 必填, field 为空
// field_operations => field 必填, rig 为空
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub scenario_id: Uuid,
    pub name: String, // 全局唯一
    pub campaign_type: CampaignType,
    pub rig_id: Option<Uuid>,
    pub field_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignDraft {
    pub scenario_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub campaign_type: CampaignType,
    #[serde(default)]
    pub rig_id: Option<Uuid>,
    #[serde(default)]
    pub field_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CampaignPatch {
    pub scenario_id: Option<Uuid>,
    pub name: Option<String>,
    pub campaign_type: Option<CampaignType>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub rig_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub field_id: Option<Option<Uuid>>,
}

impl Campaign {
    pub fn from_draft(draft: CampaignDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            scenario_id: draft.scenario_id,
            name: draft.name.trim().to_string(),
            campaign_type: draft.campaign_type,
            rig_id: draft.rig_id,
            field_id: draft.field_id,
            created_at,
        }
    }

    pub fn apply_patch(&mut self, patch: CampaignPatch) {
        if let Some(scenario_id) = patch.scenario_id {
            self.scenario_id = scenario_id;
        }
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(campaign_type) = patch.campaign_type {
            self.campaign_type = campaign_type;
        }
        if let Some(rig_id) = patch.rig_id {
            self.rig_id = rig_id;
        }
        if let Some(field_id) = patch.field_id {
            self.field_id = field_id;
        }
    }
}

// ==========================================
// CampaignProject - 批次与项目关联
// ==========================================
// 约束: (campaign_id, project_id) 唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignProject {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub project_id: Uuid,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignProjectDraft {
    pub campaign_id: Uuid,
    pub project_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CampaignProjectPatch {
    pub campaign_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
}

impl CampaignProject {
    pub fn from_draft(draft: CampaignProjectDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            campaign_id: draft.campaign_id,
            project_id: draft.project_id,
            created_at,
        }
    }

    pub fn apply_patch(&mut self, patch: CampaignProjectPatch) {
        if let Some(campaign_id) = patch.campaign_id {
            self.campaign_id = campaign_id;
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = project_id;
        }
    }
}

// ==========================================
// CalcRun - 计算任务记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcRun {
    pub id: Uuid,
    pub scenario_id: Uuid,
    pub status: CalcRunStatus,
    pub params: Value,
    pub results: Value,
    pub created_by: Option<String>,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcRunDraft {
    pub scenario_id: Uuid,
    #[serde(default)]
    pub status: CalcRunStatus,
    #[serde(default = "empty_json_object")]
    pub params: Value,
    #[serde(default = "empty_json_object")]
    pub results: Value,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CalcRunPatch {
    pub scenario_id: Option<Uuid>,
    pub status: Option<CalcRunStatus>,
    pub params: Option<Value>,
    pub results: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub created_by: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub completed_at: Option<Option<NaiveDateTime>>,
}

impl CalcRun {
    pub fn from_draft(draft: CalcRunDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            scenario_id: draft.scenario_id,
            status: draft.status,
            params: draft.params,
            results: draft.results,
            created_by: draft.created_by,
            created_at,
            completed_at: draft.completed_at,
        }
    }

    pub fn apply_patch(&mut self, patch: CalcRunPatch) {
        if let Some(scenario_id) = patch.scenario_id {
            self.scenario_id = scenario_id;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(params) = patch.params {
            self.params = params;
        }
        if let Some(results) = patch.results {
            self.results = results;
        }
        if let Some(created_by) = patch.created_by {
            self.created_by = created_by;
        }
        if let Some(completed_at) = patch.completed_at {
            self.completed_at = completed_at;
        }
    }
}
