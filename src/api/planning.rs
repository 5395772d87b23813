// ==========================================
// 钻井作业计划系统 - 计划资源
// ==========================================
// 实体: Scenario / Project / Campaign / CampaignProject / CalcRun
// 职责: 事务内校验规则、业务主键、列表查询字段
// ==========================================

use crate::api::error::ApiResult;
use crate::api::query::{Listable, NameIndex, SortKey};
use crate::api::resource::{
    already_exists, finish, has_duplicate, not_unique_together, optional_ref, require_ref,
    Draft, Patch, Resource,
};
use crate::domain::{
    CalcRun, CalcRunDraft, CalcRunPatch, Campaign, CampaignDraft, CampaignPatch,
    CampaignProject, CampaignProjectDraft, CampaignProjectPatch, EntityKind, Field, FieldErrors,
    Platform, Project, ProjectDraft, ProjectPatch, Rig, Scenario, ScenarioDraft, ScenarioPatch,
    Well, NON_FIELD_ERRORS,
};
use crate::engine::validator::{validate_campaign_target, validate_name, validate_project_dates};
use crate::repository::StoreTx;
use chrono::NaiveDateTime;
use uuid::Uuid;

// ==========================================
// Scenario
// ==========================================
// 名称不要求唯一, 业务主键取同名的第一条
impl Resource for Scenario {
    type Draft = ScenarioDraft;
    type Patch = ScenarioPatch;

    fn build(draft: ScenarioDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Scenario::from_draft(draft, id, created_at)
    }

    fn patch(&mut self, patch: ScenarioPatch) {
        self.apply_patch(patch);
    }

    fn validate(&self, _tx: &mut dyn StoreTx) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        validate_name(&self.name, &mut errors);
        finish(errors, FieldErrors::new())
    }

    fn find_natural_match(&self, tx: &mut dyn StoreTx) -> ApiResult<Option<Self>> {
        Ok(tx
            .fetch_all::<Scenario>()?
            .into_iter()
            .find(|s| s.name == self.name))
    }
}

impl Draft for ScenarioDraft {
    type Target = Scenario;
}

impl Patch for ScenarioPatch {
    type Target = Scenario;
}

impl Listable for Scenario {
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "status", "created_by"];
    const ORDERING_FIELDS: &'static [&'static str] = &["name", "status", "created_at"];
    const DEFAULT_ORDERING: &'static [&'static str] = &["created_at"];
    const FILTER_FIELDS: &'static [&'static str] = &["status"];

    fn search_value(&self, field: &str, _names: &NameIndex) -> Option<String> {
        match field {
            "name" => Some(self.name.clone()),
            "status" => Some(self.status.to_string()),
            "created_by" => self.created_by.clone(),
            _ => None,
        }
    }

    fn sort_key(&self, field: &str, _names: &NameIndex) -> SortKey {
        match field {
            "name" => SortKey::text(&self.name),
            "status" => SortKey::text(self.status.as_str()),
            "created_at" => SortKey::DateTime(self.created_at),
            _ => SortKey::Missing,
        }
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "status" => Some(self.status.to_string()),
            _ => None,
        }
    }
}

// ==========================================
// Project
// ==========================================
impl Resource for Project {
    type Draft = ProjectDraft;
    type Patch = ProjectPatch;

    fn build(draft: ProjectDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Project::from_draft(draft, id, created_at)
    }

    fn patch(&mut self, patch: ProjectPatch) {
        self.apply_patch(patch);
    }

    /// # 规则
    /// - planned_end >= planned_start
    /// - 关联的 field / platform / well / rig 必须存在
    /// - 名称全局唯一
    fn validate(&self, tx: &mut dyn StoreTx) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        let mut conflicts = FieldErrors::new();
        validate_name(&self.name, &mut errors);
        errors.merge(validate_project_dates(self));

        optional_ref::<Field>(tx, "field", self.field_id, &mut errors)?;
        optional_ref::<Platform>(tx, "platform", self.platform_id, &mut errors)?;
        optional_ref::<Well>(tx, "well", self.well_id, &mut errors)?;
        optional_ref::<Rig>(tx, "rig", self.rig_id, &mut errors)?;

        let projects = tx.fetch_all::<Project>()?;
        if has_duplicate(self, &projects, |p| p.name == self.name) {
            conflicts.add("name", already_exists("project", "name"));
        }
        finish(errors, conflicts)
    }

    fn find_natural_match(&self, tx: &mut dyn StoreTx) -> ApiResult<Option<Self>> {
        Ok(tx
            .fetch_all::<Project>()?
            .into_iter()
            .find(|p| p.name == self.name))
    }
}

impl Draft for ProjectDraft {
    type Target = Project;
}

impl Patch for ProjectPatch {
    type Target = Project;
}

impl Listable for Project {
    const SEARCH_FIELDS: &'static [&'static str] = &[
        "name",
        "project_type",
        "status",
        "field__name",
        "platform__name",
        "well__name",
        "rig__name",
    ];
    const ORDERING_FIELDS: &'static [&'static str] =
        &["planned_start", "planned_end", "created_at", "name"];
    const DEFAULT_ORDERING: &'static [&'static str] = &["planned_start"];
    const FILTER_FIELDS: &'static [&'static str] = &[
        "project_type",
        "status",
        "field_id",
        "platform_id",
        "well_id",
        "rig_id",
    ];
    const RELATED: &'static [EntityKind] = &[
        EntityKind::Field,
        EntityKind::Platform,
        EntityKind::Well,
        EntityKind::Rig,
    ];

    fn search_value(&self, field: &str, names: &NameIndex) -> Option<String> {
        match field {
            "name" => Some(self.name.clone()),
            "project_type" => Some(self.project_type.to_string()),
            "status" => Some(self.status.to_string()),
            "field__name" => names.name(self.field_id).map(str::to_string),
            "platform__name" => names.name(self.platform_id).map(str::to_string),
            "well__name" => names.name(self.well_id).map(str::to_string),
            "rig__name" => names.name(self.rig_id).map(str::to_string),
            _ => None,
        }
    }

    fn sort_key(&self, field: &str, _names: &NameIndex) -> SortKey {
        match field {
            "planned_start" => SortKey::Date(self.planned_start),
            "planned_end" => SortKey::Date(self.planned_end),
            "created_at" => SortKey::DateTime(self.created_at),
            "name" => SortKey::text(&self.name),
            _ => SortKey::Missing,
        }
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "project_type" => Some(self.project_type.to_string()),
            "status" => Some(self.status.to_string()),
            "field_id" => self.field_id.map(|id| id.to_string()),
            "platform_id" => self.platform_id.map(|id| id.to_string()),
            "well_id" => self.well_id.map(|id| id.to_string()),
            "rig_id" => self.rig_id.map(|id| id.to_string()),
            _ => None,
        }
    }
}

// ==========================================
// Campaign
// ==========================================
impl Resource for Campaign {
    type Draft = CampaignDraft;
    type Patch = CampaignPatch;

    fn build(draft: CampaignDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Campaign::from_draft(draft, id, created_at)
    }

    fn patch(&mut self, patch: CampaignPatch) {
        self.apply_patch(patch);
    }

    /// # 规则
    /// - rig_campaign: rig 必填, field 为空
    /// - field_operations: field 必填, rig 为空
    /// - scenario 及已设置的 rig / field 必须存在
    /// - 名称全局唯一
    fn validate(&self, tx: &mut dyn StoreTx) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        let mut conflicts = FieldErrors::new();
        validate_name(&self.name, &mut errors);
        errors.merge(validate_campaign_target(self));

        require_ref::<Scenario>(tx, "scenario", self.scenario_id, &mut errors)?;
        optional_ref::<Rig>(tx, "rig", self.rig_id, &mut errors)?;
        optional_ref::<Field>(tx, "field", self.field_id, &mut errors)?;

        let campaigns = tx.fetch_all::<Campaign>()?;
        if has_duplicate(self, &campaigns, |c| c.name == self.name) {
            conflicts.add("name", already_exists("campaign", "name"));
        }
        finish(errors, conflicts)
    }

    fn find_natural_match(&self, tx: &mut dyn StoreTx) -> ApiResult<Option<Self>> {
        Ok(tx
            .fetch_all::<Campaign>()?
            .into_iter()
            .find(|c| c.name == self.name))
    }
}

impl Draft for CampaignDraft {
    type Target = Campaign;
}

impl Patch for CampaignPatch {
    type Target = Campaign;
}

impl Listable for Campaign {
    const SEARCH_FIELDS: &'static [&'static str] = &[
        "name",
        "campaign_type",
        "scenario__name",
        "rig__name",
        "field__name",
    ];
    const ORDERING_FIELDS: &'static [&'static str] = &["name", "created_at"];
    const DEFAULT_ORDERING: &'static [&'static str] = &["name"];
    const FILTER_FIELDS: &'static [&'static str] =
        &["scenario_id", "campaign_type", "rig_id", "field_id"];
    const RELATED: &'static [EntityKind] =
        &[EntityKind::Scenario, EntityKind::Rig, EntityKind::Field];

    fn search_value(&self, field: &str, names: &NameIndex) -> Option<String> {
        match field {
            "name" => Some(self.name.clone()),
            "campaign_type" => Some(self.campaign_type.to_string()),
            "scenario__name" => names.name(Some(self.scenario_id)).map(str::to_string),
            "rig__name" => names.name(self.rig_id).map(str::to_string),
            "field__name" => names.name(self.field_id).map(str::to_string),
            _ => None,
        }
    }

    fn sort_key(&self, field: &str, _names: &NameIndex) -> SortKey {
        match field {
            "name" => SortKey::text(&self.name),
            "created_at" => SortKey::DateTime(self.created_at),
            _ => SortKey::Missing,
        }
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "scenario_id" => Some(self.scenario_id.to_string()),
            "campaign_type" => Some(self.campaign_type.to_string()),
            "rig_id" => self.rig_id.map(|id| id.to_string()),
            "field_id" => self.field_id.map(|id| id.to_string()),
            _ => None,
        }
    }
}

// ==========================================
// CampaignProject
// ==========================================
impl Resource for CampaignProject {
    type Draft = CampaignProjectDraft;
    type Patch = CampaignProjectPatch;

    fn build(draft: CampaignProjectDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        CampaignProject::from_draft(draft, id, created_at)
    }

    fn patch(&mut self, patch: CampaignProjectPatch) {
        self.apply_patch(patch);
    }

    fn validate(&self, tx: &mut dyn StoreTx) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        let mut conflicts = FieldErrors::new();
        require_ref::<Campaign>(tx, "campaign", self.campaign_id, &mut errors)?;
        require_ref::<Project>(tx, "project", self.project_id, &mut errors)?;

        let links = tx.fetch_by_ref::<CampaignProject>("campaign_id", self.campaign_id)?;
        if has_duplicate(self, &links, |l| l.project_id == self.project_id) {
            conflicts.add(NON_FIELD_ERRORS, not_unique_together(&["campaign", "project"]));
        }
        finish(errors, conflicts)
    }

    fn find_natural_match(&self, tx: &mut dyn StoreTx) -> ApiResult<Option<Self>> {
        Ok(tx
            .fetch_by_ref::<CampaignProject>("campaign_id", self.campaign_id)?
            .into_iter()
            .find(|l| l.project_id == self.project_id))
    }
}

impl Draft for CampaignProjectDraft {
    type Target = CampaignProject;
}

impl Patch for CampaignProjectPatch {
    type Target = CampaignProject;
}

impl Listable for CampaignProject {
    const SEARCH_FIELDS: &'static [&'static str] = &["campaign__name", "project__name"];
    const ORDERING_FIELDS: &'static [&'static str] = &["created_at"];
    const DEFAULT_ORDERING: &'static [&'static str] = &[];
    const FILTER_FIELDS: &'static [&'static str] = &["campaign_id", "project_id"];
    const RELATED: &'static [EntityKind] = &[EntityKind::Campaign, EntityKind::Project];

    fn search_value(&self, field: &str, names: &NameIndex) -> Option<String> {
        match field {
            "campaign__name" => names.name(Some(self.campaign_id)).map(str::to_string),
            "project__name" => names.name(Some(self.project_id)).map(str::to_string),
            _ => None,
        }
    }

    fn sort_key(&self, field: &str, _names: &NameIndex) -> SortKey {
        match field {
            "created_at" => SortKey::DateTime(self.created_at),
            _ => SortKey::Missing,
        }
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "campaign_id" => Some(self.campaign_id.to_string()),
            "project_id" => Some(self.project_id.to_string()),
            _ => None,
        }
    }
}

// ==========================================
// CalcRun
// ==========================================
// 无业务主键: 不带 id 的导入行总是新建
impl Resource for CalcRun {
    type Draft = CalcRunDraft;
    type Patch = CalcRunPatch;

    fn build(draft: CalcRunDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        CalcRun::from_draft(draft, id, created_at)
    }

    fn patch(&mut self, patch: CalcRunPatch) {
        self.apply_patch(patch);
    }

    fn validate(&self, tx: &mut dyn StoreTx) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        require_ref::<Scenario>(tx, "scenario", self.scenario_id, &mut errors)?;
        finish(errors, FieldErrors::new())
    }

    fn find_natural_match(&self, _tx: &mut dyn StoreTx) -> ApiResult<Option<Self>> {
        Ok(None)
    }
}

impl Draft for CalcRunDraft {
    type Target = CalcRun;
}

impl Patch for CalcRunPatch {
    type Target = CalcRun;
}

impl Listable for CalcRun {
    const SEARCH_FIELDS: &'static [&'static str] = &["scenario__name", "status", "created_by"];
    const ORDERING_FIELDS: &'static [&'static str] = &["created_at", "completed_at"];
    const DEFAULT_ORDERING: &'static [&'static str] = &["-created_at"];
    const FILTER_FIELDS: &'static [&'static str] = &["scenario_id", "status"];
    const RELATED: &'static [EntityKind] = &[EntityKind::Scenario];

    fn search_value(&self, field: &str, names: &NameIndex) -> Option<String> {
        match field {
            "scenario__name" => names.name(Some(self.scenario_id)).map(str::to_string),
            "status" => Some(self.status.to_string()),
            "created_by" => self.created_by.clone(),
            _ => None,
        }
    }

    fn sort_key(&self, field: &str, _names: &NameIndex) -> SortKey {
        match field {
            "created_at" => SortKey::DateTime(self.created_at),
            "completed_at" => SortKey::opt_datetime(self.completed_at),
            _ => SortKey::Missing,
        }
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "scenario_id" => Some(self.scenario_id.to_string()),
            "status" => Some(self.status.to_string()),
            _ => None,
        }
    }
}
