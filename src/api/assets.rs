// ==========================================
// 钻井作业计划系统 - 资产资源
// ==========================================
// 实体: Field / Platform / Rig / Well / MaintenanceWindow
// 职责: 事务内校验规则、业务主键、列表查询字段
// ==========================================

use crate::api::error::ApiResult;
use crate::api::query::{Listable, NameIndex, SortKey};
use crate::api::resource::{
    already_exists, finish, has_duplicate, not_unique_together, optional_ref, require_ref,
    Draft, Patch, Resource,
};
use crate::domain::{
    EntityKind, Field, FieldDraft, FieldErrors, FieldPatch, MaintenanceWindow,
    MaintenanceWindowDraft, MaintenanceWindowPatch, Platform, PlatformDraft, PlatformPatch, Rig,
    RigDraft, RigPatch, Well, WellDraft, WellPatch, NON_FIELD_ERRORS,
};
use crate::engine::validator::{
    check_window_dates, find_overlap, validate_day_rate, validate_name, validate_well,
    MSG_WINDOW_OVERLAP,
};
use crate::repository::StoreTx;
use chrono::NaiveDateTime;
use uuid::Uuid;

pub const MSG_PLATFORM_OUTSIDE_FIELD: &str = "platform does not belong to the well's field";
pub const MSG_PLATFORM_WELLS_IN_OTHER_FIELD: &str = "platform has wells in another field";

// ==========================================
// Field
// ==========================================
impl Resource for Field {
    type Draft = FieldDraft;
    type Patch = FieldPatch;

    fn build(draft: FieldDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Field::from_draft(draft, id, created_at)
    }

    fn patch(&mut self, patch: FieldPatch) {
        self.apply_patch(patch);
    }

    fn validate(&self, tx: &mut dyn StoreTx) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        let mut conflicts = FieldErrors::new();
        validate_name(&self.name, &mut errors);

        let fields = tx.fetch_all::<Field>()?;
        if has_duplicate(self, &fields, |f| f.name == self.name) {
            conflicts.add("name", already_exists("field", "name"));
        }
        finish(errors, conflicts)
    }

    fn find_natural_match(&self, tx: &mut dyn StoreTx) -> ApiResult<Option<Self>> {
        Ok(tx
            .fetch_all::<Field>()?
            .into_iter()
            .find(|f| f.name == self.name))
    }
}

impl Draft for FieldDraft {
    type Target = Field;
}

impl Patch for FieldPatch {
    type Target = Field;
}

impl Listable for Field {
    const SEARCH_FIELDS: &'static [&'static str] = &["name"];
    const ORDERING_FIELDS: &'static [&'static str] = &["name", "created_at"];
    const DEFAULT_ORDERING: &'static [&'static str] = &["name"];
    const FILTER_FIELDS: &'static [&'static str] = &[];

    fn search_value(&self, field: &str, _names: &NameIndex) -> Option<String> {
        match field {
            "name" => Some(self.name.clone()),
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

    fn filter_value(&self, _field: &str) -> Option<String> {
        None
    }
}

// ==========================================
// Platform
// ==========================================
impl Resource for Platform {
    type Draft = PlatformDraft;
    type Patch = PlatformPatch;

    fn build(draft: PlatformDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Platform::from_draft(draft, id, created_at)
    }

    fn patch(&mut self, patch: PlatformPatch) {
        self.apply_patch(patch);
    }

    /// # 规则
    /// - 名称在油田内唯一
    /// - 更换油田时, 平台上已有的井不能留在原油田
    fn validate(&self, tx: &mut dyn StoreTx) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        let mut conflicts = FieldErrors::new();
        validate_name(&self.name, &mut errors);
        require_ref::<Field>(tx, "field", self.field_id, &mut errors)?;

        // 平台上的井必须与平台同属一个油田
        let wells = tx.fetch_by_ref::<Well>("platform_id", self.id)?;
        if wells.iter().any(|w| w.field_id != self.field_id) {
            errors.add("field", MSG_PLATFORM_WELLS_IN_OTHER_FIELD);
        }

        let siblings = tx.fetch_by_ref::<Platform>("field_id", self.field_id)?;
        if has_duplicate(self, &siblings, |p| p.name == self.name) {
            conflicts.add(NON_FIELD_ERRORS, not_unique_together(&["field", "name"]));
        }
        finish(errors, conflicts)
    }

    fn find_natural_match(&self, tx: &mut dyn StoreTx) -> ApiResult<Option<Self>> {
        Ok(tx
            .fetch_by_ref::<Platform>("field_id", self.field_id)?
            .into_iter()
            .find(|p| p.name == self.name))
    }
}

impl Draft for PlatformDraft {
    type Target = Platform;
}

impl Patch for PlatformPatch {
    type Target = Platform;
}

impl Listable for Platform {
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "field__name"];
    const ORDERING_FIELDS: &'static [&'static str] = &["name", "created_at"];
    const DEFAULT_ORDERING: &'static [&'static str] = &["name"];
    const FILTER_FIELDS: &'static [&'static str] = &["field_id", "status"];
    const RELATED: &'static [EntityKind] = &[EntityKind::Field];

    fn search_value(&self, field: &str, names: &NameIndex) -> Option<String> {
        match field {
            "name" => Some(self.name.clone()),
            "field__name" => names.name(Some(self.field_id)).map(str::to_string),
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
            "field_id" => Some(self.field_id.to_string()),
            "status" => Some(self.status.to_string()),
            _ => None,
        }
    }
}

// ==========================================
// Rig
// ==========================================
impl Resource for Rig {
    type Draft = RigDraft;
    type Patch = RigPatch;

    fn build(draft: RigDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Rig::from_draft(draft, id, created_at)
    }

    fn patch(&mut self, patch: RigPatch) {
        self.apply_patch(patch);
    }

    fn validate(&self, tx: &mut dyn StoreTx) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        let mut conflicts = FieldErrors::new();
        validate_name(&self.name, &mut errors);
        validate_day_rate(self.day_rate, &mut errors);

        let rigs = tx.fetch_all::<Rig>()?;
        if has_duplicate(self, &rigs, |r| r.name == self.name) {
            conflicts.add("name", already_exists("rig", "name"));
        }
        finish(errors, conflicts)
    }

    fn find_natural_match(&self, tx: &mut dyn StoreTx) -> ApiResult<Option<Self>> {
        Ok(tx.fetch_all::<Rig>()?.into_iter().find(|r| r.name == self.name))
    }
}

impl Draft for RigDraft {
    type Target = Rig;
}

impl Patch for RigPatch {
    type Target = Rig;
}

impl Listable for Rig {
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "rig_kind", "status"];
    const ORDERING_FIELDS: &'static [&'static str] = &["name", "day_rate", "created_at"];
    const DEFAULT_ORDERING: &'static [&'static str] = &["name"];
    const FILTER_FIELDS: &'static [&'static str] = &["rig_kind", "status"];

    fn search_value(&self, field: &str, _names: &NameIndex) -> Option<String> {
        match field {
            "name" => Some(self.name.clone()),
            "rig_kind" => Some(self.kind.to_string()),
            "status" => Some(self.status.to_string()),
            _ => None,
        }
    }

    fn sort_key(&self, field: &str, _names: &NameIndex) -> SortKey {
        match field {
            "name" => SortKey::text(&self.name),
            "day_rate" => SortKey::Number(self.day_rate),
            "created_at" => SortKey::DateTime(self.created_at),
            _ => SortKey::Missing,
        }
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "rig_kind" => Some(self.kind.to_string()),
            "status" => Some(self.status.to_string()),
            _ => None,
        }
    }
}

// ==========================================
// Well
// ==========================================
impl Resource for Well {
    type Draft = WellDraft;
    type Patch = WellPatch;

    fn build(draft: WellDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Well::from_draft(draft, id, created_at)
    }

    fn patch(&mut self, patch: WellPatch) {
        self.apply_patch(patch);
    }

    /// # 规则
    /// - 井位类别与平台/坐标一致 (engine::validator::validate_well)
    /// - 平台必须属于井所在油田
    /// - 名称全局唯一
    fn validate(&self, tx: &mut dyn StoreTx) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        let mut conflicts = FieldErrors::new();
        validate_name(&self.name, &mut errors);
        errors.merge(validate_well(self));

        require_ref::<Field>(tx, "field", self.field_id, &mut errors)?;
        let platform = optional_ref::<Platform>(tx, "platform", self.platform_id, &mut errors)?;
        if let Some(platform) = platform {
            if platform.field_id != self.field_id {
                errors.add("platform", MSG_PLATFORM_OUTSIDE_FIELD);
            }
        }

        let wells = tx.fetch_all::<Well>()?;
        if has_duplicate(self, &wells, |w| w.name == self.name) {
            conflicts.add("name", already_exists("well", "name"));
        }
        finish(errors, conflicts)
    }

    fn find_natural_match(&self, tx: &mut dyn StoreTx) -> ApiResult<Option<Self>> {
        Ok(tx.fetch_all::<Well>()?.into_iter().find(|w| w.name == self.name))
    }
}

impl Draft for WellDraft {
    type Target = Well;
}

impl Patch for WellPatch {
    type Target = Well;
}

impl Listable for Well {
    const SEARCH_FIELDS: &'static [&'static str] = &[
        "name",
        "field__name",
        "platform__name",
        "well_kind",
        "type",
    ];
    const ORDERING_FIELDS: &'static [&'static str] = &["name", "created_at"];
    const DEFAULT_ORDERING: &'static [&'static str] = &["name"];
    const FILTER_FIELDS: &'static [&'static str] =
        &["field_id", "platform_id", "well_kind", "type"];
    const RELATED: &'static [EntityKind] = &[EntityKind::Field, EntityKind::Platform];

    fn search_value(&self, field: &str, names: &NameIndex) -> Option<String> {
        match field {
            "name" => Some(self.name.clone()),
            "field__name" => names.name(Some(self.field_id)).map(str::to_string),
            "platform__name" => names.name(self.platform_id).map(str::to_string),
            "well_kind" => Some(self.kind.to_string()),
            "type" => Some(self.well_type.to_string()),
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
            "field_id" => Some(self.field_id.to_string()),
            "platform_id" => self.platform_id.map(|id| id.to_string()),
            "well_kind" => Some(self.kind.to_string()),
            "type" => Some(self.well_type.to_string()),
            _ => None,
        }
    }
}

// ==========================================
// MaintenanceWindow
// ==========================================
impl Resource for MaintenanceWindow {
    type Draft = MaintenanceWindowDraft;
    type Patch = MaintenanceWindowPatch;

    fn build(draft: MaintenanceWindowDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        MaintenanceWindow::from_draft(draft, id, created_at)
    }

    fn patch(&mut self, patch: MaintenanceWindowPatch) {
        self.apply_patch(patch);
    }

    /// # 规则
    /// - end_date >= start_date
    /// - 与同平台其他窗口不重叠 (闭区间), 日期顺序有误时不做重叠检查
    fn validate(&self, tx: &mut dyn StoreTx) -> ApiResult<()> {
        let mut errors = check_window_dates(self.start_date, self.end_date);
        let mut conflicts = FieldErrors::new();
        let platform = require_ref::<Platform>(tx, "platform", self.platform_id, &mut errors)?;

        if errors.is_empty() && platform.is_some() {
            let siblings = tx.fetch_by_ref::<MaintenanceWindow>("platform_id", self.platform_id)?;
            if let Some(other) = find_overlap(self, &siblings) {
                tracing::debug!(
                    platform_id = %self.platform_id,
                    conflicting_window = %other.id,
                    "检修窗口重叠"
                );
                conflicts.add("start_date", MSG_WINDOW_OVERLAP);
            }
        }
        finish(errors, conflicts)
    }

    fn find_natural_match(&self, tx: &mut dyn StoreTx) -> ApiResult<Option<Self>> {
        Ok(tx
            .fetch_by_ref::<MaintenanceWindow>("platform_id", self.platform_id)?
            .into_iter()
            .find(|w| w.start_date == self.start_date))
    }
}

impl Draft for MaintenanceWindowDraft {
    type Target = MaintenanceWindow;
}

impl Patch for MaintenanceWindowPatch {
    type Target = MaintenanceWindow;
}

impl Listable for MaintenanceWindow {
    const SEARCH_FIELDS: &'static [&'static str] = &["platform__name", "reason"];
    const ORDERING_FIELDS: &'static [&'static str] = &["start_date", "end_date", "created_at"];
    const DEFAULT_ORDERING: &'static [&'static str] = &["platform__name", "start_date"];
    const FILTER_FIELDS: &'static [&'static str] = &["platform_id"];
    const RELATED: &'static [EntityKind] = &[EntityKind::Platform];

    fn search_value(&self, field: &str, names: &NameIndex) -> Option<String> {
        match field {
            "platform__name" => names.name(Some(self.platform_id)).map(str::to_string),
            "reason" => Some(self.reason.clone()),
            _ => None,
        }
    }

    fn sort_key(&self, field: &str, names: &NameIndex) -> SortKey {
        match field {
            "platform__name" => SortKey::opt_text(names.name(Some(self.platform_id))),
            "start_date" => SortKey::Date(self.start_date),
            "end_date" => SortKey::Date(self.end_date),
            "created_at" => SortKey::DateTime(self.created_at),
            _ => SortKey::Missing,
        }
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "platform_id" => Some(self.platform_id.to_string()),
            _ => None,
        }
    }
}
