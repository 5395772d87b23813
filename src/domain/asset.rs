// ==========================================
// 钻井作业计划系统 - 资产领域模型
// ==========================================
// 实体: Field / Platform / Rig / Well / MaintenanceWindow
// 每个实体配套 Draft (创建入参) 与 Patch (部分更新入参)
// id 与 created_at 由服务端分配, 不接受客户端写入
// ==========================================

use crate::domain::types::{
    deserialize_nullable, PlatformStatus, RigKind, RigStatus, WellKind, WellType,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// Field - 油田
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: Uuid,
    pub name: String, // 全局唯一
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDraft {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldPatch {
    pub name: Option<String>,
}

impl Field {
    pub fn from_draft(draft: FieldDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            created_at,
        }
    }

    pub fn apply_patch(&mut self, patch: FieldPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
    }
}

// ==========================================
// Platform - 平台
// ==========================================
// 约束: (field_id, name) 唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: Uuid,
    pub field_id: Uuid,
    pub name: String,
    pub status: PlatformStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformDraft {
    pub field_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub status: PlatformStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlatformPatch {
    pub field_id: Option<Uuid>,
    pub name: Option<String>,
    pub status: Option<PlatformStatus>,
}

impl Platform {
    pub fn from_draft(draft: PlatformDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            field_id: draft.field_id,
            name: draft.name.trim().to_string(),
            status: draft.status,
            created_at,
        }
    }

    pub fn apply_patch(&mut self, patch: PlatformPatch) {
        if let Some(field_id) = patch.field_id {
            self.field_id = field_id;
        }
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

// ==========================================
// Rig - 钻机
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rig {
    pub id: Uuid,
    pub name: String, // 全局唯一
    #[serde(rename = "rig_kind")]
    pub kind: RigKind,
    pub day_rate: f64, // 日费 (>= 0)
    pub status: RigStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RigDraft {
    pub name: String,
    #[serde(default, rename = "rig_kind")]
    pub kind: RigKind,
    #[serde(default)]
    pub day_rate: f64,
    #[serde(default)]
    pub status: RigStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RigPatch {
    pub name: Option<String>,
    #[serde(rename = "rig_kind")]
    pub kind: Option<RigKind>,
    pub day_rate: Option<f64>,
    pub status: Option<RigStatus>,
}

impl Rig {
    pub fn from_draft(draft: RigDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            kind: draft.kind,
            day_rate: draft.day_rate,
            status: draft.status,
            created_at,
        }
    }

    pub fn apply_patch(&mut self, patch: RigPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(day_rate) = patch.day_rate {
            self.day_rate = day_rate;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

// ==========================================
// Well - 井
// ==========================================
// platform_well => 必须挂平台
// exploration_open_location => 不挂平台, 且 lat/lon 必填
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Well {
    pub id: Uuid,
    pub name: String, // 全局唯一
    pub field_id: Uuid,
    pub platform_id: Option<Uuid>,
    #[serde(rename = "well_kind")]
    pub kind: WellKind,
    #[serde(rename = "type")]
    pub well_type: WellType,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellDraft {
    pub name: String,
    pub field_id: Uuid,
    #[serde(default)]
    pub platform_id: Option<Uuid>,
    #[serde(default, rename = "well_kind")]
    pub kind: WellKind,
    #[serde(default, rename = "type")]
    pub well_type: WellType,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WellPatch {
    pub name: Option<String>,
    pub field_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub platform_id: Option<Option<Uuid>>,
    #[serde(rename = "well_kind")]
    pub kind: Option<WellKind>,
    #[serde(rename = "type")]
    pub well_type: Option<WellType>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub lat: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub lon: Option<Option<f64>>,
}

impl Well {
    pub fn from_draft(draft: WellDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            field_id: draft.field_id,
            platform_id: draft.platform_id,
            kind: draft.kind,
            well_type: draft.well_type,
            lat: draft.lat,
            lon: draft.lon,
            created_at,
        }
    }

    pub fn apply_patch(&mut self, patch: WellPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(field_id) = patch.field_id {
            self.field_id = field_id;
        }
        if let Some(platform_id) = patch.platform_id {
            self.platform_id = platform_id;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(well_type) = patch.well_type {
            self.well_type = well_type;
        }
        if let Some(lat) = patch.lat {
            self.lat = lat;
        }
        if let Some(lon) = patch.lon {
            self.lon = lon;
        }
    }
}

// ==========================================
// MaintenanceWindow - 平台检修窗口
// ==========================================
// 闭区间 [start_date, end_date], 同一平台的窗口互不重叠
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    pub id: Uuid,
    pub platform_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceWindowDraft {
    pub platform_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MaintenanceWindowPatch {
    pub platform_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
}

impl MaintenanceWindow {
    pub fn from_draft(draft: MaintenanceWindowDraft, id: Uuid, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            platform_id: draft.platform_id,
            start_date: draft.start_date,
            end_date: draft.end_date,
            reason: draft.reason,
            created_at,
        }
    }

    pub fn apply_patch(&mut self, patch: MaintenanceWindowPatch) {
        if let Some(platform_id) = patch.platform_id {
            self.platform_id = platform_id;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(reason) = patch.reason {
            self.reason = reason;
        }
    }
}
