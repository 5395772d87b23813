// ==========================================
// SQLite 行映射
// ==========================================
// UUID / 日期 / 枚举 以 TEXT 存储, JSON 以序列化文本存储
// columns() 的顺序即 from_row / to_values 的读写顺序
// ==========================================

use crate::domain::types::UnknownVariant;
use crate::domain::{
    CalcRun, Campaign, CampaignProject, EntityKind, Field, MaintenanceWindow, Platform, Project,
    Record, Rig, Scenario, Well,
};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, Type, Value as SqlValue};
use rusqlite::Row;
use std::str::FromStr;
use uuid::Uuid;

pub(super) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub(super) fn columns(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Field => &["id", "name", "created_at"],
        EntityKind::Platform => &["id", "field_id", "name", "status", "created_at"],
        EntityKind::Rig => &["id", "name", "rig_kind", "day_rate", "status", "created_at"],
        EntityKind::Well => &[
            "id",
            "name",
            "field_id",
            "platform_id",
            "well_kind",
            "well_type",
            "lat",
            "lon",
            "created_at",
        ],
        EntityKind::MaintenanceWindow => &[
            "id",
            "platform_id",
            "start_date",
            "end_date",
            "reason",
            "created_at",
        ],
        EntityKind::Scenario => &["id", "name", "status", "created_by", "created_at"],
        EntityKind::Project => &[
            "id",
            "name",
            "project_type",
            "field_id",
            "platform_id",
            "well_id",
            "rig_id",
            "status",
            "planned_start",
            "planned_end",
            "actual_start",
            "actual_end",
            "dependencies",
            "extras",
            "created_at",
        ],
        EntityKind::Campaign => &[
            "id",
            "scenario_id",
            "name",
            "campaign_type",
            "rig_id",
            "field_id",
            "created_at",
        ],
        EntityKind::CampaignProject => &["id", "campaign_id", "project_id", "created_at"],
        EntityKind::CalcRun => &[
            "id",
            "scenario_id",
            "status",
            "params",
            "results",
            "created_by",
            "created_at",
            "completed_at",
        ],
    }
}

/// `SELECT <columns> FROM <table>`
pub(super) fn select_sql(kind: EntityKind) -> String {
    format!("SELECT {} FROM {}", columns(kind).join(", "), kind.table_name())
}

// ==========================================
// 读取: Row -> Record
// ==========================================

struct Cols<'a, 'stmt> {
    row: &'a Row<'stmt>,
    idx: usize,
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

impl<'a, 'stmt> Cols<'a, 'stmt> {
    fn new(row: &'a Row<'stmt>) -> Self {
        Self { row, idx: 0 }
    }

    fn raw<T: FromSql>(&mut self) -> rusqlite::Result<T> {
        let value = self.row.get(self.idx)?;
        self.idx += 1;
        Ok(value)
    }

    fn parsed<T, E>(
        &mut self,
        parse: impl FnOnce(&str) -> Result<T, E>,
    ) -> rusqlite::Result<Option<T>>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let idx = self.idx;
        let text: Option<String> = self.raw()?;
        text.map(|t| parse(&t).map_err(|e| conversion_error(idx, e)))
            .transpose()
    }

    fn required<T>(&self, value: Option<T>) -> rusqlite::Result<T> {
        value.ok_or(rusqlite::Error::InvalidColumnType(
            self.idx - 1,
            "NULL".to_string(),
            Type::Null,
        ))
    }

    fn text(&mut self) -> rusqlite::Result<String> {
        self.raw()
    }

    fn opt_text(&mut self) -> rusqlite::Result<Option<String>> {
        self.raw()
    }

    fn real(&mut self) -> rusqlite::Result<f64> {
        self.raw()
    }

    fn opt_real(&mut self) -> rusqlite::Result<Option<f64>> {
        self.raw()
    }

    fn opt_uuid(&mut self) -> rusqlite::Result<Option<Uuid>> {
        self.parsed(Uuid::parse_str)
    }

    fn uuid(&mut self) -> rusqlite::Result<Uuid> {
        let value = self.opt_uuid()?;
        self.required(value)
    }

    fn opt_date(&mut self) -> rusqlite::Result<Option<NaiveDate>> {
        self.parsed(|s| NaiveDate::parse_from_str(s, DATE_FORMAT))
    }

    fn date(&mut self) -> rusqlite::Result<NaiveDate> {
        let value = self.opt_date()?;
        self.required(value)
    }

    fn opt_datetime(&mut self) -> rusqlite::Result<Option<NaiveDateTime>> {
        self.parsed(|s| NaiveDateTime::parse_from_str(s, DATETIME_FORMAT))
    }

    fn datetime(&mut self) -> rusqlite::Result<NaiveDateTime> {
        let value = self.opt_datetime()?;
        self.required(value)
    }

    fn json(&mut self) -> rusqlite::Result<serde_json::Value> {
        let value = self.parsed(|s| serde_json::from_str::<serde_json::Value>(s))?;
        self.required(value)
    }

    fn choice<T>(&mut self) -> rusqlite::Result<T>
    where
        T: FromStr<Err = UnknownVariant>,
    {
        let value = self.parsed(T::from_str)?;
        self.required(value)
    }
}

pub(super) fn from_row(kind: EntityKind, row: &Row<'_>) -> rusqlite::Result<Record> {
    let mut c = Cols::new(row);
    let record = match kind {
        EntityKind::Field => Record::Field(Field {
            id: c.uuid()?,
            name: c.text()?,
            created_at: c.datetime()?,
        }),
        EntityKind::Platform => Record::Platform(Platform {
            id: c.uuid()?,
            field_id: c.uuid()?,
            name: c.text()?,
            status: c.choice()?,
            created_at: c.datetime()?,
        }),
        EntityKind::Rig => Record::Rig(Rig {
            id: c.uuid()?,
            name: c.text()?,
            kind: c.choice()?,
            day_rate: c.real()?,
            status: c.choice()?,
            created_at: c.datetime()?,
        }),
        EntityKind::Well => Record::Well(Well {
            id: c.uuid()?,
            name: c.text()?,
            field_id: c.uuid()?,
            platform_id: c.opt_uuid()?,
            kind: c.choice()?,
            well_type: c.choice()?,
            lat: c.opt_real()?,
            lon: c.opt_real()?,
            created_at: c.datetime()?,
        }),
        EntityKind::MaintenanceWindow => Record::MaintenanceWindow(MaintenanceWindow {
            id: c.uuid()?,
            platform_id: c.uuid()?,
            start_date: c.date()?,
            end_date: c.date()?,
            reason: c.text()?,
            created_at: c.datetime()?,
        }),
        EntityKind::Scenario => Record::Scenario(Scenario {
            id: c.uuid()?,
            name: c.text()?,
            status: c.choice()?,
            created_by: c.opt_text()?,
            created_at: c.datetime()?,
        }),
        EntityKind::Project => Record::Project(Project {
            id: c.uuid()?,
            name: c.text()?,
            project_type: c.choice()?,
            field_id: c.opt_uuid()?,
            platform_id: c.opt_uuid()?,
            well_id: c.opt_uuid()?,
            rig_id: c.opt_uuid()?,
            status: c.choice()?,
            planned_start: c.date()?,
            planned_end: c.date()?,
            actual_start: c.opt_date()?,
            actual_end: c.opt_date()?,
            dependencies: c.json()?,
            extras: c.json()?,
            created_at: c.datetime()?,
        }),
        EntityKind::Campaign => Record::Campaign(Campaign {
            id: c.uuid()?,
            scenario_id: c.uuid()?,
            name: c.text()?,
            campaign_type: c.choice()?,
            rig_id: c.opt_uuid()?,
            field_id: c.opt_uuid()?,
            created_at: c.datetime()?,
        }),
        EntityKind::CampaignProject => Record::CampaignProject(CampaignProject {
            id: c.uuid()?,
            campaign_id: c.uuid()?,
            project_id: c.uuid()?,
            created_at: c.datetime()?,
        }),
        EntityKind::CalcRun => Record::CalcRun(CalcRun {
            id: c.uuid()?,
            scenario_id: c.uuid()?,
            status: c.choice()?,
            params: c.json()?,
            results: c.json()?,
            created_by: c.opt_text()?,
            created_at: c.datetime()?,
            completed_at: c.opt_datetime()?,
        }),
    };
    Ok(record)
}

// ==========================================
// 写入: Record -> 参数列表
// ==========================================

fn v_uuid(id: Uuid) -> SqlValue {
    SqlValue::Text(id.to_string())
}

fn v_text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

fn v_date(d: NaiveDate) -> SqlValue {
    SqlValue::Text(d.format(DATE_FORMAT).to_string())
}

pub(super) fn v_datetime(ts: NaiveDateTime) -> SqlValue {
    SqlValue::Text(ts.format(DATETIME_FORMAT).to_string())
}

pub(super) fn v_json(value: &serde_json::Value) -> SqlValue {
    SqlValue::Text(value.to_string())
}

fn v_opt<T>(value: Option<T>, f: impl FnOnce(T) -> SqlValue) -> SqlValue {
    value.map(f).unwrap_or(SqlValue::Null)
}

pub(super) fn to_values(record: &Record) -> Vec<SqlValue> {
    match record {
        Record::Field(r) => vec![v_uuid(r.id), v_text(&r.name), v_datetime(r.created_at)],
        Record::Platform(r) => vec![
            v_uuid(r.id),
            v_uuid(r.field_id),
            v_text(&r.name),
            v_text(r.status.as_str()),
            v_datetime(r.created_at),
        ],
        Record::Rig(r) => vec![
            v_uuid(r.id),
            v_text(&r.name),
            v_text(r.kind.as_str()),
            SqlValue::Real(r.day_rate),
            v_text(r.status.as_str()),
            v_datetime(r.created_at),
        ],
        Record::Well(r) => vec![
            v_uuid(r.id),
            v_text(&r.name),
            v_uuid(r.field_id),
            v_opt(r.platform_id, v_uuid),
            v_text(r.kind.as_str()),
            v_text(r.well_type.as_str()),
            v_opt(r.lat, SqlValue::Real),
            v_opt(r.lon, SqlValue::Real),
            v_datetime(r.created_at),
        ],
        Record::MaintenanceWindow(r) => vec![
            v_uuid(r.id),
            v_uuid(r.platform_id),
            v_date(r.start_date),
            v_date(r.end_date),
            v_text(&r.reason),
            v_datetime(r.created_at),
        ],
        Record::Scenario(r) => vec![
            v_uuid(r.id),
            v_text(&r.name),
            v_text(r.status.as_str()),
            v_opt(r.created_by.as_deref(), v_text),
            v_datetime(r.created_at),
        ],
        Record::Project(r) => vec![
            v_uuid(r.id),
            v_text(&r.name),
            v_text(r.project_type.as_str()),
            v_opt(r.field_id, v_uuid),
            v_opt(r.platform_id, v_uuid),
            v_opt(r.well_id, v_uuid),
            v_opt(r.rig_id, v_uuid),
            v_text(r.status.as_str()),
            v_date(r.planned_start),
            v_date(r.planned_end),
            v_opt(r.actual_start, v_date),
            v_opt(r.actual_end, v_date),
            v_json(&r.dependencies),
            v_json(&r.extras),
            v_datetime(r.created_at),
        ],
        Record::Campaign(r) => vec![
            v_uuid(r.id),
            v_uuid(r.scenario_id),
            v_text(&r.name),
            v_text(r.campaign_type.as_str()),
            v_opt(r.rig_id, v_uuid),
            v_opt(r.field_id, v_uuid),
            v_datetime(r.created_at),
        ],
        Record::CampaignProject(r) => vec![
            v_uuid(r.id),
            v_uuid(r.campaign_id),
            v_uuid(r.project_id),
            v_datetime(r.created_at),
        ],
        Record::CalcRun(r) => vec![
            v_uuid(r.id),
            v_uuid(r.scenario_id),
            v_text(r.status.as_str()),
            v_json(&r.params),
            v_json(&r.results),
            v_opt(r.created_by.as_deref(), v_text),
            v_datetime(r.created_at),
            v_opt(r.completed_at, v_datetime),
        ],
    }
}

/// 把 TEXT 时间戳解析回来 (审计表使用)
pub(super) fn parse_datetime(idx: usize, text: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT).map_err(|e| conversion_error(idx, e))
}

pub(super) fn parse_uuid(idx: usize, text: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(text).map_err(|e| conversion_error(idx, e))
}

pub(super) fn parse_choice<T>(idx: usize, text: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    T::from_str(text).map_err(|e| conversion_error(idx, e))
}

pub(super) fn parse_opt_json(
    idx: usize,
    text: Option<String>,
) -> rusqlite::Result<Option<serde_json::Value>> {
    text.map(|t| serde_json::from_str(&t).map_err(|e| conversion_error(idx, e)))
        .transpose()
}
