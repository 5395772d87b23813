// ==========================================
// 钻井作业计划系统 - 批量导入
// ==========================================
// 输入: 导出目录, 每个实体一个文件 (<stem>.csv 或 <stem>.json)
// 顺序: EntityKind::ALL (父实体在前)
// 流程: 读取文件 (异步) → 单事务逐行 upsert (阻塞线程) → 提交或试运行回滚
// 规则:
//   - 缺少必需父实体的行跳过并计数
//   - 任一行校验失败 → 整批中止, 错误带文件名与行号
//   - 带 id 的行按 id upsert, 否则按业务主键 upsert
// ==========================================

use crate::api::crud::{self, UpsertOutcome};
use crate::api::resource::Resource;
use crate::config::LoaderSettings;
use crate::domain::types::empty_json_object;
use crate::domain::{
    CalcRun, CalcRunDraft, Campaign, CampaignDraft, CampaignProject, CampaignProjectDraft,
    EntityKind, Field, FieldDraft, MaintenanceWindow, MaintenanceWindowDraft, Platform,
    PlatformDraft, Project, ProjectDraft, Rig, RigDraft, Scenario, ScenarioDraft,
    ScenarioStatus, Well, WellDraft,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{locate, parse_content, RawRow};
use crate::importer::resolver::{resolve, Resolution, Scope};
use crate::repository::{Store, StoreTx, TxMode};
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// 导入模式与报告
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadMode {
    Commit,
    DryRun,
}

impl LoadMode {
    fn tx_mode(&self) -> TxMode {
        match self {
            LoadMode::Commit => TxMode::ReadWrite,
            LoadMode::DryRun => TxMode::DryRun,
        }
    }
}

/// 单个文件的导入统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileLoadSummary {
    pub file_name: String,
    pub loaded: usize, // 成功 upsert 的行 (含未变化)
    pub created: usize,
    pub updated: usize,
    pub skipped: usize, // 父实体无法解析而跳过的行
}

impl FileLoadSummary {
    fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Upserted(o) => {
                self.loaded += 1;
                match o {
                    UpsertOutcome::Created => self.created += 1,
                    UpsertOutcome::Updated => self.updated += 1,
                    UpsertOutcome::Unchanged => {}
                }
            }
            RowOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// 整批导入报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub files: Vec<FileLoadSummary>,
    pub total: usize,
    pub skipped: usize,
    pub dry_run: bool,
}

impl LoadReport {
    pub fn file(&self, file_name: &str) -> Option<&FileLoadSummary> {
        self.files.iter().find(|f| f.file_name == file_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOutcome {
    Upserted(UpsertOutcome),
    Skipped,
}

/// 已读取待导入的文件
struct ParsedFile {
    kind: EntityKind,
    file_name: String,
    rows: Vec<RawRow>,
}

// ==========================================
// DumpLoader Trait
// ==========================================
#[async_trait]
pub trait DumpLoader: Send + Sync {
    /// 导入整个导出目录
    ///
    /// # 参数
    /// - dir: 导出目录
    /// - mode: Commit 提交; DryRun 执行相同校验与写入后回滚
    ///
    /// # 返回
    /// - Ok(LoadReport): 每个文件的行数与总计
    /// - Err: 目录/文件/解析错误, 或首个被拒绝的行 (整批未写入)
    async fn load_dir(&self, dir: &Path, mode: LoadMode) -> ImportResult<LoadReport>;
}

// ==========================================
// BulkLoader
// ==========================================
pub struct BulkLoader<S: Store + 'static> {
    store: Arc<S>,
    settings: LoaderSettings,
}

impl<S: Store + 'static> BulkLoader<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_settings(store, LoaderSettings::default())
    }

    pub fn with_settings(store: Arc<S>, settings: LoaderSettings) -> Self {
        Self { store, settings }
    }

    async fn read_files(&self, dir: &Path) -> ImportResult<Vec<ParsedFile>> {
        let mut files = Vec::new();
        for kind in EntityKind::ALL {
            let Some(dump) = locate(dir, kind.dump_stem()).await? else {
                continue;
            };
            let file_name = dump.file_name();
            let content = tokio::fs::read_to_string(&dump.path).await?;
            let rows = parse_content(dump.format, &file_name, &content)?;
            info!(file = %file_name, rows = rows.len(), "文件解析完成");
            files.push(ParsedFile {
                kind: *kind,
                file_name,
                rows,
            });
        }
        Ok(files)
    }
}

#[async_trait]
impl<S: Store + 'static> DumpLoader for BulkLoader<S> {
    #[instrument(skip(self, dir), fields(dir = %dir.display()))]
    async fn load_dir(&self, dir: &Path, mode: LoadMode) -> ImportResult<LoadReport> {
        let is_dir = tokio::fs::metadata(dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(ImportError::DirectoryNotFound(dir.display().to_string()));
        }

        let files = self.read_files(dir).await?;
        info!(files = files.len(), mode = ?mode, "开始导入");

        let store = Arc::clone(&self.store);
        let settings = self.settings.clone();
        let report = tokio::task::spawn_blocking(move || {
            store.run(mode.tx_mode(), |tx| load_files(tx, &files, &settings, mode))
        })
        .await
        .map_err(|e| ImportError::InternalError(format!("导入任务异常退出: {}", e)))??;

        for file in &report.files {
            info!(
                file = %file.file_name,
                loaded = file.loaded,
                created = file.created,
                updated = file.updated,
                skipped = file.skipped,
                "文件导入完成"
            );
        }
        if report.dry_run {
            warn!(total = report.total, "试运行: 事务已回滚");
        } else {
            info!(total = report.total, skipped = report.skipped, "导入完成");
        }
        Ok(report)
    }
}

// ==========================================
// 事务内导入
// ==========================================

fn load_files(
    tx: &mut dyn StoreTx,
    files: &[ParsedFile],
    settings: &LoaderSettings,
    mode: LoadMode,
) -> ImportResult<LoadReport> {
    let mut report = LoadReport {
        dry_run: mode == LoadMode::DryRun,
        ..LoadReport::default()
    };
    let actor = settings.actor.as_str();

    for file in files {
        let mut summary = FileLoadSummary {
            file_name: file.file_name.clone(),
            ..FileLoadSummary::default()
        };
        for row in &file.rows {
            let outcome = load_row(tx, file.kind, row, settings, actor)?;
            summary.record(outcome);
        }
        report.total += summary.loaded;
        report.skipped += summary.skipped;
        report.files.push(summary);
    }
    Ok(report)
}

fn load_row(
    tx: &mut dyn StoreTx,
    kind: EntityKind,
    row: &RawRow,
    settings: &LoaderSettings,
    actor: &str,
) -> ImportResult<RowOutcome> {
    match kind {
        EntityKind::Field => load_field(tx, row, actor),
        EntityKind::Platform => load_platform(tx, row, actor),
        EntityKind::Rig => load_rig(tx, row, actor),
        EntityKind::Well => load_well(tx, row, actor),
        EntityKind::MaintenanceWindow => load_maintenance_window(tx, row, actor),
        EntityKind::Scenario => load_scenario(tx, row, actor),
        EntityKind::Project => load_project(tx, row, actor),
        EntityKind::Campaign => load_campaign(tx, row, settings, actor),
        EntityKind::CampaignProject => load_campaign_project(tx, row, actor),
        EntityKind::CalcRun => load_calc_run(tx, row, actor),
    }
}

fn upsert<R: Resource>(
    tx: &mut dyn StoreTx,
    row: &RawRow,
    draft: R::Draft,
    actor: &str,
) -> ImportResult<RowOutcome> {
    let id = row.uuid("id")?;
    let (_, outcome) = crud::upsert_in::<R>(tx, id, draft, Some(actor)).map_err(|source| {
        ImportError::RowRejected {
            file: row.file.clone(),
            row: row.row_number,
            source,
        }
    })?;
    Ok(RowOutcome::Upserted(outcome))
}

fn skip(row: &RawRow, reason: &str) -> ImportResult<RowOutcome> {
    warn!(file = %row.file, row = row.row_number, reason = reason, "跳过导入行");
    Ok(RowOutcome::Skipped)
}

/// 可选引用: 给了但找不到时按空处理并告警
fn optional(row: &RawRow, prefix: &str, resolution: Resolution) -> Option<Uuid> {
    if resolution.is_missing() {
        warn!(file = %row.file, row = row.row_number, reference = prefix, "引用无法解析, 按空处理");
    }
    resolution.id()
}

// ===== 资产 =====

fn load_field(tx: &mut dyn StoreTx, row: &RawRow, actor: &str) -> ImportResult<RowOutcome> {
    let draft = FieldDraft {
        name: row.text("name").unwrap_or_default(),
    };
    upsert::<Field>(tx, row, draft, actor)
}

fn load_platform(tx: &mut dyn StoreTx, row: &RawRow, actor: &str) -> ImportResult<RowOutcome> {
    let Some(field_id) = resolve(tx, row, EntityKind::Field, "field", None)?.id() else {
        return skip(row, "field not found");
    };
    let draft = PlatformDraft {
        field_id,
        name: row.text("name").unwrap_or_default(),
        status: row.choice("status")?.unwrap_or_default(),
    };
    upsert::<Platform>(tx, row, draft, actor)
}

fn load_rig(tx: &mut dyn StoreTx, row: &RawRow, actor: &str) -> ImportResult<RowOutcome> {
    let draft = RigDraft {
        name: row.text("name").unwrap_or_default(),
        kind: row.choice("rig_kind")?.unwrap_or_default(),
        day_rate: row.decimal("day_rate")?.unwrap_or(0.0),
        status: row.choice("status")?.unwrap_or_default(),
    };
    upsert::<Rig>(tx, row, draft, actor)
}

fn load_well(tx: &mut dyn StoreTx, row: &RawRow, actor: &str) -> ImportResult<RowOutcome> {
    let Some(field_id) = resolve(tx, row, EntityKind::Field, "field", None)?.id() else {
        return skip(row, "field not found");
    };
    let platform = resolve(
        tx,
        row,
        EntityKind::Platform,
        "platform",
        Some(Scope::new("field_id", field_id)),
    )?;
    let draft = WellDraft {
        name: row.text("name").unwrap_or_default(),
        field_id,
        platform_id: optional(row, "platform", platform),
        kind: row.choice("well_kind")?.unwrap_or_default(),
        well_type: row.choice("type")?.unwrap_or_default(),
        lat: row.decimal("lat")?,
        lon: row.decimal("lon")?,
    };
    upsert::<Well>(tx, row, draft, actor)
}

fn load_maintenance_window(
    tx: &mut dyn StoreTx,
    row: &RawRow,
    actor: &str,
) -> ImportResult<RowOutcome> {
    // 给了油田时在油田范围内按名称找平台
    let scope_field = resolve(tx, row, EntityKind::Field, "field", None)?.id();
    let scope = scope_field.map(|id| Scope::new("field_id", id));
    let Some(platform_id) = resolve(tx, row, EntityKind::Platform, "platform", scope)?.id() else {
        return skip(row, "platform not found");
    };
    let draft = MaintenanceWindowDraft {
        platform_id,
        start_date: row.required_date("start_date")?,
        end_date: row.required_date("end_date")?,
        reason: row.text("reason").unwrap_or_default(),
    };
    upsert::<MaintenanceWindow>(tx, row, draft, actor)
}

// ===== 计划 =====

fn load_scenario(tx: &mut dyn StoreTx, row: &RawRow, actor: &str) -> ImportResult<RowOutcome> {
    let draft = ScenarioDraft {
        name: row.text("name").unwrap_or_default(),
        status: row.choice("status")?.unwrap_or_default(),
        created_by: row.text("created_by").or_else(|| Some(actor.to_string())),
    };
    upsert::<Scenario>(tx, row, draft, actor)
}

fn load_project(tx: &mut dyn StoreTx, row: &RawRow, actor: &str) -> ImportResult<RowOutcome> {
    let field = resolve(tx, row, EntityKind::Field, "field", None)?;
    let field_id = optional(row, "field", field);
    let field_scope = field_id.map(|id| Scope::new("field_id", id));
    let platform = resolve(tx, row, EntityKind::Platform, "platform", field_scope)?;
    let well = resolve(tx, row, EntityKind::Well, "well", field_scope)?;
    let rig = resolve(tx, row, EntityKind::Rig, "rig", None)?;

    let draft = ProjectDraft {
        name: row.text("name").unwrap_or_default(),
        project_type: row.choice("project_type")?.unwrap_or_default(),
        field_id,
        platform_id: optional(row, "platform", platform),
        well_id: optional(row, "well", well),
        rig_id: optional(row, "rig", rig),
        status: row.choice("status")?.unwrap_or_default(),
        planned_start: row.required_date("planned_start")?,
        planned_end: row.required_date("planned_end")?,
        actual_start: row.date("actual_start")?,
        actual_end: row.date("actual_end")?,
        dependencies: row.json("dependencies").unwrap_or_else(empty_json_object),
        extras: row.json("extras").unwrap_or_else(empty_json_object),
    };
    upsert::<Project>(tx, row, draft, actor)
}

/// 批次缺少方案时: 取第一个方案, 一个都没有则创建默认方案
fn fallback_scenario(
    tx: &mut dyn StoreTx,
    settings: &LoaderSettings,
    actor: &str,
) -> ImportResult<Uuid> {
    if let Some(first) = tx.fetch_all::<Scenario>()?.into_iter().next() {
        return Ok(first.id);
    }
    let draft = ScenarioDraft {
        name: settings.default_scenario_name.clone(),
        status: ScenarioStatus::Draft,
        created_by: Some(actor.to_string()),
    };
    let scenario = crud::create_in::<Scenario>(tx, draft, Some(actor))?;
    info!(scenario_id = %scenario.id, name = %scenario.name, "已创建默认方案");
    Ok(scenario.id)
}

fn load_campaign(
    tx: &mut dyn StoreTx,
    row: &RawRow,
    settings: &LoaderSettings,
    actor: &str,
) -> ImportResult<RowOutcome> {
    let scenario_id = match resolve(tx, row, EntityKind::Scenario, "scenario", None)? {
        Resolution::Found(id) => id,
        other => {
            if other.is_missing() {
                warn!(file = %row.file, row = row.row_number, "方案无法解析, 使用默认方案");
            }
            fallback_scenario(tx, settings, actor)?
        }
    };
    let rig = resolve(tx, row, EntityKind::Rig, "rig", None)?;
    let field = resolve(tx, row, EntityKind::Field, "field", None)?;

    let draft = CampaignDraft {
        scenario_id,
        name: row.text("name").unwrap_or_default(),
        campaign_type: row.choice("campaign_type")?.unwrap_or_default(),
        rig_id: optional(row, "rig", rig),
        field_id: optional(row, "field", field),
    };
    upsert::<Campaign>(tx, row, draft, actor)
}

fn load_campaign_project(
    tx: &mut dyn StoreTx,
    row: &RawRow,
    actor: &str,
) -> ImportResult<RowOutcome> {
    let campaign = resolve(tx, row, EntityKind::Campaign, "campaign", None)?.id();
    let project = resolve(tx, row, EntityKind::Project, "project", None)?.id();
    let (Some(campaign_id), Some(project_id)) = (campaign, project) else {
        return skip(row, "campaign or project not found");
    };
    let draft = CampaignProjectDraft {
        campaign_id,
        project_id,
    };
    upsert::<CampaignProject>(tx, row, draft, actor)
}

fn load_calc_run(tx: &mut dyn StoreTx, row: &RawRow, actor: &str) -> ImportResult<RowOutcome> {
    let scenario_id = match resolve(tx, row, EntityKind::Scenario, "scenario", None)?.id() {
        Some(id) => Some(id),
        None => tx.fetch_all::<Scenario>()?.into_iter().next().map(|s| s.id),
    };
    let Some(scenario_id) = scenario_id else {
        return skip(row, "no scenario available");
    };
    let draft = CalcRunDraft {
        scenario_id,
        status: row.choice("status")?.unwrap_or_default(),
        params: row.json("params").unwrap_or_else(empty_json_object),
        results: row.json("results").unwrap_or_else(empty_json_object),
        created_by: row.text("created_by").or_else(|| Some(actor.to_string())),
        completed_at: row.datetime("completed_at")?,
    };
    upsert::<CalcRun>(tx, row, draft, actor)
}
