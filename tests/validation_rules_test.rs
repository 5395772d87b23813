// ==========================================
// 校验规则集成测试
// ==========================================
// 测试范围:
// 1. 井位类别与平台/坐标一致性
// 2. 检修窗口日期顺序与重叠 (含更新时排除自身)
// 3. 项目计划日期顺序
// 4. 作业批次类型与目标一致性 (多字段汇总)
// 5. 唯一性冲突、引用存在性、名称必填、日费非负
// 每条规则在 MemoryStore 与 SqliteStore 上各执行一次
// ==========================================


use drilling_campaign::api::{ApiError, CampaignApi};
use drilling_campaign::domain::{
    CampaignDraft, CampaignPatch, CampaignProjectDraft, CampaignType, Field, FieldDraft,
    FieldPatch, MaintenanceWindow, MaintenanceWindowPatch, Platform, PlatformDraft,
    PlatformPatch, PlatformStatus, ProjectDraft, ProjectPatch, RigDraft, Well, WellDraft,
    WellKind, WellPatch, WellType,
};
use drilling_campaign::repository::Store;
use test_helpers::*;
use uuid::Uuid;

fn field_errors(err: &ApiError) -> Vec<String> {
    err.field_errors()
        .map(|e| e.fields().map(str::to_string).collect())
        .unwrap_or_default()
}

// ==========================================
// Well
// ==========================================

fn check_well_rules<S: Store>(api: &CampaignApi<S>) {
    let field = seed_field(api, "North");
    let platform = seed_platform(api, field.id, "Alpha");

    // platform_well 缺少平台
    let err = api
        .create(platform_well_draft("W-1", field.id, None), ACTOR)
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(field_errors(&err), vec!["platform"]);

    // exploration_open_location 挂平台且缺坐标: 三个字段各一条
    let err = api
        .create(
            WellDraft {
                name: "X-1".to_string(),
                field_id: field.id,
                platform_id: Some(platform.id),
                kind: WellKind::ExplorationOpenLocation,
                well_type: WellType::Exploration,
                lat: None,
                lon: None,
            },
            ACTOR,
        )
        .unwrap_err();
    assert_eq!(field_errors(&err), vec!["lat", "lon", "platform"]);

    // 合法的探井开放井位
    let well: Well = api
        .create(
            WellDraft {
                name: "X-1".to_string(),
                field_id: field.id,
                platform_id: None,
                kind: WellKind::ExplorationOpenLocation,
                well_type: WellType::Exploration,
                lat: Some(1.25),
                lon: Some(103.5),
            },
            ACTOR,
        )
        .unwrap();
    assert_eq!(well.platform_id, None);

    // 平台必须属于井所在油田
    let other_field = seed_field(api, "South");
    let err = api
        .create(platform_well_draft("W-2", other_field.id, Some(platform.id)), ACTOR)
        .unwrap_err();
    assert_eq!(field_errors(&err), vec!["platform"]);
}

#[test]
fn test_well_rules_memory() {
    check_well_rules(&memory_api());
}

#[test]
fn test_well_rules_sqlite() {
    let (_db, api) = sqlite_api();
    check_well_rules(&api);
}

// ==========================================
// MaintenanceWindow
// ==========================================

fn check_window_rules<S: Store>(api: &CampaignApi<S>) {
    let field = seed_field(api, "North");
    let alpha = seed_platform(api, field.id, "Alpha");
    let bravo = seed_platform(api, field.id, "Bravo");

    let existing = seed_window(api, alpha.id, date(2025, 3, 1), date(2025, 3, 10));

    // 结束早于开始
    let err = api
        .create(window_draft(alpha.id, date(2025, 5, 10), date(2025, 5, 1)), ACTOR)
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(
        err.field_errors().unwrap().get("end_date").unwrap(),
        &["end_date must be on or after start_date".to_string()]
    );

    // 重叠
    let err = api
        .create(window_draft(alpha.id, date(2025, 3, 5), date(2025, 3, 15)), ACTOR)
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(
        err.field_errors().unwrap().get("start_date").unwrap(),
        &["overlaps another maintenance window for this platform".to_string()]
    );

    // 端点相接 (闭区间) 也算重叠
    let err = api
        .create(window_draft(alpha.id, date(2025, 3, 10), date(2025, 3, 12)), ACTOR)
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    // 紧邻不重叠; 其他平台同日期不受影响
    seed_window(api, alpha.id, date(2025, 3, 11), date(2025, 3, 20));
    seed_window(api, bravo.id, date(2025, 3, 1), date(2025, 3, 10));

    // 更新自身不与自己冲突
    let updated: MaintenanceWindow = api
        .update(
            existing.id,
            MaintenanceWindowPatch {
                start_date: Some(date(2025, 2, 25)),
                ..Default::default()
            },
            ACTOR,
        )
        .unwrap();
    assert_eq!(updated.start_date, date(2025, 2, 25));

    // 更新后与相邻窗口重叠
    let err = api
        .update(
            existing.id,
            MaintenanceWindowPatch {
                end_date: Some(date(2025, 3, 11)),
                ..Default::default()
            },
            ACTOR,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    // 失败的更新不落库
    let current: MaintenanceWindow = api.get(existing.id).unwrap();
    assert_eq!(current.end_date, date(2025, 3, 10));
}

#[test]
fn test_window_rules_memory() {
    check_window_rules(&memory_api());
}

#[test]
fn test_window_rules_sqlite() {
    let (_db, api) = sqlite_api();
    check_window_rules(&api);
}

// ==========================================
// Project
// ==========================================

fn check_project_rules<S: Store>(api: &CampaignApi<S>) {
    let err = api
        .create(ProjectDraft::new("P-1", date(2025, 4, 10), date(2025, 4, 1)), ACTOR)
        .unwrap_err();
    assert_eq!(field_errors(&err), vec!["planned_end"]);

    // 同一天开始结束允许
    let project = seed_project(api, "P-1", date(2025, 4, 1), date(2025, 4, 1));

    // 部分更新同样校验
    let err = api
        .update(
            project.id,
            ProjectPatch {
                planned_start: Some(date(2025, 4, 2)),
                ..Default::default()
            },
            ACTOR,
        )
        .unwrap_err();
    assert_eq!(field_errors(&err), vec!["planned_end"]);

    // 引用不存在
    let mut draft = ProjectDraft::new("P-2", date(2025, 4, 1), date(2025, 4, 5));
    draft.rig_id = Some(Uuid::new_v4());
    draft.well_id = Some(Uuid::new_v4());
    let err = api.create(draft, ACTOR).unwrap_err();
    assert_eq!(field_errors(&err), vec!["rig", "well"]);
}

#[test]
fn test_project_rules_memory() {
    check_project_rules(&memory_api());
}

#[test]
fn test_project_rules_sqlite() {
    let (_db, api) = sqlite_api();
    check_project_rules(&api);
}

// ==========================================
// Campaign
// ==========================================

fn check_campaign_rules<S: Store>(api: &CampaignApi<S>) {
    let scenario = seed_scenario(api, "Base");
    let rig = seed_rig(api, "Rig A", 100_000.0);
    let field = seed_field(api, "North");

    // rig_campaign: 缺 rig 且设了 field → 两个字段一起报
    let err = api
        .create(
            CampaignDraft {
                scenario_id: scenario.id,
                name: "C-1".to_string(),
                campaign_type: CampaignType::RigCampaign,
                rig_id: None,
                field_id: Some(field.id),
            },
            ACTOR,
        )
        .unwrap_err();
    assert_eq!(field_errors(&err), vec!["field", "rig"]);

    // field_operations: 缺 field 且设了 rig
    let err = api
        .create(
            CampaignDraft {
                scenario_id: scenario.id,
                name: "C-1".to_string(),
                campaign_type: CampaignType::FieldOperations,
                rig_id: Some(rig.id),
                field_id: None,
            },
            ACTOR,
        )
        .unwrap_err();
    assert_eq!(field_errors(&err), vec!["field", "rig"]);

    let campaign = seed_rig_campaign(api, scenario.id, "C-1", rig.id);

    // 切换类型时显式清空 rig
    let switched = api
        .update(
            campaign.id,
            CampaignPatch {
                campaign_type: Some(CampaignType::FieldOperations),
                rig_id: Some(None),
                field_id: Some(Some(field.id)),
                ..Default::default()
            },
            ACTOR,
        )
        .unwrap();
    assert_eq!(switched.rig_id, None);
    assert_eq!(switched.field_id, Some(field.id));

    // 只改类型不改目标 → 不一致
    let err = api
        .update(
            campaign.id,
            CampaignPatch {
                campaign_type: Some(CampaignType::RigCampaign),
                ..Default::default()
            },
            ACTOR,
        )
        .unwrap_err();
    assert_eq!(field_errors(&err), vec!["field", "rig"]);
}

#[test]
fn test_campaign_rules_memory() {
    check_campaign_rules(&memory_api());
}

#[test]
fn test_campaign_rules_sqlite() {
    let (_db, api) = sqlite_api();
    check_campaign_rules(&api);
}

// ==========================================
// 唯一性 / 名称 / 日费
// ==========================================

fn check_uniqueness<S: Store>(api: &CampaignApi<S>) {
    let field = seed_field(api, "North");
    let err = api
        .create(
            FieldDraft {
                name: "North".to_string(),
            },
            ACTOR,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(field_errors(&err), vec!["name"]);

    // 平台名在油田内唯一, 跨油田可重名
    seed_platform(api, field.id, "Alpha");
    let err = api
        .create(
            PlatformDraft {
                field_id: field.id,
                name: "Alpha".to_string(),
                status: PlatformStatus::Operating,
            },
            ACTOR,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(field_errors(&err), vec!["__all__"]);
    let south = seed_field(api, "South");
    seed_platform(api, south.id, "Alpha");

    // 批次-项目关联唯一
    let scenario = seed_scenario(api, "Base");
    let rig = seed_rig(api, "Rig A", 0.0);
    let campaign = seed_rig_campaign(api, scenario.id, "C-1", rig.id);
    let project = seed_project(api, "P-1", date(2025, 1, 1), date(2025, 1, 31));
    let link = CampaignProjectDraft {
        campaign_id: campaign.id,
        project_id: project.id,
    };
    api.create(link.clone(), ACTOR).unwrap();
    let err = api.create(link, ACTOR).unwrap_err();
    assert_eq!(field_errors(&err), vec!["__all__"]);
}

#[test]
fn test_uniqueness_memory() {
    check_uniqueness(&memory_api());
}

#[test]
fn test_uniqueness_sqlite() {
    let (_db, api) = sqlite_api();
    check_uniqueness(&api);
}

// ===== 平台更换油田 =====

fn check_platform_move_keeps_wells_consistent<S: Store>(api: &CampaignApi<S>) {
    let north = seed_field(api, "North");
    let south = seed_field(api, "South");
    let alpha = seed_platform(api, north.id, "Alpha");
    let well = seed_well(api, "W-1", north.id, alpha.id);

    // 平台上有井时不能移到其他油田
    let err = api
        .update(
            alpha.id,
            PlatformPatch {
                field_id: Some(south.id),
                ..Default::default()
            },
            ACTOR,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(field_errors(&err), vec!["field"]);
    assert_eq!(
        err.field_errors().unwrap().get("field").unwrap(),
        &["platform has wells in another field".to_string()]
    );
    assert_eq!(api.get::<Platform>(alpha.id).unwrap().field_id, north.id);

    // 井仍可正常更新
    let renamed: Well = api
        .update(
            well.id,
            WellPatch {
                name: Some("W-1A".to_string()),
                ..Default::default()
            },
            ACTOR,
        )
        .unwrap();
    assert_eq!(renamed.platform_id, Some(alpha.id));

    // 空平台可以移动
    let bravo = seed_platform(api, north.id, "Bravo");
    let moved: Platform = api
        .update(
            bravo.id,
            PlatformPatch {
                field_id: Some(south.id),
                ..Default::default()
            },
            ACTOR,
        )
        .unwrap();
    assert_eq!(moved.field_id, south.id);
}

#[test]
fn test_platform_move_keeps_wells_consistent_memory() {
    check_platform_move_keeps_wells_consistent(&memory_api());
}

#[test]
fn test_platform_move_keeps_wells_consistent_sqlite() {
    let (_db, api) = sqlite_api();
    check_platform_move_keeps_wells_consistent(&api);
}

// ===== 名称去首尾空白 =====

fn check_padded_name_is_duplicate<S: Store>(api: &CampaignApi<S>) {
    let north = seed_field(api, "North");

    let err = api
        .create(
            FieldDraft {
                name: "North ".to_string(),
            },
            ACTOR,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(field_errors(&err), vec!["name"]);

    // 存储的是去空白后的名称
    let south: Field = api
        .create(
            FieldDraft {
                name: "  South\t".to_string(),
            },
            ACTOR,
        )
        .unwrap();
    assert_eq!(south.name, "South");

    // 更新同样去空白并参与唯一性比较
    let err = api
        .update(
            south.id,
            FieldPatch {
                name: Some(" North".to_string()),
            },
            ACTOR,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(api.get::<Field>(north.id).unwrap().name, "North");
}

#[test]
fn test_padded_name_is_duplicate_memory() {
    check_padded_name_is_duplicate(&memory_api());
}

#[test]
fn test_padded_name_is_duplicate_sqlite() {
    let (_db, api) = sqlite_api();
    check_padded_name_is_duplicate(&api);
}

#[test]
fn test_name_and_day_rate_aggregated() {
    let api = memory_api();
    seed_rig(&api, "Rig A", 1.0);

    // 空名称 + 负日费 一次返回
    let err = api
        .create(
            RigDraft {
                name: "   ".to_string(),
                day_rate: -5.0,
                ..Default::default()
            },
            ACTOR,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(field_errors(&err), vec!["day_rate", "name"]);

    // 校验错误与冲突同时存在时合并为 Validation
    let err = api
        .create(
            RigDraft {
                name: "Rig A".to_string(),
                day_rate: f64::NAN,
                ..Default::default()
            },
            ACTOR,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(field_errors(&err), vec!["day_rate", "name"]);
}

#[test]
fn test_missing_parent_is_validation_error() {
    let api = memory_api();
    let err = api
        .create(
            PlatformDraft {
                field_id: Uuid::new_v4(),
                name: "Orphan".to_string(),
                status: PlatformStatus::Operating,
            },
            ACTOR,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    let messages = err.field_errors().unwrap().get("field").unwrap();
    assert!(messages[0].contains("does not exist"));
}
