// ==========================================
// 实体生命周期集成测试
// ==========================================
// 测试范围:
// 1. 创建 / 读取 / 部分更新 / 删除
// 2. 可空引用显式清空、重复提交幂等
// 3. 删除策略: 级联 / 置空 / 拒绝
// 4. 审计日志与业务写入同事务
// 5. validate_create 不落库
// ==========================================


use drilling_campaign::api::{ApiError, CampaignApi, ListQuery};
use drilling_campaign::domain::{
    AuditAction, CalcRun, CalcRunDraft, CalcRunStatus, Campaign, CampaignProject,
    CampaignProjectDraft, EntityKind, Field, FieldDraft, FieldPatch, MaintenanceWindow, Platform,
    Project, ProjectDraft, ProjectPatch, Rig, RigPatch, Scenario, Well,
};
use drilling_campaign::repository::Store;
use serde_json::json;
use test_helpers::*;
use uuid::Uuid;

fn audit_actions<S: Store>(api: &CampaignApi<S>, entity_id: Uuid) -> Vec<AuditAction> {
    let page = api
        .list_audit(
            &ListQuery::new()
                .filter("entity_id", entity_id.to_string())
                .order_by("id"),
        )
        .unwrap();
    page.results.into_iter().map(|a| a.action).collect()
}

// ==========================================
// 创建 / 读取 / 更新
// ==========================================

fn check_round_trip<S: Store>(api: &CampaignApi<S>) {
    let rig = seed_rig(api, "Rig A", 125_000.5);
    let loaded: Rig = api.get(rig.id).unwrap();
    assert_eq!(loaded, rig);

    // 部分更新只改给出的字段
    let updated: Rig = api
        .update(
            rig.id,
            RigPatch {
                day_rate: Some(90_000.0),
                ..Default::default()
            },
            ACTOR,
        )
        .unwrap();
    assert_eq!(updated.name, "Rig A");
    assert_eq!(updated.day_rate, 90_000.0);
    assert_eq!(updated.created_at, rig.created_at);
    assert_eq!(api.get::<Rig>(rig.id).unwrap(), updated);

    assert_eq!(
        audit_actions(api, rig.id),
        vec![AuditAction::Create, AuditAction::Update]
    );
}

#[test]
fn test_round_trip_memory() {
    check_round_trip(&memory_api());
}

#[test]
fn test_round_trip_sqlite() {
    let (_db, api) = sqlite_api();
    check_round_trip(&api);
}

fn check_explicit_null_and_idempotent_update<S: Store>(api: &CampaignApi<S>) {
    let rig = seed_rig(api, "Rig A", 1.0);
    let mut draft = ProjectDraft::new("P-1", date(2025, 1, 1), date(2025, 1, 31));
    draft.rig_id = Some(rig.id);
    draft.extras = json!({"priority": "high"});
    let project: Project = api.create(draft, ACTOR).unwrap();
    assert_eq!(project.rig_id, Some(rig.id));

    // 显式 null 清空引用, 其他字段不变
    let cleared: Project = api
        .update(
            project.id,
            ProjectPatch {
                rig_id: Some(None),
                ..Default::default()
            },
            ACTOR,
        )
        .unwrap();
    assert_eq!(cleared.rig_id, None);
    assert_eq!(cleared.extras, json!({"priority": "high"}));

    // 相同内容再次提交: 不写审计
    api.update(
        project.id,
        ProjectPatch {
            rig_id: Some(None),
            ..Default::default()
        },
        ACTOR,
    )
    .unwrap();
    assert_eq!(
        audit_actions(api, project.id),
        vec![AuditAction::Create, AuditAction::Update]
    );
}

#[test]
fn test_explicit_null_and_idempotent_update_memory() {
    check_explicit_null_and_idempotent_update(&memory_api());
}

#[test]
fn test_explicit_null_and_idempotent_update_sqlite() {
    let (_db, api) = sqlite_api();
    check_explicit_null_and_idempotent_update(&api);
}

#[test]
fn test_not_found() {
    let api = memory_api();
    let missing = Uuid::new_v4();

    let err = api.get::<Field>(missing).unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));

    let err = api
        .update(
            missing,
            FieldPatch {
                name: Some("x".to_string()),
            },
            ACTOR,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));

    let err = api.delete::<Field>(missing, ACTOR).unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));
}

#[test]
fn test_validate_create_writes_nothing() {
    let api = memory_api();
    let field: Field = api
        .validate_create(FieldDraft {
            name: "North".to_string(),
        })
        .unwrap();
    assert_eq!(field.name, "North");

    let err = api.get::<Field>(field.id).unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));
    assert_eq!(api.list_audit(&ListQuery::new()).unwrap().count, 0);

    // 校验失败同样返回错误
    let err = api
        .validate_create(FieldDraft {
            name: " ".to_string(),
        })
        .unwrap_err();
    assert!(err.is_validation());
}

// ==========================================
// 删除策略
// ==========================================

fn check_field_delete_cascades<S: Store>(api: &CampaignApi<S>) {
    let field = seed_field(api, "North");
    let platform = seed_platform(api, field.id, "Alpha");
    let well = seed_well(api, "W-1", field.id, platform.id);
    let window = seed_window(api, platform.id, date(2025, 3, 1), date(2025, 3, 5));

    let mut draft = ProjectDraft::new("P-1", date(2025, 1, 1), date(2025, 1, 31));
    draft.field_id = Some(field.id);
    draft.platform_id = Some(platform.id);
    draft.well_id = Some(well.id);
    let project: Project = api.create(draft, ACTOR).unwrap();

    api.delete::<Field>(field.id, ACTOR).unwrap();

    assert!(api.get::<Field>(field.id).is_err());
    assert!(api.get::<Platform>(platform.id).is_err());
    assert!(api.get::<Well>(well.id).is_err());
    assert!(api.get::<MaintenanceWindow>(window.id).is_err());

    // 项目保留, 引用全部置空
    let project: Project = api.get(project.id).unwrap();
    assert_eq!(project.field_id, None);
    assert_eq!(project.platform_id, None);
    assert_eq!(project.well_id, None);

    // 每个被删除/被置空的记录都有审计
    let deletes = api
        .list_audit(&ListQuery::new().filter("action", "delete"))
        .unwrap();
    assert_eq!(deletes.count, 4);
    let kinds: Vec<EntityKind> = deletes.results.iter().map(|a| a.entity).collect();
    assert!(kinds.contains(&EntityKind::Field));
    assert!(kinds.contains(&EntityKind::MaintenanceWindow));
    assert_eq!(
        audit_actions(api, project.id),
        vec![
            AuditAction::Create,
            AuditAction::Update,
            AuditAction::Update,
            AuditAction::Update
        ]
    );
}

#[test]
fn test_field_delete_cascades_memory() {
    check_field_delete_cascades(&memory_api());
}

#[test]
fn test_field_delete_cascades_sqlite() {
    let (_db, api) = sqlite_api();
    check_field_delete_cascades(&api);
}

fn check_restrict_and_scenario_cascade<S: Store>(api: &CampaignApi<S>) {
    let scenario = seed_scenario(api, "Base");
    let rig = seed_rig(api, "Rig A", 1.0);
    let campaign = seed_rig_campaign(api, scenario.id, "C-1", rig.id);
    let project = seed_project(api, "P-1", date(2025, 1, 1), date(2025, 1, 10));
    let link: CampaignProject = api
        .create(
            CampaignProjectDraft {
                campaign_id: campaign.id,
                project_id: project.id,
            },
            ACTOR,
        )
        .unwrap();
    let run: CalcRun = api
        .create(
            CalcRunDraft {
                scenario_id: scenario.id,
                status: CalcRunStatus::Pending,
                params: json!({}),
                results: json!({}),
                created_by: None,
                completed_at: None,
            },
            ACTOR,
        )
        .unwrap();

    // 钻机被作业批次引用 → 拒绝, 无任何变更
    let err = api.delete::<Rig>(rig.id, ACTOR).unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert!(err.field_errors().unwrap().contains("__all__"));
    assert!(api.get::<Rig>(rig.id).is_ok());
    assert_eq!(audit_actions(api, rig.id), vec![AuditAction::Create]);

    // 删除方案级联到批次、关联与计算记录; 项目本身保留
    api.delete::<Scenario>(scenario.id, ACTOR).unwrap();
    assert!(api.get::<Campaign>(campaign.id).is_err());
    assert!(api.get::<CampaignProject>(link.id).is_err());
    assert!(api.get::<CalcRun>(run.id).is_err());
    assert!(api.get::<Project>(project.id).is_ok());

    // 引用解除后可以删除钻机
    api.delete::<Rig>(rig.id, ACTOR).unwrap();
}

#[test]
fn test_restrict_and_scenario_cascade_memory() {
    check_restrict_and_scenario_cascade(&memory_api());
}

#[test]
fn test_restrict_and_scenario_cascade_sqlite() {
    let (_db, api) = sqlite_api();
    check_restrict_and_scenario_cascade(&api);
}

#[test]
fn test_failed_write_leaves_no_audit() {
    let api = memory_api();
    seed_field(&api, "North");
    let before = api.list_audit(&ListQuery::new()).unwrap().count;

    let err = api
        .create(
            FieldDraft {
                name: "North".to_string(),
            },
            ACTOR,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(api.list_audit(&ListQuery::new()).unwrap().count, before);
}

#[test]
fn test_audit_snapshots() {
    let api = memory_api();
    let field = seed_field(&api, "North");
    api.update(
        field.id,
        FieldPatch {
            name: Some("North Sea".to_string()),
        },
        Some("alice"),
    )
    .unwrap();

    let page = api
        .list_audit(&ListQuery::new().filter("actor", "alice"))
        .unwrap();
    assert_eq!(page.count, 1);
    let entry = &page.results[0];
    assert_eq!(entry.entity, EntityKind::Field);
    assert_eq!(entry.action, AuditAction::Update);
    assert_eq!(entry.before.as_ref().unwrap()["name"], "North");
    assert_eq!(entry.after.as_ref().unwrap()["name"], "North Sea");
}
