// ==========================================
// 批量导入集成测试
// ==========================================
// 测试范围:
// 1. CSV / JSON 导出目录导入, 名称引用解析
// 2. 试运行回滚、重复导入幂等
// 3. 父实体缺失跳过、默认方案创建、CSV 优先
// 4. 校验失败整批回滚并定位到文件/行
// ==========================================


use drilling_campaign::api::{CampaignApi, ListQuery};
use drilling_campaign::domain::{
    Campaign, CampaignType, Field, MaintenanceWindow, Platform, Project, Rig, RigKind, Scenario,
    Well, WellKind,
};
use drilling_campaign::importer::{BulkLoader, DumpLoader, ImportError, LoadMode};
use drilling_campaign::repository::{MemoryStore, SqliteStore, Store};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use test_helpers::*;

const FIELDS_CSV: &str = "id,name\n,North\n,South\n";

const PLATFORMS_CSV: &str = "name,field_name,status\n\
Alpha,North,operating\n\
Bravo,South,maintenance\n\
Ghost,Atlantis,operating\n";

const RIGS_JSON: &str = r#"[
    {"name": "Rig A", "rig_kind": "JACKUP", "day_rate": 125000.5, "status": "active"},
    {"name": "Rig B", "rig_kind": "hwu", "day_rate": "90000", "status": "standby"}
]"#;

const WELLS_CSV: &str = "name,field_name,platform_name,well_kind,type,lat,lon\n\
W-1,North,Alpha,platform_well,development,,\n\
X-1,South,,exploration_open_location,exploration,1.5,103.25\n";

const WINDOWS_CSV: &str = "platform_name,field_name,start_date,end_date,reason\n\
Alpha,North,2025-03-01,2025-03-10,turnaround\n";

const PROJECTS_JSON: &str = r#"{"results": [
    {"name": "P-1", "project_type": "drilling", "field_name": "North", "well_name": "W-1",
     "rig_name": "Rig A", "planned_start": "2025-04-01", "planned_end": "2025-04-30",
     "extras": "{\"priority\": \"high\"}"}
]}"#;

const CAMPAIGNS_CSV: &str = "name,campaign_type,rig_name\nC-1,rig_campaign,Rig A\n";

const CAMPAIGN_PROJECTS_CSV: &str = "campaign_name,project_name\nC-1,P-1\nC-1,P-404\n";

fn write_full_dump(dir: &Path) {
    write_dump_file(dir, "fields.csv", FIELDS_CSV);
    write_dump_file(dir, "platforms.csv", PLATFORMS_CSV);
    write_dump_file(dir, "rigs.json", RIGS_JSON);
    write_dump_file(dir, "wells.csv", WELLS_CSV);
    write_dump_file(dir, "maintenance_windows.csv", WINDOWS_CSV);
    write_dump_file(dir, "projects.json", PROJECTS_JSON);
    write_dump_file(dir, "campaigns.csv", CAMPAIGNS_CSV);
    write_dump_file(dir, "campaign_projects.csv", CAMPAIGN_PROJECTS_CSV);
}

fn count<R, S>(api: &CampaignApi<S>) -> usize
where
    R: drilling_campaign::api::Resource,
    S: Store,
{
    api.list::<R>(&ListQuery::new()).unwrap().count
}

async fn check_full_load<S: Store + 'static>(store: Arc<S>) {
    let dir = tempdir().unwrap();
    write_full_dump(dir.path());

    let loader = BulkLoader::new(Arc::clone(&store));
    let report = loader.load_dir(dir.path(), LoadMode::Commit).await.unwrap();

    assert!(!report.dry_run);
    assert_eq!(report.file("fields.csv").unwrap().loaded, 2);
    assert_eq!(report.file("platforms.csv").unwrap().loaded, 2);
    assert_eq!(report.file("platforms.csv").unwrap().skipped, 1);
    assert_eq!(report.file("rigs.json").unwrap().created, 2);
    assert_eq!(report.file("campaign_projects.csv").unwrap().skipped, 1);
    assert_eq!(report.total, 2 + 2 + 2 + 2 + 1 + 1 + 1 + 1);
    assert_eq!(report.skipped, 2);

    let api = CampaignApi::new(store);
    assert_eq!(count::<Field, _>(&api), 2);
    assert_eq!(count::<MaintenanceWindow, _>(&api), 1);

    let rigs = api.list::<Rig>(&ListQuery::new()).unwrap().results;
    assert_eq!(rigs[0].kind, RigKind::Jackup);
    assert_eq!(rigs[1].day_rate, 90_000.0);

    let wells = api.list::<Well>(&ListQuery::new()).unwrap().results;
    let w1 = wells.iter().find(|w| w.name == "W-1").unwrap();
    let alpha = api
        .list::<Platform>(&ListQuery::new().search("Alpha"))
        .unwrap()
        .results
        .remove(0);
    assert_eq!(w1.platform_id, Some(alpha.id));
    let x1 = wells.iter().find(|w| w.name == "X-1").unwrap();
    assert_eq!(x1.kind, WellKind::ExplorationOpenLocation);
    assert_eq!(x1.lat, Some(1.5));

    let project = api
        .list::<Project>(&ListQuery::new())
        .unwrap()
        .results
        .remove(0);
    assert_eq!(project.well_id, Some(w1.id));
    assert_eq!(project.extras["priority"], "high");

    // 批次未给方案: 创建默认方案
    let scenarios = api.list::<Scenario>(&ListQuery::new()).unwrap().results;
    assert_eq!(scenarios.len(), 1);
    assert_eq!(scenarios[0].name, "Default Scenario");
    assert_eq!(scenarios[0].created_by.as_deref(), Some("loader"));
    let campaign = api
        .list::<Campaign>(&ListQuery::new())
        .unwrap()
        .results
        .remove(0);
    assert_eq!(campaign.scenario_id, scenarios[0].id);
    assert_eq!(campaign.campaign_type, CampaignType::RigCampaign);

    // 审计操作人为导入器
    let audits = api
        .list_audit(&ListQuery::new().filter("actor", "loader"))
        .unwrap();
    assert!(audits.count >= report.total);
}

#[tokio::test]
async fn test_full_load_memory() {
    drilling_campaign::logging::init_test();
    check_full_load(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn test_full_load_sqlite() {
    drilling_campaign::logging::init_test();
    let (_db, db_path) = create_test_db().unwrap();
    check_full_load(Arc::new(SqliteStore::open(&db_path).unwrap())).await;
}

#[tokio::test]
async fn test_second_load_is_idempotent() {
    drilling_campaign::logging::init_test();
    let dir = tempdir().unwrap();
    write_full_dump(dir.path());
    let store = Arc::new(MemoryStore::new());
    let loader = BulkLoader::new(Arc::clone(&store));

    let first = loader.load_dir(dir.path(), LoadMode::Commit).await.unwrap();
    let audits_after_first = CampaignApi::new(Arc::clone(&store))
        .list_audit(&ListQuery::new())
        .unwrap()
        .count;

    let second = loader.load_dir(dir.path(), LoadMode::Commit).await.unwrap();
    assert_eq!(second.total, first.total);
    for file in &second.files {
        assert_eq!(file.created, 0, "{} created rows on reload", file.file_name);
        assert_eq!(file.updated, 0, "{} updated rows on reload", file.file_name);
    }

    let api = CampaignApi::new(store);
    assert_eq!(count::<Scenario, _>(&api), 1);
    assert_eq!(api.list_audit(&ListQuery::new()).unwrap().count, audits_after_first);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    drilling_campaign::logging::init_test();
    let dir = tempdir().unwrap();
    write_full_dump(dir.path());
    let (_db, db_path) = create_test_db().unwrap();
    let store = Arc::new(SqliteStore::open(&db_path).unwrap());

    let report = BulkLoader::new(Arc::clone(&store))
        .load_dir(dir.path(), LoadMode::DryRun)
        .await
        .unwrap();
    assert!(report.dry_run);
    assert_eq!(report.file("fields.csv").unwrap().created, 2);

    let api = CampaignApi::new(store);
    assert_eq!(count::<Field, _>(&api), 0);
    assert_eq!(count::<Scenario, _>(&api), 0);
    assert_eq!(api.list_audit(&ListQuery::new()).unwrap().count, 0);
}

#[tokio::test]
async fn test_rejected_row_aborts_whole_load() {
    drilling_campaign::logging::init_test();
    let dir = tempdir().unwrap();
    write_dump_file(dir.path(), "fields.csv", FIELDS_CSV);
    write_dump_file(
        dir.path(),
        "projects.csv",
        "name,planned_start,planned_end\nP-1,2025-04-01,2025-04-30\nP-2,2025-05-10,2025-05-01\n",
    );
    let store = Arc::new(MemoryStore::new());

    let err = BulkLoader::new(Arc::clone(&store))
        .load_dir(dir.path(), LoadMode::Commit)
        .await
        .unwrap_err();
    match &err {
        ImportError::RowRejected { file, row, source } => {
            assert_eq!(file, "projects.csv");
            assert_eq!(*row, 3);
            assert!(source.field_errors().unwrap().contains("planned_end"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // 先前文件的写入一并回滚
    let api = CampaignApi::new(store);
    assert_eq!(count::<Field, _>(&api), 0);
    assert_eq!(count::<Project, _>(&api), 0);
}

#[tokio::test]
async fn test_bad_value_reports_location() {
    drilling_campaign::logging::init_test();
    let dir = tempdir().unwrap();
    write_dump_file(
        dir.path(),
        "rigs.csv",
        "name,rig_kind,day_rate\nRig A,jackup,lots\n",
    );

    let err = BulkLoader::new(Arc::new(MemoryStore::new()))
        .load_dir(dir.path(), LoadMode::Commit)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::FieldValueError { ref field, row: 2, .. } if field == "day_rate"
    ));
}

#[tokio::test]
async fn test_csv_preferred_over_json() {
    drilling_campaign::logging::init_test();
    let dir = tempdir().unwrap();
    write_dump_file(dir.path(), "fields.csv", "name\nFrom CSV\n");
    write_dump_file(dir.path(), "fields.json", r#"[{"name": "From JSON"}]"#);
    let store = Arc::new(MemoryStore::new());

    let report = BulkLoader::new(Arc::clone(&store))
        .load_dir(dir.path(), LoadMode::Commit)
        .await
        .unwrap();
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].file_name, "fields.csv");

    let fields = CampaignApi::new(store)
        .list::<Field>(&ListQuery::new())
        .unwrap()
        .results;
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "From CSV");
}

#[tokio::test]
async fn test_missing_directory() {
    drilling_campaign::logging::init_test();
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");

    let err = BulkLoader::new(Arc::new(MemoryStore::new()))
        .load_dir(&missing, LoadMode::Commit)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::DirectoryNotFound(_)));
}

#[tokio::test]
async fn test_empty_directory_loads_nothing() {
    drilling_campaign::logging::init_test();
    let dir = tempdir().unwrap();

    let report = BulkLoader::new(Arc::new(MemoryStore::new()))
        .load_dir(dir.path(), LoadMode::Commit)
        .await
        .unwrap();
    assert!(report.files.is_empty());
    assert_eq!(report.total, 0);
}
