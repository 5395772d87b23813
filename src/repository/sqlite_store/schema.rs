// ==========================================
// SQLite 建表语句
// ==========================================
// 外键动作与 EntityKind::dependents() 保持一致
// 服务层在事务内自行执行级联, 这里的 FK 动作兜底直接写库的场景
// ==========================================

use crate::db::CURRENT_SCHEMA_VERSION;
use rusqlite::{params, Connection};

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL,
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS field (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS platform (
    id          TEXT PRIMARY KEY,
    field_id    TEXT NOT NULL REFERENCES field(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    status      TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (field_id, name)
);

CREATE TABLE IF NOT EXISTS rig (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    rig_kind    TEXT NOT NULL,
    day_rate    REAL NOT NULL CHECK (day_rate >= 0),
    status      TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS well (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    field_id    TEXT NOT NULL REFERENCES field(id) ON DELETE CASCADE,
    platform_id TEXT REFERENCES platform(id) ON DELETE CASCADE,
    well_kind   TEXT NOT NULL,
    well_type   TEXT NOT NULL,
    lat         REAL,
    lon         REAL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS maintenance_window (
    id          TEXT PRIMARY KEY,
    platform_id TEXT NOT NULL REFERENCES platform(id) ON DELETE CASCADE,
    start_date  TEXT NOT NULL,
    end_date    TEXT NOT NULL,
    reason      TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    CHECK (end_date >= start_date)
);
CREATE INDEX IF NOT EXISTS idx_maintenance_window_platform
    ON maintenance_window (platform_id, start_date);

CREATE TABLE IF NOT EXISTS scenario (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    status      TEXT NOT NULL,
    created_by  TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS project (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE,
    project_type  TEXT NOT NULL,
    field_id      TEXT REFERENCES field(id) ON DELETE SET NULL,
    platform_id   TEXT REFERENCES platform(id) ON DELETE SET NULL,
    well_id       TEXT REFERENCES well(id) ON DELETE SET NULL,
    rig_id        TEXT REFERENCES rig(id) ON DELETE SET NULL,
    status        TEXT NOT NULL,
    planned_start TEXT NOT NULL,
    planned_end   TEXT NOT NULL,
    actual_start  TEXT,
    actual_end    TEXT,
    dependencies  TEXT NOT NULL DEFAULT '{}',
    extras        TEXT NOT NULL DEFAULT '{}',
    created_at    TEXT NOT NULL,
    CHECK (planned_end >= planned_start)
);

CREATE TABLE IF NOT EXISTS campaign (
    id            TEXT PRIMARY KEY,
    scenario_id   TEXT NOT NULL REFERENCES scenario(id) ON DELETE CASCADE,
    name          TEXT NOT NULL UNIQUE,
    campaign_type TEXT NOT NULL,
    rig_id        TEXT REFERENCES rig(id) ON DELETE RESTRICT,
    field_id      TEXT REFERENCES field(id) ON DELETE RESTRICT,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS campaign_project (
    id          TEXT PRIMARY KEY,
    campaign_id TEXT NOT NULL REFERENCES campaign(id) ON DELETE CASCADE,
    project_id  TEXT NOT NULL REFERENCES project(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    UNIQUE (campaign_id, project_id)
);

CREATE TABLE IF NOT EXISTS calc_run (
    id           TEXT PRIMARY KEY,
    scenario_id  TEXT NOT NULL REFERENCES scenario(id) ON DELETE CASCADE,
    status       TEXT NOT NULL,
    params       TEXT NOT NULL DEFAULT '{}',
    results      TEXT NOT NULL DEFAULT '{}',
    created_by   TEXT,
    created_at   TEXT NOT NULL,
    completed_at TEXT
);

CREATE TABLE IF NOT EXISTS audit_log (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    actor       TEXT,
    entity      TEXT NOT NULL,
    entity_id   TEXT NOT NULL,
    action      TEXT NOT NULL,
    before_json TEXT,
    after_json  TEXT,
    at          TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_audit_log_entity ON audit_log (entity, entity_id);
"#;

/// 建表 (幂等) 并登记当前 schema 版本
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        params![CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}
