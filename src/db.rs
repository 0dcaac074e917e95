// ==========================================
// 服装生产排程系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表集中在此处（快照表 + config_kv）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建立 config_kv 表（幂等）
pub fn ensure_config_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id   TEXT NOT NULL,
            key        TEXT NOT NULL,
            value      TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )
}

/// 建立生产快照表（幂等）
pub fn ensure_snapshot_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS production_job (
            job_id          TEXT PRIMARY KEY,
            order_id        TEXT NOT NULL,
            client_name     TEXT NOT NULL,
            garment_type    TEXT NOT NULL,
            quantity        INTEGER NOT NULL,
            priority        TEXT NOT NULL,
            deadline        TEXT NOT NULL,
            estimated_hours REAL NOT NULL,
            current_stage   TEXT NOT NULL,
            status          TEXT NOT NULL,
            seq_no          INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS job_skill (
            job_id TEXT NOT NULL REFERENCES production_job(job_id) ON DELETE CASCADE,
            skill  TEXT NOT NULL,
            PRIMARY KEY (job_id, skill)
        );

        CREATE TABLE IF NOT EXISTS job_dependency (
            job_id            TEXT NOT NULL REFERENCES production_job(job_id) ON DELETE CASCADE,
            depends_on_job_id TEXT NOT NULL,
            seq_no            INTEGER NOT NULL,
            PRIMARY KEY (job_id, depends_on_job_id)
        );

        CREATE TABLE IF NOT EXISTS production_resource (
            resource_id            TEXT PRIMARY KEY,
            name                   TEXT NOT NULL,
            resource_type          TEXT NOT NULL,
            capacity_hours_per_day REAL NOT NULL,
            current_utilization    REAL NOT NULL,
            efficiency_rating      REAL NOT NULL,
            seq_no                 INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS resource_skill (
            resource_id TEXT NOT NULL REFERENCES production_resource(resource_id) ON DELETE CASCADE,
            skill       TEXT NOT NULL,
            PRIMARY KEY (resource_id, skill)
        );

        CREATE TABLE IF NOT EXISTS station_metric_snapshot (
            snapshot_id           TEXT PRIMARY KEY,
            station_id            TEXT NOT NULL,
            station_name          TEXT NOT NULL,
            station_type          TEXT NOT NULL,
            current_throughput    REAL NOT NULL,
            expected_throughput   REAL NOT NULL,
            queue_length          INTEGER,
            avg_wait_time_minutes REAL NOT NULL,
            utilization_rate      REAL NOT NULL,
            operator_count        INTEGER NOT NULL,
            active_operators      INTEGER NOT NULL,
            defect_rate           REAL NOT NULL,
            recorded_at           TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_station_snapshot_time
            ON station_metric_snapshot(recorded_at);
        CREATE INDEX IF NOT EXISTS idx_station_snapshot_station
            ON station_metric_snapshot(station_id, recorded_at);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        ensure_snapshot_schema(&conn).unwrap();
        ensure_snapshot_schema(&conn).unwrap();
        ensure_config_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}
