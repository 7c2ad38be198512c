// ==========================================
// 仓库物资管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为 (外键/忙等待)
// - 统一建表入口, 避免各模块各自建表造成 schema 漂移
// ==========================================

use rusqlite::{Connection, OptionalExtension};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启 (count_lines/movement_lines 依赖级联删除)
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

/// 初始化数据库 schema（幂等）
///
/// 建表顺序: 参照表在前 (materials/stock_locations), 关联表在后。
/// 数量列统一为 REAL: SQLite 以 IEEE 双精度原样存取, 快照数量往返无精度损失。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS materials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            unit_cost REAL NOT NULL DEFAULT 0,
            stock_min REAL NOT NULL DEFAULT 0,
            stock_max REAL,
            reorder_point REAL,
            lead_time_days INTEGER,
            active INTEGER NOT NULL DEFAULT 1,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS stock_locations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            warehouse TEXT
        );

        CREATE TABLE IF NOT EXISTS stock_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            location_id INTEGER NOT NULL REFERENCES stock_locations(id),
            material_id INTEGER NOT NULL REFERENCES materials(id),
            balance REAL NOT NULL DEFAULT 0,
            UNIQUE (location_id, material_id)
        );

        CREATE TABLE IF NOT EXISTS movements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL,
            origin_location_id INTEGER REFERENCES stock_locations(id),
            dest_location_id INTEGER REFERENCES stock_locations(id),
            status TEXT NOT NULL,
            reference TEXT,
            created_by TEXT,
            created_at TEXT NOT NULL,
            finalized_at TEXT
        );

        CREATE TABLE IF NOT EXISTS movement_lines (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            movement_id INTEGER NOT NULL REFERENCES movements(id) ON DELETE CASCADE,
            material_id INTEGER NOT NULL REFERENCES materials(id),
            quantity REAL NOT NULL,
            unit_value REAL NOT NULL DEFAULT 0,
            note TEXT,
            justification TEXT
        );

        CREATE TABLE IF NOT EXISTS inventory_cycles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            location_id INTEGER NOT NULL REFERENCES stock_locations(id),
            reference_month TEXT NOT NULL,
            status TEXT NOT NULL,
            responsible_id TEXT,
            notes TEXT,
            started_at TEXT,
            finished_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        -- 同一 (地点, 参考月) 至多一张可变盘点单
        CREATE UNIQUE INDEX IF NOT EXISTS idx_inventory_cycles_active
            ON inventory_cycles (location_id, reference_month)
            WHERE status IN ('OPEN', 'IN_PROGRESS');

        CREATE TABLE IF NOT EXISTS count_lines (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            cycle_id INTEGER NOT NULL REFERENCES inventory_cycles(id) ON DELETE CASCADE,
            material_id INTEGER NOT NULL REFERENCES materials(id),
            system_qty REAL NOT NULL,
            counted_qty REAL,
            divergence REAL,
            justification TEXT,
            counted_by TEXT,
            counted_at TEXT,
            created_at TEXT NOT NULL,
            UNIQUE (cycle_id, material_id)
        );

        -- 补货视图: 全地点汇总余额 + 水位状态 + 建议补货量
        -- CRITICAL: 余额 < 最低库存
        -- WARNING : 设有补货点且余额 < 补货点
        -- 建议量  : 补到 stock_max, 缺省依次退到 reorder_point / stock_min
        CREATE VIEW IF NOT EXISTS vw_replenishment AS
        SELECT
            m.id AS material_id,
            m.code AS code,
            m.description AS description,
            m.unit_cost AS unit_cost,
            m.stock_min AS stock_min,
            m.reorder_point AS reorder_point,
            m.lead_time_days AS lead_time_days,
            COALESCE(SUM(si.balance), 0) AS total_balance,
            CASE
                WHEN COALESCE(SUM(si.balance), 0) < m.stock_min THEN 'CRITICAL'
                WHEN m.reorder_point IS NOT NULL
                     AND COALESCE(SUM(si.balance), 0) < m.reorder_point THEN 'WARNING'
                ELSE 'NORMAL'
            END AS status,
            MAX(
                COALESCE(m.stock_max, m.reorder_point, m.stock_min)
                    - COALESCE(SUM(si.balance), 0),
                0
            ) AS suggested_qty
        FROM materials m
        LEFT JOIN stock_items si ON si.material_id = m.id
        WHERE m.active = 1
        GROUP BY m.id;
        "#,
    )?;

    // 记录 schema 版本（幂等）
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
