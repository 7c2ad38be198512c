// ==========================================
// 仓库物资管理系统 - 盘点仓储
// ==========================================
// 职责: 管理 inventory_cycles / count_lines 两张表
// 红线: Repository 不含业务逻辑; 状态守卫在 API 层,
//       本层只提供条件更新原语
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::inventory::{CountLine, InventoryCycle};
use crate::domain::types::CycleStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

// ==========================================
// 查询辅助结构
// ==========================================

/// 盘点单列表行 (盘点单 + 地点名 + 清点进度)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleListRow {
    pub cycle: InventoryCycle,
    pub location_name: String,
    pub total_lines: i64,
    pub counted_lines: i64,
}

/// 盘点明细行 (明细 + 物资参照信息)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountLineDetail {
    pub line: CountLine,
    pub material_code: String,
    pub material_description: String,
}

const CYCLE_COLUMNS: &str = "id, location_id, reference_month, status, responsible_id, notes, \
     started_at, finished_at, created_at, updated_at";

const LINE_COLUMNS: &str = "id, cycle_id, material_id, system_qty, counted_qty, divergence, \
     justification, counted_by, counted_at, created_at";

fn parse_utc(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| s.parse::<DateTime<Utc>>().ok())
}

/// 行映射: inventory_cycles 表 → InventoryCycle
fn map_cycle(row: &Row<'_>) -> SqliteResult<InventoryCycle> {
    let status_raw: String = row.get(3)?;
    Ok(InventoryCycle {
        id: row.get(0)?,
        location_id: row.get(1)?,
        reference_month: row
            .get::<_, String>(2)?
            .parse::<NaiveDate>()
            .unwrap_or_default(),
        // 未知状态按终态处理, 保证不会被继续改写
        status: CycleStatus::from_str(&status_raw).unwrap_or(CycleStatus::Canceled),
        responsible_id: row.get(4)?,
        notes: row.get(5)?,
        started_at: parse_utc(row.get(6)?),
        finished_at: parse_utc(row.get(7)?),
        created_at: parse_utc(row.get(8)?).unwrap_or_else(Utc::now),
        updated_at: parse_utc(row.get(9)?).unwrap_or_else(Utc::now),
    })
}

/// 行映射: count_lines 表 → CountLine
fn map_line(row: &Row<'_>) -> SqliteResult<CountLine> {
    Ok(CountLine {
        id: row.get(0)?,
        cycle_id: row.get(1)?,
        material_id: row.get(2)?,
        system_qty: row.get(3)?,
        counted_qty: row.get(4)?,
        divergence: row.get(5)?,
        justification: row.get(6)?,
        counted_by: row.get(7)?,
        counted_at: parse_utc(row.get(8)?),
        created_at: parse_utc(row.get(9)?).unwrap_or_else(Utc::now),
    })
}

// ==========================================
// InventoryRepository - 盘点仓储
// ==========================================
pub struct InventoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryRepository {
    /// 创建新的 InventoryRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 盘点单
    // ==========================================

    /// 建单 + 快照, 单事务提交
    ///
    /// # 参数
    /// - snapshot: (物资 ID, 账面数量) 列表, 每个物资生成一行明细,
    ///   counted_qty 初始为 NULL
    ///
    /// # 说明
    /// 单据头与明细同一事务: 要么整张盘点单落库, 要么什么都没有,
    /// 不会留下零明细的“空壳单”
    pub fn create_with_snapshot(
        &self,
        location_id: i64,
        reference_month: NaiveDate,
        responsible_id: Option<&str>,
        notes: Option<&str>,
        snapshot: &[(i64, f64)],
    ) -> RepositoryResult<InventoryCycle> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let now = Utc::now();

        tx.execute(
            r#"
            INSERT INTO inventory_cycles (
                location_id, reference_month, status, responsible_id, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                location_id,
                reference_month.to_string(),
                CycleStatus::Open.to_db_str(),
                responsible_id,
                notes,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;
        let cycle_id = tx.last_insert_rowid();

        for (material_id, system_qty) in snapshot {
            tx.execute(
                r#"
                INSERT INTO count_lines (cycle_id, material_id, system_qty, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![cycle_id, material_id, system_qty, now.to_rfc3339()],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        drop(conn);

        self.find_cycle(cycle_id)?.ok_or(RepositoryError::NotFound {
            entity: "InventoryCycle".to_string(),
            id: cycle_id.to_string(),
        })
    }

    /// 按 id 查询盘点单
    pub fn find_cycle(&self, id: i64) -> RepositoryResult<Option<InventoryCycle>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM inventory_cycles WHERE id = ?1", CYCLE_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![id], map_cycle) {
            Ok(cycle) => Ok(Some(cycle)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询 (地点, 参考月) 当前可变盘点单 (OPEN/IN_PROGRESS)
    pub fn find_active_cycle(
        &self,
        location_id: i64,
        reference_month: NaiveDate,
    ) -> RepositoryResult<Option<InventoryCycle>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM inventory_cycles
            WHERE location_id = ?1 AND reference_month = ?2
              AND status IN ('OPEN', 'IN_PROGRESS')
            LIMIT 1
            "#,
            CYCLE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![location_id, reference_month.to_string()], map_cycle) {
            Ok(cycle) => Ok(Some(cycle)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询盘点单列表 (带地点名与清点进度, 新单在前)
    pub fn list_cycles(&self) -> RepositoryResult<Vec<CycleListRow>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {cols},
                   sl.name,
                   (SELECT COUNT(*) FROM count_lines cl WHERE cl.cycle_id = ic.id),
                   (SELECT COUNT(*) FROM count_lines cl
                     WHERE cl.cycle_id = ic.id AND cl.counted_qty IS NOT NULL)
            FROM inventory_cycles ic
            JOIN stock_locations sl ON sl.id = ic.location_id
            ORDER BY ic.created_at DESC, ic.id DESC
            "#,
            cols = "ic.id, ic.location_id, ic.reference_month, ic.status, ic.responsible_id, \
                    ic.notes, ic.started_at, ic.finished_at, ic.created_at, ic.updated_at"
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(CycleListRow {
                    cycle: map_cycle(row)?,
                    location_name: row.get(10)?,
                    total_lines: row.get(11)?,
                    counted_lines: row.get(12)?,
                })
            })?
            .collect::<SqliteResult<Vec<CycleListRow>>>()?;

        Ok(rows)
    }

    /// 首次打开清点视图: OPEN → IN_PROGRESS (条件更新, 幂等)
    ///
    /// # 返回
    /// - Ok(true): 本次调用完成了转换 (盖了 started_at)
    /// - Ok(false): 盘点单已不在 OPEN 状态, 无副作用
    pub fn begin_counting(&self, cycle_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let now = Utc::now();

        let affected = conn.execute(
            r#"
            UPDATE inventory_cycles
            SET status = ?1, started_at = ?2, updated_at = ?2
            WHERE id = ?3 AND status = ?4
            "#,
            params![
                CycleStatus::InProgress.to_db_str(),
                now.to_rfc3339(),
                cycle_id,
                CycleStatus::Open.to_db_str(),
            ],
        )?;

        Ok(affected > 0)
    }

    /// 封存盘点单 (盖 finished_at)
    pub fn mark_finalized(&self, cycle_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Utc::now();

        let affected = conn.execute(
            r#"
            UPDATE inventory_cycles
            SET status = ?1, finished_at = ?2, updated_at = ?2
            WHERE id = ?3
            "#,
            params![CycleStatus::Finalized.to_db_str(), now.to_rfc3339(), cycle_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "InventoryCycle".to_string(),
                id: cycle_id.to_string(),
            });
        }
        Ok(())
    }

    /// 作废盘点单
    pub fn mark_canceled(&self, cycle_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Utc::now();

        let affected = conn.execute(
            r#"
            UPDATE inventory_cycles
            SET status = ?1, updated_at = ?2
            WHERE id = ?3
            "#,
            params![CycleStatus::Canceled.to_db_str(), now.to_rfc3339(), cycle_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "InventoryCycle".to_string(),
                id: cycle_id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 盘点明细
    // ==========================================

    /// 查询盘点单全部明细 (带物资参照信息)
    pub fn list_lines(&self, cycle_id: i64) -> RepositoryResult<Vec<CountLineDetail>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {cols}, m.code, m.description
            FROM count_lines cl
            JOIN materials m ON m.id = cl.material_id
            WHERE cl.cycle_id = ?1
            ORDER BY m.code
            "#,
            cols = "cl.id, cl.cycle_id, cl.material_id, cl.system_qty, cl.counted_qty, \
                    cl.divergence, cl.justification, cl.counted_by, cl.counted_at, cl.created_at"
        );
        let mut stmt = conn.prepare(&sql)?;

        let lines = stmt
            .query_map(params![cycle_id], |row| {
                Ok(CountLineDetail {
                    line: map_line(row)?,
                    material_code: row.get(10)?,
                    material_description: row.get(11)?,
                })
            })?
            .collect::<SqliteResult<Vec<CountLineDetail>>>()?;

        Ok(lines)
    }

    /// 查询 (盘点单, 物资) 明细行
    pub fn find_line(&self, cycle_id: i64, material_id: i64) -> RepositoryResult<Option<CountLine>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM count_lines WHERE cycle_id = ?1 AND material_id = ?2",
            LINE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![cycle_id, material_id], map_line) {
            Ok(line) => Ok(Some(line)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入清点结果 (单行, 最后写入者胜)
    ///
    /// # 说明
    /// - system_qty 不在更新列里: 快照基线建单后不可变
    /// - divergence 由调用方用纯函数算好传入, 本层只做缓存落库
    pub fn update_count(
        &self,
        line_id: i64,
        counted_qty: f64,
        divergence: f64,
        justification: Option<&str>,
        counted_by: Option<&str>,
        counted_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"
            UPDATE count_lines
            SET counted_qty = ?1, divergence = ?2, justification = ?3,
                counted_by = ?4, counted_at = ?5
            WHERE id = ?6
            "#,
            params![
                counted_qty,
                divergence,
                justification,
                counted_by,
                counted_at.to_rfc3339(),
                line_id,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "CountLine".to_string(),
                id: line_id.to_string(),
            });
        }
        Ok(())
    }

    /// 统计盘点单内尚未清点的明细数
    pub fn count_uncounted(&self, cycle_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM count_lines WHERE cycle_id = ?1 AND counted_qty IS NULL",
            params![cycle_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
