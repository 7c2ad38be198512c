// ==========================================
// 仓库物资管理系统 - 库存移动仓储
// ==========================================
// 职责: 管理 movements / movement_lines 两张表, 以及随单据发生的余额增减
// 说明: 单据头 + 明细 + 余额增减在同一事务内提交,
//       不会出现只有头没有明细的孤儿单据
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::movement::{Movement, MovementLine, NewMovementLine};
use crate::domain::types::{MovementKind, MovementStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 移动单据列表行 (单据头 + 仓名 + 明细)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementListRow {
    pub movement: Movement,
    pub origin_name: Option<String>,
    pub dest_name: Option<String>,
    pub lines: Vec<MovementLine>,
}

const MOVEMENT_COLUMNS: &str = "id, kind, origin_location_id, dest_location_id, status, \
     reference, created_by, created_at, finalized_at";

fn parse_utc(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| s.parse::<DateTime<Utc>>().ok())
}

/// 行映射: movements 表 → Movement
fn map_movement(row: &Row<'_>) -> SqliteResult<Movement> {
    let kind_raw: String = row.get(1)?;
    let status_raw: String = row.get(4)?;
    Ok(Movement {
        id: row.get(0)?,
        kind: MovementKind::from_str(&kind_raw).unwrap_or(MovementKind::Transfer),
        origin_location_id: row.get(2)?,
        dest_location_id: row.get(3)?,
        status: MovementStatus::from_str(&status_raw).unwrap_or(MovementStatus::Pending),
        reference: row.get(5)?,
        created_by: row.get(6)?,
        created_at: parse_utc(row.get(7)?).unwrap_or_else(Utc::now),
        finalized_at: parse_utc(row.get(8)?),
    })
}

/// 行映射: movement_lines 表 → MovementLine
fn map_movement_line(row: &Row<'_>) -> SqliteResult<MovementLine> {
    Ok(MovementLine {
        id: row.get(0)?,
        movement_id: row.get(1)?,
        material_id: row.get(2)?,
        quantity: row.get(3)?,
        unit_value: row.get(4)?,
        note: row.get(5)?,
        justification: row.get(6)?,
    })
}

// ==========================================
// MovementRepository - 库存移动仓储
// ==========================================
pub struct MovementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MovementRepository {
    /// 创建新的 MovementRepository 实例
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

    /// 建单 + 明细 + 余额增减, 单事务提交
    ///
    /// # 参数
    /// - deltas: (地点 ID, 物资 ID, 余额变化量) 列表, 方向已由调用方按单据类型算好
    pub fn create_with_lines(
        &self,
        kind: MovementKind,
        origin_location_id: Option<i64>,
        dest_location_id: Option<i64>,
        reference: Option<&str>,
        created_by: Option<&str>,
        lines: &[NewMovementLine],
        deltas: &[(i64, i64, f64)],
    ) -> RepositoryResult<Movement> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let now = Utc::now();

        tx.execute(
            r#"
            INSERT INTO movements (
                kind, origin_location_id, dest_location_id, status,
                reference, created_by, created_at, finalized_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                kind.to_db_str(),
                origin_location_id,
                dest_location_id,
                MovementStatus::Approved.to_db_str(),
                reference,
                created_by,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;
        let movement_id = tx.last_insert_rowid();

        for line in lines {
            tx.execute(
                r#"
                INSERT INTO movement_lines (
                    movement_id, material_id, quantity, unit_value, note, justification
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    movement_id,
                    line.material_id,
                    line.quantity,
                    line.unit_value,
                    line.note,
                    line.justification,
                ],
            )?;
        }

        for (location_id, material_id, delta) in deltas {
            tx.execute(
                r#"
                INSERT INTO stock_items (location_id, material_id, balance)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(location_id, material_id)
                    DO UPDATE SET balance = balance + ?3
                "#,
                params![location_id, material_id, delta],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        drop(conn);

        self.find_movement(movement_id)?
            .ok_or(RepositoryError::NotFound {
                entity: "Movement".to_string(),
                id: movement_id.to_string(),
            })
    }

    /// 按 id 查询单据头
    pub fn find_movement(&self, id: i64) -> RepositoryResult<Option<Movement>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM movements WHERE id = ?1", MOVEMENT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![id], map_movement) {
            Ok(movement) => Ok(Some(movement)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询单据明细
    pub fn list_lines(&self, movement_id: i64) -> RepositoryResult<Vec<MovementLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, movement_id, material_id, quantity, unit_value, note, justification
            FROM movement_lines
            WHERE movement_id = ?1
            ORDER BY id
            "#,
        )?;

        let lines = stmt
            .query_map(params![movement_id], map_movement_line)?
            .collect::<SqliteResult<Vec<MovementLine>>>()?;

        Ok(lines)
    }

    /// 查询单据列表 (带仓名与明细, 新单在前)
    ///
    /// # 参数
    /// - kind: 单据类型过滤, None 表示全部
    /// - limit: 返回记录数上限 (0 或负数表示不限制)
    pub fn list_movements(
        &self,
        kind: Option<MovementKind>,
        limit: i32,
    ) -> RepositoryResult<Vec<MovementListRow>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {cols}, so.name, sd.name
            FROM movements mv
            LEFT JOIN stock_locations so ON so.id = mv.origin_location_id
            LEFT JOIN stock_locations sd ON sd.id = mv.dest_location_id
            WHERE (?1 IS NULL OR mv.kind = ?1)
            ORDER BY mv.created_at DESC, mv.id DESC
            LIMIT ?2
            "#,
            cols = "mv.id, mv.kind, mv.origin_location_id, mv.dest_location_id, mv.status, \
                    mv.reference, mv.created_by, mv.created_at, mv.finalized_at"
        );
        let mut stmt = conn.prepare(&sql)?;

        let effective_limit = if limit > 0 { limit as i64 } else { -1 };
        let headers = stmt
            .query_map(
                params![kind.map(|k| k.to_db_str()), effective_limit],
                |row| {
                    Ok((map_movement(row)?, row.get::<_, Option<String>>(9)?, row
                        .get::<_, Option<String>>(10)?))
                },
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        drop(stmt);
        drop(conn);

        let mut rows = Vec::with_capacity(headers.len());
        for (movement, origin_name, dest_name) in headers {
            let lines = self.list_lines(movement.id)?;
            rows.push(MovementListRow {
                movement,
                origin_name,
                dest_name,
                lines,
            });
        }

        Ok(rows)
    }
}
