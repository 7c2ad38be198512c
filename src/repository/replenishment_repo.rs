// ==========================================
// 仓库物资管理系统 - 补货视图仓储 (MRP)
// ==========================================
// 职责: 只读取 vw_replenishment 视图
// 红线: 水位状态/建议补货量由视图计算, 本层绝不另行推导
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::replenishment::ReplenishmentItem;
use crate::domain::types::StockStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

/// 行映射: vw_replenishment 视图 → ReplenishmentItem
fn map_item(row: &Row<'_>) -> SqliteResult<ReplenishmentItem> {
    let status_raw: String = row.get(8)?;
    Ok(ReplenishmentItem {
        material_id: row.get(0)?,
        code: row.get(1)?,
        description: row.get(2)?,
        unit_cost: row.get(3)?,
        stock_min: row.get(4)?,
        reorder_point: row.get(5)?,
        lead_time_days: row.get(6)?,
        total_balance: row.get(7)?,
        status: StockStatus::from_str(&status_raw).unwrap_or(StockStatus::Normal),
        suggested_qty: row.get(9)?,
    })
}

// ==========================================
// ReplenishmentRepository - 补货视图仓储
// ==========================================
pub struct ReplenishmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReplenishmentRepository {
    /// 创建新的 ReplenishmentRepository 实例
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

    /// 查询需补货物资 (只含 CRITICAL/WARNING 行, 危急在前)
    pub fn list_needing_replenishment(&self) -> RepositoryResult<Vec<ReplenishmentItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT material_id, code, description, unit_cost, stock_min,
                   reorder_point, lead_time_days, total_balance, status, suggested_qty
            FROM vw_replenishment
            WHERE status IN ('CRITICAL', 'WARNING')
            ORDER BY CASE status WHEN 'CRITICAL' THEN 0 ELSE 1 END, code
            "#,
        )?;

        let items = stmt
            .query_map(params![], map_item)?
            .collect::<SqliteResult<Vec<ReplenishmentItem>>>()?;

        Ok(items)
    }
}
