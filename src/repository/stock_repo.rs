// ==========================================
// 仓库物资管理系统 - 库存地点/余额仓储
// ==========================================
// 红线: Repository 不含业务逻辑, 只负责数据访问
// 说明: 余额的增减只经由 MovementRepository 的事务完成,
//       本仓储对 balance 只提供读取与种子写入
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::stock::{StockItem, StockLocation};
use crate::domain::types::StockKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

/// 库存地点/余额仓储
pub struct StockRepository {
    conn: Arc<Mutex<Connection>>,
}

/// 行映射: stock_locations 表 → StockLocation
fn map_location(row: &Row<'_>) -> SqliteResult<StockLocation> {
    let kind_raw: String = row.get(2)?;
    Ok(StockLocation {
        id: row.get(0)?,
        name: row.get(1)?,
        // 未知类别按个人仓处理, 自然排除在盘点流程外
        kind: StockKind::from_str(&kind_raw).unwrap_or(StockKind::IndividualHeld),
        warehouse: row.get(3)?,
    })
}

/// 行映射: stock_items 表 → StockItem
fn map_stock_item(row: &Row<'_>) -> SqliteResult<StockItem> {
    Ok(StockItem {
        id: row.get(0)?,
        location_id: row.get(1)?,
        material_id: row.get(2)?,
        balance: row.get(3)?,
    })
}

impl StockRepository {
    /// 创建新的 StockRepository 实例
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
    // 库存地点
    // ==========================================

    /// 插入库存地点
    pub fn insert_location(
        &self,
        name: &str,
        kind: StockKind,
        warehouse: Option<&str>,
    ) -> RepositoryResult<StockLocation> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO stock_locations (name, kind, warehouse) VALUES (?1, ?2, ?3)",
            params![name, kind.to_db_str(), warehouse],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.find_location(id)?.ok_or(RepositoryError::NotFound {
            entity: "StockLocation".to_string(),
            id: id.to_string(),
        })
    }

    /// 按 id 查询库存地点
    pub fn find_location(&self, id: i64) -> RepositoryResult<Option<StockLocation>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, kind, warehouse FROM stock_locations WHERE id = ?1")?;

        match stmt.query_row(params![id], map_location) {
            Ok(location) => Ok(Some(location)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询库存地点列表
    ///
    /// # 参数
    /// - kind: 类别过滤, None 表示全部
    pub fn list_locations(&self, kind: Option<StockKind>) -> RepositoryResult<Vec<StockLocation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, kind, warehouse
            FROM stock_locations
            WHERE (?1 IS NULL OR kind = ?1)
            ORDER BY name
            "#,
        )?;

        let locations = stmt
            .query_map(params![kind.map(|k| k.to_db_str())], map_location)?
            .collect::<SqliteResult<Vec<StockLocation>>>()?;

        Ok(locations)
    }

    // ==========================================
    // 库存余额
    // ==========================================

    /// 查询某地点的全部余额行 (含零余额)
    pub fn list_items_by_location(&self, location_id: i64) -> RepositoryResult<Vec<StockItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, location_id, material_id, balance
            FROM stock_items
            WHERE location_id = ?1
            ORDER BY material_id
            "#,
        )?;

        let items = stmt
            .query_map(params![location_id], map_stock_item)?
            .collect::<SqliteResult<Vec<StockItem>>>()?;

        Ok(items)
    }

    /// 查询 (地点, 物资) 余额行
    pub fn find_item(
        &self,
        location_id: i64,
        material_id: i64,
    ) -> RepositoryResult<Option<StockItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, location_id, material_id, balance
            FROM stock_items
            WHERE location_id = ?1 AND material_id = ?2
            "#,
        )?;

        match stmt.query_row(params![location_id, material_id], map_stock_item) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入/覆盖余额行 (upsert, 用于初始化与数据导入)
    pub fn upsert_item(
        &self,
        location_id: i64,
        material_id: i64,
        balance: f64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO stock_items (location_id, material_id, balance)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(location_id, material_id) DO UPDATE SET balance = ?3
            "#,
            params![location_id, material_id, balance],
        )?;
        Ok(())
    }
}
