// ==========================================
// 仓库物资管理系统 - 物资主数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑, 只负责数据访问
// 约束: 所有查询使用参数化, 防止 SQL 注入
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::material::{Material, NewMaterial};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

/// 物资主数据仓储
/// 职责: 管理 materials 表的 CRUD 操作
pub struct MaterialRepository {
    conn: Arc<Mutex<Connection>>,
}

const MATERIAL_COLUMNS: &str = "id, code, description, unit_cost, stock_min, stock_max, \
     reorder_point, lead_time_days, active, notes, created_at, updated_at";

/// 行映射: materials 表 → Material
fn map_material(row: &Row<'_>) -> SqliteResult<Material> {
    Ok(Material {
        id: row.get(0)?,
        code: row.get(1)?,
        description: row.get(2)?,
        unit_cost: row.get(3)?,
        stock_min: row.get(4)?,
        stock_max: row.get(5)?,
        reorder_point: row.get(6)?,
        lead_time_days: row.get(7)?,
        active: row.get::<_, i64>(8)? != 0,
        notes: row.get(9)?,
        created_at: row
            .get::<_, String>(10)?
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
        updated_at: row
            .get::<_, String>(11)?
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
    })
}

impl MaterialRepository {
    /// 创建新的 MaterialRepository 实例
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

    /// 插入物资, 返回带服务端分配 id 的完整记录
    pub fn insert(&self, new: &NewMaterial) -> RepositoryResult<Material> {
        let conn = self.get_conn()?;
        let now = Utc::now();

        conn.execute(
            r#"
            INSERT INTO materials (
                code, description, unit_cost, stock_min, stock_max,
                reorder_point, lead_time_days, active, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                new.code,
                new.description,
                new.unit_cost,
                new.stock_min,
                new.stock_max,
                new.reorder_point,
                new.lead_time_days,
                new.active as i64,
                new.notes,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        drop(conn);

        self.find_by_id(id)?.ok_or(RepositoryError::NotFound {
            entity: "Material".to_string(),
            id: id.to_string(),
        })
    }

    /// 按 id 更新物资
    pub fn update(&self, id: i64, new: &NewMaterial) -> RepositoryResult<Material> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"
            UPDATE materials SET
                code = ?1, description = ?2, unit_cost = ?3, stock_min = ?4,
                stock_max = ?5, reorder_point = ?6, lead_time_days = ?7,
                active = ?8, notes = ?9, updated_at = ?10
            WHERE id = ?11
            "#,
            params![
                new.code,
                new.description,
                new.unit_cost,
                new.stock_min,
                new.stock_max,
                new.reorder_point,
                new.lead_time_days,
                new.active as i64,
                new.notes,
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;
        drop(conn);

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Material".to_string(),
                id: id.to_string(),
            });
        }

        self.find_by_id(id)?.ok_or(RepositoryError::NotFound {
            entity: "Material".to_string(),
            id: id.to_string(),
        })
    }

    /// 按 id 查询物资
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Material>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM materials WHERE id = ?1", MATERIAL_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![id], map_material) {
            Ok(material) => Ok(Some(material)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按编码查询物资
    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Material>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM materials WHERE code = ?1", MATERIAL_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![code], map_material) {
            Ok(material) => Ok(Some(material)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询物资列表
    ///
    /// # 参数
    /// - search: 编码/描述子串过滤 (不区分大小写), None 表示不过滤
    /// - only_active: 只返回启用的物资
    pub fn list(&self, search: Option<&str>, only_active: bool) -> RepositoryResult<Vec<Material>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM materials
            WHERE (?1 IS NULL OR lower(code) LIKE '%' || lower(?1) || '%'
                              OR lower(description) LIKE '%' || lower(?1) || '%')
              AND (?2 = 0 OR active = 1)
            ORDER BY description
            "#,
            MATERIAL_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let materials = stmt
            .query_map(params![search, only_active as i64], map_material)?
            .collect::<SqliteResult<Vec<Material>>>()?;

        Ok(materials)
    }
}
