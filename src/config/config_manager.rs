// ==========================================
// 仓库物资管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 说明: 业务政策开关 (盘点封存完整性/负余额) 都在这里,
//       缺省值保持与既有制度一致
// ==========================================

use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }
        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（UPSERT, scope_id='global'）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    // ===== 盘点政策 =====

    /// 封存前是否要求所有明细已清点
    ///
    /// 默认 false: 允许带未清点明细封存（既有制度如此,
    /// 需要更严格的口径时把 inventory_require_complete_count 置 "1"）
    pub fn get_require_complete_count(&self) -> Result<bool, Box<dyn Error>> {
        let value =
            self.get_config_or_default(config_keys::INVENTORY_REQUIRE_COMPLETE_COUNT, "0")?;
        Ok(value.trim() == "1")
    }

    // ===== 移动政策 =====

    /// 出库/调拨是否允许把余额扣成负数
    ///
    /// 默认 true: 与既有制度一致（账面负数留给盘点纠偏）
    pub fn get_allow_negative_balance(&self) -> Result<bool, Box<dyn Error>> {
        let value =
            self.get_config_or_default(config_keys::MOVEMENT_ALLOW_NEGATIVE_BALANCE, "1")?;
        Ok(value.trim() != "0")
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 盘点
    pub const INVENTORY_REQUIRE_COMPLETE_COUNT: &str = "inventory_require_complete_count";

    // 库存移动
    pub const MOVEMENT_ALLOW_NEGATIVE_BALANCE: &str = "movement_allow_negative_balance";
}
