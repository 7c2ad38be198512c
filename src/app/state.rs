// ==========================================
// 仓库物资管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 所有仓储共享同一个 SQLite 连接 (Arc<Mutex>),
//       单连接串行访问即为本系统的并发口径
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{InventoryApi, MaterialApi, MovementApi, MrpApi};
use crate::config::config_manager::ConfigManager;
use crate::db;
use crate::identity::IdentityProvider;
use crate::repository::{
    InventoryRepository, MaterialRepository, MovementRepository, ReplenishmentRepository,
    StockRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 物资主数据API
    pub material_api: Arc<MaterialApi>,

    /// 月度盘点API
    pub inventory_api: Arc<InventoryApi>,

    /// 库存移动API
    pub movement_api: Arc<MovementApi>,

    /// 补货计划API
    pub mrp_api: Arc<MrpApi>,

    /// 库存地点/余额仓储（用于地点维护与数据导入）
    pub stock_repo: Arc<StockRepository>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - identity: 当前操作人提供者
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并初始化 schema（幂等）
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String, identity: Arc<dyn IdentityProvider>) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn =
            db::open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        db::init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================

        let material_repo = Arc::new(MaterialRepository::from_connection(conn.clone()));
        let stock_repo = Arc::new(StockRepository::from_connection(conn.clone()));
        let inventory_repo = Arc::new(InventoryRepository::from_connection(conn.clone()));
        let movement_repo = Arc::new(MovementRepository::from_connection(conn.clone()));
        let replenishment_repo = Arc::new(ReplenishmentRepository::from_connection(conn.clone()));

        // 配置管理器
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================

        let material_api = Arc::new(MaterialApi::new(material_repo));

        let inventory_api = Arc::new(InventoryApi::new(
            inventory_repo,
            stock_repo.clone(),
            config_manager.clone(),
            identity.clone(),
        ));

        let movement_api = Arc::new(MovementApi::new(
            movement_repo,
            stock_repo.clone(),
            config_manager.clone(),
            identity,
        ));

        let mrp_api = Arc::new(MrpApi::new(replenishment_repo));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            material_api,
            inventory_api,
            movement_api,
            mrp_api,
            stock_repo,
            config_manager,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 WAREHOUSE_STORES_DB_PATH 优先（便于调试/测试/CI）
/// - 其次: 用户数据目录/warehouse-stores/warehouse_stores.db
/// - 回退: 当前目录 ./warehouse_stores.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("WAREHOUSE_STORES_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./warehouse_stores.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("warehouse-stores");
        // 确保目录存在
        std::fs::create_dir_all(&dir).ok();
        path = dir.join("warehouse_stores.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    // 注意：AppState::new() 的测试需要真实的数据库文件
    // 这些测试在集成测试中进行
}
