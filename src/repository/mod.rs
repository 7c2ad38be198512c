// ==========================================
// 仓库物资管理系统 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口, 屏蔽数据库细节
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化, 防止 SQL 注入
// ==========================================

pub mod error;
pub mod inventory_repo;
pub mod material_repo;
pub mod movement_repo;
pub mod replenishment_repo;
pub mod stock_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use inventory_repo::{CountLineDetail, CycleListRow, InventoryRepository};
pub use material_repo::MaterialRepository;
pub use movement_repo::{MovementListRow, MovementRepository};
pub use replenishment_repo::ReplenishmentRepository;
pub use stock_repo::StockRepository;
