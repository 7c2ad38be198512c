// ==========================================
// 仓库物资管理系统 - 领域层
// ==========================================
// 红线: 领域层只含实体/类型/纯函数, 不含数据访问
// ==========================================

pub mod inventory;
pub mod material;
pub mod movement;
pub mod replenishment;
pub mod stock;
pub mod types;

// 重导出核心实体
pub use inventory::{divergence, CountLine, InventoryCycle};
pub use material::{Material, NewMaterial};
pub use movement::{Movement, MovementLine, NewMovementLine};
pub use replenishment::ReplenishmentItem;
pub use stock::{StockItem, StockLocation};
