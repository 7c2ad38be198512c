// ==========================================
// 仓库物资管理系统 - API层
// ==========================================
// 职责: 面向调用方的服务门面, 业务校验 + 状态守卫 + 编排
// 红线: 所有仓储错误必须向上呈现, 不允许吞掉
// ==========================================

pub mod error;
pub mod inventory_api;
pub mod material_api;
pub mod movement_api;
pub mod mrp_api;

pub use error::{ApiError, ApiResult};
pub use inventory_api::{CountEntry, CountFailure, CountSaveReport, InventoryApi};
pub use material_api::MaterialApi;
pub use movement_api::MovementApi;
pub use mrp_api::{MrpApi, ReplenishmentSummary};
