// ==========================================
// 仓库物资管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 仓库物资/库存/月度盘点核心 (无界面)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// API 层 - 业务接口
pub mod api;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表统一）
pub mod db;

// 身份提供者 - 当前操作人
pub mod identity;

// 日志系统
pub mod logging;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CycleStatus, MovementKind, MovementStatus, StockKind, StockStatus};

// 领域实体
pub use domain::{
    CountLine, InventoryCycle, Material, Movement, MovementLine, ReplenishmentItem, StockItem,
    StockLocation,
};

// 纯函数
pub use domain::inventory::divergence;

// API
pub use api::{InventoryApi, MaterialApi, MovementApi, MrpApi};

// 身份
pub use identity::{Actor, FixedIdentityProvider, IdentityProvider};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "仓库物资管理系统";

// 数据库 schema 版本
pub const DB_VERSION: &str = "v0.1";
