// ==========================================
// 仓库物资管理系统 - 配置层
// ==========================================

pub mod config_manager;

pub use config_manager::{config_keys, ConfigManager};
