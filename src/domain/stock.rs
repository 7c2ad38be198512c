// ==========================================
// 仓库物资管理系统 - 库存地点与库存余额
// ==========================================
// 对齐: stock_locations / stock_items 表
// ==========================================

use crate::domain::types::StockKind;
use serde::{Deserialize, Serialize};

// ==========================================
// StockLocation - 库存地点
// ==========================================
// 红线: 只有 kind = TEAM_HELD 的地点可建盘点单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLocation {
    pub id: i64,                   // 地点 ID (自增)
    pub name: String,              // 地点名称
    pub kind: StockKind,           // 类别 (班组仓/个人仓)
    pub warehouse: Option<String>, // 所属库房
}

// ==========================================
// StockItem - 库存余额
// ==========================================
// 粒度: (地点, 物资) 唯一
// 说明: balance 为实时账面余额, 由移动单据增减;
//       盘点快照取的是建单时刻的 balance, 之后两者各自演化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub id: i64,          // 余额行 ID (自增)
    pub location_id: i64, // 库存地点 ID
    pub material_id: i64, // 物资 ID
    pub balance: f64,     // 账面余额
}
