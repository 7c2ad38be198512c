// ==========================================
// 仓库物资管理系统 - 补货视图行 (MRP)
// ==========================================
// 对齐: vw_replenishment 视图 (只读派生, 非事实层)
// 说明: 水位状态与建议补货量由视图计算,
//       本层只负责取数/过滤/汇总金额
// ==========================================

use crate::domain::types::StockStatus;
use serde::{Deserialize, Serialize};

// ==========================================
// ReplenishmentItem - 需补货物资行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplenishmentItem {
    pub material_id: i64,            // 物资 ID
    pub code: String,                // 物资编码
    pub description: String,         // 物资描述
    pub unit_cost: f64,              // 单位成本
    pub stock_min: f64,              // 最低库存
    pub reorder_point: Option<f64>,  // 补货点
    pub lead_time_days: Option<i32>, // 采购提前期 (天)
    pub total_balance: f64,          // 全地点汇总余额
    pub status: StockStatus,         // 水位状态 (CRITICAL/WARNING)
    pub suggested_qty: f64,          // 建议补货量
}

impl ReplenishmentItem {
    /// 本行的预估补货成本 = 建议补货量 × 单位成本
    pub fn estimated_cost(&self) -> f64 {
        self.suggested_qty * self.unit_cost
    }
}
