// ==========================================
// 仓库物资管理系统 - 库存移动领域模型
// ==========================================
// 对齐: movements / movement_lines 表
// 说明: 移动单据实时增减 stock_items.balance,
//       盘点快照取的正是这些余额的某一时刻切面
// ==========================================

use crate::domain::types::{MovementKind, MovementStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Movement - 移动单据头
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    // ===== 主键 =====
    pub id: i64, // 单据 ID (自增)

    // ===== 单据信息 =====
    pub kind: MovementKind,            // 调拨/入库/出库
    pub origin_location_id: Option<i64>, // 来源仓 (入库单为空)
    pub dest_location_id: Option<i64>,   // 目标仓 (出库单为空)
    pub status: MovementStatus,        // 单据状态
    pub reference: Option<String>,     // 外部参考号

    // ===== 审计字段 =====
    pub created_by: Option<String>,          // 制单人
    pub created_at: DateTime<Utc>,           // 制单时间
    pub finalized_at: Option<DateTime<Utc>>, // 生效时间
}

// ==========================================
// MovementLine - 移动明细
// ==========================================
// 归属: 明细由单据头独占, 删除单据头时级联删除
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementLine {
    pub id: i64,                       // 明细 ID (自增)
    pub movement_id: i64,              // 单据头 ID (FK, 级联)
    pub material_id: i64,              // 物资 ID (FK)
    pub quantity: f64,                 // 数量 (恒为正, 方向由单据类型决定)
    pub unit_value: f64,               // 单价
    pub note: Option<String>,          // 备注
    pub justification: Option<String>, // 领用事由
}

// ==========================================
// NewMovementLine - 明细入参
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMovementLine {
    pub material_id: i64,
    pub quantity: f64,
    pub unit_value: f64,
    pub note: Option<String>,
    pub justification: Option<String>,
}
