// ==========================================
// 仓库物资管理系统 - 物资领域模型
// ==========================================
// 用途: 物资主数据, 盘点/移动/补货流程的只读参照
// 对齐: materials 表
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Material - 物资主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    // ===== 主键 =====
    pub id: i64, // 物资 ID (自增)

    // ===== 基础信息 =====
    pub code: String,        // 物资编码 (唯一)
    pub description: String, // 物资描述
    pub unit_cost: f64,      // 单位成本

    // ===== 补货参数 (MRP) =====
    pub stock_min: f64,              // 最低库存
    pub stock_max: Option<f64>,      // 最高库存
    pub reorder_point: Option<f64>,  // 补货点
    pub lead_time_days: Option<i32>, // 采购提前期 (天)

    // ===== 管理字段 =====
    pub active: bool,          // 是否启用
    pub notes: Option<String>, // 备注

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 记录创建时间
    pub updated_at: DateTime<Utc>, // 记录更新时间
}

// ==========================================
// NewMaterial - 物资创建/更新入参
// ==========================================
// 用途: API 层入参, id 与审计字段由仓储生成
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMaterial {
    pub code: String,
    pub description: String,
    pub unit_cost: f64,
    pub stock_min: f64,
    pub stock_max: Option<f64>,
    pub reorder_point: Option<f64>,
    pub lead_time_days: Option<i32>,
    pub active: bool,
    pub notes: Option<String>,
}
