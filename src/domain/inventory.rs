// ==========================================
// 仓库物资管理系统 - 月度盘点领域模型
// ==========================================
// 对齐: inventory_cycles / count_lines 表
// 红线: system_qty 为建单时刻快照, 之后绝不重算,
//       即使账面余额继续变动 —— 清点始终对着稳定基线比较
// ==========================================

use crate::domain::types::CycleStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// InventoryCycle - 盘点单 (一个地点一个参考月)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryCycle {
    // ===== 主键与关联 =====
    pub id: i64,          // 盘点单 ID (自增)
    pub location_id: i64, // 目标库存地点 (FK)

    // ===== 盘点信息 =====
    pub reference_month: NaiveDate, // 参考月 (归一到当月 1 号)
    pub status: CycleStatus,        // 状态机见 CycleStatus
    pub responsible_id: Option<String>, // 责任人 (身份提供者给出, 可空)
    pub notes: Option<String>,      // 备注

    // ===== 时间戳 =====
    pub started_at: Option<DateTime<Utc>>,  // 首次打开清点视图时间
    pub finished_at: Option<DateTime<Utc>>, // 封存时间

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 记录创建时间
    pub updated_at: DateTime<Utc>, // 记录更新时间
}

// ==========================================
// CountLine - 盘点明细 (一个物资一行)
// ==========================================
// 归属: 明细由盘点单独占, 删除盘点单时级联删除
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountLine {
    // ===== 主键与关联 =====
    pub id: i64,          // 明细 ID (自增)
    pub cycle_id: i64,    // 盘点单 ID (FK, 级联)
    pub material_id: i64, // 物资 ID (FK)

    // ===== 数量 =====
    pub system_qty: f64,          // 账面数量 (快照, 建单后不可变)
    pub counted_qty: Option<f64>, // 实盘数量 (NULL = 尚未清点)
    pub divergence: Option<f64>,  // 差异 = 实盘 - 账面 (纯函数缓存, 未清点为 NULL)

    // ===== 差异说明 =====
    pub justification: Option<String>, // 差异说明 (差异非零时按制度应填, 数据层不强制)

    // ===== 清点审计 =====
    pub counted_by: Option<String>,        // 清点人
    pub counted_at: Option<DateTime<Utc>>, // 清点时间

    pub created_at: DateTime<Utc>, // 记录创建时间
}

// ==========================================
// divergence - 差异纯函数
// ==========================================
/// 差异 = 实盘数量 - 账面数量
///
/// 未清点 (counted = None) 时差异无定义, 返回 None。
/// count_lines.divergence 列只是本函数的缓存, 每次录入清点数量时重算,
/// 绝不把陈旧的存储值当权威。
pub fn divergence(counted: Option<f64>, system: f64) -> Option<f64> {
    counted.map(|c| c - system)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divergence_undefined_when_uncounted() {
        assert_eq!(divergence(None, 10.0), None);
        assert_eq!(divergence(None, 0.0), None);
    }

    #[test]
    fn test_divergence_is_counted_minus_system() {
        assert_eq!(divergence(Some(8.0), 10.0), Some(-2.0));
        assert_eq!(divergence(Some(10.0), 10.0), Some(0.0));
        assert_eq!(divergence(Some(3.5), 1.25), Some(2.25));
        // 账面为零也有定义
        assert_eq!(divergence(Some(4.0), 0.0), Some(4.0));
    }
}
