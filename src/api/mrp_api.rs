// ==========================================
// 仓库物资管理系统 - 补货计划 API (MRP)
// ==========================================
// 职责: 补货清单查询/过滤/汇总
// 说明: 水位状态与建议补货量来自 vw_replenishment 视图,
//       本层只做内存过滤与金额汇总, 不另行推导
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::domain::replenishment::ReplenishmentItem;
use crate::domain::types::StockStatus;
use crate::repository::replenishment_repo::ReplenishmentRepository;

/// 补货清单汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplenishmentSummary {
    pub critical_count: usize,     // 低于最低库存的物资数
    pub warning_count: usize,      // 低于补货点的物资数
    pub estimated_total_cost: f64, // 预估补货总金额 Σ(建议补货量 × 单位成本)
}

// ==========================================
// MrpApi - 补货计划 API
// ==========================================
pub struct MrpApi {
    replenishment_repo: Arc<ReplenishmentRepository>,
}

impl MrpApi {
    /// 创建新的MrpApi实例
    pub fn new(replenishment_repo: Arc<ReplenishmentRepository>) -> Self {
        Self { replenishment_repo }
    }

    /// 查询需补货物资清单 (危急在前)
    ///
    /// # 参数
    /// - search: 按编码/描述做不区分大小写的子串过滤, None 表示全部
    pub fn list_replenishment(
        &self,
        search: Option<&str>,
    ) -> ApiResult<Vec<ReplenishmentItem>> {
        let items = self.replenishment_repo.list_needing_replenishment()?;

        let filtered = match search.map(|s| s.trim().to_lowercase()) {
            Some(needle) if !needle.is_empty() => items
                .into_iter()
                .filter(|item| {
                    item.code.to_lowercase().contains(&needle)
                        || item.description.to_lowercase().contains(&needle)
                })
                .collect(),
            _ => items,
        };

        Ok(filtered)
    }

    /// 补货清单汇总 (危急/预警计数 + 预估总金额)
    pub fn replenishment_summary(&self) -> ApiResult<ReplenishmentSummary> {
        let items = self.replenishment_repo.list_needing_replenishment()?;

        let critical_count = items
            .iter()
            .filter(|i| i.status == StockStatus::Critical)
            .count();
        let warning_count = items
            .iter()
            .filter(|i| i.status == StockStatus::Warning)
            .count();
        let estimated_total_cost = items.iter().map(|i| i.estimated_cost()).sum();

        Ok(ReplenishmentSummary {
            critical_count,
            warning_count,
            estimated_total_cost,
        })
    }
}
