// ==========================================
// 仓库物资管理系统 - 库存移动 API
// ==========================================
// 职责: 调拨/入库/出库单据编排
// 红线:
// - 端点规则由单据类型决定, 在本层显式校验
// - 余额增减与单据同一事务, 绝不分步提交
// - 负余额政策可配置, 默认放行 (账面负数留给盘点纠偏)
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::movement::{Movement, NewMovementLine};
use crate::domain::types::MovementKind;
use crate::identity::IdentityProvider;
use crate::repository::movement_repo::{MovementListRow, MovementRepository};
use crate::repository::stock_repo::StockRepository;

// ==========================================
// MovementApi - 库存移动 API
// ==========================================

/// 库存移动API
///
/// 职责：
/// 1. 按单据类型校验端点 (入库只有目标仓, 出库只有来源仓, 调拨两者都要)
/// 2. 计算余额增减方向并交由仓储事务落库
/// 3. 负余额政策把关
pub struct MovementApi {
    movement_repo: Arc<MovementRepository>,
    stock_repo: Arc<StockRepository>,
    config: Arc<ConfigManager>,
    identity: Arc<dyn IdentityProvider>,
}

impl MovementApi {
    /// 创建新的MovementApi实例
    pub fn new(
        movement_repo: Arc<MovementRepository>,
        stock_repo: Arc<StockRepository>,
        config: Arc<ConfigManager>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            movement_repo,
            stock_repo,
            config,
            identity,
        }
    }

    /// 创建移动单据并即时生效
    ///
    /// # 参数
    /// - kind: 单据类型 (决定端点要求与余额方向)
    /// - origin_location_id / dest_location_id: 来源/目标仓
    /// - reference: 外部参考号
    /// - lines: 明细 (至少一条, 数量恒为正)
    ///
    /// # 说明
    /// 单据头、明细、余额增减同一事务提交, 任一失败整单回滚
    pub fn create_movement(
        &self,
        kind: MovementKind,
        origin_location_id: Option<i64>,
        dest_location_id: Option<i64>,
        reference: Option<String>,
        lines: Vec<NewMovementLine>,
    ) -> ApiResult<Movement> {
        // 端点规则校验 (未发起任何写入)
        self.validate_endpoints(kind, origin_location_id, dest_location_id)?;

        if lines.is_empty() {
            return Err(ApiError::ValidationError(
                "单据至少需要一条明细".to_string(),
            ));
        }
        for line in &lines {
            if line.quantity <= 0.0 {
                return Err(ApiError::ValidationError(format!(
                    "物资 {} 的数量必须为正: {}",
                    line.material_id, line.quantity
                )));
            }
            if line.unit_value < 0.0 {
                return Err(ApiError::ValidationError(format!(
                    "物资 {} 的单价不能为负: {}",
                    line.material_id, line.unit_value
                )));
            }
        }

        // 端点存在性校验
        if let Some(id) = origin_location_id {
            self.stock_repo
                .find_location(id)?
                .ok_or_else(|| ApiError::NotFound(format!("StockLocation(id={})不存在", id)))?;
        }
        if let Some(id) = dest_location_id {
            self.stock_repo
                .find_location(id)?
                .ok_or_else(|| ApiError::NotFound(format!("StockLocation(id={})不存在", id)))?;
        }

        // 余额增减方向: 入库加目标仓, 出库减来源仓, 调拨两边各记一笔
        let mut deltas: Vec<(i64, i64, f64)> = Vec::new();
        for line in &lines {
            if let Some(origin) = origin_location_id {
                deltas.push((origin, line.material_id, -line.quantity));
            }
            if let Some(dest) = dest_location_id {
                deltas.push((dest, line.material_id, line.quantity));
            }
        }

        // 负余额政策: 关闭放行时, 出库侧余额不足整单拒绝
        // (单连接串行访问, 校验到提交之间没有并发窗口)
        let allow_negative = self
            .config
            .get_allow_negative_balance()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        if !allow_negative {
            if let Some(origin) = origin_location_id {
                for line in &lines {
                    let balance = self
                        .stock_repo
                        .find_item(origin, line.material_id)?
                        .map(|item| item.balance)
                        .unwrap_or(0.0);
                    if balance - line.quantity < 0.0 {
                        return Err(ApiError::BusinessRuleViolation(format!(
                            "物资 {} 余额不足: 现有 {}, 需要 {}",
                            line.material_id, balance, line.quantity
                        )));
                    }
                }
            }
        }

        let actor = self.identity.current_actor();
        let movement = self.movement_repo.create_with_lines(
            kind,
            origin_location_id,
            dest_location_id,
            reference.as_deref(),
            actor.as_ref().map(|a| a.id.as_str()),
            &lines,
            &deltas,
        )?;

        info!(
            movement_id = movement.id,
            kind = %kind,
            line_count = lines.len(),
            "移动单据已生效"
        );

        Ok(movement)
    }

    /// 查询单据列表 (带仓名与明细, 新单在前)
    ///
    /// # 参数
    /// - kind: 单据类型过滤, None 表示全部
    /// - search: 按参考号/仓名做不区分大小写的子串过滤
    /// - limit: 返回记录数上限 (0 或负数表示不限制, 过滤前生效)
    pub fn list_movements(
        &self,
        kind: Option<MovementKind>,
        search: Option<&str>,
        limit: i32,
    ) -> ApiResult<Vec<MovementListRow>> {
        let rows = self.movement_repo.list_movements(kind, limit)?;

        let filtered = match search.map(|s| s.trim().to_lowercase()) {
            Some(needle) if !needle.is_empty() => rows
                .into_iter()
                .filter(|row| {
                    let hit = |field: &Option<String>| {
                        field
                            .as_deref()
                            .map(|s| s.to_lowercase().contains(&needle))
                            .unwrap_or(false)
                    };
                    hit(&row.movement.reference) || hit(&row.origin_name) || hit(&row.dest_name)
                })
                .collect(),
            _ => rows,
        };

        Ok(filtered)
    }

    /// 端点规则: 每种单据类型要求的来源/目标仓组合是封闭的
    fn validate_endpoints(
        &self,
        kind: MovementKind,
        origin: Option<i64>,
        dest: Option<i64>,
    ) -> ApiResult<()> {
        if kind.requires_origin() && origin.is_none() {
            return Err(ApiError::ValidationError(format!(
                "{} 单据必须指定来源仓",
                kind
            )));
        }
        if !kind.requires_origin() && origin.is_some() {
            return Err(ApiError::ValidationError(format!(
                "{} 单据不能指定来源仓",
                kind
            )));
        }
        if kind.requires_destination() && dest.is_none() {
            return Err(ApiError::ValidationError(format!(
                "{} 单据必须指定目标仓",
                kind
            )));
        }
        if !kind.requires_destination() && dest.is_some() {
            return Err(ApiError::ValidationError(format!(
                "{} 单据不能指定目标仓",
                kind
            )));
        }
        if kind == MovementKind::Transfer && origin == dest {
            return Err(ApiError::ValidationError(
                "调拨单的来源仓与目标仓不能相同".to_string(),
            ));
        }
        Ok(())
    }
}
