// ==========================================
// 仓库物资管理系统 - 月度盘点 API
// ==========================================
// 职责: 盘点单生命周期编排 (建单快照 → 清点 → 封存/作废)
// 红线:
// - 状态守卫在本层显式执行, 不依赖界面隐藏输入
// - 每次仓储调用的失败都必须向调用方呈现
// - 差异只作为纯函数缓存写入, 每次录入重算
// ==========================================

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::inventory::{divergence, CountLine, InventoryCycle};
use crate::domain::types::{CycleStatus, StockKind};
use crate::identity::IdentityProvider;
use crate::repository::inventory_repo::{CountLineDetail, CycleListRow, InventoryRepository};
use crate::repository::stock_repo::StockRepository;

// ==========================================
// DTO
// ==========================================

/// 单条清点录入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountEntry {
    pub material_id: i64,
    pub counted_qty: f64,
    pub justification: Option<String>,
}

/// 批量清点失败明细
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountFailure {
    pub material_id: i64,
    pub reason: String,
}

/// 批量清点保存报告
///
/// 各行独立写入: 某一行失败不回滚之前已保存的行,
/// 失败行逐条列出, 由调用方决定重试
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountSaveReport {
    pub saved: Vec<CountLine>,
    pub failures: Vec<CountFailure>,
}

// ==========================================
// 参考月解析
// ==========================================

/// 解析参考月并归一到当月 1 号
///
/// 接受 "YYYY-MM" 或完整日期 "YYYY-MM-DD" (日部分被抹到 1 号)
pub fn parse_reference_month(raw: &str) -> ApiResult<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::ValidationError("参考月不能为空".to_string()));
    }

    let parsed = if trimmed.len() == 7 {
        NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d")
    } else {
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
    };

    match parsed {
        Ok(date) => Ok(NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
            .unwrap_or(date)),
        Err(_) => Err(ApiError::ValidationError(format!(
            "参考月格式错误 (期望 YYYY-MM): {}",
            raw
        ))),
    }
}

// ==========================================
// InventoryApi - 月度盘点 API
// ==========================================

/// 月度盘点API
///
/// 职责：
/// 1. 建单并快照账面余额
/// 2. 清点录入 (单条/批量, 最后写入者胜)
/// 3. 状态机守卫 (封存/作废后拒绝改写)
/// 4. 封存完整性政策 (可配置)
pub struct InventoryApi {
    inventory_repo: Arc<InventoryRepository>,
    stock_repo: Arc<StockRepository>,
    config: Arc<ConfigManager>,
    identity: Arc<dyn IdentityProvider>,
}

impl InventoryApi {
    /// 创建新的InventoryApi实例
    pub fn new(
        inventory_repo: Arc<InventoryRepository>,
        stock_repo: Arc<StockRepository>,
        config: Arc<ConfigManager>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            inventory_repo,
            stock_repo,
            config,
            identity,
        }
    }

    // ==========================================
    // 建单
    // ==========================================

    /// 创建盘点单并快照账面余额
    ///
    /// # 参数
    /// - location_id: 目标库存地点 (必须是班组仓)
    /// - reference_month: 参考月 ("YYYY-MM", 归一到当月 1 号)
    /// - notes: 备注
    ///
    /// # 说明
    /// - 快照时该地点每个有余额行的物资各生成一条明细 (含零余额),
    ///   system_qty = 建单时刻账面余额, counted_qty = NULL
    /// - 同一 (地点, 参考月) 已有 OPEN/IN_PROGRESS 单据时拒绝建单
    /// - 单据头与明细同一事务落库
    pub fn create_cycle(
        &self,
        location_id: i64,
        reference_month: &str,
        notes: Option<String>,
    ) -> ApiResult<InventoryCycle> {
        // 参数验证 (未发起任何写入)
        if location_id <= 0 {
            return Err(ApiError::ValidationError("必须选择库存地点".to_string()));
        }
        let month = parse_reference_month(reference_month)?;

        let location = self
            .stock_repo
            .find_location(location_id)?
            .ok_or_else(|| ApiError::NotFound(format!("StockLocation(id={})不存在", location_id)))?;

        // 只有班组仓参与盘点流程
        if location.kind != StockKind::TeamHeld {
            return Err(ApiError::BusinessRuleViolation(format!(
                "地点 {} 为个人仓, 不参与月度盘点",
                location.name
            )));
        }

        // 前置检查: 同一 (地点, 参考月) 至多一张可变单据
        // (残余竞争窗口由 idx_inventory_cycles_active 部分唯一索引兜底)
        if let Some(existing) = self.inventory_repo.find_active_cycle(location_id, month)? {
            return Err(ApiError::BusinessRuleViolation(format!(
                "地点 {} 在 {} 已有未封存盘点单 (id={})",
                location.name, month, existing.id
            )));
        }

        // 快照账面余额
        let snapshot: Vec<(i64, f64)> = self
            .stock_repo
            .list_items_by_location(location_id)?
            .into_iter()
            .map(|item| (item.material_id, item.balance))
            .collect();

        let actor = self.identity.current_actor();
        let cycle = self.inventory_repo.create_with_snapshot(
            location_id,
            month,
            actor.as_ref().map(|a| a.id.as_str()),
            notes.as_deref(),
            &snapshot,
        )?;

        info!(
            cycle_id = cycle.id,
            location_id,
            reference_month = %month,
            line_count = snapshot.len(),
            "盘点单已创建"
        );

        Ok(cycle)
    }

    // ==========================================
    // 清点
    // ==========================================

    /// 打开清点视图 (首次打开时 OPEN → IN_PROGRESS, 幂等)
    ///
    /// # 返回
    /// - (盘点单, 明细列表): 已封存/已作废的单据同样可读, 只是不可再写
    pub fn open_counting(&self, cycle_id: i64) -> ApiResult<(InventoryCycle, Vec<CountLineDetail>)> {
        let cycle = self.find_cycle_or_err(cycle_id)?;

        if cycle.status == CycleStatus::Open {
            // 条件更新: 只有仍在 OPEN 的单据会被盖 started_at, 重复调用无副作用
            let transitioned = self.inventory_repo.begin_counting(cycle_id)?;
            if transitioned {
                info!(cycle_id, "盘点开始清点 (OPEN → IN_PROGRESS)");
            }
        }

        let cycle = self.find_cycle_or_err(cycle_id)?;
        let lines = self.inventory_repo.list_lines(cycle_id)?;
        Ok((cycle, lines))
    }

    /// 录入单条清点结果
    ///
    /// # 说明
    /// - 已封存/已作废单据一律拒绝 (显式状态守卫)
    /// - 差异 = 实盘 - 账面, 每次录入重算后落库
    /// - 差异非零而无说明时只告警不拒绝 (制度软约束)
    pub fn record_count(
        &self,
        cycle_id: i64,
        material_id: i64,
        counted_qty: f64,
        justification: Option<String>,
    ) -> ApiResult<CountLine> {
        if counted_qty < 0.0 {
            return Err(ApiError::ValidationError(format!(
                "实盘数量不能为负: {}",
                counted_qty
            )));
        }

        let cycle = self.find_cycle_or_err(cycle_id)?;
        self.ensure_mutable(&cycle)?;

        let line = self
            .inventory_repo
            .find_line(cycle_id, material_id)?
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "盘点单 {} 中不存在物资 {} 的明细",
                    cycle_id, material_id
                ))
            })?;

        let div = match divergence(Some(counted_qty), line.system_qty) {
            Some(d) => d,
            None => return Err(ApiError::InternalError("差异计算失败".to_string())),
        };

        let justification = justification.filter(|j| !j.trim().is_empty());
        if div != 0.0 && justification.is_none() {
            warn!(
                cycle_id,
                material_id,
                divergence = div,
                "差异非零但未填写差异说明"
            );
        }

        let actor = self.identity.current_actor();
        self.inventory_repo.update_count(
            line.id,
            counted_qty,
            div,
            justification.as_deref(),
            actor.as_ref().map(|a| a.id.as_str()),
            Utc::now(),
        )?;

        self.inventory_repo
            .find_line(cycle_id, material_id)?
            .ok_or_else(|| ApiError::InternalError("清点结果写入后读取失败".to_string()))
    }

    /// 批量录入清点结果
    ///
    /// 各行独立写入 (与逐行保存等价): 某行失败不回滚之前已保存的行,
    /// 失败逐条收集进报告, 绝不静默丢弃
    pub fn record_counts(
        &self,
        cycle_id: i64,
        entries: &[CountEntry],
    ) -> ApiResult<CountSaveReport> {
        // 状态守卫只做一次; 单据在批量中途被封存属于并发窗口,
        // 后续行会以逐行错误的形式出现在报告里
        let cycle = self.find_cycle_or_err(cycle_id)?;
        self.ensure_mutable(&cycle)?;

        let mut report = CountSaveReport {
            saved: Vec::new(),
            failures: Vec::new(),
        };

        for entry in entries {
            match self.record_count(
                cycle_id,
                entry.material_id,
                entry.counted_qty,
                entry.justification.clone(),
            ) {
                Ok(line) => report.saved.push(line),
                Err(e) => report.failures.push(CountFailure {
                    material_id: entry.material_id,
                    reason: e.to_string(),
                }),
            }
        }

        if !report.failures.is_empty() {
            warn!(
                cycle_id,
                failed = report.failures.len(),
                saved = report.saved.len(),
                "批量清点部分失败"
            );
        }

        Ok(report)
    }

    // ==========================================
    // 封存/作废
    // ==========================================

    /// 封存盘点单 (OPEN/IN_PROGRESS → FINALIZED)
    ///
    /// # 说明
    /// - 封存后单据不可再改, 差异随之冻结
    /// - 默认允许带未清点明细封存; 配置
    ///   inventory_require_complete_count = "1" 时要求全部清点完
    pub fn finalize_cycle(&self, cycle_id: i64) -> ApiResult<InventoryCycle> {
        let cycle = self.find_cycle_or_err(cycle_id)?;

        cycle
            .status
            .transition(CycleStatus::Finalized)
            .map_err(|(from, to)| ApiError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            })?;

        let require_complete = self
            .config
            .get_require_complete_count()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        if require_complete {
            let uncounted = self.inventory_repo.count_uncounted(cycle_id)?;
            if uncounted > 0 {
                return Err(ApiError::BusinessRuleViolation(format!(
                    "尚有 {} 条明细未清点, 不满足封存完整性要求",
                    uncounted
                )));
            }
        }

        self.inventory_repo.mark_finalized(cycle_id)?;
        info!(cycle_id, "盘点单已封存");

        self.find_cycle_or_err(cycle_id)
    }

    /// 作废盘点单 (任一非终态 → CANCELED)
    pub fn cancel_cycle(&self, cycle_id: i64) -> ApiResult<InventoryCycle> {
        let cycle = self.find_cycle_or_err(cycle_id)?;

        cycle
            .status
            .transition(CycleStatus::Canceled)
            .map_err(|(from, to)| ApiError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            })?;

        self.inventory_repo.mark_canceled(cycle_id)?;
        info!(cycle_id, "盘点单已作废");

        self.find_cycle_or_err(cycle_id)
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询盘点单列表 (带地点名与清点进度, 新单在前)
    pub fn list_cycles(&self) -> ApiResult<Vec<CycleListRow>> {
        Ok(self.inventory_repo.list_cycles()?)
    }

    /// 查询盘点单明细 (带物资参照信息)
    pub fn list_count_lines(&self, cycle_id: i64) -> ApiResult<Vec<CountLineDetail>> {
        self.find_cycle_or_err(cycle_id)?;
        Ok(self.inventory_repo.list_lines(cycle_id)?)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn find_cycle_or_err(&self, cycle_id: i64) -> ApiResult<InventoryCycle> {
        self.inventory_repo
            .find_cycle(cycle_id)?
            .ok_or_else(|| ApiError::NotFound(format!("InventoryCycle(id={})不存在", cycle_id)))
    }

    /// 显式状态守卫: 终态单据拒绝任何清点写入
    fn ensure_mutable(&self, cycle: &InventoryCycle) -> ApiResult<()> {
        if cycle.status.is_mutable() {
            Ok(())
        } else {
            Err(ApiError::InvalidStateTransition {
                from: cycle.status.to_string(),
                to: CycleStatus::InProgress.to_string(),
            })
        }
    }
}
