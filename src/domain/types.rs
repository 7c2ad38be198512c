// ==========================================
// 仓库物资管理系统 - 领域类型定义
// ==========================================
// 红线: 状态为封闭枚举, 禁止以裸字符串在调用点比较
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 盘点单状态 (Cycle Status)
// ==========================================
// 生命周期: OPEN → IN_PROGRESS → FINALIZED, 任一非终态可转 CANCELED
// 红线: 状态只前进不回退; FINALIZED/CANCELED 为终态, 单据不可再改
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleStatus {
    Open,       // 已创建, 未开始清点
    InProgress, // 清点中
    Finalized,  // 已封存
    Canceled,   // 已作废
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl CycleStatus {
    /// 从数据库字符串解析状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OPEN" => Some(CycleStatus::Open),
            "IN_PROGRESS" => Some(CycleStatus::InProgress),
            "FINALIZED" => Some(CycleStatus::Finalized),
            "CANCELED" => Some(CycleStatus::Canceled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CycleStatus::Open => "OPEN",
            CycleStatus::InProgress => "IN_PROGRESS",
            CycleStatus::Finalized => "FINALIZED",
            CycleStatus::Canceled => "CANCELED",
        }
    }

    /// 是否仍允许录入清点数量
    pub fn is_mutable(&self) -> bool {
        matches!(self, CycleStatus::Open | CycleStatus::InProgress)
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, CycleStatus::Finalized | CycleStatus::Canceled)
    }

    /// 状态转换是否合法
    ///
    /// 合法转换:
    /// - OPEN → IN_PROGRESS / FINALIZED / CANCELED
    /// - IN_PROGRESS → FINALIZED / CANCELED
    pub fn can_transition_to(&self, to: CycleStatus) -> bool {
        match (self, to) {
            (CycleStatus::Open, CycleStatus::InProgress) => true,
            (CycleStatus::Open, CycleStatus::Finalized) => true,
            (CycleStatus::InProgress, CycleStatus::Finalized) => true,
            (CycleStatus::Open | CycleStatus::InProgress, CycleStatus::Canceled) => true,
            _ => false,
        }
    }

    /// 唯一的状态转换入口
    ///
    /// # 返回
    /// - Ok(to): 转换合法
    /// - Err((from, to)): 非法转换, 由调用方转为错误类型
    pub fn transition(self, to: CycleStatus) -> Result<CycleStatus, (CycleStatus, CycleStatus)> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err((self, to))
        }
    }
}

// ==========================================
// 移动类型 (Movement Kind)
// ==========================================
// TRANSFER 需要来源+目标仓; INBOUND 只需目标仓; OUTBOUND 只需来源仓
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    Transfer, // 调拨
    Inbound,  // 入库
    Outbound, // 出库
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl MovementKind {
    /// 从数据库字符串解析移动类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "TRANSFER" => Some(MovementKind::Transfer),
            "INBOUND" => Some(MovementKind::Inbound),
            "OUTBOUND" => Some(MovementKind::Outbound),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MovementKind::Transfer => "TRANSFER",
            MovementKind::Inbound => "INBOUND",
            MovementKind::Outbound => "OUTBOUND",
        }
    }

    /// 是否需要来源仓
    pub fn requires_origin(&self) -> bool {
        matches!(self, MovementKind::Transfer | MovementKind::Outbound)
    }

    /// 是否需要目标仓
    pub fn requires_destination(&self) -> bool {
        matches!(self, MovementKind::Transfer | MovementKind::Inbound)
    }
}

// ==========================================
// 移动单据状态 (Movement Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementStatus {
    Approved, // 已生效
    Pending,  // 待审
    Canceled, // 已作废
}

impl fmt::Display for MovementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl MovementStatus {
    /// 从数据库字符串解析单据状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "APPROVED" => Some(MovementStatus::Approved),
            "PENDING" => Some(MovementStatus::Pending),
            "CANCELED" => Some(MovementStatus::Canceled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MovementStatus::Approved => "APPROVED",
            MovementStatus::Pending => "PENDING",
            MovementStatus::Canceled => "CANCELED",
        }
    }
}

// ==========================================
// 库存地点类别 (Stock Kind)
// ==========================================
// 只有班组仓 (TEAM_HELD) 参与月度盘点流程
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockKind {
    TeamHeld,       // 班组仓
    IndividualHeld, // 个人仓
}

impl fmt::Display for StockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl StockKind {
    /// 从数据库字符串解析地点类别
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "TEAM_HELD" => Some(StockKind::TeamHeld),
            "INDIVIDUAL_HELD" => Some(StockKind::IndividualHeld),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            StockKind::TeamHeld => "TEAM_HELD",
            StockKind::IndividualHeld => "INDIVIDUAL_HELD",
        }
    }
}

// ==========================================
// 库存水位状态 (Stock Status)
// ==========================================
// 由补货视图 vw_replenishment 计算, 本层只读
// 顺序: Critical > Warning > Normal (用于排序展示)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    Critical, // 低于最低库存
    Warning,  // 低于补货点
    Normal,   // 水位正常
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl StockStatus {
    /// 从数据库字符串解析水位状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CRITICAL" => Some(StockStatus::Critical),
            "WARNING" => Some(StockStatus::Warning),
            "NORMAL" => Some(StockStatus::Normal),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            StockStatus::Critical => "CRITICAL",
            StockStatus::Warning => "WARNING",
            StockStatus::Normal => "NORMAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_status_forward_transitions() {
        assert!(CycleStatus::Open.can_transition_to(CycleStatus::InProgress));
        assert!(CycleStatus::Open.can_transition_to(CycleStatus::Finalized));
        assert!(CycleStatus::InProgress.can_transition_to(CycleStatus::Finalized));
        assert!(CycleStatus::Open.can_transition_to(CycleStatus::Canceled));
        assert!(CycleStatus::InProgress.can_transition_to(CycleStatus::Canceled));
    }

    #[test]
    fn test_cycle_status_illegal_transitions() {
        // 终态不可再转
        assert!(!CycleStatus::Finalized.can_transition_to(CycleStatus::InProgress));
        assert!(!CycleStatus::Finalized.can_transition_to(CycleStatus::Canceled));
        assert!(!CycleStatus::Canceled.can_transition_to(CycleStatus::Open));
        // 不可回退
        assert!(!CycleStatus::InProgress.can_transition_to(CycleStatus::Open));

        let err = CycleStatus::Finalized
            .transition(CycleStatus::InProgress)
            .unwrap_err();
        assert_eq!(err, (CycleStatus::Finalized, CycleStatus::InProgress));
    }

    #[test]
    fn test_cycle_status_db_roundtrip() {
        for status in [
            CycleStatus::Open,
            CycleStatus::InProgress,
            CycleStatus::Finalized,
            CycleStatus::Canceled,
        ] {
            assert_eq!(CycleStatus::from_str(status.to_db_str()), Some(status));
        }
        assert_eq!(CycleStatus::from_str("WHATEVER"), None);
    }

    #[test]
    fn test_serde_matches_db_strings() {
        // 序列化格式与数据库存储字符串必须一致
        assert_eq!(
            serde_json::to_string(&CycleStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::from_str::<StockKind>("\"TEAM_HELD\"").unwrap(),
            StockKind::TeamHeld
        );
        assert_eq!(
            serde_json::to_string(&MovementKind::Outbound).unwrap(),
            format!("\"{}\"", MovementKind::Outbound.to_db_str())
        );
    }

    #[test]
    fn test_movement_kind_endpoint_rules() {
        assert!(MovementKind::Transfer.requires_origin());
        assert!(MovementKind::Transfer.requires_destination());
        assert!(!MovementKind::Inbound.requires_origin());
        assert!(MovementKind::Inbound.requires_destination());
        assert!(MovementKind::Outbound.requires_origin());
        assert!(!MovementKind::Outbound.requires_destination());
    }
}
