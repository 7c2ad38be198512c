// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、种子数据生成等功能
// ==========================================

use std::sync::Arc;

use tempfile::NamedTempFile;
use warehouse_stores::app::AppState;
use warehouse_stores::domain::material::{Material, NewMaterial};
use warehouse_stores::domain::stock::StockLocation;
use warehouse_stores::domain::types::StockKind;
use warehouse_stores::identity::FixedIdentityProvider;

/// 创建临时数据库并装配完整应用状态
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - AppState: 已建表并接好所有 API 的应用状态
pub fn create_test_app() -> (NamedTempFile, AppState) {
    let temp_file = NamedTempFile::new().unwrap();
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let identity = Arc::new(FixedIdentityProvider::new("u-001", "测试员"));
    let state = AppState::new(db_path, identity).unwrap();

    (temp_file, state)
}

/// 物资入参模板 (只有补货参数的差异需要逐个测试指定)
pub fn new_material(code: &str, description: &str) -> NewMaterial {
    NewMaterial {
        code: code.to_string(),
        description: description.to_string(),
        unit_cost: 1.0,
        stock_min: 0.0,
        stock_max: None,
        reorder_point: None,
        lead_time_days: None,
        active: true,
        notes: None,
    }
}

/// 创建物资并返回完整记录
pub fn seed_material(state: &AppState, code: &str, description: &str) -> Material {
    state
        .material_api
        .create_material(new_material(code, description))
        .unwrap()
}

/// 创建库存地点
pub fn seed_location(state: &AppState, name: &str, kind: StockKind) -> StockLocation {
    state.stock_repo.insert_location(name, kind, None).unwrap()
}

/// 写入 (地点, 物资) 余额行
pub fn seed_balance(state: &AppState, location_id: i64, material_id: i64, balance: f64) {
    state
        .stock_repo
        .upsert_item(location_id, material_id, balance)
        .unwrap();
}

/// 读取 (地点, 物资) 当前余额 (无行按 0 处理)
pub fn balance_of(state: &AppState, location_id: i64, material_id: i64) -> f64 {
    state
        .stock_repo
        .find_item(location_id, material_id)
        .unwrap()
        .map(|item| item.balance)
        .unwrap_or(0.0)
}
