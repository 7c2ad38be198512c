// ==========================================
// 补货计划 API 集成测试 (MRP)
// ==========================================
// 覆盖: 水位状态分类 / 建议补货量 / 过滤 / 金额汇总
// ==========================================

mod test_helpers;

use warehouse_stores::domain::types::{StockKind, StockStatus};

use test_helpers::*;

// ==========================================
// 水位状态
// ==========================================

#[test]
fn test_status_classification() {
    let (_db, state) = create_test_app();

    let store = seed_location(&state, "中心仓", StockKind::TeamHeld);

    // 余额低于最低库存 → CRITICAL
    let mut critical = new_material("MAT-001", "六角螺栓");
    critical.stock_min = 10.0;
    let critical = state.material_api.create_material(critical).unwrap();
    seed_balance(&state, store.id, critical.id, 4.0);

    // 余额在最低库存与补货点之间 → WARNING
    let mut warning = new_material("MAT-002", "劳保手套");
    warning.stock_min = 5.0;
    warning.reorder_point = Some(20.0);
    let warning = state.material_api.create_material(warning).unwrap();
    seed_balance(&state, store.id, warning.id, 12.0);

    // 余额充足 → 不出现在清单里
    let mut ok = new_material("MAT-003", "润滑油");
    ok.stock_min = 5.0;
    ok.reorder_point = Some(8.0);
    let ok = state.material_api.create_material(ok).unwrap();
    seed_balance(&state, store.id, ok.id, 50.0);

    // 没有补货点的物资只按最低库存判定
    let mut no_reorder = new_material("MAT-004", "砂纸");
    no_reorder.stock_min = 5.0;
    let no_reorder = state.material_api.create_material(no_reorder).unwrap();
    seed_balance(&state, store.id, no_reorder.id, 6.0);

    let items = state.mrp_api.list_replenishment(None).unwrap();
    assert_eq!(items.len(), 2);
    // 危急在前
    assert_eq!(items[0].code, "MAT-001");
    assert_eq!(items[0].status, StockStatus::Critical);
    assert_eq!(items[1].code, "MAT-002");
    assert_eq!(items[1].status, StockStatus::Warning);
}

#[test]
fn test_balance_aggregates_across_locations() {
    let (_db, state) = create_test_app();

    let central = seed_location(&state, "中心仓", StockKind::TeamHeld);
    let team = seed_location(&state, "一号班组仓", StockKind::TeamHeld);

    let mut bolt = new_material("MAT-001", "六角螺栓");
    bolt.stock_min = 10.0;
    let bolt = state.material_api.create_material(bolt).unwrap();

    // 单仓各 6, 全局 12 ≥ 最低库存 10 → 不缺货
    seed_balance(&state, central.id, bolt.id, 6.0);
    seed_balance(&state, team.id, bolt.id, 6.0);
    assert!(state.mrp_api.list_replenishment(None).unwrap().is_empty());

    // 全局余额跌破最低库存后进入清单
    seed_balance(&state, team.id, bolt.id, 1.0);
    let items = state.mrp_api.list_replenishment(None).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].total_balance, 7.0);
}

#[test]
fn test_inactive_materials_are_excluded() {
    let (_db, state) = create_test_app();

    let store = seed_location(&state, "中心仓", StockKind::TeamHeld);

    let mut retired = new_material("MAT-009", "淘汰件");
    retired.stock_min = 10.0;
    retired.active = false;
    let retired = state.material_api.create_material(retired).unwrap();
    seed_balance(&state, store.id, retired.id, 0.0);

    assert!(state.mrp_api.list_replenishment(None).unwrap().is_empty());
}

// ==========================================
// 建议补货量
// ==========================================

#[test]
fn test_suggested_qty_targets() {
    let (_db, state) = create_test_app();

    let store = seed_location(&state, "中心仓", StockKind::TeamHeld);

    // 有最高库存: 补到 stock_max
    let mut with_max = new_material("MAT-001", "六角螺栓");
    with_max.stock_min = 10.0;
    with_max.stock_max = Some(50.0);
    let with_max = state.material_api.create_material(with_max).unwrap();
    seed_balance(&state, store.id, with_max.id, 4.0);

    // 无最高库存但有补货点: 补到 reorder_point
    let mut with_reorder = new_material("MAT-002", "劳保手套");
    with_reorder.stock_min = 5.0;
    with_reorder.reorder_point = Some(20.0);
    let with_reorder = state.material_api.create_material(with_reorder).unwrap();
    seed_balance(&state, store.id, with_reorder.id, 12.0);

    // 只有最低库存: 补到 stock_min
    let mut min_only = new_material("MAT-003", "砂纸");
    min_only.stock_min = 8.0;
    let min_only = state.material_api.create_material(min_only).unwrap();
    seed_balance(&state, store.id, min_only.id, 3.0);

    let items = state.mrp_api.list_replenishment(None).unwrap();
    let by_code = |code: &str| items.iter().find(|i| i.code == code).unwrap();

    assert_eq!(by_code("MAT-001").suggested_qty, 46.0);
    assert_eq!(by_code("MAT-002").suggested_qty, 8.0);
    assert_eq!(by_code("MAT-003").suggested_qty, 5.0);
}

// ==========================================
// 过滤与汇总
// ==========================================

#[test]
fn test_search_filter() {
    let (_db, state) = create_test_app();

    let store = seed_location(&state, "中心仓", StockKind::TeamHeld);

    let mut bolt = new_material("MAT-001", "六角螺栓");
    bolt.stock_min = 10.0;
    let bolt = state.material_api.create_material(bolt).unwrap();
    seed_balance(&state, store.id, bolt.id, 0.0);

    let mut glove = new_material("EPI-002", "劳保手套");
    glove.stock_min = 10.0;
    let glove = state.material_api.create_material(glove).unwrap();
    seed_balance(&state, store.id, glove.id, 0.0);

    // 编码子串, 不区分大小写
    let items = state.mrp_api.list_replenishment(Some("mat-")).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].code, "MAT-001");

    // 描述子串
    let items = state.mrp_api.list_replenishment(Some("手套")).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].code, "EPI-002");

    // 空白串等价于不过滤
    let items = state.mrp_api.list_replenishment(Some("  ")).unwrap();
    assert_eq!(items.len(), 2);
}

#[test]
fn test_summary_counts_and_cost() {
    let (_db, state) = create_test_app();

    let store = seed_location(&state, "中心仓", StockKind::TeamHeld);

    // CRITICAL: 建议 46, 单价 2.0 → 92.0
    let mut bolt = new_material("MAT-001", "六角螺栓");
    bolt.stock_min = 10.0;
    bolt.stock_max = Some(50.0);
    bolt.unit_cost = 2.0;
    let bolt = state.material_api.create_material(bolt).unwrap();
    seed_balance(&state, store.id, bolt.id, 4.0);

    // WARNING: 建议 8, 单价 1.5 → 12.0
    let mut glove = new_material("MAT-002", "劳保手套");
    glove.stock_min = 5.0;
    glove.reorder_point = Some(20.0);
    glove.unit_cost = 1.5;
    let glove = state.material_api.create_material(glove).unwrap();
    seed_balance(&state, store.id, glove.id, 12.0);

    let summary = state.mrp_api.replenishment_summary().unwrap();
    assert_eq!(summary.critical_count, 1);
    assert_eq!(summary.warning_count, 1);
    assert_eq!(summary.estimated_total_cost, 104.0);
}
