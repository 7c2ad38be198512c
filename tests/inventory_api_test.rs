// ==========================================
// 月度盘点 API 集成测试
// ==========================================
// 覆盖: 建单快照 / 清点录入 / 状态守卫 / 封存政策 / 作废
// ==========================================

mod test_helpers;

use warehouse_stores::api::{ApiError, CountEntry};
use warehouse_stores::config::config_keys;
use warehouse_stores::domain::types::{CycleStatus, StockKind};

use test_helpers::*;

// ==========================================
// 建单与快照
// ==========================================

#[test]
fn test_create_cycle_snapshots_every_balance_row() {
    let (_db, state) = create_test_app();

    let location = seed_location(&state, "一号班组仓", StockKind::TeamHeld);
    let bolt = seed_material(&state, "MAT-001", "六角螺栓");
    let glove = seed_material(&state, "MAT-002", "劳保手套");
    let oil = seed_material(&state, "MAT-003", "润滑油");

    seed_balance(&state, location.id, bolt.id, 10.0);
    // 零余额行同样进入快照
    seed_balance(&state, location.id, glove.id, 0.0);
    seed_balance(&state, location.id, oil.id, 4.5);

    let cycle = state
        .inventory_api
        .create_cycle(location.id, "2024-06", Some("六月例行盘点".to_string()))
        .unwrap();

    assert_eq!(cycle.status, CycleStatus::Open);
    assert_eq!(cycle.responsible_id.as_deref(), Some("u-001"));
    assert_eq!(cycle.reference_month.to_string(), "2024-06-01");

    let lines = state.inventory_api.list_count_lines(cycle.id).unwrap();
    assert_eq!(lines.len(), 3);
    // 全部明细: 账面数量来自快照, 实盘与差异为空
    for detail in &lines {
        assert!(detail.line.counted_qty.is_none());
        assert!(detail.line.divergence.is_none());
    }
    let bolt_line = lines
        .iter()
        .find(|d| d.line.material_id == bolt.id)
        .unwrap();
    assert_eq!(bolt_line.line.system_qty, 10.0);
    assert_eq!(bolt_line.material_code, "MAT-001");
}

#[test]
fn test_snapshot_is_frozen_against_later_movements() {
    let (_db, state) = create_test_app();

    let location = seed_location(&state, "一号班组仓", StockKind::TeamHeld);
    let bolt = seed_material(&state, "MAT-001", "六角螺栓");
    seed_balance(&state, location.id, bolt.id, 10.0);

    let cycle = state
        .inventory_api
        .create_cycle(location.id, "2024-06", None)
        .unwrap();

    // 建单后余额继续变动, 快照基线不受影响
    seed_balance(&state, location.id, bolt.id, 99.0);

    let lines = state.inventory_api.list_count_lines(cycle.id).unwrap();
    assert_eq!(lines[0].line.system_qty, 10.0);
}

#[test]
fn test_create_cycle_rejects_duplicate_active_month() {
    let (_db, state) = create_test_app();

    let location = seed_location(&state, "一号班组仓", StockKind::TeamHeld);

    let first = state
        .inventory_api
        .create_cycle(location.id, "2024-06", None)
        .unwrap();

    // 同地点同参考月已有可变单据
    let err = state
        .inventory_api
        .create_cycle(location.id, "2024-06", None)
        .unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));

    // 另一个月不受影响
    state
        .inventory_api
        .create_cycle(location.id, "2024-07", None)
        .unwrap();

    // 封存后同月可以再开
    state.inventory_api.finalize_cycle(first.id).unwrap();
    state
        .inventory_api
        .create_cycle(location.id, "2024-06", None)
        .unwrap();
}

#[test]
fn test_create_cycle_rejects_individual_location_and_bad_input() {
    let (_db, state) = create_test_app();

    let personal = seed_location(&state, "张三工具柜", StockKind::IndividualHeld);

    // 个人仓不参与盘点
    let err = state
        .inventory_api
        .create_cycle(personal.id, "2024-06", None)
        .unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));

    // 不存在的地点
    let err = state
        .inventory_api
        .create_cycle(9999, "2024-06", None)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    // 参考月格式错误
    let team = seed_location(&state, "一号班组仓", StockKind::TeamHeld);
    let err = state
        .inventory_api
        .create_cycle(team.id, "junho/2024", None)
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));
}

// ==========================================
// 清点
// ==========================================

#[test]
fn test_open_counting_transitions_once() {
    let (_db, state) = create_test_app();

    let location = seed_location(&state, "一号班组仓", StockKind::TeamHeld);
    let bolt = seed_material(&state, "MAT-001", "六角螺栓");
    seed_balance(&state, location.id, bolt.id, 10.0);

    let cycle = state
        .inventory_api
        .create_cycle(location.id, "2024-06", None)
        .unwrap();
    assert!(cycle.started_at.is_none());

    let (cycle, lines) = state.inventory_api.open_counting(cycle.id).unwrap();
    assert_eq!(cycle.status, CycleStatus::InProgress);
    assert_eq!(lines.len(), 1);
    let first_started = cycle.started_at.unwrap();

    // 再次打开: 状态与 started_at 都不再变化
    let (cycle, _) = state.inventory_api.open_counting(cycle.id).unwrap();
    assert_eq!(cycle.status, CycleStatus::InProgress);
    assert_eq!(cycle.started_at.unwrap(), first_started);
}

#[test]
fn test_record_count_computes_divergence() {
    let (_db, state) = create_test_app();

    let location = seed_location(&state, "一号班组仓", StockKind::TeamHeld);
    let bolt = seed_material(&state, "MAT-001", "六角螺栓");
    seed_balance(&state, location.id, bolt.id, 10.0);

    let cycle = state
        .inventory_api
        .create_cycle(location.id, "2024-06", None)
        .unwrap();
    state.inventory_api.open_counting(cycle.id).unwrap();

    // 账面 10, 实盘 8 → 差异 -2
    let line = state
        .inventory_api
        .record_count(cycle.id, bolt.id, 8.0, Some("两件破损报废".to_string()))
        .unwrap();
    assert_eq!(line.counted_qty, Some(8.0));
    assert_eq!(line.divergence, Some(-2.0));
    assert_eq!(line.counted_by.as_deref(), Some("u-001"));
    assert!(line.counted_at.is_some());
    assert_eq!(line.justification.as_deref(), Some("两件破损报废"));

    // 重录: 最后写入者胜, 差异重算
    let line = state
        .inventory_api
        .record_count(cycle.id, bolt.id, 10.0, None)
        .unwrap();
    assert_eq!(line.divergence, Some(0.0));
    assert!(line.justification.is_none());
}

#[test]
fn test_record_count_rejects_negative_and_unknown_material() {
    let (_db, state) = create_test_app();

    let location = seed_location(&state, "一号班组仓", StockKind::TeamHeld);
    let bolt = seed_material(&state, "MAT-001", "六角螺栓");
    seed_balance(&state, location.id, bolt.id, 10.0);

    let cycle = state
        .inventory_api
        .create_cycle(location.id, "2024-06", None)
        .unwrap();

    let err = state
        .inventory_api
        .record_count(cycle.id, bolt.id, -1.0, None)
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    // 快照之外的物资没有明细行
    let err = state
        .inventory_api
        .record_count(cycle.id, 9999, 1.0, None)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_record_counts_collects_per_line_failures() {
    let (_db, state) = create_test_app();

    let location = seed_location(&state, "一号班组仓", StockKind::TeamHeld);
    let bolt = seed_material(&state, "MAT-001", "六角螺栓");
    let glove = seed_material(&state, "MAT-002", "劳保手套");
    seed_balance(&state, location.id, bolt.id, 10.0);
    seed_balance(&state, location.id, glove.id, 5.0);

    let cycle = state
        .inventory_api
        .create_cycle(location.id, "2024-06", None)
        .unwrap();

    let report = state
        .inventory_api
        .record_counts(
            cycle.id,
            &[
                CountEntry {
                    material_id: bolt.id,
                    counted_qty: 10.0,
                    justification: None,
                },
                // 快照外物资: 单行失败, 不影响前面已保存的行
                CountEntry {
                    material_id: 9999,
                    counted_qty: 1.0,
                    justification: None,
                },
                CountEntry {
                    material_id: glove.id,
                    counted_qty: 4.0,
                    justification: Some("一副遗失".to_string()),
                },
            ],
        )
        .unwrap();

    assert_eq!(report.saved.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].material_id, 9999);

    // 已保存的行确实落库
    let lines = state.inventory_api.list_count_lines(cycle.id).unwrap();
    let glove_line = lines
        .iter()
        .find(|d| d.line.material_id == glove.id)
        .unwrap();
    assert_eq!(glove_line.line.divergence, Some(-1.0));
}

// ==========================================
// 状态守卫与封存
// ==========================================

#[test]
fn test_finalized_cycle_rejects_further_counts() {
    let (_db, state) = create_test_app();

    let location = seed_location(&state, "一号班组仓", StockKind::TeamHeld);
    let bolt = seed_material(&state, "MAT-001", "六角螺栓");
    seed_balance(&state, location.id, bolt.id, 10.0);

    let cycle = state
        .inventory_api
        .create_cycle(location.id, "2024-06", None)
        .unwrap();
    state.inventory_api.open_counting(cycle.id).unwrap();
    state
        .inventory_api
        .record_count(cycle.id, bolt.id, 8.0, Some("破损".to_string()))
        .unwrap();

    let cycle = state.inventory_api.finalize_cycle(cycle.id).unwrap();
    assert_eq!(cycle.status, CycleStatus::Finalized);
    assert!(cycle.finished_at.is_some());

    // 封存后任何改写被拒绝
    let err = state
        .inventory_api
        .record_count(cycle.id, bolt.id, 9.0, None)
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidStateTransition { .. }));

    // 明细原样冻结
    let lines = state.inventory_api.list_count_lines(cycle.id).unwrap();
    assert_eq!(lines[0].line.counted_qty, Some(8.0));
    assert_eq!(lines[0].line.divergence, Some(-2.0));

    // 重复封存也被拒绝
    let err = state.inventory_api.finalize_cycle(cycle.id).unwrap_err();
    assert!(matches!(err, ApiError::InvalidStateTransition { .. }));
}

#[test]
fn test_finalize_allows_uncounted_lines_by_default() {
    let (_db, state) = create_test_app();

    let location = seed_location(&state, "一号班组仓", StockKind::TeamHeld);
    let bolt = seed_material(&state, "MAT-001", "六角螺栓");
    seed_balance(&state, location.id, bolt.id, 10.0);

    let cycle = state
        .inventory_api
        .create_cycle(location.id, "2024-06", None)
        .unwrap();

    // 默认政策: 未清点明细不阻止封存, OPEN 可以直接封存
    let cycle = state.inventory_api.finalize_cycle(cycle.id).unwrap();
    assert_eq!(cycle.status, CycleStatus::Finalized);
}

#[test]
fn test_finalize_complete_count_policy() {
    let (_db, state) = create_test_app();

    state
        .config_manager
        .set_config_value(config_keys::INVENTORY_REQUIRE_COMPLETE_COUNT, "1")
        .unwrap();

    let location = seed_location(&state, "一号班组仓", StockKind::TeamHeld);
    let bolt = seed_material(&state, "MAT-001", "六角螺栓");
    let glove = seed_material(&state, "MAT-002", "劳保手套");
    seed_balance(&state, location.id, bolt.id, 10.0);
    seed_balance(&state, location.id, glove.id, 5.0);

    let cycle = state
        .inventory_api
        .create_cycle(location.id, "2024-06", None)
        .unwrap();
    state.inventory_api.open_counting(cycle.id).unwrap();
    state
        .inventory_api
        .record_count(cycle.id, bolt.id, 10.0, None)
        .unwrap();

    // 还剩一条未清点, 严格政策下拒绝封存
    let err = state.inventory_api.finalize_cycle(cycle.id).unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));

    state
        .inventory_api
        .record_count(cycle.id, glove.id, 5.0, None)
        .unwrap();
    let cycle = state.inventory_api.finalize_cycle(cycle.id).unwrap();
    assert_eq!(cycle.status, CycleStatus::Finalized);
}

#[test]
fn test_finalize_empty_cycle() {
    let (_db, state) = create_test_app();

    let location = seed_location(&state, "空仓", StockKind::TeamHeld);

    // 地点没有任何余额行: 建单得到零明细的盘点单
    let cycle = state
        .inventory_api
        .create_cycle(location.id, "2024-06", None)
        .unwrap();
    let lines = state.inventory_api.list_count_lines(cycle.id).unwrap();
    assert!(lines.is_empty());

    // 零明细单据也能正常封存 (严格政策下同样成立: 没有未清点行)
    state
        .config_manager
        .set_config_value(config_keys::INVENTORY_REQUIRE_COMPLETE_COUNT, "1")
        .unwrap();
    let cycle = state.inventory_api.finalize_cycle(cycle.id).unwrap();
    assert_eq!(cycle.status, CycleStatus::Finalized);
}

#[test]
fn test_cancel_cycle() {
    let (_db, state) = create_test_app();

    let location = seed_location(&state, "一号班组仓", StockKind::TeamHeld);
    let bolt = seed_material(&state, "MAT-001", "六角螺栓");
    seed_balance(&state, location.id, bolt.id, 10.0);

    let cycle = state
        .inventory_api
        .create_cycle(location.id, "2024-06", None)
        .unwrap();

    let cycle = state.inventory_api.cancel_cycle(cycle.id).unwrap();
    assert_eq!(cycle.status, CycleStatus::Canceled);

    // 作废是终态: 不能再清点/封存/重复作废
    let err = state
        .inventory_api
        .record_count(cycle.id, bolt.id, 1.0, None)
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidStateTransition { .. }));
    let err = state.inventory_api.finalize_cycle(cycle.id).unwrap_err();
    assert!(matches!(err, ApiError::InvalidStateTransition { .. }));
    let err = state.inventory_api.cancel_cycle(cycle.id).unwrap_err();
    assert!(matches!(err, ApiError::InvalidStateTransition { .. }));

    // 作废后同月可以重开
    state
        .inventory_api
        .create_cycle(location.id, "2024-06", None)
        .unwrap();
}

// ==========================================
// 列表与数量精度
// ==========================================

#[test]
fn test_list_cycles_reports_progress() {
    let (_db, state) = create_test_app();

    let location = seed_location(&state, "一号班组仓", StockKind::TeamHeld);
    let bolt = seed_material(&state, "MAT-001", "六角螺栓");
    let glove = seed_material(&state, "MAT-002", "劳保手套");
    seed_balance(&state, location.id, bolt.id, 10.0);
    seed_balance(&state, location.id, glove.id, 5.0);

    let cycle = state
        .inventory_api
        .create_cycle(location.id, "2024-06", None)
        .unwrap();
    state
        .inventory_api
        .record_count(cycle.id, bolt.id, 10.0, None)
        .unwrap();

    let rows = state.inventory_api.list_cycles().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].location_name, "一号班组仓");
    assert_eq!(rows[0].total_lines, 2);
    assert_eq!(rows[0].counted_lines, 1);
}

#[test]
fn test_fractional_quantities_round_trip_exactly() {
    let (_db, state) = create_test_app();

    let location = seed_location(&state, "一号班组仓", StockKind::TeamHeld);
    let oil = seed_material(&state, "MAT-003", "润滑油");
    seed_balance(&state, location.id, oil.id, 12.25);

    let cycle = state
        .inventory_api
        .create_cycle(location.id, "2024-06", None)
        .unwrap();

    // 小数数量原样往返, 差异按位精确
    let lines = state.inventory_api.list_count_lines(cycle.id).unwrap();
    assert_eq!(lines[0].line.system_qty, 12.25);

    let line = state
        .inventory_api
        .record_count(cycle.id, oil.id, 0.5, Some("桶装破漏".to_string()))
        .unwrap();
    assert_eq!(line.counted_qty, Some(0.5));
    assert_eq!(line.divergence, Some(-11.75));
}
