use super::*;
use crate::domain::manufacturing_order::ManufacturingOrder;
use crate::domain::types::ConstraintKind;
use crate::domain::work_center::{Shift, WorkCenter};
use crate::domain::work_order::WorkOrder;

// ==========================================
// 测试辅助函数
// ==========================================
// 基准周: 2024-01-15 为周一 (UTC)

fn engine() -> ReflowEngine {
    ReflowEngine::default()
}

fn create_test_work_order(
    work_order_id: &str,
    manufacturing_order_id: &str,
    work_center_id: &str,
    start_time: &str,
    end_time: &str,
    duration_minutes: i64,
) -> WorkOrder {
    WorkOrder {
        work_order_id: work_order_id.to_string(),
        manufacturing_order_id: manufacturing_order_id.to_string(),
        work_center_id: work_center_id.to_string(),
        start_time: start_time.to_string(),
        end_time: end_time.to_string(),
        duration_minutes,
        is_maintenance: false,
        dependencies: Vec::new(),
    }
}

fn create_test_center(work_center_id: &str, shifts: Vec<Shift>) -> WorkCenter {
    WorkCenter {
        work_center_id: work_center_id.to_string(),
        name: format!("中心{}", work_center_id),
        shifts,
        maintenance_windows: Vec::new(),
    }
}

fn create_test_mo(manufacturing_order_id: &str, due_date: &str) -> ManufacturingOrder {
    ManufacturingOrder {
        manufacturing_order_id: manufacturing_order_id.to_string(),
        due_date: due_date.to_string(),
    }
}

fn find<'a>(result: &'a ReflowResult, work_order_id: &str) -> &'a WorkOrder {
    result
        .work_orders
        .iter()
        .find(|wo| wo.work_order_id == work_order_id)
        .unwrap()
}

// ==========================================
// 阶段 0: 结束时刻归一化
// ==========================================

#[test]
fn test_phase0_normalizes_naive_end_time() {
    // 输入结束时刻为朴素 start + duration, 未计跨班次暂停
    let orders = vec![create_test_work_order(
        "WO-1",
        "MO-1",
        "WC-1",
        "2024-01-15T14:00:00Z",
        "2024-01-15T18:00:00Z",
        240,
    )];
    let centers = vec![create_test_center(
        "WC-1",
        vec![Shift::new(1, 8, 16), Shift::new(2, 8, 16)],
    )];
    let mos = vec![create_test_mo("MO-1", "2024-01-20T17:00:00Z")];

    let result = engine().reflow(&orders, &centers, &mos);
    assert!(!result.infeasible, "诊断: {:?}", result.violations);
    let wo = find(&result, "WO-1");
    assert_eq!(wo.start_time, "2024-01-15T14:00:00Z");
    assert_eq!(wo.end_time, "2024-01-16T10:00:00Z");
    assert_eq!(result.changes.len(), 1);
    assert_eq!(result.explanation, "已重排 1 / 1 个工单以满足全部约束");
}

// ==========================================
// 阶段 1: 交期违规前移
// ==========================================

#[test]
fn test_phase1_moves_order_earlier_to_meet_due_date() {
    // 交期早于重排前开始时刻: 不设下界, 整体前移到交期之前
    let orders = vec![create_test_work_order(
        "WO-1",
        "MO-1",
        "WC-1",
        "2024-01-15T08:00:00Z",
        "2024-01-15T16:00:00Z",
        480,
    )];
    let centers = vec![WorkCenter::continuous("WC-1", "连续中心")];
    let mos = vec![create_test_mo("MO-1", "2024-01-14T17:00:00Z")];

    let result = engine().reflow(&orders, &centers, &mos);
    let wo = find(&result, "WO-1");
    assert_eq!(wo.start_time, "2024-01-14T09:00:00Z");
    assert_eq!(wo.end_time, "2024-01-14T17:00:00Z");
    assert!(!result.infeasible, "诊断: {:?}", result.violations);
}

#[test]
fn test_infeasible_when_due_date_unreachable() {
    // 每周仅一个 8-16 班次: 前移后结束仍晚于当日 12:00 交期
    let orders = vec![create_test_work_order(
        "WO-1",
        "MO-1",
        "WC-1",
        "2024-01-15T08:00:00Z",
        "2024-01-15T16:00:00Z",
        480,
    )];
    let centers = vec![create_test_center("WC-1", vec![Shift::new(1, 8, 16)])];
    let mos = vec![create_test_mo("MO-1", "2024-01-15T12:00:00Z")];

    let result = engine().reflow(&orders, &centers, &mos);
    assert!(result.infeasible);
    assert!(result.explanation.contains("不可行"));
    assert!(result
        .violations
        .iter()
        .any(|v| v.kind == ConstraintKind::DueDateViolated));
}

// ==========================================
// 阶段 2: 依赖传播
// ==========================================

#[test]
fn test_phase2_propagates_dependency_chain() {
    let mut order_b = create_test_work_order(
        "WO-B",
        "MO-1",
        "WC-1",
        "2024-01-15T08:30:00Z",
        "2024-01-15T10:30:00Z",
        120,
    );
    order_b.dependencies = vec!["WO-A".to_string()];
    let mut order_c = create_test_work_order(
        "WO-C",
        "MO-1",
        "WC-1",
        "2024-01-15T09:00:00Z",
        "2024-01-15T10:00:00Z",
        60,
    );
    order_c.dependencies = vec!["WO-B".to_string()];
    let orders = vec![
        create_test_work_order(
            "WO-A",
            "MO-1",
            "WC-1",
            "2024-01-15T08:00:00Z",
            "2024-01-15T09:00:00Z",
            60,
        ),
        order_b,
        order_c,
    ];
    let centers = vec![create_test_center("WC-1", vec![Shift::new(1, 8, 18)])];
    let mos = vec![create_test_mo("MO-1", "2024-01-20T17:00:00Z")];

    let result = engine().reflow(&orders, &centers, &mos);
    assert!(!result.infeasible, "诊断: {:?}", result.violations);
    assert_eq!(find(&result, "WO-A").end_time, "2024-01-15T09:00:00Z");
    assert_eq!(find(&result, "WO-B").start_time, "2024-01-15T09:00:00Z");
    assert_eq!(find(&result, "WO-B").end_time, "2024-01-15T11:00:00Z");
    assert_eq!(find(&result, "WO-C").start_time, "2024-01-15T11:00:00Z");
    assert_eq!(find(&result, "WO-C").end_time, "2024-01-15T12:00:00Z");
}

// ==========================================
// 阶段 2.5: 依赖交期优化
// ==========================================

#[test]
fn test_phase25_pulls_limiting_dependency_earlier() {
    // B 受依赖 A 挡住而违反交期; A 自身交期宽裕, 可前移让位
    let mut order_b = create_test_work_order(
        "WO-B",
        "MO-急",
        "WC-1",
        "2024-01-15T10:00:00Z",
        "2024-01-15T12:00:00Z",
        120,
    );
    order_b.dependencies = vec!["WO-A".to_string()];
    let orders = vec![
        create_test_work_order(
            "WO-A",
            "MO-缓",
            "WC-1",
            "2024-01-15T09:00:00Z",
            "2024-01-15T10:00:00Z",
            60,
        ),
        order_b,
    ];
    let centers = vec![WorkCenter::continuous("WC-1", "连续中心")];
    let mos = vec![
        create_test_mo("MO-急", "2024-01-15T11:00:00Z"),
        create_test_mo("MO-缓", "2024-01-20T17:00:00Z"),
    ];

    let result = engine().reflow(&orders, &centers, &mos);
    assert!(!result.infeasible, "诊断: {:?}", result.violations);
    // A 前移到 08:00-09:00, B 级联为 09:00-11:00, 恰好满足交期
    assert_eq!(find(&result, "WO-A").start_time, "2024-01-15T08:00:00Z");
    assert_eq!(find(&result, "WO-A").end_time, "2024-01-15T09:00:00Z");
    assert_eq!(find(&result, "WO-B").start_time, "2024-01-15T09:00:00Z");
    assert_eq!(find(&result, "WO-B").end_time, "2024-01-15T11:00:00Z");
}

// ==========================================
// 阶段 3: 同中心重叠消解
// ==========================================

#[test]
fn test_phase3_packs_overlapping_orders() {
    let orders = vec![
        create_test_work_order(
            "WO-A",
            "MO-1",
            "WC-1",
            "2024-01-15T08:00:00Z",
            "2024-01-15T12:00:00Z",
            240,
        ),
        create_test_work_order(
            "WO-B",
            "MO-1",
            "WC-1",
            "2024-01-15T10:00:00Z",
            "2024-01-15T14:00:00Z",
            240,
        ),
    ];
    let centers = vec![create_test_center("WC-1", vec![Shift::new(1, 8, 16)])];
    let mos = vec![create_test_mo("MO-1", "2024-01-20T17:00:00Z")];

    let result = engine().reflow(&orders, &centers, &mos);
    assert!(!result.infeasible, "诊断: {:?}", result.violations);
    // A 原位, B 紧随其后
    assert_eq!(find(&result, "WO-A").start_time, "2024-01-15T08:00:00Z");
    assert_eq!(find(&result, "WO-A").end_time, "2024-01-15T12:00:00Z");
    assert_eq!(find(&result, "WO-B").start_time, "2024-01-15T12:00:00Z");
    assert_eq!(find(&result, "WO-B").end_time, "2024-01-15T16:00:00Z");
    assert_eq!(result.changes.len(), 1);
    assert_eq!(result.changes[0].work_order_id, "WO-B");
}

#[test]
fn test_phase3_maintenance_order_blocks_without_moving() {
    let mut maintenance = create_test_work_order(
        "WO-检修",
        "MO-1",
        "WC-1",
        "2024-01-15T10:00:00Z",
        "2024-01-15T12:00:00Z",
        120,
    );
    maintenance.is_maintenance = true;
    let orders = vec![
        maintenance,
        create_test_work_order(
            "WO-R",
            "MO-1",
            "WC-1",
            "2024-01-15T10:30:00Z",
            "2024-01-15T11:30:00Z",
            60,
        ),
    ];
    let centers = vec![WorkCenter::continuous("WC-1", "连续中心")];
    let mos = vec![create_test_mo("MO-1", "2024-01-20T17:00:00Z")];

    let result = engine().reflow(&orders, &centers, &mos);
    assert!(!result.infeasible, "诊断: {:?}", result.violations);
    // 检修工单纹丝不动, 普通工单让位到其后
    let m = find(&result, "WO-检修");
    assert_eq!(m.start_time, "2024-01-15T10:00:00Z");
    assert_eq!(m.end_time, "2024-01-15T12:00:00Z");
    let r = find(&result, "WO-R");
    assert_eq!(r.start_time, "2024-01-15T12:00:00Z");
    assert_eq!(r.end_time, "2024-01-15T13:00:00Z");
}

// ==========================================
// 变更清单与失败语义
// ==========================================

#[test]
fn test_changes_ignore_formatting_differences() {
    // 同一时刻的不同书写 (+00:00 与 Z) 不得误报变更
    let orders = vec![create_test_work_order(
        "WO-1",
        "MO-1",
        "WC-1",
        "2024-01-15T08:00:00+00:00",
        "2024-01-15T12:00:00+00:00",
        240,
    )];
    let centers = vec![WorkCenter::continuous("WC-1", "连续中心")];
    let mos = vec![create_test_mo("MO-1", "2024-01-20T17:00:00Z")];

    let result = engine().reflow(&orders, &centers, &mos);
    assert!(!result.infeasible);
    assert!(result.changes.is_empty());
    assert_eq!(result.explanation, "所有工单均已满足约束，无需调整");
}

#[test]
fn test_unknown_references_skipped_but_reported() {
    let orders = vec![create_test_work_order(
        "WO-孤儿",
        "MO-不存在",
        "WC-不存在",
        "2024-01-15T08:00:00Z",
        "2024-01-15T09:00:00Z",
        60,
    )];

    let result = engine().reflow(&orders, &[], &[]);
    // 各阶段跳过, 时刻原样保留
    let wo = find(&result, "WO-孤儿");
    assert_eq!(wo.start_time, "2024-01-15T08:00:00Z");
    assert_eq!(wo.end_time, "2024-01-15T09:00:00Z");
    assert!(result.changes.is_empty());
    // 终局校验照常报告
    assert!(result.infeasible);
    let kinds: Vec<_> = result.violations.iter().map(|v| v.kind).collect();
    assert!(kinds.contains(&ConstraintKind::MissingWorkCenter));
    assert!(kinds.contains(&ConstraintKind::MissingManufacturingOrder));
}

#[test]
fn test_maintenance_orders_never_touched() {
    // 即使结束时刻与班次推进口径不符, 检修工单也不被归一化
    let mut maintenance = create_test_work_order(
        "WO-检修",
        "MO-1",
        "WC-1",
        "2024-01-15T14:00:00Z",
        "2024-01-15T18:00:00Z",
        240,
    );
    maintenance.is_maintenance = true;
    let centers = vec![create_test_center("WC-1", vec![Shift::new(1, 8, 16)])];
    let mos = vec![create_test_mo("MO-1", "2024-01-20T17:00:00Z")];

    let result = engine().reflow(&[maintenance], &centers, &mos);
    let m = find(&result, "WO-检修");
    assert_eq!(m.start_time, "2024-01-15T14:00:00Z");
    assert_eq!(m.end_time, "2024-01-15T18:00:00Z");
    assert!(result.changes.is_empty());
}

#[test]
fn test_stats_and_identity_preserved() {
    let mut order_b = create_test_work_order(
        "WO-B",
        "MO-1",
        "WC-1",
        "2024-01-15T10:00:00Z",
        "2024-01-15T14:00:00Z",
        240,
    );
    order_b.dependencies = vec!["WO-A".to_string()];
    let orders = vec![
        create_test_work_order(
            "WO-A",
            "MO-1",
            "WC-1",
            "2024-01-15T08:00:00Z",
            "2024-01-15T12:00:00Z",
            240,
        ),
        order_b,
    ];
    let centers = vec![create_test_center("WC-1", vec![Shift::new(1, 8, 16)])];
    let mos = vec![create_test_mo("MO-1", "2024-01-20T17:00:00Z")];

    let result = engine().reflow(&orders, &centers, &mos);
    // 集合规模与ID顺序保持
    assert_eq!(result.work_orders.len(), orders.len());
    for (before, after) in orders.iter().zip(&result.work_orders) {
        assert_eq!(before.work_order_id, after.work_order_id);
        assert_eq!(before.manufacturing_order_id, after.manufacturing_order_id);
        assert_eq!(before.work_center_id, after.work_center_id);
        assert_eq!(before.duration_minutes, after.duration_minutes);
        assert_eq!(before.is_maintenance, after.is_maintenance);
        assert_eq!(before.dependencies, after.dependencies);
    }
    assert_eq!(result.stats.total_work_orders, 2);
    assert_eq!(result.stats.maintenance_count, 0);
    assert_eq!(result.stats.rescheduled_count, result.changes.len());
}

#[test]
fn test_reflow_idempotent_on_feasible_result() {
    let orders = vec![
        create_test_work_order(
            "WO-A",
            "MO-1",
            "WC-1",
            "2024-01-15T08:00:00Z",
            "2024-01-15T12:00:00Z",
            240,
        ),
        create_test_work_order(
            "WO-B",
            "MO-1",
            "WC-1",
            "2024-01-15T10:00:00Z",
            "2024-01-15T14:00:00Z",
            240,
        ),
    ];
    let centers = vec![create_test_center("WC-1", vec![Shift::new(1, 8, 16)])];
    let mos = vec![create_test_mo("MO-1", "2024-01-20T17:00:00Z")];

    let engine = engine();
    let first = engine.reflow(&orders, &centers, &mos);
    assert!(!first.infeasible);

    let second = engine.reflow(&first.work_orders, &centers, &mos);
    assert!(!second.infeasible);
    assert!(second.changes.is_empty(), "变更: {:?}", second.changes);
    assert_eq!(second.explanation, "所有工单均已满足约束，无需调整");
}
