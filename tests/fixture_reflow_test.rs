// ==========================================
// 文档载荷重排测试
// ==========================================
// 职责: 验证线上 JSON 文档形态可直接反序列化为领域实体
//       并经 reflow 得到正确结果
// 夹具: tests/fixtures/workshop_schedule.json
// ==========================================

use serde::Deserialize;
use workshop_reflow::{reflow, ManufacturingOrder, WorkCenter, WorkOrder};

/// 线上文档形态 (外部协作方产出的解析结果)
#[derive(Debug, Deserialize)]
struct ScheduleDocument {
    work_orders: Vec<WorkOrder>,
    work_centers: Vec<WorkCenter>,
    manufacturing_orders: Vec<ManufacturingOrder>,
}

#[test]
fn test_reflow_on_json_document() {
    let raw = include_str!("fixtures/workshop_schedule.json");
    let doc: ScheduleDocument = serde_json::from_str(raw).unwrap();

    assert_eq!(doc.work_orders.len(), 2);
    assert_eq!(doc.work_centers[0].shifts.len(), 2);

    let result = reflow(&doc.work_orders, &doc.work_centers, &doc.manufacturing_orders);
    assert!(!result.infeasible, "诊断: {:?}", result.violations);

    // WO-1001 的朴素结束时刻被归一化: 09:00 起 180 分钟,
    // 其中 10:00-11:00 检修暂停, 实际 13:00 完成
    let first = &result.work_orders[0];
    assert_eq!(first.work_order_id, "WO-1001");
    assert_eq!(first.end_time, "2024-01-15T13:00:00Z");

    // WO-1002 紧随其后, 无需调整
    let second = &result.work_orders[1];
    assert_eq!(second.start_time, "2024-01-15T13:00:00Z");
    assert_eq!(second.end_time, "2024-01-15T15:00:00Z");

    assert_eq!(result.changes.len(), 1);
    assert_eq!(result.changes[0].work_order_id, "WO-1001");
    assert_eq!(result.changes[0].old_end_time, "2024-01-15T12:00:00Z");
    assert_eq!(result.changes[0].new_end_time, "2024-01-15T13:00:00Z");
}

#[test]
fn test_result_serializes_back_to_json() {
    let raw = include_str!("fixtures/workshop_schedule.json");
    let doc: ScheduleDocument = serde_json::from_str(raw).unwrap();

    let result = reflow(&doc.work_orders, &doc.work_centers, &doc.manufacturing_orders);
    let payload = serde_json::to_value(&result).unwrap();

    assert_eq!(payload["infeasible"], false);
    assert_eq!(payload["work_orders"].as_array().unwrap().len(), 2);
    assert!(payload["explanation"].as_str().unwrap().contains("重排"));
}
