// ==========================================
// 车间工单重排系统 - 约束校验器
// ==========================================
// 职责: 对工单/工作中心/制造订单三集合执行七项独立子校验,
//       汇总违规并给出整体可行性判定
// 红线: 任何子校验不抛异常, 缺失父订单/缺失中心一律
//       以诊断违规形式报告
// 红线: 每条违规必须携带约束族与显式原因
// ==========================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::ReflowConfig;
use crate::domain::instant::minutes_between;
use crate::domain::manufacturing_order::ManufacturingOrder;
use crate::domain::types::ConstraintKind;
use crate::domain::work_center::{CenterCalendar, WorkCenter};
use crate::domain::work_order::WorkOrder;
use crate::engine::time_calc::WorkTimeCalculator;

// ==========================================
// ConstraintViolation - 约束违规
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub kind: ConstraintKind,             // 约束族
    pub work_order_id: Option<String>,    // 关联工单 (个别违规无单一工单归属)
    pub message: String,                  // 显式原因
    pub details: Option<serde_json::Value>, // 结构化明细 (可选)
}

impl ConstraintViolation {
    fn new(kind: ConstraintKind, work_order_id: &str, message: String) -> Self {
        Self {
            kind,
            work_order_id: Some(work_order_id.to_string()),
            message,
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

// ==========================================
// ValidationReport - 校验报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,                        // 全部子校验通过
    pub violations: Vec<ConstraintViolation>, // 违规清单 (按子校验顺序拼接)
}

impl ValidationReport {
    /// 以 "约束族: 原因" 形式导出诊断文本
    pub fn messages(&self) -> Vec<String> {
        self.violations
            .iter()
            .map(|v| format!("{}: {}", v.kind, v.message))
            .collect()
    }
}

// ==========================================
// ConstraintChecker - 约束校验器
// ==========================================
// 注: 与重排管线共用同一套工时推进计算器
pub struct ConstraintChecker {
    calc: WorkTimeCalculator,
    tolerance_minutes: i64,
}

impl ConstraintChecker {
    /// 创建校验器实例
    pub fn new(config: &ReflowConfig) -> Self {
        Self {
            calc: WorkTimeCalculator::new(config),
            tolerance_minutes: config.end_tolerance_minutes,
        }
    }

    /// 复合校验: 七项子校验全部通过则判定可行
    ///
    /// # 参数
    /// - `work_orders`: 工单集合
    /// - `work_centers`: 工作中心集合
    /// - `manufacturing_orders`: 制造订单集合
    ///
    /// # 返回
    /// 校验报告 (verdict + 违规清单); 本操作为纯查询, 不修改任何输入
    pub fn validate_all(
        &self,
        work_orders: &[WorkOrder],
        work_centers: &[WorkCenter],
        manufacturing_orders: &[ManufacturingOrder],
    ) -> ValidationReport {
        let center_map: HashMap<&str, &WorkCenter> = work_centers
            .iter()
            .map(|c| (c.work_center_id.as_str(), c))
            .collect();
        let calendars: HashMap<&str, CenterCalendar> = work_centers
            .iter()
            .map(|c| (c.work_center_id.as_str(), c.calendar()))
            .collect();
        let mo_map: HashMap<&str, &ManufacturingOrder> = manufacturing_orders
            .iter()
            .map(|m| (m.manufacturing_order_id.as_str(), m))
            .collect();

        let mut violations = Vec::new();
        self.check_timestamps(work_orders, &mut violations);
        self.check_due_dates(work_orders, &mo_map, &mut violations);
        self.check_overlaps(work_orders, &mut violations);
        self.check_center_exists(work_orders, &center_map, &mut violations);
        self.check_dependencies(work_orders, &mut violations);
        self.check_shift_alignment(work_orders, &calendars, &mut violations);
        self.check_maintenance_alignment(work_orders, &calendars, &mut violations);

        ValidationReport {
            passed: violations.is_empty(),
            violations,
        }
    }

    // ==========================================
    // 子校验 1: 时刻合法性
    // ==========================================
    fn check_timestamps(&self, work_orders: &[WorkOrder], out: &mut Vec<ConstraintViolation>) {
        for wo in work_orders {
            let start = wo.parsed_start();
            let end = wo.parsed_end();
            if start.is_none() {
                out.push(ConstraintViolation::new(
                    ConstraintKind::InvalidTimestamp,
                    &wo.work_order_id,
                    format!(
                        "工单 {} 开始时刻无法解析: {:?}",
                        wo.work_order_id, wo.start_time
                    ),
                ));
            }
            if end.is_none() {
                out.push(ConstraintViolation::new(
                    ConstraintKind::InvalidTimestamp,
                    &wo.work_order_id,
                    format!(
                        "工单 {} 结束时刻无法解析: {:?}",
                        wo.work_order_id, wo.end_time
                    ),
                ));
            }
            if let (Some(start), Some(end)) = (start, end) {
                if start >= end {
                    out.push(
                        ConstraintViolation::new(
                            ConstraintKind::InvalidTimestamp,
                            &wo.work_order_id,
                            format!("工单 {} 开始时刻不早于结束时刻", wo.work_order_id),
                        )
                        .with_details(json!({
                            "start_time": wo.start_time,
                            "end_time": wo.end_time,
                        })),
                    );
                }
            }
        }
    }

    // ==========================================
    // 子校验 2: 交期满足
    // ==========================================
    fn check_due_dates(
        &self,
        work_orders: &[WorkOrder],
        mo_map: &HashMap<&str, &ManufacturingOrder>,
        out: &mut Vec<ConstraintViolation>,
    ) {
        for wo in work_orders {
            let Some(mo) = mo_map.get(wo.manufacturing_order_id.as_str()) else {
                out.push(ConstraintViolation::new(
                    ConstraintKind::MissingManufacturingOrder,
                    &wo.work_order_id,
                    format!(
                        "工单 {} 引用的制造订单 {} 不存在",
                        wo.work_order_id, wo.manufacturing_order_id
                    ),
                ));
                continue;
            };
            let Some(due) = mo.parsed_due_date() else {
                out.push(ConstraintViolation::new(
                    ConstraintKind::InvalidTimestamp,
                    &wo.work_order_id,
                    format!(
                        "制造订单 {} 交期无法解析: {:?}",
                        mo.manufacturing_order_id, mo.due_date
                    ),
                ));
                continue;
            };
            if let Some(start) = wo.parsed_start() {
                if start > due {
                    out.push(
                        ConstraintViolation::new(
                            ConstraintKind::DueDateViolated,
                            &wo.work_order_id,
                            format!(
                                "工单 {} 开始时刻晚于制造订单 {} 交期",
                                wo.work_order_id, mo.manufacturing_order_id
                            ),
                        )
                        .with_details(json!({
                            "start_time": wo.start_time,
                            "due_date": mo.due_date,
                        })),
                    );
                }
            }
            if let Some(end) = wo.parsed_end() {
                if end > due {
                    out.push(
                        ConstraintViolation::new(
                            ConstraintKind::DueDateViolated,
                            &wo.work_order_id,
                            format!(
                                "工单 {} 结束时刻晚于制造订单 {} 交期",
                                wo.work_order_id, mo.manufacturing_order_id
                            ),
                        )
                        .with_details(json!({
                            "end_time": wo.end_time,
                            "due_date": mo.due_date,
                        })),
                    );
                }
            }
        }
    }

    // ==========================================
    // 子校验 3: 同中心区间不重叠
    // ==========================================
    // 口径: 半开区间 [start, end); 检修工单与普通工单同等参与
    fn check_overlaps(&self, work_orders: &[WorkOrder], out: &mut Vec<ConstraintViolation>) {
        // 按工作中心分组 (保持输入顺序)
        let mut groups: Vec<(&str, Vec<&WorkOrder>)> = Vec::new();
        let mut group_index: HashMap<&str, usize> = HashMap::new();
        for wo in work_orders {
            let center = wo.work_center_id.as_str();
            let idx = *group_index.entry(center).or_insert_with(|| {
                groups.push((center, Vec::new()));
                groups.len() - 1
            });
            groups[idx].1.push(wo);
        }

        for (center, members) in groups {
            // 起止齐备者按开始时刻稳定排序后扫描
            let mut timeline: Vec<_> = members
                .iter()
                .filter_map(|wo| {
                    let start = wo.parsed_start()?;
                    let end = wo.parsed_end()?;
                    Some((*wo, start, end))
                })
                .collect();
            timeline.sort_by_key(|(_, start, _)| *start);

            let mut running: Option<(&WorkOrder, chrono::DateTime<chrono::Utc>)> = None;
            for (wo, start, end) in timeline {
                if let Some((prev, prev_end)) = running {
                    if start < prev_end {
                        out.push(
                            ConstraintViolation::new(
                                ConstraintKind::Overlap,
                                &wo.work_order_id,
                                format!(
                                    "工作中心 {} 上工单 {} 与 {} 区间重叠",
                                    center, prev.work_order_id, wo.work_order_id
                                ),
                            )
                            .with_details(json!({
                                "work_center_id": center,
                                "first": {
                                    "work_order_id": prev.work_order_id,
                                    "start_time": prev.start_time,
                                    "end_time": prev.end_time,
                                },
                                "second": {
                                    "work_order_id": wo.work_order_id,
                                    "start_time": wo.start_time,
                                    "end_time": wo.end_time,
                                },
                            })),
                        );
                    }
                    if end > prev_end {
                        running = Some((wo, end));
                    }
                } else {
                    running = Some((wo, end));
                }
            }
        }
    }

    // ==========================================
    // 子校验 4: 工作中心存在性
    // ==========================================
    fn check_center_exists(
        &self,
        work_orders: &[WorkOrder],
        center_map: &HashMap<&str, &WorkCenter>,
        out: &mut Vec<ConstraintViolation>,
    ) {
        for wo in work_orders {
            if !center_map.contains_key(wo.work_center_id.as_str()) {
                out.push(ConstraintViolation::new(
                    ConstraintKind::MissingWorkCenter,
                    &wo.work_order_id,
                    format!(
                        "工单 {} 引用的工作中心 {} 不存在",
                        wo.work_order_id, wo.work_center_id
                    ),
                ));
            }
        }
    }

    // ==========================================
    // 子校验 5: 依赖先后关系
    // ==========================================
    // 口径: 仅校验两端均存在的依赖边 (A.end <= B.start)
    fn check_dependencies(&self, work_orders: &[WorkOrder], out: &mut Vec<ConstraintViolation>) {
        let by_id: HashMap<&str, &WorkOrder> = work_orders
            .iter()
            .map(|wo| (wo.work_order_id.as_str(), wo))
            .collect();

        for wo in work_orders {
            let Some(start) = wo.parsed_start() else {
                continue;
            };
            for dep_id in &wo.dependencies {
                let Some(dep) = by_id.get(dep_id.as_str()) else {
                    continue;
                };
                let Some(dep_end) = dep.parsed_end() else {
                    continue;
                };
                if dep_end > start {
                    out.push(
                        ConstraintViolation::new(
                            ConstraintKind::DependencyViolated,
                            &wo.work_order_id,
                            format!(
                                "依赖工单 {} 的结束时刻晚于工单 {} 的开始时刻",
                                dep_id, wo.work_order_id
                            ),
                        )
                        .with_details(json!({
                            "dependency_id": dep_id,
                            "dependency_end_time": dep.end_time,
                            "start_time": wo.start_time,
                        })),
                    );
                }
            }
        }
    }

    // ==========================================
    // 子校验 6: 班次推进一致性
    // ==========================================
    // 范围: 有班次日历的中心上的非检修工单;
    //       存储结束时刻须与计算器结果相差不超过容差
    fn check_shift_alignment(
        &self,
        work_orders: &[WorkOrder],
        calendars: &HashMap<&str, CenterCalendar>,
        out: &mut Vec<ConstraintViolation>,
    ) {
        for wo in work_orders {
            if wo.is_maintenance {
                continue;
            }
            let Some(calendar) = calendars.get(wo.work_center_id.as_str()) else {
                continue;
            };
            if calendar.shifts.is_empty() {
                continue;
            }
            self.check_calendar_alignment(wo, calendar, ConstraintKind::ShiftAlignment, out);
        }
    }

    // ==========================================
    // 子校验 7: 纯检修推进一致性
    // ==========================================
    // 范围: 仅有检修窗口而无班次的中心上的非检修工单
    fn check_maintenance_alignment(
        &self,
        work_orders: &[WorkOrder],
        calendars: &HashMap<&str, CenterCalendar>,
        out: &mut Vec<ConstraintViolation>,
    ) {
        for wo in work_orders {
            if wo.is_maintenance {
                continue;
            }
            let Some(calendar) = calendars.get(wo.work_center_id.as_str()) else {
                continue;
            };
            if !calendar.shifts.is_empty() || calendar.windows.is_empty() {
                continue;
            }
            self.check_calendar_alignment(wo, calendar, ConstraintKind::MaintenanceAlignment, out);
        }
    }

    /// 存储结束时刻与计算器推进结果的一致性比对 (共用路径)
    fn check_calendar_alignment(
        &self,
        wo: &WorkOrder,
        calendar: &CenterCalendar,
        kind: ConstraintKind,
        out: &mut Vec<ConstraintViolation>,
    ) {
        // 起止不可解析由子校验 1 负责
        let (Some(start), Some(end)) = (wo.parsed_start(), wo.parsed_end()) else {
            return;
        };
        match self
            .calc
            .completion_time(start, wo.duration_minutes, &calendar.shifts, &calendar.windows)
        {
            Ok(expected) => {
                let deviation = minutes_between(expected.min(end), expected.max(end));
                if deviation > self.tolerance_minutes {
                    out.push(
                        ConstraintViolation::new(
                            kind,
                            &wo.work_order_id,
                            format!(
                                "工单 {} 结束时刻与日历推进结果偏差 {} 分钟",
                                wo.work_order_id, deviation
                            ),
                        )
                        .with_details(json!({
                            "expected_end_time": crate::domain::instant::format_instant(expected),
                            "end_time": wo.end_time,
                            "deviation_minutes": deviation,
                        })),
                    );
                }
            }
            Err(signal) => {
                out.push(ConstraintViolation::new(
                    kind,
                    &wo.work_order_id,
                    format!("工单 {} 无法在日历内完成: {}", wo.work_order_id, signal),
                ));
            }
        }
    }
}
