use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::instant::{format_instant, sub_minutes};
use crate::domain::manufacturing_order::ManufacturingOrder;
use crate::domain::work_center::{CenterCalendar, WorkCenter};
use crate::domain::work_order::WorkOrder;

use super::core::ReflowEngine;

// ==========================================
// PipelineContext - 管线查找表
// ==========================================
// 用途: 重排入口构建一次, 各阶段与级联共用;
//       日历快照避免在阶段循环内反复解析班次/窗口
pub(super) struct PipelineContext<'a> {
    pub calendars: HashMap<&'a str, CenterCalendar>,  // 工作中心ID -> 日历快照
    pub due_dates: HashMap<&'a str, DateTime<Utc>>,   // 制造订单ID -> 交期 (仅可解析者)
    pub known_orders: HashSet<&'a str>,               // 制造订单ID全集
}

impl<'a> PipelineContext<'a> {
    pub fn build(
        work_centers: &'a [WorkCenter],
        manufacturing_orders: &'a [ManufacturingOrder],
    ) -> PipelineContext<'a> {
        let calendars = work_centers
            .iter()
            .map(|c| (c.work_center_id.as_str(), c.calendar()))
            .collect();

        let mut due_dates = HashMap::new();
        let mut known_orders = HashSet::new();
        for mo in manufacturing_orders {
            known_orders.insert(mo.manufacturing_order_id.as_str());
            if let Some(due) = mo.parsed_due_date() {
                due_dates.insert(mo.manufacturing_order_id.as_str(), due);
            }
        }

        PipelineContext {
            calendars,
            due_dates,
            known_orders,
        }
    }

    /// 工单是否可被阶段改写 (工作中心与制造订单均存在)
    ///
    /// 引用缺失的工单被所有阶段跳过, 终局校验照常报告
    pub fn is_schedulable(&self, wo: &WorkOrder) -> bool {
        self.calendars.contains_key(wo.work_center_id.as_str())
            && self.known_orders.contains(wo.manufacturing_order_id.as_str())
    }

    /// 工单父订单的交期 (订单缺失或交期不可解析时为 None)
    pub fn due_date(&self, wo: &WorkOrder) -> Option<DateTime<Utc>> {
        self.due_dates
            .get(wo.manufacturing_order_id.as_str())
            .copied()
    }
}

// ==========================================
// PhaseCounters - 阶段计数器
// ==========================================
#[derive(Debug, Default)]
pub(super) struct PhaseCounters {
    pub cannot_place: usize, // 各阶段累计"无法落位"次数
}

// ==========================================
// 管线阶段实现
// ==========================================
impl ReflowEngine {
    /// 阶段 0: 结束时刻归一化
    ///
    /// 输入的结束时刻可能是朴素的 start + duration, 未计班次暂停
    /// 与检修窗口; 先统一按计算器口径重算, 后续阶段才能正确比较。
    /// 无法落位者保持原时刻不动。
    pub(super) fn normalize_end_times(
        &self,
        orders: &mut [WorkOrder],
        ctx: &PipelineContext<'_>,
        counters: &mut PhaseCounters,
    ) {
        for wo in orders.iter_mut() {
            if wo.is_maintenance || !ctx.is_schedulable(wo) {
                continue;
            }
            let Some(calendar) = ctx.calendars.get(wo.work_center_id.as_str()) else {
                continue;
            };
            let Some(start) = wo.parsed_start() else {
                continue;
            };
            match self.calc.completion_time(
                start,
                wo.duration_minutes,
                &calendar.shifts,
                &calendar.windows,
            ) {
                Ok(end) => wo.end_time = format_instant(end),
                Err(signal) => {
                    counters.cannot_place += 1;
                    debug!(
                        work_order_id = %wo.work_order_id,
                        %signal,
                        "阶段0: 无法落位, 保持原时刻"
                    );
                }
            }
        }
    }

    /// 阶段 1: 交期违规前移
    ///
    /// 结束时刻晚于交期者, 以 交期 - 时长 为新开始 (朴素分钟差)
    /// 并经计算器重算结束。不设下界, 允许移动到重排前开始时刻之前。
    pub(super) fn resolve_due_date_violations(
        &self,
        orders: &mut [WorkOrder],
        ctx: &PipelineContext<'_>,
        counters: &mut PhaseCounters,
    ) {
        for wo in orders.iter_mut() {
            if wo.is_maintenance || !ctx.is_schedulable(wo) {
                continue;
            }
            let Some(due) = ctx.due_date(wo) else {
                continue;
            };
            let Some(end) = wo.parsed_end() else {
                continue;
            };
            if end <= due {
                continue;
            }
            let Some(calendar) = ctx.calendars.get(wo.work_center_id.as_str()) else {
                continue;
            };
            let tentative = sub_minutes(due, wo.duration_minutes);
            match self.calc.completion_time(
                tentative,
                wo.duration_minutes,
                &calendar.shifts,
                &calendar.windows,
            ) {
                Ok(new_end) => {
                    debug!(
                        work_order_id = %wo.work_order_id,
                        new_start = %format_instant(tentative),
                        new_end = %format_instant(new_end),
                        "阶段1: 交期违规, 工单前移"
                    );
                    wo.start_time = format_instant(tentative);
                    wo.end_time = format_instant(new_end);
                }
                Err(signal) => {
                    counters.cannot_place += 1;
                    debug!(
                        work_order_id = %wo.work_order_id,
                        %signal,
                        "阶段1: 前移落位失败, 保持原时刻"
                    );
                }
            }
        }
    }

    /// 阶段 2: 依赖传播
    ///
    /// 迭代至不动点 (以工单总数 N 为轮次上限): 开始时刻早于
    /// 现存依赖最晚结束者, 推迟到该结束时刻并重算结束。
    /// 链式依赖 A->B->C 经多轮迭代自然传播, 无需拓扑排序。
    pub(super) fn propagate_precedence(
        &self,
        orders: &mut [WorkOrder],
        ctx: &PipelineContext<'_>,
        counters: &mut PhaseCounters,
    ) {
        let index = order_index(orders);
        let max_passes = orders.len();
        for _pass in 0..max_passes {
            let mut changed = false;
            for i in 0..orders.len() {
                if orders[i].is_maintenance || !orders[i].has_dependencies() {
                    continue;
                }
                if !ctx.is_schedulable(&orders[i]) {
                    continue;
                }
                let Some(start) = orders[i].parsed_start() else {
                    continue;
                };
                let deps = orders[i].dependencies.clone();
                let mut latest: Option<DateTime<Utc>> = None;
                for dep_id in &deps {
                    let Some(&j) = index.get(dep_id.as_str()) else {
                        continue;
                    };
                    let Some(dep_end) = orders[j].parsed_end() else {
                        continue;
                    };
                    if latest.map_or(true, |cur| dep_end > cur) {
                        latest = Some(dep_end);
                    }
                }
                let Some(latest) = latest else {
                    continue;
                };
                if latest <= start {
                    continue;
                }
                let Some(calendar) = ctx.calendars.get(orders[i].work_center_id.as_str()) else {
                    continue;
                };
                match self.calc.completion_time(
                    latest,
                    orders[i].duration_minutes,
                    &calendar.shifts,
                    &calendar.windows,
                ) {
                    Ok(new_end) => {
                        orders[i].start_time = format_instant(latest);
                        orders[i].end_time = format_instant(new_end);
                        changed = true;
                    }
                    Err(signal) => {
                        counters.cannot_place += 1;
                        debug!(
                            work_order_id = %orders[i].work_order_id,
                            %signal,
                            "阶段2: 推迟落位失败, 保持原时刻"
                        );
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// 阶段 2.5: 依赖交期优化
    ///
    /// 仍违反自身交期且存在非检修依赖的工单: 找到限制性依赖
    /// (结束最晚者), 尝试将其前移到 min(交期 - 时长, 依赖自身交期),
    /// 重算后级联调整本工单。未能实际提前依赖结束时刻则放弃。
    /// 这是机会性局部优化, 不做全局关键路径计算。
    pub(super) fn optimize_precedence_for_due_dates(
        &self,
        orders: &mut [WorkOrder],
        ctx: &PipelineContext<'_>,
        counters: &mut PhaseCounters,
    ) {
        let index = order_index(orders);
        let max_passes = orders.len();
        for _pass in 0..max_passes {
            let mut changed = false;
            for i in 0..orders.len() {
                if orders[i].is_maintenance || !orders[i].has_dependencies() {
                    continue;
                }
                if !ctx.is_schedulable(&orders[i]) {
                    continue;
                }
                let Some(due) = ctx.due_date(&orders[i]) else {
                    continue;
                };
                let Some(end) = orders[i].parsed_end() else {
                    continue;
                };
                if end <= due {
                    continue;
                }

                // 限制性依赖 = 现存非检修依赖中结束最晚者 (检修依赖不可移动, 跳过)
                let deps = orders[i].dependencies.clone();
                let mut limiting: Option<(usize, DateTime<Utc>)> = None;
                for dep_id in &deps {
                    let Some(&j) = index.get(dep_id.as_str()) else {
                        continue;
                    };
                    if orders[j].is_maintenance {
                        continue;
                    }
                    let Some(dep_end) = orders[j].parsed_end() else {
                        continue;
                    };
                    if limiting.map_or(true, |(_, cur)| dep_end > cur) {
                        limiting = Some((j, dep_end));
                    }
                }
                let Some((j, dep_end)) = limiting else {
                    continue;
                };

                let target_start = sub_minutes(due, orders[i].duration_minutes);
                if dep_end <= target_start {
                    continue;
                }
                // 依赖前移不得超过其自身父订单交期
                let Some(dep_due) = ctx.due_date(&orders[j]) else {
                    continue;
                };
                let Some(dep_calendar) = ctx.calendars.get(orders[j].work_center_id.as_str())
                else {
                    continue;
                };

                let new_dep_end = target_start.min(dep_due);
                let new_dep_start = sub_minutes(new_dep_end, orders[j].duration_minutes);
                let recomputed = match self.calc.completion_time(
                    new_dep_start,
                    orders[j].duration_minutes,
                    &dep_calendar.shifts,
                    &dep_calendar.windows,
                ) {
                    Ok(t) => t,
                    Err(signal) => {
                        counters.cannot_place += 1;
                        debug!(
                            work_order_id = %orders[j].work_order_id,
                            %signal,
                            "阶段2.5: 依赖前移落位失败, 放弃优化"
                        );
                        continue;
                    }
                };
                if recomputed >= dep_end {
                    // 日历暂停抵消了前移量, 实际未提前
                    continue;
                }

                debug!(
                    work_order_id = %orders[i].work_order_id,
                    dependency_id = %orders[j].work_order_id,
                    new_dependency_end = %format_instant(recomputed),
                    "阶段2.5: 前移限制性依赖"
                );
                orders[j].start_time = format_instant(new_dep_start);
                orders[j].end_time = format_instant(recomputed);

                // 级联: 本工单紧随依赖的新结束时刻
                if let Some(calendar) = ctx.calendars.get(orders[i].work_center_id.as_str()) {
                    match self.calc.completion_time(
                        recomputed,
                        orders[i].duration_minutes,
                        &calendar.shifts,
                        &calendar.windows,
                    ) {
                        Ok(new_end) => {
                            orders[i].start_time = format_instant(recomputed);
                            orders[i].end_time = format_instant(new_end);
                        }
                        Err(signal) => {
                            counters.cannot_place += 1;
                            debug!(
                                work_order_id = %orders[i].work_order_id,
                                %signal,
                                "阶段2.5: 级联落位失败, 保持原时刻"
                            );
                        }
                    }
                }
                changed = true;
            }
            if !changed {
                break;
            }
        }
    }

    /// 阶段 3: 同中心重叠消解
    ///
    /// 按工作中心分区, 组内按当前开始时刻稳定升序扫描:
    /// - 检修工单为固定阻断, 游标单调推进到其结束;
    /// - 首个普通工单初始化游标为其结束;
    /// - 其后开始时刻早于游标者推迟到游标并重算结束。
    ///
    /// 本阶段可能重新引入交期违规, 由终局校验报告而不再消解。
    pub(super) fn resolve_overlaps(
        &self,
        orders: &mut [WorkOrder],
        ctx: &PipelineContext<'_>,
        counters: &mut PhaseCounters,
    ) {
        // 按首次出现顺序分区, 保证确定性
        let mut center_order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, wo) in orders.iter().enumerate() {
            if !ctx.calendars.contains_key(wo.work_center_id.as_str()) {
                continue;
            }
            // 检修工单作为阻断始终参与; 引用缺失的普通工单不参与
            if !wo.is_maintenance && !ctx.is_schedulable(wo) {
                continue;
            }
            let group = groups.entry(wo.work_center_id.clone()).or_insert_with(|| {
                center_order.push(wo.work_center_id.clone());
                Vec::new()
            });
            group.push(i);
        }

        for center in &center_order {
            let Some(members) = groups.get(center) else {
                continue;
            };
            let Some(calendar) = ctx.calendars.get(center.as_str()) else {
                continue;
            };

            // 起始时刻可解析者按开始时刻稳定排序
            let mut timeline: Vec<(usize, DateTime<Utc>)> = members
                .iter()
                .filter_map(|&i| orders[i].parsed_start().map(|s| (i, s)))
                .collect();
            timeline.sort_by_key(|&(_, start)| start);

            let mut cursor: Option<DateTime<Utc>> = None;
            for (i, start) in timeline {
                let end = orders[i].parsed_end();
                if orders[i].is_maintenance {
                    // 固定阻断: 游标单调推进到其结束
                    if let Some(e) = end {
                        cursor = Some(cursor.map_or(e, |c| c.max(e)));
                    }
                    continue;
                }
                match cursor {
                    None => {
                        if let Some(e) = end {
                            cursor = Some(e);
                        }
                    }
                    Some(c) if start < c => {
                        match self.calc.completion_time(
                            c,
                            orders[i].duration_minutes,
                            &calendar.shifts,
                            &calendar.windows,
                        ) {
                            Ok(new_end) => {
                                debug!(
                                    work_order_id = %orders[i].work_order_id,
                                    work_center_id = %center,
                                    new_start = %format_instant(c),
                                    "阶段3: 消解重叠, 工单后移"
                                );
                                orders[i].start_time = format_instant(c);
                                orders[i].end_time = format_instant(new_end);
                                cursor = Some(new_end);
                            }
                            Err(signal) => {
                                counters.cannot_place += 1;
                                debug!(
                                    work_order_id = %orders[i].work_order_id,
                                    %signal,
                                    "阶段3: 后移落位失败, 保持原时刻"
                                );
                            }
                        }
                    }
                    Some(c) => {
                        if let Some(e) = end {
                            cursor = Some(c.max(e));
                        }
                    }
                }
            }
        }
    }
}

/// 工单ID -> 下标 (重复ID以后者为准, 与查找表语义一致)
fn order_index(orders: &[WorkOrder]) -> HashMap<String, usize> {
    orders
        .iter()
        .enumerate()
        .map(|(i, wo)| (wo.work_order_id.clone(), i))
        .collect()
}
