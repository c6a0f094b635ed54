use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ReflowConfig;
use crate::domain::instant::parse_instant;
use crate::domain::manufacturing_order::ManufacturingOrder;
use crate::domain::work_center::WorkCenter;
use crate::domain::work_order::{WorkOrder, WorkOrderChange};
use crate::engine::checker::{ConstraintChecker, ConstraintViolation};
use crate::engine::time_calc::WorkTimeCalculator;

use super::phases::{PhaseCounters, PipelineContext};

// ==========================================
// ReflowStats - 重排统计
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflowStats {
    pub total_work_orders: usize,   // 工单总数
    pub rescheduled_count: usize,   // 起止时刻被调整的工单数
    pub maintenance_count: usize,   // 检修工单数 (固定阻断)
    pub cannot_place_count: usize,  // 各阶段累计"无法落位"次数
    pub elapsed_ms: i64,            // 耗时 (毫秒)
}

// ==========================================
// ReflowResult - 重排结果
// ==========================================
// 口径: work_orders 与输入同长同序同ID, 仅起止时刻可能不同
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflowResult {
    pub work_orders: Vec<WorkOrder>,          // 修订后的工单集合
    pub changes: Vec<WorkOrderChange>,        // 变更清单
    pub explanation: String,                  // 解释文本 (三种标准话术之一)
    pub infeasible: bool,                     // 不可行标志 (= 校验器否决)
    pub violations: Vec<ConstraintViolation>, // 终局校验违规 (可解释性)
    pub stats: ReflowStats,                   // 统计
}

// ==========================================
// ReflowEngine - 重排引擎
// ==========================================
pub struct ReflowEngine {
    pub(super) calc: WorkTimeCalculator,
    checker: ConstraintChecker,
}

impl Default for ReflowEngine {
    fn default() -> Self {
        Self::new(ReflowConfig::default())
    }
}

/// 起止时刻快照 (变更检测的唯一依据)
struct TimeSnapshot {
    start_time: String,
    end_time: String,
}

impl ReflowEngine {
    /// 创建重排引擎实例
    ///
    /// # 参数
    /// - `config`: 重排配置 (迭代上限/前瞻天数/容差)
    pub fn new(config: ReflowConfig) -> Self {
        Self {
            calc: WorkTimeCalculator::new(&config),
            checker: ConstraintChecker::new(&config),
        }
    }

    /// 执行一次重排
    ///
    /// # 参数
    /// - `work_orders`: 工单集合 (不被修改)
    /// - `work_centers`: 工作中心集合
    /// - `manufacturing_orders`: 制造订单集合
    ///
    /// # 返回
    /// 重排结果。本操作不抛异常, 一切输入缺陷与未消解违规
    /// 均经由结果中的校验诊断与不可行标志反映
    pub fn reflow(
        &self,
        work_orders: &[WorkOrder],
        work_centers: &[WorkCenter],
        manufacturing_orders: &[ManufacturingOrder],
    ) -> ReflowResult {
        let reflow_id = Uuid::new_v4();
        let span = tracing::info_span!("reflow", reflow_id = %reflow_id);
        let _guard = span.enter();
        let started = Instant::now();

        info!(
            work_orders = work_orders.len(),
            work_centers = work_centers.len(),
            manufacturing_orders = manufacturing_orders.len(),
            "开始重排"
        );

        // ===== Step 1: 构建查找表 (日历快照/交期/订单全集) =====
        let ctx = PipelineContext::build(work_centers, manufacturing_orders);

        // ===== Step 2: 深拷贝与起止快照 =====
        let mut orders: Vec<WorkOrder> = work_orders.to_vec();
        let snapshots: Vec<TimeSnapshot> = orders
            .iter()
            .map(|wo| TimeSnapshot {
                start_time: wo.start_time.clone(),
                end_time: wo.end_time.clone(),
            })
            .collect();

        let mut counters = PhaseCounters::default();

        // ===== Step 3: 阶段 0 - 结束时刻归一化 =====
        self.normalize_end_times(&mut orders, &ctx, &mut counters);

        // ===== Step 4: 阶段 1 - 交期违规前移 =====
        self.resolve_due_date_violations(&mut orders, &ctx, &mut counters);

        // ===== Step 5: 阶段 2 - 依赖传播 =====
        self.propagate_precedence(&mut orders, &ctx, &mut counters);

        // ===== Step 6: 阶段 2.5 - 依赖交期优化 =====
        self.optimize_precedence_for_due_dates(&mut orders, &ctx, &mut counters);

        // ===== Step 7: 阶段 3 - 同中心重叠消解 =====
        self.resolve_overlaps(&mut orders, &ctx, &mut counters);

        // ===== Step 8: 终局可行性判定 =====
        let report = self
            .checker
            .validate_all(&orders, work_centers, manufacturing_orders);
        let infeasible = !report.passed;
        if infeasible {
            warn!(
                violations = report.violations.len(),
                "重排后仍存在未消解的约束违规"
            );
        }

        // ===== Step 9: 变更清单与解释 =====
        let changes = collect_changes(&orders, &snapshots);
        let explanation = if infeasible {
            "重排后仍存在无法满足的约束，排程不可行".to_string()
        } else if changes.is_empty() {
            "所有工单均已满足约束，无需调整".to_string()
        } else {
            format!(
                "已重排 {} / {} 个工单以满足全部约束",
                changes.len(),
                orders.len()
            )
        };

        let stats = ReflowStats {
            total_work_orders: orders.len(),
            rescheduled_count: changes.len(),
            maintenance_count: orders.iter().filter(|wo| wo.is_maintenance).count(),
            cannot_place_count: counters.cannot_place,
            elapsed_ms: started.elapsed().as_millis() as i64,
        };

        info!(
            rescheduled = stats.rescheduled_count,
            infeasible = infeasible,
            elapsed_ms = stats.elapsed_ms,
            "重排完成"
        );

        ReflowResult {
            work_orders: orders,
            changes,
            explanation,
            infeasible,
            violations: report.violations,
            stats,
        }
    }
}

/// 按解析后时刻比对快照, 生成变更清单
///
/// 口径: 两侧均可解析时按时刻相等判定 (容忍格式差异);
///       任一侧不可解析时退化为字符串比较
fn collect_changes(orders: &[WorkOrder], snapshots: &[TimeSnapshot]) -> Vec<WorkOrderChange> {
    let mut changes = Vec::new();
    for (wo, snapshot) in orders.iter().zip(snapshots) {
        let start_changed = !same_instant(&snapshot.start_time, &wo.start_time);
        let end_changed = !same_instant(&snapshot.end_time, &wo.end_time);
        if start_changed || end_changed {
            changes.push(WorkOrderChange {
                work_order_id: wo.work_order_id.clone(),
                old_start_time: snapshot.start_time.clone(),
                new_start_time: wo.start_time.clone(),
                old_end_time: snapshot.end_time.clone(),
                new_end_time: wo.end_time.clone(),
            });
        }
    }
    changes
}

fn same_instant(a: &str, b: &str) -> bool {
    match (parse_instant(a), parse_instant(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}
