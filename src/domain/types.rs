// ==========================================
// 车间工单重排系统 - 领域类型定义
// ==========================================
// 职责: 约束族等跨模块枚举类型
// 序列化格式: SCREAMING_SNAKE_CASE (与文档口径一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 约束族 (Constraint Kind)
// ==========================================
// 红线: 每条违规必须归属一个约束族并携带显式原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    InvalidTimestamp,          // 时刻缺失或无法解析 / 起止倒置
    MissingManufacturingOrder, // 制造订单不存在
    DueDateViolated,           // 交期违反
    Overlap,                   // 同一工作中心区间重叠
    MissingWorkCenter,         // 工作中心不存在
    DependencyViolated,        // 依赖先后关系违反
    ShiftAlignment,            // 结束时刻与班次推进结果不一致
    MaintenanceAlignment,      // 结束时刻与检修推进结果不一致 (无班次中心)
}

impl ConstraintKind {
    /// 转换为文档存储的字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::InvalidTimestamp => "INVALID_TIMESTAMP",
            ConstraintKind::MissingManufacturingOrder => "MISSING_MANUFACTURING_ORDER",
            ConstraintKind::DueDateViolated => "DUE_DATE_VIOLATED",
            ConstraintKind::Overlap => "OVERLAP",
            ConstraintKind::MissingWorkCenter => "MISSING_WORK_CENTER",
            ConstraintKind::DependencyViolated => "DEPENDENCY_VIOLATED",
            ConstraintKind::ShiftAlignment => "SHIFT_ALIGNMENT",
            ConstraintKind::MaintenanceAlignment => "MAINTENANCE_ALIGNMENT",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
