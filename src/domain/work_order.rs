// ==========================================
// 车间工单重排系统 - 工单领域模型
// ==========================================
// 职责: 工单实体与重排变更记录
// 红线: 除起止时刻外, 工单字段在单次重排内不可变
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::instant::parse_instant;

// ==========================================
// WorkOrder - 工单
// ==========================================
// 用途: 重排管线的主操作对象
// 红线: 检修工单 (is_maintenance) 为固定阻断, 任何阶段不得改写其起止时刻
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub work_order_id: String,           // 工单ID
    pub manufacturing_order_id: String,  // 所属制造订单ID
    pub work_center_id: String,          // 工作中心ID
    pub start_time: String,              // 计划开始时刻 (ISO-8601 UTC)
    pub end_time: String,                // 计划结束时刻 (ISO-8601 UTC)
    pub duration_minutes: i64,           // 作业时长 (整分钟, > 0)
    #[serde(default)]
    pub is_maintenance: bool,            // 检修工单标志
    #[serde(default)]
    pub dependencies: Vec<String>,       // 依赖工单ID (有序)
}

impl WorkOrder {
    /// 解析计划开始时刻
    ///
    /// # 返回
    /// - `Some(t)`: 解析成功
    /// - `None`: 字符串非法 (约束校验器会出具 INVALID_TIMESTAMP 诊断)
    pub fn parsed_start(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.start_time)
    }

    /// 解析计划结束时刻
    pub fn parsed_end(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.end_time)
    }

    /// 是否存在依赖工单
    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }
}

// ==========================================
// WorkOrderChange - 重排变更记录
// ==========================================
// 用途: 重排结果的变更清单项, 起止任一时刻变化即记录一条
// 口径: 变更判定按解析后的时刻比较, 不比较字符串 (避免格式差异误报)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrderChange {
    pub work_order_id: String,  // 工单ID
    pub old_start_time: String, // 原开始时刻
    pub new_start_time: String, // 新开始时刻
    pub old_end_time: String,   // 原结束时刻
    pub new_end_time: String,   // 新结束时刻
}
