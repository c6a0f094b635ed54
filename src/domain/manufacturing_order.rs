// ==========================================
// 车间工单重排系统 - 制造订单领域模型
// ==========================================
// 职责: 工单的父订单, 交期为重排核心唯一消费的字段
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::instant::parse_instant;

// ==========================================
// ManufacturingOrder - 制造订单
// ==========================================
// 口径: 源文档的其余字段对重排核心不可见, 由调用方自行保管
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManufacturingOrder {
    pub manufacturing_order_id: String, // 制造订单ID
    pub due_date: String,               // 交期 (ISO-8601 UTC)
}

impl ManufacturingOrder {
    /// 解析交期
    ///
    /// # 返回
    /// - `Some(t)`: 解析成功
    /// - `None`: 交期非法, 关联工单的交期约束按未知处理
    pub fn parsed_due_date(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.due_date)
    }
}
