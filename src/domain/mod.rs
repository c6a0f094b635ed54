// ==========================================
// 车间工单重排系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型与解析辅助
// 红线: 不含推进算法, 不含管线逻辑
// ==========================================

pub mod instant;
pub mod manufacturing_order;
pub mod types;
pub mod work_center;
pub mod work_order;

// 重导出核心类型
pub use manufacturing_order::ManufacturingOrder;
pub use types::ConstraintKind;
pub use work_center::{CenterCalendar, MaintenanceInterval, MaintenanceWindow, Shift, WorkCenter};
pub use work_order::{WorkOrder, WorkOrderChange};
