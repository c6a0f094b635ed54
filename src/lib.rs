// ==========================================
// 车间工单重排系统 - 核心库
// ==========================================
// 系统定位: 排程重算核心 (纯计算, 无 I/O, 无持久化)
// 输入: 工单 / 工作中心 / 制造订单 三集合
// 输出: 修订工单 + 变更清单 + 解释文本 + 可行性标志
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 运行参数
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::ConstraintKind;

// 领域实体
pub use domain::{
    CenterCalendar, MaintenanceInterval, MaintenanceWindow, ManufacturingOrder, Shift, WorkCenter,
    WorkOrder, WorkOrderChange,
};

// 引擎
pub use engine::{
    CannotPlace, ConstraintChecker, ConstraintViolation, ReflowEngine, ReflowResult, ReflowStats,
    ValidationReport, WorkTimeCalculator,
};

// 配置
pub use config::ReflowConfig;

// ==========================================
// 入口操作
// ==========================================

/// 以默认配置执行一次重排
///
/// 输入集合不被修改; 结果包含修订后的工单、变更清单、
/// 解释文本与可行性标志。等价于
/// `ReflowEngine::default().reflow(...)`。
pub fn reflow(
    work_orders: &[WorkOrder],
    work_centers: &[WorkCenter],
    manufacturing_orders: &[ManufacturingOrder],
) -> ReflowResult {
    ReflowEngine::default().reflow(work_orders, work_centers, manufacturing_orders)
}

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "车间工单重排系统";
