// ==========================================
// 车间工单重排系统 - 引擎层
// ==========================================
// 职责: 工时推进计算、约束校验、重排管线
// 红线: 引擎层不做 I/O, 所有判定必须输出 reason
// ==========================================

pub mod checker;
pub mod reflow;
pub mod time_calc;

// 重导出核心引擎
pub use checker::{ConstraintChecker, ConstraintViolation, ValidationReport};
pub use reflow::{ReflowEngine, ReflowResult, ReflowStats};
pub use time_calc::{CannotPlace, WorkTimeCalculator};
