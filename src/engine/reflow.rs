// ==========================================
// 车间工单重排系统 - 重排管线
// ==========================================
// 职责: 对工单集合执行多阶段重排, 产出修订时刻、变更清单、
//       解释文本与可行性标志
// 阶段顺序: 0 结束时刻归一化 -> 1 交期违规前移 -> 2 依赖传播
//           -> 2.5 依赖交期优化 -> 3 同中心重叠消解 -> 可行性判定
// 红线: 输入集合不被修改, 管线只操作深拷贝
// 红线: 检修工单为固定阻断, 任何阶段不得改写其起止时刻
// 红线: 各阶段与计算器均受迭代上限约束, 对任意输入必然终止
// ==========================================

mod core;
mod phases;

#[cfg(test)]
mod tests;

pub use self::core::{ReflowEngine, ReflowResult, ReflowStats};
