// ==========================================
// 车间工单重排系统 - 重排配置
// ==========================================
// 职责: 管线与计算器的运行参数
// 口径: 默认值即合同常量, 调用方一般无需调整
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ReflowConfig - 重排配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflowConfig {
    pub max_calc_iterations: u32,   // 工时推进迭代上限: 1000
    pub shift_lookahead_days: i64,  // 下一班次前瞻天数: 7
    pub end_tolerance_minutes: i64, // 结束时刻校验容差 (分钟): 1
}

impl Default for ReflowConfig {
    fn default() -> Self {
        Self {
            max_calc_iterations: 1000,
            shift_lookahead_days: 7,
            end_tolerance_minutes: 1,
        }
    }
}
