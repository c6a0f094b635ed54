// ==========================================
// 车间工单重排系统 - 工作中心领域模型
// ==========================================
// 职责: 工作中心实体 + 周班次 + 检修窗口
// 口径: 班次按周循环 (1=周一..7=周日), 检修窗口为绝对时刻区间
// 红线: 检修优先于班次, 窗口生效期间即使处于班次内也不推进工时
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::instant::parse_instant;

// ==========================================
// Shift - 周班次
// ==========================================
// 口径: [start_hour, end_hour) 半开区间;
//       end_hour < start_hour 表示跨午夜, 延伸至次日 end_hour;
//       end_hour == start_hour 为空班次, 一律跳过
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub day_of_week: u32, // 周几 (1=周一 .. 7=周日)
    pub start_hour: u32,  // 开始整点 (0..=23)
    pub end_hour: u32,    // 结束整点 (0..=24, 24 表示当日末)
}

impl Shift {
    pub fn new(day_of_week: u32, start_hour: u32, end_hour: u32) -> Self {
        Self {
            day_of_week,
            start_hour,
            end_hour,
        }
    }

    /// 字段是否在合法取值范围内
    pub fn is_valid(&self) -> bool {
        (1..=7).contains(&self.day_of_week) && self.start_hour <= 23 && self.end_hour <= 24
    }

    /// 是否为空班次 (start == end)
    pub fn is_empty(&self) -> bool {
        self.start_hour == self.end_hour
    }

    /// 是否跨午夜 (end < start, 延伸至次日)
    pub fn spans_midnight(&self) -> bool {
        self.end_hour < self.start_hour
    }
}

// ==========================================
// MaintenanceWindow - 检修窗口 (文档形态)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    pub start_time: String, // 窗口开始时刻 (ISO-8601 UTC)
    pub end_time: String,   // 窗口结束时刻 (ISO-8601 UTC), 须晚于开始
}

impl MaintenanceWindow {
    /// 解析为时刻区间
    ///
    /// # 返回
    /// - `Some(interval)`: 起止均可解析且 start < end
    /// - `None`: 非法窗口, 从日历中剔除
    pub fn to_interval(&self) -> Option<MaintenanceInterval> {
        let start = parse_instant(&self.start_time)?;
        let end = parse_instant(&self.end_time)?;
        if start < end {
            Some(MaintenanceInterval { start, end })
        } else {
            None
        }
    }
}

// ==========================================
// MaintenanceInterval - 检修窗口 (解析形态)
// ==========================================
// 用途: 工时推进计算器的输入, 半开区间 [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaintenanceInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MaintenanceInterval {
    /// 时刻是否落在窗口内 (半开区间)
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }
}

// ==========================================
// WorkCenter - 工作中心
// ==========================================
// 红线: 同一工作中心同一时刻至多执行一个工单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkCenter {
    pub work_center_id: String,                    // 工作中心ID
    pub name: String,                              // 名称
    #[serde(default)]
    pub shifts: Vec<Shift>,                        // 周班次集合 (可为空)
    #[serde(default)]
    pub maintenance_windows: Vec<MaintenanceWindow>, // 检修窗口序列 (可为空)
}

impl WorkCenter {
    /// 构造全时可用的工作中心 (无班次, 无检修)
    pub fn continuous(work_center_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            work_center_id: work_center_id.into(),
            name: name.into(),
            shifts: Vec::new(),
            maintenance_windows: Vec::new(),
        }
    }

    /// 生成供计算器使用的日历快照
    ///
    /// - 剔除非法/空班次 (范围外小时数不做归一化, 记 warn 日志)
    /// - 剔除无法解析或起止倒置的检修窗口, 余者按开始时刻升序
    pub fn calendar(&self) -> CenterCalendar {
        let mut shifts = Vec::with_capacity(self.shifts.len());
        for shift in &self.shifts {
            if !shift.is_valid() {
                warn!(
                    work_center_id = %self.work_center_id,
                    day_of_week = shift.day_of_week,
                    start_hour = shift.start_hour,
                    end_hour = shift.end_hour,
                    "班次字段超出合法范围, 已从日历中剔除"
                );
                continue;
            }
            if shift.is_empty() {
                continue;
            }
            shifts.push(*shift);
        }

        let mut windows = Vec::with_capacity(self.maintenance_windows.len());
        for window in &self.maintenance_windows {
            match window.to_interval() {
                Some(interval) => windows.push(interval),
                None => {
                    warn!(
                        work_center_id = %self.work_center_id,
                        start_time = %window.start_time,
                        end_time = %window.end_time,
                        "检修窗口非法, 已从日历中剔除"
                    );
                }
            }
        }
        windows.sort_by_key(|w| w.start);

        CenterCalendar { shifts, windows }
    }
}

// ==========================================
// CenterCalendar - 工作中心日历快照
// ==========================================
// 用途: 每次重排入口构建一次, 供各阶段与校验器复用
#[derive(Debug, Clone)]
pub struct CenterCalendar {
    pub shifts: Vec<Shift>,                 // 合法班次
    pub windows: Vec<MaintenanceInterval>,  // 合法检修窗口 (升序)
}

impl CenterCalendar {
    /// 是否全时可用 (无班次也无检修窗口)
    pub fn is_unconstrained(&self) -> bool {
        self.shifts.is_empty() && self.windows.is_empty()
    }
}
